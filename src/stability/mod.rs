pub mod clock;
pub mod estimator;
pub mod sample_store;

pub use clock::{format_elapsed, StableClock};
pub use estimator::{
    evaluate, index_range_pct, vwap, weighted_quantile, Direction, StabilityReading,
};
pub use sample_store::TickSampleStore;
