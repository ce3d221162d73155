pub mod rest;
pub mod types;

pub use rest::{AlphaFeed, AlphaRestClient};
