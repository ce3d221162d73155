pub mod reading;
pub mod sample;
pub mod token;
