/// One executed trade on the remote tick feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Aggregate trade id from the feed; `None` for samples built locally.
    pub trade_id: Option<u64>,
    pub timestamp_ms: u64,
    pub price: f64,
    pub volume: f64,
}

impl Sample {
    pub fn new(timestamp_ms: u64, price: f64, volume: f64) -> Self {
        Self {
            trade_id: None,
            timestamp_ms,
            price,
            volume,
        }
    }

    pub fn with_trade_id(trade_id: u64, timestamp_ms: u64, price: f64, volume: f64) -> Self {
        Self {
            trade_id: Some(trade_id),
            ..Self::new(timestamp_ms, price, volume)
        }
    }

    /// Only strictly positive, finite price and volume contribute to the statistics.
    pub fn is_priced(&self) -> bool {
        self.price.is_finite() && self.price > 0.0 && self.volume.is_finite() && self.volume > 0.0
    }
}
