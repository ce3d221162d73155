use std::collections::VecDeque;

use crate::model::sample::Sample;

/// Time-windowed buffer of recent trade samples for the instrument on screen.
#[derive(Debug, Clone)]
pub struct TickSampleStore {
    window_ms: u64,
    samples: VecDeque<Sample>,
}

impl TickSampleStore {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            samples: VecDeque::new(),
        }
    }

    /// Append freshly fetched trades.
    ///
    /// The feed is polled for the latest page of trades, so consecutive pages overlap;
    /// a trade whose aggregate id is already held is not counted twice. Samples without
    /// an id are always kept, since equal fills in the same millisecond are distinct trades.
    pub fn extend(&mut self, fetched: impl IntoIterator<Item = Sample>) -> usize {
        let mut added = 0;
        for sample in fetched {
            if !sample.is_priced() || self.holds_trade(sample.trade_id) {
                continue;
            }
            self.insert_ordered(sample);
            added += 1;
        }
        added
    }

    fn holds_trade(&self, trade_id: Option<u64>) -> bool {
        trade_id.is_some_and(|id| self.samples.iter().any(|s| s.trade_id == Some(id)))
    }

    fn insert_ordered(&mut self, sample: Sample) {
        let idx = self
            .samples
            .partition_point(|s| s.timestamp_ms <= sample.timestamp_ms);
        self.samples.insert(idx, sample);
    }

    /// Evict everything older than `now_ms - window`.
    pub fn prune(&mut self, now_ms: u64) -> usize {
        let cutoff = now_ms.saturating_sub(self.window_ms);
        let before = self.samples.len();
        self.samples.retain(|s| s.timestamp_ms >= cutoff);
        before - self.samples.len()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.samples.iter().copied().collect()
    }

    /// Time between the oldest and newest held sample.
    pub fn coverage_ms(&self) -> u64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => last.timestamp_ms.saturating_sub(first.timestamp_ms),
            _ => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
