//! Reconstructs the user's own round-trip trades from polled balance deltas.
//!
//! There is no fill feed for the account, only the balance text on the page and the
//! amount the user is typing into the order form. A buy shows up as a balance drop of
//! roughly the typed amount; the matching sell shows up later as a rise of roughly the
//! same size. Small rises in between are fee refunds.

use std::collections::VecDeque;

use crate::config::MatcherConfig;

/// A typed order amount that has not been matched to a balance drop yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingTrade {
    pub amount: f64,
    pub timestamp_ms: u64,
}

/// A round trip under construction: the buy leg is known, the sell leg is awaited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradePair {
    pub id: u64,
    pub buy: f64,
    pub sell: Option<f64>,
    pub timestamp_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletedPair {
    pub id: u64,
    pub buy: f64,
    pub sell: f64,
    /// Refunds accrued since the previous completion.
    pub refund: f64,
}

impl CompletedPair {
    /// Net cost of the round trip; negative when the trip lost value.
    pub fn wear(&self) -> f64 {
        self.sell - self.buy + self.refund
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Queue,
    PendingSlot,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchOutcome {
    /// Small positive delta absorbed as a fee refund.
    Refund { amount: f64, accrued: f64 },
    PairOpened {
        id: u64,
        buy: f64,
        source: MatchSource,
    },
    PairCompleted(CompletedPair),
    /// Rise matched straight against the typed amount; no buy leg is known, so no wear.
    SingleLegCompleted { pending_amount: f64, amount: f64 },
    /// Deposits, withdrawals and noise.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct TradeMatcher {
    cfg: MatcherConfig,
    queue: VecDeque<PendingTrade>,
    pending: Option<PendingTrade>,
    pairs: Vec<TradePair>,
    next_pair_id: u64,
    refund_amount: f64,
}

impl TradeMatcher {
    pub fn new(cfg: MatcherConfig) -> Self {
        Self {
            cfg,
            queue: VecDeque::new(),
            pending: None,
            pairs: Vec::new(),
            next_pair_id: 0,
            refund_amount: 0.0,
        }
    }

    /// Record the latest typed order amount.
    ///
    /// The previous single-slot amount moves into the bounded queue, evicting the oldest
    /// entry once the queue is full.
    pub fn record_pending(&mut self, amount: f64, now_ms: u64) {
        if !amount.is_finite() || amount <= 0.0 {
            return;
        }
        if let Some(prev) = self.pending.take() {
            self.queue.push_back(prev);
            while self.queue.len() > self.cfg.max_queue_size {
                self.queue.pop_front();
            }
        }
        self.pending = Some(PendingTrade {
            amount,
            timestamp_ms: now_ms,
        });
    }

    /// Drop queue entries and open pairs older than the detection window.
    pub fn purge(&mut self, now_ms: u64) {
        let window = self.cfg.detection_window_ms;
        self.queue
            .retain(|t| now_ms.saturating_sub(t.timestamp_ms) < window);
        self.pairs
            .retain(|p| now_ms.saturating_sub(p.timestamp_ms) < window);
    }

    pub fn on_balance_delta(&mut self, delta: f64, now_ms: u64) -> MatchOutcome {
        if !delta.is_finite() || delta == 0.0 {
            return MatchOutcome::Ignored;
        }
        self.purge(now_ms);
        let magnitude = delta.abs();

        if delta > 0.0 && magnitude < self.cfg.refund_threshold {
            self.refund_amount += magnitude;
            return MatchOutcome::Refund {
                amount: magnitude,
                accrued: self.refund_amount,
            };
        }

        if delta > 0.0 {
            if let Some(completed) = self.complete_pair(magnitude) {
                return MatchOutcome::PairCompleted(completed);
            }
        }

        if delta < 0.0 {
            if let Some(idx) = self.best_queue_match(magnitude) {
                self.queue.remove(idx);
                let id = self.open_pair(magnitude, now_ms);
                return MatchOutcome::PairOpened {
                    id,
                    buy: magnitude,
                    source: MatchSource::Queue,
                };
            }
        }

        if let Some(pending) = self.pending {
            let fresh = now_ms.saturating_sub(pending.timestamp_ms) < self.cfg.detection_window_ms;
            if fresh && self.ratio_ok(magnitude, pending.amount) {
                self.pending = None;
                if delta < 0.0 {
                    let id = self.open_pair(magnitude, now_ms);
                    return MatchOutcome::PairOpened {
                        id,
                        buy: magnitude,
                        source: MatchSource::PendingSlot,
                    };
                }
                return MatchOutcome::SingleLegCompleted {
                    pending_amount: pending.amount,
                    amount: magnitude,
                };
            }
        }

        MatchOutcome::Ignored
    }

    fn complete_pair(&mut self, sell: f64) -> Option<CompletedPair> {
        let tolerance = self.cfg.pair_tolerance;
        let idx = self
            .pairs
            .iter()
            .position(|p| p.sell.is_none() && p.buy > 0.0 && (sell - p.buy).abs() <= p.buy * tolerance)?;
        let pair = self.pairs.remove(idx);
        let completed = CompletedPair {
            id: pair.id,
            buy: pair.buy,
            sell,
            refund: self.refund_amount,
        };
        self.refund_amount = 0.0;
        Some(completed)
    }

    fn best_queue_match(&self, magnitude: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, trade) in self.queue.iter().enumerate() {
            if !self.ratio_ok(magnitude, trade.amount) {
                continue;
            }
            let diff = (magnitude - trade.amount).abs();
            if best.map_or(true, |(_, best_diff)| diff < best_diff) {
                best = Some((idx, diff));
            }
        }
        best.map(|(idx, _)| idx)
    }

    fn ratio_ok(&self, magnitude: f64, amount: f64) -> bool {
        if amount <= 0.0 {
            return false;
        }
        let ratio = magnitude / amount;
        ratio >= self.cfg.ratio_min && ratio <= self.cfg.ratio_max
    }

    fn open_pair(&mut self, buy: f64, now_ms: u64) -> u64 {
        self.next_pair_id += 1;
        let id = self.next_pair_id;
        self.pairs.push(TradePair {
            id,
            buy,
            sell: None,
            timestamp_ms: now_ms,
        });
        id
    }

    pub fn queue(&self) -> impl Iterator<Item = &PendingTrade> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn pending(&self) -> Option<PendingTrade> {
        self.pending
    }

    pub fn open_pairs(&self) -> &[TradePair] {
        &self.pairs
    }

    pub fn refund_amount(&self) -> f64 {
        self.refund_amount
    }

    /// Hand back refunds taken by a pair whose volume was not booked.
    pub fn restore_refund(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.refund_amount += amount;
        }
    }
}
