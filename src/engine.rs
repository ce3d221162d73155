use crate::config::Config;
use crate::countdown::{multiplier_countdown, Countdown};
use crate::event::EngineEvent;
use crate::ledger::{effective_multiplier, AccrualLedger, BalanceStep, CommitOutcome};
use crate::model::reading::Reading;
use crate::model::sample::Sample;
use crate::model::token::TokenInfo;
use crate::ranker::CandidateStability;
use crate::stability::{evaluate, StableClock, StabilityReading, TickSampleStore};
use crate::storage::{KvStore, KEY_STABLE_TOLERANCE};
use crate::trade_matcher::{MatchOutcome, TradeMatcher};

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub symbol: Option<String>,
    pub stability: StabilityReading,
    pub stable_for_ms: Option<u64>,
    pub countdown: Option<Countdown>,
    pub total_volume: f64,
    pub volume_integral: u32,
    pub wear: f64,
    pub wear_rate: Option<f64>,
    pub recommended: Reading<CandidateStability>,
}

/// Owns all mutable metric state. Each handler runs to completion before the next event.
pub struct Engine {
    tolerance_pct: f64,
    samples: TickSampleStore,
    clock: StableClock,
    reading: StabilityReading,
    instrument: Option<TokenInfo>,
    /// Multiplier as reported by the feed, before flooring at 1.
    reported_multiplier: f64,
    matcher: TradeMatcher,
    ledger: AccrualLedger,
    last_observed_balance: Option<f64>,
    recommended: Reading<CandidateStability>,
    store: KvStore,
}

impl Engine {
    pub fn new(config: &Config, store: KvStore) -> Self {
        let tolerance_pct = store
            .get::<f64>(KEY_STABLE_TOLERANCE)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(config.stability.tolerance_pct);
        let ledger = AccrualLedger::restore(config.ledger.clone(), &store);
        tracing::info!(tolerance_pct, "Engine initialised");

        Self {
            tolerance_pct,
            samples: TickSampleStore::new(config.stability.window_ms()),
            clock: StableClock::new(),
            reading: StabilityReading::indeterminate(),
            instrument: None,
            reported_multiplier: 0.0,
            matcher: TradeMatcher::new(config.matcher.clone()),
            ledger,
            last_observed_balance: None,
            recommended: Reading::Insufficient,
            store,
        }
    }

    pub fn apply(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::InstrumentResolved(token) => self.on_instrument(token),
            EngineEvent::TicksFetched {
                alpha_id,
                ticks,
                now_ms,
            } => {
                self.on_ticks(&alpha_id, ticks, now_ms);
            }
            EngineEvent::MultiplierFetched {
                alpha_id,
                multiplier,
            } => self.on_multiplier(&alpha_id, multiplier),
            EngineEvent::BalanceObserved { balance, now_ms } => {
                self.on_balance(balance, now_ms);
            }
            EngineEvent::AmountObserved { amount, now_ms } => self.on_amount(amount, now_ms),
            EngineEvent::StableTokenRanked(reading) => self.recommended = reading,
            EngineEvent::ClearData => self.clear_data(),
            EngineEvent::SetTolerance(v) => {
                self.set_tolerance(v);
            }
        }
    }

    /// Switching instruments drops the sample window and the stable clock.
    pub fn on_instrument(&mut self, token: Option<TokenInfo>) {
        let new_id = token.as_ref().map(|t| t.alpha_id.as_str());
        let old_id = self.instrument.as_ref().map(|t| t.alpha_id.as_str());
        if new_id == old_id {
            if let Some(token) = token {
                self.instrument = Some(token);
            }
            return;
        }
        tracing::info!(from = ?old_id, to = ?new_id, "Instrument changed");
        self.samples.clear();
        self.clock.reset();
        self.reading = StabilityReading::indeterminate();
        self.reported_multiplier = token.as_ref().map(|t| t.multiplier).unwrap_or(0.0);
        self.instrument = token;
    }

    pub fn on_ticks(
        &mut self,
        alpha_id: &str,
        ticks: Reading<Vec<Sample>>,
        now_ms: u64,
    ) -> StabilityReading {
        if self.current_alpha_id() != Some(alpha_id) {
            tracing::debug!(alpha_id, "Discarding ticks for a previous instrument");
            return self.reading;
        }
        self.reading = match ticks {
            Reading::Value(ticks) if !ticks.is_empty() => {
                self.samples.extend(ticks);
                self.samples.prune(now_ms);
                evaluate(&self.samples.samples(), self.tolerance_pct)
            }
            Reading::Unavailable => {
                tracing::debug!(alpha_id, "Tick feed unavailable this cycle");
                StabilityReading::indeterminate()
            }
            _ => StabilityReading::indeterminate(),
        };
        self.clock.observe(self.reading.is_stable, now_ms);
        self.reading
    }

    pub fn on_multiplier(&mut self, alpha_id: &str, multiplier: Reading<f64>) {
        if self.current_alpha_id() != Some(alpha_id) {
            return;
        }
        if let Reading::Value(m) = multiplier {
            self.reported_multiplier = m;
        }
    }

    pub fn on_amount(&mut self, amount: f64, now_ms: u64) {
        self.matcher.record_pending(amount, now_ms);
    }

    /// Feed a balance reading through trade detection and accrual.
    pub fn on_balance(&mut self, balance: f64, now_ms: u64) -> Option<MatchOutcome> {
        if !balance.is_finite() {
            return None;
        }
        self.last_observed_balance = Some(balance);

        let delta = match self.ledger.observe_balance(balance) {
            BalanceStep::Baseline(b) => {
                tracing::info!(baseline = b, "Balance baseline set");
                self.ledger.save_balances_and_wear(&self.store);
                return None;
            }
            BalanceStep::Unchanged => return None,
            BalanceStep::Delta(d) => d,
        };

        let outcome = self.matcher.on_balance_delta(delta, now_ms);
        match outcome {
            MatchOutcome::PairCompleted(pair) => {
                tracing::info!(
                    buy = pair.buy,
                    sell = pair.sell,
                    refund = pair.refund,
                    wear = pair.wear(),
                    "Trade pair completed"
                );
                if self.commit(pair.sell, now_ms).is_accepted() {
                    self.ledger.add_wear(pair.wear());
                } else {
                    self.matcher.restore_refund(pair.refund);
                }
            }
            MatchOutcome::SingleLegCompleted {
                pending_amount,
                amount,
            } => {
                tracing::info!(pending_amount, amount, "Single-leg trade matched");
                self.commit(amount, now_ms);
            }
            MatchOutcome::PairOpened { id, buy, source } => {
                tracing::debug!(id, buy, ?source, "Trade pair opened");
            }
            MatchOutcome::Refund { amount, accrued } => {
                tracing::debug!(amount, accrued, "Fee refund absorbed");
            }
            MatchOutcome::Ignored => {
                tracing::debug!(delta, "Balance change not recognised as a trade");
            }
        }
        self.ledger.save_balances_and_wear(&self.store);
        Some(outcome)
    }

    fn commit(&mut self, amount: f64, now_ms: u64) -> CommitOutcome {
        let Some(symbol) = self.instrument.as_ref().map(|t| t.symbol.clone()) else {
            tracing::warn!(amount, "Trade recognised without a known instrument; not committed");
            return CommitOutcome::Rejected;
        };
        let multiplier = self.current_multiplier();
        let outcome = self.ledger.commit(&symbol, amount, multiplier, now_ms);
        if outcome.is_accepted() {
            self.ledger.save_totals(&self.store);
        }
        outcome
    }

    pub fn clear_data(&mut self) {
        self.ledger.reset(self.last_observed_balance, &self.store);
    }

    /// Returns false and keeps the previous value when `tolerance_pct` is negative or not finite.
    pub fn set_tolerance(&mut self, tolerance_pct: f64) -> bool {
        if !tolerance_pct.is_finite() || tolerance_pct < 0.0 {
            tracing::warn!(tolerance_pct, "Rejected stability tolerance");
            return false;
        }
        self.tolerance_pct = tolerance_pct;
        self.store.set(KEY_STABLE_TOLERANCE, &tolerance_pct);
        tracing::info!(tolerance_pct, "Stability tolerance updated");
        true
    }

    pub fn snapshot(&self, now_ms: u64) -> EngineSnapshot {
        let countdown = self
            .instrument
            .as_ref()
            .and_then(|t| multiplier_countdown(t.listing_time_ms, self.reported_multiplier, now_ms));
        EngineSnapshot {
            symbol: self.instrument.as_ref().map(|t| t.symbol.clone()),
            stability: self.reading,
            stable_for_ms: self.clock.elapsed_ms(now_ms),
            countdown,
            total_volume: self.ledger.total_volume(),
            volume_integral: self.ledger.volume_integral(),
            wear: self.ledger.wear(),
            wear_rate: self.ledger.wear_rate(),
            recommended: self.recommended.clone(),
        }
    }

    pub fn current_alpha_id(&self) -> Option<&str> {
        self.instrument.as_ref().map(|t| t.alpha_id.as_str())
    }

    pub fn current_multiplier(&self) -> f64 {
        effective_multiplier(self.reported_multiplier)
    }

    pub fn tolerance_pct(&self) -> f64 {
        self.tolerance_pct
    }

    pub fn reading(&self) -> StabilityReading {
        self.reading
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn ledger(&self) -> &AccrualLedger {
        &self.ledger
    }

    pub fn matcher(&self) -> &TradeMatcher {
        &self.matcher
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }
}
