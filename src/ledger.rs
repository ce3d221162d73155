use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::storage::{
    KvStore, KEY_BASELINE_BALANCE, KEY_LAST_TRADE_BALANCE, KEY_TOTAL_RECORDS, KEY_WEAR_VALUE,
};

pub const MAX_VOLUME_INTEGRAL: u32 = 25;

/// Cumulative volume of one symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenLedgerEntry {
    /// Raw traded amount.
    #[serde(default)]
    pub buy: f64,
    /// `buy` scaled by the multiplier in force at the latest commit.
    #[serde(default)]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct CommitKey {
    key: String,
    timestamp_ms: u64,
}

fn commit_key(symbol: &str, amount: f64) -> String {
    format!("{}|{:.8}", symbol, amount)
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Accepted { symbol: String, entry: TokenLedgerEntry },
    /// Same symbol and amount committed inside the dedupe window.
    Duplicate,
    Rejected,
}

impl CommitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// What a fresh balance observation means for trade detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalanceStep {
    /// First observation; it becomes the baseline.
    Baseline(f64),
    Unchanged,
    Delta(f64),
}

#[derive(Debug, Clone)]
pub struct AccrualLedger {
    cfg: LedgerConfig,
    entries: BTreeMap<String, TokenLedgerEntry>,
    wear: f64,
    baseline_balance: Option<f64>,
    last_trade_balance: Option<f64>,
    last_commit: Option<CommitKey>,
}

impl AccrualLedger {
    pub fn new(cfg: LedgerConfig) -> Self {
        Self {
            cfg,
            entries: BTreeMap::new(),
            wear: 0.0,
            baseline_balance: None,
            last_trade_balance: None,
            last_commit: None,
        }
    }

    /// Rebuild from storage, dropping empty entries and non-finite values.
    pub fn restore(cfg: LedgerConfig, store: &KvStore) -> Self {
        let mut ledger = Self::new(cfg);
        let records: BTreeMap<String, TokenLedgerEntry> =
            store.get(KEY_TOTAL_RECORDS).unwrap_or_default();
        for (symbol, entry) in records {
            let buy = finite_or_zero(entry.buy);
            let total = finite_or_zero(entry.total);
            if buy > 0.0 || total > 0.0 {
                ledger.entries.insert(symbol, TokenLedgerEntry { buy, total });
            }
        }
        ledger.wear = store
            .get::<f64>(KEY_WEAR_VALUE)
            .filter(|w| w.is_finite())
            .unwrap_or(0.0);
        ledger.baseline_balance = store
            .get::<f64>(KEY_BASELINE_BALANCE)
            .filter(|b| b.is_finite());
        ledger.last_trade_balance = store
            .get::<f64>(KEY_LAST_TRADE_BALANCE)
            .filter(|b| b.is_finite());
        tracing::info!(
            symbols = ledger.entries.len(),
            wear = ledger.wear,
            baseline = ?ledger.baseline_balance,
            "Restored accrual ledger"
        );
        ledger
    }

    pub fn save_totals(&self, store: &KvStore) {
        store.set(KEY_TOTAL_RECORDS, &self.entries);
    }

    pub fn save_balances_and_wear(&self, store: &KvStore) {
        if let Some(baseline) = self.baseline_balance {
            store.set(KEY_BASELINE_BALANCE, &baseline);
        }
        store.set(KEY_WEAR_VALUE, &finite_or_zero(self.wear));
        if let Some(last) = self.last_trade_balance {
            store.set(KEY_LAST_TRADE_BALANCE, &last);
        }
    }

    /// Accrue one recognised trade. `multiplier` at or below 1, or unknown, counts as 1.
    pub fn commit(
        &mut self,
        symbol: &str,
        amount: f64,
        multiplier: f64,
        now_ms: u64,
    ) -> CommitOutcome {
        let symbol = symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() || !amount.is_finite() || amount <= 0.0 {
            return CommitOutcome::Rejected;
        }

        let key = commit_key(&symbol, amount);
        if let Some(last) = &self.last_commit {
            if last.key == key && now_ms.saturating_sub(last.timestamp_ms) < self.cfg.dedupe_window_ms {
                tracing::debug!(symbol = %symbol, amount, "Dropping duplicate commit");
                return CommitOutcome::Duplicate;
            }
        }

        let multiplier = effective_multiplier(multiplier);
        let entry = self.entries.entry(symbol.clone()).or_default();
        entry.buy += amount;
        entry.total = entry.buy * multiplier;
        let entry = *entry;

        self.last_commit = Some(CommitKey {
            key,
            timestamp_ms: now_ms,
        });
        tracing::info!(
            symbol = %symbol,
            amount,
            multiplier,
            buy = entry.buy,
            total = entry.total,
            "Committed trade volume"
        );
        CommitOutcome::Accepted { symbol, entry }
    }

    pub fn add_wear(&mut self, wear: f64) {
        if wear.is_finite() {
            self.wear += wear;
        }
    }

    /// Classify a balance reading against the last one that moved.
    pub fn observe_balance(&mut self, balance: f64) -> BalanceStep {
        if !balance.is_finite() {
            return BalanceStep::Unchanged;
        }
        let (Some(_), Some(last)) = (self.baseline_balance, self.last_trade_balance) else {
            self.baseline_balance = Some(balance);
            self.last_trade_balance = Some(balance);
            return BalanceStep::Baseline(balance);
        };
        let delta = balance - last;
        if delta == 0.0 || !delta.is_finite() {
            return BalanceStep::Unchanged;
        }
        self.last_trade_balance = Some(balance);
        BalanceStep::Delta(delta)
    }

    /// User-initiated clear: drop all volume and wear and rebase on the current balance.
    pub fn reset(&mut self, current_balance: Option<f64>, store: &KvStore) {
        self.entries.clear();
        self.wear = 0.0;
        self.last_commit = None;
        let balance = current_balance.filter(|b| b.is_finite());
        self.baseline_balance = balance;
        self.last_trade_balance = balance;

        self.save_totals(store);
        store.remove(KEY_BASELINE_BALANCE);
        store.remove(KEY_LAST_TRADE_BALANCE);
        store.remove(KEY_WEAR_VALUE);
        self.save_balances_and_wear(store);
        tracing::info!(baseline = ?balance, "Cleared accrual ledger");
    }

    pub fn entry(&self, symbol: &str) -> Option<&TokenLedgerEntry> {
        self.entries.get(&symbol.trim().to_ascii_uppercase())
    }

    pub fn entries(&self) -> &BTreeMap<String, TokenLedgerEntry> {
        &self.entries
    }

    /// Sum of multiplier-scaled totals across symbols.
    pub fn total_volume(&self) -> f64 {
        self.entries.values().map(|e| finite_or_zero(e.total)).sum()
    }

    pub fn total_buy(&self) -> f64 {
        self.entries.values().map(|e| finite_or_zero(e.buy)).sum()
    }

    pub fn volume_integral(&self) -> u32 {
        volume_integral(self.total_volume())
    }

    pub fn wear(&self) -> f64 {
        self.wear
    }

    /// Wear per ten thousand units of raw volume; `None` before any volume.
    pub fn wear_rate(&self) -> Option<f64> {
        let total_buy = self.total_buy();
        if total_buy > 0.0 && self.wear.is_finite() {
            Some(self.wear.abs() * 10_000.0 / total_buy)
        } else {
            None
        }
    }

    pub fn baseline_balance(&self) -> Option<f64> {
        self.baseline_balance
    }

    pub fn last_trade_balance(&self) -> Option<f64> {
        self.last_trade_balance
    }
}

/// Milestone score: `floor(log2(total))` clamped to `[0, 25]`, zero below 2.
pub fn volume_integral(total_volume: f64) -> u32 {
    if !total_volume.is_finite() {
        return if total_volume > 0.0 { MAX_VOLUME_INTEGRAL } else { 0 };
    }
    if total_volume < 2.0 {
        return 0;
    }
    let log = total_volume.log2().floor();
    (log as u32).min(MAX_VOLUME_INTEGRAL)
}

pub fn effective_multiplier(multiplier: f64) -> f64 {
    if multiplier.is_finite() && multiplier > 1.0 {
        multiplier
    } else {
        1.0
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
