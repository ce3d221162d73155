use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::i18n::Language;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub alpha: AlphaConfig,
    #[serde(default)]
    pub stability: StabilityConfig,
    #[serde(default)]
    pub matcher: MatcherConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub ranker: RankerConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlphaConfig {
    pub rest_base_url: String,
    pub request_timeout_ms: u64,
    pub token_map_ttl_ms: u64,
}

impl Default for AlphaConfig {
    fn default() -> Self {
        Self {
            rest_base_url: "https://www.binance.com".to_string(),
            request_timeout_ms: 5_000,
            token_map_ttl_ms: 5 * 60 * 1_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StabilityConfig {
    /// Sliding window covered by the tick sample store.
    pub window_sec: u64,
    /// Default stability tolerance in percent, overridden by the persisted setting.
    pub tolerance_pct: f64,
    /// Number of latest trades requested per tick poll.
    pub ticks_per_poll: usize,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            window_sec: 20,
            tolerance_pct: 5.0,
            ticks_per_poll: 20,
        }
    }
}

impl StabilityConfig {
    pub fn window_ms(&self) -> u64 {
        self.window_sec.saturating_mul(1_000)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub detection_window_ms: u64,
    pub max_queue_size: usize,
    /// Positive deltas strictly below this many units are treated as fee refunds.
    pub refund_threshold: f64,
    /// Relative distance allowed between a sell leg and its buy leg.
    pub pair_tolerance: f64,
    pub ratio_min: f64,
    pub ratio_max: f64,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            detection_window_ms: 10_000,
            max_queue_size: 10,
            refund_threshold: 3.0,
            pair_tolerance: 0.1,
            ratio_min: 0.5,
            ratio_max: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub dedupe_window_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            dedupe_window_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    pub enhanced_multiplier: f64,
    pub sample_size: usize,
    pub min_trades: usize,
    pub cache_ttl_ms: u64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            enhanced_multiplier: 4.0,
            sample_size: 180,
            min_trades: 5,
            cache_ttl_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub tick_ms: u64,
    pub balance_ms: u64,
    pub amount_ms: u64,
    pub countdown_ms: u64,
    pub stable_token_ms: u64,
    pub page_url_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            balance_ms: 1_750,
            amount_ms: 200,
            countdown_ms: 1_000,
            stable_token_ms: 15_000,
            page_url_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub dir: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/probe"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/alpha_metrics.sqlite"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub language: Language,
    /// Where the rendered panel is written as JSON; empty disables the file sink.
    pub panel_path: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            language: Language::Zh,
            panel_path: Some(PathBuf::from("data/panel.json")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn config_path() -> PathBuf {
    std::env::var("ALPHA_METRICS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/default.toml"))
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::load_from_path(&config_path())?;

        if let Ok(dir) = std::env::var("ALPHA_PROBE_DIR") {
            config.probe.dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("ALPHA_REST_BASE_URL") {
            config.alpha.rest_base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&config_str).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.stability.window_sec == 0 {
            bail!("stability.window_sec must be > 0");
        }
        if !self.stability.tolerance_pct.is_finite() || self.stability.tolerance_pct < 0.0 {
            bail!(
                "stability.tolerance_pct must be a non-negative number, got {}",
                self.stability.tolerance_pct
            );
        }
        if self.matcher.max_queue_size == 0 {
            bail!("matcher.max_queue_size must be > 0");
        }
        if !(self.matcher.ratio_min > 0.0 && self.matcher.ratio_min <= self.matcher.ratio_max) {
            bail!(
                "matcher ratio band is invalid: [{}, {}]",
                self.matcher.ratio_min,
                self.matcher.ratio_max
            );
        }
        if self.matcher.pair_tolerance < 0.0 || self.matcher.refund_threshold < 0.0 {
            bail!("matcher.pair_tolerance and matcher.refund_threshold must be >= 0");
        }
        let poll = &self.poll;
        for (name, ms) in [
            ("poll.tick_ms", poll.tick_ms),
            ("poll.balance_ms", poll.balance_ms),
            ("poll.amount_ms", poll.amount_ms),
            ("poll.countdown_ms", poll.countdown_ms),
            ("poll.stable_token_ms", poll.stable_token_ms),
            ("poll.page_url_ms", poll.page_url_ms),
        ] {
            if ms == 0 {
                bail!("{} must be > 0", name);
            }
        }
        if self.ranker.sample_size == 0 {
            bail!("ranker.sample_size must be > 0");
        }
        Ok(())
    }
}
