use crate::model::sample::Sample;

const P05: f64 = 0.05;
const P50: f64 = 0.5;
const P95: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn arrow(self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Flat => "",
        }
    }
}

/// Stability of one sample window.
///
/// `range_pct` and `sign_pct` are NaN when the window is indeterminate, in which case
/// `is_stable` is false and the reading should be displayed blank rather than volatile.
#[derive(Debug, Clone, Copy)]
pub struct StabilityReading {
    pub is_stable: bool,
    /// Weighted P95-P05 spread relative to VWAP, in percent.
    pub range_pct: f64,
    /// Weighted median skew relative to VWAP, in percent.
    pub sign_pct: f64,
}

impl StabilityReading {
    pub fn indeterminate() -> Self {
        Self {
            is_stable: false,
            range_pct: f64::NAN,
            sign_pct: f64::NAN,
        }
    }

    pub fn is_indeterminate(&self) -> bool {
        !self.range_pct.is_finite()
    }

    pub fn direction(&self) -> Direction {
        if !self.sign_pct.is_finite() {
            Direction::Flat
        } else if self.sign_pct > 0.0 {
            Direction::Up
        } else if self.sign_pct < 0.0 {
            Direction::Down
        } else {
            Direction::Flat
        }
    }
}

/// Volume-weighted average price over samples with positive volume.
pub fn vwap(samples: &[Sample]) -> Option<f64> {
    let mut sum_pv = 0.0;
    let mut sum_v = 0.0;
    for s in samples.iter().filter(|s| s.volume.is_finite() && s.volume > 0.0) {
        sum_pv += s.price * s.volume;
        sum_v += s.volume;
    }
    if sum_v > 0.0 {
        Some(sum_pv / sum_v)
    } else {
        None
    }
}

/// Price at which cumulative volume, in ascending price order, first reaches `q` of the total.
pub fn weighted_quantile(samples: &[Sample], q: f64) -> Option<f64> {
    let mut sorted: Vec<&Sample> = samples
        .iter()
        .filter(|s| s.volume.is_finite() && s.volume > 0.0)
        .collect();
    sorted.sort_by(|a, b| a.price.total_cmp(&b.price));

    let total: f64 = sorted.iter().map(|s| s.volume).sum();
    if total <= 0.0 {
        return None;
    }
    let target = total * q;
    let mut cum = 0.0;
    for s in &sorted {
        cum += s.volume;
        if cum >= target {
            return Some(s.price);
        }
    }
    sorted.last().map(|s| s.price)
}

/// Classify a sample window against a tolerance expressed in percent.
pub fn evaluate(samples: &[Sample], tolerance_pct: f64) -> StabilityReading {
    let priced = samples.iter().filter(|s| s.is_priced()).count();
    if priced < 2 {
        return StabilityReading::indeterminate();
    }

    let (Some(vwap), Some(p05), Some(p95)) = (
        vwap(samples),
        weighted_quantile(samples, P05),
        weighted_quantile(samples, P95),
    ) else {
        return StabilityReading::indeterminate();
    };
    if [vwap, p05, p95].iter().any(|v| !v.is_finite() || *v == 0.0) {
        return StabilityReading::indeterminate();
    }

    let range_pct = ((p95 - p05) / vwap).abs() * 100.0;
    let sign_pct = weighted_quantile(samples, P50)
        .map(|p50| (p50 - vwap) / vwap * 100.0)
        .unwrap_or(f64::NAN);
    if !range_pct.is_finite() {
        return StabilityReading::indeterminate();
    }

    StabilityReading {
        is_stable: range_pct <= tolerance_pct,
        range_pct,
        sign_pct,
    }
}

/// Unweighted variant over a fixed trade count, used to compare candidate instruments.
///
/// Percentiles are picked by index over the sorted prices. Returns `None` below
/// `min_trades` trades or when VWAP is zero or undefined.
pub fn index_range_pct(samples: &[Sample], min_trades: usize) -> Option<f64> {
    if samples.is_empty() || samples.len() < min_trades {
        return None;
    }
    let vwap = vwap(samples).filter(|v| v.is_finite() && *v != 0.0)?;

    let mut prices: Vec<f64> = samples.iter().map(|s| s.price).collect();
    prices.sort_by(f64::total_cmp);
    let n = prices.len();
    let p05 = prices[((n as f64 * P05).floor() as usize).min(n - 1)];
    let p95 = prices[((n as f64 * P95).floor() as usize).min(n - 1)];

    let range_pct = ((p95 - p05) / vwap).abs() * 100.0;
    range_pct.is_finite().then_some(range_pct)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(ts: u64, price: f64, volume: f64) -> Sample {
        Sample::new(ts, price, volume)
    }

    #[test]
    fn vwap_ignores_zero_volume() {
        let samples = vec![s(1, 10.0, 1.0), s(2, 20.0, 3.0), s(3, 1_000.0, 0.0)];
        assert!((vwap(&samples).unwrap() - 17.5).abs() < 1e-12);
        assert_eq!(vwap(&[s(1, 10.0, 0.0)]), None);
    }

    #[test]
    fn weighted_quantile_walks_cumulative_volume() {
        let samples = vec![s(1, 3.0, 1.0), s(2, 1.0, 1.0), s(3, 2.0, 8.0)];
        assert_eq!(weighted_quantile(&samples, 0.05), Some(1.0));
        assert_eq!(weighted_quantile(&samples, 0.5), Some(2.0));
        assert_eq!(weighted_quantile(&samples, 0.95), Some(3.0));
    }

    #[test]
    fn single_sample_is_indeterminate() {
        let r = evaluate(&[s(1, 5.0, 1.0)], 5.0);
        assert!(!r.is_stable);
        assert!(r.is_indeterminate());
        assert_eq!(r.direction(), Direction::Flat);
    }

    #[test]
    fn index_range_requires_min_trades() {
        let samples: Vec<Sample> = (0..4).map(|i| s(i, 1.0, 1.0)).collect();
        assert_eq!(index_range_pct(&samples, 5), None);
        assert_eq!(index_range_pct(&samples, 4), Some(0.0));
    }
}
