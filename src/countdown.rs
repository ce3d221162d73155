use crate::ui::Tone;

const MS_PER_HOUR: u64 = 60 * 60 * 1_000;
const MS_PER_DAY: u64 = 24 * MS_PER_HOUR;
/// Enhanced multipliers run for this long after listing.
pub const ENHANCED_PERIOD_DAYS: u64 = 30;
const MIN_ENHANCED_MULTIPLIER: f64 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    pub remaining_ms: u64,
    pub tone: Tone,
}

impl Countdown {
    /// Total hours, not wrapped at a day.
    pub fn text(&self) -> String {
        let hours = self.remaining_ms / MS_PER_HOUR;
        let minutes = (self.remaining_ms % MS_PER_HOUR) / 60_000;
        let seconds = (self.remaining_ms % 60_000) / 1_000;
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Time left in the enhanced-multiplier period; `None` when the instrument is not enhanced
/// or its listing time is unknown.
pub fn multiplier_countdown(listing_time_ms: u64, multiplier: f64, now_ms: u64) -> Option<Countdown> {
    if listing_time_ms == 0 || multiplier.is_nan() || multiplier < MIN_ENHANCED_MULTIPLIER {
        return None;
    }
    let period_ms = ENHANCED_PERIOD_DAYS * MS_PER_DAY;
    let age_ms = now_ms.saturating_sub(listing_time_ms);
    let remaining_ms = period_ms.saturating_sub(age_ms);

    let remaining_days = remaining_ms as f64 / MS_PER_DAY as f64;
    let tone = if remaining_days > 15.0 {
        Tone::Positive
    } else if remaining_days >= 7.0 {
        Tone::Warning
    } else {
        Tone::Negative
    };
    Some(Countdown { remaining_ms, tone })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_keeps_total_hours() {
        let c = Countdown {
            remaining_ms: 2 * MS_PER_DAY + 3 * MS_PER_HOUR + 4 * 60_000 + 5_999,
            tone: Tone::Negative,
        };
        assert_eq!(c.text(), "51:04:05");
    }
}
