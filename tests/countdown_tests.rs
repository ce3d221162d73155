use alpha_metrics::countdown::{multiplier_countdown, ENHANCED_PERIOD_DAYS};
use alpha_metrics::ui::Tone;

const DAY_MS: u64 = 24 * 60 * 60 * 1_000;
const LISTED: u64 = 1_700_000_000_000;

fn at_age(days: u64) -> u64 {
    LISTED + days * DAY_MS
}

#[test]
fn tone_follows_remaining_days() {
    let fresh = multiplier_countdown(LISTED, 4.0, at_age(5)).unwrap();
    assert_eq!(fresh.remaining_ms, 25 * DAY_MS);
    assert_eq!(fresh.tone, Tone::Positive);

    // Exactly 15 days left is no longer in the first tier.
    let mid = multiplier_countdown(LISTED, 4.0, at_age(15)).unwrap();
    assert_eq!(mid.tone, Tone::Warning);
    let seven = multiplier_countdown(LISTED, 4.0, at_age(23)).unwrap();
    assert_eq!(seven.tone, Tone::Warning);

    let late = multiplier_countdown(LISTED, 4.0, at_age(23) + 1).unwrap();
    assert_eq!(late.tone, Tone::Negative);
}

#[test]
fn expired_period_reads_zero() {
    let c = multiplier_countdown(LISTED, 4.0, at_age(ENHANCED_PERIOD_DAYS + 3)).unwrap();
    assert_eq!(c.remaining_ms, 0);
    assert_eq!(c.text(), "00:00:00");
    assert_eq!(c.tone, Tone::Negative);
}

#[test]
fn text_shows_total_hours() {
    let c = multiplier_countdown(LISTED, 4.0, at_age(1)).unwrap();
    assert_eq!(c.text(), "696:00:00");
}

#[test]
fn no_countdown_without_enhanced_multiplier_or_listing() {
    assert!(multiplier_countdown(LISTED, 2.0, at_age(1)).is_none());
    assert!(multiplier_countdown(LISTED, f64::NAN, at_age(1)).is_none());
    assert!(multiplier_countdown(0, 4.0, at_age(1)).is_none());
    assert!(multiplier_countdown(LISTED, 8.0, at_age(1)).is_some());
}
