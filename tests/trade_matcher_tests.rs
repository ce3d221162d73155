use alpha_metrics::config::MatcherConfig;
use alpha_metrics::trade_matcher::{MatchOutcome, MatchSource, TradeMatcher};

fn matcher() -> TradeMatcher {
    TradeMatcher::new(MatcherConfig::default())
}

#[test]
/// Buy 100, a 2-unit fee refund, then a 99 sell: one pair, wear of 1.
fn refund_is_absorbed_into_pair_wear() {
    let mut m = matcher();
    m.record_pending(100.0, 0);

    let opened = m.on_balance_delta(-100.0, 1_000);
    assert!(matches!(
        opened,
        MatchOutcome::PairOpened {
            buy,
            source: MatchSource::PendingSlot,
            ..
        } if buy == 100.0
    ));
    assert!(m.pending().is_none());

    let refund = m.on_balance_delta(2.0, 2_000);
    assert_eq!(
        refund,
        MatchOutcome::Refund {
            amount: 2.0,
            accrued: 2.0
        }
    );

    match m.on_balance_delta(99.0, 3_000) {
        MatchOutcome::PairCompleted(pair) => {
            assert_eq!(pair.buy, 100.0);
            assert_eq!(pair.sell, 99.0);
            assert_eq!(pair.refund, 2.0);
            assert!((pair.wear() - 1.0).abs() < 1e-12);
        }
        other => panic!("expected a completed pair, got {:?}", other),
    }
    assert_eq!(m.refund_amount(), 0.0);
    assert!(m.open_pairs().is_empty());
}

#[test]
fn queue_is_bounded_and_drops_oldest() {
    let mut m = matcher();
    for i in 0..15 {
        m.record_pending(10.0 + i as f64, i * 10);
    }
    assert_eq!(m.queue_len(), 10);
    let amounts: Vec<f64> = m.queue().map(|t| t.amount).collect();
    // 14 entries were displaced from the slot; the 4 oldest fell off.
    assert_eq!(amounts.first().copied(), Some(14.0));
    assert_eq!(amounts.last().copied(), Some(23.0));
    assert_eq!(m.pending().map(|p| p.amount), Some(24.0));
}

#[test]
fn open_pair_expires_after_detection_window() {
    let mut m = matcher();
    m.record_pending(50.0, 0);
    assert!(matches!(
        m.on_balance_delta(-50.0, 0),
        MatchOutcome::PairOpened { .. }
    ));

    m.purge(9_999);
    assert_eq!(m.open_pairs().len(), 1);

    // The sell arrives too late to close the pair, and nothing is pending any more.
    assert_eq!(m.on_balance_delta(50.0, 10_000), MatchOutcome::Ignored);
    assert!(m.open_pairs().is_empty());
}

#[test]
fn queue_match_prefers_closest_amount() {
    let mut m = matcher();
    m.record_pending(40.0, 0);
    m.record_pending(100.0, 10);
    m.record_pending(70.0, 20);
    m.record_pending(500.0, 30);
    // Queue now holds 40, 100, 70; 500 sits in the slot.

    match m.on_balance_delta(-72.0, 1_000) {
        MatchOutcome::PairOpened { buy, source, .. } => {
            assert_eq!(buy, 72.0);
            assert_eq!(source, MatchSource::Queue);
        }
        other => panic!("expected a queue match, got {:?}", other),
    }
    let left: Vec<f64> = m.queue().map(|t| t.amount).collect();
    assert_eq!(left, vec![40.0, 100.0]);
    assert_eq!(m.pending().map(|p| p.amount), Some(500.0));
}

#[test]
fn rise_against_pending_slot_is_single_leg() {
    let mut m = matcher();
    m.record_pending(20.0, 0);
    assert_eq!(
        m.on_balance_delta(25.0, 500),
        MatchOutcome::SingleLegCompleted {
            pending_amount: 20.0,
            amount: 25.0
        }
    );
    assert!(m.pending().is_none());
}

#[test]
fn unmatched_changes_are_ignored() {
    let mut m = matcher();
    // No typed amount at all: a deposit is noise.
    assert_eq!(m.on_balance_delta(1_000.0, 0), MatchOutcome::Ignored);

    m.record_pending(10.0, 0);
    // Ratio 5.0 is outside [0.5, 2.0].
    assert_eq!(m.on_balance_delta(-50.0, 100), MatchOutcome::Ignored);
    // A stale slot no longer matches.
    assert_eq!(m.on_balance_delta(-10.0, 10_000), MatchOutcome::Ignored);
}

#[test]
fn identical_sequences_give_identical_outcomes() {
    let run = || {
        let mut m = matcher();
        let mut outcomes = Vec::new();
        m.record_pending(30.0, 0);
        m.record_pending(60.0, 100);
        outcomes.push(m.on_balance_delta(-31.0, 200));
        outcomes.push(m.on_balance_delta(1.5, 300));
        outcomes.push(m.on_balance_delta(-59.0, 400));
        outcomes.push(m.on_balance_delta(30.5, 500));
        outcomes.push(m.on_balance_delta(58.0, 600));
        outcomes
    };
    assert_eq!(run(), run());
}
