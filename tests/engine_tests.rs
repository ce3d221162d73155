use alpha_metrics::config::Config;
use alpha_metrics::engine::Engine;
use alpha_metrics::event::EngineEvent;
use alpha_metrics::model::reading::Reading;
use alpha_metrics::model::sample::Sample;
use alpha_metrics::model::token::TokenInfo;
use alpha_metrics::storage::{KvStore, KEY_STABLE_TOLERANCE, KEY_WEAR_VALUE};
use alpha_metrics::trade_matcher::MatchOutcome;

const DAY_MS: u64 = 24 * 60 * 60 * 1_000;
const NOW: u64 = 1_700_000_000_000;

fn token(alpha_id: &str, symbol: &str, multiplier: f64) -> TokenInfo {
    TokenInfo {
        alpha_id: alpha_id.to_string(),
        symbol: symbol.to_string(),
        contract_address: format!("0x{}", symbol.to_ascii_lowercase()),
        icon_url: String::new(),
        listing_time_ms: NOW - 3 * DAY_MS,
        multiplier,
        volume_24h: 0.0,
        liquidity: 0.0,
        offline: false,
    }
}

fn engine() -> Engine {
    Engine::new(&Config::default(), KvStore::open_in_memory().unwrap())
}

fn ticks(start: u64, prices: &[f64]) -> Vec<Sample> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| Sample::new(start + i as u64 * 100, p, 1.0))
        .collect()
}

fn temp_db(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "alpha-metrics-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir.join("store.sqlite")
}

#[test]
fn buy_refund_sell_accrues_scaled_volume_and_wear() {
    let mut e = engine();
    e.on_instrument(Some(token("ALPHA_1", "ABC", 4.0)));

    assert!(e.on_balance(1_000.0, NOW).is_none());
    e.on_amount(100.0, NOW + 100);
    assert!(matches!(
        e.on_balance(900.0, NOW + 1_000),
        Some(MatchOutcome::PairOpened { .. })
    ));
    assert!(matches!(
        e.on_balance(902.0, NOW + 2_000),
        Some(MatchOutcome::Refund { .. })
    ));
    assert!(matches!(
        e.on_balance(1_001.0, NOW + 3_000),
        Some(MatchOutcome::PairCompleted(_))
    ));

    let entry = e.ledger().entry("ABC").copied().unwrap();
    assert_eq!(entry.buy, 99.0);
    assert_eq!(entry.total, 396.0);
    assert!((e.ledger().wear() - 1.0).abs() < 1e-9);
    assert_eq!(e.ledger().volume_integral(), 8);
    assert_eq!(e.store().get::<f64>(KEY_WEAR_VALUE), Some(e.ledger().wear()));

    let snap = e.snapshot(NOW + 4_000);
    assert_eq!(snap.symbol.as_deref(), Some("ABC"));
    assert_eq!(snap.total_volume, 396.0);
    assert!(snap.wear_rate.is_some());
    assert!(snap.countdown.is_some());
}

#[test]
fn trade_without_instrument_is_not_committed() {
    let mut e = engine();
    e.on_balance(500.0, NOW);
    e.on_amount(50.0, NOW);
    e.on_balance(450.0, NOW + 500);
    let outcome = e.on_balance(499.0, NOW + 1_000);
    assert!(matches!(outcome, Some(MatchOutcome::PairCompleted(_))));
    assert!(e.ledger().entries().is_empty());
    assert_eq!(e.ledger().wear(), 0.0);
}

/// A pair whose sell is dropped as a duplicate keeps its refunds for the next pair.
#[test]
fn duplicate_pair_commit_keeps_refund_for_next_pair() {
    let mut e = engine();
    e.on_instrument(Some(token("ALPHA_1", "ABC", 4.0)));

    e.on_balance(1_000.0, NOW);
    e.on_amount(100.0, NOW + 100);
    e.on_balance(900.0, NOW + 1_000);
    assert!(matches!(
        e.on_balance(999.0, NOW + 2_000),
        Some(MatchOutcome::PairCompleted(_))
    ));
    assert!((e.ledger().wear() + 1.0).abs() < 1e-9);

    e.on_amount(100.0, NOW + 2_500);
    assert!(matches!(
        e.on_balance(899.0, NOW + 3_000),
        Some(MatchOutcome::PairOpened { .. })
    ));
    assert!(matches!(
        e.on_balance(901.0, NOW + 3_500),
        Some(MatchOutcome::Refund { .. })
    ));
    assert!(matches!(
        e.on_balance(1_000.0, NOW + 4_000),
        Some(MatchOutcome::PairCompleted(_))
    ));

    assert_eq!(e.matcher().refund_amount(), 2.0);
    assert!((e.ledger().wear() + 1.0).abs() < 1e-9);
    assert_eq!(e.ledger().entry("ABC").map(|en| en.buy), Some(99.0));
}

#[test]
fn instrument_switch_drops_samples_and_stale_ticks() {
    let mut e = engine();
    e.on_instrument(Some(token("ALPHA_1", "ABC", 4.0)));
    let reading = e.on_ticks("ALPHA_1", Reading::Value(ticks(NOW, &[1.0, 1.0, 1.0])), NOW + 1_000);
    assert!(reading.is_stable);
    assert_eq!(e.sample_count(), 3);

    e.on_instrument(Some(token("ALPHA_2", "XYZ", 1.0)));
    assert_eq!(e.sample_count(), 0);
    assert!(e.reading().is_indeterminate());
    assert_eq!(e.snapshot(NOW + 1_000).stable_for_ms, None);

    // A response for the previous instrument that lands after the switch is dropped.
    e.on_ticks("ALPHA_1", Reading::Value(ticks(NOW, &[1.0, 1.0])), NOW + 1_500);
    assert_eq!(e.sample_count(), 0);

    e.on_multiplier("ALPHA_1", Reading::Value(4.0));
    assert_eq!(e.current_multiplier(), 1.0);
    e.on_multiplier("ALPHA_2", Reading::Value(2.0));
    assert_eq!(e.current_multiplier(), 2.0);
}

#[test]
fn unavailable_ticks_render_indeterminate_and_stop_clock() {
    let mut e = engine();
    e.on_instrument(Some(token("ALPHA_1", "ABC", 4.0)));
    e.on_ticks("ALPHA_1", Reading::Value(ticks(NOW, &[2.0, 2.0])), NOW + 1_000);
    assert_eq!(e.snapshot(NOW + 4_000).stable_for_ms, Some(3_000));

    let reading = e.on_ticks("ALPHA_1", Reading::Unavailable, NOW + 5_000);
    assert!(reading.is_indeterminate());
    assert_eq!(e.snapshot(NOW + 6_000).stable_for_ms, None);
}

#[test]
fn tolerance_updates_persist_across_restarts() {
    let path = temp_db("tolerance");
    {
        let mut e = Engine::new(&Config::default(), KvStore::open(&path).unwrap());
        assert_eq!(e.tolerance_pct(), 5.0);
        assert!(!e.set_tolerance(-1.0));
        assert!(!e.set_tolerance(f64::NAN));
        assert!(e.set_tolerance(0.5));
        assert_eq!(e.store().get::<f64>(KEY_STABLE_TOLERANCE), Some(0.5));
    }
    let e = Engine::new(&Config::default(), KvStore::open(&path).unwrap());
    assert_eq!(e.tolerance_pct(), 0.5);
    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}

#[test]
fn clear_event_resets_volume_and_rebases() {
    let mut e = engine();
    e.apply(EngineEvent::InstrumentResolved(Some(token("ALPHA_1", "ABC", 4.0))));
    e.apply(EngineEvent::BalanceObserved {
        balance: 200.0,
        now_ms: NOW,
    });
    e.apply(EngineEvent::AmountObserved {
        amount: 20.0,
        now_ms: NOW,
    });
    e.apply(EngineEvent::BalanceObserved {
        balance: 225.0,
        now_ms: NOW + 500,
    });
    assert_eq!(e.ledger().total_volume(), 100.0);

    e.apply(EngineEvent::ClearData);
    assert_eq!(e.ledger().total_volume(), 0.0);
    assert_eq!(e.ledger().baseline_balance(), Some(225.0));

    e.apply(EngineEvent::SetTolerance(1.25));
    assert_eq!(e.tolerance_pct(), 1.25);
}
