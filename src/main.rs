use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch, Notify};
use tokio::time::MissedTickBehavior;

use alpha_metrics::alpha::{AlphaFeed, AlphaRestClient};
use alpha_metrics::cache::TtlCache;
use alpha_metrics::config::Config;
use alpha_metrics::engine::Engine;
use alpha_metrics::event::EngineEvent;
use alpha_metrics::i18n::{Label, Language};
use alpha_metrics::input::{parse_command, ControlCommand};
use alpha_metrics::model::reading::Reading;
use alpha_metrics::model::token::{TokenInfo, TokenMap};
use alpha_metrics::probe::{contract_from_page_url, FileProbe, PageProbe};
use alpha_metrics::ranker::StableTokenRanker;
use alpha_metrics::storage::KvStore;
use alpha_metrics::ui::MetricsPanel;

const EVENT_CHANNEL_CAPACITY: usize = 256;
const RENDER_INTERVAL_MS: u64 = 1_000;

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

fn poll_interval(ms: u64) -> tokio::time::Interval {
    let mut ticker = tokio::time::interval(Duration::from_millis(ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Resolve the page URL to a token, refreshing the token list through a TTL cache.
///
/// `Err` means the token list could not be fetched this cycle.
async fn resolve_instrument(
    feed: &AlphaRestClient,
    cache: &mut TtlCache<TokenMap>,
    page_url: Option<&str>,
    now: u64,
) -> Result<Option<TokenInfo>> {
    let Some(contract) = page_url.and_then(contract_from_page_url) else {
        return Ok(None);
    };
    if cache.get(now).is_none() {
        let tokens = feed.token_list().await?;
        cache.put(TokenMap::from_tokens(tokens), now);
    }
    Ok(cache
        .get(now)
        .and_then(|map| map.by_address(&contract))
        .cloned())
}

fn spawn_instrument_loop(
    config: &Config,
    feed: Arc<AlphaRestClient>,
    probe: FileProbe,
    tx: mpsc::Sender<EngineEvent>,
    current_tx: watch::Sender<Option<String>>,
    ranker_refresh: Arc<Notify>,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = config.poll.page_url_ms;
    let ttl = config.alpha.token_map_ttl_ms;
    tokio::spawn(async move {
        let mut ticker = poll_interval(period);
        let mut cache = TtlCache::new(ttl);
        let mut last_url: Option<String> = None;
        let mut last_alpha_id: Option<Option<String>> = None;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            let page_url = probe.page_url();
            if page_url != last_url {
                tracing::info!(url = ?page_url, "Page URL changed");
                last_url = page_url.clone();
                ranker_refresh.notify_one();
            }

            let token = match resolve_instrument(&feed, &mut cache, page_url.as_deref(), now_ms()).await {
                Ok(token) => token,
                Err(e) => {
                    tracing::warn!(error = %e, "Token list unavailable; keeping current instrument");
                    continue;
                }
            };
            let alpha_id = token.as_ref().map(|t| t.alpha_id.clone());
            if last_alpha_id.as_ref() == Some(&alpha_id) {
                continue;
            }
            last_alpha_id = Some(alpha_id.clone());
            current_tx.send_replace(alpha_id);
            if tx.send(EngineEvent::InstrumentResolved(token)).await.is_err() {
                break;
            }
        }
    });
}

fn spawn_tick_loop(
    config: &Config,
    feed: Arc<AlphaRestClient>,
    tx: mpsc::Sender<EngineEvent>,
    current: watch::Receiver<Option<String>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = config.poll.tick_ms;
    let limit = config.stability.ticks_per_poll;
    tokio::spawn(async move {
        let mut ticker = poll_interval(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            let current_id = current.borrow().clone();
            let Some(alpha_id) = current_id else {
                continue;
            };
            let ticks = match feed.recent_trades(&alpha_id, limit).await {
                Ok(ticks) => Reading::Value(ticks),
                Err(e) => {
                    tracing::debug!(alpha_id = %alpha_id, error = %e, "Tick fetch failed");
                    Reading::Unavailable
                }
            };
            let event = EngineEvent::TicksFetched {
                alpha_id,
                ticks,
                now_ms: now_ms(),
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });
}

fn spawn_multiplier_loop(
    config: &Config,
    feed: Arc<AlphaRestClient>,
    tx: mpsc::Sender<EngineEvent>,
    current: watch::Receiver<Option<String>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = config.poll.countdown_ms;
    tokio::spawn(async move {
        let mut ticker = poll_interval(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }
            let current_id = current.borrow().clone();
            let Some(alpha_id) = current_id else {
                continue;
            };
            let multiplier = match feed.multiplier(&alpha_id).await {
                Ok(m) => Reading::Value(m),
                Err(e) => {
                    tracing::debug!(alpha_id = %alpha_id, error = %e, "Multiplier fetch failed");
                    Reading::Unavailable
                }
            };
            let event = EngineEvent::MultiplierFetched {
                alpha_id,
                multiplier,
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });
}

fn spawn_probe_loops(
    config: &Config,
    probe: FileProbe,
    tx: mpsc::Sender<EngineEvent>,
    shutdown: watch::Receiver<bool>,
) {
    let amount_probe = probe.clone();
    let amount_tx = tx.clone();
    let mut amount_shutdown = shutdown.clone();
    let amount_period = config.poll.amount_ms;
    tokio::spawn(async move {
        let mut ticker = poll_interval(amount_period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = amount_shutdown.changed() => break,
            }
            let Some(amount) = amount_probe.amount() else {
                continue;
            };
            let event = EngineEvent::AmountObserved {
                amount,
                now_ms: now_ms(),
            };
            if amount_tx.send(event).await.is_err() {
                break;
            }
        }
    });

    let mut balance_shutdown = shutdown;
    let balance_period = config.poll.balance_ms;
    tokio::spawn(async move {
        let mut ticker = poll_interval(balance_period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = balance_shutdown.changed() => break,
            }
            let Some(balance) = probe.balance() else {
                continue;
            };
            let event = EngineEvent::BalanceObserved {
                balance,
                now_ms: now_ms(),
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });
}

fn spawn_ranker_loop(
    config: &Config,
    feed: Arc<AlphaRestClient>,
    tx: mpsc::Sender<EngineEvent>,
    current: watch::Receiver<Option<String>>,
    tolerance: watch::Receiver<f64>,
    refresh: Arc<Notify>,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = config.poll.stable_token_ms;
    let mut ranker = StableTokenRanker::new(config.ranker.clone());
    tokio::spawn(async move {
        let mut ticker = poll_interval(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = refresh.notified() => {
                    // Give the page a moment to settle on the new instrument.
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    ranker.invalidate();
                }
                _ = shutdown.changed() => break,
            }
            let alpha_id = current.borrow().clone();
            let tolerance_pct = *tolerance.borrow();
            let reading = ranker
                .rank(feed.as_ref(), alpha_id.as_deref(), tolerance_pct, now_ms())
                .await;
            if tx.send(EngineEvent::StableTokenRanked(reading)).await.is_err() {
                break;
            }
        }
    });
}

fn spawn_command_loop(
    lang: Language,
    tx: mpsc::Sender<EngineEvent>,
    refresh: Arc<Notify>,
    quit: Arc<Notify>,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read command input");
                    break;
                }
            };
            let event = match parse_command(&line) {
                Ok(None) => continue,
                Ok(Some(ControlCommand::ClearData)) => {
                    tracing::info!(prompt = lang.text(Label::ClearConfirm), "Clearing data");
                    EngineEvent::ClearData
                }
                Ok(Some(ControlCommand::SetTolerance(v))) => EngineEvent::SetTolerance(v),
                Ok(Some(ControlCommand::RefreshStableToken)) => {
                    refresh.notify_one();
                    continue;
                }
                Ok(Some(ControlCommand::Quit)) => {
                    quit.notify_one();
                    break;
                }
                Err(e) => {
                    eprintln!("{}: {}", lang.text(Label::InvalidValue), e);
                    continue;
                }
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });
}

fn render(engine: &Engine, lang: Language, panel_path: Option<&std::path::Path>) {
    let panel = MetricsPanel::render(&engine.snapshot(now_ms()), lang);
    tracing::debug!(panel = %panel.summary(), "Rendered metrics");
    if let Some(path) = panel_path {
        if let Err(e) = panel.write_json(path) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write panel");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install rustls crypto provider (required by rustls 0.23+)
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    let log_file = std::fs::File::create("alpha-metrics.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                config
                    .logging
                    .level
                    .parse()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
            }),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .json()
        .init();

    tracing::info!(
        rest_url = %config.alpha.rest_base_url,
        probe_dir = %config.probe.dir.display(),
        storage = %config.storage.path.display(),
        "Starting alpha-metrics"
    );

    let store = KvStore::open(&config.storage.path).context("failed to open metrics storage")?;
    let mut engine = Engine::new(&config, store);
    let lang = config.ui.language;
    let panel_path = config
        .ui
        .panel_path
        .clone()
        .filter(|p| !p.as_os_str().is_empty());

    let feed = Arc::new(AlphaRestClient::new(
        &config.alpha.rest_base_url,
        config.alpha.request_timeout_ms,
    )?);
    let probe = FileProbe::new(config.probe.dir.clone());

    let (tx, mut rx) = mpsc::channel::<EngineEvent>(EVENT_CHANNEL_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (current_tx, current_rx) = watch::channel::<Option<String>>(None);
    let (tolerance_tx, tolerance_rx) = watch::channel(engine.tolerance_pct());
    let ranker_refresh = Arc::new(Notify::new());
    let quit = Arc::new(Notify::new());

    spawn_instrument_loop(
        &config,
        feed.clone(),
        probe.clone(),
        tx.clone(),
        current_tx,
        ranker_refresh.clone(),
        shutdown_rx.clone(),
    );
    spawn_tick_loop(&config, feed.clone(), tx.clone(), current_rx.clone(), shutdown_rx.clone());
    spawn_multiplier_loop(&config, feed.clone(), tx.clone(), current_rx.clone(), shutdown_rx.clone());
    spawn_probe_loops(&config, probe, tx.clone(), shutdown_rx.clone());
    spawn_ranker_loop(
        &config,
        feed,
        tx.clone(),
        current_rx,
        tolerance_rx,
        ranker_refresh.clone(),
        shutdown_rx,
    );
    spawn_command_loop(lang, tx, ranker_refresh, quit.clone());

    let mut render_ticker = poll_interval(RENDER_INTERVAL_MS);
    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                engine.apply(event);
                tolerance_tx.send_if_modified(|current| {
                    let latest = engine.tolerance_pct();
                    if *current != latest {
                        *current = latest;
                        true
                    } else {
                        false
                    }
                });
            }
            _ = render_ticker.tick() => render(&engine, lang, panel_path.as_deref()),
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl-C received");
                break;
            }
            _ = quit.notified() => {
                tracing::info!("Quit requested");
                break;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    render(&engine, lang, panel_path.as_deref());
    tracing::info!("alpha-metrics stopped");
    Ok(())
}
