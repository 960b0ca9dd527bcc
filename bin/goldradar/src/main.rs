use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{AlertEvent, Config, EngineCommand, MarketData};
use engine::{CachedMarketData, Engine, YahooClient};
use signal::RadarConfig;
use telegram_ctrl::{start_bot, BotDeps};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    let radar_cfg = RadarConfig::load(&cfg.radar_config_path);
    info!(symbol = %radar_cfg.symbol, "GoldRadar starting");

    // ── Market data (TTL-cached Yahoo chart client) ───────────────────────────
    let market: Arc<dyn MarketData> = Arc::new(CachedMarketData::new(
        YahooClient::new(),
        Duration::from_secs(radar_cfg.cache_ttl_secs),
    ));

    // ── Engine ────────────────────────────────────────────────────────────────
    let (alert_tx, mut alert_rx) = mpsc::channel::<AlertEvent>(64);
    let (engine, engine_handle) = Engine::new(radar_cfg, market, alert_tx)
        .unwrap_or_else(|e| panic!("Invalid radar configuration: {e}"));

    // ── Telegram C2 ───────────────────────────────────────────────────────────
    let bot_deps = BotDeps {
        command_tx: engine_handle.command_sender(),
        engine_state: engine_handle.state_handle(),
        snapshot_rx: engine_handle.subscribe_snapshots(),
        allowed_user_ids: Arc::new(cfg.telegram_allowed_user_ids.clone()),
    };

    // ── Dashboard API ─────────────────────────────────────────────────────────
    let api_state = api::AppState {
        engine_state: engine_handle.state_handle(),
        snapshot_rx: engine_handle.subscribe_snapshots(),
        command_tx: engine_handle.command_sender(),
        dashboard_token: cfg.dashboard_token.clone(),
    };

    // ── Alert forwarder (delivers core events to Telegram) ────────────────────
    let telegram_token = cfg.telegram_token.clone();
    let alert_user_ids: Vec<i64> = cfg.telegram_allowed_user_ids.clone();
    tokio::spawn(async move {
        let bot = teloxide::Bot::new(telegram_token);
        let chat_ids: Vec<teloxide::types::ChatId> = alert_user_ids
            .iter()
            .map(|&id| teloxide::types::ChatId(id))
            .collect();

        while let Some(event) = alert_rx.recv().await {
            let msg = match event {
                AlertEvent::SignalRecorded { classification, price, score } => {
                    format!("🚨 {classification} recorded at {price:.2} (quality {score}%).")
                }
                AlertEvent::LockInReached { reference_price, current_price } => {
                    format!(
                        "🔒 First target reached at {current_price:.2}. Move the stop to break-even ({reference_price:.2})."
                    )
                }
                AlertEvent::ReversalWarning { reference_price, current_price, classification } => {
                    format!(
                        "🛑 Reversal warning! {current_price:.2} is moving against the {classification} reference at {reference_price:.2}."
                    )
                }
            };
            telegram_ctrl::send_alert(&bot, &chat_ids, &msg).await;
        }
    });

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    let port = cfg.dashboard_port;
    tokio::spawn(engine.run());
    tokio::spawn(start_bot(cfg.telegram_token.clone(), bot_deps));
    tokio::spawn(api::serve(api_state, port));

    // The radar evaluates from boot; /stop suspends it.
    engine_handle.send(EngineCommand::Start).await;

    // Keep main alive
    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.unwrap();
    info!("Shutdown signal received. Exiting.");
}
