use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{info, warn};

use common::{
    Advisory, AlertEvent, Classification, DisplaySnapshot, EngineCommand, EngineState, Error,
    FibLevel, MarketData, Result,
};
use monitor::{MonitorConfig, SessionMonitor};
use signal::{CompositeScorer, IndicatorPipeline, RadarConfig, SessionGate};

use crate::cycle;

/// Cloneable handle passed to other crates (Telegram, API).
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    state: Arc<RwLock<EngineState>>,
    snapshot_rx: watch::Receiver<DisplaySnapshot>,
}

impl EngineHandle {
    pub async fn send(&self, cmd: EngineCommand) {
        let _ = self.command_tx.send(cmd).await;
    }

    pub async fn state(&self) -> EngineState {
        *self.state.read().await
    }

    /// Latest published display snapshot.
    pub fn snapshot(&self) -> DisplaySnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshot updates (for the dashboard WebSocket).
    pub fn subscribe_snapshots(&self) -> watch::Receiver<DisplaySnapshot> {
        self.snapshot_rx.clone()
    }

    /// Shared engine-state cell, read by the Telegram bot and the dashboard.
    pub fn state_handle(&self) -> Arc<RwLock<EngineState>> {
        self.state.clone()
    }

    /// Sender for operator commands.
    pub fn command_sender(&self) -> mpsc::Sender<EngineCommand> {
        self.command_tx.clone()
    }
}

/// The main engine: drives the evaluation cycle on a fixed cadence and
/// processes operator commands.
///
/// Evaluations are cycle-driven and run to completion before the next tick
/// is processed — the session monitor is owned by this task, so archive
/// appends, reference mutation, and `ClearSession` are linearizable without
/// locks.
pub struct Engine {
    cfg: RadarConfig,
    market: Arc<dyn MarketData>,
    pipeline: IndicatorPipeline,
    scorer: CompositeScorer,
    gate: SessionGate,
    monitor: SessionMonitor,
    state: Arc<RwLock<EngineState>>,
    snapshot_tx: watch::Sender<DisplaySnapshot>,
    alert_tx: mpsc::Sender<AlertEvent>,
    command_rx: mpsc::Receiver<EngineCommand>,
    #[allow(dead_code)] // kept to prevent channel close
    command_tx: mpsc::Sender<EngineCommand>,
    /// Last successfully fetched close, retained for display across
    /// degraded cycles.
    last_price: Option<f64>,
}

impl Engine {
    /// Build the engine, failing fast on configuration errors.
    pub fn new(
        cfg: RadarConfig,
        market: Arc<dyn MarketData>,
        alert_tx: mpsc::Sender<AlertEvent>,
    ) -> Result<(Self, EngineHandle)> {
        cfg.validate()?;
        let gate = SessionGate::from_config(&cfg)?;

        let (command_tx, command_rx) = mpsc::channel(32);
        let (snapshot_tx, snapshot_rx) = watch::channel(DisplaySnapshot::waiting(&cfg.symbol));
        let state = Arc::new(RwLock::new(EngineState::Stopped));

        let handle = EngineHandle {
            command_tx: command_tx.clone(),
            state: state.clone(),
            snapshot_rx,
        };

        let monitor = SessionMonitor::new(MonitorConfig {
            profit_lock: cfg.profit_lock,
            reversal_warn: cfg.reversal_warn,
            risk_budget_usd: cfg.risk_budget_usd,
            stop_distance: cfg.stop_distance,
            target_distance: cfg.target_distance,
            point_value: cfg.point_value,
        });

        let engine = Engine {
            pipeline: IndicatorPipeline::from_config(&cfg),
            scorer: CompositeScorer::from_config(&cfg),
            gate,
            monitor,
            cfg,
            market,
            state,
            snapshot_tx,
            alert_tx,
            command_rx,
            command_tx,
            last_price: None,
        };

        Ok((engine, handle))
    }

    /// Run the engine. Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(symbol = %self.cfg.symbol, "Engine initialized in Stopped state. Waiting for Start command.");

        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.cfg.poll_interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(EngineCommand::Start) => {
                        let current = *self.state.read().await;
                        if current == EngineState::Running {
                            info!("Engine already running");
                            continue;
                        }
                        info!("Starting evaluation cycles");
                        *self.state.write().await = EngineState::Running;
                        self.evaluate_once(Utc::now()).await;
                    }

                    Some(EngineCommand::Stop) => {
                        info!("Engine stopped — evaluation suspended");
                        *self.state.write().await = EngineState::Stopped;
                    }

                    Some(EngineCommand::ClearSession) => {
                        // Archive and trade reference reset as one unit.
                        self.monitor.clear();
                        let active = self.gate.is_active_at(Utc::now());
                        self.publish(self.last_price, active, Classification::Neutral, 0, Vec::new(), None);
                    }

                    None => {
                        warn!("Engine command channel closed — shutting down");
                        break;
                    }
                },

                _ = ticker.tick() => {
                    if *self.state.read().await != EngineState::Running {
                        continue;
                    }
                    self.evaluate_once(Utc::now()).await;
                }
            }
        }
    }

    /// One evaluation cycle. Every failure path degrades to a published
    /// waiting/idle snapshot — nothing propagates to the callers.
    async fn evaluate_once(&mut self, now: DateTime<Utc>) {
        let primary = match self
            .market
            .fetch_bars(&self.cfg.symbol, &self.cfg.primary_interval, &self.cfg.lookback_range)
            .await
        {
            Ok(bars) if !bars.is_empty() => bars,
            Ok(_) => {
                warn!("Provider returned an empty series — waiting");
                self.publish_waiting();
                return;
            }
            Err(e) => {
                warn!(error = %e, "Bar fetch failed — waiting");
                self.publish_waiting();
                return;
            }
        };

        let price = primary[primary.len() - 1].close;
        self.last_price = Some(price);

        // Hard gate: outside the session window nothing downstream runs.
        if !self.gate.is_active_at(now) {
            self.publish(Some(price), false, Classification::Neutral, 0, Vec::new(), None);
            return;
        }

        let confirm = match self
            .market
            .fetch_bars(&self.cfg.symbol, &self.cfg.confirm_interval, &self.cfg.lookback_range)
            .await
        {
            Ok(bars) if !bars.is_empty() => bars,
            Ok(_) => {
                warn!("Provider returned an empty confirm series — waiting");
                self.publish_waiting();
                return;
            }
            Err(e) => {
                warn!(error = %e, "Confirm fetch failed — waiting");
                self.publish_waiting();
                return;
            }
        };

        match cycle::run_cycle(
            &primary,
            &confirm,
            now,
            &mut self.monitor,
            &self.pipeline,
            &self.scorer,
        ) {
            Ok(outcome) => {
                for alert in &outcome.alerts {
                    let _ = self.alert_tx.send(alert.clone()).await;
                }
                self.publish(
                    Some(outcome.price),
                    true,
                    outcome.classification,
                    outcome.score,
                    outcome.snapshot.fib_levels,
                    outcome.advisory,
                );
            }
            Err(Error::InsufficientData { required, got }) => {
                info!(required, got, "Series shorter than the required lookback — waiting");
                self.publish(Some(price), true, Classification::Neutral, 0, Vec::new(), None);
            }
            Err(e) => {
                warn!(error = %e, "Evaluation cycle failed — waiting");
                self.publish_waiting();
            }
        }
    }

    fn publish_waiting(&self) {
        self.publish(None, false, Classification::Neutral, 0, Vec::new(), None);
    }

    fn publish(
        &self,
        price: Option<f64>,
        session_active: bool,
        classification: Classification,
        score: u8,
        fib_levels: Vec<FibLevel>,
        advisory: Option<Advisory>,
    ) {
        let snapshot = DisplaySnapshot {
            symbol: self.cfg.symbol.clone(),
            price,
            session_active,
            classification,
            score,
            fib_levels,
            trade_reference: self.monitor.reference(),
            advisory,
            plan: self.monitor.plan(),
            archive: self.monitor.archive_entries().to_vec(),
            updated_at: Utc::now(),
        };
        let _ = self.snapshot_tx.send(snapshot);
    }
}
