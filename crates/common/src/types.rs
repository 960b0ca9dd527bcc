use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLC bar returned by the market-data provider.
/// Series are ordered ascending by timestamp with no duplicates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Direction of a notional position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Signal classification derived from the current indicator snapshot and the
/// latest close. Carries no memory of prior cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    #[default]
    Neutral,
    PremiumBuy,
    PremiumSell,
}

impl Classification {
    pub fn is_premium(&self) -> bool {
        !matches!(self, Classification::Neutral)
    }

    /// Position direction implied by a premium classification.
    pub fn side(&self) -> Option<Side> {
        match self {
            Classification::PremiumBuy => Some(Side::Buy),
            Classification::PremiumSell => Some(Side::Sell),
            Classification::Neutral => None,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Neutral => write!(f, "NEUTRAL"),
            Classification::PremiumBuy => write!(f, "PREMIUM BUY"),
            Classification::PremiumSell => write!(f, "PREMIUM SELL"),
        }
    }
}

/// A named Fibonacci retracement level, e.g. ("61.8%", 2312.40).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FibLevel {
    pub label: String,
    pub price: f64,
}

/// Immutable per-cycle indicator readings. Produced once per bar series per
/// evaluation cycle by the indicator pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub moving_average: f64,
    /// Always within [0, 100]; exactly 100 when the trailing average loss is zero.
    pub rsi: f64,
    pub fib_levels: Vec<FibLevel>,
}

/// Entry price of the currently tracked notional position.
/// Overwritten by each accepted premium signal; cleared only together with
/// the archive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeReference {
    pub price: f64,
    pub direction: Side,
}

/// One accepted signal in the archive. Newest-first ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub timestamp: DateTime<Utc>,
    pub classification: Classification,
    pub price: f64,
    pub score: u8,
}

/// Lifecycle advisory for the open reference, shown on the dashboard while
/// the condition holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    /// Favorable distance reached the profit-lock threshold: move the
    /// protective stop to break-even.
    LockIn,
    /// Adverse distance reached the reversal threshold while the signal
    /// direction still matches the reference.
    Reversal,
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisory::LockIn => write!(f, "lock-in"),
            Advisory::Reversal => write!(f, "reversal-warning"),
        }
    }
}

/// Deterministic stop/target/size plan for an accepted signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradePlan {
    pub lot_size: f64,
    pub stop_price: f64,
    pub target_price: f64,
}

/// Alert severity passed to the notification layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Events the core raises for the notification layer. Delivery (Telegram,
/// audio) is the collaborator's concern.
#[derive(Debug, Clone)]
pub enum AlertEvent {
    SignalRecorded {
        classification: Classification,
        price: f64,
        score: u8,
    },
    LockInReached {
        reference_price: f64,
        current_price: f64,
    },
    ReversalWarning {
        reference_price: f64,
        current_price: f64,
        classification: Classification,
    },
}

impl AlertEvent {
    pub fn severity(&self) -> Severity {
        match self {
            AlertEvent::SignalRecorded { .. } => Severity::Info,
            AlertEvent::LockInReached { .. } => Severity::Warning,
            AlertEvent::ReversalWarning { .. } => Severity::Critical,
        }
    }
}

/// Read-only view published to the dashboard after every evaluation cycle.
/// The presentation layer renders these values and never computes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub symbol: String,
    /// `None` until the first successful fetch — the "waiting" state.
    pub price: Option<f64>,
    pub session_active: bool,
    pub classification: Classification,
    pub score: u8,
    pub fib_levels: Vec<FibLevel>,
    pub trade_reference: Option<TradeReference>,
    pub advisory: Option<Advisory>,
    pub plan: Option<TradePlan>,
    pub archive: Vec<ArchiveEntry>,
    pub updated_at: DateTime<Utc>,
}

impl DisplaySnapshot {
    /// Initial snapshot shown before the first cycle completes.
    pub fn waiting(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price: None,
            session_active: false,
            classification: Classification::Neutral,
            score: 0,
            fib_levels: Vec::new(),
            trade_reference: None,
            advisory: None,
            plan: None,
            archive: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Current state of the evaluation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Stopped,
    Running,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Stopped => write!(f, "stopped"),
            EngineState::Running => write!(f, "running"),
        }
    }
}

/// Commands sent to the engine via the command channel.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    Start,
    Stop,
    /// Empty the signal archive and reset the trade reference as one unit.
    ClearSession,
}
