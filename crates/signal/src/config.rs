use serde::{Deserialize, Serialize};
use tracing::info;

use common::{Error, Result};

/// Radar tuning loaded from TOML. Every field has a default, so an empty
/// file is valid; `validate()` runs once at startup and rejects bad values
/// before the first cycle.
///
/// Example `config/radar.toml`:
/// ```toml
/// symbol = "GC=F"
/// primary_interval = "1h"
/// confirm_interval = "15m"
/// fib_tolerance = 1.5
/// session_start = "08:00"
/// session_end = "12:00"
/// utc_offset_minutes = 60
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    /// Instrument symbol at the data provider.
    pub symbol: String,
    /// Timeframe the signal is computed on.
    pub primary_interval: String,
    /// Finer timeframe that must agree before a signal is accepted.
    pub confirm_interval: String,
    /// Provider lookback range, e.g. "5d".
    pub lookback_range: String,

    pub ma_window: usize,
    pub rsi_window: usize,
    /// RSI classification thresholds — stricter than the scoring band.
    pub rsi_buy_threshold: f64,
    pub rsi_sell_threshold: f64,
    /// RSI neutral band for the momentum score bonus.
    pub rsi_band_high: f64,
    pub rsi_band_low: f64,
    /// Absolute price distance that counts as "at" a retracement level.
    pub fib_tolerance: f64,

    /// Favorable distance (price units) that triggers the break-even advisory.
    pub profit_lock: f64,
    /// Adverse distance (price units) that triggers the reversal warning.
    pub reversal_warn: f64,

    /// Fixed risk budget per trade, in account currency.
    pub risk_budget_usd: f64,
    /// Protective stop distance in price units.
    pub stop_distance: f64,
    /// Target distance in price units.
    pub target_distance: f64,
    /// Currency value of one price unit for one lot.
    pub point_value: f64,

    /// Trading window bounds in the reference offset, "%H:%M", inclusive.
    pub session_start: String,
    pub session_end: String,
    /// Reference timezone as a fixed UTC offset (the session zone has no DST).
    pub utc_offset_minutes: i32,

    pub poll_interval_secs: u64,
    /// Freshness window of the bar cache; bounds the provider call rate.
    pub cache_ttl_secs: u64,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            symbol: "GC=F".to_string(),
            primary_interval: "1h".to_string(),
            confirm_interval: "15m".to_string(),
            lookback_range: "5d".to_string(),
            ma_window: 20,
            rsi_window: 14,
            rsi_buy_threshold: 62.0,
            rsi_sell_threshold: 38.0,
            rsi_band_high: 60.0,
            rsi_band_low: 40.0,
            fib_tolerance: 1.5,
            profit_lock: 4.5,
            reversal_warn: 2.5,
            risk_budget_usd: 25.0,
            stop_distance: 4.0,
            target_distance: 4.5,
            point_value: 10.0,
            session_start: "08:00".to_string(),
            session_end: "12:00".to_string(),
            utc_offset_minutes: 60,
            poll_interval_secs: 30,
            cache_ttl_secs: 60,
        }
    }
}

impl RadarConfig {
    /// Load from a TOML file. Exits process on read or parse error.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read radar config at '{path}': {e}"));
        let cfg: RadarConfig = toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse radar config at '{path}': {e}"));
        info!(path, symbol = %cfg.symbol, "Radar config loaded");
        cfg
    }

    /// Startup validation. Nothing else in the core is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.ma_window < 2 {
            return Err(Error::Config("ma_window must be >= 2".into()));
        }
        if self.rsi_window < 2 {
            return Err(Error::Config("rsi_window must be >= 2".into()));
        }
        if self.rsi_sell_threshold >= self.rsi_buy_threshold {
            return Err(Error::Config(format!(
                "rsi_sell_threshold {} must be below rsi_buy_threshold {}",
                self.rsi_sell_threshold, self.rsi_buy_threshold
            )));
        }
        if self.rsi_band_low >= self.rsi_band_high {
            return Err(Error::Config(format!(
                "rsi_band_low {} must be below rsi_band_high {}",
                self.rsi_band_low, self.rsi_band_high
            )));
        }
        for (name, value) in [
            ("fib_tolerance", self.fib_tolerance),
            ("profit_lock", self.profit_lock),
            ("reversal_warn", self.reversal_warn),
            ("risk_budget_usd", self.risk_budget_usd),
            ("stop_distance", self.stop_distance),
            ("target_distance", self.target_distance),
            ("point_value", self.point_value),
        ] {
            if !(value > 0.0) {
                return Err(Error::Config(format!("{name} must be positive, got {value}")));
            }
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::Config("poll_interval_secs must be >= 1".into()));
        }
        if self.cache_ttl_secs == 0 {
            return Err(Error::Config("cache_ttl_secs must be >= 1".into()));
        }

        // Session window: parse, ordering, and offset range checks.
        crate::gate::SessionGate::from_config(self)?;

        Ok(())
    }
}
