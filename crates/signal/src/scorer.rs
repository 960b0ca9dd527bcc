use common::{Classification, IndicatorSnapshot, Side};

use crate::config::RadarConfig;

/// Neutral prior before any bonus applies.
pub const BASE_SCORE: u8 = 50;
/// Close strictly on the trend side of the moving average.
pub const TREND_BONUS: u8 = 15;
/// RSI outside the neutral band.
pub const MOMENTUM_BONUS: u8 = 15;
/// Close within tolerance of a retracement level.
pub const FIB_BONUS: u8 = 20;
/// Never report absolute certainty.
pub const SCORE_CAP: u8 = 99;

/// Combines one indicator snapshot and the latest close into a 0–99
/// confidence score and a discrete classification.
///
/// Scoring and classification read the same snapshot but are logically
/// independent: the 62/38 classification thresholds are intentionally
/// stricter than the 60/40 band that earns the momentum bonus.
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    pub rsi_buy_threshold: f64,
    pub rsi_sell_threshold: f64,
    pub rsi_band_high: f64,
    pub rsi_band_low: f64,
    pub fib_tolerance: f64,
}

impl CompositeScorer {
    pub fn from_config(cfg: &RadarConfig) -> Self {
        Self {
            rsi_buy_threshold: cfg.rsi_buy_threshold,
            rsi_sell_threshold: cfg.rsi_sell_threshold,
            rsi_band_high: cfg.rsi_band_high,
            rsi_band_low: cfg.rsi_band_low,
            fib_tolerance: cfg.fib_tolerance,
        }
    }

    /// Additive score over independently evaluated conditions, capped at 99.
    /// Monotonic: satisfying more conditions never lowers the result.
    pub fn score(&self, snapshot: &IndicatorSnapshot, close: f64) -> u8 {
        let mut score = BASE_SCORE;

        if trend_side(snapshot.moving_average, close).is_some() {
            score += TREND_BONUS;
        }

        if snapshot.rsi > self.rsi_band_high || snapshot.rsi < self.rsi_band_low {
            score += MOMENTUM_BONUS;
        }

        let near_fib = snapshot
            .fib_levels
            .iter()
            .any(|level| (close - level.price).abs() <= self.fib_tolerance);
        if near_fib {
            score += FIB_BONUS;
        }

        score.min(SCORE_CAP)
    }

    /// PREMIUM BUY iff close > MA and RSI > 62; PREMIUM SELL iff close < MA
    /// and RSI < 38; otherwise NEUTRAL. The MA comparison makes the two
    /// premium outcomes mutually exclusive without tie-breaking.
    pub fn classify(&self, snapshot: &IndicatorSnapshot, close: f64) -> Classification {
        if close > snapshot.moving_average && snapshot.rsi > self.rsi_buy_threshold {
            Classification::PremiumBuy
        } else if close < snapshot.moving_average && snapshot.rsi < self.rsi_sell_threshold {
            Classification::PremiumSell
        } else {
            Classification::Neutral
        }
    }
}

/// Direction a close strictly off the moving average would back.
/// `close == ma` backs neither side and earns no trend bonus.
fn trend_side(ma: f64, close: f64) -> Option<Side> {
    if close > ma {
        Some(Side::Buy)
    } else if close < ma {
        Some(Side::Sell)
    } else {
        None
    }
}
