use common::{Bar, Error, IndicatorSnapshot, Result};

use crate::config::RadarConfig;
use crate::indicators::{fib, MovingAverage, RsiIndicator};

/// Computes one immutable `IndicatorSnapshot` per bar series per evaluation
/// cycle. Pure: no mutation, deterministic for identical input.
#[derive(Debug, Clone)]
pub struct IndicatorPipeline {
    ma: MovingAverage,
    rsi: RsiIndicator,
}

impl IndicatorPipeline {
    pub fn new(ma_window: usize, rsi_window: usize) -> Self {
        Self {
            ma: MovingAverage::new(ma_window),
            rsi: RsiIndicator::new(rsi_window),
        }
    }

    pub fn from_config(cfg: &RadarConfig) -> Self {
        Self::new(cfg.ma_window, cfg.rsi_window)
    }

    /// Minimum series length before any indicator is trusted.
    /// The RSI needs one extra close to form its first delta.
    pub fn required_bars(&self) -> usize {
        self.ma.window.max(self.rsi.window + 1)
    }

    /// Build the snapshot, or refuse with `InsufficientData` when the series
    /// is shorter than the longest lookback.
    pub fn snapshot(&self, bars: &[Bar]) -> Result<IndicatorSnapshot> {
        let required = self.required_bars();
        if bars.len() < required {
            return Err(Error::InsufficientData {
                required,
                got: bars.len(),
            });
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

        let moving_average = self.ma.compute(&closes).ok_or(Error::InsufficientData {
            required,
            got: bars.len(),
        })?;
        let rsi = self.rsi.compute(&closes).ok_or(Error::InsufficientData {
            required,
            got: bars.len(),
        })?;

        Ok(IndicatorSnapshot {
            moving_average,
            rsi,
            fib_levels: fib::retracement_levels(bars),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn series(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: Utc.timestamp_opt(1_700_000_000 + i as i64 * 3600, 0).unwrap(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
            })
            .collect()
    }

    #[test]
    fn short_series_is_refused_with_insufficient_data() {
        let pipeline = IndicatorPipeline::new(20, 14);
        let bars = series(&[100.0; 19]);
        match pipeline.snapshot(&bars) {
            Err(Error::InsufficientData { required: 20, got: 19 }) => {}
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn required_bars_is_the_longest_lookback() {
        // RSI needs window+1 closes; MA dominates at the defaults
        assert_eq!(IndicatorPipeline::new(20, 14).required_bars(), 20);
        assert_eq!(IndicatorPipeline::new(10, 14).required_bars(), 15);
    }

    #[test]
    fn snapshot_is_deterministic_for_identical_input() {
        let pipeline = IndicatorPipeline::new(5, 3);
        let bars = series(&[100.0, 101.0, 99.0, 102.0, 103.0, 101.5, 104.0]);
        let a = pipeline.snapshot(&bars).unwrap();
        let b = pipeline.snapshot(&bars).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn snapshot_carries_all_three_fib_levels() {
        let pipeline = IndicatorPipeline::new(5, 3);
        let bars = series(&[100.0, 101.0, 99.0, 102.0, 103.0]);
        let snap = pipeline.snapshot(&bars).unwrap();
        assert_eq!(snap.fib_levels.len(), 3);
    }
}
