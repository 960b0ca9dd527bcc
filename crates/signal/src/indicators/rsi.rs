/// RSI (Relative Strength Index) over a trailing window of close-to-close
/// deltas.
///
/// Average gain and average loss are plain means of the last `window` deltas
/// (positive deltas and absolute negative deltas respectively), mapped to
/// `100 − 100/(1 + gain/loss)`.
///
/// Zero-loss rule: when the average loss is exactly 0 — a monotonically
/// rising window, or the fully flat degenerate series — RSI is defined as
/// 100, never NaN.
#[derive(Debug, Clone)]
pub struct RsiIndicator {
    pub window: usize,
}

impl RsiIndicator {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "RSI window must be >= 2");
        Self { window }
    }

    /// Compute RSI from a slice of close prices (oldest first).
    /// Returns `None` if there are fewer than `window + 1` values.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() < self.window + 1 {
            return None;
        }

        let tail = &closes[closes.len() - self.window - 1..];
        let mut gain_sum = 0.0;
        let mut loss_sum = 0.0;
        for w in tail.windows(2) {
            let delta = w[1] - w[0];
            if delta > 0.0 {
                gain_sum += delta;
            } else {
                loss_sum += delta.abs();
            }
        }

        let avg_gain = gain_sum / self.window as f64;
        let avg_loss = loss_sum / self.window as f64;

        if avg_loss == 0.0 {
            return Some(100.0);
        }

        let rs = avg_gain / avg_loss;
        Some(100.0 - 100.0 / (1.0 + rs))
    }
}
