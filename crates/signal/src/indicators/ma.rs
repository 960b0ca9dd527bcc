/// Simple moving average of the last `window` closes.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    pub window: usize,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "moving-average window must be >= 2");
        Self { window }
    }

    /// Compute the mean of the trailing `window` closes (oldest first).
    /// Returns `None` if there are fewer than `window` values.
    pub fn compute(&self, closes: &[f64]) -> Option<f64> {
        if closes.len() < self.window {
            return None;
        }
        let tail = &closes[closes.len() - self.window..];
        Some(tail.iter().sum::<f64>() / self.window as f64)
    }
}
