use common::{Bar, FibLevel};

/// Retracement ratios and their display labels, golden ratio included.
pub const RETRACEMENT_RATIOS: [(&str, f64); 3] =
    [("38.2%", 0.382), ("50%", 0.5), ("61.8%", 0.618)];

/// Fibonacci retracement levels from the maximum high and minimum low across
/// the entire series: `high − ratio × (high − low)`.
///
/// Returns an empty vec for an empty series; with at least one bar all three
/// levels are produced (a zero-range series collapses them onto the price).
pub fn retracement_levels(bars: &[Bar]) -> Vec<FibLevel> {
    if bars.is_empty() {
        return Vec::new();
    }

    let high = bars.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = bars.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let range = high - low;

    RETRACEMENT_RATIOS
        .iter()
        .map(|&(label, ratio)| FibLevel {
            label: label.to_string(),
            price: high - ratio * range,
        })
        .collect()
}
