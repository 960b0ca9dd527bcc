use common::Classification;

/// Require strict agreement between two independently computed timeframe
/// classifications before accepting a signal.
///
/// Conjunctive AND, not an average: only (BUY, BUY) or (SELL, SELL) pass
/// through; any mismatch, or either side NEUTRAL, yields NEUTRAL. A strong
/// signal on one timeframe contradicted by the other must not leak through.
pub fn confluence(primary: Classification, confirm: Classification) -> Classification {
    if primary == confirm {
        primary
    } else {
        Classification::Neutral
    }
}
