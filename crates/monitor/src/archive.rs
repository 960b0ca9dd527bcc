use chrono::{DateTime, Utc};

use common::{ArchiveEntry, Classification};

/// Result of an archive append. `Recorded` is the trigger for an external
/// notification; `Suppressed` means the entry duplicated the most recent one
/// within the same minute bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Recorded,
    Suppressed,
}

/// Deduplicated, newest-first log of accepted signals.
///
/// Suppression looks at the most recent entry only: a new entry whose
/// minute-truncated timestamp and classification both match it is dropped.
/// No eviction by size or age; `clear` (via the session monitor) is the only
/// eviction path.
#[derive(Debug, Default)]
pub struct SignalArchive {
    entries: Vec<ArchiveEntry>,
}

impl SignalArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        classification: Classification,
        price: f64,
        score: u8,
        timestamp: DateTime<Utc>,
    ) -> AppendOutcome {
        if let Some(latest) = self.entries.first() {
            if minute_bucket(latest.timestamp) == minute_bucket(timestamp)
                && latest.classification == classification
            {
                return AppendOutcome::Suppressed;
            }
        }

        self.entries.insert(
            0,
            ArchiveEntry {
                timestamp,
                classification,
                price,
                score,
            },
        );
        AppendOutcome::Recorded
    }

    /// Newest first.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Callers go through `SessionMonitor::clear` so the trade reference is
    /// reset in the same operation.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

fn minute_bucket(ts: DateTime<Utc>) -> i64 {
    ts.timestamp().div_euclid(60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, s).unwrap()
    }

    #[test]
    fn same_minute_same_classification_is_suppressed() {
        let mut archive = SignalArchive::new();
        let first = archive.append(Classification::PremiumBuy, 2000.0, 80, at(9, 15, 10));
        let second = archive.append(Classification::PremiumBuy, 2000.5, 85, at(9, 15, 55));
        assert_eq!(first, AppendOutcome::Recorded);
        assert_eq!(second, AppendOutcome::Suppressed);
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn different_classification_in_same_minute_appends() {
        let mut archive = SignalArchive::new();
        archive.append(Classification::PremiumBuy, 2000.0, 80, at(9, 15, 10));
        let out = archive.append(Classification::PremiumSell, 1999.0, 80, at(9, 15, 40));
        assert_eq!(out, AppendOutcome::Recorded);
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn later_minute_always_appends() {
        let mut archive = SignalArchive::new();
        archive.append(Classification::PremiumBuy, 2000.0, 80, at(9, 15, 59));
        let out = archive.append(Classification::PremiumBuy, 2000.1, 80, at(9, 16, 0));
        assert_eq!(out, AppendOutcome::Recorded);
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn newest_entry_is_first() {
        let mut archive = SignalArchive::new();
        archive.append(Classification::PremiumBuy, 2000.0, 80, at(9, 15, 0));
        archive.append(Classification::PremiumSell, 1999.0, 85, at(9, 20, 0));
        let entries = archive.entries();
        assert_eq!(entries[0].classification, Classification::PremiumSell);
        assert_eq!(entries[1].classification, Classification::PremiumBuy);
    }

    #[test]
    fn suppression_only_compares_the_most_recent_entry() {
        let mut archive = SignalArchive::new();
        archive.append(Classification::PremiumBuy, 2000.0, 80, at(9, 15, 0));
        archive.append(Classification::PremiumSell, 1999.0, 85, at(9, 15, 20));
        // Same minute and classification as the FIRST entry, but the most
        // recent entry is a SELL — so this records.
        let out = archive.append(Classification::PremiumBuy, 2000.2, 80, at(9, 15, 40));
        assert_eq!(out, AppendOutcome::Recorded);
        assert_eq!(archive.len(), 3);
    }
}
