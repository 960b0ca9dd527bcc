use chrono::{DateTime, FixedOffset, NaiveTime, Utc};

use common::{Error, Result};

use crate::config::RadarConfig;

/// Decides whether a wall-clock instant falls inside the permitted trading
/// window, in a fixed reference offset. Inclusive on both ends. Stateless.
///
/// This is a hard gate: when inactive, the scorer, confluence checker, and
/// lifecycle monitor do not run at all.
#[derive(Debug, Clone)]
pub struct SessionGate {
    start: NaiveTime,
    end: NaiveTime,
    offset: FixedOffset,
}

impl SessionGate {
    /// Build from config, validating at startup: an inverted window or an
    /// unparsable time is a configuration error, not a per-cycle condition.
    pub fn from_config(cfg: &RadarConfig) -> Result<Self> {
        let start = parse_time(&cfg.session_start)?;
        let end = parse_time(&cfg.session_end)?;
        if start > end {
            return Err(Error::Config(format!(
                "session window start {start} is after end {end}"
            )));
        }

        let offset = FixedOffset::east_opt(cfg.utc_offset_minutes * 60).ok_or_else(|| {
            Error::Config(format!(
                "utc_offset_minutes {} is out of range",
                cfg.utc_offset_minutes
            ))
        })?;

        Ok(Self { start, end, offset })
    }

    /// True when `now`, viewed in the reference offset, is inside [start, end].
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.offset).time();
        self.start <= local && local <= self.end
    }
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|e| Error::Config(format!("invalid session time '{s}': {e}")))
}
