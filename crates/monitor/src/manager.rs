use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use common::{
    Advisory, AlertEvent, ArchiveEntry, Classification, Side, TradePlan, TradeReference,
};

use crate::archive::{AppendOutcome, SignalArchive};

/// Distance thresholds and sizing parameters for the lifecycle monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Favorable distance (price units) that triggers the break-even advisory.
    pub profit_lock: f64,
    /// Adverse distance (price units) that triggers the reversal warning.
    pub reversal_warn: f64,
    /// Fixed risk budget per trade in account currency.
    pub risk_budget_usd: f64,
    /// Protective stop distance in price units.
    pub stop_distance: f64,
    /// Target distance in price units.
    pub target_distance: f64,
    /// Currency value of one price unit for one lot.
    pub point_value: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            profit_lock: 4.5,
            reversal_warn: 2.5,
            risk_budget_usd: 25.0,
            stop_distance: 4.0,
            target_distance: 4.5,
            point_value: 10.0,
        }
    }
}

/// Result of a lifecycle check: the advisory to display, plus the alert to
/// raise when this is the first cycle the condition holds for the current
/// reference.
#[derive(Debug, Clone)]
pub struct LifecycleOutcome {
    pub advisory: Advisory,
    pub alert: Option<AlertEvent>,
}

/// Trade reference plus its per-reference alert latches.
#[derive(Debug, Clone, Copy)]
struct ReferenceState {
    reference: TradeReference,
    lock_in_alerted: bool,
    reversal_alerted: bool,
}

/// The only cross-cycle state in the core: the open trade reference and the
/// signal archive, owned as one unit so `clear` can never leave a stale
/// reference outliving its log trail.
///
/// Single-threaded by construction — the engine task owns it, making archive
/// appends, reference mutation, and clear linearizable with each other.
#[derive(Debug)]
pub struct SessionMonitor {
    config: MonitorConfig,
    archive: SignalArchive,
    reference: Option<ReferenceState>,
}

impl SessionMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            archive: SignalArchive::new(),
            reference: None,
        }
    }

    pub fn reference(&self) -> Option<TradeReference> {
        self.reference.map(|s| s.reference)
    }

    /// Archive entries, newest first.
    pub fn archive_entries(&self) -> &[ArchiveEntry] {
        self.archive.entries()
    }

    /// Record an accepted (confluence-passed) premium signal.
    ///
    /// The trade reference is overwritten on every accepted signal — even
    /// when the archive suppresses a same-minute duplicate — and its alert
    /// latches reset. Returns the archive outcome; `Recorded` is the
    /// notification trigger.
    pub fn accept_signal(
        &mut self,
        classification: Classification,
        price: f64,
        score: u8,
        now: DateTime<Utc>,
    ) -> AppendOutcome {
        let Some(direction) = classification.side() else {
            // Neutral never reaches here through the engine cycle.
            warn!("accept_signal called with a neutral classification");
            return AppendOutcome::Suppressed;
        };

        self.reference = Some(ReferenceState {
            reference: TradeReference { price, direction },
            lock_in_alerted: false,
            reversal_alerted: false,
        });

        let outcome = self.archive.append(classification, price, score, now);
        if outcome == AppendOutcome::Recorded {
            info!(%classification, price, score, "Signal recorded");
        }
        outcome
    }

    /// Classify distance-based events for the active reference.
    ///
    /// Favorable distance is `price − reference` for BUY and the inverse for
    /// SELL. The profit-lock and reversal checks are alternatives within a
    /// single evaluation — one signed value cannot satisfy both. Advisories
    /// re-display every cycle; alerts fire once per reference (latched).
    pub fn check_lifecycle(
        &mut self,
        price: f64,
        active: Classification,
    ) -> Option<LifecycleOutcome> {
        let state = self.reference.as_mut()?;
        let reference_price = state.reference.price;

        let favorable = match state.reference.direction {
            Side::Buy => price - reference_price,
            Side::Sell => reference_price - price,
        };

        if favorable >= self.config.profit_lock {
            let alert = if state.lock_in_alerted {
                None
            } else {
                state.lock_in_alerted = true;
                info!(reference_price, price, "Profit-lock threshold reached");
                Some(AlertEvent::LockInReached {
                    reference_price,
                    current_price: price,
                })
            };
            return Some(LifecycleOutcome {
                advisory: Advisory::LockIn,
                alert,
            });
        }

        let adverse = -favorable;
        if adverse >= self.config.reversal_warn && active.side() == Some(state.reference.direction)
        {
            let alert = if state.reversal_alerted {
                None
            } else {
                state.reversal_alerted = true;
                warn!(reference_price, price, "Reversal warning threshold reached");
                Some(AlertEvent::ReversalWarning {
                    reference_price,
                    current_price: price,
                    classification: active,
                })
            };
            return Some(LifecycleOutcome {
                advisory: Advisory::Reversal,
                alert,
            });
        }

        None
    }

    /// Stop, target, and lot size for the active reference. Pure math:
    /// `lot = risk_budget / (stop_distance × point_value)`.
    pub fn plan(&self) -> Option<TradePlan> {
        let state = self.reference.as_ref()?;
        let cfg = &self.config;
        let lot_size = cfg.risk_budget_usd / (cfg.stop_distance * cfg.point_value);
        let price = state.reference.price;

        let (stop_price, target_price) = match state.reference.direction {
            Side::Buy => (price - cfg.stop_distance, price + cfg.target_distance),
            Side::Sell => (price + cfg.stop_distance, price - cfg.target_distance),
        };

        Some(TradePlan {
            lot_size,
            stop_price,
            target_price,
        })
    }

    /// Empty the archive and reset the trade reference as one operation.
    /// No partial state is observable afterwards.
    pub fn clear(&mut self) {
        self.archive.clear();
        self.reference = None;
        info!("Session cleared — archive emptied and trade reference reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, s).unwrap()
    }

    fn monitor_with_buy_at(price: f64) -> SessionMonitor {
        let mut m = SessionMonitor::new(MonitorConfig::default());
        m.accept_signal(Classification::PremiumBuy, price, 80, at(9, 0, 0));
        m
    }

    #[test]
    fn lock_in_fires_when_favorable_distance_reaches_threshold() {
        let mut m = monitor_with_buy_at(2000.0);
        let outcome = m
            .check_lifecycle(2004.5, Classification::PremiumBuy)
            .expect("advisory expected");
        assert_eq!(outcome.advisory, Advisory::LockIn);
        assert!(matches!(outcome.alert, Some(AlertEvent::LockInReached { .. })));
    }

    #[test]
    fn reversal_fires_when_adverse_and_direction_still_matches() {
        let mut m = monitor_with_buy_at(2000.0);
        let outcome = m
            .check_lifecycle(1997.4, Classification::PremiumBuy)
            .expect("advisory expected");
        assert_eq!(outcome.advisory, Advisory::Reversal);
        assert!(matches!(outcome.alert, Some(AlertEvent::ReversalWarning { .. })));
    }

    #[test]
    fn reversal_needs_the_matching_direction() {
        let mut m = monitor_with_buy_at(2000.0);
        // Adverse distance, but the active classification flipped
        assert!(m.check_lifecycle(1997.0, Classification::PremiumSell).is_none());
        assert!(m.check_lifecycle(1997.0, Classification::Neutral).is_none());
    }

    #[test]
    fn checks_are_alternatives_within_one_evaluation() {
        let mut m = monitor_with_buy_at(2000.0);
        // Small move in either direction: neither threshold reached
        assert!(m.check_lifecycle(2001.0, Classification::PremiumBuy).is_none());
        assert!(m.check_lifecycle(1998.0, Classification::PremiumBuy).is_none());
    }

    #[test]
    fn sell_direction_inverts_the_distances() {
        let mut m = SessionMonitor::new(MonitorConfig::default());
        m.accept_signal(Classification::PremiumSell, 2000.0, 80, at(9, 0, 0));

        let lock = m.check_lifecycle(1995.5, Classification::PremiumSell).unwrap();
        assert_eq!(lock.advisory, Advisory::LockIn);

        let mut m = SessionMonitor::new(MonitorConfig::default());
        m.accept_signal(Classification::PremiumSell, 2000.0, 80, at(9, 0, 0));
        let rev = m.check_lifecycle(2002.6, Classification::PremiumSell).unwrap();
        assert_eq!(rev.advisory, Advisory::Reversal);
    }

    #[test]
    fn alerts_are_latched_but_advisories_repeat() {
        let mut m = monitor_with_buy_at(2000.0);

        let first = m.check_lifecycle(2005.0, Classification::PremiumBuy).unwrap();
        assert!(first.alert.is_some());

        let second = m.check_lifecycle(2006.0, Classification::PremiumBuy).unwrap();
        assert_eq!(second.advisory, Advisory::LockIn);
        assert!(second.alert.is_none(), "alert must not re-fire while latched");
    }

    #[test]
    fn accepting_a_new_signal_resets_the_latches() {
        let mut m = monitor_with_buy_at(2000.0);
        m.check_lifecycle(2005.0, Classification::PremiumBuy).unwrap();

        // New accepted signal overwrites the reference and re-arms alerts
        m.accept_signal(Classification::PremiumBuy, 2010.0, 85, at(9, 30, 0));
        assert_eq!(m.reference().unwrap().price, 2010.0);

        let outcome = m.check_lifecycle(2014.5, Classification::PremiumBuy).unwrap();
        assert!(outcome.alert.is_some());
    }

    #[test]
    fn reference_overwritten_even_when_archive_suppresses() {
        let mut m = SessionMonitor::new(MonitorConfig::default());
        m.accept_signal(Classification::PremiumBuy, 2000.0, 80, at(9, 0, 10));
        let outcome = m.accept_signal(Classification::PremiumBuy, 2001.5, 82, at(9, 0, 50));
        assert_eq!(outcome, AppendOutcome::Suppressed);
        assert_eq!(m.archive_entries().len(), 1);
        // The reference still moved to the newest accepted price
        assert_eq!(m.reference().unwrap().price, 2001.5);
    }

    #[test]
    fn clear_resets_archive_and_reference_together() {
        let mut m = monitor_with_buy_at(2000.0);
        assert!(!m.archive_entries().is_empty());
        assert!(m.reference().is_some());

        m.clear();

        assert!(m.archive_entries().is_empty());
        assert!(m.reference().is_none());
        assert!(m.plan().is_none());
        assert!(m.check_lifecycle(2010.0, Classification::PremiumBuy).is_none());
    }

    #[test]
    fn plan_sizes_the_lot_from_the_risk_budget() {
        let m = monitor_with_buy_at(2000.0);
        let plan = m.plan().unwrap();
        // 25 / (4 × 10) = 0.625 lots
        assert!((plan.lot_size - 0.625).abs() < 1e-9);
        assert!((plan.stop_price - 1996.0).abs() < 1e-9);
        assert!((plan.target_price - 2004.5).abs() < 1e-9);
    }

    #[test]
    fn plan_inverts_for_sell() {
        let mut m = SessionMonitor::new(MonitorConfig::default());
        m.accept_signal(Classification::PremiumSell, 2000.0, 80, at(9, 0, 0));
        let plan = m.plan().unwrap();
        assert!((plan.stop_price - 2004.0).abs() < 1e-9);
        assert!((plan.target_price - 1995.5).abs() < 1e-9);
    }
}
