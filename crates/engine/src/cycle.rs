use chrono::{DateTime, Utc};

use common::{
    Advisory, AlertEvent, Bar, Classification, Error, IndicatorSnapshot, Result,
};
use monitor::{AppendOutcome, SessionMonitor};
use signal::{confluence, CompositeScorer, IndicatorPipeline};

/// Everything one evaluation produced: display values plus the alerts to
/// forward to the notification layer.
#[derive(Debug)]
pub struct CycleOutcome {
    pub price: f64,
    pub classification: Classification,
    pub score: u8,
    pub snapshot: IndicatorSnapshot,
    pub advisory: Option<Advisory>,
    pub alerts: Vec<AlertEvent>,
}

/// One evaluation cycle as a function of (bar series, session state) →
/// (new session state, outputs). The session gate has already been consulted
/// by the caller — this function assumes the window is open.
///
/// Order matters: the lifecycle check runs against the reference set in a
/// prior cycle, before an accepted signal overwrites it.
pub fn run_cycle(
    primary: &[Bar],
    confirm: &[Bar],
    now: DateTime<Utc>,
    state: &mut SessionMonitor,
    pipeline: &IndicatorPipeline,
    scorer: &CompositeScorer,
) -> Result<CycleOutcome> {
    let snapshot = pipeline.snapshot(primary)?;
    let confirm_snapshot = pipeline.snapshot(confirm)?;

    let last = primary.last().ok_or(Error::InsufficientData {
        required: pipeline.required_bars(),
        got: 0,
    })?;
    let confirm_last = confirm.last().ok_or(Error::InsufficientData {
        required: pipeline.required_bars(),
        got: 0,
    })?;
    let price = last.close;

    // Two independently derived classifications must agree on direction.
    let primary_class = scorer.classify(&snapshot, price);
    let confirm_class = scorer.classify(&confirm_snapshot, confirm_last.close);
    let accepted = confluence(primary_class, confirm_class);

    let score = scorer.score(&snapshot, price);

    let mut alerts = Vec::new();

    let lifecycle = state.check_lifecycle(price, accepted);
    let advisory = lifecycle.as_ref().map(|o| o.advisory);
    if let Some(alert) = lifecycle.and_then(|o| o.alert) {
        alerts.push(alert);
    }

    if accepted.is_premium()
        && state.accept_signal(accepted, price, score, now) == AppendOutcome::Recorded
    {
        alerts.push(AlertEvent::SignalRecorded {
            classification: accepted,
            price,
            score,
        });
    }

    Ok(CycleOutcome {
        price,
        classification: accepted,
        score,
        snapshot,
        advisory,
        alerts,
    })
}
