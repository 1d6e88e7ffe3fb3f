//! Prometheus metrics for the interview sequencer.
//!
//! Every label value comes from a closed set (phase and notice labels), so
//! no sanitization is needed before recording.

use std::sync::atomic::{AtomicBool, Ordering};

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::SenseiError;
use crate::sequencer::{NoticeKind, Phase};

/// Guard to prevent double-initialization of the metrics recorder.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initializes the global metrics recorder.
///
/// When `port` is `Some`, a Prometheus HTTP listener is started on
/// `127.0.0.1:<port>`. When `None`, the recorder is installed without
/// an HTTP endpoint.
///
/// # Errors
///
/// Returns `SenseiError::Io` if the recorder or HTTP listener cannot be
/// installed (e.g. port already in use).
pub fn init_metrics(port: Option<u16>) -> Result<(), SenseiError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(());
    }
    port.map_or_else(
        || PrometheusBuilder::new().install_recorder().map(|_| ()),
        |p| {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], p))
                .install()
        },
    )
    .map_err(|e| SenseiError::Io(std::io::Error::other(e.to_string())))?;

    describe_metrics();
    Ok(())
}

fn describe_metrics() {
    describe_counter!(
        "sensei_phase_transitions_total",
        "Total number of dialogue phase transitions"
    );
    describe_counter!(
        "sensei_turns_completed_total",
        "Scripted turns played to completion"
    );
    describe_counter!(
        "sensei_stale_timers_total",
        "Timers discarded because their generation was superseded"
    );
    describe_gauge!(
        "sensei_current_phase",
        "Currently active dialogue phase (1 = active)"
    );
    describe_counter!("sensei_notices_total", "Notices raised, by kind");

    // Every phase label exists from the start; the sequencer begins idle.
    for phase in Phase::ALL {
        let active = if phase == Phase::Idle { 1.0 } else { 0.0 };
        gauge!("sensei_current_phase", "phase" => phase.label()).set(active);
    }
}

/// Records a phase transition.
pub fn record_phase_transition(from: Phase, to: Phase) {
    counter!(
        "sensei_phase_transitions_total",
        "from" => from.label(),
        "to" => to.label()
    )
    .increment(1);
}

/// Sets the current-phase gauge, zeroing the previous label.
pub fn set_current_phase(phase: Phase, previous: Option<Phase>) {
    if let Some(prev) = previous {
        gauge!("sensei_current_phase", "phase" => prev.label()).set(0.0);
    }
    gauge!("sensei_current_phase", "phase" => phase.label()).set(1.0);
}

/// Records a completed turn.
pub fn record_turn_completed() {
    counter!("sensei_turns_completed_total").increment(1);
}

/// Records a discarded stale timer.
pub fn record_stale_timer() {
    counter!("sensei_stale_timers_total").increment(1);
}

/// Records a raised notice.
pub fn record_notice(kind: NoticeKind) {
    counter!("sensei_notices_total", "kind" => kind.label()).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_phase_transition(Phase::Idle, Phase::AskingQuestion);
        set_current_phase(Phase::AskingQuestion, Some(Phase::Idle));
        set_current_phase(Phase::Idle, None);
        record_turn_completed();
        record_stale_timer();
        record_notice(NoticeKind::NotesSaved);
    }
}
