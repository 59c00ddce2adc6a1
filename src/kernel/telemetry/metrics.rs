use std::collections::VecDeque;

use super::event::{ConfirmationOutcome, DispatchResult, InterruptionSource, TelemetryEvent};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub session_stats: SessionStats,
    pub dispatch_stats: DispatchStats,
    pub confirmation_stats: ConfirmationStats,
    pub interruption_stats: InterruptionStats,
    pub extraction_failures: u64,
    pub collaborator_failures: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStats {
    pub started: u64,
    pub forced_endings: u64,
    pub turns: u64,
    pub silent_turns: u64,
    pub avg_turns_per_session: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub issued: u64,
    pub failed: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationStats {
    pub requested: u64,
    pub confirmed: u64,
    /// Declined, unrecognized and unanswered prompts together.
    pub cancelled: u64,
    pub discarded: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterruptionStats {
    pub forced_stops: u64,
    pub mutes: u64,
    pub speech_aborted: u64,
}

/// Pure function: event log -> counters.
pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    let mut ended_sessions = 0u64;
    let mut ended_turns = 0u64;

    for event in events {
        match event {
            TelemetryEvent::SessionStarted { .. } => snap.session_stats.started += 1,
            TelemetryEvent::SessionEnded { turns, forced, .. } => {
                ended_sessions += 1;
                ended_turns += turns;
                if *forced {
                    snap.session_stats.forced_endings += 1;
                }
            }
            TelemetryEvent::TurnStarted => snap.session_stats.turns += 1,
            TelemetryEvent::NothingHeard => snap.session_stats.silent_turns += 1,
            TelemetryEvent::ExtractionFailed { .. } => snap.extraction_failures += 1,
            TelemetryEvent::ConfirmationRequested { .. } => snap.confirmation_stats.requested += 1,
            TelemetryEvent::ConfirmationResolved { outcome, .. } => match outcome {
                ConfirmationOutcome::Confirmed => snap.confirmation_stats.confirmed += 1,
                ConfirmationOutcome::Discarded => snap.confirmation_stats.discarded += 1,
                ConfirmationOutcome::Declined
                | ConfirmationOutcome::Unrecognized
                | ConfirmationOutcome::NoResponse => snap.confirmation_stats.cancelled += 1,
            },
            TelemetryEvent::Dispatch { result, .. } => match result {
                DispatchResult::Issued => snap.dispatch_stats.issued += 1,
                DispatchResult::Failed => snap.dispatch_stats.failed += 1,
                DispatchResult::Cancelled => snap.dispatch_stats.cancelled += 1,
            },
            TelemetryEvent::Interruption { source, .. } => match source {
                InterruptionSource::ForcedStop => snap.interruption_stats.forced_stops += 1,
                InterruptionSource::Mute => snap.interruption_stats.mutes += 1,
            },
            TelemetryEvent::SpeechAborted => snap.interruption_stats.speech_aborted += 1,
            TelemetryEvent::CollaboratorFailed { .. } => snap.collaborator_failures += 1,
            TelemetryEvent::PresenceTransition { .. }
            | TelemetryEvent::IntentClassified { .. } => {}
        }
    }

    if ended_sessions > 0 {
        snap.session_stats.avg_turns_per_session = ended_turns as f64 / ended_sessions as f64;
    }

    snap
}
