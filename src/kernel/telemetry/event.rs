use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::intent::IntentKind;
use crate::kernel::presence::PresenceState;

// Allowed: ids, kinds, outcomes, counts
// Forbidden: transcript text, recipients, bodies, addresses

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TelemetryEvent {
    SessionStarted {
        session_id: Uuid,
    },
    SessionEnded {
        session_id: Uuid,
        turns: u64,
        forced: bool,
    },
    PresenceTransition {
        from: PresenceState,
        to: PresenceState,
    },
    TurnStarted,
    /// The capture window closed without a transcript.
    NothingHeard,
    IntentClassified {
        kind: IntentKind,
    },
    ExtractionFailed {
        kind: IntentKind,
    },
    ConfirmationRequested {
        kind: IntentKind,
    },
    ConfirmationResolved {
        kind: IntentKind,
        outcome: ConfirmationOutcome,
    },
    Dispatch {
        kind: IntentKind,
        result: DispatchResult,
    },
    Interruption {
        source: InterruptionSource,
        checkpoint: CheckpointKind,
    },
    SpeechAborted,
    CollaboratorFailed {
        collaborator: CollaboratorId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmationOutcome {
    Confirmed,
    Declined,
    Unrecognized,
    NoResponse,
    /// Forced stop arrived while the prompt was pending.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchResult {
    Issued,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterruptionSource {
    ForcedStop,
    Mute,
}

/// Where the dialogue loop noticed the interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointKind {
    BeforeWake,
    TurnStart,
    Listening,
    Speaking,
    AfterConfirmation,
    BeforeDispatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollaboratorId {
    Transcriber,
    Speaker,
    Automation,
}
