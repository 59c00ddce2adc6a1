//! Dialogue telemetry.
//!
//! Telemetry is a write-only side channel: nothing in the dialogue loop, the
//! confirmation gate or the dispatcher reads it back.
//!
//! Events never carry user content. Transcripts, contact names, addresses and
//! message bodies stay out; only kinds, outcomes and counts go in.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{
    CheckpointKind, CollaboratorId, ConfirmationOutcome, DispatchResult, InterruptionSource,
    TelemetryEvent,
};
pub use metrics::{compute_snapshot, TelemetrySnapshot};
pub use recorder::TelemetryRecorder;
