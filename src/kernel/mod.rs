//! The dialogue core: classification, extraction, confirmation, dispatch and
//! interrupt handling. Nothing in here touches a concrete device or service.

pub mod cancel;
pub mod confirm;
pub mod dispatch;
pub mod engine;
pub mod extract;
pub mod intent;
pub mod presence;
pub mod session;
pub mod telemetry;

pub use cancel::{ButtonAction, InterruptController, InterruptHandle, InterruptState};
pub use confirm::{
    is_affirmative, is_negative, CancelReason, ConfirmationGate, ConfirmationPrompt,
    ConfirmationState,
};
pub use dispatch::{website_url, Action, ActionDispatcher, Authorized, Decision, DispatchOutcome};
pub use engine::{DialogueEngine, EngineConfig, SessionEnd, TurnOutcome};
pub use presence::{PresenceGraph, PresenceRequest, PresenceState};
pub use session::DialogueSession;
