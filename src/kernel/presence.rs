use serde::{Deserialize, Serialize};

/// Where the assistant is in its wake-to-quit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresenceState {
    /// Waiting for the wake word. No session exists.
    Dormant,
    /// Session open, taking commands.
    Engaged,
    /// A restatement was spoken; one yes/no capture is outstanding.
    Confirming,
    /// Hardware mute: neither listening nor speaking.
    Muted,
}

impl Default for PresenceState {
    fn default() -> Self {
        Self::Dormant
    }
}

/// Requests for a presence transition. The graph decides whether they apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceRequest {
    WakeWordDetected,
    ConfirmationRequested,
    ConfirmationResolved,
    MuteRaised,
    MuteCleared,
    ForcedStop,
    Quit,
}

pub struct PresenceGraph;

impl PresenceGraph {
    /// Pure function: (Current State, Request) -> New State
    /// Returns None if the transition is invalid/ignored.
    pub fn transition(current: PresenceState, request: PresenceRequest) -> Option<PresenceState> {
        use PresenceRequest::*;
        use PresenceState::*;

        match (current, request) {
            (Dormant, WakeWordDetected) => Some(Engaged),

            (Engaged, ConfirmationRequested) => Some(Confirming),
            (Confirming, ConfirmationResolved) => Some(Engaged),

            (Engaged | Confirming, MuteRaised) => Some(Muted),
            (Muted, MuteCleared) => Some(Engaged),

            // Forced stop and quit both end the session, from anywhere inside it.
            (Engaged | Confirming | Muted, ForcedStop) => Some(Dormant),
            (Engaged | Confirming | Muted, Quit) => Some(Dormant),

            _ => None,
        }
    }
}
