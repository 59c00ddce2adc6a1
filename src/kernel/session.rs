use uuid::Uuid;

use super::cancel::InterruptHandle;
use super::confirm::{ConfirmationGate, ConfirmationPrompt};
use super::presence::{PresenceGraph, PresenceRequest, PresenceState};

/// State for one wake-to-quit cycle. Created at wake, dropped at quit or
/// forced stop; nothing in it outlives the session.
#[derive(Debug)]
pub struct DialogueSession {
    id: Uuid,
    interrupts: InterruptHandle,
    /// Forced stops up to this epoch have been handled (or predate the session).
    acked_stop_epoch: u64,
    confirmation: ConfirmationGate,
    presence: PresenceState,
    turns: u64,
}

impl DialogueSession {
    /// Opens a session. A stop pressed while the assistant was dormant does
    /// not carry into it.
    pub fn begin(interrupts: InterruptHandle) -> Self {
        let acked_stop_epoch = interrupts.stop_epoch();
        let presence =
            PresenceGraph::transition(PresenceState::Dormant, PresenceRequest::WakeWordDetected)
                .unwrap_or(PresenceState::Engaged);
        Self {
            id: Uuid::new_v4(),
            interrupts,
            acked_stop_epoch,
            confirmation: ConfirmationGate::new(),
            presence,
            turns: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn record_turn(&mut self) {
        self.turns += 1;
    }

    pub fn presence(&self) -> PresenceState {
        self.presence
    }

    /// Applies `request` if the presence graph allows it and returns the
    /// `(from, to)` pair on a change.
    pub fn transition(
        &mut self,
        request: PresenceRequest,
    ) -> Option<(PresenceState, PresenceState)> {
        let from = self.presence;
        let to = PresenceGraph::transition(from, request)?;
        self.presence = to;
        Some((from, to))
    }

    pub fn is_muted(&self) -> bool {
        self.interrupts.is_muted()
    }

    /// A forced stop arrived that this session has not handled yet.
    pub fn stop_requested(&self) -> bool {
        self.interrupts.stop_epoch() > self.acked_stop_epoch
    }

    pub fn acked_stop_epoch(&self) -> u64 {
        self.acked_stop_epoch
    }

    /// Marks the pending stop as handled and drops any open prompt unevaluated.
    pub fn acknowledge_stop(&mut self) -> Option<ConfirmationPrompt> {
        self.acked_stop_epoch = self.interrupts.stop_epoch();
        self.confirmation.discard()
    }

    /// A fresh reader of the interrupt signals, for racing against I/O.
    pub fn interrupts(&self) -> InterruptHandle {
        self.interrupts.clone()
    }

    pub fn confirmation(&self) -> &ConfirmationGate {
        &self.confirmation
    }

    pub fn confirmation_mut(&mut self) -> &mut ConfirmationGate {
        &mut self.confirmation
    }
}
