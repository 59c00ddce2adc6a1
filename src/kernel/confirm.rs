use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::dispatch::{Action, Authorized, Decision};
use crate::error::ConfirmationError;

/// Any of these anywhere in the reply confirms. Kept short: words like "sure"
/// or "absolutely" also appear inside refusals ("not sure", "absolutely not").
pub const AFFIRMATIVE: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "yup",
    "go ahead",
    "affirmative",
    "confirmed",
];

/// Only used to label a cancellation; a reply that matches neither list
/// cancels all the same.
pub const NEGATIVE: &[&str] = &[
    "no",
    "nope",
    "nah",
    "cancel",
    "don't",
    "stop",
    "negative",
    "never mind",
];

pub fn is_affirmative(response: Option<&str>) -> bool {
    contains_any(response, AFFIRMATIVE)
}

pub fn is_negative(response: Option<&str>) -> bool {
    contains_any(response, NEGATIVE)
}

fn contains_any(response: Option<&str>, list: &[&str]) -> bool {
    let Some(text) = response else {
        return false;
    };
    let text = text.to_lowercase();
    list.iter().any(|word| text.contains(word))
}

/// Why a prompt did not confirm. Behaviour is identical for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    Declined,
    Unrecognized,
    NoResponse,
}

impl CancelReason {
    pub fn classify(response: Option<&str>) -> Self {
        match response.map(str::trim) {
            None | Some("") => CancelReason::NoResponse,
            Some(text) if is_negative(Some(text)) => CancelReason::Declined,
            Some(_) => CancelReason::Unrecognized,
        }
    }
}

/// A fully-resolved side effect waiting on one yes/no.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationPrompt {
    pub id: Uuid,
    pub action: Action,
    pub restatement: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfirmationState {
    #[default]
    Idle,
    AwaitingConfirmation(ConfirmationPrompt),
}

/// Holds at most one pending prompt.
#[derive(Debug, Default)]
pub struct ConfirmationGate {
    state: ConfirmationState,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ConfirmationState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ConfirmationState::Idle)
    }

    pub fn pending(&self) -> Option<&ConfirmationPrompt> {
        match &self.state {
            ConfirmationState::AwaitingConfirmation(prompt) => Some(prompt),
            ConfirmationState::Idle => None,
        }
    }

    /// Idle -> AwaitingConfirmation. The returned prompt carries the
    /// restatement to speak.
    pub fn propose(&mut self, action: Action) -> Result<&ConfirmationPrompt, ConfirmationError> {
        if !self.is_idle() {
            return Err(ConfirmationError::AlreadyPending);
        }
        let restatement = action.restatement();
        self.state = ConfirmationState::AwaitingConfirmation(ConfirmationPrompt {
            id: Uuid::new_v4(),
            action,
            restatement,
        });
        self.pending().ok_or(ConfirmationError::AlreadyPending)
    }

    /// AwaitingConfirmation -> Idle, unconditionally, after exactly one
    /// evaluation of `response`. `None` when nothing was pending.
    pub fn resolve(&mut self, response: Option<&str>) -> Option<Decision> {
        let ConfirmationState::AwaitingConfirmation(prompt) = std::mem::take(&mut self.state) else {
            return None;
        };

        if is_affirmative(response) {
            Some(Decision::Proceed(Authorized::confirmed(prompt.action)))
        } else {
            Some(Decision::Cancel {
                action: prompt.action,
                reason: CancelReason::classify(response),
            })
        }
    }

    /// Drops a pending prompt without evaluating it (forced stop).
    pub fn discard(&mut self) -> Option<ConfirmationPrompt> {
        match std::mem::take(&mut self.state) {
            ConfirmationState::AwaitingConfirmation(prompt) => Some(prompt),
            ConfirmationState::Idle => None,
        }
    }
}
