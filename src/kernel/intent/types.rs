use serde::{Deserialize, Serialize};

/// Label of a classified transcript. Carries no user content, so it is safe to
/// log and to record in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentKind {
    Quit,
    ShutdownMac,
    SendEmail,
    SetReminder,
    CreateCalendarEvent,
    SendMessage,
    PlaceCall,
    OpenApp,
    OpenWebsite,
    SearchWeb,
    QueryTemperature,
    QueryHumidity,
    GeneralQuery,
}

impl IntentKind {
    /// Intents whose execution changes something in the outside world and
    /// therefore must pass through a spoken confirmation.
    pub fn is_side_effecting(&self) -> bool {
        matches!(
            self,
            IntentKind::ShutdownMac
                | IntentKind::SendEmail
                | IntentKind::SetReminder
                | IntentKind::CreateCalendarEvent
                | IntentKind::SendMessage
                | IntentKind::PlaceCall
        )
    }
}

/// A classified transcript with its intent-specific residual parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    Quit,
    ShutdownMac,
    /// Address, subject and body are gathered in follow-up turns.
    SendEmail,
    /// Whatever followed the trigger, usually the reminder text.
    SetReminder { subject: String },
    CreateCalendarEvent { title: String },
    /// Whole command; the contact resolver strips its own triggers.
    SendMessage { command: String },
    PlaceCall { command: String, facetime: bool },
    OpenApp { app: String },
    OpenWebsite { domain: String },
    SearchWeb { query: String },
    QueryTemperature,
    QueryHumidity,
    GeneralQuery { prompt: String },
}

impl Intent {
    /// Builds the intent for `kind` from the residual left after trigger
    /// removal. `transcript` is the full normalized text.
    pub fn from_parts(kind: IntentKind, residual: &str, transcript: &str) -> Self {
        let residual = residual.to_string();
        match kind {
            IntentKind::Quit => Intent::Quit,
            IntentKind::ShutdownMac => Intent::ShutdownMac,
            IntentKind::SendEmail => Intent::SendEmail,
            IntentKind::SetReminder => Intent::SetReminder { subject: residual },
            IntentKind::CreateCalendarEvent => Intent::CreateCalendarEvent { title: residual },
            IntentKind::SendMessage => Intent::SendMessage { command: residual },
            IntentKind::PlaceCall => Intent::PlaceCall {
                command: residual,
                facetime: transcript.contains("facetime"),
            },
            IntentKind::OpenApp => Intent::OpenApp { app: residual },
            IntentKind::OpenWebsite => Intent::OpenWebsite { domain: residual },
            IntentKind::SearchWeb => Intent::SearchWeb { query: residual },
            IntentKind::QueryTemperature => Intent::QueryTemperature,
            IntentKind::QueryHumidity => Intent::QueryHumidity,
            IntentKind::GeneralQuery => Intent::GeneralQuery { prompt: residual },
        }
    }

    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Quit => IntentKind::Quit,
            Intent::ShutdownMac => IntentKind::ShutdownMac,
            Intent::SendEmail => IntentKind::SendEmail,
            Intent::SetReminder { .. } => IntentKind::SetReminder,
            Intent::CreateCalendarEvent { .. } => IntentKind::CreateCalendarEvent,
            Intent::SendMessage { .. } => IntentKind::SendMessage,
            Intent::PlaceCall { .. } => IntentKind::PlaceCall,
            Intent::OpenApp { .. } => IntentKind::OpenApp,
            Intent::OpenWebsite { .. } => IntentKind::OpenWebsite,
            Intent::SearchWeb { .. } => IntentKind::SearchWeb,
            Intent::QueryTemperature => IntentKind::QueryTemperature,
            Intent::QueryHumidity => IntentKind::QueryHumidity,
            Intent::GeneralQuery { .. } => IntentKind::GeneralQuery,
        }
    }
}

/// Normalizes raw recognizer output into a transcript: lower-cased, trimmed,
/// inner whitespace collapsed.
pub fn normalize_transcript(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
