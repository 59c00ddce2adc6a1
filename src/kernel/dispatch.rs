use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use super::confirm::CancelReason;
use super::extract::{ContactResolution, EmailAddress};
use super::intent::IntentKind;
use crate::hardware::{HardwareSnapshot, SensorReading};
use crate::services::{ActionKind, ActionParams, Automation, ChatBackend, SearchBackend};

pub const AUTOMATION_APOLOGY: &str = "Sorry, I wasn't able to do that.";

/// An intent with every parameter resolved, ready for exactly one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Shutdown,
    SendEmail { to: EmailAddress, subject: String, body: String },
    SetReminder { title: String, due: String },
    CreateCalendarEvent { title: String, starts_at: String },
    SendMessage { recipient: ContactResolution, body: String },
    PlaceCall { recipient: ContactResolution, facetime: bool },
    OpenApp { name: String },
    OpenWebsite { url: String },
    SearchWeb { query: String },
    QueryTemperature,
    QueryHumidity,
    GeneralQuery { prompt: String },
}

impl Action {
    pub fn intent_kind(&self) -> IntentKind {
        match self {
            Action::Shutdown => IntentKind::ShutdownMac,
            Action::SendEmail { .. } => IntentKind::SendEmail,
            Action::SetReminder { .. } => IntentKind::SetReminder,
            Action::CreateCalendarEvent { .. } => IntentKind::CreateCalendarEvent,
            Action::SendMessage { .. } => IntentKind::SendMessage,
            Action::PlaceCall { .. } => IntentKind::PlaceCall,
            Action::OpenApp { .. } => IntentKind::OpenApp,
            Action::OpenWebsite { .. } => IntentKind::OpenWebsite,
            Action::SearchWeb { .. } => IntentKind::SearchWeb,
            Action::QueryTemperature => IntentKind::QueryTemperature,
            Action::QueryHumidity => IntentKind::QueryHumidity,
            Action::GeneralQuery { .. } => IntentKind::GeneralQuery,
        }
    }

    pub fn requires_confirmation(&self) -> bool {
        self.intent_kind().is_side_effecting()
    }

    /// Canonical spoken restatement naming the captured parameters.
    pub fn restatement(&self) -> String {
        match self {
            Action::Shutdown => "Are you sure you want me to shut down the computer?".to_string(),
            Action::SendEmail { to, subject, body } => format!(
                "I'm about to email {} with the subject {}, saying: {}. Should I send it?",
                to, subject, body
            ),
            Action::SetReminder { title, due } => {
                format!("I'll remind you to {} on {}. Is that right?", title, due)
            }
            Action::CreateCalendarEvent { title, starts_at } => format!(
                "I'll add {} to your calendar for {}. Should I go ahead?",
                title, starts_at
            ),
            Action::SendMessage { recipient, body } => format!(
                "Send {} at {} the message: {}. Should I send it?",
                recipient.display_name, recipient.phone, body
            ),
            Action::PlaceCall { recipient, facetime } => format!(
                "Calling {} at {}{}. Should I go ahead?",
                recipient.display_name,
                recipient.phone,
                if *facetime { " on FaceTime" } else { "" }
            ),
            other => format!("Should I go ahead with {:?}?", other.intent_kind()),
        }
    }

    /// Spoken once the collaborator call was issued.
    fn acknowledgment(&self) -> String {
        match self {
            Action::Shutdown => "Shutting down the computer. Goodbye.".to_string(),
            Action::SendEmail { to, .. } => format!("Email sent to {}.", to),
            Action::SetReminder { .. } => "Reminder set.".to_string(),
            Action::CreateCalendarEvent { .. } => "Event added to your calendar.".to_string(),
            Action::SendMessage { recipient, .. } => {
                format!("Message sent to {}.", recipient.display_name)
            }
            Action::PlaceCall { recipient, .. } => format!("Calling {}.", recipient.display_name),
            Action::OpenApp { name } => format!("Opening {}.", name),
            Action::OpenWebsite { url } => format!("Opening {} in Safari.", url),
            _ => String::new(),
        }
    }

    /// Automation call for actions carried out by the OS; `None` for the
    /// conversational ones.
    pub fn automation(&self) -> Option<(ActionKind, ActionParams)> {
        let mut params = ActionParams::new();
        let kind = match self {
            Action::Shutdown => ActionKind::Shutdown,
            Action::SendEmail { to, subject, body } => {
                params.insert("to".into(), to.to_string());
                params.insert("subject".into(), subject.clone());
                params.insert("body".into(), body.clone());
                ActionKind::SendEmail
            }
            Action::SetReminder { title, due } => {
                params.insert("title".into(), title.clone());
                params.insert("due".into(), due.clone());
                ActionKind::CreateReminder
            }
            Action::CreateCalendarEvent { title, starts_at } => {
                params.insert("title".into(), title.clone());
                params.insert("starts_at".into(), starts_at.clone());
                ActionKind::CreateCalendarEvent
            }
            Action::SendMessage { recipient, body } => {
                params.insert("phone".into(), recipient.phone.to_string());
                params.insert("body".into(), body.clone());
                ActionKind::SendMessage
            }
            Action::PlaceCall { recipient, facetime } => {
                params.insert("phone".into(), recipient.phone.to_string());
                params.insert("facetime".into(), facetime.to_string());
                ActionKind::PlaceCall
            }
            Action::OpenApp { name } => {
                params.insert("name".into(), name.clone());
                ActionKind::OpenApp
            }
            Action::OpenWebsite { url } => {
                params.insert("url".into(), url.clone());
                ActionKind::OpenUrl
            }
            Action::SearchWeb { .. }
            | Action::QueryTemperature
            | Action::QueryHumidity
            | Action::GeneralQuery { .. } => return None,
        };
        Some((kind, params))
    }
}

/// An action cleared to run. Only the confirmation gate can authorize a
/// side-effecting action; everything else passes `exempt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized(Action);

impl Authorized {
    pub(crate) fn confirmed(action: Action) -> Self {
        Self(action)
    }

    /// Hands the action back when it needs confirmation.
    pub fn exempt(action: Action) -> Result<Self, Action> {
        if action.requires_confirmation() {
            Err(action)
        } else {
            Ok(Self(action))
        }
    }

    pub fn action(&self) -> &Action {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Proceed(Authorized),
    Cancel { action: Action, reason: CancelReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// One collaborator call went out; `reply` is the acknowledgment or answer.
    Issued { kind: IntentKind, reply: String },
    /// The call went out but the collaborator reported failure.
    Failed { kind: IntentKind, reply: String },
    /// Nothing was called.
    Cancelled { kind: IntentKind, reply: String },
}

impl DispatchOutcome {
    pub fn reply(&self) -> &str {
        match self {
            DispatchOutcome::Issued { reply, .. }
            | DispatchOutcome::Failed { reply, .. }
            | DispatchOutcome::Cancelled { reply, .. } => reply,
        }
    }
}

/// Routes a decided action to exactly one collaborator.
pub struct ActionDispatcher {
    automation: Arc<dyn Automation>,
    chat: Arc<dyn ChatBackend>,
    search: Arc<dyn SearchBackend>,
    hardware: watch::Receiver<HardwareSnapshot>,
}

impl ActionDispatcher {
    pub fn new(
        automation: Arc<dyn Automation>,
        chat: Arc<dyn ChatBackend>,
        search: Arc<dyn SearchBackend>,
        hardware: watch::Receiver<HardwareSnapshot>,
    ) -> Self {
        Self {
            automation,
            chat,
            search,
            hardware,
        }
    }

    pub async fn dispatch(&self, decision: Decision) -> DispatchOutcome {
        let action = match decision {
            Decision::Proceed(Authorized(action)) => action,
            Decision::Cancel { action, reason } => {
                info!("Dispatch cancelled: {:?} ({:?})", action.intent_kind(), reason);
                return DispatchOutcome::Cancelled {
                    kind: action.intent_kind(),
                    reply: "Okay, I cancelled that.".to_string(),
                };
            }
        };
        let kind = action.intent_kind();

        match &action {
            Action::SearchWeb { query } => DispatchOutcome::Issued {
                kind,
                reply: self.search.search(query).await,
            },
            Action::GeneralQuery { prompt } => DispatchOutcome::Issued {
                kind,
                reply: self.chat.chat(prompt).await,
            },
            Action::QueryTemperature | Action::QueryHumidity => {
                let reading = self
                    .hardware
                    .borrow()
                    .sensor_reading
                    .as_deref()
                    .map(SensorReading::parse);
                let reply = match (&action, reading) {
                    (Action::QueryTemperature, Some(r)) => r.spoken_temperature(),
                    (_, Some(r)) => r.spoken_humidity(),
                    (_, None) => None,
                }
                .unwrap_or_else(|| "I don't have a sensor reading right now.".to_string());
                DispatchOutcome::Issued { kind, reply }
            }
            _ => {
                let Some((action_kind, params)) = action.automation() else {
                    return DispatchOutcome::Cancelled {
                        kind,
                        reply: "I can't do that.".to_string(),
                    };
                };
                match self.automation.automate(action_kind, &params).await {
                    Ok(()) => {
                        info!("Dispatched {:?}", action_kind);
                        DispatchOutcome::Issued {
                            kind,
                            reply: action.acknowledgment(),
                        }
                    }
                    Err(e) => {
                        warn!("Automation {:?} failed: {}", action_kind, e);
                        DispatchOutcome::Failed {
                            kind,
                            reply: AUTOMATION_APOLOGY.to_string(),
                        }
                    }
                }
            }
        }
    }
}

/// Pure function: spoken domain -> URL Safari can open.
/// "apple dot com" and "apple" both become "https://apple.com".
pub fn website_url(spoken: &str) -> Option<String> {
    let joined = spoken
        .to_lowercase()
        .replace(" dot ", ".")
        .split_whitespace()
        .collect::<String>();
    let host = joined
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_matches('.');
    if host.is_empty() {
        return None;
    }
    if host.contains('.') {
        Some(format!("https://{}", host))
    } else {
        Some(format!("https://{}.com", host))
    }
}
