//! The dialogue loop.
//!
//! One session per wake word. Each turn captures a transcript, classifies it,
//! gathers whatever parameters the intent still needs, puts side effects
//! behind the confirmation gate and dispatches. Interrupts are checked at
//! fixed checkpoints and raced against every capture and every utterance.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cancel::InterruptHandle;
use super::confirm::CancelReason;
use super::dispatch::{
    website_url, Action, ActionDispatcher, Authorized, Decision, DispatchOutcome,
};
use super::extract::{spell_email_from_text, ContactResolution, ContactResolver};
use super::intent::{normalize_transcript, Intent, IntentClassifier, IntentKind};
use super::presence::PresenceRequest;
use super::session::DialogueSession;
use super::telemetry::{
    CheckpointKind, CollaboratorId, ConfirmationOutcome, DispatchResult, InterruptionSource,
    TelemetryEvent, TelemetryRecorder,
};
use crate::config::DialogueConfig;
use crate::error::{AssistantError, ExtractError};
use crate::hardware::HardwareSnapshot;
use crate::services::{Collaborators, WakeWordDetector};

pub const GREETING: &str = "Yes?";
pub const FAREWELL: &str = "Goodbye!";
pub const NOT_HEARD: &str = "I didn't catch that, so I cancelled it.";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub listen_timeout: Duration,
    pub confirmation_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&DialogueConfig::default())
    }
}

impl From<&DialogueConfig> for EngineConfig {
    fn from(config: &DialogueConfig) -> Self {
        Self {
            listen_timeout: config.listen_timeout(),
            confirmation_timeout: config.confirmation_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    ForcedStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Quit,
    ForcedStop,
}

enum Spoken {
    Finished,
    Stopped,
    Muted,
}

enum Capture {
    Heard(String),
    Nothing,
    Stopped,
    Muted,
}

/// Why parameter gathering stopped short of an action.
enum Halt {
    Failed(ExtractError),
    Unanswered,
    Stopped(CheckpointKind),
    Muted,
}

pub struct DialogueEngine {
    collaborators: Collaborators,
    classifier: IntentClassifier,
    contacts: ContactResolver,
    dispatcher: ActionDispatcher,
    interrupts: InterruptHandle,
    config: EngineConfig,
    pub telemetry: TelemetryRecorder,
}

impl DialogueEngine {
    pub fn new(
        collaborators: Collaborators,
        interrupts: InterruptHandle,
        hardware: watch::Receiver<HardwareSnapshot>,
        config: EngineConfig,
    ) -> Result<Self, regex::Error> {
        let dispatcher = ActionDispatcher::new(
            Arc::clone(&collaborators.automation),
            Arc::clone(&collaborators.chat),
            Arc::clone(&collaborators.search),
            hardware,
        );
        Ok(Self {
            collaborators,
            classifier: IntentClassifier::standard()?,
            contacts: ContactResolver::new()?,
            dispatcher,
            interrupts,
            config,
            telemetry: TelemetryRecorder::new(),
        })
    }

    // === 1. OUTER LOOP ===

    /// Wake, converse, repeat until `cancel` fires. A wake-word failure is
    /// fatal and ends the loop with an error.
    pub async fn run(
        &mut self,
        wake: &dyn WakeWordDetector,
        cancel: CancellationToken,
    ) -> Result<(), AssistantError> {
        loop {
            // Checkpoint (a): no wake-word wait while muted.
            if self.interrupts.is_muted() {
                self.telemetry.record(TelemetryEvent::Interruption {
                    source: InterruptionSource::Mute,
                    checkpoint: CheckpointKind::BeforeWake,
                });
                info!("Muted; holding before wake-word wait");
                let mut interrupts = self.interrupts.clone();
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    _ = interrupts.wait_until(|s| !s.muted) => {}
                }
            }

            info!("Waiting for wake word");
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                woke = wake.wait_for_wake() => {
                    woke.map_err(|e| AssistantError::WakeWord(format!("{:#}", e)))?;
                }
            }
            if self.interrupts.is_muted() {
                debug!("Wake word ignored while muted");
                continue;
            }

            let mut session = self.begin_session();
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                end = self.run_session(&mut session) => {
                    info!("Session ended: {:?}", end);
                }
            }
        }
    }

    pub fn begin_session(&mut self) -> DialogueSession {
        let session = DialogueSession::begin(self.interrupts.clone());
        info!("Session {} started", session.id());
        self.telemetry.record(TelemetryEvent::SessionStarted {
            session_id: session.id(),
        });
        self.telemetry.record(TelemetryEvent::PresenceTransition {
            from: super::presence::PresenceState::Dormant,
            to: session.presence(),
        });
        session
    }

    /// Turns until quit or forced stop.
    pub async fn run_session(&mut self, session: &mut DialogueSession) -> SessionEnd {
        let end = match self.speak(session, GREETING).await {
            Spoken::Stopped => {
                self.forced_stop(session, CheckpointKind::Speaking);
                SessionEnd::ForcedStop
            }
            Spoken::Finished | Spoken::Muted => loop {
                match self.run_turn(session).await {
                    TurnOutcome::Continue => continue,
                    TurnOutcome::Quit => {
                        self.transition(session, PresenceRequest::Quit);
                        break SessionEnd::Quit;
                    }
                    TurnOutcome::ForcedStop => break SessionEnd::ForcedStop,
                }
            },
        };

        self.telemetry.record(TelemetryEvent::SessionEnded {
            session_id: session.id(),
            turns: session.turns(),
            forced: end == SessionEnd::ForcedStop,
        });
        end
    }

    // === 2. TURN ===

    pub async fn run_turn(&mut self, session: &mut DialogueSession) -> TurnOutcome {
        // Checkpoint (b)
        if session.stop_requested() {
            return self.forced_stop(session, CheckpointKind::TurnStart);
        }
        if session.is_muted() {
            if let Some(outcome) = self.hold_while_muted(session).await {
                return outcome;
            }
        }

        session.record_turn();
        self.telemetry.record(TelemetryEvent::TurnStarted);

        let timeout = self.config.listen_timeout;
        match self.listen(session, timeout).await {
            Capture::Heard(transcript) => self.handle_transcript(session, &transcript).await,
            Capture::Nothing => {
                debug!("Nothing heard");
                self.telemetry.record(TelemetryEvent::NothingHeard);
                TurnOutcome::Continue
            }
            Capture::Stopped => self.forced_stop(session, CheckpointKind::Listening),
            Capture::Muted => TurnOutcome::Continue,
        }
    }

    /// Everything after a transcript was captured.
    pub async fn handle_transcript(
        &mut self,
        session: &mut DialogueSession,
        transcript: &str,
    ) -> TurnOutcome {
        let transcript = normalize_transcript(transcript);
        let (intent, _) = self.classifier.classify(&transcript);
        let kind = intent.kind();
        info!("Intent classified: {:?}", kind);
        self.telemetry.record(TelemetryEvent::IntentClassified { kind });

        if intent == Intent::Quit {
            return match self.speak(session, FAREWELL).await {
                Spoken::Stopped => self.forced_stop(session, CheckpointKind::Speaking),
                Spoken::Finished | Spoken::Muted => TurnOutcome::Quit,
            };
        }

        let action = match self.build_action(session, intent).await {
            Ok(action) => action,
            Err(halt) => return self.halt(session, kind, halt).await,
        };

        match Authorized::exempt(action) {
            Ok(authorized) => self.dispatch_and_reply(session, Decision::Proceed(authorized)).await,
            Err(action) => self.confirm_and_dispatch(session, action).await,
        }
    }

    // === 3. PARAMETER GATHERING ===

    async fn build_action(
        &mut self,
        session: &mut DialogueSession,
        intent: Intent,
    ) -> Result<Action, Halt> {
        let action = match intent {
            Intent::ShutdownMac => Action::Shutdown,
            Intent::SendEmail => {
                let spelled = self
                    .ask(session, "Who should I send it to? Please spell the address.")
                    .await?;
                let to = spell_email_from_text(&spelled).map_err(Halt::Failed)?;
                let subject = self.ask(session, "What's the subject?").await?;
                let body = self.ask(session, "What should the email say?").await?;
                Action::SendEmail { to, subject, body }
            }
            Intent::SetReminder { subject } => {
                let title = self
                    .given_or_ask(session, &subject, "What should I remind you about?")
                    .await?;
                let due = self.ask_date(session, "When should I remind you?").await?;
                Action::SetReminder { title, due }
            }
            Intent::CreateCalendarEvent { title } => {
                let title = self
                    .given_or_ask(session, &title, "What should I call the event?")
                    .await?;
                let starts_at = self.ask_date(session, "When is it?").await?;
                Action::CreateCalendarEvent { title, starts_at }
            }
            Intent::SendMessage { command } => {
                let recipient = self
                    .resolve_recipient(session, &command, "Who should I message?")
                    .await?;
                let body = self.ask(session, "What should the message say?").await?;
                Action::SendMessage { recipient, body }
            }
            Intent::PlaceCall { command, facetime } => {
                let recipient = self
                    .resolve_recipient(session, &command, "Who should I call?")
                    .await?;
                Action::PlaceCall {
                    recipient,
                    facetime,
                }
            }
            Intent::OpenApp { app } => {
                let name = self
                    .given_or_ask(session, &app, "Which app should I open?")
                    .await?;
                Action::OpenApp { name }
            }
            Intent::OpenWebsite { domain } => {
                let domain = self
                    .given_or_ask(session, &domain, "Which website should I open?")
                    .await?;
                match website_url(&domain) {
                    Some(url) => Action::OpenWebsite { url },
                    None => return Err(Halt::Unanswered),
                }
            }
            Intent::SearchWeb { query } => Action::SearchWeb { query },
            Intent::QueryTemperature => Action::QueryTemperature,
            Intent::QueryHumidity => Action::QueryHumidity,
            Intent::GeneralQuery { prompt } => Action::GeneralQuery { prompt },
            // Handled before gathering.
            Intent::Quit => return Err(Halt::Unanswered),
        };
        Ok(action)
    }

    async fn ask(&mut self, session: &mut DialogueSession, question: &str) -> Result<String, Halt> {
        match self.speak(session, question).await {
            Spoken::Finished => {}
            Spoken::Stopped => return Err(Halt::Stopped(CheckpointKind::Speaking)),
            Spoken::Muted => return Err(Halt::Muted),
        }
        let timeout = self.config.listen_timeout;
        match self.listen(session, timeout).await {
            Capture::Heard(answer) => Ok(answer),
            Capture::Nothing => Err(Halt::Unanswered),
            Capture::Stopped => Err(Halt::Stopped(CheckpointKind::Listening)),
            Capture::Muted => Err(Halt::Muted),
        }
    }

    async fn given_or_ask(
        &mut self,
        session: &mut DialogueSession,
        given: &str,
        question: &str,
    ) -> Result<String, Halt> {
        let given = given.trim();
        if given.is_empty() {
            self.ask(session, question).await
        } else {
            Ok(given.to_string())
        }
    }

    async fn ask_date(
        &mut self,
        session: &mut DialogueSession,
        question: &str,
    ) -> Result<String, Halt> {
        let spoken = self.ask(session, question).await?;
        self.collaborators
            .dates
            .normalize(&spoken)
            .ok_or(Halt::Failed(ExtractError::DateUnparseable(spoken)))
    }

    /// Resolves the recipient named in `command`, asking once when the
    /// command named nobody.
    async fn resolve_recipient(
        &mut self,
        session: &mut DialogueSession,
        command: &str,
        question: &str,
    ) -> Result<ContactResolution, Halt> {
        let command = if self.contacts.candidate(command).is_empty() {
            self.ask(session, question).await?
        } else {
            command.to_string()
        };
        self.contacts
            .resolve(&command, self.collaborators.contacts.as_ref())
            .map_err(Halt::Failed)
    }

    async fn halt(
        &mut self,
        session: &mut DialogueSession,
        kind: IntentKind,
        halt: Halt,
    ) -> TurnOutcome {
        let spoken = match halt {
            Halt::Stopped(checkpoint) => return self.forced_stop(session, checkpoint),
            Halt::Muted => return TurnOutcome::Continue,
            Halt::Failed(e) => {
                warn!("Extraction failed for {:?}: {}", kind, e);
                self.telemetry.record(TelemetryEvent::ExtractionFailed { kind });
                e.spoken()
            }
            Halt::Unanswered => {
                debug!("No answer while gathering {:?}", kind);
                NOT_HEARD.to_string()
            }
        };
        match self.speak(session, &spoken).await {
            Spoken::Stopped => self.forced_stop(session, CheckpointKind::Speaking),
            Spoken::Finished | Spoken::Muted => TurnOutcome::Continue,
        }
    }

    // === 4. CONFIRMATION & DISPATCH ===

    async fn confirm_and_dispatch(
        &mut self,
        session: &mut DialogueSession,
        action: Action,
    ) -> TurnOutcome {
        let kind = action.intent_kind();
        let restatement = match session.confirmation_mut().propose(action) {
            Ok(prompt) => prompt.restatement.clone(),
            Err(e) => {
                warn!("Cannot open a prompt: {}", e);
                return TurnOutcome::Continue;
            }
        };
        self.telemetry.record(TelemetryEvent::ConfirmationRequested { kind });
        self.transition(session, PresenceRequest::ConfirmationRequested);

        let response = match self.speak(session, &restatement).await {
            Spoken::Stopped => return self.forced_stop(session, CheckpointKind::Speaking),
            // Nobody can answer while muted.
            Spoken::Muted => None,
            Spoken::Finished => {
                let timeout = self.config.confirmation_timeout;
                match self.listen(session, timeout).await {
                    Capture::Heard(text) => Some(text),
                    Capture::Nothing | Capture::Muted => None,
                    Capture::Stopped => {
                        return self.forced_stop(session, CheckpointKind::Listening)
                    }
                }
            }
        };

        // A stop that landed during the capture wins over the answer.
        if session.stop_requested() {
            return self.forced_stop(session, CheckpointKind::AfterConfirmation);
        }

        let Some(decision) = session.confirmation_mut().resolve(response.as_deref()) else {
            return TurnOutcome::Continue;
        };
        self.transition(session, PresenceRequest::ConfirmationResolved);
        let outcome = match &decision {
            Decision::Proceed(_) => ConfirmationOutcome::Confirmed,
            Decision::Cancel { reason, .. } => match reason {
                CancelReason::Declined => ConfirmationOutcome::Declined,
                CancelReason::Unrecognized => ConfirmationOutcome::Unrecognized,
                CancelReason::NoResponse => ConfirmationOutcome::NoResponse,
            },
        };
        info!("Confirmation for {:?}: {:?}", kind, outcome);
        self.telemetry
            .record(TelemetryEvent::ConfirmationResolved { kind, outcome });

        self.dispatch_and_reply(session, decision).await
    }

    async fn dispatch_and_reply(
        &mut self,
        session: &mut DialogueSession,
        decision: Decision,
    ) -> TurnOutcome {
        if session.stop_requested() {
            return self.forced_stop(session, CheckpointKind::BeforeDispatch);
        }

        let shutting_down = matches!(
            &decision,
            Decision::Proceed(authorized) if *authorized.action() == Action::Shutdown
        );
        let outcome = self.dispatcher.dispatch(decision).await;
        let (kind, result) = match &outcome {
            DispatchOutcome::Issued { kind, .. } => (*kind, DispatchResult::Issued),
            DispatchOutcome::Failed { kind, .. } => {
                self.telemetry.record(TelemetryEvent::CollaboratorFailed {
                    collaborator: CollaboratorId::Automation,
                });
                (*kind, DispatchResult::Failed)
            }
            DispatchOutcome::Cancelled { kind, .. } => (*kind, DispatchResult::Cancelled),
        };
        self.telemetry.record(TelemetryEvent::Dispatch { kind, result });

        match self.speak(session, outcome.reply()).await {
            Spoken::Stopped => self.forced_stop(session, CheckpointKind::Speaking),
            _ if shutting_down && result == DispatchResult::Issued => TurnOutcome::Quit,
            Spoken::Finished | Spoken::Muted => TurnOutcome::Continue,
        }
    }

    // === 5. INTERRUPTS & I/O ===

    /// Acknowledges a forced stop: the open prompt, if any, is dropped without
    /// being evaluated and nothing more is said.
    fn forced_stop(
        &mut self,
        session: &mut DialogueSession,
        checkpoint: CheckpointKind,
    ) -> TurnOutcome {
        if let Some(prompt) = session.acknowledge_stop() {
            info!("Forced stop discarded pending {:?}", prompt.action.intent_kind());
            self.telemetry.record(TelemetryEvent::ConfirmationResolved {
                kind: prompt.action.intent_kind(),
                outcome: ConfirmationOutcome::Discarded,
            });
        }
        info!("Forced stop at {:?}", checkpoint);
        self.telemetry.record(TelemetryEvent::Interruption {
            source: InterruptionSource::ForcedStop,
            checkpoint,
        });
        self.transition(session, PresenceRequest::ForcedStop);
        TurnOutcome::ForcedStop
    }

    /// Waits out a mute. `Some` when a forced stop arrived meanwhile.
    async fn hold_while_muted(&mut self, session: &mut DialogueSession) -> Option<TurnOutcome> {
        self.telemetry.record(TelemetryEvent::Interruption {
            source: InterruptionSource::Mute,
            checkpoint: CheckpointKind::TurnStart,
        });
        self.transition(session, PresenceRequest::MuteRaised);
        info!("Muted");

        let acked = session.acked_stop_epoch();
        let mut interrupts = session.interrupts();
        interrupts
            .wait_until(|s| !s.muted || s.stop_epoch > acked)
            .await;

        if session.stop_requested() {
            return Some(self.forced_stop(session, CheckpointKind::TurnStart));
        }
        self.transition(session, PresenceRequest::MuteCleared);
        info!("Unmuted");
        None
    }

    /// Checkpoint (c): checked before speaking and raced while speaking.
    async fn speak(&mut self, session: &DialogueSession, text: &str) -> Spoken {
        if session.stop_requested() {
            return Spoken::Stopped;
        }
        if session.is_muted() {
            return Spoken::Muted;
        }
        if text.is_empty() {
            return Spoken::Finished;
        }

        let speaker = Arc::clone(&self.collaborators.speaker);
        let acked = session.acked_stop_epoch();
        let mut interrupts = session.interrupts();
        tokio::select! {
            result = speaker.speak(text) => {
                if let Err(e) = result {
                    warn!("Speech failed: {}", e);
                    self.telemetry.record(TelemetryEvent::CollaboratorFailed {
                        collaborator: CollaboratorId::Speaker,
                    });
                }
                Spoken::Finished
            }
            _ = interrupts.wait_until(|s| s.stop_epoch > acked || s.muted) => {
                speaker.stop().await;
                self.telemetry.record(TelemetryEvent::SpeechAborted);
                if session.stop_requested() {
                    Spoken::Stopped
                } else {
                    Spoken::Muted
                }
            }
        }
    }

    async fn listen(&mut self, session: &DialogueSession, timeout: Duration) -> Capture {
        if session.stop_requested() {
            return Capture::Stopped;
        }
        if session.is_muted() {
            return Capture::Muted;
        }

        let transcriber = Arc::clone(&self.collaborators.transcriber);
        let acked = session.acked_stop_epoch();
        let mut interrupts = session.interrupts();
        tokio::select! {
            heard = transcriber.transcribe(timeout) => {
                match heard.map(|raw| normalize_transcript(&raw)) {
                    Some(text) if !text.is_empty() => Capture::Heard(text),
                    _ => Capture::Nothing,
                }
            }
            _ = interrupts.wait_until(|s| s.stop_epoch > acked || s.muted) => {
                if session.stop_requested() {
                    Capture::Stopped
                } else {
                    Capture::Muted
                }
            }
        }
    }

    fn transition(&mut self, session: &mut DialogueSession, request: PresenceRequest) {
        if let Some((from, to)) = session.transition(request) {
            self.telemetry
                .record(TelemetryEvent::PresenceTransition { from, to });
        }
    }
}
