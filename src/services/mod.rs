//! Collaborator contracts the dialogue core depends on, plus the adapters the
//! binaries wire in. The core only ever sees the traits.

pub mod automation;
pub mod contacts;
pub mod llm;
pub mod search;
pub mod speech;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Blocks until the wake phrase is heard. Errors are fatal to the process.
#[async_trait]
pub trait WakeWordDetector: Send + Sync {
    async fn wait_for_wake(&self) -> anyhow::Result<()>;
}

/// `None` on silence, garbled audio, timeout or service error.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, timeout: Duration) -> Option<String>;
}

/// Long-lived synthesis handle. `speak` resolves when playback ends; `stop`
/// cuts any playback in progress short.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str) -> anyhow::Result<()>;
    async fn stop(&self);
}

/// General-purpose answers. Never fails past its boundary.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, prompt: &str) -> String;
}

/// Single best snippet, or a fixed not-found string.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, query: &str) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    /// Stored as entered, e.g. "(303) 333-1111".
    pub phone: String,
}

pub trait ContactDirectory: Send + Sync {
    /// First contact whose name matches the candidate by substring.
    fn lookup(&self, candidate: &str) -> Option<Contact>;
}

pub trait DateNormalizer: Send + Sync {
    fn normalize(&self, text: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    SendEmail,
    CreateReminder,
    CreateCalendarEvent,
    SendMessage,
    PlaceCall,
    Shutdown,
    OpenApp,
    OpenUrl,
    SetVolume,
}

pub type ActionParams = BTreeMap<String, String>;

/// Fire-and-forget OS side effect.
#[async_trait]
pub trait Automation: Send + Sync {
    async fn automate(&self, kind: ActionKind, params: &ActionParams) -> anyhow::Result<()>;
}

/// Everything a conversation turn may call out to.
#[derive(Clone)]
pub struct Collaborators {
    pub transcriber: Arc<dyn Transcriber>,
    pub speaker: Arc<dyn Speaker>,
    pub chat: Arc<dyn ChatBackend>,
    pub search: Arc<dyn SearchBackend>,
    pub contacts: Arc<dyn ContactDirectory>,
    pub dates: Arc<dyn DateNormalizer>,
    pub automation: Arc<dyn Automation>,
}
