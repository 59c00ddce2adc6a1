#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::{watch, Notify};

use jarvis::hardware::HardwareSnapshot;
use jarvis::kernel::extract::NaturalDateNormalizer;
use jarvis::kernel::{ButtonAction, DialogueEngine, EngineConfig, InterruptController};
use jarvis::services::contacts::StaticDirectory;
use jarvis::services::{
    ActionKind, ActionParams, Automation, ChatBackend, Collaborators, Contact, SearchBackend,
    Speaker, Transcriber,
};

/// Friday, March 15, 2024 at 10:00.
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

pub fn directory() -> StaticDirectory {
    StaticDirectory::new(vec![
        Contact {
            name: "John".to_string(),
            phone: "(303) 333-1111".to_string(),
        },
        Contact {
            name: "Mom".to_string(),
            phone: "555-010-0200".to_string(),
        },
    ])
}

/// One scripted capture.
pub enum Reply {
    Say(&'static str),
    Silence,
    /// Presses a hardware button, then answers.
    Press(ButtonAction, Option<&'static str>),
}

/// Plays back a script. Once exhausted it says "goodbye" so a session
/// always ends.
pub struct ScriptedTranscriber {
    script: Mutex<VecDeque<Reply>>,
    controller: Arc<Mutex<InterruptController>>,
}

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _timeout: Duration) -> Option<String> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Reply::Say(text)) => Some(text.to_string()),
            Some(Reply::Silence) => None,
            Some(Reply::Press(action, answer)) => {
                self.controller.lock().unwrap().apply(action);
                answer.map(str::to_string)
            }
            None => Some("goodbye".to_string()),
        }
    }
}

#[derive(Default)]
pub struct RecordingSpeaker {
    pub spoken: Mutex<Vec<String>>,
    pub stops: Mutex<usize>,
    /// Lines containing this fragment keep playing until `stop`.
    hold_on: Option<&'static str>,
    /// Signalled once a held line starts playing.
    pub holding: Notify,
    released: Notify,
}

impl RecordingSpeaker {
    pub fn holding_on(fragment: &'static str) -> Self {
        Self {
            hold_on: Some(fragment),
            ..Self::default()
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn stop_count(&self) -> usize {
        *self.stops.lock().unwrap()
    }
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) -> anyhow::Result<()> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.hold_on.is_some_and(|fragment| text.contains(fragment)) {
            self.holding.notify_one();
            self.released.notified().await;
        }
        Ok(())
    }

    async fn stop(&self) {
        *self.stops.lock().unwrap() += 1;
        self.released.notify_one();
    }
}

#[derive(Default)]
pub struct CountingAutomation {
    pub calls: Mutex<Vec<(ActionKind, ActionParams)>>,
    pub fail: bool,
}

impl CountingAutomation {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(ActionKind, ActionParams)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Automation for CountingAutomation {
    async fn automate(&self, kind: ActionKind, params: &ActionParams) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push((kind, params.clone()));
        if self.fail {
            anyhow::bail!("automation unavailable");
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingChat {
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatBackend for RecordingChat {
    async fn chat(&self, prompt: &str) -> String {
        self.prompts.lock().unwrap().push(prompt.to_string());
        "Chat answer.".to_string()
    }
}

#[derive(Default)]
pub struct RecordingSearch {
    pub queries: Mutex<Vec<String>>,
}

#[async_trait]
impl SearchBackend for RecordingSearch {
    async fn search(&self, query: &str) -> String {
        self.queries.lock().unwrap().push(query.to_string());
        "Search answer.".to_string()
    }
}

pub struct Harness {
    pub engine: DialogueEngine,
    pub speaker: Arc<RecordingSpeaker>,
    pub automation: Arc<CountingAutomation>,
    pub chat: Arc<RecordingChat>,
    pub search: Arc<RecordingSearch>,
    pub controller: Arc<Mutex<InterruptController>>,
    pub snapshot_tx: watch::Sender<HardwareSnapshot>,
}

pub fn harness(script: Vec<Reply>) -> Harness {
    harness_with(script, CountingAutomation::default())
}

pub fn harness_with(script: Vec<Reply>, automation: CountingAutomation) -> Harness {
    build(script, automation, RecordingSpeaker::default())
}

pub fn harness_speaking(script: Vec<Reply>, speaker: RecordingSpeaker) -> Harness {
    build(script, CountingAutomation::default(), speaker)
}

fn build(script: Vec<Reply>, automation: CountingAutomation, speaker: RecordingSpeaker) -> Harness {
    let (controller, interrupts) = InterruptController::new();
    let controller = Arc::new(Mutex::new(controller));
    let (snapshot_tx, snapshot_rx) = watch::channel(HardwareSnapshot::default());

    let speaker = Arc::new(speaker);
    let automation = Arc::new(automation);
    let chat = Arc::new(RecordingChat::default());
    let search = Arc::new(RecordingSearch::default());

    let collaborators = Collaborators {
        transcriber: Arc::new(ScriptedTranscriber {
            script: Mutex::new(script.into()),
            controller: Arc::clone(&controller),
        }),
        speaker: speaker.clone(),
        chat: chat.clone(),
        search: search.clone(),
        contacts: Arc::new(directory()),
        dates: Arc::new(NaturalDateNormalizer::with_clock(fixed_now())),
        automation: automation.clone(),
    };

    let config = EngineConfig {
        listen_timeout: Duration::from_millis(200),
        confirmation_timeout: Duration::from_millis(200),
    };
    let engine = DialogueEngine::new(collaborators, interrupts, snapshot_rx, config).unwrap();

    Harness {
        engine,
        speaker,
        automation,
        chat,
        search,
        controller,
        snapshot_tx,
    }
}
