//! Speech I/O adapters for running the assistant from a terminal.
//!
//! Real audio capture, wake-word spotting and recognition live outside this
//! crate; these adapters stand in for them with stdin lines and the macOS
//! `say` command.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use super::{Speaker, Transcriber, WakeWordDetector};

/// Stdin lines shared by the console wake word and console transcriber.
pub struct ConsoleInput {
    lines: Mutex<mpsc::Receiver<String>>,
}

impl ConsoleInput {
    /// Spawns the stdin reader task.
    pub fn spawn() -> Arc<Self> {
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            let mut lines = reader.lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            debug!("Console input closed");
        });
        Arc::new(Self::from_receiver(rx))
    }

    pub fn from_receiver(rx: mpsc::Receiver<String>) -> Self {
        Self {
            lines: Mutex::new(rx),
        }
    }

    async fn next_line(&self) -> Option<String> {
        self.lines.lock().await.recv().await
    }
}

pub struct ConsoleWakeWord {
    input: Arc<ConsoleInput>,
    phrase: String,
}

impl ConsoleWakeWord {
    pub fn new(input: Arc<ConsoleInput>, phrase: &str) -> Self {
        Self {
            input,
            phrase: phrase.to_lowercase(),
        }
    }
}

#[async_trait]
impl WakeWordDetector for ConsoleWakeWord {
    async fn wait_for_wake(&self) -> Result<()> {
        info!("Type '{}' to wake the assistant.", self.phrase);
        loop {
            match self.input.next_line().await {
                Some(line) if line.to_lowercase().contains(&self.phrase) => return Ok(()),
                Some(_) => continue,
                None => return Err(anyhow!("console input closed")),
            }
        }
    }
}

pub struct ConsoleTranscriber {
    input: Arc<ConsoleInput>,
}

impl ConsoleTranscriber {
    pub fn new(input: Arc<ConsoleInput>) -> Self {
        Self { input }
    }
}

#[async_trait]
impl Transcriber for ConsoleTranscriber {
    async fn transcribe(&self, timeout: Duration) -> Option<String> {
        match tokio::time::timeout(timeout, self.input.next_line()).await {
            Ok(line) => line,
            Err(_) => {
                debug!("Listening timed out after {:?}", timeout);
                None
            }
        }
    }
}

/// Plays text through the macOS `say` command. A running utterance is killed
/// by `stop`.
#[derive(Default)]
pub struct SayCommand {
    current: Mutex<Option<oneshot::Sender<()>>>,
}

impl SayCommand {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Speaker for SayCommand {
    async fn speak(&self, text: &str) -> Result<()> {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        if let Some(previous) = self.current.lock().await.replace(stop_tx) {
            let _ = previous.send(());
        }

        let mut child = tokio::process::Command::new("say")
            .arg(text)
            .kill_on_drop(true)
            .spawn()?;

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if !status.success() {
                    warn!("'say' exited with {}", status);
                }
            }
            _ = &mut stop_rx => {
                let _ = child.kill().await;
            }
        }
        Ok(())
    }

    async fn stop(&self) {
        if let Some(stop_tx) = self.current.lock().await.take() {
            let _ = stop_tx.send(());
        }
    }
}

/// Prints utterances instead of voicing them.
#[derive(Debug, Default)]
pub struct ConsoleSpeaker;

#[async_trait]
impl Speaker for ConsoleSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        println!("JARVIS: {}", text);
        Ok(())
    }

    async fn stop(&self) {}
}
