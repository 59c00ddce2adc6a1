//! The hardware watcher task.
//!
//! [`HardwareWatcher`] pulls snapshots from a [`SnapshotSource`] (the JSON file
//! written by the bridge, or serial lines read directly), publishes them on a
//! `watch` channel and feeds button edges into the [`InterruptController`].
//! It is the only writer of both the snapshot and the interrupt state.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::protocol::LineDecoder;
use super::snapshot::HardwareSnapshot;
use crate::kernel::cancel::InterruptController;
use crate::services::{ActionKind, ActionParams, Automation};

#[async_trait]
pub trait SnapshotSource: Send {
    /// Next changed snapshot. `Ok(None)` once the source is exhausted.
    async fn next_snapshot(&mut self) -> anyhow::Result<Option<HardwareSnapshot>>;
}

/// Polls the bridge's JSON file and yields only when its content changes.
/// A missing or malformed file is skipped until the next poll.
pub struct FileSnapshotSource {
    path: PathBuf,
    interval: Duration,
    last_raw: Option<String>,
}

impl FileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            path: path.into(),
            interval,
            last_raw: None,
        }
    }
}

#[async_trait]
impl SnapshotSource for FileSnapshotSource {
    async fn next_snapshot(&mut self) -> anyhow::Result<Option<HardwareSnapshot>> {
        loop {
            match tokio::fs::read_to_string(&self.path).await {
                Ok(raw) if self.last_raw.as_deref() != Some(raw.as_str()) => {
                    match HardwareSnapshot::from_json(&raw) {
                        Ok(snapshot) => {
                            self.last_raw = Some(raw);
                            return Ok(Some(snapshot));
                        }
                        Err(e) => debug!("Skipping unreadable snapshot: {}", e),
                    }
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to read {}: {}", self.path.display(), e),
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Newline-delimited reader that survives bytes which are not UTF-8.
///
/// Serial links emit noise on connect. Invalid bytes become U+FFFD, so the
/// line still reaches the decoder, which drops it as unknown.
pub struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// `Ok(None)` at end of stream. Only I/O failures are errors.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&self.buf);
        if let Cow::Owned(_) = line {
            debug!("Replaced invalid bytes in hardware line");
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Reads protocol lines (`VOL:`/`BTN:`/`DHT:`) from any byte stream.
pub struct LineSnapshotSource {
    lines: LossyLines<Box<dyn AsyncRead + Unpin + Send>>,
    decoder: LineDecoder,
}

impl LineSnapshotSource {
    pub fn new(reader: Box<dyn AsyncRead + Unpin + Send>) -> Self {
        Self {
            lines: LossyLines::new(reader),
            decoder: LineDecoder::new(),
        }
    }

    pub async fn open(path: &std::path::Path) -> anyhow::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new(Box::new(file)))
    }
}

#[async_trait]
impl SnapshotSource for LineSnapshotSource {
    async fn next_snapshot(&mut self) -> anyhow::Result<Option<HardwareSnapshot>> {
        while let Some(line) = self.lines.next_line().await? {
            if let Some(snapshot) = self.decoder.feed(&line) {
                return Ok(Some(snapshot));
            }
        }
        Ok(None)
    }
}

pub struct HardwareWatcher {
    source: Box<dyn SnapshotSource>,
    snapshot_tx: watch::Sender<HardwareSnapshot>,
    controller: InterruptController,
    /// Set when knob changes should follow through to the system volume.
    automation: Option<Arc<dyn Automation>>,
    last_volume: Option<u32>,
}

impl HardwareWatcher {
    pub fn new(
        source: Box<dyn SnapshotSource>,
        snapshot_tx: watch::Sender<HardwareSnapshot>,
        controller: InterruptController,
    ) -> Self {
        Self {
            source,
            snapshot_tx,
            controller,
            automation: None,
            last_volume: None,
        }
    }

    pub fn with_volume_follow(mut self, automation: Arc<dyn Automation>) -> Self {
        self.automation = Some(automation);
        self
    }

    pub fn controller(&self) -> &InterruptController {
        &self.controller
    }

    /// Runs until cancelled or the source is exhausted.
    pub async fn run(mut self, cancel: CancellationToken) -> anyhow::Result<()> {
        info!("Hardware watcher started");
        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Hardware watcher cancelled");
                    return Ok(());
                }
                next = self.source.next_snapshot() => next?,
            };
            let Some(snapshot) = next else {
                info!("Hardware source closed");
                return Ok(());
            };
            self.apply(snapshot).await;
        }
    }

    /// Publishes one snapshot: interrupts first, then the shared record, then
    /// volume follow.
    pub async fn apply(&mut self, snapshot: HardwareSnapshot) {
        if let Some(action) = self.controller.observe(&snapshot) {
            debug!("Button edge: {:?}", action);
        }

        let volume = snapshot.volume_percent;
        self.snapshot_tx.send_replace(snapshot);

        if volume.is_none() || volume == self.last_volume {
            return;
        }
        self.last_volume = volume;

        let (Some(automation), Some(percent)) = (&self.automation, volume) else {
            return;
        };
        let mut params = ActionParams::new();
        params.insert("percent".into(), percent.to_string());
        if let Err(e) = automation.automate(ActionKind::SetVolume, &params).await {
            warn!("Volume follow failed: {}", e);
        }
    }
}
