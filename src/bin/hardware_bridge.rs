//! Bridges the microcontroller's serial lines to the snapshot file the
//! assistant polls.
//!
//! Usage: `jarvis-hardware-bridge [DEVICE] [SNAPSHOT_PATH]`. Reads stdin when
//! no device is given.

use std::path::PathBuf;

use tokio::io::AsyncRead;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use jarvis::hardware::{LineDecoder, LossyLines};

const DEFAULT_SNAPSHOT: &str = "hardware_data.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = std::env::args_os().skip(1);
    let device = args.next().map(PathBuf::from).filter(|p| p.as_os_str() != "-");
    let snapshot_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT));

    let reader: Box<dyn AsyncRead + Unpin + Send> = match &device {
        Some(path) => {
            info!("Reading hardware lines from {}", path.display());
            Box::new(tokio::fs::File::open(path).await?)
        }
        None => {
            info!("Reading hardware lines from stdin");
            Box::new(tokio::io::stdin())
        }
    };

    let mut decoder = LineDecoder::new();
    let mut lines = LossyLines::new(reader);
    while let Some(line) = lines.next_line().await? {
        let Some(snapshot) = decoder.feed(&line) else {
            continue;
        };
        info!("Received: {}", line.trim());
        if let Err(e) = snapshot.write_atomic(&snapshot_path) {
            warn!("Failed to write {}: {}", snapshot_path.display(), e);
        }
    }

    info!("Hardware stream closed");
    Ok(())
}
