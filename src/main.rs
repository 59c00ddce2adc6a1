use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use jarvis::config::AssistantConfig;
use jarvis::hardware::{
    FileSnapshotSource, HardwareSnapshot, HardwareWatcher, LineSnapshotSource, SnapshotSource,
};
use jarvis::kernel::{DialogueEngine, EngineConfig, InterruptController};
use jarvis::kernel::extract::NaturalDateNormalizer;
use jarvis::services::automation::{AppleScriptAutomation, DryRunAutomation};
use jarvis::services::contacts::StaticDirectory;
use jarvis::services::llm::ChatService;
use jarvis::services::search::SerpApiSearch;
use jarvis::services::speech::{
    ConsoleInput, ConsoleSpeaker, ConsoleTranscriber, ConsoleWakeWord, SayCommand,
};
use jarvis::services::{Automation, Collaborators, Speaker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 2. Config. Missing keys are fatal.
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = AssistantConfig::load(path.as_deref())?;
    config.validate()?;
    info!("{} booting", config.assistant.name);

    // 3. Collaborators
    let automation: Arc<dyn Automation> = if config.automation.dry_run {
        Arc::new(DryRunAutomation)
    } else {
        Arc::new(AppleScriptAutomation)
    };
    let speaker: Arc<dyn Speaker> = if config.assistant.voice {
        Arc::new(SayCommand::new())
    } else {
        Arc::new(ConsoleSpeaker)
    };
    let input = ConsoleInput::spawn();
    let collaborators = Collaborators {
        transcriber: Arc::new(ConsoleTranscriber::new(Arc::clone(&input))),
        speaker,
        chat: Arc::new(ChatService::new(&config.chat)),
        search: Arc::new(SerpApiSearch::new(&config.search)),
        contacts: Arc::new(StaticDirectory::new(config.contacts.clone())),
        dates: Arc::new(NaturalDateNormalizer::new()),
        automation: Arc::clone(&automation),
    };

    // 4. Hardware watcher (sole writer of snapshot and interrupt state)
    let cancel = CancellationToken::new();
    let (controller, interrupts) = InterruptController::new();
    let (snapshot_tx, snapshot_rx) = watch::channel(HardwareSnapshot::default());

    let hardware = &config.hardware;
    let source: Option<Box<dyn SnapshotSource>> =
        match (&hardware.serial_path, &hardware.snapshot_path) {
            (Some(serial), _) => Some(Box::new(LineSnapshotSource::open(serial).await?)),
            (None, Some(file)) => {
                Some(Box::new(FileSnapshotSource::new(file, hardware.poll_interval())))
            }
            (None, None) => None,
        };
    let _controller_guard = match source {
        Some(source) => {
            let mut watcher = HardwareWatcher::new(source, snapshot_tx, controller);
            if hardware.follow_volume {
                watcher = watcher.with_volume_follow(Arc::clone(&automation));
            }
            let token = cancel.child_token();
            tokio::spawn(async move {
                if let Err(e) = watcher.run(token).await {
                    error!("Hardware watcher stopped: {:#}", e);
                }
            });
            None
        }
        None => {
            info!("No hardware configured; mute and stop are unavailable");
            Some((controller, snapshot_tx))
        }
    };

    // 5. Dialogue loop
    let wake = ConsoleWakeWord::new(Arc::clone(&input), &config.assistant.wake_phrase);
    let mut engine = DialogueEngine::new(
        collaborators,
        interrupts,
        snapshot_rx,
        EngineConfig::from(&config.assistant),
    )?;

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received");
            ctrl_c.cancel();
        }
    });

    let result = engine.run(&wake, cancel.clone()).await;
    cancel.cancel();
    info!("Session stats: {:?}", engine.telemetry.snapshot());
    result?;
    Ok(())
}
