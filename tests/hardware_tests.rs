mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use common::CountingAutomation;
use jarvis::hardware::{
    parse_line, FileSnapshotSource, HardwareLine, HardwareSnapshot, HardwareWatcher, LineDecoder,
    LineSnapshotSource, LossyLines, SensorReading, SnapshotSource,
};
use jarvis::kernel::InterruptController;
use jarvis::services::ActionKind;

#[test]
fn test_parse_lines() {
    assert_eq!(parse_line("VOL:42\r\n"), Some(HardwareLine::Volume(42)));
    assert_eq!(parse_line("VOL:abc"), None);
    assert_eq!(
        parse_line("BTN:STOP"),
        Some(HardwareLine::Button("BTN:STOP".to_string()))
    );
    assert_eq!(
        parse_line("DHT:T:75F, H:40%"),
        Some(HardwareLine::Sensor("DHT:T:75F, H:40%".to_string()))
    );
    assert_eq!(parse_line("BOOT OK"), None);
}

#[test]
fn test_decoder_folds_into_latest() {
    let mut decoder = LineDecoder::new();
    decoder.feed("VOL:30");
    assert!(decoder.feed("garbage").is_none());
    let snap = decoder.feed("BTN:MUTE").unwrap();

    assert_eq!(snap.volume_percent, Some(30));
    assert_eq!(snap.last_button_event.as_deref(), Some("BTN:MUTE"));
    assert_eq!(snap.sensor_reading, None);
}

#[test]
fn test_sensor_reading() {
    let reading = SensorReading::parse("DHT:T:75F, H:40%");
    assert_eq!(reading.temperature.unwrap().value, 75.0);
    assert_eq!(reading.temperature.unwrap().unit, 'F');
    assert_eq!(reading.humidity, Some(40.0));
    assert_eq!(
        reading.spoken_temperature().unwrap(),
        "The current temperature is 75 degrees Fahrenheit."
    );

    let celsius = SensorReading::parse("T:21.5C");
    assert_eq!(celsius.temperature.unwrap().unit, 'C');
    assert_eq!(celsius.humidity, None);
    assert!(celsius.spoken_humidity().is_none());
}

#[test]
fn test_snapshot_json_accepts_both_shapes() {
    let current = HardwareSnapshot::from_json(
        r#"{"volumePercent":55,"sensorReading":"DHT:T:70F, H:35%","lastButtonEvent":"BTN:STOP"}"#,
    )
    .unwrap();
    let legacy = HardwareSnapshot::from_json(
        r#"{"volume":55,"dht":"DHT:T:70F, H:35%","button":"BTN:STOP"}"#,
    )
    .unwrap();
    assert_eq!(current, legacy);

    let empty = HardwareSnapshot::from_json(r#"{"volume":null,"dht":null,"button":null}"#).unwrap();
    assert_eq!(empty, HardwareSnapshot::default());
}

#[test]
fn test_snapshot_write_atomic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hardware_data.json");
    let snap = HardwareSnapshot {
        volume_percent: Some(10),
        ..Default::default()
    };
    snap.write_atomic(&path).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"volumePercent\":10"));
    assert_eq!(HardwareSnapshot::from_json(&raw).unwrap(), snap);
}

#[tokio::test]
async fn test_file_source_yields_on_change_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hardware_data.json");
    std::fs::write(&path, r#"{"button":"BTN:MUTE"}"#).unwrap();

    let mut source = FileSnapshotSource::new(&path, Duration::from_millis(10));
    let first = source.next_snapshot().await.unwrap().unwrap();
    assert_eq!(first.last_button_event.as_deref(), Some("BTN:MUTE"));

    // Unchanged file: nothing new within the window.
    let idle = tokio::time::timeout(Duration::from_millis(80), source.next_snapshot()).await;
    assert!(idle.is_err());

    std::fs::write(&path, r#"{"button":"BTN:UNMUTE"}"#).unwrap();
    let second = tokio::time::timeout(Duration::from_secs(1), source.next_snapshot())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(second.last_button_event.as_deref(), Some("BTN:UNMUTE"));
}

#[tokio::test]
async fn test_watcher_publishes_and_raises_interrupts() {
    let serial: &'static [u8] = b"VOL:20\nhello\nBTN:MUTE\nDHT:T:70F, H:30%\nBTN:STOP\nVOL:20\n";
    let source = LineSnapshotSource::new(Box::new(serial));
    let (controller, interrupts) = InterruptController::new();
    let (snapshot_tx, snapshot_rx) = watch::channel(HardwareSnapshot::default());
    let automation = Arc::new(CountingAutomation::default());

    let watcher = HardwareWatcher::new(Box::new(source), snapshot_tx, controller)
        .with_volume_follow(automation.clone());
    watcher.run(CancellationToken::new()).await.unwrap();

    let state = interrupts.current();
    assert!(state.muted);
    assert_eq!(state.stop_epoch, 1);

    let snap = snapshot_rx.borrow().clone();
    assert_eq!(snap.volume_percent, Some(20));
    assert_eq!(snap.sensor_reading.as_deref(), Some("DHT:T:70F, H:30%"));

    // Volume followed once; the repeated value was not re-sent.
    let calls = automation.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, ActionKind::SetVolume);
    assert_eq!(calls[0].1["percent"], "20");
}

#[tokio::test]
async fn test_watcher_survives_line_noise() {
    let mut serial = vec![0xff, 0xfe, b'\n'];
    serial.extend_from_slice(b"BTN:STOP\n");
    let source = LineSnapshotSource::new(Box::new(std::io::Cursor::new(serial)));
    let (controller, interrupts) = InterruptController::new();
    let (snapshot_tx, snapshot_rx) = watch::channel(HardwareSnapshot::default());

    let watcher = HardwareWatcher::new(Box::new(source), snapshot_tx, controller);
    watcher.run(CancellationToken::new()).await.unwrap();

    assert_eq!(interrupts.current().stop_epoch, 1);
    assert_eq!(snapshot_rx.borrow().last_button_event.as_deref(), Some("BTN:STOP"));
}

#[tokio::test]
async fn test_lossy_lines_replace_invalid_bytes() {
    let raw: &'static [u8] = b"VOL:\xff7\r\nDHT:T:70F\nlast";
    let mut lines = LossyLines::new(raw);
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("VOL:\u{fffd}7"));
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("DHT:T:70F"));
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("last"));
    assert_eq!(lines.next_line().await.unwrap(), None);
}

#[tokio::test]
async fn test_watcher_stops_on_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let source =
        FileSnapshotSource::new(dir.path().join("missing.json"), Duration::from_millis(10));
    let (controller, _interrupts) = InterruptController::new();
    let (snapshot_tx, _snapshot_rx) = watch::channel(HardwareSnapshot::default());
    let cancel = CancellationToken::new();

    let watcher = HardwareWatcher::new(Box::new(source), snapshot_tx, controller);
    let task = tokio::spawn(watcher.run(cancel.clone()));
    tokio::time::sleep(Duration::from_millis(30)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(2), task).await;
    assert!(result.is_ok(), "watcher should finish after cancel");
}
