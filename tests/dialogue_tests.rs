mod common;

use std::time::Duration;

use common::{harness, harness_speaking, harness_with, CountingAutomation, RecordingSpeaker, Reply};
use jarvis::hardware::HardwareSnapshot;
use jarvis::kernel::engine::{FAREWELL, GREETING, NOT_HEARD};
use jarvis::kernel::{ButtonAction, PresenceState, SessionEnd};
use jarvis::services::ActionKind;

async fn run(h: &mut common::Harness) -> SessionEnd {
    let mut session = h.engine.begin_session();
    tokio::time::timeout(Duration::from_secs(5), h.engine.run_session(&mut session))
        .await
        .expect("session should finish")
}

#[tokio::test]
async fn test_confirmed_call_dispatches_once() {
    let mut h = harness(vec![Reply::Say("Call John"), Reply::Say("yes that is correct")]);

    let end = run(&mut h).await;

    assert_eq!(end, SessionEnd::Quit);
    let calls = h.automation.calls();
    assert_eq!(calls.len(), 1, "exactly one collaborator call");
    assert_eq!(calls[0].0, ActionKind::PlaceCall);
    assert_eq!(calls[0].1["phone"], "3033331111");
    assert_eq!(calls[0].1["facetime"], "false");

    let lines = h.speaker.lines();
    assert_eq!(lines.first().map(String::as_str), Some(GREETING));
    assert!(lines.iter().any(|l| l.contains("John at 3033331111")));
    assert!(lines.iter().any(|l| l == "Calling John."));
    assert_eq!(lines.last().map(String::as_str), Some(FAREWELL));
}

#[tokio::test]
async fn test_declined_call_dispatches_nothing() {
    let mut h = harness(vec![Reply::Say("call john"), Reply::Say("no thanks")]);

    run(&mut h).await;

    assert!(h.automation.calls().is_empty());
    assert!(h.speaker.lines().iter().any(|l| l == "Okay, I cancelled that."));
    let snap = h.engine.telemetry.snapshot();
    assert_eq!(snap.confirmation_stats.cancelled, 1);
    assert_eq!(snap.dispatch_stats.cancelled, 1);
    assert_eq!(snap.dispatch_stats.issued, 0);
}

#[tokio::test]
async fn test_unrecognized_and_silent_answers_cancel() {
    let mut h = harness(vec![
        Reply::Say("call john"),
        Reply::Say("what was that"),
        Reply::Say("call 303-333-1111"),
        Reply::Silence,
    ]);

    run(&mut h).await;

    assert!(h.automation.calls().is_empty());
    assert_eq!(h.engine.telemetry.snapshot().confirmation_stats.cancelled, 2);
}

#[tokio::test]
async fn test_forced_stop_during_confirmation_discards_prompt() {
    let mut h = harness(vec![
        Reply::Say("send a message to john"),
        Reply::Say("running late"),
        Reply::Press(ButtonAction::Stop, Some("yes")),
    ]);

    let mut session = h.engine.begin_session();
    let end = tokio::time::timeout(Duration::from_secs(5), h.engine.run_session(&mut session))
        .await
        .unwrap();

    assert_eq!(end, SessionEnd::ForcedStop);
    assert!(h.automation.calls().is_empty(), "no dispatch after a forced stop");
    assert!(session.confirmation().is_idle());
    assert_eq!(session.presence(), PresenceState::Dormant);

    // Nothing is said after the restatement.
    let lines = h.speaker.lines();
    assert_eq!(lines.len(), 3);
    assert!(lines[2].contains("running late"));

    let snap = h.engine.telemetry.snapshot();
    assert_eq!(snap.confirmation_stats.discarded, 1);
    assert_eq!(snap.interruption_stats.forced_stops, 1);
    assert_eq!(snap.session_stats.forced_endings, 1);
}

#[tokio::test]
async fn test_forced_stop_before_session_is_ignored() {
    let mut h = harness(vec![Reply::Say("what's the temperature")]);
    h.controller.lock().unwrap().apply(ButtonAction::Stop);

    // The press predates the session, so it does not end it.
    assert_eq!(run(&mut h).await, SessionEnd::Quit);
}

#[tokio::test]
async fn test_quit_phrase_ends_session_without_dispatch() {
    let mut h = harness(vec![Reply::Say("ok goodbye and open safari")]);

    assert_eq!(run(&mut h).await, SessionEnd::Quit);
    assert!(h.automation.calls().is_empty());
    assert_eq!(h.speaker.lines(), vec![GREETING.to_string(), FAREWELL.to_string()]);
}

#[tokio::test]
async fn test_email_flow_spells_address() {
    let mut h = harness(vec![
        Reply::Say("send an email"),
        Reply::Say("j o h n at yahoo"),
        Reply::Say("Lunch"),
        Reply::Say("see you at noon"),
        Reply::Say("yes"),
    ]);

    run(&mut h).await;

    let calls = h.automation.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, ActionKind::SendEmail);
    assert_eq!(calls[0].1["to"], "john@yahoo.com");
    assert_eq!(calls[0].1["subject"], "lunch");
    assert_eq!(calls[0].1["body"], "see you at noon");
}

#[tokio::test]
async fn test_unknown_email_domain_cancels_only_that_action() {
    let mut h = harness(vec![
        Reply::Say("send an email"),
        Reply::Say("j o h n at rocketmail"),
        Reply::Say("search for rust news"),
    ]);

    assert_eq!(run(&mut h).await, SessionEnd::Quit);
    assert!(h.automation.calls().is_empty());
    assert!(h
        .speaker
        .lines()
        .iter()
        .any(|l| l.contains("don't recognize the email provider rocketmail")));
    // The session carried on to the next command.
    assert_eq!(h.search.queries.lock().unwrap().len(), 1);
    assert_eq!(h.engine.telemetry.snapshot().extraction_failures, 1);
}

#[tokio::test]
async fn test_reminder_uses_normalized_date() {
    let mut h = harness(vec![
        Reply::Say("remind me to water the plants"),
        Reply::Say("tomorrow at 5 pm"),
        Reply::Say("yeah"),
    ]);

    run(&mut h).await;

    let calls = h.automation.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, ActionKind::CreateReminder);
    assert!(calls[0].1["title"].contains("water the plants"));
    assert_eq!(calls[0].1["due"], "Saturday, March 16, 2024 at 5:00 PM");
}

#[tokio::test]
async fn test_unparseable_date_cancels_reminder() {
    let mut h = harness(vec![
        Reply::Say("set a reminder to stretch"),
        Reply::Say("whenever you like"),
    ]);

    run(&mut h).await;

    assert!(h.automation.calls().is_empty());
    assert_eq!(h.engine.telemetry.snapshot().confirmation_stats.requested, 0);
    assert_eq!(h.engine.telemetry.snapshot().extraction_failures, 1);
}

#[tokio::test]
async fn test_message_asks_for_missing_recipient() {
    let mut h = harness(vec![
        Reply::Say("send a message"),
        Reply::Say("mom"),
        Reply::Say("on my way"),
        Reply::Say("yep"),
    ]);

    run(&mut h).await;

    let calls = h.automation.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, ActionKind::SendMessage);
    assert_eq!(calls[0].1["phone"], "5550100200");
    assert_eq!(calls[0].1["body"], "on my way");
}

#[tokio::test]
async fn test_non_side_effecting_intents_skip_confirmation() {
    let mut h = harness(vec![
        Reply::Say("open notes"),
        Reply::Say("open apple dot com in safari"),
        Reply::Say("tell me a joke"),
        Reply::Say("what is the latest news"),
    ]);

    run(&mut h).await;

    let calls = h.automation.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, ActionKind::OpenApp);
    assert_eq!(calls[0].1["name"], "notes");
    assert_eq!(calls[1].0, ActionKind::OpenUrl);
    assert_eq!(calls[1].1["url"], "https://apple.com");

    assert_eq!(*h.chat.prompts.lock().unwrap(), vec!["tell me a joke".to_string()]);
    assert_eq!(h.search.queries.lock().unwrap().len(), 1);
    assert_eq!(h.engine.telemetry.snapshot().confirmation_stats.requested, 0);
}

#[tokio::test]
async fn test_environment_query_reads_snapshot() {
    let mut h = harness(vec![
        Reply::Say("what's the temperature"),
        Reply::Say("is it humid in here"),
    ]);
    h.snapshot_tx.send_replace(HardwareSnapshot {
        sensor_reading: Some("DHT:T:75F, H:40%".to_string()),
        ..Default::default()
    });

    run(&mut h).await;

    let lines = h.speaker.lines();
    assert!(lines.contains(&"The current temperature is 75 degrees Fahrenheit.".to_string()));
    assert!(lines.contains(&"The current humidity is 40 percent.".to_string()));
    assert!(h.automation.calls().is_empty());
    assert!(h.search.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_automation_failure_degrades_to_apology() {
    let mut h = harness_with(
        vec![Reply::Say("open calculator")],
        CountingAutomation::failing(),
    );

    assert_eq!(run(&mut h).await, SessionEnd::Quit);
    assert_eq!(h.automation.calls().len(), 1);
    assert!(h
        .speaker
        .lines()
        .contains(&jarvis::kernel::dispatch::AUTOMATION_APOLOGY.to_string()));
    assert_eq!(h.engine.telemetry.snapshot().collaborator_failures, 1);
}

#[tokio::test]
async fn test_silent_answer_while_gathering_cancels() {
    let mut h = harness(vec![Reply::Say("send an email"), Reply::Silence]);

    run(&mut h).await;

    assert!(h.automation.calls().is_empty());
    assert!(h.speaker.lines().contains(&NOT_HEARD.to_string()));
}

#[tokio::test]
async fn test_mute_holds_turns_until_cleared() {
    let mut h = harness(vec![Reply::Press(ButtonAction::Mute, None)]);

    let controller = h.controller.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.lock().unwrap().apply(ButtonAction::Unmute);
    });

    assert_eq!(run(&mut h).await, SessionEnd::Quit);
    let snap = h.engine.telemetry.snapshot();
    assert_eq!(snap.interruption_stats.mutes, 1);
    assert_eq!(snap.interruption_stats.forced_stops, 0);
}

#[tokio::test]
async fn test_confirmed_shutdown_ends_session() {
    let mut h = harness(vec![Reply::Say("please shut down the computer"), Reply::Say("yes")]);

    assert_eq!(run(&mut h).await, SessionEnd::Quit);
    let calls = h.automation.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, ActionKind::Shutdown);
}

#[tokio::test]
async fn test_forced_stop_cuts_speech_short() {
    let speaker = RecordingSpeaker::holding_on("Should I go ahead?");
    let mut h = harness_speaking(vec![Reply::Say("call john")], speaker);

    let speaker = h.speaker.clone();
    let controller = h.controller.clone();
    tokio::spawn(async move {
        speaker.holding.notified().await;
        controller.lock().unwrap().apply(ButtonAction::Stop);
    });

    let mut session = h.engine.begin_session();
    let end = tokio::time::timeout(Duration::from_secs(5), h.engine.run_session(&mut session))
        .await
        .expect("stop should end the restatement");

    assert_eq!(end, SessionEnd::ForcedStop);
    assert_eq!(h.speaker.stop_count(), 1);
    assert!(h.automation.calls().is_empty());
    assert!(session.confirmation().is_idle());

    // The interrupted restatement is the last thing said.
    let lines = h.speaker.lines();
    assert!(lines.last().unwrap().contains("John at 3033331111"));

    let snap = h.engine.telemetry.snapshot();
    assert_eq!(snap.interruption_stats.speech_aborted, 1);
    assert_eq!(snap.interruption_stats.forced_stops, 1);
    assert_eq!(snap.confirmation_stats.discarded, 1);
}

#[tokio::test]
async fn test_mute_cuts_speech_and_cancels_prompt() {
    let speaker = RecordingSpeaker::holding_on("Should I go ahead?");
    let mut h = harness_speaking(vec![Reply::Say("call john")], speaker);

    let speaker = h.speaker.clone();
    let controller = h.controller.clone();
    tokio::spawn(async move {
        speaker.holding.notified().await;
        controller.lock().unwrap().apply(ButtonAction::Mute);
        tokio::time::sleep(Duration::from_millis(100)).await;
        controller.lock().unwrap().apply(ButtonAction::Unmute);
    });

    let end = run(&mut h).await;

    assert_eq!(end, SessionEnd::Quit);
    assert_eq!(h.speaker.stop_count(), 1);
    assert!(h.automation.calls().is_empty(), "nobody could answer while muted");
    // The cancellation is not spoken while muted.
    assert!(!h.speaker.lines().iter().any(|l| l == "Okay, I cancelled that."));

    let snap = h.engine.telemetry.snapshot();
    assert_eq!(snap.interruption_stats.speech_aborted, 1);
    assert_eq!(snap.interruption_stats.forced_stops, 0);
    assert_eq!(snap.confirmation_stats.cancelled, 1);
}
