//! Integration tests for timed replay
//!
//! These tests measure wall-clock timing, so they run serially.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::builders::{tap_train, TimelineBuilder};
use common::mock_helpers::{event_channel, Call, RecordingActuator};
use serial_test::serial;
use tapline_rs::config::ReplaySettings;
use tapline_rs::events::drain;
use tapline_rs::{
    Action, EventLevel, EventReason, Point, ReplayCanceller, ReplayState, Replayer, Result,
    ViewDirection, ViewMode,
};

fn view(direction: ViewDirection, timestamp: f64) -> Action {
    Action::view_control(
        direction,
        ViewMode::Fast,
        Point::new(1280, 720),
        Point::new(980, 720),
        timestamp,
        100,
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_calls_follow_timeline_order() {
    let actuator = RecordingActuator::new();
    let replayer = Replayer::new(actuator.clone(), ReplaySettings::default());
    let timeline = tap_train(6, 0.04);

    let outcome = replayer
        .replay(&timeline, &ReplayCanceller::new())
        .await
        .unwrap();

    assert_eq!(outcome.report().executed, 6);
    let expected: Vec<Call> = (0..6).map(|i| Call::Tap(Point::new(i, 0))).collect();
    assert_eq!(actuator.calls(), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_slow_actuator_does_not_cause_drift() {
    // 10 taps 20ms apart on a device that takes 60ms per call. A sequential
    // loop would finish the last call ~600ms in; absolute deadlines keep it
    // near 180ms.
    let actuator = RecordingActuator::with_latency(Duration::from_millis(60));
    let replayer = Replayer::new(actuator.clone(), ReplaySettings::default());
    let timeline = tap_train(10, 0.02);

    let started = Instant::now();
    replayer
        .replay(&timeline, &ReplayCanceller::new())
        .await
        .unwrap();

    let calls = actuator.timed_calls();
    assert_eq!(calls.len(), 10);
    let last_start = calls[9].0.duration_since(started);
    assert!(
        last_start < Duration::from_millis(180) + common::scheduling_tolerance(),
        "last call started {:?} after replay began",
        last_start
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_cancel_mid_flight_stops_future_calls() {
    let actuator = RecordingActuator::new();
    let replayer = Arc::new(Replayer::new(actuator.clone(), ReplaySettings::default()));
    let timeline = tap_train(20, 0.05);
    let cancel = ReplayCanceller::new();

    let task = {
        let replayer = replayer.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { replayer.replay(&timeline, &cancel).await })
    };

    tokio::time::sleep(Duration::from_millis(230)).await;
    cancel.cancel();
    let cancelled_at = Instant::now();

    let outcome = task.await.unwrap().unwrap();
    assert!(outcome.is_cancelled());
    assert_eq!(replayer.state(), ReplayState::Cancelled);

    let report = outcome.report();
    assert_eq!(report.executed + report.cancelled, 20);
    assert!(report.executed >= 3 && report.executed <= 6);

    // nothing may start after cancellation was requested
    for (at, call) in actuator.timed_calls() {
        assert!(at <= cancelled_at, "{:?} started after cancel", call);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_cancel_returns_without_waiting_for_deadlines() {
    let actuator = RecordingActuator::new();
    let replayer = Arc::new(Replayer::new(actuator.clone(), ReplaySettings::default()));
    let timeline = TimelineBuilder::new().tap("w", 1, 1, 30.0).build();
    let cancel = ReplayCanceller::new();

    let task = {
        let replayer = replayer.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { replayer.replay(&timeline, &cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let before = Instant::now();
    cancel.cancel();
    let outcome = task.await.unwrap().unwrap();

    assert!(before.elapsed() < Duration::from_secs(1));
    assert!(outcome.is_cancelled());
    assert_eq!(actuator.call_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_failed_call_does_not_block_rest() {
    let (bus, rx) = event_channel();
    let actuator = RecordingActuator::failing_at(Point::new(2, 0));
    let replayer = Replayer::new(actuator.clone(), ReplaySettings::default()).with_events(bus);

    let outcome = replayer
        .replay(&tap_train(5, 0.02), &ReplayCanceller::new())
        .await
        .unwrap();

    assert!(!outcome.is_cancelled());
    assert_eq!(outcome.report().failed, 1);
    assert_eq!(outcome.report().executed, 4);
    assert_eq!(actuator.call_count(), 5);

    let errors: Vec<_> = drain(&rx)
        .into_iter()
        .filter(|e| e.level == EventLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].action_index, Some(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_predicate_vetoes_selected_gestures() {
    let (bus, rx) = event_channel();
    let actuator = RecordingActuator::new();
    // target already in view when looking left
    let predicate = |action: &Action| -> Result<bool> {
        Ok(action.direction == Some(ViewDirection::Left))
    };

    let timeline = TimelineBuilder::new()
        .action(view(ViewDirection::Left, 0.0))
        .action(view(ViewDirection::Right, 0.05))
        .tap("w", 5, 5, 0.1)
        .build();

    let outcome = Replayer::new(actuator.clone(), ReplaySettings::default())
        .with_predicate(Arc::new(predicate))
        .with_events(bus)
        .replay(&timeline, &ReplayCanceller::new())
        .await
        .unwrap();

    assert_eq!(outcome.report().suppressed, 1);
    assert_eq!(actuator.calls().len(), 2);
    assert!(matches!(actuator.calls()[0], Call::Slide(..)));

    let suppressed: Vec<_> = drain(&rx)
        .into_iter()
        .filter(|e| e.reason == EventReason::ActionSuppressed)
        .collect();
    assert_eq!(suppressed.len(), 1);
    assert_eq!(suppressed[0].action_index, Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_failing_predicate_does_not_suppress() {
    let (bus, rx) = event_channel();
    let actuator = RecordingActuator::new();
    let predicate = |_: &Action| -> Result<bool> {
        Err(tapline_rs::TaplineError::Predicate("camera unavailable".to_string()))
    };

    let outcome = Replayer::new(actuator.clone(), ReplaySettings::default())
        .with_predicate(Arc::new(predicate))
        .with_events(bus)
        .replay(
            &TimelineBuilder::new().action(view(ViewDirection::Up, 0.0)).build(),
            &ReplayCanceller::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.report().executed, 1);
    assert!(drain(&rx).iter().any(|e| e.level == EventLevel::Warning
        && matches!(e.reason, EventReason::PredicateFailed { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_playback_speed_scales_deadlines() {
    let actuator = RecordingActuator::new();
    let mut settings = ReplaySettings::default();
    settings.set_playback_speed(4.0);
    let replayer = Replayer::new(actuator.clone(), settings);
    let timeline = TimelineBuilder::new().tap("w", 1, 1, 0.0).tap("w", 2, 2, 0.8).build();

    let started = Instant::now();
    replayer
        .replay(&timeline, &ReplayCanceller::new())
        .await
        .unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(200) + common::scheduling_tolerance() * 2);
}
