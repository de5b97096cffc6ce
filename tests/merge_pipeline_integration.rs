//! Integration tests for record → calibrate → merge

mod common;

use common::builders::{test_anchor, TimelineBuilder};
use common::mock_helpers::event_channel;
use tapline_rs::config::{EngineConfig, MergeSettings};
use tapline_rs::events::drain;
use tapline_rs::{
    pipeline, ActionKind, ActionSource, CalibrationMode, EventReason, Merger, Point,
    RecorderSession, Timeline,
};

#[test]
fn test_uninterrupted_primary_passes_through() {
    let primary = TimelineBuilder::new()
        .tap("w", 100, 100, 0.0)
        .long_press("a", 50, 50, 1.0, 2000)
        .build();

    let merged = Merger::default().merge_and_split(&primary, &Timeline::with_anchor(test_anchor()));

    assert_eq!(merged.len(), 2);
    assert_eq!(merged.anchor_time, primary.anchor_time);
    assert_eq!(merged.actions[0].kind, ActionKind::Tap);
    assert_eq!(merged.actions[1].duration, Some(2000));
    assert!(merged
        .actions
        .iter()
        .all(|a| a.source == Some(ActionSource::Primary) && !a.is_split()));
}

#[test]
fn test_live_tap_splits_recorded_press() {
    let primary = TimelineBuilder::new().tap("w", 100, 100, 2.0).build();
    let secondary = TimelineBuilder::new().long_press("a", 50, 50, 1.0, 2000).build();

    let merged = Merger::default().merge_and_split(&primary, &secondary);

    let pieces: Vec<_> = merged
        .actions
        .iter()
        .filter(|a| a.kind == ActionKind::LongPress)
        .collect();
    assert_eq!(pieces.len(), 2);
    assert_eq!(
        (pieces[0].timestamp, pieces[0].duration, pieces[0].split_part),
        (1.0, Some(1000), Some(1))
    );
    assert_eq!(
        (pieces[1].timestamp, pieces[1].duration, pieces[1].split_part),
        (2.0, Some(1000), Some(2))
    );
    assert!(pieces.iter().all(|p| p.original_duration == Some(2000)));
}

#[test]
fn test_burst_of_interrupts_drops_slivers() {
    let (bus, rx) = event_channel();
    let primary = TimelineBuilder::new()
        .tap("w", 1, 1, 1.5)
        .tap("s", 1, 1, 1.52)
        .tap("w", 1, 1, 2.5)
        .build();
    let secondary = TimelineBuilder::new().long_press("d", 9, 9, 1.0, 3000).build();

    let merged = Merger::new(MergeSettings { min_split_ms: 50 })
        .with_events(bus)
        .merge_and_split(&primary, &secondary);

    let parts: Vec<(Option<u32>, u64)> = merged
        .actions
        .iter()
        .filter(|a| a.is_split())
        .map(|a| (a.split_part, a.duration_ms()))
        .collect();
    // [1.5, 1.52) is 20ms and dropped
    assert_eq!(parts, vec![(Some(1), 500), (Some(3), 980), (Some(4), 1500)]);
    let total: u64 = parts.iter().map(|(_, ms)| ms).sum();
    assert!(total <= 3000);

    let events = drain(&rx);
    assert!(events.iter().any(|e| e.reason
        == EventReason::LongPressSplit {
            cuts: 3,
            retained: 3
        }));
}

#[test]
fn test_recorded_session_merges_with_file() {
    let dir = tempfile::tempdir().unwrap();
    let recorded_path = dir.path().join("recorded.json");

    // pre-recorded stream, first action 4s into its own session
    TimelineBuilder::new()
        .long_press("a", 200, 600, 4.0, 1500)
        .tap("j", 900, 500, 6.0)
        .build()
        .save_to_file(&recorded_path)
        .unwrap();

    let mut recorder = RecorderSession::new();
    recorder.set_device("emulator-5554");
    recorder.start_recording(true);
    recorder.record_tap("w", Point::new(640, 360), None, Some(0.7));
    recorder.stop_recording();
    let live = recorder.take_timeline();

    let recorded = Timeline::load_from_file(&recorded_path).unwrap();
    let merged = pipeline::prepare_merged(
        &live,
        &recorded,
        CalibrationMode::FirstActionAt { at_secs: 0.2 },
        &EngineConfig::default(),
        &tapline_rs::EventBus::new(),
    );

    // press moved to [0.2, 1.7) and cut by the live tap at 0.7
    let split: Vec<_> = merged.actions.iter().filter(|a| a.is_split()).collect();
    assert_eq!(split.len(), 2);
    common::assert_float_eq(split[0].timestamp, 0.2, 1e-9);
    common::assert_float_eq(split[1].timestamp, 0.7, 1e-9);
    assert_eq!(split[0].duration, Some(500));
    assert_eq!(split[1].duration, Some(1000));
    assert_eq!(merged.device_ref.as_deref(), Some("emulator-5554"));
    assert!(merged.is_sorted());

    let info = merged.merge_info.as_ref().unwrap();
    assert_eq!(info.primary_actions_count, 1);
    assert_eq!(info.secondary_actions_count, 2);

    // merged output is itself a valid file
    let merged_path = dir.path().join("merged.json");
    merged.save_to_file(&merged_path).unwrap();
    let reloaded = Timeline::load_from_file(&merged_path).unwrap();
    assert_eq!(reloaded.actions, merged.actions);
    assert_eq!(reloaded.merge_info, merged.merge_info);
}

#[test]
fn test_capture_start_calibration_for_dual_capture() {
    let primary = TimelineBuilder::new().tap("w", 1, 1, 1.0).build();
    let secondary = TimelineBuilder::new()
        .anchor(test_anchor() + chrono::Duration::milliseconds(250))
        .long_press("a", 2, 2, 0.5, 1000)
        .build();

    let merged = pipeline::prepare_merged(
        &primary,
        &secondary,
        CalibrationMode::CaptureStart {
            started_at: secondary.anchor_time,
        },
        &EngineConfig::default(),
        &tapline_rs::EventBus::new(),
    );

    // secondary press becomes [0.75, 1.75), cut at 1.0
    let durations: Vec<u64> = merged
        .actions
        .iter()
        .filter(|a| a.source == Some(ActionSource::Secondary))
        .map(|a| a.duration_ms())
        .collect();
    assert_eq!(durations, vec![250, 750]);
}
