//! Integration tests for the persisted timeline format

mod common;

use common::builders::{tap_train, TimelineBuilder};
use serde_json::Value;
use tapline_rs::timeline::file::is_format_error;
use tapline_rs::{Action, ActionKind, Point, TaplineError, Timeline, ViewDirection, ViewMode};

#[test]
fn test_save_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let timeline = TimelineBuilder::new()
        .device("emulator-5554")
        .tap("w", 100, 100, 0.0)
        .long_press("a", 50, 50, 1.0, 2000)
        .swipe((10, 10), (400, 10), 3.25)
        .action(Action::view_control(
            ViewDirection::Down,
            ViewMode::Slow,
            Point::new(1280, 720),
            Point::new(1280, 870),
            4.125,
            200,
        ))
        .build();

    timeline.save_to_file(&path).unwrap();
    let loaded = Timeline::load_from_file(&path).unwrap();

    assert_eq!(loaded, timeline);
    assert_eq!(loaded.stats().action_types[&ActionKind::ViewControl], 1);
}

#[test]
fn test_many_actions_keep_order() {
    let timeline = tap_train(200, 0.013);
    let loaded = Timeline::from_json_str(&timeline.to_json_string().unwrap()).unwrap();

    assert_eq!(loaded.len(), 200);
    assert!(loaded.is_sorted());
    for (a, b) in timeline.actions.iter().zip(&loaded.actions) {
        assert_eq!(a.key, b.key);
        assert_eq!(a.timestamp, b.timestamp);
    }
}

#[test]
fn test_external_tool_output_loads() {
    let json = r#"{
        "device_id": "127.0.0.1:5555",
        "total_duration": 2.5,
        "total_actions": 3,
        "created_time": "2024-11-02T20:15:03.123456",
        "actions": [
            {"type": "tap", "key": "w", "position": [640, 360], "timestamp": 0.0,
             "duration": 50, "executed": true},
            {"type": "long_press", "key": "a", "position": [200, 600], "timestamp": 0.5,
             "duration": 2000, "end_timestamp": 2.5, "actual_duration": 2000},
            {"type": "view_control", "direction": "view_left", "mode": "fast",
             "start_position": [1280, 720], "end_position": [980, 720],
             "timestamp": 1.0, "duration": 100, "source": "pc"}
        ]
    }"#;

    let timeline = Timeline::from_json_str(json).unwrap();
    assert_eq!(timeline.device_ref.as_deref(), Some("127.0.0.1:5555"));
    assert_eq!(timeline.len(), 3);
    assert_eq!(timeline.actions[2].direction, Some(ViewDirection::Left));

    // unknown action keys survive a save
    let out: Value = serde_json::from_str(&timeline.to_json_string().unwrap()).unwrap();
    assert_eq!(out["actions"][1]["actual_duration"], 2000);
    assert_eq!(out["actions"][0]["executed"], true);
    assert_eq!(out["actions"][2]["source"], "secondary");
}

#[test]
fn test_malformed_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"device_id": "x", "actions": [{"type": "pinch"}]}"#).unwrap();

    let err = Timeline::load_from_file(&path).unwrap_err();
    assert!(is_format_error(&err));
    assert!(err.to_string().contains("broken.json"));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Timeline::load_from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err.root(), TaplineError::Io(_)));
    assert!(!is_format_error(&err));
}
