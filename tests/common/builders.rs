//! Test data builders for creating timelines

use chrono::{DateTime, TimeZone, Utc};
use tapline_rs::{Action, Point, Timeline};

/// Fixed anchor so timelines compare equal across runs
pub fn test_anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

/// Builder for creating test Timelines
pub struct TimelineBuilder {
    anchor: DateTime<Utc>,
    device: Option<String>,
    actions: Vec<Action>,
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self {
            anchor: test_anchor(),
            device: None,
            actions: Vec::new(),
        }
    }

    pub fn anchor(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn device(mut self, device: &str) -> Self {
        self.device = Some(device.to_string());
        self
    }

    pub fn tap(mut self, key: &str, x: i32, y: i32, timestamp: f64) -> Self {
        self.actions
            .push(Action::tap(key, Point::new(x, y), timestamp, 50));
        self
    }

    pub fn long_press(mut self, key: &str, x: i32, y: i32, timestamp: f64, duration_ms: u64) -> Self {
        self.actions
            .push(Action::long_press(key, Point::new(x, y), timestamp, duration_ms));
        self
    }

    pub fn swipe(mut self, from: (i32, i32), to: (i32, i32), timestamp: f64) -> Self {
        self.actions
            .push(Action::swipe(from.into(), to.into(), timestamp, 300));
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn build(self) -> Timeline {
        let timeline = Timeline::from_actions(self.anchor, self.actions);
        match self.device {
            Some(device) => timeline.with_device(device),
            None => timeline,
        }
    }
}

/// `count` taps spaced `step` seconds apart, keyed by index
pub fn tap_train(count: usize, step: f64) -> Timeline {
    (0..count)
        .fold(TimelineBuilder::new(), |builder, i| {
            builder.tap(&format!("k{}", i), i as i32, 0, i as f64 * step)
        })
        .build()
}
