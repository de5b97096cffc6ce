//! Tunable settings for each pipeline stage
//!
//! # Main Types
//!
//! - [`RecorderSettings`] - Default durations and view-gesture geometry
//! - [`CalibrationSettings`] - Start-offset alignment for replayed streams
//! - [`MergeSettings`] - Long-press split threshold
//! - [`ReplaySettings`] - Scheduling, compensation and pre-check timing
//!
//! All durations are stored as integer milliseconds so config files stay
//! readable; accessor methods convert them to [`Duration`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::timeline::calibrate::CalibrationMode;
use crate::types::{Point, ViewMode};

use super::{
    DEFAULT_LONG_PRESS_COMPENSATION_MS, DEFAULT_MIN_LONG_PRESS_MS, DEFAULT_MIN_SPLIT_MS,
    DEFAULT_PRE_CHECK_LEAD_MS, DEFAULT_PREDICATE_TIMEOUT_MS, DEFAULT_START_CALIBRATION_SECS,
    DEFAULT_SWIPE_DURATION_MS, DEFAULT_TAP_DURATION_MS,
};

/// Recorder defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// Duration stored for a tap when the caller gives none
    pub tap_duration_ms: u64,

    /// Floor applied to every closed long-press
    pub min_long_press_ms: u64,

    /// Duration stored for a swipe when the caller gives none
    pub swipe_duration_ms: u64,

    /// Origin of view-control gestures
    pub view_center: Point,

    /// Slide length of a fast view gesture in pixels
    pub view_swipe_distance: i32,

    /// Slide length of a slow view gesture in pixels
    pub slow_view_swipe_distance: i32,

    /// Slide time of a fast view gesture
    pub fast_view_duration_ms: u64,

    /// Slide time of a slow view gesture
    pub slow_view_duration_ms: u64,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            tap_duration_ms: DEFAULT_TAP_DURATION_MS,
            min_long_press_ms: DEFAULT_MIN_LONG_PRESS_MS,
            swipe_duration_ms: DEFAULT_SWIPE_DURATION_MS,
            view_center: Point::new(1280, 720),
            view_swipe_distance: 300,
            slow_view_swipe_distance: 150,
            fast_view_duration_ms: 100,
            slow_view_duration_ms: 200,
        }
    }
}

impl RecorderSettings {
    /// Slide distance and duration for a view gesture in the given mode
    pub fn view_gesture(&self, mode: ViewMode) -> (i32, u64) {
        match mode {
            ViewMode::Fast => (self.view_swipe_distance, self.fast_view_duration_ms),
            ViewMode::Slow => (self.slow_view_swipe_distance, self.slow_view_duration_ms),
        }
    }
}

/// Calibration defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Where the first action of a replayed stream lands, in seconds
    pub start_offset_secs: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            start_offset_secs: DEFAULT_START_CALIBRATION_SECS,
        }
    }
}

impl CalibrationSettings {
    /// Set the start offset, clamped to 0-10 seconds
    pub fn set_start_offset(&mut self, secs: f64) {
        self.start_offset_secs = secs.clamp(0.0, 10.0);
    }

    /// First-action alignment mode built from these settings
    pub fn first_action_mode(&self) -> CalibrationMode {
        CalibrationMode::FirstActionAt {
            at_secs: self.start_offset_secs,
        }
    }
}

/// Merge/split settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    /// Split pieces shorter than this are dropped
    pub min_split_ms: u64,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            min_split_ms: DEFAULT_MIN_SPLIT_MS,
        }
    }
}

/// Replay scheduling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaySettings {
    /// Delay between calling replay and the replay anchor
    pub start_delay_ms: u64,

    /// Playback speed multiplier (1.0 = real-time)
    pub playback_speed: f64,

    /// Added to every hold so the device registers the full press
    pub long_press_compensation_ms: u64,

    /// Keys whose long taps are replayed as holds
    pub hold_keys: Vec<String>,

    /// Taps on hold keys longer than this become holds
    pub tap_hold_threshold_ms: u64,

    /// Hold time for a long-press without a duration
    pub default_long_press_ms: u64,

    /// Slide time for a swipe without a duration
    pub default_slide_ms: u64,

    /// How long before a directional gesture the predicate is consulted
    pub pre_check_lead_ms: u64,

    /// Budget for one predicate call
    pub predicate_timeout_ms: u64,

    /// Lateness above this is logged as a warning
    pub lateness_warn_ms: u64,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            start_delay_ms: 0,
            playback_speed: 1.0,
            long_press_compensation_ms: DEFAULT_LONG_PRESS_COMPENSATION_MS,
            hold_keys: vec!["a".to_string(), "d".to_string()],
            tap_hold_threshold_ms: 100,
            default_long_press_ms: 500,
            default_slide_ms: DEFAULT_SWIPE_DURATION_MS,
            pre_check_lead_ms: DEFAULT_PRE_CHECK_LEAD_MS,
            predicate_timeout_ms: DEFAULT_PREDICATE_TIMEOUT_MS,
            lateness_warn_ms: 100,
        }
    }
}

impl ReplaySettings {
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn pre_check_lead(&self) -> Duration {
        Duration::from_millis(self.pre_check_lead_ms)
    }

    pub fn predicate_timeout(&self) -> Duration {
        Duration::from_millis(self.predicate_timeout_ms)
    }

    pub fn lateness_warn(&self) -> Duration {
        Duration::from_millis(self.lateness_warn_ms)
    }

    /// Playback speed clamped to the supported range
    pub fn effective_speed(&self) -> f64 {
        if self.playback_speed.is_finite() {
            self.playback_speed.clamp(0.1, 10.0)
        } else {
            1.0
        }
    }

    /// Set playback speed
    pub fn set_playback_speed(&mut self, speed: f64) {
        self.playback_speed = speed.clamp(0.1, 10.0);
    }

    /// Set long-press compensation, clamped to 0-1000ms
    pub fn set_long_press_compensation(&mut self, ms: u64) {
        self.long_press_compensation_ms = ms.min(1000);
    }

    /// Whether a tap on this key with this duration is replayed as a hold
    pub fn tap_is_hold(&self, key: Option<&str>, duration_ms: u64) -> bool {
        duration_ms > self.tap_hold_threshold_ms
            && key.is_some_and(|k| self.hold_keys.iter().any(|h| h == k))
    }
}
