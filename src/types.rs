//! Core data types for tapline-rs
//!
//! This module contains the atomic unit of every timeline, the [`Action`],
//! together with the small value types it is built from.
//!
//! # Main Types
//!
//! - [`Point`] - Screen coordinate, serialized as `[x, y]`
//! - [`ActionKind`] - Tap, long-press, swipe or directional view gesture
//! - [`ActionSource`] - Which stream contributed an action after a merge
//! - [`ViewDirection`] / [`ViewMode`] - Parameters of a view-control gesture
//! - [`Action`] - One recorded input with a relative timestamp

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A 2D screen coordinate
///
/// Serialized as a two-element array (`[x, y]`) to match the persisted
/// timeline format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point(pub i32, pub i32);

impl Point {
    /// Create a new point
    pub const fn new(x: i32, y: i32) -> Self {
        Self(x, y)
    }

    /// Horizontal coordinate
    pub const fn x(&self) -> i32 {
        self.0
    }

    /// Vertical coordinate
    pub const fn y(&self) -> i32 {
        self.1
    }

    /// Return this point moved by the given deltas
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self(self.0 + dx, self.1 + dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.0, self.1)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self(x, y)
    }
}

/// Kind of a recorded action
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Short press at a position
    Tap,
    /// Press held for `duration` milliseconds
    LongPress,
    /// Open long-press inside a recorder that has not been released yet
    LongPressStart,
    /// Slide from `start_position` to `end_position`
    Swipe,
    /// Directional camera/view gesture, replayed as a slide
    ViewControl,
}

impl ActionKind {
    /// Name used in the persisted format
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Tap => "tap",
            ActionKind::LongPress => "long_press",
            ActionKind::LongPressStart => "long_press_start",
            ActionKind::Swipe => "swipe",
            ActionKind::ViewControl => "view_control",
        }
    }

    /// Directional gestures are the ones a suppression predicate may veto
    pub fn is_directional(&self) -> bool {
        matches!(self, ActionKind::ViewControl)
    }

    /// Recorder-only state that never reaches an actuator
    pub fn is_transient(&self) -> bool {
        matches!(self, ActionKind::LongPressStart)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stream an action came from once two timelines have been merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionSource {
    /// Live capture; authoritative, never split
    #[serde(alias = "adb")]
    Primary,
    /// Pre-recorded stream; its long-presses are split by primary input
    #[serde(alias = "pc")]
    Secondary,
}

impl ActionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionSource::Primary => "primary",
            ActionSource::Secondary => "secondary",
        }
    }
}

impl fmt::Display for ActionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a view-control gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewDirection {
    #[serde(rename = "view_up")]
    Up,
    #[serde(rename = "view_down")]
    Down,
    #[serde(rename = "view_left")]
    Left,
    #[serde(rename = "view_right")]
    Right,
}

impl ViewDirection {
    /// Parse an arrow-key style name (`"up"`, `"view_up"`, ...)
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim_start_matches("view_") {
            "up" => Some(ViewDirection::Up),
            "down" => Some(ViewDirection::Down),
            "left" => Some(ViewDirection::Left),
            "right" => Some(ViewDirection::Right),
            _ => None,
        }
    }

    /// Unit vector in screen coordinates (y grows downwards)
    pub fn unit(&self) -> (i32, i32) {
        match self {
            ViewDirection::Up => (0, -1),
            ViewDirection::Down => (0, 1),
            ViewDirection::Left => (-1, 0),
            ViewDirection::Right => (1, 0),
        }
    }
}

impl fmt::Display for ViewDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViewDirection::Up => "view_up",
            ViewDirection::Down => "view_down",
            ViewDirection::Left => "view_left",
            ViewDirection::Right => "view_right",
        };
        f.write_str(name)
    }
}

/// Speed mode for view-control gestures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Slow,
    #[default]
    Fast,
}

/// One recorded input action
///
/// `timestamp` is in seconds relative to the owning timeline's anchor and
/// `duration` in milliseconds. Keys the format does not know about are kept
/// in `extra` so that files written by other tooling survive a load/save
/// cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Target of a tap or long-press
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,

    /// Swipe/view-control start point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_position: Option<Point>,

    /// Swipe/view-control end point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_position: Option<Point>,

    pub timestamp: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<ViewDirection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ViewMode>,

    /// Set by the merger
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ActionSource>,

    /// 1-based slice index, only on long-press pieces produced by a split
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_part: Option<u32>,

    /// Duration of the long-press a split piece was cut from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_duration: Option<u64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Action {
    fn bare(kind: ActionKind, timestamp: f64) -> Self {
        Self {
            kind,
            key: None,
            position: None,
            start_position: None,
            end_position: None,
            timestamp,
            duration: None,
            direction: None,
            mode: None,
            source: None,
            split_part: None,
            original_duration: None,
            extra: Map::new(),
        }
    }

    /// Create a tap action
    pub fn tap(key: impl Into<String>, position: Point, timestamp: f64, duration_ms: u64) -> Self {
        Self {
            key: Some(key.into()),
            position: Some(position),
            duration: Some(duration_ms),
            ..Self::bare(ActionKind::Tap, timestamp)
        }
    }

    /// Create a closed long-press action
    pub fn long_press(
        key: impl Into<String>,
        position: Point,
        timestamp: f64,
        duration_ms: u64,
    ) -> Self {
        Self {
            key: Some(key.into()),
            position: Some(position),
            duration: Some(duration_ms),
            ..Self::bare(ActionKind::LongPress, timestamp)
        }
    }

    /// Create an open long-press marker
    pub fn long_press_start(key: impl Into<String>, position: Point, timestamp: f64) -> Self {
        Self {
            key: Some(key.into()),
            position: Some(position),
            ..Self::bare(ActionKind::LongPressStart, timestamp)
        }
    }

    /// Create a swipe action
    pub fn swipe(start: Point, end: Point, timestamp: f64, duration_ms: u64) -> Self {
        Self {
            start_position: Some(start),
            end_position: Some(end),
            duration: Some(duration_ms),
            ..Self::bare(ActionKind::Swipe, timestamp)
        }
    }

    /// Create a view-control gesture
    pub fn view_control(
        direction: ViewDirection,
        mode: ViewMode,
        start: Point,
        end: Point,
        timestamp: f64,
        duration_ms: u64,
    ) -> Self {
        Self {
            start_position: Some(start),
            end_position: Some(end),
            duration: Some(duration_ms),
            direction: Some(direction),
            mode: Some(mode),
            ..Self::bare(ActionKind::ViewControl, timestamp)
        }
    }

    /// Builder: tag the stream this action belongs to
    pub fn with_source(mut self, source: ActionSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Builder: set the logical key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Duration in milliseconds, zero when absent
    pub fn duration_ms(&self) -> u64 {
        self.duration.unwrap_or(0)
    }

    /// Held/slide time in seconds
    pub fn duration_secs(&self) -> f64 {
        self.duration_ms() as f64 / 1000.0
    }

    /// Timestamp at which the action's held time ends
    pub fn end_timestamp(&self) -> f64 {
        self.timestamp + self.duration_secs()
    }

    /// Whether this action is a piece of a split long-press
    pub fn is_split(&self) -> bool {
        self.split_part.is_some()
    }

    /// Whether the key matches
    pub fn has_key(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }
}
