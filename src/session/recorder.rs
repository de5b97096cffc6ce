//! Recorder for capturing input actions

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::RecorderSettings;
use crate::events::{EngineEvent, EventBus, EventLevel, EventReason};
use crate::timeline::{Timeline, TimelineStats};
use crate::types::{Action, ActionKind, Point, ViewDirection, ViewMode};

use super::types::RecorderState;

/// Recorder for one capture session
///
/// Owns the action log while recording. Every `record_*` call is a silent
/// no-op unless the session is [`RecorderState::Recording`], so input
/// callbacks racing with [`stop_recording`](Self::stop_recording) are safe.
#[derive(Debug)]
pub struct RecorderSession {
    /// Current recording state
    state: RecorderState,
    /// Monotonic instant matching `timeline.anchor_time`
    started: Option<Instant>,
    /// Action log
    timeline: Timeline,
    settings: RecorderSettings,
    view_mode: ViewMode,
    events: EventBus,
}

impl Default for RecorderSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSession {
    /// Create a new recorder with default settings
    pub fn new() -> Self {
        Self::with_settings(RecorderSettings::default())
    }

    /// Create with specific settings
    pub fn with_settings(settings: RecorderSettings) -> Self {
        Self {
            state: RecorderState::Idle,
            started: None,
            timeline: Timeline::new(),
            settings,
            view_mode: ViewMode::default(),
            events: EventBus::new(),
        }
    }

    /// Builder: report warnings on this bus
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Get current state
    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// Check if recording
    pub fn is_recording(&self) -> bool {
        self.state.is_recording()
    }

    pub fn settings(&self) -> &RecorderSettings {
        &self.settings
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Time since the session anchor
    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    fn now_relative(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Start recording
    ///
    /// With `clear_existing` the log is emptied and the anchor reset to now.
    /// Otherwise recording continues on the existing log and anchor, so new
    /// timestamps follow the earlier ones.
    pub fn start_recording(&mut self, clear_existing: bool) {
        if clear_existing || self.started.is_none() {
            let device = self.timeline.device_ref.take();
            let keep = if clear_existing {
                Vec::new()
            } else {
                std::mem::take(&mut self.timeline.actions)
            };
            self.timeline = Timeline::new();
            self.timeline.device_ref = device;
            self.timeline.actions = keep;
            self.started = Some(Instant::now());
            tracing::info!("Recording started");
        } else {
            tracing::info!(
                existing = self.timeline.len(),
                "Recording continued"
            );
        }
        self.state = RecorderState::Recording;
    }

    /// Stop recording
    ///
    /// Presses still held stay in the log as `long_press_start` entries.
    pub fn stop_recording(&mut self) {
        if self.state == RecorderState::Recording {
            self.state = RecorderState::Stopped;
            tracing::info!(actions = self.timeline.len(), "Recording stopped");
        }
    }

    fn push(&mut self, action: Action) {
        tracing::debug!(
            kind = %action.kind,
            key = action.key.as_deref().unwrap_or("-"),
            timestamp = action.timestamp,
            "Recorded action"
        );
        self.timeline.actions.push(action);
    }

    /// Record a tap, defaulting duration and timestamp
    pub fn record_tap(
        &mut self,
        key: &str,
        position: Point,
        duration_ms: Option<u64>,
        timestamp: Option<f64>,
    ) {
        if !self.is_recording() {
            return;
        }
        let timestamp = timestamp.unwrap_or_else(|| self.now_relative());
        let duration = duration_ms.unwrap_or(self.settings.tap_duration_ms);
        self.push(Action::tap(key, position, timestamp, duration));
    }

    /// Open a long-press at the current instant
    pub fn record_long_press_start(&mut self, key: &str, position: Point) {
        let now = self.now_relative();
        self.record_long_press_start_at(key, position, now);
    }

    /// Open a long-press at an explicit timestamp
    pub fn record_long_press_start_at(&mut self, key: &str, position: Point, timestamp: f64) {
        if !self.is_recording() {
            return;
        }
        self.push(Action::long_press_start(key, position, timestamp));
    }

    /// Close the most recent open long-press for `key` at the current instant
    pub fn record_long_press_end(&mut self, key: &str, position: Point) {
        let now = self.now_relative();
        self.record_long_press_end_at(key, position, now);
    }

    /// Close the most recent open long-press for `key` at `timestamp`
    ///
    /// The open entry is turned into a `long_press` in place. Its duration is
    /// floored at [`RecorderSettings::min_long_press_ms`].
    pub fn record_long_press_end_at(&mut self, key: &str, position: Point, timestamp: f64) {
        if !self.is_recording() {
            return;
        }

        let min_ms = self.settings.min_long_press_ms;
        let open = self
            .timeline
            .actions
            .iter_mut()
            .rev()
            .find(|a| a.kind == ActionKind::LongPressStart && a.has_key(key));

        let Some(start) = open else {
            self.events.emit(EngineEvent::session(
                EventLevel::Warning,
                EventReason::UnmatchedLongPressEnd {
                    key: key.to_string(),
                },
            ));
            return;
        };

        let held_ms = ((timestamp - start.timestamp) * 1000.0).max(0.0) as u64;
        start.kind = ActionKind::LongPress;
        start.duration = Some(held_ms.max(min_ms));
        start.position.get_or_insert(position);

        tracing::debug!(
            key,
            duration_ms = start.duration_ms(),
            "Long-press closed"
        );
    }

    /// Record a swipe at the current instant
    pub fn record_swipe(&mut self, start: Point, end: Point, duration_ms: Option<u64>) {
        if !self.is_recording() {
            return;
        }
        let timestamp = self.now_relative();
        let duration = duration_ms.unwrap_or(self.settings.swipe_duration_ms);
        self.push(Action::swipe(start, end, timestamp, duration));
    }

    /// Record a view gesture from the configured centre
    ///
    /// Distance and slide time depend on the current [`ViewMode`].
    pub fn record_view_control(&mut self, direction: ViewDirection, timestamp: Option<f64>) {
        if !self.is_recording() {
            return;
        }
        let timestamp = timestamp.unwrap_or_else(|| self.now_relative());
        let (distance, duration) = self.settings.view_gesture(self.view_mode);
        let (dx, dy) = direction.unit();
        let start = self.settings.view_center;
        let end = start.offset(dx * distance, dy * distance);
        self.push(Action::view_control(
            direction,
            self.view_mode,
            start,
            end,
            timestamp,
            duration,
        ));
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            tracing::info!(?mode, "View mode changed");
        }
        self.view_mode = mode;
    }

    /// Set the device reference stored with the timeline
    pub fn set_device(&mut self, device: impl Into<String>) {
        self.timeline.device_ref = Some(device.into());
    }

    /// Discard every action and return to idle
    pub fn clear(&mut self) {
        self.timeline.actions.clear();
        self.started = None;
        self.state = RecorderState::Idle;
    }

    /// Copy of the current log, sorted by timestamp
    pub fn snapshot(&self) -> Timeline {
        let mut copy = self.timeline.clone();
        copy.sort_by_timestamp();
        copy
    }

    /// Take the recording (consumes it)
    pub fn take_timeline(&mut self) -> Timeline {
        let device = self.timeline.device_ref.clone();
        let mut taken = std::mem::take(&mut self.timeline);
        taken.sort_by_timestamp();
        self.timeline.device_ref = device;
        self.started = None;
        self.state = RecorderState::Idle;
        taken
    }

    /// Number of recorded actions
    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn stats(&self) -> TimelineStats {
        self.timeline.stats()
    }

    /// Most recent action, optionally for one key
    pub fn last_action(&self, key: Option<&str>) -> Option<&Action> {
        self.timeline.last_action(key)
    }
}

/// Cloneable handle for recording from input callbacks on other threads
#[derive(Debug, Clone, Default)]
pub struct SharedRecorder {
    inner: Arc<Mutex<RecorderSession>>,
}

impl SharedRecorder {
    pub fn new(session: RecorderSession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecorderSession> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the session
    pub fn with<R>(&self, f: impl FnOnce(&mut RecorderSession) -> R) -> R {
        f(&mut self.lock())
    }

    /// Copy the log under a brief lock
    pub fn snapshot(&self) -> Timeline {
        self.lock().snapshot()
    }

    pub fn is_recording(&self) -> bool {
        self.lock().is_recording()
    }
}
