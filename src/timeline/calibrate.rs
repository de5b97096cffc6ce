//! Calibration: moving a timeline into another timeline's time frame
//!
//! Two streams recorded separately have unrelated zero points. Before they
//! can be merged, the secondary stream is shifted by a single offset so its
//! timestamps are relative to the primary stream's anchor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Timeline;
use crate::events::{EngineEvent, EventBus, EventLevel, EventReason};

/// How the calibration offset is determined
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CalibrationMode {
    /// Place the target's first action `at_secs` after the reference anchor
    FirstActionAt { at_secs: f64 },
    /// Target capture began at `started_at` on the shared wall clock
    CaptureStart { started_at: DateTime<Utc> },
    /// Explicit offset in seconds
    Fixed { offset_secs: f64 },
}

impl Default for CalibrationMode {
    fn default() -> Self {
        CalibrationMode::FirstActionAt {
            at_secs: crate::config::DEFAULT_START_CALIBRATION_SECS,
        }
    }
}

/// Applies a [`CalibrationMode`] to timelines
#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    mode: CalibrationMode,
    events: EventBus,
}

impl Calibrator {
    pub fn new(mode: CalibrationMode) -> Self {
        Self {
            mode,
            events: EventBus::new(),
        }
    }

    /// Builder: report clamped timestamps on this bus
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn mode(&self) -> CalibrationMode {
        self.mode
    }

    /// Offset in seconds that would be added to every target timestamp
    ///
    /// `None` when the mode needs a first action and the target has none.
    pub fn offset(&self, target: &Timeline, reference: &Timeline) -> Option<f64> {
        match self.mode {
            CalibrationMode::FirstActionAt { at_secs } => {
                target.first_timestamp().map(|first| at_secs - first)
            }
            CalibrationMode::CaptureStart { started_at } => {
                let delta = started_at - reference.anchor_time;
                let micros = delta
                    .num_microseconds()
                    .unwrap_or_else(|| delta.num_milliseconds().saturating_mul(1000));
                Some(micros as f64 / 1_000_000.0)
            }
            CalibrationMode::Fixed { offset_secs } => Some(offset_secs),
        }
    }

    /// Shift `target` into `reference`'s time frame
    pub fn calibrate(&self, target: &Timeline, reference: &Timeline) -> Timeline {
        self.calibrate_with_offset(target, reference).0
    }

    /// Like [`calibrate`](Self::calibrate), also returning the offset applied
    pub fn calibrate_with_offset(
        &self,
        target: &Timeline,
        reference: &Timeline,
    ) -> (Timeline, Option<f64>) {
        if target.is_empty() {
            return (target.clone(), None);
        }
        let Some(offset) = self.offset(target, reference) else {
            return (target.clone(), None);
        };

        let mut calibrated = target.clone();
        calibrated.anchor_time = reference.anchor_time;
        if reference.device_ref.is_some() {
            calibrated.device_ref = reference.device_ref.clone();
        }

        let mut clamped = 0usize;
        for (index, action) in calibrated.actions.iter_mut().enumerate() {
            let shifted = action.timestamp + offset;
            if shifted < 0.0 {
                clamped += 1;
                self.events.emit(EngineEvent::action(
                    EventLevel::Warning,
                    index,
                    action.kind,
                    EventReason::TimestampClamped { original: shifted },
                ));
                action.timestamp = 0.0;
            } else {
                action.timestamp = shifted;
            }
        }

        tracing::debug!(
            mode = ?self.mode,
            offset,
            actions = calibrated.len(),
            clamped,
            "Timeline calibrated"
        );
        (calibrated, Some(offset))
    }
}
