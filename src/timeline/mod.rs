//! Timelines: ordered, time-anchored sequences of actions
//!
//! A [`Timeline`] is the value that flows through the pipeline. The recorder
//! builds one, and the calibrator and merger each return a new one. The
//! replayer only reads it.
//!
//! # Submodules
//!
//! - [`file`] - Persisted JSON format
//! - [`calibrate`] - Shifting a timeline into another timeline's time frame
//! - [`merge`] - Combining two timelines with long-press splitting

pub mod calibrate;
pub mod file;
pub mod merge;

pub use calibrate::{CalibrationMode, Calibrator};
pub use file::TimelineFile;
pub use merge::Merger;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Result, TaplineError};
use crate::types::{Action, ActionKind, ActionSource};

/// Bookkeeping attached to a timeline produced by a merge
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeInfo {
    pub primary_actions_count: usize,
    pub secondary_actions_count: usize,
    /// File the secondary stream was loaded from, if known
    pub secondary_file: Option<String>,
}

/// An ordered sequence of actions plus session metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    /// Wall-clock instant that `timestamp = 0` refers to
    pub anchor_time: DateTime<Utc>,
    /// Actuator/device this timeline was captured against
    pub device_ref: Option<String>,
    /// Session-level source tag
    pub source: Option<ActionSource>,
    pub actions: Vec<Action>,
    pub merge_info: Option<MergeInfo>,
    /// Unrecognized file-level keys, written back on save
    pub extra: Map<String, Value>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Empty timeline anchored at the current instant
    pub fn new() -> Self {
        Self::with_anchor(Utc::now())
    }

    /// Empty timeline anchored at `anchor_time`
    pub fn with_anchor(anchor_time: DateTime<Utc>) -> Self {
        Self {
            anchor_time,
            device_ref: None,
            source: None,
            actions: Vec::new(),
            merge_info: None,
            extra: Map::new(),
        }
    }

    /// Build a timeline from actions, sorting them by timestamp
    pub fn from_actions(anchor_time: DateTime<Utc>, actions: Vec<Action>) -> Self {
        let mut timeline = Self::with_anchor(anchor_time);
        timeline.actions = actions;
        timeline.sort_by_timestamp();
        timeline
    }

    /// Builder: set the device reference
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device_ref = Some(device.into());
        self
    }

    /// Builder: set the session source tag
    pub fn with_source(mut self, source: ActionSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Earliest action timestamp
    pub fn first_timestamp(&self) -> Option<f64> {
        self.actions.iter().map(|a| a.timestamp).reduce(f64::min)
    }

    /// Latest action timestamp
    pub fn last_timestamp(&self) -> Option<f64> {
        self.actions.iter().map(|a| a.timestamp).reduce(f64::max)
    }

    /// Time until the last held/slide time ends, in seconds
    pub fn duration(&self) -> f64 {
        self.actions
            .iter()
            .map(Action::end_timestamp)
            .fold(0.0, f64::max)
    }

    /// Whether timestamps are non-decreasing
    pub fn is_sorted(&self) -> bool {
        self.actions
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    }

    /// Stable sort by timestamp; equal timestamps keep insertion order
    pub fn sort_by_timestamp(&mut self) {
        self.actions
            .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }

    /// Check every action can be scheduled
    pub fn validate(&self) -> Result<()> {
        for (index, action) in self.actions.iter().enumerate() {
            if !action.timestamp.is_finite() {
                return Err(TaplineError::InvalidTimeline {
                    index,
                    message: format!("non-finite timestamp {}", action.timestamp),
                });
            }
            if action.timestamp < 0.0 {
                return Err(TaplineError::InvalidTimeline {
                    index,
                    message: format!("negative timestamp {:.3}s", action.timestamp),
                });
            }
        }
        Ok(())
    }

    /// Most recent action, optionally restricted to a key
    pub fn last_action(&self, key: Option<&str>) -> Option<&Action> {
        match key {
            None => self.actions.last(),
            Some(key) => self.actions.iter().rev().find(|a| a.has_key(key)),
        }
    }

    /// Count actions by kind and key
    pub fn stats(&self) -> TimelineStats {
        let mut stats = TimelineStats {
            total_actions: self.actions.len(),
            total_duration: self.last_timestamp().unwrap_or(0.0),
            ..Default::default()
        };
        for action in &self.actions {
            *stats.action_types.entry(action.kind).or_insert(0) += 1;
            if let Some(key) = &action.key {
                *stats.key_usage.entry(key.clone()).or_insert(0) += 1;
            }
        }
        stats
    }
}

/// Summary counts for a timeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimelineStats {
    pub total_actions: usize,
    /// Timestamp of the latest action in seconds
    pub total_duration: f64,
    pub action_types: BTreeMap<ActionKind, usize>,
    pub key_usage: BTreeMap<String, usize>,
}
