//! Persisted timeline format
//!
//! Timelines are stored as pretty-printed JSON:
//!
//! ```json
//! {
//!   "device_id": "emulator-5554",
//!   "total_duration": 3.0,
//!   "total_actions": 2,
//!   "created_time": "2025-01-01T12:00:00+00:00",
//!   "actions": [
//!     { "type": "tap", "key": "w", "position": [100, 100], "timestamp": 0.0, "duration": 50 }
//!   ]
//! }
//! ```
//!
//! `total_duration`, `total_actions` and `created_time` are derived when
//! saving. Keys this crate does not know, at file or action level, are kept
//! and written back unchanged.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use super::{MergeInfo, Timeline};
use crate::error::{Result, ResultExt, TaplineError};
use crate::types::{Action, ActionSource};

/// On-disk representation of a [`Timeline`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineFile {
    #[serde(default)]
    pub device_id: String,

    #[serde(default)]
    pub total_duration: f64,

    #[serde(default)]
    pub total_actions: usize,

    /// ISO-8601; older files use a naive local timestamp
    #[serde(default)]
    pub created_time: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ActionSource>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub auto_merged: bool,

    #[serde(
        default,
        alias = "adb_actions_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_actions_count: Option<usize>,

    #[serde(
        default,
        alias = "pc_actions_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub secondary_actions_count: Option<usize>,

    #[serde(
        default,
        alias = "pc_replay_file",
        skip_serializing_if = "Option::is_none"
    )]
    pub secondary_file: Option<String>,

    pub actions: Vec<Action>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Best-effort parse of `created_time`, used when no anchor was stored
fn parse_created_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

impl From<&Timeline> for TimelineFile {
    fn from(timeline: &Timeline) -> Self {
        let merge = timeline.merge_info.as_ref();
        Self {
            device_id: timeline.device_ref.clone().unwrap_or_default(),
            total_duration: timeline.duration(),
            total_actions: timeline.len(),
            created_time: Utc::now().to_rfc3339(),
            anchor_time: Some(timeline.anchor_time),
            source: timeline.source,
            auto_merged: merge.is_some(),
            primary_actions_count: merge.map(|m| m.primary_actions_count),
            secondary_actions_count: merge.map(|m| m.secondary_actions_count),
            secondary_file: merge.and_then(|m| m.secondary_file.clone()),
            actions: timeline.actions.clone(),
            extra: timeline.extra.clone(),
        }
    }
}

impl From<TimelineFile> for Timeline {
    fn from(file: TimelineFile) -> Self {
        let anchor_time = file
            .anchor_time
            .or_else(|| parse_created_time(&file.created_time))
            .unwrap_or_default();

        let merge_info = (file.auto_merged
            || file.primary_actions_count.is_some()
            || file.secondary_actions_count.is_some())
        .then(|| MergeInfo {
            primary_actions_count: file.primary_actions_count.unwrap_or(0),
            secondary_actions_count: file.secondary_actions_count.unwrap_or(0),
            secondary_file: file.secondary_file,
        });

        Timeline {
            anchor_time,
            device_ref: Some(file.device_id).filter(|d| !d.is_empty()),
            source: file.source,
            actions: file.actions,
            merge_info,
            extra: file.extra,
        }
    }
}

impl Timeline {
    /// Serialize to the persisted JSON format
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&TimelineFile::from(self))?)
    }

    /// Parse the persisted JSON format
    ///
    /// Fails on malformed JSON or a missing `actions` array; no partial
    /// timeline is ever returned.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: TimelineFile = serde_json::from_str(json)?;
        Ok(file.into())
    }

    /// Save timeline to a file (JSON format)
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json_string()?;
        std::fs::write(path, json).with_context(|| format!("Writing {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            actions = self.len(),
            "Timeline saved"
        );
        Ok(())
    }

    /// Load timeline from a file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Reading {}", path.display()))?;
        let timeline = Self::from_json_str(&json)
            .map_err(|e| e.with_context(format!("Parsing {}", path.display())))?;
        tracing::info!(
            path = %path.display(),
            actions = timeline.len(),
            "Timeline loaded"
        );
        Ok(timeline)
    }
}

/// Whether an error came from a malformed file rather than IO
pub fn is_format_error(err: &TaplineError) -> bool {
    matches!(err.root(), TaplineError::Format(_))
}
