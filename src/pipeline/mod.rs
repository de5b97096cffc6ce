//! Timeline preparation pipeline
//!
//! Glues the stages together for callers that just want a replayable
//! timeline:
//!
//! ```text
//! secondary ──► [Calibrator] ──┐
//!                              ├──► [Merger] ──► merged timeline ──► Replayer
//! primary ─────────────────────┘
//! ```
//!
//! Every stage returns a new [`Timeline`]; inputs are never mutated.

use std::path::Path;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::events::EventBus;
use crate::timeline::{CalibrationMode, Calibrator, Merger, Timeline};

/// Calibrate `secondary` into `primary`'s frame and merge the two
pub fn prepare_merged(
    primary: &Timeline,
    secondary: &Timeline,
    mode: CalibrationMode,
    config: &EngineConfig,
    events: &EventBus,
) -> Timeline {
    let (calibrated, offset) = Calibrator::new(mode)
        .with_events(events.clone())
        .calibrate_with_offset(secondary, primary);
    tracing::debug!(?offset, "Secondary stream calibrated");

    Merger::new(config.merge.clone())
        .with_events(events.clone())
        .merge_and_split(primary, &calibrated)
}

/// Shift a single pre-recorded timeline so its first action lands at the
/// configured start offset
pub fn prepare_standalone(timeline: &Timeline, config: &EngineConfig, events: &EventBus) -> Timeline {
    let reference = Timeline::with_anchor(timeline.anchor_time);
    Calibrator::new(config.calibration.first_action_mode())
        .with_events(events.clone())
        .calibrate(timeline, &reference)
}

/// Load two timeline files and merge them
///
/// The secondary file name is recorded in the result's merge info.
pub fn merge_files(
    primary_path: impl AsRef<Path>,
    secondary_path: impl AsRef<Path>,
    mode: CalibrationMode,
    config: &EngineConfig,
    events: &EventBus,
) -> Result<Timeline> {
    let secondary_path = secondary_path.as_ref();
    let primary = Timeline::load_from_file(primary_path)?;
    let secondary = Timeline::load_from_file(secondary_path)?;

    let mut merged = prepare_merged(&primary, &secondary, mode, config, events);
    if let Some(info) = merged.merge_info.as_mut() {
        info.secondary_file = secondary_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
    }
    Ok(merged)
}
