//! Merging a live capture with a pre-recorded stream
//!
//! The primary stream is authoritative. Any of its actions that lands inside
//! a secondary long-press releases that press: the press is cut at each such
//! timestamp and replayed as several shorter presses. Slices shorter than
//! [`MergeSettings::min_split_ms`] are dropped.

use super::{MergeInfo, Timeline};
use crate::config::MergeSettings;
use crate::events::{EngineEvent, EventBus, EventLevel, EventReason};
use crate::types::{Action, ActionKind, ActionSource};

/// Tolerance used when converting slice lengths to whole milliseconds
const MS_EPSILON: f64 = 1e-6;

/// Combines a primary and a secondary timeline
#[derive(Debug, Clone, Default)]
pub struct Merger {
    settings: MergeSettings,
    events: EventBus,
}

impl Merger {
    pub fn new(settings: MergeSettings) -> Self {
        Self {
            settings,
            events: EventBus::new(),
        }
    }

    /// Builder: report splits on this bus
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn settings(&self) -> &MergeSettings {
        &self.settings
    }

    /// Merge two timelines, splitting secondary long-presses at primary input
    ///
    /// Both inputs must already share a time frame (see
    /// [`Calibrator`](super::Calibrator)). The result is anchored and
    /// device-tagged like `primary`.
    pub fn merge_and_split(&self, primary: &Timeline, secondary: &Timeline) -> Timeline {
        let primary_actions: Vec<Action> = primary
            .actions
            .iter()
            .cloned()
            .map(|a| a.with_source(ActionSource::Primary))
            .collect();

        let mut interrupts: Vec<f64> = primary_actions.iter().map(|a| a.timestamp).collect();
        interrupts.sort_by(f64::total_cmp);

        let mut passthrough = Vec::new();
        let mut presses = Vec::new();
        let mut split_count = 0usize;

        for (index, action) in secondary.actions.iter().enumerate() {
            let action = action.clone().with_source(ActionSource::Secondary);
            if action.kind != ActionKind::LongPress {
                passthrough.push(action);
                continue;
            }

            let cuts = cuts_within(&action, &interrupts);
            if cuts.is_empty() {
                presses.push(action);
                continue;
            }

            let pieces = self.split_long_press(&action, &cuts);
            split_count += 1;
            self.events.emit(EngineEvent::action(
                EventLevel::Info,
                index,
                ActionKind::LongPress,
                EventReason::LongPressSplit {
                    cuts: cuts.len(),
                    retained: pieces.len(),
                },
            ));
            presses.extend(pieces);
        }

        let mut merged = Timeline::with_anchor(primary.anchor_time);
        merged.device_ref = primary.device_ref.clone();
        merged.source = primary.source;
        merged.extra = primary.extra.clone();
        merged.merge_info = Some(MergeInfo {
            primary_actions_count: primary.len(),
            secondary_actions_count: secondary.len(),
            secondary_file: None,
        });

        merged.actions = passthrough;
        merged.actions.extend(presses);
        merged.actions.extend(primary_actions);
        merged.sort_by_timestamp();

        tracing::info!(
            primary = primary.len(),
            secondary = secondary.len(),
            merged = merged.len(),
            split_count,
            "Timelines merged"
        );
        merged
    }

    /// Cut a long-press at the given timestamps
    ///
    /// `cuts` must be ascending and lie strictly inside the press window.
    /// Returned pieces carry their 1-based slice index in `split_part`, so a
    /// dropped slice leaves a gap in the numbering.
    pub fn split_long_press(&self, press: &Action, cuts: &[f64]) -> Vec<Action> {
        let original = press.duration_ms();
        let start = press.timestamp;
        let end = press.end_timestamp();

        let mut bounds = Vec::with_capacity(cuts.len() + 2);
        bounds.push(start);
        bounds.extend_from_slice(cuts);
        bounds.push(end);

        let mut pieces = Vec::with_capacity(bounds.len() - 1);
        let mut used = 0u64;

        for (slot, window) in bounds.windows(2).enumerate() {
            let exact = (window[1] - window[0]) * 1000.0;
            let ms = ((exact + MS_EPSILON).floor().max(0.0) as u64).min(original - used);
            // a slice of exactly min_split_ms is kept, unlike a strict `> min` cutoff
            if ms == 0 || ms < self.settings.min_split_ms {
                tracing::trace!(slot = slot + 1, ms, "Dropping short split slice");
                continue;
            }
            used += ms;

            let mut piece = press.clone();
            piece.timestamp = window[0];
            piece.duration = Some(ms);
            piece.split_part = Some(slot as u32 + 1);
            piece.original_duration = Some(original);
            pieces.push(piece);
        }
        pieces
    }
}

/// Interrupt timestamps strictly inside the press window, deduplicated
fn cuts_within(press: &Action, interrupts: &[f64]) -> Vec<f64> {
    let start = press.timestamp;
    let end = press.end_timestamp();
    let mut cuts: Vec<f64> = interrupts
        .iter()
        .copied()
        .filter(|&t| t > start && t < end)
        .collect();
    cuts.dedup();
    cuts
}
