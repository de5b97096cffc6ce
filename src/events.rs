//! Structured engine events
//!
//! Every noteworthy thing the recorder, calibrator, merger and replayer do is
//! described by an [`EngineEvent`]: a level, the index of the action it
//! concerns (if any) and a typed [`EventReason`]. An [`EventBus`] mirrors each
//! event to `tracing` and, when a channel is attached, forwards it so that
//! callers and tests can inspect what happened without parsing log text.

use crate::types::ActionKind;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;

/// Severity of an engine event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventLevel {
    Debug,
    Info,
    Warning,
    Error,
}

/// What happened
#[derive(Debug, Clone, PartialEq)]
pub enum EventReason {
    /// Long-press end with no matching open start
    UnmatchedLongPressEnd { key: String },
    /// Calibrated timestamp was negative and clamped to zero
    TimestampClamped { original: f64 },
    /// A secondary long-press was cut by primary input
    LongPressSplit { cuts: usize, retained: usize },
    /// Replay session began scheduling
    ReplayStarted { actions: usize },
    /// Actuator call completed; `lateness_ms` is start time minus deadline
    ActionExecuted { lateness_ms: f64 },
    /// Suppression predicate vetoed the action
    ActionSuppressed,
    /// Task observed cancellation before calling the actuator
    ActionCancelled,
    /// Action cannot be mapped to an actuator call
    ActionUnplayable { detail: String },
    ActuatorFailed { error: String },
    PredicateFailed { error: String },
    PredicateTimedOut { timeout_ms: u64 },
    /// Replay session finished
    ReplayFinished { cancelled: bool },
}

impl fmt::Display for EventReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventReason::UnmatchedLongPressEnd { key } => {
                write!(f, "no open long-press start for key '{}'", key)
            }
            EventReason::TimestampClamped { original } => {
                write!(f, "calibrated timestamp {:.3}s clamped to 0", original)
            }
            EventReason::LongPressSplit { cuts, retained } => {
                write!(f, "long-press split by {} cuts, {} pieces kept", cuts, retained)
            }
            EventReason::ReplayStarted { actions } => {
                write!(f, "replay scheduled {} actions", actions)
            }
            EventReason::ActionExecuted { lateness_ms } => {
                write!(f, "executed {:.1}ms after deadline", lateness_ms)
            }
            EventReason::ActionSuppressed => f.write_str("suppressed by predicate"),
            EventReason::ActionCancelled => f.write_str("cancelled before execution"),
            EventReason::ActionUnplayable { detail } => write!(f, "unplayable: {}", detail),
            EventReason::ActuatorFailed { error } => write!(f, "actuator failed: {}", error),
            EventReason::PredicateFailed { error } => {
                write!(f, "predicate failed, not suppressing: {}", error)
            }
            EventReason::PredicateTimedOut { timeout_ms } => {
                write!(f, "predicate exceeded {}ms, not suppressing", timeout_ms)
            }
            EventReason::ReplayFinished { cancelled } => {
                if *cancelled {
                    f.write_str("replay cancelled")
                } else {
                    f.write_str("replay completed")
                }
            }
        }
    }
}

/// A single structured event
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub level: EventLevel,
    /// Index of the action within the timeline being processed
    pub action_index: Option<usize>,
    pub kind: Option<ActionKind>,
    pub reason: EventReason,
}

impl EngineEvent {
    /// Event not tied to a particular action
    pub fn session(level: EventLevel, reason: EventReason) -> Self {
        Self {
            level,
            action_index: None,
            kind: None,
            reason,
        }
    }

    /// Event about the action at `index`
    pub fn action(level: EventLevel, index: usize, kind: ActionKind, reason: EventReason) -> Self {
        Self {
            level,
            action_index: Some(index),
            kind: Some(kind),
            reason,
        }
    }
}

/// Fan-out point for engine events
///
/// Cloning is cheap; every clone forwards to the same channel. A bus without
/// a channel still logs through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    sender: Option<Sender<EngineEvent>>,
}

impl EventBus {
    /// Bus that only logs
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus forwarding into an existing sender
    ///
    /// Bounded senders apply no backpressure: events that do not fit are
    /// logged and dropped.
    pub fn with_sender(sender: Sender<EngineEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Bus paired with a fresh unbounded receiver
    pub fn channel() -> (Self, Receiver<EngineEvent>) {
        let (tx, rx) = unbounded();
        (Self::with_sender(tx), rx)
    }

    /// Log and forward an event
    pub fn emit(&self, event: EngineEvent) {
        log_event(&event);
        if let Some(sender) = &self.sender {
            let _ = sender.try_send(event);
        }
    }
}

fn log_event(event: &EngineEvent) {
    let kind = event.kind.map(|k| k.as_str()).unwrap_or("-");
    match event.level {
        EventLevel::Debug => {
            tracing::debug!(action = ?event.action_index, kind, "{}", event.reason)
        }
        EventLevel::Info => {
            tracing::info!(action = ?event.action_index, kind, "{}", event.reason)
        }
        EventLevel::Warning => {
            tracing::warn!(action = ?event.action_index, kind, "{}", event.reason)
        }
        EventLevel::Error => {
            tracing::error!(action = ?event.action_index, kind, "{}", event.reason)
        }
    }
}

/// Drain every event currently queued on a receiver
pub fn drain(receiver: &Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}
