//! Session state machines

use std::fmt;

/// State of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderState {
    /// No session started, or the timeline was taken
    #[default]
    Idle,
    /// Record calls append to the timeline
    Recording,
    /// Recording ended, timeline available
    Stopped,
}

impl RecorderState {
    /// Check if currently recording
    pub fn is_recording(&self) -> bool {
        matches!(self, RecorderState::Recording)
    }

    /// Check if has recorded data
    pub fn has_recording(&self) -> bool {
        !matches!(self, RecorderState::Idle)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            RecorderState::Idle => "Idle",
            RecorderState::Recording => "Recording",
            RecorderState::Stopped => "Stopped",
        }
    }
}

/// State of a replay session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayState {
    #[default]
    Idle,
    /// Validating the timeline and spawning per-action tasks
    Scheduling,
    /// Tasks are waiting on their deadlines
    Running,
    /// Every task finished without cancellation
    Completed,
    /// Cancellation was requested before every task finished
    Cancelled,
}

impl ReplayState {
    /// Check if a session is scheduling or running
    pub fn is_active(&self) -> bool {
        matches!(self, ReplayState::Scheduling | ReplayState::Running)
    }

    /// Check if the last session reached a final state
    pub fn is_finished(&self) -> bool {
        matches!(self, ReplayState::Completed | ReplayState::Cancelled)
    }

    /// Display name for the state
    pub fn display_name(&self) -> &'static str {
        match self {
            ReplayState::Idle => "Idle",
            ReplayState::Scheduling => "Scheduling",
            ReplayState::Running => "Running",
            ReplayState::Completed => "Completed",
            ReplayState::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl fmt::Display for ReplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
