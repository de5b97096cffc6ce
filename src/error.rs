//! Error handling for tapline-rs
//!
//! Only structural failures surface as [`TaplineError`]: unreadable timeline
//! files, invalid timelines handed to the replayer, configuration problems.
//! Failures local to a single action (actuator call, suppression predicate)
//! are reported as events and never abort a replay session.

use thiserror::Error;

/// Main error type for tapline operations
#[derive(Error, Debug)]
pub enum TaplineError {
    /// Persisted timeline is malformed (bad JSON, missing fields)
    #[error("Timeline format error: {0}")]
    Format(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Replay was requested for a timeline without actions
    #[error("Timeline has no actions to replay")]
    EmptyTimeline,

    /// Timeline contains an action that cannot be scheduled
    #[error("Invalid timeline: action {index}: {message}")]
    InvalidTimeline { index: usize, message: String },

    /// A replay session is already running on this replayer
    #[error("A replay session is already in progress")]
    ReplayInProgress,

    /// The actuator rejected or failed a device call
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// The suppression predicate failed
    #[error("Suppression predicate error: {0}")]
    Predicate(String),

    /// Operation not supported by this collaborator
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Async runtime could not be started or a task panicked
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<TaplineError>,
    },
}

impl TaplineError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        TaplineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strip any context wrappers and return the innermost error
    pub fn root(&self) -> &TaplineError {
        match self {
            TaplineError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for TaplineError {
    fn from(err: serde_json::Error) -> Self {
        TaplineError::Format(err.to_string())
    }
}

/// Result type alias for tapline operations
pub type Result<T> = std::result::Result<T, TaplineError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| TaplineError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| TaplineError::Io(e).with_context(f()))
    }
}
