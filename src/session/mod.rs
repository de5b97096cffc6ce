//! Session recording and replay module
//!
//! A recording session captures input as a [`Timeline`](crate::timeline::Timeline);
//! a replay session drives an actuator from one.
//!
//! # Features
//!
//! - Record taps, long-presses, swipes and view gestures with relative timestamps
//! - Close long-presses in place when the key is released
//! - Share one recorder between input callbacks on several threads
//! - Replay with one absolute-deadline task per action
//! - Cancel a running replay without waiting for pending deadlines

pub mod player;
pub mod recorder;
pub mod types;

pub use player::{ReplayCanceller, ReplayHandle, ReplayOutcome, ReplayReport, Replayer};
pub use recorder::{RecorderSession, SharedRecorder};
pub use types::{RecorderState, ReplayState};
