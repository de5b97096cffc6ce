//! # Tapline-RS: input recording, merging and replay
//!
//! Captures timestamped input actions (taps, long-presses, swipes,
//! directional view gestures), merges a live capture with a pre-recorded
//! stream, and replays the result against an external actuator with
//! drift-free per-action scheduling.
//!
//! ## Architecture
//!
//! ```text
//! RecorderSession ──► Timeline ──► Calibrator ──► Merger ──► Replayer ──► ActuatorSink
//! ```
//!
//! - **Recording**: [`session::RecorderSession`] owns the action log while armed
//! - **Calibration**: [`timeline::Calibrator`] moves a stream into another's time frame
//! - **Merging**: [`timeline::Merger`] combines streams, splitting interrupted long-presses
//! - **Replay**: [`session::Replayer`] runs one absolute-deadline task per action
//! - **Events**: [`events::EventBus`] mirrors structured events to `tracing` and a channel
//!
//! ## Configuration
//!
//! [`config::EngineConfig`] is stored as TOML in the platform config directory
//! under `dev.tapline.tapline-rs`.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tapline_rs::{
//!     actuator::NullActuator,
//!     config::EngineConfig,
//!     events::EventBus,
//!     pipeline,
//!     session::{ReplayCanceller, Replayer},
//!     timeline::Timeline,
//! };
//!
//! #[tokio::main]
//! async fn main() -> tapline_rs::Result<()> {
//!     let config = EngineConfig::load_or_default();
//!     let live = Timeline::load_from_file("live.json")?;
//!     let recorded = Timeline::load_from_file("recorded.json")?;
//!
//!     let merged = pipeline::prepare_merged(
//!         &live,
//!         &recorded,
//!         config.calibration.first_action_mode(),
//!         &config,
//!         &EventBus::new(),
//!     );
//!
//!     let replayer = Replayer::new(Arc::new(NullActuator), config.replay.clone());
//!     let outcome = replayer.replay(&merged, &ReplayCanceller::new()).await?;
//!     println!("{:?}", outcome.report());
//!     Ok(())
//! }
//! ```

pub mod actuator;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod pipeline;
pub mod session;
pub mod timeline;
pub mod types;

// Re-export commonly used types
pub use actuator::{ActuatorCommand, ActuatorSink, NullActuator, SuppressionPredicate};
pub use config::EngineConfig;
pub use error::{Result, ResultExt, TaplineError};
pub use events::{EngineEvent, EventBus, EventLevel, EventReason};
pub use session::{
    RecorderSession, RecorderState, ReplayCanceller, ReplayHandle, ReplayOutcome, ReplayReport,
    ReplayState, Replayer, SharedRecorder,
};
pub use timeline::{CalibrationMode, Calibrator, Merger, Timeline, TimelineStats};
pub use types::{Action, ActionKind, ActionSource, Point, ViewDirection, ViewMode};
