//! Actuator abstraction
//!
//! The replayer never talks to a device directly. Every resolved action is
//! turned into an [`ActuatorCommand`] and dispatched to an [`ActuatorSink`],
//! which owns the transport (ADB shell, HID injection, a test double...).
//!
//! A [`SuppressionPredicate`] may veto individual directional gestures just
//! before they run, based on state this crate cannot see.

use crate::config::{ReplaySettings, DEFAULT_TAP_DURATION_MS};
use crate::error::{Result, TaplineError};
use crate::types::{Action, ActionKind, Point};

/// Device-control collaborator driven by the replayer
///
/// Calls are blocking and are made from the replayer's blocking pool, so
/// implementations may perform IO directly. Several calls may be in flight
/// at once; an implementation that needs serialization must provide it.
#[cfg_attr(test, mockall::automock)]
pub trait ActuatorSink: Send + Sync {
    /// Short press at a position
    fn tap(&self, position: Point) -> Result<()>;

    /// Press and hold a position for `duration_ms`
    fn hold_for(&self, position: Point, duration_ms: u64) -> Result<()>;

    /// Slide from `start` to `end` over `duration_ms`
    fn slide(&self, start: Point, end: Point, duration_ms: u64) -> Result<()>;

    /// Capture the current screen as an encoded image
    fn screenshot(&self) -> Result<Vec<u8>> {
        Err(TaplineError::Unsupported("screenshot"))
    }
}

/// Out-of-band veto for directional gestures
pub trait SuppressionPredicate: Send + Sync {
    /// `Ok(true)` skips the action
    fn should_suppress(&self, action: &Action) -> Result<bool>;
}

impl<F> SuppressionPredicate for F
where
    F: Fn(&Action) -> Result<bool> + Send + Sync,
{
    fn should_suppress(&self, action: &Action) -> Result<bool> {
        self(action)
    }
}

/// Dry-run sink that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct NullActuator;

impl ActuatorSink for NullActuator {
    fn tap(&self, position: Point) -> Result<()> {
        tracing::info!(%position, "tap");
        Ok(())
    }

    fn hold_for(&self, position: Point, duration_ms: u64) -> Result<()> {
        tracing::info!(%position, duration_ms, "hold");
        Ok(())
    }

    fn slide(&self, start: Point, end: Point, duration_ms: u64) -> Result<()> {
        tracing::info!(%start, %end, duration_ms, "slide");
        Ok(())
    }
}

/// A single device call derived from an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    Tap(Point),
    Hold { position: Point, duration_ms: u64 },
    Slide { start: Point, end: Point, duration_ms: u64 },
}

impl ActuatorCommand {
    /// Map an action to the call that replays it
    ///
    /// Holds include the configured long-press compensation. The error
    /// describes why the action cannot be played.
    pub fn resolve(
        action: &Action,
        settings: &ReplaySettings,
    ) -> std::result::Result<Self, &'static str> {
        match action.kind {
            ActionKind::Tap => {
                let position = action.position.ok_or("tap without position")?;
                let duration = action.duration.unwrap_or(DEFAULT_TAP_DURATION_MS);
                if settings.tap_is_hold(action.key.as_deref(), duration) {
                    Ok(ActuatorCommand::Hold {
                        position,
                        duration_ms: duration + settings.long_press_compensation_ms,
                    })
                } else {
                    Ok(ActuatorCommand::Tap(position))
                }
            }
            ActionKind::LongPress => {
                let position = action.position.ok_or("long-press without position")?;
                let duration = action.duration.unwrap_or(settings.default_long_press_ms);
                Ok(ActuatorCommand::Hold {
                    position,
                    duration_ms: duration + settings.long_press_compensation_ms,
                })
            }
            ActionKind::Swipe | ActionKind::ViewControl => {
                let (Some(start), Some(end)) = (action.start_position, action.end_position) else {
                    return Err("slide without start/end position");
                };
                Ok(ActuatorCommand::Slide {
                    start,
                    end,
                    duration_ms: action.duration.unwrap_or(settings.default_slide_ms),
                })
            }
            ActionKind::LongPressStart => Err("long-press was never released"),
        }
    }

    /// Perform the call on a sink
    pub fn dispatch(&self, sink: &dyn ActuatorSink) -> Result<()> {
        match *self {
            ActuatorCommand::Tap(position) => sink.tap(position),
            ActuatorCommand::Hold {
                position,
                duration_ms,
            } => sink.hold_for(position, duration_ms),
            ActuatorCommand::Slide {
                start,
                end,
                duration_ms,
            } => sink.slide(start, end, duration_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ViewDirection, ViewMode};
    use mockall::predicate::eq;

    #[test]
    fn test_resolve_long_press_adds_compensation() {
        let settings = ReplaySettings::default();
        let action = Action::long_press("a", Point::new(50, 50), 1.0, 2000);
        assert_eq!(
            ActuatorCommand::resolve(&action, &settings),
            Ok(ActuatorCommand::Hold {
                position: Point::new(50, 50),
                duration_ms: 2150
            })
        );

        let mut no_duration = action.clone();
        no_duration.duration = None;
        assert_eq!(
            ActuatorCommand::resolve(&no_duration, &settings),
            Ok(ActuatorCommand::Hold {
                position: Point::new(50, 50),
                duration_ms: 650
            })
        );
    }

    #[test]
    fn test_resolve_hold_key_taps() {
        let settings = ReplaySettings::default();
        let long_a = Action::tap("a", Point::new(5, 5), 0.0, 400);
        let short_a = Action::tap("a", Point::new(5, 5), 0.0, 50);
        let long_w = Action::tap("w", Point::new(5, 5), 0.0, 400);

        assert_eq!(
            ActuatorCommand::resolve(&long_a, &settings),
            Ok(ActuatorCommand::Hold {
                position: Point::new(5, 5),
                duration_ms: 550
            })
        );
        assert_eq!(
            ActuatorCommand::resolve(&short_a, &settings),
            Ok(ActuatorCommand::Tap(Point::new(5, 5)))
        );
        assert_eq!(
            ActuatorCommand::resolve(&long_w, &settings),
            Ok(ActuatorCommand::Tap(Point::new(5, 5)))
        );
    }

    #[test]
    fn test_resolve_slides_and_unplayable() {
        let settings = ReplaySettings::default();
        let view = Action::view_control(
            ViewDirection::Left,
            ViewMode::Fast,
            Point::new(1280, 720),
            Point::new(980, 720),
            0.0,
            100,
        );
        assert_eq!(
            ActuatorCommand::resolve(&view, &settings),
            Ok(ActuatorCommand::Slide {
                start: Point::new(1280, 720),
                end: Point::new(980, 720),
                duration_ms: 100
            })
        );

        let open = Action::long_press_start("a", Point::new(1, 1), 0.0);
        assert!(ActuatorCommand::resolve(&open, &settings).is_err());

        let mut swipe = Action::swipe(Point::new(0, 0), Point::new(1, 1), 0.0, 300);
        swipe.end_position = None;
        assert!(ActuatorCommand::resolve(&swipe, &settings).is_err());
    }

    #[test]
    fn test_dispatch_calls_sink() {
        let mut sink = MockActuatorSink::new();
        sink.expect_slide()
            .with(eq(Point::new(0, 0)), eq(Point::new(100, 0)), eq(300))
            .times(1)
            .returning(|_, _, _| Ok(()));
        sink.expect_tap().never();

        let command = ActuatorCommand::Slide {
            start: Point::new(0, 0),
            end: Point::new(100, 0),
            duration_ms: 300,
        };
        command.dispatch(&sink).unwrap();
    }

    #[test]
    fn test_closure_predicate() {
        let predicate = |action: &Action| -> Result<bool> { Ok(action.kind.is_directional()) };
        let swipe = Action::swipe(Point::new(0, 0), Point::new(1, 1), 0.0, 300);
        assert!(!predicate.should_suppress(&swipe).unwrap());
        assert!(NullActuator.screenshot().is_err());
    }
}
