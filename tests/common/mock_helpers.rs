//! Mock construction helpers

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use tapline_rs::{ActuatorSink, EngineEvent, EventBus, Point, Result, TaplineError};

/// One call observed by a [`RecordingActuator`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Tap(Point),
    Hold(Point, u64),
    Slide(Point, Point, u64),
}

/// Actuator that records every call with the instant it started
#[derive(Debug, Default)]
pub struct RecordingActuator {
    calls: Mutex<Vec<(Instant, Call)>>,
    /// Calls at this position fail
    fail_at: Option<Point>,
    /// Simulated device latency
    latency: Duration,
}

impl RecordingActuator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_at(position: Point) -> Arc<Self> {
        Arc::new(Self {
            fail_at: Some(position),
            ..Self::default()
        })
    }

    pub fn with_latency(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            ..Self::default()
        })
    }

    fn record(&self, position: Point, call: Call) -> Result<()> {
        let started = Instant::now();
        self.calls.lock().unwrap().push((started, call));
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
        if self.fail_at == Some(position) {
            return Err(TaplineError::Actuator(format!("no response at {}", position)));
        }
        Ok(())
    }

    /// Calls in the order they started
    pub fn calls(&self) -> Vec<Call> {
        self.timed_calls().into_iter().map(|(_, call)| call).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort_by_key(|(at, _)| *at);
        calls
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ActuatorSink for RecordingActuator {
    fn tap(&self, position: Point) -> Result<()> {
        self.record(position, Call::Tap(position))
    }

    fn hold_for(&self, position: Point, duration_ms: u64) -> Result<()> {
        self.record(position, Call::Hold(position, duration_ms))
    }

    fn slide(&self, start: Point, end: Point, duration_ms: u64) -> Result<()> {
        self.record(start, Call::Slide(start, end, duration_ms))
    }
}

/// Event bus paired with its receiver
pub fn event_channel() -> (EventBus, Receiver<EngineEvent>) {
    EventBus::channel()
}
