//! Replayer for driving an actuator from a timeline
//!
//! Every action gets its own task that sleeps until an absolute deadline,
//! `replay_anchor + timestamp / speed`. Deadlines are computed from a single
//! anchor captured once per session, so scheduling error never accumulates
//! across actions.
//!
//! Cancellation is cooperative: a task re-checks the shared signal after
//! every wake-up and never starts an actuator call once it has observed
//! cancellation. Calls already in flight run to completion.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::actuator::{ActuatorCommand, ActuatorSink, SuppressionPredicate};
use crate::config::ReplaySettings;
use crate::error::{Result, TaplineError};
use crate::events::{EngineEvent, EventBus, EventLevel, EventReason};
use crate::timeline::Timeline;
use crate::types::Action;

use super::types::ReplayState;

/// Broadcast cancellation signal for a replay session
///
/// Clones share the same signal. Once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct ReplayCanceller {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for ReplayCanceller {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayCanceller {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Request cancellation; returns immediately
    pub fn cancel(&self) {
        if !self.sender.send_replace(true) {
            tracing::info!("Replay cancellation requested");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

/// Per-session counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    /// Actions in the timeline
    pub scheduled: usize,
    /// Actuator calls that returned successfully
    pub executed: usize,
    /// Actions vetoed by the suppression predicate
    pub suppressed: usize,
    /// Actuator calls that returned an error
    pub failed: usize,
    /// Actions that observed cancellation before their call
    pub cancelled: usize,
    /// Actions that could not be mapped to an actuator call
    pub unplayable: usize,
    /// Largest gap between a deadline and the call start
    pub max_lateness: Duration,
}

impl ReplayReport {
    fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Executed { lateness } => {
                self.executed += 1;
                self.max_lateness = self.max_lateness.max(lateness);
            }
            TaskOutcome::Suppressed => self.suppressed += 1,
            TaskOutcome::Failed => self.failed += 1,
            TaskOutcome::Cancelled => self.cancelled += 1,
        }
    }
}

/// How a replay session ended
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayOutcome {
    Completed(ReplayReport),
    /// Cancellation was observed by at least one task
    Cancelled(ReplayReport),
}

impl ReplayOutcome {
    pub fn report(&self) -> &ReplayReport {
        match self {
            ReplayOutcome::Completed(report) | ReplayOutcome::Cancelled(report) => report,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReplayOutcome::Cancelled(_))
    }
}

/// Timeline replayer
pub struct Replayer {
    actuator: Arc<dyn ActuatorSink>,
    predicate: Option<Arc<dyn SuppressionPredicate>>,
    settings: ReplaySettings,
    events: EventBus,
    state: Mutex<ReplayState>,
}

impl std::fmt::Debug for Replayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Replayer")
            .field("settings", &self.settings)
            .field("has_predicate", &self.predicate.is_some())
            .field("state", &self.state())
            .finish()
    }
}

impl Replayer {
    /// Create a replayer driving `actuator`
    pub fn new(actuator: Arc<dyn ActuatorSink>, settings: ReplaySettings) -> Self {
        Self {
            actuator,
            predicate: None,
            settings,
            events: EventBus::new(),
            state: Mutex::new(ReplayState::Idle),
        }
    }

    /// Builder: consult `predicate` before directional gestures
    pub fn with_predicate(mut self, predicate: Arc<dyn SuppressionPredicate>) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Builder: report per-action events on this bus
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn settings(&self) -> &ReplaySettings {
        &self.settings
    }

    /// Get current state
    pub fn state(&self) -> ReplayState {
        *self.lock_state()
    }

    fn lock_state(&self) -> MutexGuard<'_, ReplayState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: ReplayState) {
        *self.lock_state() = state;
    }

    fn begin(&self) -> Result<SessionGuard<'_>> {
        let mut state = self.lock_state();
        if state.is_active() {
            return Err(TaplineError::ReplayInProgress);
        }
        *state = ReplayState::Scheduling;
        Ok(SessionGuard { replayer: self })
    }

    /// Replay a timeline, returning once every action task has finished
    ///
    /// Fails only for structural problems: an empty or invalid timeline, or
    /// a session already running on this replayer. Per-action failures are
    /// reported as events and counted in the [`ReplayReport`].
    pub async fn replay(
        &self,
        timeline: &Timeline,
        cancel: &ReplayCanceller,
    ) -> Result<ReplayOutcome> {
        if timeline.is_empty() {
            return Err(TaplineError::EmptyTimeline);
        }
        timeline.validate()?;

        let speed = self.settings.effective_speed();
        let offsets = timeline
            .actions
            .iter()
            .enumerate()
            .map(|(index, action)| {
                Duration::try_from_secs_f64(action.timestamp / speed).map_err(|e| {
                    TaplineError::InvalidTimeline {
                        index,
                        message: e.to_string(),
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // every deadline is known before any task exists
        let anchor = Instant::now() + self.settings.start_delay();
        let plans = timeline
            .actions
            .iter()
            .zip(offsets)
            .enumerate()
            .map(|(index, (action, offset))| {
                let deadline = anchor.checked_add(offset).ok_or_else(|| {
                    TaplineError::InvalidTimeline {
                        index,
                        message: format!("timestamp {:.3}s out of range", action.timestamp),
                    }
                })?;
                Ok((deadline, ActuatorCommand::resolve(action, &self.settings)))
            })
            .collect::<Result<Vec<_>>>()?;

        let _session = self.begin()?;

        let mut report = ReplayReport {
            scheduled: timeline.len(),
            ..Default::default()
        };
        self.events.emit(EngineEvent::session(
            EventLevel::Info,
            EventReason::ReplayStarted {
                actions: timeline.len(),
            },
        ));

        let mut tasks = JoinSet::new();
        for (index, (action, (deadline, command))) in timeline.actions.iter().zip(plans).enumerate() {
            let command = match command {
                Ok(command) => command,
                Err(detail) => {
                    report.unplayable += 1;
                    self.events.emit(EngineEvent::action(
                        EventLevel::Warning,
                        index,
                        action.kind,
                        EventReason::ActionUnplayable {
                            detail: detail.to_string(),
                        },
                    ));
                    continue;
                }
            };

            let predicate = if action.kind.is_directional() {
                self.predicate.clone()
            } else {
                None
            };

            let task = ActionTask {
                index,
                action: action.clone(),
                command,
                deadline,
                actuator: Arc::clone(&self.actuator),
                predicate,
                pre_check_lead: self.settings.pre_check_lead(),
                predicate_timeout: self.settings.predicate_timeout(),
                lateness_warn: self.settings.lateness_warn(),
                events: self.events.clone(),
                cancel: cancel.subscribe(),
            };
            tasks.spawn(task.run());
        }

        self.set_state(ReplayState::Running);
        tracing::debug!(tasks = tasks.len(), speed, "Replay tasks scheduled");

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => report.record(outcome),
                Err(e) => {
                    report.failed += 1;
                    tracing::error!("Replay task aborted: {}", e);
                }
            }
        }

        let cancelled = report.cancelled > 0;
        self.set_state(if cancelled {
            ReplayState::Cancelled
        } else {
            ReplayState::Completed
        });
        self.events.emit(EngineEvent::session(
            EventLevel::Info,
            EventReason::ReplayFinished { cancelled },
        ));
        tracing::info!(
            executed = report.executed,
            suppressed = report.suppressed,
            failed = report.failed,
            cancelled = report.cancelled,
            unplayable = report.unplayable,
            max_lateness_ms = report.max_lateness.as_secs_f64() * 1000.0,
            "Replay finished"
        );

        Ok(if cancelled {
            ReplayOutcome::Cancelled(report)
        } else {
            ReplayOutcome::Completed(report)
        })
    }

    /// Run a replay on a dedicated thread with its own runtime
    pub fn spawn(self: Arc<Self>, timeline: Timeline) -> Result<ReplayHandle> {
        let canceller = ReplayCanceller::new();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("tapline-replay-worker")
            .enable_time()
            .build()
            .map_err(|e| TaplineError::Runtime(format!("Failed to build runtime: {}", e)))?;

        let task_cancel = canceller.clone();
        let thread = std::thread::Builder::new()
            .name("tapline-replay".to_string())
            .spawn(move || {
                let outcome = runtime.block_on(async move { self.replay(&timeline, &task_cancel).await });
                // a predicate past its timeout may still hold a blocking thread
                runtime.shutdown_background();
                outcome
            })
            .map_err(|e| TaplineError::Runtime(format!("Failed to spawn replay thread: {}", e)))?;

        Ok(ReplayHandle { canceller, thread })
    }
}

/// Marks the session cancelled if the replay future is dropped mid-flight
struct SessionGuard<'a> {
    replayer: &'a Replayer,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.replayer.lock_state();
        if state.is_active() {
            *state = ReplayState::Cancelled;
        }
    }
}

/// Handle to a replay running on its own thread
#[derive(Debug)]
pub struct ReplayHandle {
    canceller: ReplayCanceller,
    thread: JoinHandle<Result<ReplayOutcome>>,
}

impl ReplayHandle {
    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> &ReplayCanceller {
        &self.canceller
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the replay to finish
    pub fn join(self) -> Result<ReplayOutcome> {
        self.thread
            .join()
            .map_err(|_| TaplineError::Runtime("Replay thread panicked".to_string()))?
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TaskOutcome {
    Executed { lateness: Duration },
    Suppressed,
    Failed,
    Cancelled,
}

/// Everything one scheduled action needs, owned by its task
struct ActionTask {
    index: usize,
    action: Action,
    command: ActuatorCommand,
    deadline: Instant,
    actuator: Arc<dyn ActuatorSink>,
    predicate: Option<Arc<dyn SuppressionPredicate>>,
    pre_check_lead: Duration,
    predicate_timeout: Duration,
    lateness_warn: Duration,
    events: EventBus,
    cancel: watch::Receiver<bool>,
}

impl ActionTask {
    fn emit(&self, level: EventLevel, reason: EventReason) {
        self.events
            .emit(EngineEvent::action(level, self.index, self.action.kind, reason));
    }

    fn cancelled(&self) -> TaskOutcome {
        self.emit(EventLevel::Debug, EventReason::ActionCancelled);
        TaskOutcome::Cancelled
    }

    async fn run(mut self) -> TaskOutcome {
        if let Some(predicate) = self.predicate.take() {
            let check_at = self
                .deadline
                .checked_sub(self.pre_check_lead)
                .unwrap_or_else(Instant::now);
            if !wait_until(check_at, &mut self.cancel).await {
                return self.cancelled();
            }
            if self.check_suppressed(predicate).await {
                self.emit(EventLevel::Info, EventReason::ActionSuppressed);
                return TaskOutcome::Suppressed;
            }
        }

        if !wait_until(self.deadline, &mut self.cancel).await {
            return self.cancelled();
        }

        let started = Instant::now();
        let lateness = started.saturating_duration_since(self.deadline);
        let actuator = Arc::clone(&self.actuator);
        let command = self.command;
        let result = tokio::task::spawn_blocking(move || command.dispatch(actuator.as_ref())).await;

        match result {
            Ok(Ok(())) => {
                let level = if lateness > self.lateness_warn {
                    EventLevel::Warning
                } else {
                    EventLevel::Debug
                };
                self.emit(
                    level,
                    EventReason::ActionExecuted {
                        lateness_ms: lateness.as_secs_f64() * 1000.0,
                    },
                );
                TaskOutcome::Executed { lateness }
            }
            Ok(Err(e)) => {
                self.emit(
                    EventLevel::Error,
                    EventReason::ActuatorFailed {
                        error: e.to_string(),
                    },
                );
                TaskOutcome::Failed
            }
            Err(e) => {
                self.emit(
                    EventLevel::Error,
                    EventReason::ActuatorFailed {
                        error: e.to_string(),
                    },
                );
                TaskOutcome::Failed
            }
        }
    }

    /// Ask the predicate; errors and timeouts never suppress
    async fn check_suppressed(&self, predicate: Arc<dyn SuppressionPredicate>) -> bool {
        let action = self.action.clone();
        let call = tokio::task::spawn_blocking(move || predicate.should_suppress(&action));

        match tokio::time::timeout(self.predicate_timeout, call).await {
            Ok(Ok(Ok(suppress))) => suppress,
            Ok(Ok(Err(e))) => {
                self.emit(
                    EventLevel::Warning,
                    EventReason::PredicateFailed {
                        error: e.to_string(),
                    },
                );
                false
            }
            Ok(Err(e)) => {
                self.emit(
                    EventLevel::Warning,
                    EventReason::PredicateFailed {
                        error: e.to_string(),
                    },
                );
                false
            }
            Err(_) => {
                self.emit(
                    EventLevel::Warning,
                    EventReason::PredicateTimedOut {
                        timeout_ms: self.predicate_timeout.as_millis() as u64,
                    },
                );
                false
            }
        }
    }
}

/// Sleep until `deadline`; `false` if cancellation was observed
async fn wait_until(deadline: Instant, cancel: &mut watch::Receiver<bool>) -> bool {
    if *cancel.borrow() {
        return false;
    }
    let reached = tokio::select! {
        biased;
        _ = cancelled(cancel) => false,
        _ = tokio::time::sleep_until(deadline) => true,
    };
    reached && !*cancel.borrow()
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    let closed = cancel.wait_for(|c| *c).await.is_err();
    if closed {
        // canceller gone, nothing can cancel any more
        std::future::pending::<()>().await;
    }
}
