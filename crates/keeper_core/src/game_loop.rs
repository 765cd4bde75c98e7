//! Fixed-tick game loops.
//!
//! A session runs several named loops ([`LoopKind::Logic`],
//! [`LoopKind::Animation`], [`LoopKind::Steering`]), each ticking its own
//! ordered list of [`GameSystem`]s at a fixed interval.
//!
//! # Scheduling
//!
//! - Each loop is one tokio task. Loops run concurrently with each other.
//! - Within a loop, systems run strictly in registration order; a later
//!   system sees what an earlier one did in the same tick.
//! - The delta handed to systems is always the loop interval, never a
//!   measured wall-clock duration. A late tick is delayed, not bunched.
//! - Pause and resume are cooperative and take effect between ticks.
//! - A system that returns an error or panics ends its own loop; other
//!   loops keep running.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use keeper_core::error::SystemError;
//! use keeper_core::game_loop::{GameLoopManager, GameSystem, LoopKind, TickInfo, tick_interval};
//!
//! struct Heartbeat;
//!
//! impl GameSystem for Heartbeat {
//!     fn name(&self) -> &str {
//!         "heartbeat"
//!     }
//!
//!     fn process_tick(&mut self, _tick: &TickInfo) -> Result<(), SystemError> {
//!         Ok(())
//!     }
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(async {
//! let mut manager = GameLoopManager::new();
//! manager
//!     .register_loop(LoopKind::Logic, tick_interval(4), vec![Box::new(Heartbeat)])
//!     .unwrap();
//! manager.start().unwrap();
//! tokio::time::sleep(Duration::from_millis(10)).await;
//! manager.stop().await.unwrap();
//! # });
//! ```

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::{LoopError, SystemError};

/// Named loop of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoopKind {
    /// Game logic: AI decisions, spawning, economy.
    Logic,
    /// Animation clocks.
    Animation,
    /// Movement along planned paths.
    Steering,
}

impl std::fmt::Display for LoopKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Logic => "logic",
            Self::Animation => "animation",
            Self::Steering => "steering",
        };
        f.write_str(name)
    }
}

/// Interval of a loop running at `ticks_per_second`.
///
/// Returns [`Duration::ZERO`] for a rate of zero, which registration rejects.
#[must_use]
pub fn tick_interval(ticks_per_second: u32) -> Duration {
    if ticks_per_second == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(1_000_000_000 / u64::from(ticks_per_second))
}

/// What a system is told about the tick it is processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Zero-based tick number within the loop.
    pub tick: u64,
    /// Fixed step of the loop.
    pub delta: Duration,
}

impl TickInfo {
    /// Fixed step in seconds.
    #[must_use]
    pub fn delta_seconds(&self) -> f64 {
        self.delta.as_secs_f64()
    }
}

/// A unit of simulation driven by a loop.
///
/// `process_tick` must finish promptly: the loop's pacing depends on it.
pub trait GameSystem: Send {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Called once on the loop task before the first tick.
    fn start(&mut self) {}

    /// Called once on the loop task after the last tick.
    fn stop(&mut self) {}

    /// Advance by one fixed step.
    fn process_tick(&mut self, tick: &TickInfo) -> Result<(), SystemError>;
}

/// Lifecycle of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// Loops can be registered; nothing runs yet.
    Idle,
    /// Loops are ticking.
    Running,
    /// Loops are alive but not ticking.
    Paused,
    /// Loops have exited. Terminal.
    Stopped,
}

/// Status of one loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopStatus {
    /// Registered, not started.
    Idle,
    /// Ticking.
    Running,
    /// Waiting for resume.
    Paused,
    /// Exited normally.
    Stopped,
    /// Ended by a system fault.
    Failed(SystemError),
}

/// Value broadcast to loop tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Paused,
    Stopped,
}

/// Counters a loop task shares with the manager.
#[derive(Debug, Default)]
struct LoopShared {
    ticks: AtomicU64,
    failure: Mutex<Option<SystemError>>,
}

struct LoopEntry {
    kind: LoopKind,
    interval: Duration,
    systems: Vec<Box<dyn GameSystem>>,
    shared: Arc<LoopShared>,
    handle: Option<JoinHandle<()>>,
}

/// Owns and drives the loops of one game session.
///
/// A manager is started once and stopped once; a new session needs a new
/// manager.
pub struct GameLoopManager {
    state: ManagerState,
    loops: Vec<LoopEntry>,
    control: watch::Sender<RunState>,
}

impl Default for GameLoopManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GameLoopManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameLoopManager")
            .field("state", &self.state)
            .field("loops", &self.loop_kinds())
            .finish()
    }
}

impl GameLoopManager {
    /// Create an idle manager with no loops.
    #[must_use]
    pub fn new() -> Self {
        let (control, _) = watch::channel(RunState::Running);
        Self {
            state: ManagerState::Idle,
            loops: Vec::new(),
            control,
        }
    }

    /// Register a loop ticking `systems` in order every `interval`.
    pub fn register_loop(
        &mut self,
        kind: LoopKind,
        interval: Duration,
        systems: Vec<Box<dyn GameSystem>>,
    ) -> Result<(), LoopError> {
        if self.state != ManagerState::Idle {
            return Err(LoopError::RegistrationClosed);
        }
        if interval.is_zero() {
            return Err(LoopError::ZeroInterval { kind, interval });
        }
        if self.loops.iter().any(|entry| entry.kind == kind) {
            return Err(LoopError::DuplicateLoop(kind));
        }

        self.loops.push(LoopEntry {
            kind,
            interval,
            systems,
            shared: Arc::new(LoopShared::default()),
            handle: None,
        });
        Ok(())
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// Registered loops in registration order.
    #[must_use]
    pub fn loop_kinds(&self) -> Vec<LoopKind> {
        self.loops.iter().map(|entry| entry.kind).collect()
    }

    /// Fixed interval of a loop.
    #[must_use]
    pub fn interval(&self, kind: LoopKind) -> Option<Duration> {
        self.entry(kind).map(|entry| entry.interval)
    }

    /// Completed ticks of a loop.
    #[must_use]
    pub fn tick_count(&self, kind: LoopKind) -> Option<u64> {
        self.entry(kind)
            .map(|entry| entry.shared.ticks.load(Ordering::Acquire))
    }

    /// Status of a loop.
    #[must_use]
    pub fn loop_status(&self, kind: LoopKind) -> Option<LoopStatus> {
        let entry = self.entry(kind)?;
        if let Some(failure) = entry.shared.failure.lock().clone() {
            return Some(LoopStatus::Failed(failure));
        }
        Some(match self.state {
            ManagerState::Idle => LoopStatus::Idle,
            ManagerState::Running => LoopStatus::Running,
            ManagerState::Paused => LoopStatus::Paused,
            ManagerState::Stopped => LoopStatus::Stopped,
        })
    }

    /// Spawn every registered loop on the current tokio runtime.
    pub fn start(&mut self) -> Result<(), LoopError> {
        match self.state {
            ManagerState::Idle => {}
            ManagerState::Running | ManagerState::Paused => return Err(LoopError::AlreadyRunning),
            ManagerState::Stopped => return Err(LoopError::AlreadyStopped),
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| LoopError::NoRuntime)?;

        self.control.send_replace(RunState::Running);
        for entry in &mut self.loops {
            let systems = std::mem::take(&mut entry.systems);
            let task = run_loop(
                entry.kind,
                entry.interval,
                systems,
                Arc::clone(&entry.shared),
                self.control.subscribe(),
            );
            entry.handle = Some(runtime.spawn(task));
        }

        self.state = ManagerState::Running;
        tracing::info!(loops = self.loops.len(), "game loops started");
        Ok(())
    }

    /// Stop ticking until [`resume`](Self::resume). No-op when already paused.
    pub fn pause(&mut self) -> Result<(), LoopError> {
        match self.state {
            ManagerState::Idle => Err(LoopError::NotStarted),
            ManagerState::Stopped => Err(LoopError::AlreadyStopped),
            ManagerState::Paused => Ok(()),
            ManagerState::Running => {
                self.control.send_replace(RunState::Paused);
                self.state = ManagerState::Paused;
                tracing::info!("game loops paused");
                Ok(())
            }
        }
    }

    /// Resume ticking after [`pause`](Self::pause). No-op when running.
    pub fn resume(&mut self) -> Result<(), LoopError> {
        match self.state {
            ManagerState::Idle => Err(LoopError::NotStarted),
            ManagerState::Stopped => Err(LoopError::AlreadyStopped),
            ManagerState::Running => Ok(()),
            ManagerState::Paused => {
                self.control.send_replace(RunState::Running);
                self.state = ManagerState::Running;
                tracing::info!("game loops resumed");
                Ok(())
            }
        }
    }

    /// Stop every loop and wait for the tasks to exit.
    ///
    /// A tick in progress is allowed to finish. Stopping twice is harmless.
    pub async fn stop(&mut self) -> Result<(), LoopError> {
        if self.state == ManagerState::Stopped {
            return Ok(());
        }

        self.control.send_replace(RunState::Stopped);
        self.state = ManagerState::Stopped;

        for entry in &mut self.loops {
            // Systems that never ran are released here.
            entry.systems.clear();
            let Some(handle) = entry.handle.take() else {
                continue;
            };
            if let Err(err) = handle.await {
                tracing::error!(loop_kind = %entry.kind, error = %err, "game loop task aborted");
                let mut failure = entry.shared.failure.lock();
                if failure.is_none() {
                    *failure = Some(SystemError::new(
                        entry.kind.to_string(),
                        entry.shared.ticks.load(Ordering::Acquire),
                        format!("loop task aborted: {err}"),
                    ));
                }
            }
        }

        tracing::info!("game loops stopped");
        Ok(())
    }

    fn entry(&self, kind: LoopKind) -> Option<&LoopEntry> {
        self.loops.iter().find(|entry| entry.kind == kind)
    }
}

impl Drop for GameLoopManager {
    fn drop(&mut self) {
        // Tasks notice on their next wake-up and wind down on their own.
        self.control.send_replace(RunState::Stopped);
    }
}

enum LoopEvent {
    Control { open: bool },
    Tick,
}

async fn run_loop(
    kind: LoopKind,
    interval: Duration,
    mut systems: Vec<Box<dyn GameSystem>>,
    shared: Arc<LoopShared>,
    mut control: watch::Receiver<RunState>,
) {
    for system in &mut systems {
        system.start();
    }
    tracing::debug!(loop_kind = %kind, ?interval, systems = systems.len(), "loop task started");

    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick = 0u64;

    loop {
        let state = *control.borrow_and_update();
        match state {
            RunState::Stopped => break,
            RunState::Paused => {
                if control.changed().await.is_err() {
                    break;
                }
                // No catch-up for the time spent paused.
                ticker.reset();
            }
            RunState::Running => {
                let event = tokio::select! {
                    biased;
                    changed = control.changed() => LoopEvent::Control { open: changed.is_ok() },
                    _ = ticker.tick() => LoopEvent::Tick,
                };
                match event {
                    LoopEvent::Control { open: false } => break,
                    LoopEvent::Control { open: true } => {}
                    LoopEvent::Tick => {
                        let info = TickInfo {
                            tick,
                            delta: interval,
                        };
                        if let Err(err) = run_tick(&mut systems, &info) {
                            tracing::error!(loop_kind = %kind, error = %err, "system fault, stopping loop");
                            *shared.failure.lock() = Some(err);
                            break;
                        }
                        tick += 1;
                        shared.ticks.store(tick, Ordering::Release);
                    }
                }
            }
        }
    }

    for system in &mut systems {
        system.stop();
    }
    tracing::debug!(loop_kind = %kind, ticks = tick, "loop task finished");
}

/// Run one tick through every system. A panic is reported like a returned error.
fn run_tick(systems: &mut [Box<dyn GameSystem>], info: &TickInfo) -> Result<(), SystemError> {
    for system in systems.iter_mut() {
        match panic::catch_unwind(AssertUnwindSafe(|| system.process_tick(info))) {
            Ok(result) => result?,
            Err(payload) => {
                return Err(SystemError::new(
                    system.name(),
                    info.tick,
                    format!("panicked: {}", panic_message(payload.as_ref())),
                ));
            }
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
