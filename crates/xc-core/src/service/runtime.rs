//! # Crosscore Runtime
//!
//! Owns the lifecycle and implements [`CrossCoreApi`].
//!
//! ## Initialization order
//!
//! 1. Validate configuration and reset the pending table
//! 2. Open the command and response channels
//! 3. Reset the sequence counter
//! 4. Start the worker task
//! 5. Optionally start the monitor task
//!
//! ## Shutdown sequence
//!
//! 1. Stop the monitor (half the timeout)
//! 2. Stop the worker (remaining time, or immediately when forced)
//! 3. Close both channels and log what they still held
//! 4. Clear pending entries and outstanding events
//! 5. Reset the sequence counter and return to `Uninitialized`

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use shared_types::{
    CallbackHandle, Command, CoreError, CorrelationMode, EventHandle, Payload, Response, Sequence,
    Status,
};
use tracing::{debug, error, info, warn};

use crate::adapters::{MonotonicClock, NoInterpreterLock, ThreadSpawner};
use crate::config::CoreConfig;
use crate::domain::{PendingEntry, Resolution, SequenceCounter, SystemState};
use crate::metrics::MetricsSnapshot;
use crate::ports::{Clock, CrossCoreApi, InterpreterLock, TaskSpawner, TaskSpec};
use crate::service::channels::{channel_error, Channels};
use crate::service::correlation::Correlation;
use crate::service::deferred::CallbackRegistry;
use crate::service::events::ResponseEvent;
use crate::service::monitor::Monitor;
use crate::service::task::{TaskControl, TaskExit, TaskHandle};
use crate::service::worker::Worker;

const WORKER_TASK: &str = "xc-worker";
const MONITOR_TASK: &str = "xc-monitor";

/// Longest single wait of a blocking submission before re-checking state.
const BLOCKING_WAIT_SLICE: Duration = Duration::from_millis(100);

/// Shutdown timeout used when the caller has no better value.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(1_000);

/// Result of a [`CrossCore::shutdown`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    Completed(ShutdownReport),
    /// Another shutdown is in progress; nothing was done.
    AlreadyShuttingDown,
    /// The runtime was not initialized; nothing was done.
    NotInitialized,
}

/// What a completed shutdown did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// `None` if the monitor was not running.
    pub monitor: Option<TaskExit>,
    pub worker: TaskExit,
    pub drained_commands: usize,
    pub drained_responses: usize,
    pub cleared_pending: usize,
    pub cleared_events: usize,
    pub elapsed: Duration,
}

/// Releases the interpreter lock for the lifetime of the guard.
struct ReleasedInterpreter<'a>(&'a dyn InterpreterLock);

impl<'a> ReleasedInterpreter<'a> {
    fn new(lock: &'a dyn InterpreterLock) -> Self {
        lock.release();
        Self(lock)
    }
}

impl Drop for ReleasedInterpreter<'_> {
    fn drop(&mut self) {
        self.0.reacquire();
    }
}

/// The cross-core command/response runtime.
///
/// Cheap to share behind an `Arc`; every method takes `&self`.
pub struct CrossCore {
    config: CoreConfig,
    clock: Arc<dyn Clock>,
    spawner: Arc<dyn TaskSpawner>,
    interpreter: Arc<dyn InterpreterLock>,
    state: Mutex<SystemState>,
    channels: RwLock<Option<Channels>>,
    correlation: Arc<Correlation>,
    sequence: SequenceCounter,
    worker: Mutex<Option<TaskHandle>>,
    monitor: Mutex<Option<TaskHandle>>,
}

impl CrossCore {
    /// Runtime on OS threads and the monotonic clock.
    pub fn new(config: CoreConfig) -> Self {
        Self::with_ports(config, Arc::new(MonotonicClock::new()), Arc::new(ThreadSpawner))
    }

    pub fn with_ports(
        config: CoreConfig,
        clock: Arc<dyn Clock>,
        spawner: Arc<dyn TaskSpawner>,
    ) -> Self {
        let correlation = Arc::new(Correlation::new(&config));
        Self {
            config,
            clock,
            spawner,
            interpreter: Arc::new(NoInterpreterLock),
            state: Mutex::new(SystemState::Uninitialized),
            channels: RwLock::new(None),
            correlation,
            sequence: SequenceCounter::new(),
            worker: Mutex::new(None),
            monitor: Mutex::new(None),
        }
    }

    /// Release `lock` around every blocking wait.
    #[must_use]
    pub fn with_interpreter_lock(mut self, lock: Arc<dyn InterpreterLock>) -> Self {
        self.interpreter = lock;
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn state(&self) -> SystemState {
        *self.state.lock()
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == SystemState::Initialized
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.has_exited())
    }

    pub fn pending_count(&self) -> usize {
        self.correlation.pending_count()
    }

    pub fn deferred_count(&self) -> usize {
        self.correlation.deferred().len()
    }

    /// `(commands, responses)` currently queued; zero when not initialized.
    pub fn queued(&self) -> (usize, usize) {
        self.channels
            .read()
            .as_ref()
            .map_or((0, 0), |ch| (ch.commands.len(), ch.responses.len()))
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.correlation.metrics().snapshot()
    }

    /// Bring the runtime up.
    ///
    /// # Errors
    ///
    /// `AlreadyInitialized` while running or shutting down. Configuration and
    /// spawn failures leave the runtime in [`SystemState::Error`].
    pub fn init(&self) -> Result<(), CoreError> {
        let mut state = self.state.lock();
        if !state.can_init() {
            warn!(state = %*state, "Init requested while not idle");
            return Err(CoreError::AlreadyInitialized);
        }
        info!(
            command_queue = self.config.command_queue_capacity,
            response_queue = self.config.response_queue_capacity,
            max_pending = self.config.max_pending,
            "Initializing runtime"
        );

        match self.bring_up() {
            Ok(()) => {
                *state = SystemState::Initialized;
                drop(state);
                info!("Runtime initialized");
                if self.config.start_monitor_on_init {
                    if let Err(err) = self.start_monitoring() {
                        error!(error = %err, "Monitor failed to start during init");
                    }
                }
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "Runtime initialization failed");
                *state = SystemState::Error;
                Err(err)
            }
        }
    }

    fn bring_up(&self) -> Result<(), CoreError> {
        self.config.validate()?;
        self.correlation.reset();

        let channels = Channels::open(&self.config)?;
        self.sequence.reset();

        let control = TaskControl::new();
        let worker = Worker::new(
            &channels,
            self.correlation.metrics_handle(),
            Arc::clone(&control),
            &self.config,
        );
        let spec = TaskSpec {
            name: WORKER_TASK,
            core: self.config.worker_core,
            stack_size: self.config.worker_stack_size,
        };
        let join = match self.spawner.spawn(spec, Box::new(move || worker.run())) {
            Ok(join) => join,
            Err(err) => {
                channels.close();
                return Err(err);
            }
        };
        *self.worker.lock() = Some(TaskHandle::new(WORKER_TASK, control, join));
        *self.channels.write() = Some(channels);
        Ok(())
    }

    /// Start the monitor task. Succeeds without effect if it is already running.
    pub fn start_monitoring(&self) -> Result<(), CoreError> {
        let channels = self.live_channels()?;
        let mut monitor = self.monitor.lock();
        if monitor.as_ref().is_some_and(|handle| !handle.has_exited()) {
            debug!("Monitor already running");
            return Ok(());
        }

        let control = TaskControl::new();
        let task = Monitor::new(
            Arc::clone(&channels.responses),
            Arc::clone(&self.correlation),
            Arc::clone(&self.clock),
            Arc::clone(&control),
            &self.config,
        );
        let spec = TaskSpec {
            name: MONITOR_TASK,
            core: self.config.monitor_core,
            stack_size: self.config.monitor_stack_size,
        };
        let join = self.spawner.spawn(spec, Box::new(move || task.run()))?;
        *monitor = Some(TaskHandle::new(MONITOR_TASK, control, join));
        info!(core = self.config.monitor_core, "Monitor started");
        Ok(())
    }

    /// Stop the monitor, waiting up to `timeout`. Returns `None` if it was not running.
    pub fn stop_monitoring(&self, timeout: Duration) -> Option<TaskExit> {
        let handle = self.monitor.lock().take()?;
        let exit = handle.stop(timeout);
        info!(?exit, "Monitor stopped");
        Some(exit)
    }

    /// Tear the runtime down within roughly `timeout`.
    ///
    /// With `force`, the worker is detached without waiting.
    pub fn shutdown(&self, timeout: Duration, force: bool) -> ShutdownOutcome {
        {
            let mut state = self.state.lock();
            match *state {
                SystemState::ShuttingDown => {
                    warn!("Shutdown already in progress");
                    return ShutdownOutcome::AlreadyShuttingDown;
                }
                SystemState::Uninitialized | SystemState::Error => {
                    warn!(state = %*state, "Shutdown requested but runtime not initialized");
                    return ShutdownOutcome::NotInitialized;
                }
                SystemState::Initialized => *state = SystemState::ShuttingDown,
            }
        }
        let started = Instant::now();
        info!(timeout_ms = timeout.as_millis() as u64, force, "Shutting down runtime");

        // Step 1: monitor
        let monitor = self.stop_monitoring(timeout / 2);

        // Step 2: worker
        let worker_handle = self.worker.lock().take();
        let worker = match worker_handle {
            Some(handle) if force => {
                warn!("Forcing worker termination");
                handle.abandon()
            }
            Some(handle) => {
                let remaining = timeout.saturating_sub(started.elapsed());
                handle.stop(remaining)
            }
            None => TaskExit::Abandoned,
        };
        info!(?worker, "Worker stopped");

        // Step 3: channels
        let channels = self.channels.write().take();
        let (drained_commands, drained_responses) = match channels {
            Some(channels) => {
                let (commands, responses) = channels.close();
                log_drained(&commands, &responses);
                (commands.len(), responses.len())
            }
            None => (0, 0),
        };

        // Step 4: pending entries
        let (cleared_pending, cleared_events) = self.correlation.reset();
        if cleared_pending > 0 || cleared_events > 0 {
            warn!(cleared_pending, cleared_events, "Cleared unresolved requests");
        }

        // Step 5: counters and state
        self.sequence.reset();
        *self.state.lock() = SystemState::Uninitialized;

        let report = ShutdownReport {
            monitor,
            worker,
            drained_commands,
            drained_responses,
            cleared_pending,
            cleared_events,
            elapsed: started.elapsed(),
        };
        info!(elapsed_ms = report.elapsed.as_millis() as u64, "Shutdown complete");
        ShutdownOutcome::Completed(report)
    }

    /// Drain deferred callbacks into a [`CallbackRegistry`].
    pub fn drain_into(&self, registry: &mut CallbackRegistry) -> usize {
        self.drain_deferred_callbacks(&mut |handle, resolution| {
            registry.invoke(handle, resolution);
        })
    }

    fn live_channels(&self) -> Result<Channels, CoreError> {
        match self.state() {
            SystemState::Initialized => {}
            SystemState::ShuttingDown => return Err(CoreError::ShuttingDown),
            SystemState::Uninitialized | SystemState::Error => {
                return Err(CoreError::NotInitialized)
            }
        }
        self.channels.read().clone().ok_or(CoreError::NotInitialized)
    }

    /// Register `entry`, then enqueue `command`. Rolls the entry back if the send fails.
    fn submit(&self, command: Command, entry: PendingEntry) -> Result<Channels, CoreError> {
        let channels = match self.live_channels() {
            Ok(channels) => channels,
            Err(err) => {
                self.correlation.metrics().record_rejected();
                return Err(err);
            }
        };

        if let Err(err) = self.correlation.register(entry) {
            warn!(sequence = command.sequence, error = %err, "Pending registration failed");
            self.correlation.metrics().record_rejected();
            return Err(err.into());
        }

        if let Err(err) = channels.commands.send(command, self.config.send_timeout()) {
            warn!(sequence = command.sequence, error = %err.kind, "Command send failed");
            self.correlation.clear(command.sequence);
            self.correlation.metrics().record_rejected();
            return Err(channel_error(err.kind));
        }

        self.correlation.metrics().record_submitted();
        debug!(
            sequence = command.sequence,
            opcode = command.opcode,
            mode = %command.mode,
            timeout_ms = command.timeout_ms,
            "Command submitted"
        );
        Ok(channels)
    }

    fn wait_for_response(
        &self,
        channels: &Channels,
        sequence: Sequence,
        timeout_ms: u32,
    ) -> Result<Response, CoreError> {
        let _released = ReleasedInterpreter::new(self.interpreter.as_ref());
        let deadline = (timeout_ms > 0)
            .then(|| Instant::now() + Duration::from_millis(u64::from(timeout_ms)));
        loop {
            let slice = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(CoreError::Timeout);
                    }
                    remaining.min(BLOCKING_WAIT_SLICE)
                }
                None => BLOCKING_WAIT_SLICE,
            };
            match channels
                .responses
                .receive_matching(|r| r.sequence == sequence, slice)
            {
                Ok(response) => return Ok(response),
                Err(shared_channel::ChannelError::Empty) => continue,
                Err(err) => return Err(channel_error(err)),
            }
        }
    }
}

impl CrossCoreApi for CrossCore {
    fn submit_blocking(
        &self,
        opcode: u16,
        payload: Payload,
        timeout_ms: u32,
    ) -> Result<Payload, CoreError> {
        let sequence = self.sequence.next();
        let command = Command::new(
            opcode,
            sequence,
            CorrelationMode::Blocking,
            timeout_ms,
            payload,
        );
        let entry = PendingEntry::new(
            sequence,
            CorrelationMode::Blocking,
            timeout_ms,
            self.clock.now_us(),
        );
        let channels = self.submit(command, entry)?;

        let outcome = self.wait_for_response(&channels, sequence, timeout_ms);
        self.correlation.clear(sequence);

        match outcome {
            Ok(response) => {
                self.correlation.metrics().record_resolved();
                match CoreError::from_status(response.status) {
                    None => Ok(response.payload),
                    Some(err) => {
                        if response.status == Status::Timeout {
                            warn!(sequence, "Worker reported timeout");
                        }
                        Err(err)
                    }
                }
            }
            Err(err) => {
                if err == CoreError::Timeout {
                    warn!(sequence, timeout_ms, "Blocking request timed out");
                    self.correlation.metrics().record_timeout();
                }
                Err(err)
            }
        }
    }

    fn submit_async(
        &self,
        opcode: u16,
        payload: Payload,
        timeout_ms: u32,
        callback: CallbackHandle,
    ) -> Result<Sequence, CoreError> {
        let sequence = self.sequence.next();
        let command = Command::new(opcode, sequence, CorrelationMode::Callback, timeout_ms, payload)
            .with_callback(callback);
        let entry = PendingEntry::new(
            sequence,
            CorrelationMode::Callback,
            timeout_ms,
            self.clock.now_us(),
        )
        .with_callback(callback);
        self.submit(command, entry)?;
        Ok(sequence)
    }

    fn submit_event(
        &self,
        opcode: u16,
        payload: Payload,
        timeout_ms: u32,
    ) -> Result<ResponseEvent, CoreError> {
        let sequence = self.sequence.next();
        let event = self.correlation.events().create(sequence);
        let handle: EventHandle = event.handle();
        let command = Command::new(opcode, sequence, CorrelationMode::Event, timeout_ms, payload)
            .with_event(handle);
        let entry = PendingEntry::new(
            sequence,
            CorrelationMode::Event,
            timeout_ms,
            self.clock.now_us(),
        )
        .with_event(handle);
        if let Err(err) = self.submit(command, entry) {
            self.correlation.events().discard(handle);
            return Err(err);
        }
        Ok(event)
    }

    fn drain_deferred_callbacks(&self, sink: &mut dyn FnMut(CallbackHandle, Resolution)) -> usize {
        self.correlation.deferred().drain(sink)
    }
}

impl Drop for CrossCore {
    fn drop(&mut self) {
        if self.is_initialized() {
            self.shutdown(Duration::from_millis(200), true);
        }
    }
}

fn log_drained(commands: &[Command], responses: &[Response]) {
    if commands.is_empty() && responses.is_empty() {
        return;
    }
    warn!(
        commands = commands.len(),
        responses = responses.len(),
        "Drained unprocessed items from channels"
    );
    for command in commands {
        debug!(sequence = command.sequence, opcode = command.opcode, "Drained command");
    }
    for response in responses {
        debug!(sequence = response.sequence, status = %response.status, "Drained response");
    }
}
