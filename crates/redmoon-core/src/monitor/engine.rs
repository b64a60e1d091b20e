//! The foreground polling loop.
//!
//! ## State Transitions
//!
//! ```text
//! Running -> Stopped   (cancellation token only)
//! ```
//!
//! The token is checked before every poll and raced against the sleep
//! between polls, so a stop request never waits out a full interval.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::classify::ClassificationPolicy;
use super::source::ForegroundSource;
use crate::command::{Command, CommandSink};
use crate::storage::MonitorConfig;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Running,
    Stopped,
}

/// Polls the foreground app and tells the filter to suspend or resume.
pub struct ForegroundMonitor {
    source: Arc<dyn ForegroundSource>,
    sink: Arc<dyn CommandSink>,
    policy: ClassificationPolicy,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl ForegroundMonitor {
    pub fn new(
        source: Arc<dyn ForegroundSource>,
        sink: Arc<dyn CommandSink>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            sink,
            policy: ClassificationPolicy::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel,
        }
    }

    /// Build a monitor using the suspend list extras and poll interval from
    /// `config`. A zero interval falls back to [`DEFAULT_POLL_INTERVAL`].
    pub fn from_config(
        config: &MonitorConfig,
        source: Arc<dyn ForegroundSource>,
        sink: Arc<dyn CommandSink>,
        cancel: CancellationToken,
    ) -> Self {
        let interval = match config.poll_interval_ms {
            0 => DEFAULT_POLL_INTERVAL,
            ms => Duration::from_millis(ms),
        };
        Self::new(source, sink, cancel)
            .with_policy(ClassificationPolicy::from_config(config))
            .with_poll_interval(interval)
    }

    /// Start only when secure suspend is switched on in `config`.
    pub fn start_if_enabled(
        config: &MonitorConfig,
        source: Arc<dyn ForegroundSource>,
        sink: Arc<dyn CommandSink>,
        cancel: CancellationToken,
    ) -> Option<MonitorHandle> {
        if !config.secure_suspend {
            info!("secure suspend disabled, foreground monitor not started");
            return None;
        }
        Some(Self::from_config(config, source, sink, cancel).start())
    }

    pub fn with_policy(mut self, policy: ClassificationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Whether the platform currently reports a foreground app at all.
    ///
    /// `false` usually means the usage-access permission was not granted.
    pub fn is_monitoring_functional(&self) -> bool {
        is_monitoring_functional(self.source.as_ref())
    }

    /// One query-classify-emit step. Returns the command sent, if any.
    pub fn poll_once(&self) -> Option<Command> {
        let current = self.source.current();
        debug!(app = %current, "current app");
        let command = self.policy.classify(&current).command()?;
        self.sink.send(command);
        Some(command)
    }

    /// Run until the cancellation token fires.
    pub async fn run(self) {
        info!(interval_ms = self.poll_interval.as_millis() as u64, "foreground monitor running");
        while !self.cancel.is_cancelled() {
            self.poll_once();
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        info!("shutting down foreground monitor");
    }

    /// Spawn [`run`](Self::run) on the current tokio runtime.
    pub fn start(self) -> MonitorHandle {
        let cancel = self.cancel.clone();
        let task = tokio::spawn(self.run());
        MonitorHandle { cancel, task }
    }
}

/// Diagnostic: does a single lookup yield a non-empty identifier?
pub fn is_monitoring_functional(source: &dyn ForegroundSource) -> bool {
    !source.current().is_unknown()
}

/// Owner's handle on a started monitor.
pub struct MonitorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn state(&self) -> MonitorState {
        if self.task.is_finished() {
            MonitorState::Stopped
        } else {
            MonitorState::Running
        }
    }

    /// Request shutdown without waiting for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Request shutdown and wait for the loop to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}
