//! Foreground process lookup.
//!
//! The platform exposes one of two capabilities depending on its level:
//! usage statistics (newer) or the running-task list (older). A
//! [`ForegroundSource`] wraps whichever one is available. Every failure
//! becomes [`ProcessId::unknown`], which the classifier treats as "resume".

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::classify::ProcessId;
use crate::error::QueryError;
use crate::platform::PlatformLevel;

/// Trailing window searched for the most recently used app.
pub const USAGE_WINDOW_SECS: i64 = 1000;

/// One usage-statistics entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    pub id: String,
    pub last_used: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(id: impl Into<String>, last_used: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            last_used,
        }
    }
}

/// Raw platform queries. A platform implements the ones it has; the
/// defaults report the capability as unavailable.
pub trait ProcessQuery: Send + Sync {
    fn query_recent_usage(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>, QueryError> {
        Err(QueryError::Unavailable("usage statistics".into()))
    }

    /// Owner of the top activity of the most recent running task.
    fn query_top_running_task(&self) -> Result<Option<String>, QueryError> {
        Err(QueryError::Unavailable("running tasks".into()))
    }
}

/// Answers "what is in the foreground right now?".
pub trait ForegroundSource: Send + Sync {
    fn current(&self) -> ProcessId;
}

impl<F> ForegroundSource for F
where
    F: Fn() -> ProcessId + Send + Sync,
{
    fn current(&self) -> ProcessId {
        self()
    }
}

/// Picks the most recently used app from usage statistics.
pub struct UsageStatsSource {
    query: Arc<dyn ProcessQuery>,
    window: chrono::Duration,
}

impl UsageStatsSource {
    pub fn new(query: Arc<dyn ProcessQuery>) -> Self {
        Self {
            query,
            window: chrono::Duration::seconds(USAGE_WINDOW_SECS),
        }
    }
}

impl ForegroundSource for UsageStatsSource {
    fn current(&self) -> ProcessId {
        let end = Utc::now();
        let records = match self.query.query_recent_usage(end - self.window, end) {
            Ok(records) => records,
            Err(e) => {
                debug!(error = %e, "usage query failed");
                return ProcessId::unknown();
            }
        };
        // max_by_key keeps the last of equal keys, so a later record wins a tie.
        records
            .into_iter()
            .max_by_key(|r| r.last_used)
            .map(|r| ProcessId::from(r.id))
            .unwrap_or_default()
    }
}

/// Reads the top activity of the most recent running task.
pub struct RunningTasksSource {
    query: Arc<dyn ProcessQuery>,
}

impl RunningTasksSource {
    pub fn new(query: Arc<dyn ProcessQuery>) -> Self {
        Self { query }
    }
}

impl ForegroundSource for RunningTasksSource {
    fn current(&self) -> ProcessId {
        match self.query.query_top_running_task() {
            Ok(id) => id.map(ProcessId::from).unwrap_or_default(),
            Err(e) => {
                debug!(error = %e, "running task query failed");
                ProcessId::unknown()
            }
        }
    }
}

/// Choose the lookup strategy for `level`. The level is fixed for the life
/// of the process, so this is resolved once, at startup.
pub fn select_source(level: PlatformLevel, query: Arc<dyn ProcessQuery>) -> Arc<dyn ForegroundSource> {
    if level.has_usage_stats() {
        info!(level = level.0, "using usage statistics for foreground lookup");
        Arc::new(UsageStatsSource::new(query))
    } else {
        info!(level = level.0, "using running tasks for foreground lookup");
        Arc::new(RunningTasksSource::new(query))
    }
}
