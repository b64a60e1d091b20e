//! Foreground app monitoring ("secure suspend").
//!
//! Suspends the filter while an installer, superuser prompt or similar
//! app is in front, and resumes it for everything else.

mod classify;
mod engine;
mod source;

pub use classify::{classify, AppClass, ClassificationPolicy, ProcessId, OWN_APPS, SUSPEND_APPS};
pub use engine::{
    is_monitoring_functional, ForegroundMonitor, MonitorHandle, MonitorState,
    DEFAULT_POLL_INTERVAL,
};
pub use source::{
    select_source, ForegroundSource, ProcessQuery, RunningTasksSource, UsageRecord,
    UsageStatsSource, USAGE_WINDOW_SECS,
};
