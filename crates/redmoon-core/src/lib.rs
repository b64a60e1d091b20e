//! # Red Moon Core Library
//!
//! Runtime scheduling for the Red Moon screen filter. The overlay itself,
//! the platform services and the UI live outside this crate and are reached
//! through small traits, so everything here runs (and is tested) without a
//! device.
//!
//! ## Architecture
//!
//! - **Foreground monitor**: a cancellable polling loop that looks up the
//!   foreground app once a second and tells the filter to suspend over
//!   installers and superuser prompts, resuming for everything else
//! - **Alarm scheduler**: two self re-arming daily alarms that turn the
//!   filter on and off at configured times
//! - **Storage**: TOML configuration, re-read on every scheduling decision
//!
//! ## Key Components
//!
//! - [`ForegroundMonitor`]: the polling loop
//! - [`AlarmScheduler`]: per-direction timer ownership
//! - [`TokioTimerService`]: a timer service for hosts running tokio
//! - [`Config`]: application configuration

pub mod alarm;
pub mod command;
pub mod error;
pub mod monitor;
pub mod platform;
pub mod storage;

pub use alarm::{
    run_alarm_dispatch, AlarmScheduler, Direction, PendingAlarm, TimeOfDay, TimerService,
    TimerTier, TokioTimerService,
};
pub use command::{Command, CommandSink, FilterService, LocationUpdater, NoLocation};
pub use error::{ConfigError, CoreError, QueryError, Result, TimerError};
pub use monitor::{
    AppClass, ClassificationPolicy, ForegroundMonitor, ForegroundSource, MonitorHandle,
    MonitorState, ProcessId, ProcessQuery,
};
pub use platform::{Clock, ManualClock, PlatformLevel, SystemClock};
pub use storage::{Config, ConfigSource, FileConfig, SharedConfig};
