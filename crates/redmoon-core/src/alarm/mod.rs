//! Daily alarms that switch the filter on and off.
//!
//! - [`time`]: `HH:MM` times and next-occurrence computation
//! - [`timer`]: the platform timer capability and its tier ladder
//! - [`scheduler`]: per-direction registration ownership and re-arming
//! - [`tokio_timer`]: a tokio-backed timer service and fire dispatcher

mod scheduler;
mod time;
mod timer;
mod tokio_timer;

pub use scheduler::{AlarmScheduler, PendingAlarm};
pub use time::{next_occurrence, Direction, TimeOfDay, DEFAULT_GUARD};
pub use timer::{RegistrationHandle, TimerService, TimerTier};
pub use tokio_timer::{run_alarm_dispatch, Fired, TokioTimerService};
