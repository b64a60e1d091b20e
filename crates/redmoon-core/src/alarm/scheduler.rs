//! Daily on/off alarms.
//!
//! The scheduler owns one slot per [`Direction`]. A slot holds the pending
//! registration for that direction, if any, and its mutex is held across
//! the whole cancel-then-register sequence so the two steps never
//! interleave with another operation on the same direction.
//!
//! ```text
//! reschedule(d):  lock(d) -> cancel(old) -> next_occurrence -> register -> unlock
//! on_fire(d):     toggle/fade -> reschedule(d) from the fired instant -> location update
//! ```
//!
//! A fire can be delivered while the wall clock still reads earlier than
//! the registered instant (the clock stepped back after registration).
//! Re-arming counts from whichever is later, so the replacement is always
//! strictly after the instant that fired.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use super::time::{next_occurrence, Direction, DEFAULT_GUARD};
use super::timer::{RegistrationHandle, TimerService, TimerTier};
use crate::command::{FilterService, LocationUpdater, NoLocation};
use crate::error::Result;
use crate::platform::{Clock, SystemClock};
use crate::storage::ConfigSource;

/// A registration the scheduler is currently holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAlarm {
    pub handle: RegistrationHandle,
    pub at: DateTime<Local>,
    pub tier: TimerTier,
}

#[derive(Debug, Default)]
struct Slots {
    on: Mutex<Option<PendingAlarm>>,
    off: Mutex<Option<PendingAlarm>>,
}

/// Keeps at most one pending timer per direction and re-arms after each fire.
pub struct AlarmScheduler {
    config: Arc<dyn ConfigSource>,
    timers: Arc<dyn TimerService>,
    filter: Arc<dyn FilterService>,
    location: Arc<dyn LocationUpdater>,
    clock: Arc<dyn Clock>,
    guard: chrono::Duration,
    slots: Slots,
}

impl AlarmScheduler {
    pub fn new(
        config: Arc<dyn ConfigSource>,
        timers: Arc<dyn TimerService>,
        filter: Arc<dyn FilterService>,
    ) -> Self {
        Self {
            config,
            timers,
            filter,
            location: Arc::new(NoLocation),
            clock: Arc::new(SystemClock),
            guard: DEFAULT_GUARD,
            slots: Slots::default(),
        }
    }

    pub fn with_location(mut self, location: Arc<dyn LocationUpdater>) -> Self {
        self.location = location;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Minimum lead time between "now" and a same-day fire.
    ///
    /// Non-positive values are ignored.
    pub fn with_guard(mut self, guard: chrono::Duration) -> Self {
        if guard > chrono::Duration::zero() {
            self.guard = guard;
        }
        self
    }

    fn slot(&self, direction: Direction) -> MutexGuard<'_, Option<PendingAlarm>> {
        let slot = match direction {
            Direction::On => &self.slots.on,
            Direction::Off => &self.slots.off,
        };
        slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The registration currently pending for `direction`.
    pub fn pending(&self, direction: Direction) -> Option<PendingAlarm> {
        *self.slot(direction)
    }

    /// Register the next occurrence for `direction`.
    ///
    /// Does nothing while automatic toggling is disabled. A registration
    /// already pending for the direction is cancelled first.
    pub fn schedule_next(&self, direction: Direction) -> Result<Option<PendingAlarm>> {
        let mut slot = self.slot(direction);
        self.arm(&mut slot, direction, None)
    }

    /// Cancel the pending registration for `direction`, if any.
    pub fn cancel(&self, direction: Direction) {
        let mut slot = self.slot(direction);
        self.disarm(&mut slot, direction);
    }

    /// Cancel and schedule again, e.g. after the configured time changed.
    pub fn reschedule(&self, direction: Direction) -> Result<Option<PendingAlarm>> {
        let mut slot = self.slot(direction);
        self.disarm(&mut slot, direction);
        self.arm(&mut slot, direction, None)
    }

    pub fn cancel_all(&self) {
        for direction in Direction::ALL {
            self.cancel(direction);
        }
    }

    pub fn schedule_next_on(&self) -> Result<Option<PendingAlarm>> {
        self.schedule_next(Direction::On)
    }

    pub fn schedule_next_off(&self) -> Result<Option<PendingAlarm>> {
        self.schedule_next(Direction::Off)
    }

    pub fn reschedule_on(&self) -> Result<Option<PendingAlarm>> {
        self.reschedule(Direction::On)
    }

    pub fn reschedule_off(&self) -> Result<Option<PendingAlarm>> {
        self.reschedule(Direction::Off)
    }

    /// Called by the timer service when a registration for `direction`
    /// elapses.
    pub fn on_fire(&self, direction: Direction) {
        info!(%direction, "alarm received");
        let config = self.config.snapshot();
        let command = direction.command();
        if config.schedule.use_location {
            self.filter.fade(command);
        } else {
            self.filter.toggle(command);
        }

        {
            let mut slot = self.slot(direction);
            let fired_at = slot.as_ref().map(|pending| pending.at);
            self.disarm(&mut slot, direction);
            if let Err(e) = self.arm(&mut slot, direction, fired_at) {
                warn!(%direction, error = %e, "failed to re-arm alarm");
            }
        }

        self.location.update(false);
    }

    fn disarm(&self, slot: &mut Option<PendingAlarm>, direction: Direction) {
        debug!(%direction, "cancelling alarm");
        if let Some(old) = slot.take() {
            self.timers.cancel(old.handle);
        }
    }

    /// Register the next occurrence counted from the later of now and
    /// `not_before`.
    fn arm(
        &self,
        slot: &mut Option<PendingAlarm>,
        direction: Direction,
        not_before: Option<DateTime<Local>>,
    ) -> Result<Option<PendingAlarm>> {
        let config = self.config.snapshot();
        if !config.schedule.time_toggle {
            info!(%direction, "tried to schedule alarm, but timer is disabled");
            return Ok(None);
        }

        let time = config.schedule.time_for(direction);
        let now = self.clock.now();
        let from = not_before.map_or(now, |t| t.max(now));
        let at = next_occurrence(time, &from, self.guard);
        let tier = TimerTier::strongest(self.timers.as_ref());

        self.disarm(slot, direction);
        let handle = self.timers.register(at, tier, direction)?;
        let alarm = PendingAlarm { handle, at, tier };
        *slot = Some(alarm);

        info!(%direction, at = %at, ?tier, "scheduled alarm");
        Ok(Some(alarm))
    }
}
