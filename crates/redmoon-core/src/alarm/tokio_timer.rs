//! A [`TimerService`] backed by tokio tasks.
//!
//! Each registration is a task that sleeps until its instant and then
//! reports a [`Fired`] on an unbounded channel. Sleeps run on the monotonic
//! clock, so the task re-checks the wall clock on waking and sleeps again
//! if it still reads earlier than the instant. [`run_alarm_dispatch`]
//! drains that channel on a single task, so fires for a direction are
//! handled one at a time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::scheduler::AlarmScheduler;
use super::time::Direction;
use super::timer::{RegistrationHandle, TimerService, TimerTier};
use crate::error::TimerError;
use crate::platform::{Clock, PlatformLevel, SystemClock};

/// A registration that reached its instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub handle: RegistrationHandle,
    pub direction: Direction,
    pub at: DateTime<Local>,
}

type TaskMap = Arc<Mutex<HashMap<RegistrationHandle, JoinHandle<()>>>>;

pub struct TokioTimerService {
    level: PlatformLevel,
    clock: Arc<dyn Clock>,
    fired_tx: mpsc::UnboundedSender<Fired>,
    runtime: Option<tokio::runtime::Handle>,
    next_id: AtomicU64,
    tasks: TaskMap,
}

impl TokioTimerService {
    /// Create a service on the current tokio runtime.
    ///
    /// Returns the receiving half of the fire channel alongside it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Fired>) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let service = Self {
            level: PlatformLevel::default(),
            clock: Arc::new(SystemClock),
            fired_tx,
            runtime: tokio::runtime::Handle::try_current().ok(),
            next_id: AtomicU64::new(1),
            tasks: Arc::default(),
        };
        (service, fired_rx)
    }

    /// Restrict the tiers offered to those available at `level`.
    pub fn with_level(mut self, level: PlatformLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Number of registrations that have neither fired nor been cancelled.
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl TimerService for TokioTimerService {
    fn supports(&self, tier: TimerTier) -> bool {
        self.level.at_least(tier.min_level())
    }

    fn register(
        &self,
        at: DateTime<Local>,
        tier: TimerTier,
        direction: Direction,
    ) -> Result<RegistrationHandle, TimerError> {
        if !self.supports(tier) {
            return Err(TimerError::Unsupported(tier));
        }
        if self.fired_tx.is_closed() {
            return Err(TimerError::ServiceClosed);
        }
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| TimerError::Rejected("no tokio runtime".into()))?;

        let handle = RegistrationHandle(self.next_id.fetch_add(1, Ordering::Relaxed));

        // Held across spawn so the task cannot remove itself before it is
        // inserted.
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let task_map = Arc::clone(&self.tasks);
        let fired_tx = self.fired_tx.clone();
        let clock = Arc::clone(&self.clock);
        let task = runtime.spawn(async move {
            loop {
                // Negative remainders fail to convert and become zero.
                let remaining = (at - clock.now()).to_std().unwrap_or_default();
                if remaining.is_zero() {
                    break;
                }
                tokio::time::sleep(remaining).await;
            }
            task_map
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&handle);
            debug!(?handle, %direction, "timer elapsed");
            let _ = fired_tx.send(Fired {
                handle,
                direction,
                at,
            });
        });
        tasks.insert(handle, task);
        Ok(handle)
    }

    fn cancel(&self, handle: RegistrationHandle) {
        let task = self
            .tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&handle);
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Drop for TokioTimerService {
    fn drop(&mut self) {
        let tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        for task in tasks.values() {
            task.abort();
        }
    }
}

/// Feeds fires into `scheduler` until `cancel` is triggered or every
/// sender is gone.
///
/// A fire whose handle no longer matches the pending registration for its
/// direction was cancelled after it elapsed and is dropped.
pub async fn run_alarm_dispatch(
    scheduler: Arc<AlarmScheduler>,
    mut fired_rx: mpsc::UnboundedReceiver<Fired>,
    cancel: CancellationToken,
) {
    info!("alarm dispatch started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("alarm dispatch cancelled");
                break;
            }
            fired = fired_rx.recv() => {
                let Some(fired) = fired else {
                    info!("timer service closed, alarm dispatch exiting");
                    break;
                };
                let current = scheduler.pending(fired.direction).map(|p| p.handle);
                if current != Some(fired.handle) {
                    debug!(?fired, "ignoring stale fire");
                    continue;
                }
                scheduler.on_fire(fired.direction);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::TimeOfDay;
    use crate::command::{Command, FilterService};
    use crate::storage::{Config, SharedConfig};
    use chrono::TimeZone;
    use std::time::Duration;

    /// Wall clock that advances with tokio's (paused) clock and can be
    /// stepped like a system clock being corrected.
    struct VirtualClock {
        origin: DateTime<Local>,
        start: tokio::time::Instant,
        step: Mutex<chrono::Duration>,
    }

    impl VirtualClock {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                origin: Local.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap(),
                start: tokio::time::Instant::now(),
                step: Mutex::new(chrono::Duration::zero()),
            })
        }

        fn step(&self, by: chrono::Duration) {
            let mut step = self.step.lock().unwrap();
            *step = *step + by;
        }
    }

    impl Clock for VirtualClock {
        fn now(&self) -> DateTime<Local> {
            let elapsed = chrono::Duration::from_std(self.start.elapsed()).unwrap();
            self.origin + elapsed + *self.step.lock().unwrap()
        }
    }

    fn service(clock: &Arc<VirtualClock>) -> (TokioTimerService, mpsc::UnboundedReceiver<Fired>) {
        let (timers, rx) = TokioTimerService::new();
        (timers.with_clock(clock.clone()), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_fire_after_delay() {
        let clock = VirtualClock::new();
        let (timers, mut rx) = service(&clock);
        let at = clock.now() + chrono::Duration::seconds(30);
        let handle = timers
            .register(at, TimerTier::Exact, Direction::On)
            .unwrap();
        assert_eq!(timers.pending_count(), 1);

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired.handle, handle);
        assert_eq!(fired.direction, Direction::On);
        assert_eq!(fired.at, at);
        assert!(clock.now() >= at);
        assert_eq!(timers.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn backward_clock_step_delays_the_fire() {
        let clock = VirtualClock::new();
        let (timers, mut rx) = service(&clock);
        let at = clock.now() + chrono::Duration::minutes(2);
        timers
            .register(at, TimerTier::Exact, Direction::Off)
            .unwrap();
        clock.step(chrono::Duration::seconds(-30));

        let started = tokio::time::Instant::now();
        let fired = rx.recv().await.unwrap();
        // Two minutes of sleep, then the 30 s the wall clock lost.
        assert!(started.elapsed() >= Duration::from_secs(150));
        assert!(started.elapsed() < Duration::from_secs(151));
        assert!(clock.now() >= fired.at);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_registration_never_fires() {
        let clock = VirtualClock::new();
        let (timers, mut rx) = service(&clock);
        let handle = timers
            .register(
                clock.now() + chrono::Duration::seconds(5),
                TimerTier::Exact,
                Direction::Off,
            )
            .unwrap();
        timers.cancel(handle);
        timers.cancel(handle);
        assert_eq!(timers.pending_count(), 0);

        let waited = tokio::time::timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(waited.is_err(), "cancelled timer fired");
    }

    #[tokio::test]
    async fn unsupported_tier_is_rejected() {
        let (timers, _rx) = TokioTimerService::new();
        let timers = timers.with_level(PlatformLevel(20));
        assert!(timers.supports(TimerTier::Exact));
        assert_eq!(
            timers.register(Local::now(), TimerTier::ExactAllowWhileIdle, Direction::On),
            Err(TimerError::Unsupported(TimerTier::ExactAllowWhileIdle))
        );
        assert_eq!(TimerTier::strongest(&timers), TimerTier::Exact);
    }

    #[tokio::test]
    async fn closed_channel_is_reported() {
        let (timers, rx) = TokioTimerService::new();
        drop(rx);
        assert_eq!(
            timers.register(Local::now(), TimerTier::Inexact, Direction::On),
            Err(TimerError::ServiceClosed)
        );
    }

    struct ChannelFilter(mpsc::UnboundedSender<Command>);

    impl FilterService for ChannelFilter {
        fn toggle(&self, command: Command) {
            let _ = self.0.send(command);
        }

        fn fade(&self, command: Command) {
            let _ = self.0.send(command);
        }
    }

    fn scheduler_with(
        timers: Arc<TokioTimerService>,
        clock: Arc<VirtualClock>,
        turn_off_time: TimeOfDay,
    ) -> (Arc<AlarmScheduler>, mpsc::UnboundedReceiver<Command>) {
        let (filter_tx, filter_rx) = mpsc::unbounded_channel();
        let mut cfg = Config::default();
        cfg.schedule.time_toggle = true;
        cfg.schedule.turn_off_time = turn_off_time;
        let scheduler = Arc::new(
            AlarmScheduler::new(
                Arc::new(SharedConfig::new(cfg)),
                timers,
                Arc::new(ChannelFilter(filter_tx)),
            )
            .with_clock(clock),
        );
        (scheduler, filter_rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Command>) -> Vec<Command> {
        let mut out = Vec::new();
        while let Ok(c) = rx.try_recv() {
            out.push(c);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_fires_and_rearms() {
        let clock = VirtualClock::new();
        let (timers, fired_rx) = service(&clock);
        let timers = Arc::new(timers);
        let time = TimeOfDay::new(12, 2).unwrap();
        let (scheduler, mut filter_rx) = scheduler_with(timers.clone(), clock.clone(), time);

        let first = scheduler.schedule_next(Direction::Off).unwrap().unwrap();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_alarm_dispatch(
            scheduler.clone(),
            fired_rx,
            cancel.clone(),
        ));

        assert_eq!(filter_rx.recv().await, Some(Command::TurnOff));
        let rearmed = scheduler.pending(Direction::Off).unwrap();
        assert_ne!(rearmed.handle, first.handle);
        assert_eq!(rearmed.at, first.at + chrono::Duration::days(1));
        assert_eq!(timers.pending_count(), 1);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn clock_stepped_back_fires_once_and_rearms_a_day_later() {
        let clock = VirtualClock::new();
        let (timers, fired_rx) = service(&clock);
        let timers = Arc::new(timers);
        let time = TimeOfDay::new(12, 2).unwrap();
        let (scheduler, mut filter_rx) = scheduler_with(timers.clone(), clock.clone(), time);

        let first = scheduler.schedule_next(Direction::Off).unwrap().unwrap();
        clock.step(chrono::Duration::seconds(-30));

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_alarm_dispatch(
            scheduler.clone(),
            fired_rx,
            cancel.clone(),
        ));
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(drain(&mut filter_rx), vec![Command::TurnOff]);
        let rearmed = scheduler.pending(Direction::Off).unwrap();
        assert!(rearmed.at > first.at);
        assert_eq!(rearmed.at, first.at + chrono::Duration::days(1));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_drops_stale_fires() {
        let clock = VirtualClock::new();
        let (timers, fired_rx) = service(&clock);
        let timers = Arc::new(timers);
        let (scheduler, mut filter_rx) =
            scheduler_with(timers.clone(), clock.clone(), TimeOfDay::MIDNIGHT);

        // Registered behind the scheduler's back, so the slot never owns it.
        timers
            .register(clock.now(), TimerTier::Exact, Direction::Off)
            .unwrap();

        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_alarm_dispatch(scheduler.clone(), fired_rx, cancel.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(filter_rx.try_recv().is_err());
        assert!(scheduler.pending(Direction::Off).is_none());

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }
}
