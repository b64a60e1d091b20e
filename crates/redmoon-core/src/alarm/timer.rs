//! The timer capability the scheduler registers alarms with.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use super::time::Direction;
use crate::error::TimerError;
use crate::platform::PlatformLevel;

/// Delivery guarantee requested for a registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerTier {
    /// Fires at the exact instant even while the device idles.
    ExactAllowWhileIdle,
    /// Fires at the exact instant unless the device idles.
    Exact,
    /// Best-effort; the platform may batch or delay it.
    Inexact,
}

impl TimerTier {
    /// Tiers from strongest to weakest.
    pub const LADDER: [TimerTier; 3] = [
        TimerTier::ExactAllowWhileIdle,
        TimerTier::Exact,
        TimerTier::Inexact,
    ];

    /// Lowest platform level that provides this tier.
    pub fn min_level(self) -> PlatformLevel {
        match self {
            TimerTier::ExactAllowWhileIdle => PlatformLevel::EXACT_IDLE_TIMERS,
            TimerTier::Exact => PlatformLevel::EXACT_TIMERS,
            TimerTier::Inexact => PlatformLevel(0),
        }
    }

    /// Strongest tier `timers` supports, falling back to [`TimerTier::Inexact`].
    pub fn strongest(timers: &dyn TimerService) -> TimerTier {
        Self::LADDER
            .into_iter()
            .find(|tier| timers.supports(*tier))
            .unwrap_or(TimerTier::Inexact)
    }
}

/// Opaque handle for one pending fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationHandle(pub u64);

/// Platform timer service.
///
/// When a registration elapses the platform calls back into
/// [`AlarmScheduler::on_fire`](super::AlarmScheduler::on_fire) with the
/// direction it was registered for.
pub trait TimerService: Send + Sync {
    /// Whether registrations of `tier` are honoured.
    fn supports(&self, tier: TimerTier) -> bool;

    fn register(
        &self,
        at: DateTime<Local>,
        tier: TimerTier,
        direction: Direction,
    ) -> Result<RegistrationHandle, TimerError>;

    /// Cancels a pending registration. Unknown or already-fired handles are
    /// ignored.
    fn cancel(&self, handle: RegistrationHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LevelOnly(PlatformLevel);

    impl TimerService for LevelOnly {
        fn supports(&self, tier: TimerTier) -> bool {
            self.0.at_least(tier.min_level())
        }

        fn register(
            &self,
            _at: DateTime<Local>,
            tier: TimerTier,
            _direction: Direction,
        ) -> Result<RegistrationHandle, TimerError> {
            Err(TimerError::Unsupported(tier))
        }

        fn cancel(&self, _handle: RegistrationHandle) {}
    }

    #[test]
    fn ladder_picks_strongest_available_tier() {
        assert_eq!(
            TimerTier::strongest(&LevelOnly(PlatformLevel(30))),
            TimerTier::ExactAllowWhileIdle
        );
        assert_eq!(TimerTier::strongest(&LevelOnly(PlatformLevel(22))), TimerTier::Exact);
        assert_eq!(TimerTier::strongest(&LevelOnly(PlatformLevel(19))), TimerTier::Exact);
        assert_eq!(TimerTier::strongest(&LevelOnly(PlatformLevel(16))), TimerTier::Inexact);
    }
}
