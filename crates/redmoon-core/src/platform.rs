//! Platform capability levels and the wall clock.
//!
//! The host reports a single integer level at startup. Every capability
//! this crate branches on (usage statistics, exact timers) is derived from
//! it once, so call sites never compare raw numbers.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Capability level reported by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformLevel(pub u32);

impl PlatformLevel {
    /// First level with exact timers.
    pub const EXACT_TIMERS: PlatformLevel = PlatformLevel(19);
    /// First level with usage-statistics queries.
    pub const USAGE_STATS: PlatformLevel = PlatformLevel(21);
    /// First level with exact timers that fire while the device idles.
    pub const EXACT_IDLE_TIMERS: PlatformLevel = PlatformLevel(23);

    /// A level with every capability available.
    pub const LATEST: PlatformLevel = PlatformLevel(34);

    pub fn at_least(self, other: PlatformLevel) -> bool {
        self >= other
    }

    pub fn has_usage_stats(self) -> bool {
        self.at_least(Self::USAGE_STATS)
    }
}

impl Default for PlatformLevel {
    fn default() -> Self {
        Self::LATEST
    }
}

/// Source of "now" for scheduling decisions.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The real local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
