//! Times of day and next-occurrence computation.

use chrono::{DateTime, Days, LocalResult, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::command::Command;

/// Which of the two daily alarms an operation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    On,
    Off,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::On, Direction::Off];

    /// The filter command issued when this alarm fires.
    pub fn command(self) -> Command {
        match self {
            Direction::On => Command::TurnOn,
            Direction::Off => Command::TurnOff,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::On => "on",
            Direction::Off => "off",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(Direction::On),
            "off" => Ok(Direction::Off),
            other => Err(format!("unknown direction '{other}', expected 'on' or 'off'")),
        }
    }
}

/// A wall-clock time of day with minute precision, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay { hour: 0, minute: 0 };

    /// Returns `None` when the hour or minute is out of range.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(self) -> u8 {
        self.hour
    }

    pub fn minute(self) -> u8 {
        self.minute
    }

    pub fn to_naive(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("invalid time '{s}', expected HH:MM"))?;
        let hour: u8 = h
            .parse()
            .map_err(|_| format!("invalid hour in '{s}'"))?;
        let minute: u8 = m
            .parse()
            .map_err(|_| format!("invalid minute in '{s}'"))?;
        Self::new(hour, minute).ok_or_else(|| format!("time '{s}' out of range"))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Lead time a same-day occurrence must clear before it is used.
pub const DEFAULT_GUARD: chrono::Duration = chrono::Duration::seconds(1);

/// Next instant at `time` that is strictly after `now + guard`.
///
/// Today's occurrence is used when it clears the guard, otherwise the same
/// time on the following calendar day. `guard` must be positive so an alarm
/// re-armed from inside its own fire never lands on the same day again.
pub fn next_occurrence<Tz: TimeZone>(
    time: TimeOfDay,
    now: &DateTime<Tz>,
    guard: chrono::Duration,
) -> DateTime<Tz> {
    let tz = now.timezone();
    let date = now.date_naive();
    let today = resolve_local(&tz, date.and_time(time.to_naive()));
    if today > now.clone() + guard {
        return today;
    }
    let tomorrow = date.checked_add_days(Days::new(1)).unwrap_or(date);
    resolve_local(&tz, tomorrow.and_time(time.to_naive()))
}

/// Maps a local wall-clock time onto the timezone, skipping forward over
/// DST gaps and taking the earlier instant when the time repeats.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz
            .from_local_datetime(&(naive + chrono::Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(&naive)),
    }
}
