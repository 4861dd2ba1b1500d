// Daily trigger times

use chrono::{Duration as ChronoDuration, NaiveDateTime, NaiveTime};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::errors::ReservationError;

/// A wall-clock time of day at which booking fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerTime {
    hour: u32,
    minute: u32,
}

impl TriggerTime {
    /// `None` unless 0 ≤ hour < 24 and 0 ≤ minute < 60
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for TriggerTime {
    type Err = ReservationError;

    /// Parse `H:MM` / `HH:MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ReservationError::Config(format!("invalid trigger time '{}'", s.trim()));

        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour: u32 = hour.trim().parse().map_err(|_| invalid())?;
        let minute: u32 = minute.trim().parse().map_err(|_| invalid())?;
        TriggerTime::new(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for TriggerTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Default trigger when none is configured
pub const DEFAULT_TRIGGER: TriggerTime = TriggerTime { hour: 5, minute: 0 };

/// Ordered set of daily trigger times (never empty)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    times: BTreeSet<TriggerTime>,
}

impl ScheduleConfig {
    /// An empty set falls back to 05:00
    pub fn new(times: impl IntoIterator<Item = TriggerTime>) -> Self {
        let mut times: BTreeSet<TriggerTime> = times.into_iter().collect();
        if times.is_empty() {
            times.insert(DEFAULT_TRIGGER);
        }
        Self { times }
    }

    /// Parse a comma-separated `HH:MM` list.
    ///
    /// Malformed entries are dropped with a warning. A blank list yields the
    /// default trigger; a list where every entry is malformed is an error.
    pub fn parse_list(list: &str) -> Result<Self, ReservationError> {
        let entries: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .collect();

        let mut times = BTreeSet::new();
        for entry in &entries {
            match entry.parse::<TriggerTime>() {
                Ok(time) => {
                    times.insert(time);
                }
                Err(e) => warn!("Dropping trigger entry: {}", e),
            }
        }

        if !entries.is_empty() && times.is_empty() {
            return Err(ReservationError::Config(format!(
                "no valid trigger time in '{}'",
                list
            )));
        }

        Ok(Self::new(times))
    }

    pub fn times(&self) -> impl Iterator<Item = &TriggerTime> {
        self.times.iter()
    }

    /// Earliest configured occurrence strictly after `now`, today or tomorrow
    pub fn next_trigger(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        self.times
            .iter()
            .map(|t| today.and_time(t.time()))
            .find(|at| *at > now)
            .unwrap_or_else(|| {
                let first = self.times.iter().next().copied().unwrap_or(DEFAULT_TRIGGER);
                (today + ChronoDuration::days(1)).and_time(first.time())
            })
    }

    /// The next `count` triggers after `now`, in order
    pub fn upcoming(&self, now: NaiveDateTime, count: usize) -> Vec<NaiveDateTime> {
        let mut at = now;
        (0..count)
            .map(|_| {
                at = self.next_trigger(at);
                at
            })
            .collect()
    }
}

impl fmt::Display for ScheduleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let times: Vec<String> = self.times.iter().map(|t| t.to_string()).collect();
        f.write_str(&times.join(", "))
    }
}
