//! Wall-clock access for schedule-driven events

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, Timelike, Weekday};

/// Calendar reading the schedule detector cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallTime {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub hour: u32,
    pub minute: u32,
}

impl WallTime {
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        Self {
            date: dt.date(),
            weekday: dt.weekday(),
            hour: dt.hour(),
            minute: dt.minute(),
        }
    }

    /// "HH:MM" for log entries
    pub fn stamp(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

pub trait WallClock {
    fn now(&self) -> WallTime;
}

/// Local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> WallTime {
        WallTime::from_datetime(Local::now().naive_local())
    }
}

/// Frozen clock for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    time: NaiveDateTime,
}

impl FixedClock {
    pub fn new(time: NaiveDateTime) -> Self {
        Self { time }
    }

    /// `None` for an impossible date or time
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, 0))
            .map(Self::new)
    }
}

impl WallClock for FixedClock {
    fn now(&self) -> WallTime {
        WallTime::from_datetime(self.time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_reading() {
        // 2024-03-15 was a Friday
        let clock = FixedClock::at(2024, 3, 15, 17, 1).unwrap();
        let now = clock.now();
        assert_eq!(now.weekday, Weekday::Fri);
        assert_eq!((now.hour, now.minute), (17, 1));
        assert_eq!(now.stamp(), "17:01");
    }

    #[test]
    fn test_invalid_fixed_clock() {
        assert!(FixedClock::at(2024, 2, 30, 10, 0).is_none());
    }
}
