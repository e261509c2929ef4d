//! Friday 17:01 wall-clock trigger

use chrono::{NaiveDate, Weekday};

use crate::world::clock::WallTime;

/// Whether `now` is at or past 17:01 within the 17:00 hour on a Friday
pub fn is_friday_1701(now: &WallTime) -> bool {
    now.weekday == Weekday::Fri && now.hour == 17 && now.minute >= 1
}

/// One-shot-per-date latch
#[derive(Debug, Clone, Default)]
pub struct ScheduleLatch {
    fired_on: Option<NaiveDate>,
}

impl ScheduleLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time the target time is seen on a given date
    pub fn check(&mut self, now: &WallTime) -> bool {
        if !is_friday_1701(now) || self.fired_on == Some(now.date) {
            return false;
        }
        self.fired_on = Some(now.date);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::clock::{FixedClock, WallClock};

    fn at(day: u32, hour: u32, minute: u32) -> WallTime {
        // March 2024: the 15th and 22nd are Fridays
        FixedClock::at(2024, 3, day, hour, minute).unwrap().now()
    }

    #[test]
    fn test_target_window() {
        assert!(!is_friday_1701(&at(15, 17, 0)));
        assert!(is_friday_1701(&at(15, 17, 1)));
        assert!(is_friday_1701(&at(15, 17, 59)));
        assert!(!is_friday_1701(&at(15, 18, 1)));
        assert!(!is_friday_1701(&at(14, 17, 1)));
    }

    #[test]
    fn test_fires_once_per_date() {
        let mut latch = ScheduleLatch::new();
        assert!(latch.check(&at(15, 17, 1)));
        assert!(!latch.check(&at(15, 17, 2)));
        assert!(!latch.check(&at(16, 10, 0)));
        assert!(latch.check(&at(22, 17, 5)));
    }
}
