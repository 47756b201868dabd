//! Wall-clock access
//!
//! Calendar rules (today's date, week start, greeting) use the device's
//! local time. Tests pin the clock with [`FixedClock`].

use chrono::{DateTime, Duration, Local, NaiveDate, Timelike, Utc};
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Today's date in local time
    fn today(&self) -> NaiveDate;

    /// Current local hour, 0-23
    fn local_hour(&self) -> u32;
}

/// The real clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn local_hour(&self) -> u32 {
        Local::now().hour()
    }
}

/// A clock that only moves when told to. Local time is taken to be UTC.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // a poisoned guard still holds a valid timestamp
        self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }

    fn today(&self) -> NaiveDate {
        self.lock().date_naive()
    }

    fn local_hour(&self) -> u32 {
        self.lock().hour()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_advances() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 3, 10, 23, 30, 0).unwrap());
        assert_eq!(clock.local_hour(), 23);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());

        clock.advance(Duration::minutes(45));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
        assert_eq!(clock.local_hour(), 0);
    }
}
