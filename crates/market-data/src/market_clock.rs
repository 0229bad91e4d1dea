//! US equity market hours.
//!
//! Regular session only: Monday to Friday, 09:30 to 16:00 New York time.
//! Exchange holidays and early closes are not modelled, so the clock reports
//! "open" on those days.

use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

/// Exchange session window and the refresh cadence derived from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketClock {
    pub timezone: Tz,
    /// Session open, inclusive.
    pub open_time: NaiveTime,
    /// Session close, exclusive.
    pub close_time: NaiveTime,
    pub open_interval: Duration,
    pub closed_interval: Duration,
}

impl Default for MarketClock {
    fn default() -> Self {
        Self {
            timezone: New_York,
            open_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default(),
            close_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            open_interval: Duration::from_secs(30),
            closed_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl MarketClock {
    /// NYSE regular session with the given refresh cadence.
    pub fn new(open_interval: Duration, closed_interval: Duration) -> Self {
        Self {
            open_interval,
            closed_interval,
            ..Self::default()
        }
    }

    /// Whether the regular session is in progress at `now`.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.timezone);

        match local.weekday() {
            Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu | Weekday::Fri => {}
            Weekday::Sat | Weekday::Sun => return false,
        }

        let time = local.time();
        time >= self.open_time && time < self.close_time
    }

    pub fn is_open_now(&self) -> bool {
        self.is_open(Utc::now())
    }

    /// Delay until the next refresh cycle.
    pub fn refresh_interval(&self, now: DateTime<Utc>) -> Duration {
        if self.is_open(now) {
            self.open_interval
        } else {
            self.closed_interval
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_york(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        New_York
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_wednesday_morning_is_open() {
        // 2024-06-19 is a Wednesday
        let clock = MarketClock::default();
        assert!(clock.is_open(new_york(2024, 6, 19, 10, 0)));
    }

    #[test]
    fn test_saturday_is_closed() {
        let clock = MarketClock::default();
        assert!(!clock.is_open(new_york(2024, 6, 22, 10, 0)));
        assert!(!clock.is_open(new_york(2024, 6, 23, 12, 0)));
    }

    #[test]
    fn test_after_close_is_closed() {
        let clock = MarketClock::default();
        assert!(!clock.is_open(new_york(2024, 6, 19, 17, 0)));
    }

    #[test]
    fn test_session_boundaries() {
        let clock = MarketClock::default();
        assert!(!clock.is_open(new_york(2024, 6, 19, 9, 29)));
        assert!(clock.is_open(new_york(2024, 6, 19, 9, 30)));
        assert!(clock.is_open(new_york(2024, 6, 19, 15, 59)));
        assert!(!clock.is_open(new_york(2024, 6, 19, 16, 0)));
    }

    #[test]
    fn test_uses_exchange_time_zone_in_winter() {
        // 14:45 UTC in January is 09:45 EST
        let clock = MarketClock::default();
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 14, 45, 0).unwrap();
        assert!(clock.is_open(now));
        // 14:15 UTC is 09:15 EST
        let early = Utc.with_ymd_and_hms(2024, 1, 10, 14, 15, 0).unwrap();
        assert!(!clock.is_open(early));
    }

    #[test]
    fn test_refresh_interval() {
        let clock = MarketClock::default();
        assert_eq!(
            clock.refresh_interval(new_york(2024, 6, 19, 10, 0)),
            Duration::from_secs(30)
        );
        assert_eq!(
            clock.refresh_interval(new_york(2024, 6, 22, 10, 0)),
            Duration::from_secs(300)
        );
    }
}
