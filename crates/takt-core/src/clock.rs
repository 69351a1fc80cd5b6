//! Time source and calendar arithmetic.
//!
//! Engines never call `Utc::now()` directly; they ask a [`Clock`] so tests can
//! pin "now". Calendar-day questions (start of day, hour of day, same week) go
//! through [`Calendar`], which carries the user's time zone and first weekday.
//! Each timestamp is converted with the offset in force at that instant, so
//! history recorded before a DST change keeps its local day and hour.

use std::sync::Mutex;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Time zone a [`Calendar`] converts through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// The machine's zone, DST rules included.
    Local,
    /// An IANA zone such as `Europe/Berlin`.
    Named(Tz),
    /// One offset for every instant.
    Fixed(FixedOffset),
}

/// Calendar used to bucket timestamps into local days, hours and weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    pub zone: Zone,
    pub week_start: Weekday,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::local()
    }
}

impl Calendar {
    /// Machine time zone, weeks starting Monday.
    pub fn local() -> Self {
        Self {
            zone: Zone::Local,
            week_start: Weekday::Mon,
        }
    }

    pub fn utc() -> Self {
        Self::in_zone(Zone::Fixed(Utc.fix()))
    }

    pub fn in_zone(zone: Zone) -> Self {
        Self {
            zone,
            week_start: Weekday::Mon,
        }
    }

    /// Calendar for an IANA zone name, `None` if the name is unknown.
    pub fn named(name: &str) -> Option<Self> {
        name.parse::<Tz>().ok().map(|tz| Self::in_zone(Zone::Named(tz)))
    }

    /// Calendar with a fixed offset east of UTC, in minutes.
    ///
    /// Out-of-range offsets fall back to UTC.
    pub fn with_offset_minutes(minutes: i32) -> Self {
        let offset = FixedOffset::east_opt(minutes.saturating_mul(60)).unwrap_or(Utc.fix());
        Self::in_zone(Zone::Fixed(offset))
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    /// Wall-clock time at `at`, using the offset in force at that instant.
    pub fn local_time(&self, at: DateTime<Utc>) -> NaiveDateTime {
        match self.zone {
            Zone::Local => at.with_timezone(&Local).naive_local(),
            Zone::Named(tz) => at.with_timezone(&tz).naive_local(),
            Zone::Fixed(offset) => at.with_timezone(&offset).naive_local(),
        }
    }

    /// Local calendar day containing `at`.
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        self.local_time(at).date()
    }

    /// Local hour of day (0-23).
    pub fn hour_of(&self, at: DateTime<Utc>) -> u32 {
        self.local_time(at).hour()
    }

    /// First day of the week containing `at`.
    pub fn week_of(&self, at: DateTime<Utc>) -> NaiveDate {
        let day = self.day_of(at);
        let back = (7 + day.weekday().num_days_from_monday()
            - self.week_start.num_days_from_monday())
            % 7;
        day - Duration::days(i64::from(back))
    }

    pub fn same_week(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.week_of(a) == self.week_of(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_of_respects_offset() {
        // 23:30 UTC is already the next day in UTC+2.
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        let cal = Calendar::with_offset_minutes(120);
        assert_eq!(cal.day_of(at), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(cal.hour_of(at), 1);
    }

    #[test]
    fn week_boundaries_follow_week_start() {
        // 2024-03-10 is a Sunday.
        let sunday = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let monday = Utc.with_ymd_and_hms(2024, 3, 11, 12, 0, 0).unwrap();

        let iso = Calendar::utc();
        assert!(!iso.same_week(sunday, monday));

        let us = Calendar::utc().with_week_start(Weekday::Sun);
        assert!(us.same_week(sunday, monday));
        assert_eq!(us.week_of(monday), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn named_zone_follows_dst() {
        // Europe/Berlin leaves summer time at 03:00 on 2024-10-27.
        let cal = Calendar::named("Europe/Berlin").unwrap();
        let summer = Utc.with_ymd_and_hms(2024, 10, 25, 22, 30, 0).unwrap();
        let winter = Utc.with_ymd_and_hms(2024, 10, 27, 23, 30, 0).unwrap();

        assert_eq!(cal.day_of(summer), NaiveDate::from_ymd_opt(2024, 10, 26).unwrap());
        assert_eq!(cal.hour_of(summer), 0);
        assert_eq!(cal.day_of(winter), NaiveDate::from_ymd_opt(2024, 10, 28).unwrap());
        assert_eq!(cal.hour_of(winter), 0);
    }

    #[test]
    fn unknown_zone_name_is_rejected() {
        assert!(Calendar::named("Mars/Olympus_Mons").is_none());
    }

    #[test]
    fn manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now(), start + Duration::minutes(90));
    }
}
