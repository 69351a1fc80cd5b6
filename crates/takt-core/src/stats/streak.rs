//! Consecutive-day streaks over logged timestamps.
//!
//! Two flavours:
//! - **current**: anchored to today, walking backwards one calendar day at a
//!   time. A single missed day ends the walk; there is no grace day, and a
//!   history whose latest day is yesterday has a current streak of zero.
//! - **longest**: the longest run of consecutive calendar days anywhere in
//!   the history, regardless of today.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::clock::Calendar;
use crate::model::HabitEntry;

/// Number of consecutive days, ending today, that contain at least one event.
pub fn current_streak_days<I>(timestamps: I, calendar: &Calendar, now: DateTime<Utc>) -> u32
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let days = distinct_days(timestamps, calendar);
    if days.is_empty() {
        return 0;
    }

    let mut streak = 0;
    let mut cursor = calendar.day_of(now);
    for day in days.iter().rev() {
        // Any mismatch stops the walk, a future-dated day included.
        if *day != cursor {
            break;
        }
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

/// Longest run of consecutive calendar days in the whole history.
pub fn longest_streak_days<I>(timestamps: I, calendar: &Calendar) -> u32
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let days = distinct_days(timestamps, calendar);
    let mut iter = days.iter();
    let Some(mut prev) = iter.next() else {
        return 0;
    };

    let mut best = 1;
    let mut current = 1;
    for day in iter {
        if *prev + Duration::days(1) == *day {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
        prev = day;
    }
    best
}

pub fn current_streak_for_entries(
    entries: &[HabitEntry],
    calendar: &Calendar,
    now: DateTime<Utc>,
) -> u32 {
    current_streak_days(entries.iter().map(|e| e.performed_at), calendar, now)
}

fn distinct_days<I>(timestamps: I, calendar: &Calendar) -> BTreeSet<NaiveDate>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    timestamps.into_iter().map(|t| calendar.day_of(t)).collect()
}
