//! Weekly insights over a habit's (or a collection's) log entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::streak::{current_streak_days, longest_streak_days};
use crate::clock::Calendar;
use crate::model::{Habit, HabitEntry};

/// Derived numbers shown for a single habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitInsights {
    pub habit_id: Uuid,
    pub habit_name: String,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    pub weekly_entry_count: usize,
    /// Local hour (0-23) with the most entries this week.
    pub most_consistent_hour: Option<u32>,
    pub total_entries: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InsightsEngine {
    calendar: Calendar,
}

impl InsightsEngine {
    pub fn new(calendar: Calendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Entries logged in the same calendar week as `now`.
    pub fn weekly_entry_count(&self, entries: &[HabitEntry], now: DateTime<Utc>) -> usize {
        self.this_week(entries, now).count()
    }

    /// Hour of day with the most entries this week.
    ///
    /// Ties go to the lowest hour. `None` when nothing was logged this week.
    pub fn most_consistent_hour(&self, entries: &[HabitEntry], now: DateTime<Utc>) -> Option<u32> {
        let mut buckets: BTreeMap<u32, usize> = BTreeMap::new();
        for entry in self.this_week(entries, now) {
            *buckets.entry(self.calendar.hour_of(entry.performed_at)).or_default() += 1;
        }

        // BTreeMap iterates hours ascending; only a strictly larger count replaces the best.
        let mut best: Option<(u32, usize)> = None;
        for (hour, count) in buckets {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((hour, count));
            }
        }
        best.map(|(hour, _)| hour)
    }

    pub fn longest_streak_days(&self, entries: &[HabitEntry]) -> u32 {
        longest_streak_days(entries.iter().map(|e| e.performed_at), &self.calendar)
    }

    pub fn current_streak_days(&self, entries: &[HabitEntry], now: DateTime<Utc>) -> u32 {
        current_streak_days(entries.iter().map(|e| e.performed_at), &self.calendar, now)
    }

    pub fn summary(&self, habit: &Habit, entries: &[HabitEntry], now: DateTime<Utc>) -> HabitInsights {
        HabitInsights {
            habit_id: habit.id,
            habit_name: habit.name.clone(),
            current_streak_days: self.current_streak_days(entries, now),
            longest_streak_days: self.longest_streak_days(entries),
            weekly_entry_count: self.weekly_entry_count(entries, now),
            most_consistent_hour: self.most_consistent_hour(entries, now),
            total_entries: entries.len(),
        }
    }

    fn this_week<'a>(
        &'a self,
        entries: &'a [HabitEntry],
        now: DateTime<Utc>,
    ) -> impl Iterator<Item = &'a HabitEntry> + 'a {
        let week = self.calendar.week_of(now);
        entries
            .iter()
            .filter(move |e| self.calendar.week_of(e.performed_at) == week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    // Wednesday.
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 15, 0, 0).unwrap()
    }

    fn entry_at(at: DateTime<Utc>) -> HabitEntry {
        HabitEntry::new(Uuid::new_v4(), at, 60)
    }

    #[test]
    fn weekly_count_ignores_last_week() {
        let engine = InsightsEngine::new(Calendar::utc());
        let entries = vec![
            entry_at(now()),
            entry_at(now() - Duration::days(2)), // Monday
            entry_at(now() - Duration::days(3)), // previous Sunday
        ];
        assert_eq!(engine.weekly_entry_count(&entries, now()), 2);
    }

    #[test]
    fn most_consistent_hour_picks_busiest_bucket() {
        let engine = InsightsEngine::new(Calendar::utc());
        let monday = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        let entries = vec![
            entry_at(monday + Duration::hours(8)),
            entry_at(monday + Duration::hours(32)),
            entry_at(monday + Duration::hours(14)),
        ];
        assert_eq!(engine.most_consistent_hour(&entries, now()), Some(8));
    }

    #[test]
    fn most_consistent_hour_ties_go_to_lowest_hour() {
        let engine = InsightsEngine::new(Calendar::utc());
        let monday = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        let entries = vec![
            entry_at(monday + Duration::hours(21)),
            entry_at(monday + Duration::hours(6)),
        ];
        assert_eq!(engine.most_consistent_hour(&entries, now()), Some(6));
    }

    #[test]
    fn most_consistent_hour_is_none_for_empty_week() {
        let engine = InsightsEngine::new(Calendar::utc());
        let entries = vec![entry_at(now() - Duration::days(10))];
        assert_eq!(engine.most_consistent_hour(&entries, now()), None);
    }

    #[test]
    fn summary_combines_all_metrics() {
        let engine = InsightsEngine::new(Calendar::utc());
        let habit = Habit::new("Stretch", "🧘");
        let entries: Vec<_> = (0..3)
            .map(|d| HabitEntry::new(habit.id, now() - Duration::days(d), 60))
            .collect();
        let summary = engine.summary(&habit, &entries, now());
        assert_eq!(summary.current_streak_days, 3);
        assert_eq!(summary.longest_streak_days, 3);
        assert_eq!(summary.weekly_entry_count, 3);
        assert_eq!(summary.total_entries, 3);
        assert_eq!(summary.most_consistent_hour, Some(15));
    }
}
