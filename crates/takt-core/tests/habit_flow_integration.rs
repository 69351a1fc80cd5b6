//! Integration tests for the habit lifecycle.
//!
//! Drives the `Takt` facade against a real SQLite store: timers and quick
//! logs write entries, and the insight numbers are derived from what was
//! written.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use takt_core::commands::TIMER_SESSION_KEY;
use takt_core::notifications::TracingScheduler;
use takt_core::sink::NoopSink;
use takt_core::{
    parse_deep_link, Calendar, Clock, Database, EventStore, Habit, HabitRef, ManualClock, Outcome, RecommendationEngine,
    Takt, TimerState,
};

fn takt_at(clock: &Arc<ManualClock>) -> Takt<Database> {
    let db = Database::open_memory().unwrap();
    Takt::with_parts(
        db,
        Calendar::utc(),
        clock.clone(),
        Arc::new(NoopSink),
        Arc::new(TracingScheduler),
    )
    .with_recommender(RecommendationEngine::seeded(Calendar::utc(), 42))
}

#[test]
fn test_three_consecutive_days_build_a_streak() {
    // Monday 2024-06-10, 07:30 UTC
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 10, 7, 30, 0).unwrap()));
    let mut takt = takt_at(&clock);
    let habit = Habit::new("Stretch", "🧘").with_duration(60);
    takt.store_mut().insert_habit(&habit).unwrap();

    for day in 0..3 {
        if day > 0 {
            clock.advance(Duration::days(1));
        }
        takt.dispatch(takt_core::Command::StartTimer {
            habit: HabitRef::Id(habit.id),
        })
        .unwrap();
        clock.advance(Duration::seconds(60));
        for _ in 0..60 {
            takt.timer_mut().tick();
        }
        assert_eq!(takt.timer().state(), TimerState::Expired);
        takt.complete_timer().unwrap();
        clock.advance(Duration::seconds(-60));
    }

    let insights = takt.insights(habit.id).unwrap().unwrap();
    assert_eq!(insights.current_streak_days, 3);
    assert_eq!(insights.longest_streak_days, 3);
    assert!(insights.weekly_entry_count >= 3);
    assert_eq!(insights.total_entries, 3);
    assert_eq!(insights.most_consistent_hour, Some(7));
}

#[test]
fn test_gap_resets_current_but_not_longest() {
    let start = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
    let clock = Arc::new(ManualClock::new(start));
    let mut takt = takt_at(&clock);
    let habit = Habit::new("Water", "💧").favorite();
    takt.store_mut().insert_habit(&habit).unwrap();

    // Mon..Wed, skip Thu, then Fri.
    for offset in [0, 1, 2, 4] {
        clock.set(start + Duration::days(offset));
        takt.dispatch(takt_core::Command::QuickLog).unwrap();
    }

    let insights = takt.insights(habit.id).unwrap().unwrap();
    assert_eq!(insights.current_streak_days, 1);
    assert_eq!(insights.longest_streak_days, 3);

    // Two days of silence: the streak is gone.
    clock.advance(Duration::days(2));
    let insights = takt.insights(habit.id).unwrap().unwrap();
    assert_eq!(insights.current_streak_days, 0);
    assert_eq!(insights.longest_streak_days, 3);
}

#[test]
fn test_deep_links_drive_the_timer() {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 12, 14, 0, 0).unwrap()));
    let mut takt = takt_at(&clock);
    let habit = Habit::new("Deep Breathing", "🌬️").with_duration(120);
    takt.store_mut().insert_habit(&habit).unwrap();

    let steps = [
        "takt://start-timer?name=breathing".to_string(),
        "takt://pause?remaining=45".to_string(),
        "takt://resume".to_string(),
        format!("takt://complete?id={}&total=75", habit.id),
    ];
    for link in &steps {
        let command = parse_deep_link(link).unwrap();
        let outcome = takt.dispatch(command).unwrap();
        assert!(matches!(outcome, Outcome::Timer { .. }), "{link} did nothing");
    }

    let entries = takt.store().entries_for_habit(habit.id).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].duration_secs, 75);
    assert_eq!(takt.timer().state(), TimerState::Idle);
}

#[test]
fn test_complete_for_other_habit_is_ignored() {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 12, 14, 0, 0).unwrap()));
    let mut takt = takt_at(&clock);
    let active = Habit::new("Walk", "🚶");
    let other = Habit::new("Read", "📖");
    takt.store_mut().insert_habit(&active).unwrap();
    takt.store_mut().insert_habit(&other).unwrap();

    takt.start_timer(&active, None);
    let link = format!("takt://complete?id={}", other.id);
    let outcome = takt.dispatch(parse_deep_link(&link).unwrap()).unwrap();
    assert_eq!(outcome, Outcome::NoOp);
    assert_eq!(takt.timer().active_habit_id(), Some(active.id));
    assert!(takt.store().all_entries().unwrap().is_empty());
}

#[test]
fn test_archived_habit_keeps_history_but_is_not_recommended() {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 12, 14, 0, 0).unwrap()));
    let mut takt = takt_at(&clock);
    let mut habit = Habit::new("Journal", "📝").favorite();
    takt.store_mut().insert_habit(&habit).unwrap();
    takt.log_habit(habit.id).unwrap();

    habit.archive(clock.now());
    takt.store_mut().update_habit(&habit).unwrap();

    assert!(takt.recommend().unwrap().is_none());
    assert_eq!(takt.store().entries_for_habit(habit.id).unwrap().len(), 1);
    assert_eq!(takt.dispatch(takt_core::Command::QuickLog).unwrap(), Outcome::NoOp);
}

#[test]
fn test_expired_session_restores_as_expired() {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 12, 14, 0, 0).unwrap()));
    let mut takt = takt_at(&clock);
    let habit = Habit::new("Plank", "💪").with_duration(30);
    takt.store_mut().insert_habit(&habit).unwrap();

    takt.start_timer(&habit, None);
    takt.save_sessions().unwrap();
    assert!(takt.store().kv_get(TIMER_SESSION_KEY).unwrap().is_some());

    let db = takt.into_store();
    clock.advance(Duration::minutes(5));
    let mut restored = Takt::with_parts(
        db,
        Calendar::utc(),
        clock.clone(),
        Arc::new(NoopSink),
        Arc::new(TracingScheduler),
    );
    restored.restore_sessions().unwrap();
    assert_eq!(restored.timer().state(), TimerState::Expired);

    restored.complete_timer().unwrap();
    let entries = restored.store().entries_for_habit(habit.id).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].duration_secs, 30);
}
