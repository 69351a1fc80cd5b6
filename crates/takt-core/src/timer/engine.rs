//! Single-habit countdown engine.
//!
//! The engine is a plain state machine. It does not own a thread or task;
//! something else (the [`Ticker`](super::Ticker), a UI loop, a test) calls
//! `tick()` once per second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |            |
//!           v            |
//!        Expired         |
//!           |            |
//!           +--> complete_and_log / cancel --> Idle
//! ```
//!
//! Reaching zero moves to `Expired` but writes nothing: the host must call
//! `complete_and_log` to record the entry, or `cancel` to drop it.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(sink, clock);
//! engine.start(&habit, habit.default_duration_secs);
//! // once per second:
//! engine.tick();
//! // when the user confirms:
//! engine.complete_and_log(&mut store)?;
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::events::Event;
use crate::model::{Habit, HabitEntry};
use crate::sink::{NoopSink, ProgressSink};
use crate::storage::{record_entry, EventStore};

/// Shortest countdown a session will run, in seconds.
pub const MIN_TIMER_SECS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    /// Countdown reached zero; waiting for the host to log or discard it.
    Expired,
}

/// The live countdown. Serializable so a host can keep it across restarts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSession {
    pub habit_id: Uuid,
    pub habit_name: String,
    #[serde(default)]
    pub emoji: Option<String>,
    pub total_secs: u32,
    pub remaining_secs: u32,
    pub is_running: bool,
    pub started_at: DateTime<Utc>,
    /// Projected end of the countdown; only set while running.
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl TimerSession {
    fn state(&self) -> TimerState {
        if self.remaining_secs == 0 {
            TimerState::Expired
        } else if self.is_running {
            TimerState::Running
        } else {
            TimerState::Paused
        }
    }

    fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 0.0;
        }
        1.0 - (f64::from(self.remaining_secs) / f64::from(self.total_secs))
    }
}

/// Core timer engine. At most one session is live at a time.
pub struct TimerEngine {
    session: Option<TimerSession>,
    sink: Arc<dyn ProgressSink>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Arc::new(NoopSink), Arc::new(SystemClock))
    }
}

impl TimerEngine {
    pub fn new(sink: Arc<dyn ProgressSink>, clock: Arc<dyn Clock>) -> Self {
        Self {
            session: None,
            sink,
            clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.session
            .as_ref()
            .map(TimerSession::state)
            .unwrap_or(TimerState::Idle)
    }

    pub fn session(&self) -> Option<&TimerSession> {
        self.session.as_ref()
    }

    pub fn active_habit_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.habit_id)
    }

    pub fn remaining_secs(&self) -> u32 {
        self.session.as_ref().map(|s| s.remaining_secs).unwrap_or(0)
    }

    pub fn total_secs(&self) -> u32 {
        self.session.as_ref().map(|s| s.total_secs).unwrap_or(0)
    }

    /// 0.0 .. 1.0 progress through the countdown.
    pub fn progress(&self) -> f64 {
        self.session.as_ref().map(TimerSession::progress).unwrap_or(0.0)
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state(),
            habit_id: self.active_habit_id(),
            habit_name: self.session.as_ref().map(|s| s.habit_name.clone()),
            remaining_secs: self.remaining_secs(),
            total_secs: self.total_secs(),
            progress: self.progress(),
            at: self.clock.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a countdown for `habit`, floored at [`MIN_TIMER_SECS`].
    ///
    /// Starting the habit that is already counting down is a no-op. Starting
    /// a different habit cancels the current session without logging it.
    pub fn start(&mut self, habit: &Habit, seconds: u32) -> Option<Event> {
        if let Some(current) = &self.session {
            if current.habit_id == habit.id && current.remaining_secs > 0 {
                tracing::debug!(habit = %habit.name, "timer already active for habit");
                return None;
            }
            self.cancel();
        }

        let total = seconds.max(MIN_TIMER_SECS);
        let now = self.clock.now();
        let emoji = (!habit.emoji.is_empty()).then(|| habit.emoji.clone());
        self.session = Some(TimerSession {
            habit_id: habit.id,
            habit_name: habit.name.clone(),
            emoji: emoji.clone(),
            total_secs: total,
            remaining_secs: total,
            is_running: true,
            started_at: now,
            ends_at: Some(now + Duration::seconds(i64::from(total))),
        });

        self.sink.start(&habit.name, emoji.as_deref(), total);
        self.sink.update_progress(0.0);
        tracing::debug!(habit = %habit.name, total_secs = total, "timer started");

        Some(Event::TimerStarted {
            habit_id: habit.id,
            habit_name: habit.name.clone(),
            total_secs: total,
            at: now,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        let session = self.session.as_mut()?;
        if session.state() != TimerState::Running {
            return None;
        }
        session.is_running = false;
        session.ends_at = None;
        let remaining = session.remaining_secs;
        let habit_id = session.habit_id;

        self.sink.pause(remaining);
        tracing::debug!(remaining_secs = remaining, "timer paused");
        Some(Event::TimerPaused {
            habit_id,
            remaining_secs: remaining,
            at: self.clock.now(),
        })
    }

    /// Pause, first replacing the remaining time with `remaining` (clamped to
    /// `1..=total`). Used when an external surface knows better than the
    /// tick count how much time is left.
    pub fn pause_with_remaining(&mut self, remaining: Option<u32>) -> Option<Event> {
        if let (Some(value), Some(session)) = (remaining, self.session.as_mut()) {
            if session.state() == TimerState::Running {
                session.remaining_secs = value.clamp(1, session.total_secs.max(1));
            }
        }
        self.pause()
    }

    pub fn resume(&mut self) -> Option<Event> {
        let now = self.clock.now();
        let session = self.session.as_mut()?;
        if session.state() != TimerState::Paused {
            return None;
        }
        let ends_at = now + Duration::seconds(i64::from(session.remaining_secs));
        session.is_running = true;
        session.ends_at = Some(ends_at);
        let remaining = session.remaining_secs;
        let habit_id = session.habit_id;

        self.sink.resume();
        tracing::debug!(remaining_secs = remaining, "timer resumed");
        Some(Event::TimerResumed {
            habit_id,
            remaining_secs: remaining,
            ends_at,
            at: now,
        })
    }

    /// One-second step. Returns `Some(Event::TimerExpired)` when the countdown hits zero.
    pub fn tick(&mut self) -> Option<Event> {
        let session = self.session.as_mut()?;
        if session.state() != TimerState::Running {
            return None;
        }
        session.remaining_secs -= 1;
        self.sink.update_progress(session.progress());

        if session.remaining_secs > 0 {
            return None;
        }
        session.is_running = false;
        session.ends_at = None;
        let habit_id = session.habit_id;
        tracing::debug!("timer expired");
        Some(Event::TimerExpired {
            habit_id,
            at: self.clock.now(),
        })
    }

    /// Log the active session with its full configured duration and go idle.
    ///
    /// The session is cleared before the write, so a repeated call is a
    /// no-op. A failed write is logged and dropped; only a fatal store error
    /// is returned.
    pub fn complete_and_log<S>(&mut self, store: &mut S) -> Result<Option<Event>>
    where
        S: EventStore + ?Sized,
    {
        self.complete_and_log_with(store, None, None)
    }

    /// Variant used by deep links: `habit_id` must match the active habit
    /// when given, and `total_override` replaces the logged duration.
    pub fn complete_and_log_with<S>(
        &mut self,
        store: &mut S,
        habit_id: Option<Uuid>,
        total_override: Option<u32>,
    ) -> Result<Option<Event>>
    where
        S: EventStore + ?Sized,
    {
        if let (Some(wanted), Some(active)) = (habit_id, self.active_habit_id()) {
            if wanted != active {
                tracing::debug!(%wanted, %active, "completion for a habit that is not active");
                return Ok(None);
            }
        }
        let Some(session) = self.session.take() else {
            return Ok(None);
        };

        let now = self.clock.now();
        let duration = total_override.map(|t| t.max(1)).unwrap_or(session.total_secs);
        let entry = HabitEntry::new(session.habit_id, now, duration);
        let written = record_entry(store, &entry);
        self.sink.end();
        let entry_id = written?;

        tracing::info!(habit = %session.habit_name, duration_secs = duration, "habit logged");
        Ok(Some(Event::TimerCompleted {
            habit_id: session.habit_id,
            entry_id,
            duration_secs: duration,
            at: now,
        }))
    }

    /// Drop the session without logging anything.
    pub fn cancel(&mut self) -> Option<Event> {
        let session = self.session.take()?;
        self.sink.end();
        tracing::debug!(habit = %session.habit_name, "timer cancelled");
        Some(Event::TimerCancelled {
            habit_id: session.habit_id,
            remaining_secs: session.remaining_secs,
            at: self.clock.now(),
        })
    }

    /// Adopt a session persisted by an earlier process.
    ///
    /// A running session's remaining time is recomputed from its projected
    /// end; if that has passed the session comes back `Expired`. Paused
    /// sessions keep their frozen remaining time.
    pub fn restore(&mut self, mut session: TimerSession) -> TimerState {
        if session.is_running {
            let now = self.clock.now();
            let remaining = session
                .ends_at
                .map(|end| (end - now).num_seconds().clamp(0, i64::from(session.total_secs)))
                .unwrap_or(0) as u32;
            session.remaining_secs = remaining;
            if remaining == 0 {
                session.is_running = false;
                session.ends_at = None;
            }
        }
        self.session = Some(session);
        self.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::sink::ActivityRecorder;
    use crate::error::StoreError;
    use crate::storage::testing::FailingStore;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn fixture() -> (TimerEngine, Arc<ActivityRecorder>, Arc<ManualClock>) {
        let sink = Arc::new(ActivityRecorder::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 12, 9, 0, 0).unwrap(),
        ));
        let engine = TimerEngine::new(sink.clone(), clock.clone());
        (engine, sink, clock)
    }

    #[test]
    fn start_clamps_to_floor() {
        let (mut engine, _, _) = fixture();
        let habit = Habit::new("Blink", "👁️");
        engine.start(&habit, 3);
        assert_eq!(engine.total_secs(), 10);
        assert_eq!(engine.remaining_secs(), 10);
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn start_same_habit_is_idempotent() {
        let (mut engine, _, _) = fixture();
        let habit = Habit::new("Stretch", "🧘");
        assert!(engine.start(&habit, 60).is_some());
        for _ in 0..5 {
            engine.tick();
        }
        assert!(engine.start(&habit, 60).is_none());
        assert_eq!(engine.remaining_secs(), 55);
    }

    #[test]
    fn start_other_habit_replaces_without_logging() {
        let (mut engine, sink, _) = fixture();
        let store = MemoryStore::new();
        let first = Habit::new("First", "1️⃣");
        let second = Habit::new("Second", "2️⃣");
        engine.start(&first, 30);
        engine.start(&second, 45);
        assert_eq!(engine.active_habit_id(), Some(second.id));
        assert_eq!(engine.total_secs(), 45);
        assert_eq!(sink.current().unwrap().habit_name, "Second");
        assert!(store.all_entries().unwrap().is_empty());
    }

    #[test]
    fn completion_logs_configured_total() {
        let (mut engine, sink, clock) = fixture();
        let mut store = MemoryStore::new();
        let habit = Habit::new("Breathe", "🌬️");
        store.insert_habit(&habit).unwrap();

        engine.start(&habit, 90);
        for _ in 0..50 {
            engine.tick();
        }
        assert_eq!(engine.remaining_secs(), 40);
        engine.pause();
        assert_eq!(sink.current().unwrap().paused_remaining_secs, Some(40));
        clock.advance(Duration::minutes(10));
        assert!(engine.tick().is_none());
        engine.resume();
        let event = engine.complete_and_log(&mut store).unwrap();

        assert!(matches!(event, Some(Event::TimerCompleted { duration_secs: 90, .. })));
        let entries = store.entries_for_habit(habit.id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].duration_secs, 90);
        assert_eq!(entries[0].performed_at, clock.now());
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(sink.current().is_none());
    }

    #[test]
    fn double_completion_writes_once() {
        let (mut engine, _, _) = fixture();
        let mut store = MemoryStore::new();
        let habit = Habit::new("Water", "💧");
        engine.start(&habit, 30);
        assert!(engine.complete_and_log(&mut store).unwrap().is_some());
        assert!(engine.complete_and_log(&mut store).unwrap().is_none());
        assert_eq!(store.all_entries().unwrap().len(), 1);
    }

    #[test]
    fn expiry_does_not_log() {
        let (mut engine, _, _) = fixture();
        let mut store = MemoryStore::new();
        let habit = Habit::new("Posture", "🪑");
        engine.start(&habit, 10);
        let mut expired = None;
        for _ in 0..10 {
            expired = engine.tick();
        }
        assert!(matches!(expired, Some(Event::TimerExpired { .. })));
        assert_eq!(engine.state(), TimerState::Expired);
        assert!(engine.tick().is_none());
        assert!(store.all_entries().unwrap().is_empty());

        engine.cancel();
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(store.all_entries().unwrap().is_empty());
        let _ = engine.complete_and_log(&mut store).unwrap();
        assert!(store.all_entries().unwrap().is_empty());
    }

    #[test]
    fn expired_session_can_be_logged() {
        let (mut engine, _, _) = fixture();
        let mut store = MemoryStore::new();
        let habit = Habit::new("Posture", "🪑");
        engine.start(&habit, 10);
        for _ in 0..10 {
            engine.tick();
        }
        engine.complete_and_log(&mut store).unwrap();
        assert_eq!(store.all_entries().unwrap()[0].duration_secs, 10);
    }

    #[test]
    fn invalid_transitions_are_noops() {
        let (mut engine, _, _) = fixture();
        assert!(engine.pause().is_none());
        assert!(engine.resume().is_none());
        assert!(engine.cancel().is_none());
        assert!(engine.tick().is_none());

        let habit = Habit::new("Stretch", "🧘");
        engine.start(&habit, 20);
        assert!(engine.resume().is_none());
        assert!(engine.pause().is_some());
        assert!(engine.pause().is_none());
        assert_eq!(engine.state(), TimerState::Paused);
    }

    #[test]
    fn progress_follows_ticks() {
        let (mut engine, sink, _) = fixture();
        let habit = Habit::new("Stretch", "🧘");
        engine.start(&habit, 20);
        assert_eq!(sink.current().unwrap().progress, 0.0);
        for _ in 0..5 {
            engine.tick();
        }
        assert!((engine.progress() - 0.25).abs() < 1e-9);
        assert!((sink.current().unwrap().progress - 0.25).abs() < 1e-9);
    }

    #[test]
    fn pause_with_remaining_override_is_clamped() {
        let (mut engine, _, _) = fixture();
        let habit = Habit::new("Stretch", "🧘");
        engine.start(&habit, 30);
        engine.pause_with_remaining(Some(500));
        assert_eq!(engine.remaining_secs(), 30);
        engine.resume();
        engine.pause_with_remaining(Some(0));
        assert_eq!(engine.remaining_secs(), 1);
    }

    #[test]
    fn completion_for_other_habit_is_ignored() {
        let (mut engine, _, _) = fixture();
        let mut store = MemoryStore::new();
        let habit = Habit::new("Stretch", "🧘");
        engine.start(&habit, 30);
        let other = Uuid::new_v4();
        assert!(engine
            .complete_and_log_with(&mut store, Some(other), None)
            .unwrap()
            .is_none());
        assert_eq!(engine.state(), TimerState::Running);

        engine
            .complete_and_log_with(&mut store, Some(habit.id), Some(12))
            .unwrap();
        assert_eq!(store.all_entries().unwrap()[0].duration_secs, 12);
    }

    #[test]
    fn restore_recomputes_running_remaining() {
        let (mut engine, _, clock) = fixture();
        let habit = Habit::new("Stretch", "🧘");
        engine.start(&habit, 60);
        let session = engine.session().cloned().unwrap();

        clock.advance(Duration::seconds(25));
        let mut restored = TimerEngine::new(Arc::new(NoopSink), clock.clone());
        assert_eq!(restored.restore(session.clone()), TimerState::Running);
        assert_eq!(restored.remaining_secs(), 35);

        clock.advance(Duration::minutes(5));
        let mut late = TimerEngine::new(Arc::new(NoopSink), clock);
        assert_eq!(late.restore(session), TimerState::Expired);
        assert_eq!(late.remaining_secs(), 0);
    }

    #[test]
    fn failed_write_does_not_resurrect_session() {
        let (mut engine, sink, _) = fixture();
        let mut store = FailingStore::new(StoreError::WriteFailed("disk full".into()));
        let habit = Habit::new("Water", "💧");
        engine.start(&habit, 30);

        let event = engine.complete_and_log(&mut store).unwrap();
        assert!(matches!(event, Some(Event::TimerCompleted { entry_id: None, .. })));
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(sink.current().is_none());
    }

    #[test]
    fn corrupted_store_is_reported_after_going_idle() {
        let (mut engine, _, _) = fixture();
        let mut store = FailingStore::new(StoreError::Corrupted("bad page".into()));
        let habit = Habit::new("Water", "💧");
        engine.start(&habit, 30);

        let err = engine.complete_and_log(&mut store).unwrap_err();
        assert!(matches!(err, crate::error::CoreError::Store(StoreError::Corrupted(_))));
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn restore_keeps_paused_remaining() {
        let (mut engine, _, clock) = fixture();
        let habit = Habit::new("Stretch", "🧘");
        engine.start(&habit, 60);
        for _ in 0..15 {
            engine.tick();
        }
        engine.pause();
        let session = engine.session().cloned().unwrap();
        clock.advance(Duration::hours(3));
        let mut restored = TimerEngine::new(Arc::new(NoopSink), clock);
        assert_eq!(restored.restore(session), TimerState::Paused);
        assert_eq!(restored.remaining_secs(), 45);
    }
}
