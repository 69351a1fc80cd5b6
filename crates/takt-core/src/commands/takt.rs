//! The `Takt` facade: one store, one timer, at most one chain session.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use super::{Command, HabitRef};
use crate::chain::{ChainRunner, ChainSession, ChainStatus};
use crate::clock::{Calendar, Clock, SystemClock};
use crate::error::Result;
use crate::events::Event;
use crate::model::{Chain, Habit, HabitEntry};
use crate::notifications::{plan_dayparts, Daypart, NotificationScheduler, TracingScheduler};
use crate::recommend::{Recommendation, RecommendationEngine};
use crate::sink::{NoopSink, ProgressSink};
use crate::stats::{HabitInsights, InsightsEngine};
use crate::storage::{record_entry, EventStore, NotificationsConfig};
use crate::timer::{TimerEngine, TimerSession};

/// kv key holding the serialized [`TimerSession`].
pub const TIMER_SESSION_KEY: &str = "timer.session";
/// kv key holding the serialized [`ChainSession`].
pub const CHAIN_SESSION_KEY: &str = "chain.session";

/// What a dispatched command did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// The timer changed state.
    Timer { event: Event },
    ChainStarted {
        chain: Chain,
        status: ChainStatus,
        current: Option<Habit>,
    },
    FavoriteToggled { habit: Habit },
    Logged { entry: HabitEntry },
    NudgeScheduled,
    /// Nothing applied: unknown habit or chain, or an invalid transition.
    NoOp,
}

impl Outcome {
    fn from_event(event: Option<Event>) -> Self {
        event.map_or(Outcome::NoOp, |event| Outcome::Timer { event })
    }
}

pub struct Takt<S: EventStore> {
    store: S,
    timer: TimerEngine,
    chain: Option<ChainRunner>,
    recommender: RecommendationEngine,
    insights: InsightsEngine,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn NotificationScheduler>,
}

impl<S: EventStore> Takt<S> {
    /// System clock, no progress sink, logging-only notifications.
    pub fn new(store: S, calendar: Calendar) -> Self {
        Self::with_parts(
            store,
            calendar,
            Arc::new(SystemClock),
            Arc::new(NoopSink),
            Arc::new(TracingScheduler),
        )
    }

    pub fn with_parts(
        store: S,
        calendar: Calendar,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn ProgressSink>,
        scheduler: Arc<dyn NotificationScheduler>,
    ) -> Self {
        Self {
            store,
            timer: TimerEngine::new(sink, clock.clone()),
            chain: None,
            recommender: RecommendationEngine::new(calendar),
            insights: InsightsEngine::new(calendar),
            clock,
            scheduler,
        }
    }

    /// Replace the recommender, e.g. with a seeded one.
    pub fn with_recommender(mut self, recommender: RecommendationEngine) -> Self {
        self.recommender = recommender;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut TimerEngine {
        &mut self.timer
    }

    pub fn chain_runner(&self) -> Option<&ChainRunner> {
        self.chain.as_ref()
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        tracing::debug!(?command, "dispatch");
        match command {
            Command::StartTimer { habit } => {
                let Some(habit) = self.resolve_habit(&habit)? else {
                    return Ok(Outcome::NoOp);
                };
                Ok(Outcome::from_event(self.start_timer(&habit, None)))
            }
            Command::CompleteAndLog {
                habit_id,
                total_override,
            } => {
                let event = self
                    .timer
                    .complete_and_log_with(&mut self.store, habit_id, total_override)?;
                Ok(Outcome::from_event(event))
            }
            Command::Pause { remaining_override } => {
                Ok(Outcome::from_event(self.timer.pause_with_remaining(remaining_override)))
            }
            Command::Resume => Ok(Outcome::from_event(self.timer.resume())),
            Command::Cancel => Ok(Outcome::from_event(self.timer.cancel())),
            Command::StartSuggested => {
                let Some(recommendation) = self.recommend()? else {
                    return Ok(Outcome::NoOp);
                };
                Ok(Outcome::from_event(self.start_timer(&recommendation.habit, None)))
            }
            Command::StartChain { name } => {
                let Some(chain) = self.store.find_active_chain_by_name(&name)? else {
                    return Ok(Outcome::NoOp);
                };
                self.start_chain(chain.id, 0)?;
                Ok(self.chain_outcome())
            }
            Command::NudgeNow => {
                self.scheduler.schedule_nudge_now();
                Ok(Outcome::NudgeScheduled)
            }
            Command::ToggleFavorite { habit } => Ok(self
                .toggle_favorite(&habit)?
                .map_or(Outcome::NoOp, |habit| Outcome::FavoriteToggled { habit })),
            Command::QuickLog => Ok(self
                .quick_log_favorite()?
                .map_or(Outcome::NoOp, |entry| Outcome::Logged { entry })),
        }
    }

    fn chain_outcome(&self) -> Outcome {
        match &self.chain {
            Some(runner) => Outcome::ChainStarted {
                chain: runner.chain().clone(),
                status: runner.status(),
                current: runner.current_habit().cloned(),
            },
            None => Outcome::NoOp,
        }
    }

    /// Look an active habit up by id or by name. Archived habits never match.
    pub fn resolve_habit(&self, habit: &HabitRef) -> Result<Option<Habit>> {
        Ok(match habit {
            HabitRef::Id(id) => self.store.habit(*id)?.filter(Habit::is_active),
            HabitRef::Name(name) => self.store.find_active_habit_by_name(name)?,
        })
    }

    // ── Timer ────────────────────────────────────────────────────────

    /// Start `habit` for `seconds`, or its default duration.
    pub fn start_timer(&mut self, habit: &Habit, seconds: Option<u32>) -> Option<Event> {
        self.timer
            .start(habit, seconds.unwrap_or(habit.default_duration_secs))
    }

    pub fn complete_timer(&mut self) -> Result<Option<Event>> {
        self.timer.complete_and_log(&mut self.store)
    }

    // ── Chains ───────────────────────────────────────────────────────

    /// Begin a chain session at `start_at`. Returns `None` for an unknown chain.
    pub fn start_chain(&mut self, chain_id: Uuid, start_at: usize) -> Result<Option<ChainStatus>> {
        self.chain = ChainRunner::load(&self.store, chain_id, start_at, self.clock.clone())?;
        Ok(self.chain.as_ref().map(ChainRunner::status))
    }

    pub fn chain_status(&self) -> Option<ChainStatus> {
        self.chain.as_ref().map(ChainRunner::status)
    }

    pub fn log_chain_step(&mut self) -> Result<Vec<Event>> {
        match self.chain.as_mut() {
            Some(runner) => runner.log(&mut self.store),
            None => Ok(Vec::new()),
        }
    }

    pub fn skip_chain_step(&mut self) -> Vec<Event> {
        self.chain.as_mut().map(ChainRunner::skip).unwrap_or_default()
    }

    pub fn end_chain(&mut self) -> Option<ChainSession> {
        self.chain.take().map(|runner| runner.session())
    }

    // ── Logging ──────────────────────────────────────────────────────

    /// Log the newest active favorite with its default duration.
    pub fn quick_log_favorite(&mut self) -> Result<Option<HabitEntry>> {
        let Some(habit) = self.store.favorite_habits()?.into_iter().next() else {
            tracing::debug!("quick log without favorites");
            return Ok(None);
        };
        self.log(&habit)
    }

    /// Log a habit directly, without a timer.
    pub fn log_habit(&mut self, habit_id: Uuid) -> Result<Option<HabitEntry>> {
        let Some(habit) = self.store.habit(habit_id)? else {
            return Ok(None);
        };
        self.log(&habit)
    }

    fn log(&mut self, habit: &Habit) -> Result<Option<HabitEntry>> {
        let entry = HabitEntry::new(habit.id, self.clock.now(), habit.default_duration_secs);
        let stored = record_entry(&mut self.store, &entry)?;
        tracing::info!(habit = %habit.name, stored = stored.is_some(), "habit logged directly");
        Ok(stored.map(|_| entry))
    }

    pub fn toggle_favorite(&mut self, habit: &HabitRef) -> Result<Option<Habit>> {
        let Some(mut habit) = self.resolve_habit(habit)? else {
            return Ok(None);
        };
        habit.is_favorite = !habit.is_favorite;
        self.store.update_habit(&habit)?;
        Ok(Some(habit))
    }

    // ── Derived views ────────────────────────────────────────────────

    pub fn recommend(&mut self) -> Result<Option<Recommendation>> {
        let habits = self.store.active_habits()?;
        let entries = self.store.all_entries()?;
        Ok(self.recommender.recommend(&habits, &entries, self.clock.now()))
    }

    pub fn insights(&self, habit_id: Uuid) -> Result<Option<HabitInsights>> {
        let Some(habit) = self.store.habit(habit_id)? else {
            return Ok(None);
        };
        let entries = self.store.entries_for_habit(habit_id)?;
        Ok(Some(self.insights.summary(&habit, &entries, self.clock.now())))
    }

    /// Insights for every active habit, in list order.
    pub fn overview(&self) -> Result<Vec<HabitInsights>> {
        let now = self.clock.now();
        self.store
            .active_habits()?
            .iter()
            .map(|habit| -> Result<HabitInsights> {
                let entries = self.store.entries_for_habit(habit.id)?;
                Ok(self.insights.summary(habit, &entries, now))
            })
            .collect()
    }

    // ── Notifications ────────────────────────────────────────────────

    /// Replace the recurring nudges with the plan for `config`.
    pub fn reschedule_notifications(&self, config: &NotificationsConfig) -> Vec<Daypart> {
        let plan = plan_dayparts(config);
        self.scheduler.cancel_all();
        self.scheduler.schedule_recurring(&plan);
        plan
    }

    // ── Session persistence ──────────────────────────────────────────

    /// Write the live timer and chain sessions to the kv table.
    pub fn save_sessions(&mut self) -> Result<()> {
        match self.timer.session() {
            Some(session) => {
                let json = serde_json::to_string(session)?;
                self.store.kv_set(TIMER_SESSION_KEY, &json)?;
            }
            None => self.store.kv_delete(TIMER_SESSION_KEY)?,
        }
        match &self.chain {
            Some(runner) => {
                let json = serde_json::to_string(&runner.session())?;
                self.store.kv_set(CHAIN_SESSION_KEY, &json)?;
            }
            None => self.store.kv_delete(CHAIN_SESSION_KEY)?,
        }
        Ok(())
    }

    /// Adopt sessions saved by an earlier process.
    ///
    /// Unreadable snapshots are discarded with a warning.
    pub fn restore_sessions(&mut self) -> Result<()> {
        if let Some(json) = self.store.kv_get(TIMER_SESSION_KEY)? {
            match serde_json::from_str::<TimerSession>(&json) {
                Ok(session) => {
                    let state = self.timer.restore(session);
                    tracing::debug!(?state, "timer session restored");
                }
                Err(e) => tracing::warn!("discarding timer session: {e}"),
            }
        }
        if let Some(json) = self.store.kv_get(CHAIN_SESSION_KEY)? {
            match serde_json::from_str::<ChainSession>(&json) {
                Ok(session) => {
                    self.chain = ChainRunner::restore(&self.store, &session, self.clock.clone())?;
                }
                Err(e) => tracing::warn!("discarding chain session: {e}"),
            }
        }
        Ok(())
    }
}
