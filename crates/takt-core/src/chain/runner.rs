//! Sequential chain session.
//!
//! A runner walks the habits of one chain in item order. Items whose habit
//! is gone are dropped when the runner is built, so indices always refer to
//! resolvable steps.
//!
//! Only `next()` running off the end marks the session complete. A runner
//! built with a start index past the last step has no current habit and
//! reports [`ChainStatus::Unavailable`]; it never becomes complete, and
//! `next`, `skip` and `log` do nothing on it. A chain with no resolvable
//! habits behaves the same way.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::Result;
use crate::events::Event;
use crate::model::{Chain, ChainItem, Habit, HabitEntry};
use crate::storage::{record_entry, EventStore};

/// Where a chain session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "index", rename_all = "snake_case")]
pub enum ChainStatus {
    /// A step is current.
    Active(usize),
    /// `next()` ran past the last step.
    Complete,
    /// No current step and not complete.
    Unavailable,
}

/// Persistable position of a chain session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSession {
    pub chain_id: Uuid,
    pub current_index: usize,
    pub is_complete: bool,
}

pub struct ChainRunner {
    chain: Chain,
    steps: Vec<Habit>,
    current_index: usize,
    is_complete: bool,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ChainRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainRunner")
            .field("chain", &self.chain.name)
            .field("steps", &self.steps.len())
            .field("current_index", &self.current_index)
            .field("is_complete", &self.is_complete)
            .finish()
    }
}

impl ChainRunner {
    /// Build a runner from a chain's items and the habits they may reference.
    ///
    /// Items are ordered by `order` (stable for ties). Items with no habit,
    /// or whose habit is not in `habits`, contribute no step.
    pub fn new(
        chain: Chain,
        mut items: Vec<ChainItem>,
        habits: &[Habit],
        start_at: usize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let lookup: HashMap<Uuid, &Habit> = habits.iter().map(|h| (h.id, h)).collect();
        items.sort_by_key(|item| item.order);
        let steps: Vec<Habit> = items
            .iter()
            .filter_map(|item| item.habit_id.and_then(|id| lookup.get(&id)))
            .map(|h| (*h).clone())
            .collect();

        tracing::debug!(chain = %chain.name, items = items.len(), steps = steps.len(), start_at, "chain started");
        Self {
            chain,
            steps,
            current_index: start_at,
            is_complete: false,
            clock,
        }
    }

    /// Load a chain and its habits from the store.
    ///
    /// Returns `None` when the chain does not exist.
    pub fn load<S>(store: &S, chain_id: Uuid, start_at: usize, clock: Arc<dyn Clock>) -> Result<Option<Self>>
    where
        S: EventStore + ?Sized,
    {
        let Some(chain) = store.chain(chain_id)? else {
            return Ok(None);
        };
        let items = store.chain_items(chain_id)?;
        let ids: Vec<Uuid> = items.iter().filter_map(|i| i.habit_id).collect();
        let habits = store.habits_by_ids(&ids)?;
        Ok(Some(Self::new(chain, items, &habits, start_at, clock)))
    }

    /// Rebuild a runner from a persisted session.
    pub fn restore<S>(store: &S, session: &ChainSession, clock: Arc<dyn Clock>) -> Result<Option<Self>>
    where
        S: EventStore + ?Sized,
    {
        let runner = Self::load(store, session.chain_id, session.current_index, clock)?;
        Ok(runner.map(|mut r| {
            r.is_complete = session.is_complete;
            r
        }))
    }

    pub fn session(&self) -> ChainSession {
        ChainSession {
            chain_id: self.chain.id,
            current_index: self.current_index,
            is_complete: self.is_complete,
        }
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// The resolvable habits, in order.
    pub fn steps(&self) -> &[Habit] {
        &self.steps
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// The habit at the current index, if any.
    pub fn current_habit(&self) -> Option<&Habit> {
        if self.is_complete {
            return None;
        }
        self.steps.get(self.current_index)
    }

    pub fn status(&self) -> ChainStatus {
        if self.is_complete {
            ChainStatus::Complete
        } else if self.current_habit().is_some() {
            ChainStatus::Active(self.current_index)
        } else {
            ChainStatus::Unavailable
        }
    }

    /// Fraction of steps behind the current index.
    pub fn progress(&self) -> f64 {
        if self.is_complete {
            return 1.0;
        }
        if self.steps.is_empty() {
            return 0.0;
        }
        (self.current_index as f64 / self.steps.len() as f64).min(1.0)
    }

    /// Advance one step. Running past the last step completes the chain.
    ///
    /// Returns `ChainCompleted` when this call completed the chain.
    pub fn next(&mut self) -> Option<Event> {
        self.current_habit()?;

        self.current_index += 1;
        if self.current_index >= self.steps.len() {
            self.is_complete = true;
            tracing::info!(chain = %self.chain.name, "chain complete");
            return Some(Event::ChainCompleted {
                chain_id: self.chain.id,
                at: self.clock.now(),
            });
        }
        None
    }

    /// Advance without logging.
    pub fn skip(&mut self) -> Vec<Event> {
        if self.current_habit().is_none() {
            return Vec::new();
        }
        let step_index = self.current_index;
        let mut events = vec![Event::ChainStepSkipped {
            chain_id: self.chain.id,
            step_index,
            at: self.clock.now(),
        }];
        events.extend(self.next());
        events
    }

    /// Log the current habit with its default duration, then advance.
    ///
    /// The runner advances before the write so a repeated call logs the next
    /// step rather than the same one twice. A failed write is dropped; only
    /// a fatal store error is returned.
    pub fn log<S>(&mut self, store: &mut S) -> Result<Vec<Event>>
    where
        S: EventStore + ?Sized,
    {
        let Some(habit) = self.current_habit().cloned() else {
            return Ok(Vec::new());
        };
        let step_index = self.current_index;
        let completed = self.next();

        let now = self.clock.now();
        let entry = HabitEntry::new(habit.id, now, habit.default_duration_secs);
        let entry_id = record_entry(store, &entry)?;
        tracing::info!(chain = %self.chain.name, habit = %habit.name, step_index, "chain step logged");

        let mut events = vec![Event::ChainStepLogged {
            chain_id: self.chain.id,
            step_index,
            habit_id: habit.id,
            entry_id,
            at: now,
        }];
        events.extend(completed);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::StoreError;
    use crate::storage::testing::FailingStore;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 12, 7, 30, 0).unwrap()))
    }

    fn chain_of(habits: &[Habit]) -> (Chain, Vec<ChainItem>) {
        let chain = Chain::new("Morning");
        let items = habits
            .iter()
            .enumerate()
            .map(|(i, h)| ChainItem::new(chain.id, i as i32, Some(h.id)))
            .collect();
        (chain, items)
    }

    fn three_habits() -> Vec<Habit> {
        vec![
            Habit::new("Water", "💧").with_duration(30),
            Habit::new("Stretch", "🧘").with_duration(60),
            Habit::new("Breathe", "🌬️").with_duration(90),
        ]
    }

    #[test]
    fn three_logs_complete_the_chain() {
        let habits = three_habits();
        let (chain, items) = chain_of(&habits);
        let mut store = MemoryStore::new();
        let mut runner = ChainRunner::new(chain, items, &habits, 0, clock());

        assert_eq!(runner.status(), ChainStatus::Active(0));
        runner.log(&mut store).unwrap();
        runner.log(&mut store).unwrap();
        assert!(!runner.is_complete());
        let events = runner.log(&mut store).unwrap();

        assert!(runner.is_complete());
        assert_eq!(runner.status(), ChainStatus::Complete);
        assert!(matches!(events.last(), Some(Event::ChainCompleted { .. })));

        let entries = store.all_entries().unwrap();
        let durations: Vec<u32> = entries.iter().map(|e| e.duration_secs).collect();
        assert_eq!(durations, vec![30, 60, 90]);
    }

    #[test]
    fn skip_at_last_step_completes() {
        let habits = three_habits();
        let (chain, items) = chain_of(&habits);
        let mut runner = ChainRunner::new(chain, items, &habits, 2, clock());

        let events = runner.skip();
        assert_eq!(events.len(), 2);
        assert!(runner.is_complete());
        assert!(runner.skip().is_empty());
    }

    #[test]
    fn dangling_items_are_dropped() {
        let habits = three_habits();
        let (chain, mut items) = chain_of(&habits);
        items[1].habit_id = None;
        let runner = ChainRunner::new(chain, items, &habits, 0, clock());

        let names: Vec<&str> = runner.steps().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["Water", "Breathe"]);
    }

    #[test]
    fn items_are_walked_by_order() {
        let habits = three_habits();
        let (chain, mut items) = chain_of(&habits);
        items[0].order = 5;
        let runner = ChainRunner::new(chain, items, &habits, 0, clock());
        assert_eq!(runner.current_habit().unwrap().name, "Stretch");
        assert_eq!(runner.steps()[2].name, "Water");
    }

    // A start index past the end never reports complete, unlike walking off
    // the end with next().
    #[test]
    fn out_of_range_start_is_unavailable_not_complete() {
        let habits = three_habits();
        let (chain, items) = chain_of(&habits);
        let mut store = MemoryStore::new();
        let mut runner = ChainRunner::new(chain, items, &habits, 3, clock());

        assert_eq!(runner.status(), ChainStatus::Unavailable);
        assert!(runner.current_habit().is_none());
        assert!(runner.next().is_none());
        assert!(runner.skip().is_empty());
        assert!(runner.log(&mut store).unwrap().is_empty());
        assert!(!runner.is_complete());
        assert!(store.all_entries().unwrap().is_empty());
    }

    #[test]
    fn chain_without_resolvable_habits_is_unavailable() {
        let habits = three_habits();
        let (chain, mut items) = chain_of(&habits);
        for item in &mut items {
            item.habit_id = None;
        }
        let mut runner = ChainRunner::new(chain, items, &habits, 0, clock());
        assert_eq!(runner.status(), ChainStatus::Unavailable);
        runner.next();
        assert!(!runner.is_complete());
        assert_eq!(runner.progress(), 0.0);
    }

    #[test]
    fn progress_tracks_index() {
        let habits = three_habits();
        let (chain, items) = chain_of(&habits);
        let mut runner = ChainRunner::new(chain, items, &habits, 0, clock());
        assert_eq!(runner.progress(), 0.0);
        runner.skip();
        assert!((runner.progress() - 1.0 / 3.0).abs() < 1e-9);
        runner.skip();
        runner.skip();
        assert_eq!(runner.progress(), 1.0);
    }

    #[test]
    fn failed_write_still_advances() {
        let habits = three_habits();
        let (chain, items) = chain_of(&habits);
        let mut store = FailingStore::new(StoreError::WriteFailed("disk full".into()));
        let mut runner = ChainRunner::new(chain, items, &habits, 0, clock());

        let events = runner.log(&mut store).unwrap();
        assert!(matches!(events[0], Event::ChainStepLogged { entry_id: None, step_index: 0, .. }));
        assert_eq!(runner.status(), ChainStatus::Active(1));
    }

    #[test]
    fn load_and_restore_from_store() {
        let habits = three_habits();
        let mut store = MemoryStore::new();
        for h in &habits {
            store.insert_habit(h).unwrap();
        }
        let chain = Chain::new("Evening");
        store.insert_chain(&chain).unwrap();
        let ids: Vec<Uuid> = habits.iter().map(|h| h.id).collect();
        store.replace_chain_items(chain.id, &ids).unwrap();

        let clock = clock();
        let mut runner = ChainRunner::load(&store, chain.id, 0, clock.clone()).unwrap().unwrap();
        runner.skip();
        let session = runner.session();
        assert_eq!(session.current_index, 1);

        let restored = ChainRunner::restore(&store, &session, clock.clone()).unwrap().unwrap();
        assert_eq!(restored.current_habit().unwrap().name, "Stretch");
        assert!(ChainRunner::load(&store, Uuid::new_v4(), 0, clock).unwrap().is_none());
    }
}
