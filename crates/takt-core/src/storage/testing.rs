//! Store doubles for unit tests.

use uuid::Uuid;

use super::event_store::{EventStore, StoreResult};
use super::memory::MemoryStore;
use crate::error::StoreError;
use crate::model::{Chain, ChainItem, Habit, HabitEntry};

/// Memory store whose entry writes always fail with `error`.
pub(crate) struct FailingStore {
    pub inner: MemoryStore,
    error: StoreError,
}

impl FailingStore {
    pub fn new(error: StoreError) -> Self {
        Self { inner: MemoryStore::new(), error }
    }
}

impl EventStore for FailingStore {
    fn insert_habit(&mut self, habit: &Habit) -> StoreResult<()> {
        self.inner.insert_habit(habit)
    }
    fn update_habit(&mut self, habit: &Habit) -> StoreResult<()> {
        self.inner.update_habit(habit)
    }
    fn delete_habit(&mut self, id: Uuid) -> StoreResult<()> {
        self.inner.delete_habit(id)
    }
    fn habit(&self, id: Uuid) -> StoreResult<Option<Habit>> {
        self.inner.habit(id)
    }
    fn active_habits(&self) -> StoreResult<Vec<Habit>> {
        self.inner.active_habits()
    }
    fn archived_habits(&self) -> StoreResult<Vec<Habit>> {
        self.inner.archived_habits()
    }
    fn favorite_habits(&self) -> StoreResult<Vec<Habit>> {
        self.inner.favorite_habits()
    }
    fn habits_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Habit>> {
        self.inner.habits_by_ids(ids)
    }
    fn insert_entry(&mut self, _entry: &HabitEntry) -> StoreResult<()> {
        Err(self.error.clone())
    }
    fn entries_for_habit(&self, habit_id: Uuid) -> StoreResult<Vec<HabitEntry>> {
        self.inner.entries_for_habit(habit_id)
    }
    fn all_entries(&self) -> StoreResult<Vec<HabitEntry>> {
        self.inner.all_entries()
    }
    fn insert_chain(&mut self, chain: &Chain) -> StoreResult<()> {
        self.inner.insert_chain(chain)
    }
    fn update_chain(&mut self, chain: &Chain) -> StoreResult<()> {
        self.inner.update_chain(chain)
    }
    fn delete_chain(&mut self, id: Uuid) -> StoreResult<()> {
        self.inner.delete_chain(id)
    }
    fn chain(&self, id: Uuid) -> StoreResult<Option<Chain>> {
        self.inner.chain(id)
    }
    fn active_chains(&self) -> StoreResult<Vec<Chain>> {
        self.inner.active_chains()
    }
    fn chain_items(&self, chain_id: Uuid) -> StoreResult<Vec<ChainItem>> {
        self.inner.chain_items(chain_id)
    }
    fn replace_chain_items(&mut self, chain_id: Uuid, habit_ids: &[Uuid]) -> StoreResult<Vec<ChainItem>> {
        self.inner.replace_chain_items(chain_id, habit_ids)
    }
    fn kv_get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.kv_get(key)
    }
    fn kv_set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.inner.kv_set(key, value)
    }
    fn kv_delete(&mut self, key: &str) -> StoreResult<()> {
        self.inner.kv_delete(key)
    }
}
