//! The persistence boundary the engines depend on.
//!
//! Only a handful of fixed query shapes exist, each with documented filter
//! and sort semantics. Implementations must honor the referential rules:
//!
//! - deleting a habit deletes its entries and nulls `ChainItem::habit_id`
//! - deleting a chain deletes its items

use uuid::Uuid;

use crate::error::StoreError;
use crate::model::{Chain, ChainItem, Habit, HabitEntry};

pub type StoreResult<T> = Result<T, StoreError>;

pub trait EventStore {
    // ── Habits ───────────────────────────────────────────────────────

    fn insert_habit(&mut self, habit: &Habit) -> StoreResult<()>;

    /// Overwrite every mutable field of an existing habit.
    fn update_habit(&mut self, habit: &Habit) -> StoreResult<()>;

    fn delete_habit(&mut self, id: Uuid) -> StoreResult<()>;

    fn habit(&self, id: Uuid) -> StoreResult<Option<Habit>>;

    /// Unarchived habits, by `sort_order` ascending then newest first.
    fn active_habits(&self) -> StoreResult<Vec<Habit>>;

    /// Archived habits, most recently archived first.
    fn archived_habits(&self) -> StoreResult<Vec<Habit>>;

    /// Unarchived favorites, newest first.
    fn favorite_habits(&self) -> StoreResult<Vec<Habit>>;

    /// Habits whose id is in `ids`, archived or not. Unknown ids are ignored.
    fn habits_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Habit>>;

    /// First active habit whose name contains `query`, ignoring case.
    fn find_active_habit_by_name(&self, query: &str) -> StoreResult<Option<Habit>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }
        Ok(self
            .active_habits()?
            .into_iter()
            .find(|h| h.name.to_lowercase().contains(&needle)))
    }

    // ── Entries ──────────────────────────────────────────────────────

    fn insert_entry(&mut self, entry: &HabitEntry) -> StoreResult<()>;

    /// Entries for one habit, oldest first.
    fn entries_for_habit(&self, habit_id: Uuid) -> StoreResult<Vec<HabitEntry>>;

    /// Every entry, oldest first.
    fn all_entries(&self) -> StoreResult<Vec<HabitEntry>>;

    // ── Chains ───────────────────────────────────────────────────────

    fn insert_chain(&mut self, chain: &Chain) -> StoreResult<()>;

    fn update_chain(&mut self, chain: &Chain) -> StoreResult<()>;

    fn delete_chain(&mut self, id: Uuid) -> StoreResult<()>;

    fn chain(&self, id: Uuid) -> StoreResult<Option<Chain>>;

    /// Unarchived chains, newest first.
    fn active_chains(&self) -> StoreResult<Vec<Chain>>;

    /// First active chain whose name contains `query`, ignoring case.
    fn find_active_chain_by_name(&self, query: &str) -> StoreResult<Option<Chain>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(None);
        }
        Ok(self
            .active_chains()?
            .into_iter()
            .find(|c| c.name.to_lowercase().contains(&needle)))
    }

    /// Items of a chain, by `order` ascending.
    fn chain_items(&self, chain_id: Uuid) -> StoreResult<Vec<ChainItem>>;

    /// Delete every item of the chain and recreate one per habit, orders `0..n`.
    fn replace_chain_items(&mut self, chain_id: Uuid, habit_ids: &[Uuid]) -> StoreResult<Vec<ChainItem>>;

    // ── Key-value ────────────────────────────────────────────────────

    fn kv_get(&self, key: &str) -> StoreResult<Option<String>>;

    fn kv_set(&mut self, key: &str, value: &str) -> StoreResult<()>;

    fn kv_delete(&mut self, key: &str) -> StoreResult<()>;
}
