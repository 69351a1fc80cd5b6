//! In-memory [`EventStore`] for tests and ephemeral hosts.

use std::cmp::Reverse;
use std::collections::HashMap;

use uuid::Uuid;

use super::event_store::{EventStore, StoreResult};
use crate::error::StoreError;
use crate::model::{Chain, ChainItem, Habit, HabitEntry};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    habits: Vec<Habit>,
    entries: Vec<HabitEntry>,
    chains: Vec<Chain>,
    items: Vec<ChainItem>,
    kv: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn habit_mut(&mut self, id: Uuid) -> StoreResult<&mut Habit> {
        self.habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| StoreError::NotFound { kind: "habit", id: id.to_string() })
    }
}

impl EventStore for MemoryStore {
    fn insert_habit(&mut self, habit: &Habit) -> StoreResult<()> {
        if self.habits.iter().any(|h| h.id == habit.id) {
            return Err(StoreError::WriteFailed(format!("habit {} already exists", habit.id)));
        }
        self.habits.push(habit.clone());
        Ok(())
    }

    fn update_habit(&mut self, habit: &Habit) -> StoreResult<()> {
        *self.habit_mut(habit.id)? = habit.clone();
        Ok(())
    }

    fn delete_habit(&mut self, id: Uuid) -> StoreResult<()> {
        self.habits.retain(|h| h.id != id);
        self.entries.retain(|e| e.habit_id != Some(id));
        for item in self.items.iter_mut().filter(|i| i.habit_id == Some(id)) {
            item.habit_id = None;
        }
        Ok(())
    }

    fn habit(&self, id: Uuid) -> StoreResult<Option<Habit>> {
        Ok(self.habits.iter().find(|h| h.id == id).cloned())
    }

    fn active_habits(&self) -> StoreResult<Vec<Habit>> {
        let mut habits: Vec<Habit> = self.habits.iter().filter(|h| h.is_active()).cloned().collect();
        habits.sort_by_key(|h| (h.sort_order, Reverse(h.created_at)));
        Ok(habits)
    }

    fn archived_habits(&self) -> StoreResult<Vec<Habit>> {
        let mut habits: Vec<Habit> = self.habits.iter().filter(|h| !h.is_active()).cloned().collect();
        habits.sort_by_key(|h| Reverse(h.archived_at));
        Ok(habits)
    }

    fn favorite_habits(&self) -> StoreResult<Vec<Habit>> {
        let mut habits: Vec<Habit> = self
            .habits
            .iter()
            .filter(|h| h.is_active() && h.is_favorite)
            .cloned()
            .collect();
        habits.sort_by_key(|h| Reverse(h.created_at));
        Ok(habits)
    }

    fn habits_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Habit>> {
        Ok(self.habits.iter().filter(|h| ids.contains(&h.id)).cloned().collect())
    }

    fn insert_entry(&mut self, entry: &HabitEntry) -> StoreResult<()> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn entries_for_habit(&self, habit_id: Uuid) -> StoreResult<Vec<HabitEntry>> {
        let mut entries: Vec<HabitEntry> = self
            .entries
            .iter()
            .filter(|e| e.habit_id == Some(habit_id))
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.performed_at);
        Ok(entries)
    }

    fn all_entries(&self) -> StoreResult<Vec<HabitEntry>> {
        let mut entries = self.entries.clone();
        entries.sort_by_key(|e| e.performed_at);
        Ok(entries)
    }

    fn insert_chain(&mut self, chain: &Chain) -> StoreResult<()> {
        if self.chains.iter().any(|c| c.id == chain.id) {
            return Err(StoreError::WriteFailed(format!("chain {} already exists", chain.id)));
        }
        self.chains.push(chain.clone());
        Ok(())
    }

    fn update_chain(&mut self, chain: &Chain) -> StoreResult<()> {
        let slot = self
            .chains
            .iter_mut()
            .find(|c| c.id == chain.id)
            .ok_or_else(|| StoreError::NotFound { kind: "chain", id: chain.id.to_string() })?;
        *slot = chain.clone();
        Ok(())
    }

    fn delete_chain(&mut self, id: Uuid) -> StoreResult<()> {
        self.chains.retain(|c| c.id != id);
        self.items.retain(|i| i.chain_id != Some(id));
        Ok(())
    }

    fn chain(&self, id: Uuid) -> StoreResult<Option<Chain>> {
        Ok(self.chains.iter().find(|c| c.id == id).cloned())
    }

    fn active_chains(&self) -> StoreResult<Vec<Chain>> {
        let mut chains: Vec<Chain> = self.chains.iter().filter(|c| c.is_active()).cloned().collect();
        chains.sort_by_key(|c| Reverse(c.created_at));
        Ok(chains)
    }

    fn chain_items(&self, chain_id: Uuid) -> StoreResult<Vec<ChainItem>> {
        let mut items: Vec<ChainItem> = self
            .items
            .iter()
            .filter(|i| i.chain_id == Some(chain_id))
            .cloned()
            .collect();
        items.sort_by_key(|i| i.order);
        Ok(items)
    }

    fn replace_chain_items(&mut self, chain_id: Uuid, habit_ids: &[Uuid]) -> StoreResult<Vec<ChainItem>> {
        if !self.chains.iter().any(|c| c.id == chain_id) {
            return Err(StoreError::NotFound { kind: "chain", id: chain_id.to_string() });
        }
        self.items.retain(|i| i.chain_id != Some(chain_id));
        let created: Vec<ChainItem> = habit_ids
            .iter()
            .enumerate()
            .map(|(order, habit_id)| ChainItem::new(chain_id, order as i32, Some(*habit_id)))
            .collect();
        self.items.extend(created.iter().cloned());
        Ok(created)
    }

    fn kv_get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.kv.get(key).cloned())
    }

    fn kv_set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.kv.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn kv_delete(&mut self, key: &str) -> StoreResult<()> {
        self.kv.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn delete_habit_cascades_and_nulls_chain_items() {
        let mut store = MemoryStore::new();
        let habit = Habit::new("Stretch", "🧘");
        let keep = Habit::new("Water", "💧");
        store.insert_habit(&habit).unwrap();
        store.insert_habit(&keep).unwrap();
        store.insert_entry(&HabitEntry::new(habit.id, Utc::now(), 60)).unwrap();
        store.insert_entry(&HabitEntry::new(keep.id, Utc::now(), 30)).unwrap();

        let chain = Chain::new("Morning");
        store.insert_chain(&chain).unwrap();
        store.replace_chain_items(chain.id, &[habit.id, keep.id]).unwrap();

        store.delete_habit(habit.id).unwrap();

        assert!(store.habit(habit.id).unwrap().is_none());
        assert_eq!(store.all_entries().unwrap().len(), 1);
        let items = store.chain_items(chain.id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].habit_id, None);
        assert_eq!(items[1].habit_id, Some(keep.id));
    }

    #[test]
    fn active_and_favorite_filters() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        let old_fav = Habit::new("Old", "1️⃣").favorite().created(now - Duration::days(2));
        let new_fav = Habit::new("New", "2️⃣").favorite().created(now);
        let mut archived = Habit::new("Gone", "3️⃣").favorite();
        archived.archive(now);
        for h in [&old_fav, &new_fav, &archived] {
            store.insert_habit(h).unwrap();
        }

        let favorites = store.favorite_habits().unwrap();
        assert_eq!(favorites.iter().map(|h| h.id).collect::<Vec<_>>(), vec![new_fav.id, old_fav.id]);
        assert_eq!(store.active_habits().unwrap().len(), 2);
        assert_eq!(store.archived_habits().unwrap()[0].id, archived.id);
    }

    #[test]
    fn find_by_name_is_case_insensitive_substring() {
        let mut store = MemoryStore::new();
        store.insert_habit(&Habit::new("Deep Breathing", "🌬️")).unwrap();
        assert!(store.find_active_habit_by_name("breath").unwrap().is_some());
        assert!(store.find_active_habit_by_name("  ").unwrap().is_none());
        assert!(store.find_active_habit_by_name("walk").unwrap().is_none());
    }

    #[test]
    fn replace_chain_items_recreates_dense_orders() {
        let mut store = MemoryStore::new();
        let chain = Chain::new("Reset");
        store.insert_chain(&chain).unwrap();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let first = store.replace_chain_items(chain.id, &ids).unwrap();
        let second = store.replace_chain_items(chain.id, &ids[1..]).unwrap();

        let items = store.chain_items(chain.id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items.iter().map(|i| i.order).collect::<Vec<_>>(), vec![0, 1]);
        assert!(items.iter().all(|i| first.iter().all(|f| f.id != i.id)));
        assert_eq!(items[0].id, second[0].id);
    }
}
