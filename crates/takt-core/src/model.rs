//! Persistent domain types: habits, their log entries, and chains.
//!
//! Relationships are expressed as ids. The store owns the referential rules:
//! deleting a habit removes its entries and nulls out chain items that point
//! at it; deleting a chain removes its items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default timer length for a new habit, in seconds.
pub const DEFAULT_HABIT_DURATION_SECS: u32 = 60;

/// A user-defined micro-activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub name: String,
    pub emoji: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_favorite: bool,
    pub default_duration_secs: u32,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    /// Pack the habit was installed from, if any.
    #[serde(default)]
    pub source_pack_id: Option<String>,
}

impl Habit {
    pub fn new(name: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            emoji: emoji.into(),
            created_at: Utc::now(),
            is_favorite: false,
            default_duration_secs: DEFAULT_HABIT_DURATION_SECS,
            archived_at: None,
            notes: None,
            sort_order: 0,
            source_pack_id: None,
        }
    }

    pub fn with_duration(mut self, secs: u32) -> Self {
        self.default_duration_secs = secs.max(1);
        self
    }

    pub fn favorite(mut self) -> Self {
        self.is_favorite = true;
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn is_active(&self) -> bool {
        self.archived_at.is_none()
    }

    pub fn archive(&mut self, at: DateTime<Utc>) {
        if self.archived_at.is_none() {
            self.archived_at = Some(at);
        }
    }

    pub fn unarchive(&mut self) {
        self.archived_at = None;
    }
}

/// One logged occurrence of a habit. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitEntry {
    pub id: Uuid,
    pub habit_id: Option<Uuid>,
    pub performed_at: DateTime<Utc>,
    pub duration_secs: u32,
}

impl HabitEntry {
    pub fn new(habit_id: Uuid, performed_at: DateTime<Utc>, duration_secs: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            habit_id: Some(habit_id),
            performed_at,
            duration_secs,
        }
    }
}

/// A named, ordered sequence of habits run as one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub id: Uuid,
    pub name: String,
    pub color_name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub archived_at: Option<DateTime<Utc>>,
}

impl Chain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color_name: "blue".to_string(),
            created_at: Utc::now(),
            archived_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.archived_at.is_none()
    }

    pub fn archive(&mut self, at: DateTime<Utc>) {
        if self.archived_at.is_none() {
            self.archived_at = Some(at);
        }
    }

    pub fn unarchive(&mut self) {
        self.archived_at = None;
    }
}

/// One slot in a chain. `habit_id` is `None` once the habit is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainItem {
    pub id: Uuid,
    pub order: i32,
    pub habit_id: Option<Uuid>,
    pub chain_id: Option<Uuid>,
}

impl ChainItem {
    pub fn new(chain_id: Uuid, order: i32, habit_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            order,
            habit_id,
            chain_id: Some(chain_id),
        }
    }
}
