//! Built-in habit templates, packs and chain starters.
//!
//! Templates feed the "try something new" suggestion. Packs install a small
//! themed set of habits tagged with the pack id. Chain starters create a chain
//! and reuse existing habits with the same name.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::error::{Result, ValidationError};
use crate::model::{Chain, Habit};
use crate::storage::EventStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Health,
    Productivity,
    Mindfulness,
    Creativity,
    Social,
    Learning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitTemplate {
    pub name: &'static str,
    pub emoji: &'static str,
    pub duration_secs: u32,
    pub category: TemplateCategory,
}

impl HabitTemplate {
    const fn new(name: &'static str, emoji: &'static str, duration_secs: u32, category: TemplateCategory) -> Self {
        Self {
            name,
            emoji,
            duration_secs,
            category,
        }
    }

    pub fn to_habit(&self) -> Habit {
        Habit::new(self.name, self.emoji).with_duration(self.duration_secs)
    }
}

use TemplateCategory::*;

const TEMPLATES: &[HabitTemplate] = &[
    HabitTemplate::new("Water Break", "💧", 30, Health),
    HabitTemplate::new("Desk Stretch", "🧘", 60, Health),
    HabitTemplate::new("Deep Breathing", "🌬️", 90, Health),
    HabitTemplate::new("Walk Break", "🚶", 300, Health),
    HabitTemplate::new("Eye Rest", "👁️", 120, Health),
    HabitTemplate::new("Posture Check", "🪑", 30, Health),
    HabitTemplate::new("Inbox Skim", "📬", 90, Productivity),
    HabitTemplate::new("Daily Planning", "📅", 300, Productivity),
    HabitTemplate::new("Code Review", "💻", 900, Productivity),
    HabitTemplate::new("Quick Tidy", "🧹", 180, Productivity),
    HabitTemplate::new("Task Review", "✅", 180, Productivity),
    HabitTemplate::new("Priority Check", "🎯", 120, Productivity),
    HabitTemplate::new("Meditation", "🧘‍♀️", 600, Mindfulness),
    HabitTemplate::new("Gratitude", "🙏", 180, Mindfulness),
    HabitTemplate::new("Journal", "📝", 300, Mindfulness),
    HabitTemplate::new("Reflection", "💭", 240, Mindfulness),
    HabitTemplate::new("Mindful Moment", "🌸", 60, Mindfulness),
    HabitTemplate::new("Sketch", "✏️", 600, Creativity),
    HabitTemplate::new("Music Practice", "🎸", 1800, Creativity),
    HabitTemplate::new("Creative Writing", "✍️", 900, Creativity),
    HabitTemplate::new("Brainstorm", "💡", 300, Creativity),
    HabitTemplate::new("Photo Walk", "📸", 600, Creativity),
    HabitTemplate::new("Call a Friend", "📞", 600, Social),
    HabitTemplate::new("Send Thanks", "💌", 180, Social),
    HabitTemplate::new("Check In", "👋", 120, Social),
    HabitTemplate::new("Read Article", "📰", 300, Learning),
    HabitTemplate::new("Watch Tutorial", "🎥", 600, Learning),
    HabitTemplate::new("Practice Language", "🗣️", 300, Learning),
    HabitTemplate::new("Learn Shortcut", "⌨️", 180, Learning),
];

/// The built-in template catalogue.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateLibrary;

impl TemplateLibrary {
    pub fn templates(&self) -> &'static [HabitTemplate] {
        TEMPLATES
    }

    pub fn by_category(&self, category: TemplateCategory) -> impl Iterator<Item = &'static HabitTemplate> {
        TEMPLATES.iter().filter(move |t| t.category == category)
    }

    fn available<'a>(&self, existing: &'a [Habit]) -> impl Iterator<Item = &'static HabitTemplate> + 'a {
        TEMPLATES
            .iter()
            .filter(move |t| !existing.iter().any(|h| h.name.to_lowercase() == t.name.to_lowercase()))
    }

    /// A random template whose name is not already a habit (ignoring case).
    pub fn suggestion<R: Rng + ?Sized>(&self, existing: &[Habit], rng: &mut R) -> Option<&'static HabitTemplate> {
        let available: Vec<&'static HabitTemplate> = self.available(existing).collect();
        available.choose(rng).copied()
    }

    /// Up to `count` distinct suggestions in random order.
    pub fn suggestions<R: Rng + ?Sized>(&self, count: usize, existing: &[Habit], rng: &mut R) -> Vec<&'static HabitTemplate> {
        let mut available: Vec<&'static HabitTemplate> = self.available(existing).collect();
        available.shuffle(rng);
        available.truncate(count);
        available
    }
}

// ============================================================================
// PACKS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackItem {
    pub emoji: &'static str,
    pub name: &'static str,
    pub duration_secs: u32,
}

const fn item(emoji: &'static str, name: &'static str, duration_secs: u32) -> PackItem {
    PackItem {
        emoji,
        name,
        duration_secs,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitPack {
    pub id: &'static str,
    pub title: &'static str,
    pub items: Vec<PackItem>,
}

/// Returns all built-in packs.
pub fn builtin_packs() -> Vec<HabitPack> {
    vec![
        HabitPack {
            id: "focus_reset",
            title: "Focus Reset",
            items: vec![
                item("💧", "Water Break", 30),
                item("🧘", "Desk Stretch", 60),
                item("📬", "Inbox Skim", 90),
            ],
        },
        HabitPack {
            id: "study_sprint",
            title: "Study Sprint",
            items: vec![
                item("📚", "Open Textbook", 60),
                item("📝", "Outline", 90),
                item("🧠", "Recall", 60),
            ],
        },
    ]
}

/// Find a built-in pack by ID.
pub fn find_pack(id: &str) -> Option<HabitPack> {
    builtin_packs().into_iter().find(|p| p.id == id)
}

/// Get pack IDs for listing.
pub fn pack_ids() -> Vec<&'static str> {
    builtin_packs().iter().map(|p| p.id).collect()
}

fn active_named<S: EventStore + ?Sized>(store: &S, name: &str) -> Result<Option<Habit>> {
    Ok(store
        .active_habits()?
        .into_iter()
        .find(|h| h.name.to_lowercase() == name.to_lowercase()))
}

/// Create the pack's habits, tagged with the pack id.
///
/// Items whose name already exists among active habits are skipped. Returns
/// the habits that were created.
pub fn install_pack<S: EventStore + ?Sized>(store: &mut S, pack_id: &str) -> Result<Vec<Habit>> {
    let pack = find_pack(pack_id).ok_or_else(|| ValidationError::InvalidValue {
        field: "pack".into(),
        message: format!("unknown pack '{pack_id}' (available: {})", pack_ids().join(", ")),
    })?;

    let mut created = Vec::new();
    for item in &pack.items {
        if active_named(store, item.name)?.is_some() {
            tracing::debug!(pack = pack.id, habit = item.name, "already present, skipping");
            continue;
        }
        let mut habit = Habit::new(item.name, item.emoji).with_duration(item.duration_secs);
        habit.source_pack_id = Some(pack.id.to_string());
        store.insert_habit(&habit)?;
        created.push(habit);
    }
    tracing::info!(pack = pack.id, created = created.len(), "pack installed");
    Ok(created)
}

// ============================================================================
// CHAIN STARTERS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainTemplate {
    pub name: &'static str,
    pub blurb: &'static str,
    pub items: Vec<PackItem>,
}

pub fn chain_templates() -> Vec<ChainTemplate> {
    vec![
        ChainTemplate {
            name: "Morning Kickoff",
            blurb: "Hydrate, loosen up, plan the day",
            items: vec![
                item("💧", "Water Break", 30),
                item("🧘", "Desk Stretch", 60),
                item("📅", "Daily Planning", 300),
            ],
        },
        ChainTemplate {
            name: "Deep Work Warm-up",
            blurb: "Calm mind, clear desk, quick review",
            items: vec![
                item("🌬️", "Deep Breathing", 90),
                item("🧹", "Quick Tidy", 180),
                item("💻", "Code Review", 900),
            ],
        },
        ChainTemplate {
            name: "Study Sprint",
            blurb: "Prime, outline, recall",
            items: vec![
                item("📚", "Open Textbook", 60),
                item("📝", "Outline", 90),
                item("🧠", "Recall", 60),
            ],
        },
        ChainTemplate {
            name: "Reset Break",
            blurb: "Move, hydrate, breathe",
            items: vec![
                item("🚶", "Walk Break", 300),
                item("💧", "Water Break", 30),
                item("🌬️", "Deep Breathing", 90),
            ],
        },
    ]
}

/// Create a chain from a starter template.
///
/// Each step reuses an active habit with the same name, or creates one.
pub fn install_chain_template<S: EventStore + ?Sized>(store: &mut S, name: &str) -> Result<Chain> {
    let template = chain_templates()
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| ValidationError::InvalidValue {
            field: "template".into(),
            message: format!("unknown chain template '{name}'"),
        })?;

    let chain = Chain::new(template.name);
    store.insert_chain(&chain)?;

    let mut habit_ids = Vec::with_capacity(template.items.len());
    for item in &template.items {
        let habit = match active_named(store, item.name)? {
            Some(existing) => existing,
            None => {
                let habit = Habit::new(item.name, item.emoji).with_duration(item.duration_secs);
                store.insert_habit(&habit)?;
                habit
            }
        };
        habit_ids.push(habit.id);
    }
    store.replace_chain_items(chain.id, &habit_ids)?;
    tracing::info!(chain = %chain.name, steps = habit_ids.len(), "chain template installed");
    Ok(chain)
}
