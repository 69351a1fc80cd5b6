use chrono::Utc;
use clap::Subcommand;
use takt_core::{Command, EventStore, Habit, Outcome, ValidationError};

use crate::app::{habit_ref, print_json, App, CliResult};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a habit
    Add {
        /// Habit name
        name: String,
        #[arg(long, default_value = "✅")]
        emoji: String,
        /// Default countdown in seconds (config `timer.default_duration_secs` when omitted)
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        favorite: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List habits (active by default)
    List {
        #[arg(long, conflicts_with = "favorites")]
        archived: bool,
        #[arg(long)]
        favorites: bool,
    },
    /// Edit name, emoji, duration, notes or position
    Edit {
        /// Habit id or name
        habit: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        emoji: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        sort_order: Option<i32>,
    },
    /// Hide a habit from lists and suggestions, keeping its history
    Archive { habit: String },
    Unarchive { habit: String },
    /// Toggle the favorite flag
    Favorite { habit: String },
    /// Delete an archived habit and its history
    Delete { habit: String },
    /// Log a habit now with its default duration
    Log { habit: String },
}

fn checked_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty("name"));
    }
    Ok(trimmed.to_string())
}

fn checked_duration(secs: u32) -> Result<u32, ValidationError> {
    if secs == 0 {
        return Err(ValidationError::InvalidValue {
            field: "duration".into(),
            message: "must be at least 1 second".into(),
        });
    }
    Ok(secs)
}

pub fn run(action: HabitAction) -> CliResult {
    let mut app = App::open()?;

    match action {
        HabitAction::Add {
            name,
            emoji,
            duration,
            favorite,
            notes,
        } => {
            let duration = checked_duration(duration.unwrap_or(app.config.timer.default_duration_secs))?;
            let mut habit = Habit::new(checked_name(&name)?, emoji).with_duration(duration);
            habit.is_favorite = favorite;
            habit.notes = notes;
            app.takt.store_mut().insert_habit(&habit)?;
            print_json(&habit)?;
        }
        HabitAction::List { archived, favorites } => {
            let store = app.takt.store();
            let habits = if archived {
                store.archived_habits()?
            } else if favorites {
                store.favorite_habits()?
            } else {
                store.active_habits()?
            };
            print_json(&habits)?;
        }
        HabitAction::Edit {
            habit,
            name,
            emoji,
            duration,
            notes,
            sort_order,
        } => {
            let mut habit = app.habit(&habit)?;
            if let Some(name) = name {
                habit.name = checked_name(&name)?;
            }
            if let Some(emoji) = emoji {
                habit.emoji = emoji;
            }
            if let Some(duration) = duration {
                habit.default_duration_secs = checked_duration(duration)?;
            }
            if let Some(notes) = notes {
                habit.notes = (!notes.is_empty()).then_some(notes);
            }
            if let Some(order) = sort_order {
                habit.sort_order = order;
            }
            app.takt.store_mut().update_habit(&habit)?;
            print_json(&habit)?;
        }
        HabitAction::Archive { habit } => {
            let mut habit = app.habit(&habit)?;
            if habit.is_active() {
                habit.archive(Utc::now());
                app.takt.store_mut().update_habit(&habit)?;
            }
            print_json(&habit)?;
        }
        HabitAction::Unarchive { habit } => {
            let mut habit = app.habit(&habit)?;
            habit.unarchive();
            app.takt.store_mut().update_habit(&habit)?;
            print_json(&habit)?;
        }
        HabitAction::Favorite { habit } => {
            let outcome = app.takt.dispatch(Command::ToggleFavorite {
                habit: habit_ref(&habit),
            })?;
            if outcome == Outcome::NoOp {
                // Archived habits are not reachable through the facade.
                let mut found = app.habit(&habit)?;
                found.is_favorite = !found.is_favorite;
                app.takt.store_mut().update_habit(&found)?;
                print_json(&Outcome::FavoriteToggled { habit: found })?;
            } else {
                print_json(&outcome)?;
            }
        }
        HabitAction::Delete { habit } => {
            let habit = app.habit(&habit)?;
            if habit.is_active() {
                return Err(ValidationError::InvalidValue {
                    field: "habit".to_string(),
                    message: format!("'{}' must be archived before it can be deleted", habit.name),
                }
                .into());
            }
            if app.takt.timer().active_habit_id() == Some(habit.id) {
                app.takt.timer_mut().cancel();
            }
            app.takt.store_mut().delete_habit(habit.id)?;
            print_json(&serde_json::json!({ "deleted": habit.id }))?;
        }
        HabitAction::Log { habit } => {
            let habit = app.habit(&habit)?;
            let entry = app.takt.log_habit(habit.id)?;
            print_json(&entry)?;
        }
    }

    app.close()
}
