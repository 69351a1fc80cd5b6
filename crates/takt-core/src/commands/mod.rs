//! Public command surface.
//!
//! Every outside trigger (deep link, shortcut, notification action, CLI)
//! becomes a [`Command`] and goes through [`Takt::dispatch`].

mod deep_link;
mod takt;

pub use deep_link::{parse_deep_link, DEEP_LINK_SCHEME};
pub use takt::{Outcome, Takt, CHAIN_SESSION_KEY, TIMER_SESSION_KEY};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a command names a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitRef {
    Id(Uuid),
    /// Case-insensitive substring of an active habit's name.
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Start a countdown with the habit's default duration.
    StartTimer { habit: HabitRef },
    /// Log the active session. `habit_id` must match it when given.
    CompleteAndLog {
        habit_id: Option<Uuid>,
        total_override: Option<u32>,
    },
    Pause { remaining_override: Option<u32> },
    Resume,
    Cancel,
    /// Start the recommended habit.
    StartSuggested,
    /// Start the first active chain whose name matches.
    StartChain { name: String },
    NudgeNow,
    ToggleFavorite { habit: HabitRef },
    /// Log the newest favorite without a timer.
    QuickLog,
}
