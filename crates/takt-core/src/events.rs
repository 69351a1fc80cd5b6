use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::TimerState;

/// Every state change in the timer or a chain session produces an Event.
/// Hosts print them, forward them, or ignore them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        habit_id: Uuid,
        habit_name: String,
        total_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        habit_id: Uuid,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    TimerResumed {
        habit_id: Uuid,
        remaining_secs: u32,
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// Countdown hit zero. Nothing is logged until the session is completed.
    TimerExpired {
        habit_id: Uuid,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        habit_id: Uuid,
        entry_id: Option<Uuid>,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    TimerCancelled {
        habit_id: Uuid,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    ChainStepLogged {
        chain_id: Uuid,
        step_index: usize,
        habit_id: Uuid,
        entry_id: Option<Uuid>,
        at: DateTime<Utc>,
    },
    ChainStepSkipped {
        chain_id: Uuid,
        step_index: usize,
        at: DateTime<Utc>,
    },
    ChainCompleted {
        chain_id: Uuid,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        habit_id: Option<Uuid>,
        habit_name: Option<String>,
        remaining_secs: u32,
        total_secs: u32,
        progress: f64,
        at: DateTime<Utc>,
    },
}
