//! Derived statistics over logged habit entries.
//!
//! Everything here is a pure function of the entry history plus a
//! [`Calendar`](crate::clock::Calendar); nothing is cached or persisted.

mod insights;
mod streak;

pub use insights::{HabitInsights, InsightsEngine};
pub use streak::{current_streak_days, current_streak_for_entries, longest_streak_days};
