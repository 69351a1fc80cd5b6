//! # Takt Core Library
//!
//! Scheduling and derivation engine for Takt, a habit tracker built around
//! short countdowns. Everything a host surface needs (CLI, widget, shortcut,
//! notification action) goes through this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: single-habit countdown state machine driven by `tick()`
//! - **Chains**: ordered habit sequences walked one step at a time
//! - **Stats**: streaks, weekly counts and most-consistent hour, all derived
//!   from the entry log
//! - **Recommendation**: greedy scorer for the "next best habit"
//! - **Storage**: SQLite event store and TOML configuration
//! - **Commands**: deep links and the [`Takt`] dispatch facade
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: countdown state machine
//! - [`ChainRunner`]: chain session cursor
//! - [`InsightsEngine`]: per-habit summaries
//! - [`RecommendationEngine`]: next best habit
//! - [`Database`]: persistence
//! - [`Config`]: application configuration

pub mod chain;
pub mod clock;
pub mod commands;
pub mod error;
pub mod events;
pub mod model;
pub mod notifications;
pub mod recommend;
pub mod sink;
pub mod stats;
pub mod storage;
pub mod templates;
pub mod timer;

pub use chain::{ChainRunner, ChainSession, ChainStatus};
pub use clock::{Calendar, Clock, ManualClock, SystemClock, Zone};
pub use commands::{parse_deep_link, Command, HabitRef, Outcome, Takt};
pub use error::{ConfigError, CoreError, DatabaseError, StoreError, ValidationError};
pub use events::Event;
pub use model::{Chain, ChainItem, Habit, HabitEntry};
pub use notifications::{Daypart, DaypartKind, NotificationScheduler};
pub use recommend::{Recommendation, RecommendationEngine};
pub use sink::{ProgressSink, TracingSink};
pub use stats::{HabitInsights, InsightsEngine};
pub use storage::{Config, Database, EventStore, MemoryStore};
pub use templates::{HabitPack, HabitTemplate, TemplateLibrary};
pub use timer::{TimerEngine, TimerSession, TimerState};
