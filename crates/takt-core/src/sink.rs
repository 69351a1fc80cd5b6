//! Progress sink: the "live activity" side channel.
//!
//! The timer pushes progress here. Calls are fire-and-forget and
//! implementations swallow their own failures; the engine never waits on or
//! reacts to a sink.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub trait ProgressSink: Send + Sync {
    fn start(&self, habit_name: &str, emoji: Option<&str>, total_secs: u32);

    /// `fraction` is completed progress, 0.0 ..= 1.0.
    fn update_progress(&self, fraction: f64);

    fn pause(&self, remaining_secs: u32);

    fn resume(&self);

    fn end(&self);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn start(&self, _habit_name: &str, _emoji: Option<&str>, _total_secs: u32) {}
    fn update_progress(&self, _fraction: f64) {}
    fn pause(&self, _remaining_secs: u32) {}
    fn resume(&self) {}
    fn end(&self) {}
}

/// Emits each call as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn start(&self, habit_name: &str, emoji: Option<&str>, total_secs: u32) {
        tracing::info!(habit = habit_name, emoji = emoji.unwrap_or(""), total_secs, "activity started");
    }

    fn update_progress(&self, fraction: f64) {
        tracing::trace!(fraction, "activity progress");
    }

    fn pause(&self, remaining_secs: u32) {
        tracing::info!(remaining_secs, "activity paused");
    }

    fn resume(&self) {
        tracing::info!("activity resumed");
    }

    fn end(&self) {
        tracing::info!("activity ended");
    }
}

/// What a lock-screen style surface would render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityState {
    pub habit_name: String,
    pub emoji: Option<String>,
    pub total_secs: u32,
    pub progress: f64,
    pub started_at: DateTime<Utc>,
    /// Projected end while running; stale while paused.
    pub ends_at: DateTime<Utc>,
    pub is_paused: bool,
    pub paused_remaining_secs: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

/// Keeps the latest [`ActivityState`] in memory.
#[derive(Debug, Default)]
pub struct ActivityRecorder {
    state: Mutex<Option<ActivityState>>,
}

impl ActivityRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current activity, if one is live.
    pub fn current(&self) -> Option<ActivityState> {
        self.state.lock().ok().and_then(|guard| guard.clone())
    }

    fn with_state(&self, f: impl FnOnce(&mut ActivityState)) {
        if let Ok(mut guard) = self.state.lock() {
            if let Some(state) = guard.as_mut() {
                f(state);
                state.updated_at = Utc::now();
            }
        }
    }
}

impl ProgressSink for ActivityRecorder {
    fn start(&self, habit_name: &str, emoji: Option<&str>, total_secs: u32) {
        let now = Utc::now();
        if let Ok(mut guard) = self.state.lock() {
            *guard = Some(ActivityState {
                habit_name: habit_name.to_string(),
                emoji: emoji.map(str::to_string),
                total_secs,
                progress: 0.0,
                started_at: now,
                ends_at: now + Duration::seconds(i64::from(total_secs)),
                is_paused: false,
                paused_remaining_secs: None,
                updated_at: now,
            });
        }
    }

    fn update_progress(&self, fraction: f64) {
        self.with_state(|s| s.progress = fraction.clamp(0.0, 1.0));
    }

    fn pause(&self, remaining_secs: u32) {
        self.with_state(|s| {
            s.is_paused = true;
            s.paused_remaining_secs = Some(remaining_secs);
        });
    }

    fn resume(&self) {
        self.with_state(|s| {
            if let Some(remaining) = s.paused_remaining_secs.take() {
                s.ends_at = Utc::now() + Duration::seconds(i64::from(remaining));
            }
            s.is_paused = false;
        });
    }

    fn end(&self) {
        if let Ok(mut guard) = self.state.lock() {
            *guard = None;
        }
    }
}
