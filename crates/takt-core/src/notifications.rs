//! Daypart nudges and the scheduler boundary.
//!
//! The planner is pure: it turns [`NotificationsConfig`] into the list of
//! repeating dayparts to register. Delivering them is the host's job, behind
//! [`NotificationScheduler`].

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::storage::NotificationsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DaypartKind {
    Morning,
    Midday,
    Afternoon,
    Evening,
}

impl DaypartKind {
    pub const ALL: [DaypartKind; 4] = [Self::Morning, Self::Midday, Self::Afternoon, Self::Evening];

    /// Local wall-clock time of the nudge, `(hour, minute)`.
    pub fn time(self) -> (u32, u32) {
        match self {
            Self::Morning => (9, 0),
            Self::Midday => (12, 30),
            Self::Afternoon => (16, 0),
            Self::Evening => (20, 0),
        }
    }

    /// Stable request identifier, so rescheduling replaces instead of duplicating.
    pub fn identifier(self) -> &'static str {
        match self {
            Self::Morning => "takt.daypart.morning",
            Self::Midday => "takt.daypart.midday",
            Self::Afternoon => "takt.daypart.afternoon",
            Self::Evening => "takt.daypart.evening",
        }
    }

    fn enabled_in(self, config: &NotificationsConfig) -> bool {
        match self {
            Self::Morning => config.morning,
            Self::Midday => config.midday,
            Self::Afternoon => config.afternoon,
            Self::Evening => config.evening,
        }
    }
}

/// One repeating daily nudge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Daypart {
    pub kind: DaypartKind,
    pub identifier: String,
    pub hour: u32,
    pub minute: u32,
}

impl From<DaypartKind> for Daypart {
    fn from(kind: DaypartKind) -> Self {
        let (hour, minute) = kind.time();
        Self {
            kind,
            identifier: kind.identifier().to_string(),
            hour,
            minute,
        }
    }
}

/// Whether `hour` falls in `[start, end)`, wrapping midnight when `start > end`.
///
/// An empty range (`start == end`) is never quiet.
pub fn within_quiet_hours(hour: u32, start: u32, end: u32) -> bool {
    if start <= end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

/// Dayparts to register for `config`, in time order.
pub fn plan_dayparts(config: &NotificationsConfig) -> Vec<Daypart> {
    if !config.enabled {
        return Vec::new();
    }
    DaypartKind::ALL
        .into_iter()
        .filter(|kind| kind.enabled_in(config))
        .filter(|kind| !within_quiet_hours(kind.time().0, config.quiet_start_hour, config.quiet_end_hour))
        .map(Daypart::from)
        .collect()
}

/// Host notification service.
pub trait NotificationScheduler: Send + Sync {
    /// Fire a one-off nudge shortly.
    fn schedule_nudge_now(&self);

    /// Replace all daypart nudges with `dayparts`.
    fn schedule_recurring(&self, dayparts: &[Daypart]);

    fn cancel_all(&self);
}

/// Scheduler that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingScheduler;

impl NotificationScheduler for TracingScheduler {
    fn schedule_nudge_now(&self) {
        tracing::info!("nudge scheduled");
    }

    fn schedule_recurring(&self, dayparts: &[Daypart]) {
        for part in dayparts {
            tracing::info!(id = %part.identifier, hour = part.hour, minute = part.minute, "daypart scheduled");
        }
    }

    fn cancel_all(&self) {
        tracing::info!("notifications cancelled");
    }
}

/// A pending request held by [`RecordingScheduler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingNotification {
    NudgeNow,
    Daypart(Daypart),
}

/// In-memory scheduler that keeps what would be pending.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    pending: Mutex<Vec<PendingNotification>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Vec<PendingNotification> {
        self.pending.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn with_pending(&self, f: impl FnOnce(&mut Vec<PendingNotification>)) {
        match self.pending.lock() {
            Ok(mut pending) => f(&mut pending),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl NotificationScheduler for RecordingScheduler {
    fn schedule_nudge_now(&self) {
        self.with_pending(|p| p.push(PendingNotification::NudgeNow));
    }

    fn schedule_recurring(&self, dayparts: &[Daypart]) {
        self.with_pending(|p| {
            p.retain(|n| !matches!(n, PendingNotification::Daypart(_)));
            p.extend(dayparts.iter().cloned().map(PendingNotification::Daypart));
        });
    }

    fn cancel_all(&self) {
        self.with_pending(Vec::clear);
    }
}
