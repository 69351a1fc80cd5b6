//! "Next best habit" recommendation.
//!
//! A greedy additive score per habit:
//!
//! | Term        | Condition                                              | Value   |
//! |-------------|--------------------------------------------------------|---------|
//! | favorite    | habit is a favorite                                    | +2      |
//! | recent      | last logged less than 2 whole hours before `now`       | -3      |
//! | quick win   | local hour in 7..=10 and default duration <= 60 s      | +1      |
//! | jitter      | uniform random                                         | [0,0.3) |
//!
//! The highest total wins. No normalization, no learning, nothing persisted.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::Serialize;
use uuid::Uuid;

use crate::clock::Calendar;
use crate::model::{Habit, HabitEntry};

pub const FAVORITE_BONUS: f64 = 2.0;
pub const RECENT_PENALTY: f64 = 3.0;
pub const MORNING_BONUS: f64 = 1.0;
pub const JITTER_MAX: f64 = 0.3;
pub const QUICK_WIN_MAX_SECS: u32 = 60;
pub const MORNING_HOURS: std::ops::RangeInclusive<u32> = 7..=10;

/// Individual score contribution, kept for explainability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreTerm {
    pub name: &'static str,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub habit: Habit,
    pub score: f64,
    pub terms: Vec<ScoreTerm>,
}

pub struct RecommendationEngine {
    calendar: Calendar,
    rng: Mcg128Xsl64,
}

impl RecommendationEngine {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar,
            rng: Mcg128Xsl64::from_entropy(),
        }
    }

    /// Deterministic jitter, for tests and reproducible runs.
    pub fn seeded(calendar: Calendar, seed: u64) -> Self {
        Self {
            calendar,
            rng: Mcg128Xsl64::seed_from_u64(seed),
        }
    }

    /// Pick the best habit to do next. Archived habits never win.
    ///
    /// `entries` may hold history for any habits; only the latest entry per
    /// habit matters.
    pub fn recommend(
        &mut self,
        habits: &[Habit],
        entries: &[HabitEntry],
        now: DateTime<Utc>,
    ) -> Option<Recommendation> {
        let mut last_logged: HashMap<Uuid, DateTime<Utc>> = HashMap::new();
        for entry in entries {
            if let Some(id) = entry.habit_id {
                last_logged
                    .entry(id)
                    .and_modify(|at| *at = (*at).max(entry.performed_at))
                    .or_insert(entry.performed_at);
            }
        }

        let hour = self.calendar.hour_of(now);
        let mut best: Option<Recommendation> = None;
        for habit in habits.iter().filter(|h| h.is_active()) {
            let terms = self.score_terms(habit, last_logged.get(&habit.id).copied(), hour, now);
            let score = terms.iter().map(|t| t.value).sum();
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Recommendation {
                    habit: habit.clone(),
                    score,
                    terms,
                });
            }
        }
        best
    }

    fn score_terms(
        &mut self,
        habit: &Habit,
        last_logged: Option<DateTime<Utc>>,
        hour: u32,
        now: DateTime<Utc>,
    ) -> Vec<ScoreTerm> {
        let mut terms = Vec::with_capacity(4);
        if habit.is_favorite {
            terms.push(ScoreTerm { name: "favorite", value: FAVORITE_BONUS });
        }
        if last_logged.is_some_and(|last| logged_recently(last, now)) {
            terms.push(ScoreTerm { name: "recent", value: -RECENT_PENALTY });
        }
        if MORNING_HOURS.contains(&hour) && habit.default_duration_secs <= QUICK_WIN_MAX_SECS {
            terms.push(ScoreTerm { name: "quick_win", value: MORNING_BONUS });
        }
        terms.push(ScoreTerm {
            name: "jitter",
            value: self.rng.gen_range(0.0..JITTER_MAX),
        });
        terms
    }
}

/// Whether `last` is inside the recency window used by the scorer.
///
/// A future timestamp counts as recent.
pub fn logged_recently(last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - last < Duration::hours(2)
}
