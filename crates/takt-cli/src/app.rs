//! Shared setup for every subcommand: config, database, facade, output.

use std::error::Error;
use std::sync::Arc;

use serde::Serialize;
use takt_core::notifications::TracingScheduler;
use takt_core::{
    Chain, Config, CoreError, Database, EventStore, Habit, HabitRef, StoreError, SystemClock, Takt, TracingSink,
};
use uuid::Uuid;

pub type CliResult<T = ()> = Result<T, Box<dyn Error>>;

/// A loaded config plus a facade whose sessions were restored from the kv table.
pub struct App {
    pub config: Config,
    pub takt: Takt<Database>,
}

impl App {
    pub fn open() -> CliResult<Self> {
        let config = Config::load()?;
        let db = Database::open()?;
        let mut takt = Takt::with_parts(
            db,
            config.calendar(),
            Arc::new(SystemClock),
            Arc::new(TracingSink),
            Arc::new(TracingScheduler),
        );
        takt.restore_sessions()?;
        Ok(Self { config, takt })
    }

    /// Persist live sessions so the next invocation picks them up.
    pub fn close(mut self) -> CliResult {
        self.takt.save_sessions()?;
        Ok(())
    }

    /// Resolve an id or a name, falling back to archived habits.
    pub fn habit(&self, arg: &str) -> CliResult<Habit> {
        let reference = habit_ref(arg);
        if let Some(habit) = self.takt.resolve_habit(&reference)? {
            return Ok(habit);
        }
        if let HabitRef::Id(id) = reference {
            return self.takt.store().habit(id)?.ok_or_else(|| not_found("habit", arg));
        }
        let needle = arg.trim().to_lowercase();
        if !needle.is_empty() {
            let archived = self.takt.store().archived_habits()?;
            if let Some(habit) = archived.into_iter().find(|h| h.name.to_lowercase().contains(&needle)) {
                return Ok(habit);
            }
        }
        Err(not_found("habit", arg))
    }

    pub fn chain(&self, arg: &str) -> CliResult<Chain> {
        let store = self.takt.store();
        let found = match Uuid::parse_str(arg.trim()) {
            Ok(id) => store.chain(id)?,
            Err(_) => store.find_active_chain_by_name(arg)?,
        };
        found.ok_or_else(|| not_found("chain", arg))
    }
}

pub fn habit_ref(arg: &str) -> HabitRef {
    match Uuid::parse_str(arg.trim()) {
        Ok(id) => HabitRef::Id(id),
        Err(_) => HabitRef::Name(arg.to_string()),
    }
}

fn not_found(kind: &'static str, arg: &str) -> Box<dyn Error> {
    Box::new(CoreError::Store(StoreError::NotFound {
        kind,
        id: arg.to_string(),
    }))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
