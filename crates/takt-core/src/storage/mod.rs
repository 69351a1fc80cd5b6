mod config;
pub mod database;
mod event_store;
mod memory;
pub mod migrations;
#[cfg(test)]
pub(crate) mod testing;

pub use config::{CalendarConfig, Config, NotificationsConfig, TimerConfig, WeekStart};
pub use database::Database;
pub use event_store::{EventStore, StoreResult};
pub use memory::MemoryStore;

use std::path::PathBuf;

use uuid::Uuid;

use crate::error::{ConfigError, CoreError};
use crate::model::HabitEntry;

/// Returns the data directory.
///
/// `TAKT_DATA_DIR` wins when set. Otherwise `~/.config/takt[-dev]/`, with the
/// `-dev` suffix when `TAKT_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TAKT_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TAKT_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("takt-dev")
            } else {
                base_dir.join("takt")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Write one entry, tolerating ordinary write failures.
///
/// Returns the entry id when it was stored, `None` when the write failed and
/// was dropped. Fatal store errors are returned.
pub(crate) fn record_entry<S>(store: &mut S, entry: &HabitEntry) -> Result<Option<Uuid>, CoreError>
where
    S: EventStore + ?Sized,
{
    match store.insert_entry(entry) {
        Ok(()) => Ok(Some(entry.id)),
        Err(e) if e.is_fatal() => Err(e.into()),
        Err(e) => {
            tracing::warn!(habit_id = ?entry.habit_id, "dropping habit entry: {e}");
            Ok(None)
        }
    }
}
