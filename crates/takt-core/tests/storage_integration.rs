//! Integration tests for the on-disk store.
//!
//! Opens a real database file in a temp directory, closes it and opens it
//! again, checking that chains, packs and sessions survive.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use takt_core::notifications::TracingScheduler;
use takt_core::sink::NoopSink;
use takt_core::storage::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use takt_core::templates::{install_chain_template, install_pack};
use takt_core::{Calendar, ChainStatus, Command, Database, EventStore, ManualClock, Outcome, Takt};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Database {
    Database::open_at(dir.path().join("takt.db")).unwrap()
}

#[test]
fn test_reopen_keeps_schema_and_rows() {
    let dir = TempDir::new().unwrap();
    let installed = {
        let mut db = open(&dir);
        install_pack(&mut db, "focus_reset").unwrap()
    };
    assert!(!installed.is_empty());

    let db = open(&dir);
    assert_eq!(get_schema_version(db.conn()), CURRENT_SCHEMA_VERSION);
    let active = db.active_habits().unwrap();
    assert_eq!(active.len(), installed.len());
    assert!(active.iter().all(|h| h.source_pack_id.as_deref() == Some("focus_reset")));
}

#[test]
fn test_installing_a_pack_twice_adds_nothing() {
    let dir = TempDir::new().unwrap();
    let mut db = open(&dir);
    let first = install_pack(&mut db, "study_sprint").unwrap();
    let second = install_pack(&mut db, "study_sprint").unwrap();
    assert!(!first.is_empty());
    assert!(second.is_empty());
    assert!(install_pack(&mut db, "no_such_pack").is_err());
}

#[test]
fn test_chain_template_runs_to_completion_across_restarts() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 12, 7, 0, 0).unwrap()));
    let takt_with = |db: Database| {
        Takt::with_parts(
            db,
            Calendar::utc(),
            clock.clone(),
            Arc::new(NoopSink),
            Arc::new(TracingScheduler),
        )
    };

    {
        let mut db = open(&dir);
        let chain = install_chain_template(&mut db, "Morning Kickoff").unwrap();
        assert_eq!(db.chain_items(chain.id).unwrap().len(), 3);
    }

    {
        let mut takt = takt_with(open(&dir));
        let outcome = takt
            .dispatch(Command::StartChain {
                name: "morning".into(),
            })
            .unwrap();
        assert!(matches!(outcome, Outcome::ChainStarted { status: ChainStatus::Active(0), .. }));
        takt.log_chain_step().unwrap();
        takt.save_sessions().unwrap();
    }

    let mut takt = takt_with(open(&dir));
    takt.restore_sessions().unwrap();
    assert_eq!(takt.chain_status(), Some(ChainStatus::Active(1)));
    takt.skip_chain_step();
    takt.log_chain_step().unwrap();
    assert_eq!(takt.chain_status(), Some(ChainStatus::Complete));
    assert_eq!(takt.store().all_entries().unwrap().len(), 2);
}

#[test]
fn test_deleting_a_habit_removes_its_history_and_chain_steps() {
    let dir = TempDir::new().unwrap();
    let mut db = open(&dir);
    let chain = install_chain_template(&mut db, "Morning Kickoff").unwrap();
    let items = db.chain_items(chain.id).unwrap();
    let doomed = items[1].habit_id.unwrap();

    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 12, 7, 0, 0).unwrap()));
    let mut takt = Takt::with_parts(db, Calendar::utc(), clock, Arc::new(NoopSink), Arc::new(TracingScheduler));
    takt.log_habit(doomed).unwrap();
    takt.store_mut().delete_habit(doomed).unwrap();

    let db = takt.into_store();
    assert!(db.entries_for_habit(doomed).unwrap().is_empty());
    let items = db.chain_items(chain.id).unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[1].habit_id, None);

    // The dangling step is skipped when the chain runs.
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 12, 8, 0, 0).unwrap()));
    let mut takt = Takt::with_parts(db, Calendar::utc(), clock, Arc::new(NoopSink), Arc::new(TracingScheduler));
    takt.start_chain(chain.id, 0).unwrap();
    assert_eq!(takt.chain_runner().unwrap().steps().len(), 2);
}
