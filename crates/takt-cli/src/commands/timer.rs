use std::sync::Arc;

use clap::Subcommand;
use takt_core::timer::{SharedTimer, Ticker, TickerExit};
use takt_core::{Command, TimerState};
use tokio::sync::Mutex;

use crate::app::{print_json, App, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a countdown for a habit
    Start {
        /// Habit id or name
        habit: String,
        /// Countdown length in seconds (habit default when omitted)
        #[arg(long)]
        secs: Option<u32>,
    },
    /// Pause the running countdown
    Pause {
        /// Override the remaining seconds
        #[arg(long)]
        remaining: Option<u32>,
    },
    /// Resume a paused countdown
    Resume,
    /// Drop the session without logging
    Cancel,
    /// Log the session and go idle
    Complete {
        /// Logged duration in seconds (full countdown when omitted)
        #[arg(long)]
        total: Option<u32>,
    },
    /// Print current timer state as JSON
    Status,
    /// Tick in the foreground until the countdown ends, then log it
    Run {
        /// Start this habit first (otherwise run the current session)
        habit: Option<String>,
        #[arg(long)]
        secs: Option<u32>,
    },
}

pub fn run(action: TimerAction) -> CliResult {
    let mut app = App::open()?;

    match action {
        TimerAction::Start { habit, secs } => {
            let habit = app.habit(&habit)?;
            match app.takt.start_timer(&habit, secs) {
                Some(event) => print_json(&event)?,
                None => print_json(&app.takt.timer().snapshot())?,
            }
        }
        TimerAction::Pause { remaining } => {
            let outcome = app.takt.dispatch(Command::Pause {
                remaining_override: remaining,
            })?;
            print_json(&outcome)?;
        }
        TimerAction::Resume => print_json(&app.takt.dispatch(Command::Resume)?)?,
        TimerAction::Cancel => print_json(&app.takt.dispatch(Command::Cancel)?)?,
        TimerAction::Complete { total } => {
            let outcome = app.takt.dispatch(Command::CompleteAndLog {
                habit_id: None,
                total_override: total,
            })?;
            print_json(&outcome)?;
        }
        TimerAction::Status => print_json(&app.takt.timer().snapshot())?,
        TimerAction::Run { habit, secs } => {
            if let Some(habit) = habit {
                let habit = app.habit(&habit)?;
                app.takt.start_timer(&habit, secs);
            }
            if app.takt.timer().state() != TimerState::Running {
                return Err(format!("no running timer (state: {:?})", app.takt.timer().state()).into());
            }
            // Saved first so an interrupted run can be picked up again.
            app.takt.save_sessions()?;

            let exit = run_in_foreground(&mut app)?;
            tracing::debug!(?exit, "ticker finished");
            if exit == TickerExit::Expired {
                let event = app.takt.complete_timer()?;
                print_json(&event)?;
            } else {
                print_json(&app.takt.timer().snapshot())?;
            }
        }
    }

    app.close()
}

fn run_in_foreground(app: &mut App) -> CliResult<TickerExit> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
    let interval = app.config.tick_interval();
    let engine = std::mem::take(app.takt.timer_mut());

    let (engine, exit) = runtime.block_on(async move {
        let shared: SharedTimer = Arc::new(Mutex::new(engine));
        let exit = Ticker::spawn(shared.clone(), interval).join().await;
        let engine = std::mem::take(&mut *shared.lock().await);
        (engine, exit)
    });

    *app.takt.timer_mut() = engine;
    Ok(exit)
}
