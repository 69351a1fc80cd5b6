use clap::Subcommand;

use crate::app::{print_json, App, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Streaks, weekly count and most consistent hour for one habit
    Habit {
        /// Habit id or name
        habit: String,
    },
    /// Insights for every active habit
    Overview,
}

pub fn run(action: StatsAction) -> CliResult {
    let app = App::open()?;

    match action {
        StatsAction::Habit { habit } => {
            let habit = app.habit(&habit)?;
            print_json(&app.takt.insights(habit.id)?)?;
        }
        StatsAction::Overview => print_json(&app.takt.overview()?)?,
    }
    Ok(())
}
