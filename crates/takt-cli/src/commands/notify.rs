use clap::Subcommand;
use takt_core::Command;

use crate::app::{print_json, App, CliResult};

#[derive(Subcommand)]
pub enum NotifyAction {
    /// Reschedule the daypart nudges from the config and print the plan
    Plan,
    /// Fire a one-off nudge
    Nudge,
}

pub fn run(action: NotifyAction) -> CliResult {
    let mut app = App::open()?;

    match action {
        NotifyAction::Plan => {
            let plan = app.takt.reschedule_notifications(&app.config.notifications);
            print_json(&plan)?;
        }
        NotifyAction::Nudge => print_json(&app.takt.dispatch(Command::NudgeNow)?)?,
    }
    Ok(())
}
