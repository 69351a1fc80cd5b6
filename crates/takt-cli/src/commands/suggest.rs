use clap::Args;
use takt_core::{EventStore, TemplateLibrary};

use crate::app::{print_json, App, CliResult};

#[derive(Args)]
pub struct SuggestArgs {
    /// Suggest this many new habits from the template library instead
    #[arg(long)]
    templates: Option<usize>,
}

pub fn run(args: SuggestArgs) -> CliResult {
    let mut app = App::open()?;

    match args.templates {
        Some(count) => {
            let existing = app.takt.store().active_habits()?;
            let picks = TemplateLibrary.suggestions(count, &existing, &mut rand::thread_rng());
            print_json(&picks)?;
        }
        None => print_json(&app.takt.recommend()?)?,
    }
    Ok(())
}
