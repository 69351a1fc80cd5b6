use clap::Subcommand;
use serde_json::json;
use takt_core::templates::{chain_templates, install_chain_template};
use takt_core::{Chain, EventStore, ValidationError};
use uuid::Uuid;

use crate::app::{print_json, App, CliResult};

#[derive(Subcommand)]
pub enum ChainAction {
    /// Create a chain from habits, in the given order
    Create {
        name: String,
        /// Habit id or name; repeat for each step
        #[arg(long = "habit")]
        habits: Vec<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// List active chains with their steps
    List,
    /// Rename, recolor or replace the steps of a chain
    Edit {
        /// Chain id or name
        chain: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// Replacement steps; repeat for each step
        #[arg(long = "habit")]
        habits: Vec<String>,
    },
    /// Hide a chain from lists and name lookups
    Archive { chain: String },
    /// Restore an archived chain; archived chains resolve by id only
    Unarchive { chain: String },
    Delete { chain: String },
    /// Begin a chain session
    Start {
        chain: String,
        /// Step index to start from
        #[arg(long, default_value_t = 0)]
        at: usize,
    },
    /// Log the current step and advance
    Log,
    /// Skip the current step
    Skip,
    /// Print the chain session as JSON
    Status,
    /// End the chain session
    End,
    /// List the starter templates
    Templates,
    /// Create a chain from a starter template
    Install { template: String },
}

fn habit_ids(app: &App, args: &[String]) -> CliResult<Vec<Uuid>> {
    args.iter().map(|arg| app.habit(arg).map(|h| h.id)).collect()
}

fn describe(app: &App, chain: &Chain) -> CliResult<serde_json::Value> {
    let items = app.takt.store().chain_items(chain.id)?;
    Ok(json!({ "chain": chain, "items": items }))
}

fn status(app: &App) -> serde_json::Value {
    match app.takt.chain_runner() {
        Some(runner) => json!({
            "chain": runner.chain(),
            "status": runner.status(),
            "current": runner.current_habit(),
            "progress": runner.progress(),
            "steps": runner.steps().len(),
        }),
        None => json!({ "status": null }),
    }
}

pub fn run(action: ChainAction) -> CliResult {
    let mut app = App::open()?;

    match action {
        ChainAction::Create { name, habits, color } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(ValidationError::Empty("name").into());
            }
            let ids = habit_ids(&app, &habits)?;
            let mut chain = Chain::new(name);
            if let Some(color) = color {
                chain.color_name = color;
            }
            let store = app.takt.store_mut();
            store.insert_chain(&chain)?;
            store.replace_chain_items(chain.id, &ids)?;
            print_json(&describe(&app, &chain)?)?;
        }
        ChainAction::List => {
            let chains = app.takt.store().active_chains()?;
            let described = chains
                .iter()
                .map(|chain| describe(&app, chain))
                .collect::<CliResult<Vec<_>>>()?;
            print_json(&described)?;
        }
        ChainAction::Edit {
            chain,
            name,
            color,
            habits,
        } => {
            let mut chain = app.chain(&chain)?;
            if let Some(name) = name {
                let name = name.trim();
                if name.is_empty() {
                    return Err(ValidationError::Empty("name").into());
                }
                chain.name = name.to_string();
            }
            if let Some(color) = color {
                chain.color_name = color;
            }
            let ids = habit_ids(&app, &habits)?;
            let store = app.takt.store_mut();
            store.update_chain(&chain)?;
            if !ids.is_empty() {
                store.replace_chain_items(chain.id, &ids)?;
            }
            print_json(&describe(&app, &chain)?)?;
        }
        ChainAction::Archive { chain } => {
            let mut chain = app.chain(&chain)?;
            if app.takt.chain_runner().map(|r| r.chain().id) == Some(chain.id) {
                app.takt.end_chain();
            }
            chain.archive(app.takt.now());
            app.takt.store_mut().update_chain(&chain)?;
            print_json(&chain)?;
        }
        ChainAction::Unarchive { chain } => {
            let mut chain = app.chain(&chain)?;
            chain.unarchive();
            app.takt.store_mut().update_chain(&chain)?;
            print_json(&chain)?;
        }
        ChainAction::Delete { chain } => {
            let chain = app.chain(&chain)?;
            if app.takt.chain_runner().map(|r| r.chain().id) == Some(chain.id) {
                app.takt.end_chain();
            }
            app.takt.store_mut().delete_chain(chain.id)?;
            print_json(&json!({ "deleted": chain.id }))?;
        }
        ChainAction::Start { chain, at } => {
            let chain = app.chain(&chain)?;
            app.takt.start_chain(chain.id, at)?;
            print_json(&status(&app))?;
        }
        ChainAction::Log => {
            let events = app.takt.log_chain_step()?;
            print_json(&json!({ "events": events, "session": status(&app) }))?;
        }
        ChainAction::Skip => {
            let events = app.takt.skip_chain_step();
            print_json(&json!({ "events": events, "session": status(&app) }))?;
        }
        ChainAction::Status => print_json(&status(&app))?,
        ChainAction::End => {
            let ended = app.takt.end_chain();
            print_json(&json!({ "ended": ended }))?;
        }
        ChainAction::Templates => print_json(&chain_templates())?,
        ChainAction::Install { template } => {
            let chain = install_chain_template(app.takt.store_mut(), &template)?;
            print_json(&describe(&app, &chain)?)?;
        }
    }

    app.close()
}
