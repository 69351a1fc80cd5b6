use clap::Subcommand;
use takt_core::templates::{builtin_packs, install_pack};

use crate::app::{print_json, App, CliResult};

#[derive(Subcommand)]
pub enum PackAction {
    /// List the built-in habit packs
    List,
    /// Create the habits of a pack, skipping names that already exist
    Install { id: String },
}

pub fn run(action: PackAction) -> CliResult {
    match action {
        PackAction::List => print_json(&builtin_packs()),
        PackAction::Install { id } => {
            let mut app = App::open()?;
            let created = install_pack(app.takt.store_mut(), &id)?;
            print_json(&created)
        }
    }
}
