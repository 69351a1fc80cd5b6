use takt_core::parse_deep_link;

use crate::app::{print_json, App, CliResult};

/// Parse a `takt://` URL and dispatch it.
pub fn run(url: &str) -> CliResult {
    let command = parse_deep_link(url)?;
    let mut app = App::open()?;
    let outcome = app.takt.dispatch(command)?;
    print_json(&outcome)?;
    app.close()
}
