//! `takt://` URL parsing.
//!
//! ```text
//! takt://start-timer?id=<uuid>        takt://start-timer?name=<text>
//! takt://complete?id=<uuid>&total=<secs>
//! takt://pause?remaining=<secs>       takt://resume      takt://cancel
//! takt://start-suggested              takt://start-chain?name=<text>
//! takt://nudge-now                    takt://toggle-favorite?id=<uuid>
//! takt://log-quick
//! ```
//!
//! Actions are also accepted as the first path segment (`takt:///resume`).

use std::collections::HashMap;

use url::Url;
use uuid::Uuid;

use super::{Command, HabitRef};
use crate::error::{CoreError, Result};

pub const DEEP_LINK_SCHEME: &str = "takt";

fn bad(message: impl Into<String>) -> CoreError {
    CoreError::DeepLink(message.into())
}

struct Query(HashMap<String, String>);

impl Query {
    fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
    }

    fn uuid(&self, key: &str) -> Result<Option<Uuid>> {
        self.text(key)
            .map(|v| Uuid::parse_str(v).map_err(|e| bad(format!("{key}: {e}"))))
            .transpose()
    }

    fn secs(&self, key: &str) -> Result<Option<u32>> {
        self.text(key)
            .map(|v| v.parse::<u32>().map_err(|e| bad(format!("{key}: {e}"))))
            .transpose()
    }

    fn habit(&self) -> Result<HabitRef> {
        if let Some(id) = self.uuid("id")? {
            return Ok(HabitRef::Id(id));
        }
        self.text("name")
            .map(|name| HabitRef::Name(name.to_string()))
            .ok_or_else(|| bad("expected `id` or `name`"))
    }
}

/// Parse a `takt://` URL into a [`Command`].
///
/// # Errors
/// Returns [`CoreError::DeepLink`] for a foreign scheme, an unknown action or
/// malformed parameters.
pub fn parse_deep_link(input: &str) -> Result<Command> {
    let url = Url::parse(input).map_err(|e| bad(format!("{input}: {e}")))?;
    if url.scheme() != DEEP_LINK_SCHEME {
        return Err(bad(format!("unsupported scheme '{}'", url.scheme())));
    }

    let action = url
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .or_else(|| {
            url.path_segments()
                .and_then(|mut segments| segments.find(|s| !s.is_empty()))
                .map(str::to_string)
        })
        .ok_or_else(|| bad("missing action"))?;

    let query = Query(url.query_pairs().into_owned().collect());

    let command = match action.to_ascii_lowercase().as_str() {
        "start-timer" | "start" => Command::StartTimer { habit: query.habit()? },
        "complete" | "complete-and-log" => Command::CompleteAndLog {
            habit_id: query.uuid("id")?,
            total_override: query.secs("total")?,
        },
        "pause" => Command::Pause {
            remaining_override: query.secs("remaining")?,
        },
        "resume" => Command::Resume,
        "cancel" | "end" => Command::Cancel,
        "start-suggested" => Command::StartSuggested,
        "start-chain" => Command::StartChain {
            name: query
                .text("name")
                .ok_or_else(|| bad("start-chain needs `name`"))?
                .to_string(),
        },
        "nudge-now" => Command::NudgeNow,
        "toggle-favorite" => Command::ToggleFavorite { habit: query.habit()? },
        "log-quick" => Command::QuickLog,
        other => return Err(bad(format!("unknown action '{other}'"))),
    };
    tracing::debug!(?command, "deep link parsed");
    Ok(command)
}
