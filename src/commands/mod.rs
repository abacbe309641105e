/*!
Command handlers for the CLI

Each submodule backs one group of subcommands:

- `tasks`     task list views and task mutations
- `ask`       one-shot questions and the interactive chat loop
- `formalize` text formalisation
- `backup`    export, import and backup history
- `history`   the assistant conversation log

Handlers open the local store once, build the library services they need
and print results; all behaviour lives in the library modules.
*/

use crate::config::Config;
use crate::error::Result;
use crate::storage::{KeyValueStore, SqliteStore};
use colored::Colorize;
use std::sync::Arc;

pub mod ask;
pub mod backup;
pub mod formalize;
pub mod history;
pub mod tasks;

/// Open the store configured in `config`
///
/// Falls back to the platform data directory when no path is configured.
pub fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store = match &config.storage.path {
        Some(path) => SqliteStore::new_with_path(path.clone())?,
        None => SqliteStore::new()?,
    };
    tracing::debug!("Using local storage at {}", store.path().display());
    Ok(Arc::new(store))
}

/// Tell the user the data came from the local cache
pub(crate) fn print_offline_notice(offline: bool) {
    if offline {
        println!(
            "{}",
            "Task service unreachable, showing locally cached data.".yellow()
        );
    }
}

/// Shorten `text` to `max` characters for table cells
pub(crate) fn clip(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let kept: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
