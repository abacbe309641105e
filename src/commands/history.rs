use super::ask::print_history;
use super::clip;
use crate::ai::session::{synthetic_id, AssistantSession};
use crate::cli::HistoryCommand;
use crate::error::Result;
use crate::storage::KeyValueStore;
use colored::Colorize;
use prettytable::{format, Table};
use std::sync::Arc;

/// Handle history commands
pub fn handle_history(store: Arc<dyn KeyValueStore>, command: HistoryCommand) -> Result<()> {
    let session = AssistantSession::new(store);

    match command {
        HistoryCommand::List => print_history(&session.history()?),
        HistoryCommand::Clear => {
            session.clear()?;
            println!("{}", "Conversation cleared.".green());
        }
        HistoryCommand::Archive { title, category } => {
            let entry = session.archive_conversation(&title, category.as_deref())?;
            println!(
                "{}",
                format!(
                    "Archived {} messages as \"{}\"",
                    entry.content.len(),
                    entry.title
                )
                .green()
            );
        }
        HistoryCommand::Archived => {
            let archived = session.completed_ai_tasks()?;
            if archived.is_empty() {
                println!("{}", "No archived conversations.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Category".bold(),
                "Messages".bold(),
                "Archived".bold()
            ]);

            for (index, entry) in archived.into_iter().enumerate() {
                let archived_at = entry
                    .timestamp
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string();
                table.add_row(prettytable::row![
                    synthetic_id(index).to_string().cyan(),
                    clip(&entry.title, 40),
                    entry.category,
                    entry.content.len(),
                    archived_at
                ]);
            }

            println!("\nArchived conversations:");
            table.printstd();
            println!();
            println!("Use {} to delete one.", "aspri rm <ID>".cyan());
            println!();
        }
    }

    Ok(())
}
