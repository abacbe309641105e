use crate::cli::BackupCommand;
use crate::error::Result;
use crate::storage::backup::format_bytes;
use crate::storage::{BackupManager, KeyValueStore};
use colored::Colorize;
use prettytable::{format, Table};
use std::sync::Arc;

/// Handle backup commands
pub fn handle_backup(store: Arc<dyn KeyValueStore>, command: BackupCommand) -> Result<()> {
    let manager = BackupManager::new(store);

    match command {
        BackupCommand::Create => {
            let entry = manager.create_backup()?;
            println!(
                "{}",
                format!("Created {} ({})", entry.name, format_bytes(entry.size)).green()
            );
        }
        BackupCommand::List => {
            let history = manager.history()?;
            if history.is_empty() {
                println!("{}", "No backups found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
            table.add_row(prettytable::row![
                "Name".bold(),
                "Taken".bold(),
                "Size".bold()
            ]);
            for entry in history {
                let taken = entry
                    .timestamp
                    .with_timezone(&chrono::Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string();
                table.add_row(prettytable::row![
                    entry.name.cyan(),
                    taken,
                    format_bytes(entry.size)
                ]);
            }

            println!("\nBackups:");
            table.printstd();
            println!();
            println!(
                "Use {} to restore one.",
                "aspri backup restore <NAME>".cyan()
            );
        }
        BackupCommand::Restore { name } => {
            manager.restore(&name)?;
            println!("{}", format!("Restored {}", name).green());
        }
        BackupCommand::Export { output } => {
            let json = manager.export()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("{}", format!("Exported to {}", path.display()).green());
                }
                None => println!("{}", json),
            }
        }
        BackupCommand::Import { file } => {
            let json = std::fs::read_to_string(&file)?;
            manager.import(&json)?;
            println!("{}", format!("Imported {}", file.display()).green());
        }
        BackupCommand::Stats => {
            let stats = manager.stats()?;
            println!("Storage used:   {}", format_bytes(stats.total_bytes));
            println!("Quota used:     {:.1}%", stats.usage_percent);
            println!("Tasks:          {}", stats.task_count);
            println!("Completed:      {}", stats.completed_count);
            if let Some(last) = stats.last_modified {
                println!(
                    "Last modified:  {}",
                    last.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
                );
            }
        }
        BackupCommand::Clear { yes } => {
            if !yes {
                println!(
                    "{}",
                    "This deletes all local data except your name and language. Re-run with --yes to confirm."
                        .yellow()
                );
                return Ok(());
            }
            let entry = manager.clear()?;
            println!(
                "{}",
                format!("Cleared local data. Previous state saved as {}", entry.name).green()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, TASKS_KEY};
    use crate::test_utils::{assert_error_contains, temp_sqlite_store};
    use tempfile::tempdir;

    #[test]
    fn test_export_then_import_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.json");

        let source = Arc::new(MemoryStore::with_entries([(TASKS_KEY, r#"[{"id":1,"title":"a"}]"#)]));
        handle_backup(source, BackupCommand::Export { output: Some(path.clone()) }).unwrap();

        let target = Arc::new(MemoryStore::new());
        handle_backup(target.clone(), BackupCommand::Import { file: path }).unwrap();
        assert!(target.get(TASKS_KEY).unwrap().is_some());
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let store = Arc::new(MemoryStore::with_entries([(TASKS_KEY, "[]")]));
        handle_backup(store.clone(), BackupCommand::Clear { yes: false }).unwrap();
        assert!(store.get(TASKS_KEY).unwrap().is_some());

        handle_backup(store.clone(), BackupCommand::Clear { yes: true }).unwrap();
        assert!(store.get(TASKS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_restore_unknown_backup_fails() {
        let store = Arc::new(MemoryStore::new());
        let result = handle_backup(store, BackupCommand::Restore { name: "backup_missing".to_string() });
        assert_error_contains(result, "Backup not found: backup_missing");
    }

    #[test]
    fn test_import_rejects_non_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let (store, _guard) = temp_sqlite_store();
        let result = handle_backup(Arc::new(store), BackupCommand::Import { file: path });
        assert_error_contains(result, "Invalid backup data");
    }

    #[test]
    fn test_create_then_restore_on_sqlite() {
        let (store, _guard) = temp_sqlite_store();
        let store = Arc::new(store);
        store.set(TASKS_KEY, r#"[{"id":1,"title":"keep"}]"#).unwrap();

        handle_backup(store.clone(), BackupCommand::Create).unwrap();
        let name = BackupManager::new(store.clone()).history().unwrap()[0].name.clone();

        store.set(TASKS_KEY, "[]").unwrap();
        handle_backup(store.clone(), BackupCommand::Restore { name }).unwrap();
        assert!(store.get(TASKS_KEY).unwrap().unwrap().contains("keep"));
    }
}
