//! Command-line interface definition for Aspri
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for tasks, the assistant, formalisation and backups.

use crate::formalize::FormalizationStyle;
use crate::locale::Language;
use crate::sync::{SearchField, ViewFilter};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Aspri - offline-first to-do list with an AI assistant
///
/// Manage tasks against the task service, falling back to the local cache
/// when it cannot be reached.
#[derive(Parser, Debug, Clone)]
#[command(name = "aspri")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the local storage database
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Base URL of the task service (e.g. http://localhost:5000/api)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Task list to show
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewArg {
    All,
    Today,
    Tomorrow,
    Upcoming,
    Completed,
    Search,
    Category,
}

/// Task field to search in
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFieldArg {
    All,
    Title,
    Description,
    Category,
}

impl From<SearchFieldArg> for SearchField {
    fn from(arg: SearchFieldArg) -> Self {
        match arg {
            SearchFieldArg::All => SearchField::All,
            SearchFieldArg::Title => SearchField::Title,
            SearchFieldArg::Description => SearchField::Description,
            SearchFieldArg::Category => SearchField::Category,
        }
    }
}

/// Build the view filter for `aspri tasks`
///
/// `--query` alone implies a search and `--category` alone implies a
/// category view.
pub fn view_filter(
    view: ViewArg,
    query: Option<String>,
    field: SearchFieldArg,
    category: Option<String>,
) -> crate::error::Result<ViewFilter> {
    let filter = match (view, query, category) {
        (ViewArg::Search, query, _) | (ViewArg::All, query @ Some(_), None) => ViewFilter::Search {
            query: query.unwrap_or_default(),
            field: field.into(),
        },
        (ViewArg::Category, _, Some(label)) | (ViewArg::All, None, Some(label)) => {
            ViewFilter::Category(label)
        }
        (ViewArg::Category, _, None) => {
            return Err(crate::error::AspriError::InvalidInput(
                "--category is required for the category view".to_string(),
            )
            .into())
        }
        (ViewArg::All, Some(_), Some(_)) => {
            return Err(crate::error::AspriError::InvalidInput(
                "Use --view search or --view category to combine --query and --category"
                    .to_string(),
            )
            .into())
        }
        (ViewArg::All, None, None) => ViewFilter::All,
        (ViewArg::Today, _, _) => ViewFilter::Today,
        (ViewArg::Tomorrow, _, _) => ViewFilter::Tomorrow,
        (ViewArg::Upcoming, _, _) => ViewFilter::Upcoming,
        (ViewArg::Completed, _, _) => ViewFilter::Completed,
    };
    Ok(filter)
}

/// Available commands for Aspri
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List tasks
    Tasks {
        /// Which tasks to show
        #[arg(long, value_enum, default_value_t = ViewArg::All)]
        view: ViewArg,

        /// Search text
        #[arg(short, long)]
        query: Option<String>,

        /// Field to search in
        #[arg(long, value_enum, default_value_t = SearchFieldArg::All)]
        field: SearchFieldArg,

        /// Category label (any language)
        #[arg(long)]
        category: Option<String>,
    },

    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,

        /// Category label
        #[arg(short, long)]
        category: Option<String>,

        /// Priority (High, Medium, Low)
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Mark a task completed
    Done {
        /// Task id
        id: i64,
    },

    /// Mark a task not completed
    Undo {
        /// Task id
        id: i64,
    },

    /// Delete a task (negative ids remove archived conversations)
    Rm {
        /// Task id
        #[arg(allow_negative_numbers = true)]
        id: i64,
    },

    /// Ask the assistant one question
    Ask {
        /// Question text
        message: String,

        /// Override the provider (gemini, openai, claude, deepseek)
        #[arg(short, long)]
        provider: Option<String>,

        /// Override the model
        #[arg(short, long)]
        model: Option<String>,

        /// API key to use and remember
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Start an interactive conversation with the assistant
    Chat {
        /// Override the provider (gemini, openai, claude, deepseek)
        #[arg(short, long)]
        provider: Option<String>,

        /// Override the model
        #[arg(short, long)]
        model: Option<String>,

        /// API key to use and remember
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Rewrite text in a more formal register
    Formalize {
        /// Text to rewrite
        text: String,

        /// Target style (professional, technical, formal)
        #[arg(short, long, default_value = "professional")]
        style: FormalizationStyle,

        /// Output language (en, id, ja); defaults to the configured language
        #[arg(short, long)]
        language: Option<Language>,

        /// Personal Gemini API key to save
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Manage local data backups
    Backup {
        /// Backup subcommand
        #[command(subcommand)]
        command: BackupCommand,
    },

    /// Manage the assistant conversation
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// Backup subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum BackupCommand {
    /// Take a backup now
    Create,

    /// List stored backups
    List,

    /// Restore a stored backup (current data is backed up first)
    Restore {
        /// Backup name as shown by `backup list`
        name: String,
    },

    /// Write all data as JSON
    Export {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load data from an exported JSON file
    Import {
        /// File produced by `backup export`
        file: PathBuf,
    },

    /// Show storage usage
    Stats,

    /// Delete all data except name and language (a backup is taken first)
    Clear {
        /// Skip the confirmation
        #[arg(long)]
        yes: bool,
    },
}

/// Conversation history subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// Show the current conversation
    List,

    /// Delete the current conversation
    Clear,

    /// Move the current conversation to the completed list
    Archive {
        /// Title for the archived conversation
        title: String,

        /// Category label
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show archived conversations
    Archived,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_tasks_defaults() {
        let cli = Cli::try_parse_from(["aspri", "tasks"]).unwrap();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        if let Commands::Tasks {
            view,
            query,
            field,
            category,
        } = cli.command
        {
            assert_eq!(view, ViewArg::All);
            assert_eq!(query, None);
            assert_eq!(field, SearchFieldArg::All);
            assert_eq!(category, None);
        } else {
            panic!("Expected Tasks command");
        }
    }

    #[test]
    fn test_cli_parse_global_overrides() {
        let cli = Cli::try_parse_from([
            "aspri",
            "--storage-path",
            "/tmp/a.db",
            "--api-url",
            "http://localhost:9999/api",
            "-v",
            "tasks",
            "--view",
            "today",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.storage_path.as_deref(), Some("/tmp/a.db"));
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9999/api"));
    }

    #[test]
    fn test_cli_parse_add() {
        let cli = Cli::try_parse_from([
            "aspri",
            "add",
            "Buy milk",
            "--due",
            "2024-03-10",
            "--category",
            "Pribadi",
            "--priority",
            "High",
        ])
        .unwrap();
        if let Commands::Add {
            title,
            description,
            due,
            category,
            priority,
        } = cli.command
        {
            assert_eq!(title, "Buy milk");
            assert_eq!(description, None);
            assert_eq!(due.as_deref(), Some("2024-03-10"));
            assert_eq!(category.as_deref(), Some("Pribadi"));
            assert_eq!(priority.as_deref(), Some("High"));
        } else {
            panic!("Expected Add command");
        }
    }

    #[test]
    fn test_cli_parse_rm_negative_id() {
        let cli = Cli::try_parse_from(["aspri", "rm", "-1001"]).unwrap();
        assert!(matches!(cli.command, Commands::Rm { id: -1001 }));
    }

    #[test]
    fn test_cli_parse_formalize() {
        let cli = Cli::try_parse_from([
            "aspri",
            "formalize",
            "hai bos",
            "--style",
            "technical",
            "--language",
            "id",
        ])
        .unwrap();
        if let Commands::Formalize {
            text,
            style,
            language,
            api_key,
        } = cli.command
        {
            assert_eq!(text, "hai bos");
            assert_eq!(style, FormalizationStyle::Technical);
            assert_eq!(language, Some(Language::Id));
            assert_eq!(api_key, None);
        } else {
            panic!("Expected Formalize command");
        }
    }

    #[test]
    fn test_cli_parse_formalize_rejects_unknown_style() {
        assert!(Cli::try_parse_from(["aspri", "formalize", "x", "--style", "casual"]).is_err());
    }

    #[test]
    fn test_cli_parse_backup_restore() {
        let cli = Cli::try_parse_from(["aspri", "backup", "restore", "backup_1"]).unwrap();
        if let Commands::Backup {
            command: BackupCommand::Restore { name },
        } = cli.command
        {
            assert_eq!(name, "backup_1");
        } else {
            panic!("Expected Backup Restore command");
        }
    }

    #[test]
    fn test_cli_parse_history_archive() {
        let cli =
            Cli::try_parse_from(["aspri", "history", "archive", "Trip ideas", "-c", "Personal"])
                .unwrap();
        if let Commands::History {
            command: HistoryCommand::Archive { title, category },
        } = cli.command
        {
            assert_eq!(title, "Trip ideas");
            assert_eq!(category.as_deref(), Some("Personal"));
        } else {
            panic!("Expected History Archive command");
        }
    }

    #[test]
    fn test_view_filter_inference() {
        assert_eq!(
            view_filter(ViewArg::All, None, SearchFieldArg::All, None).unwrap(),
            ViewFilter::All
        );
        assert_eq!(
            view_filter(ViewArg::All, Some("milk".into()), SearchFieldArg::Title, None).unwrap(),
            ViewFilter::Search {
                query: "milk".to_string(),
                field: SearchField::Title
            }
        );
        assert_eq!(
            view_filter(ViewArg::All, None, SearchFieldArg::All, Some("Kerja".into())).unwrap(),
            ViewFilter::Category("Kerja".to_string())
        );
        assert!(view_filter(ViewArg::Category, None, SearchFieldArg::All, None).is_err());
        assert_eq!(
            view_filter(ViewArg::Upcoming, None, SearchFieldArg::All, None).unwrap(),
            ViewFilter::Upcoming
        );
    }
}
