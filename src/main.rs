//! Aspri - offline-first to-do list CLI
//!
#![doc = "Aspri - offline-first to-do list CLI"]
#![doc = "Main entry point for the Aspri command-line application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use aspri::cli::{view_filter, Cli, Commands};
use aspri::commands;
use aspri::commands::ask::AssistantOverrides;
use aspri::config::Config;
use aspri::task::{self, NewTask};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let store = commands::open_store(&config)?;

    match cli.command {
        Commands::Tasks {
            view,
            query,
            field,
            category,
        } => {
            let filter = view_filter(view, query, field, category)?;
            tracing::info!("Listing tasks ({})", filter.label());
            commands::tasks::list_tasks(&config, store, filter).await
        }
        Commands::Add {
            title,
            description,
            due,
            category,
            priority,
        } => {
            let due_date = due
                .as_deref()
                .map(task::parse_due)
                .transpose()?;
            let new_task = NewTask {
                description,
                due_date,
                category,
                priority,
                ..NewTask::titled(title)
            };
            commands::tasks::add_task(&config, store, new_task).await
        }
        Commands::Done { id } => commands::tasks::set_completed(&config, store, id, true).await,
        Commands::Undo { id } => commands::tasks::set_completed(&config, store, id, false).await,
        Commands::Rm { id } => commands::tasks::remove_task(&config, store, id).await,
        Commands::Ask {
            message,
            provider,
            model,
            api_key,
        } => {
            if let Some(p) = &provider {
                tracing::debug!("Using provider override: {}", p);
            }
            let overrides = AssistantOverrides {
                provider,
                model,
                api_key,
            };
            commands::ask::ask_once(&config, store, &message, overrides).await
        }
        Commands::Chat {
            provider,
            model,
            api_key,
        } => {
            tracing::info!("Starting interactive chat mode");
            let overrides = AssistantOverrides {
                provider,
                model,
                api_key,
            };
            commands::ask::run_chat(&config, store, overrides).await
        }
        Commands::Formalize {
            text,
            style,
            language,
            api_key,
        } => {
            commands::formalize::run_formalize(&config, store, &text, style, language, api_key)
                .await
        }
        Commands::Backup { command } => {
            tracing::info!("Starting backup command");
            commands::backup::handle_backup(store, command)
        }
        Commands::History { command } => {
            tracing::info!("Starting history command");
            commands::history::handle_history(store, command)
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `ASPRI_LOG_FORMAT=json` switches stderr output to JSON lines.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "aspri=debug" } else { "aspri=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let json = std::env::var("ASPRI_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}
