//! Assistant commands
//!
//! `ask` sends a single question; `chat` runs a readline loop that keeps
//! sending lines until the user quits. Both share one [`AssistantSession`]
//! so the conversation log is the same either way.

use crate::ai::session::{AssistantSession, ChatMessage, Role};
use crate::ai::{AiBridge, AiSettings};
use crate::config::Config;
use crate::error::{AspriError, Result};
use crate::storage::KeyValueStore;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;

/// Command-line overrides for the assistant settings
#[derive(Debug, Clone, Default)]
pub struct AssistantOverrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

/// Settings for this run: overrides, then config, then saved settings
///
/// An explicit API key on the command line is saved for later runs.
pub fn effective_settings(
    config: &Config,
    session: &AssistantSession,
    overrides: AssistantOverrides,
) -> Result<AiSettings> {
    let mut settings = config.assistant.clone();
    if let Some(provider) = overrides.provider {
        settings.provider = provider;
    }
    if let Some(model) = overrides.model {
        settings.model = Some(model);
    }
    let remember = overrides.api_key.is_some();
    if let Some(api_key) = overrides.api_key {
        settings.api_key = Some(api_key);
    }

    // Validate early so a typo never reaches the saved settings
    settings.provider.parse::<crate::ai::ProviderKind>()?;

    let settings = session.resolve_settings(&settings)?;
    if remember {
        session.save_settings(&settings)?;
        tracing::info!("Saved assistant settings for provider {}", settings.provider);
    }
    Ok(settings)
}

/// Ask one question and print the reply
pub async fn ask_once(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    message: &str,
    overrides: AssistantOverrides,
) -> Result<()> {
    let session = AssistantSession::new(store);
    let settings = effective_settings(config, &session, overrides)?;
    let bridge = AiBridge::from_settings(&settings)?;

    match session.ask(&bridge, &settings, message).await {
        Ok(reply) => {
            println!("{}", reply.content);
            Ok(())
        }
        Err(e) => {
            print_failure(&e, &settings.provider);
            Err(e)
        }
    }
}

/// Run the interactive chat loop
///
/// Lines starting with `/` are commands: `/history`, `/clear`,
/// `/archive <title>`, `/exit`.
pub async fn run_chat(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    overrides: AssistantOverrides,
) -> Result<()> {
    let session = AssistantSession::new(store);
    let settings = effective_settings(config, &session, overrides)?;
    let bridge = AiBridge::from_settings(&settings)?;

    println!(
        "{}, {} ({})",
        config.language.greeting_now().bold(),
        "ask me anything".bold(),
        settings.provider.cyan()
    );
    println!("Type /help for commands, /exit to quit.\n");

    let mut rl = DefaultEditor::new()
        .map_err(|e| AspriError::Config(format!("Failed to start line editor: {}", e)))?;

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                if let Some(command) = trimmed.strip_prefix('/') {
                    if !handle_chat_command(&session, command)? {
                        break;
                    }
                    continue;
                }

                match session.ask(&bridge, &settings, trimmed).await {
                    Ok(reply) => println!("{} {}\n", "aspri>".green(), reply.content),
                    Err(e) => print_failure(&e, &settings.provider),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

/// Handle a slash command; returns false when the loop should stop
fn handle_chat_command(session: &AssistantSession, command: &str) -> Result<bool> {
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(n, r)| (n, r.trim()))
        .unwrap_or((command, ""));

    match name {
        "exit" | "quit" => return Ok(false),
        "history" => print_history(&session.history()?),
        "clear" => {
            session.clear()?;
            println!("{}", "Conversation cleared.".green());
        }
        "archive" => match session.archive_conversation(rest, None) {
            Ok(entry) => println!("{}", format!("Archived as \"{}\".", entry.title).green()),
            Err(e) => println!("{}", e.to_string().red()),
        },
        "help" => {
            println!("/history          show the conversation");
            println!("/clear            delete the conversation");
            println!("/archive <title>  move the conversation to completed tasks");
            println!("/exit             leave the chat");
        }
        other => println!("{}", format!("Unknown command: /{}", other).yellow()),
    }
    Ok(true)
}

/// Print a conversation log
pub fn print_history(history: &[ChatMessage]) {
    if history.is_empty() {
        println!("{}", "No conversation yet.".yellow());
        return;
    }
    for message in history {
        let time = message
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M");
        let who = match message.role {
            Role::User => "you".cyan(),
            Role::Assistant => "aspri".green(),
        };
        println!("[{}] {}: {}", time, who, message.content);
    }
}

fn print_failure(err: &anyhow::Error, provider: &str) {
    let hint = match err.downcast_ref::<AspriError>() {
        Some(AspriError::MissingCredentials(_)) => format!(
            "No API key for {}. Pass --api-key or set ASPRI_API_KEY.",
            provider
        ),
        Some(AspriError::UnexpectedResponseFormat(_)) => {
            "The provider answered in an unexpected format. Try another provider.".to_string()
        }
        Some(AspriError::ProviderStatus { status, .. }) => {
            format!("{} rejected the request with status {}.", provider, status)
        }
        _ => format!("Could not reach {}. Check your connection and API key.", provider),
    };
    eprintln!("{}", hint.red());
    tracing::debug!("Assistant error: {:#}", err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_effective_settings_overrides_and_saves_key() {
        let store = Arc::new(MemoryStore::new());
        let session = AssistantSession::new(store);
        let config = Config::default();

        let settings = effective_settings(
            &config,
            &session,
            AssistantOverrides {
                provider: Some("claude".to_string()),
                model: None,
                api_key: Some("sk-ant".to_string()),
            },
        )
        .unwrap();
        assert_eq!(settings.provider, "claude");
        assert_eq!(settings.api_key.as_deref(), Some("sk-ant"));

        let later = effective_settings(&config, &session, AssistantOverrides::default()).unwrap();
        assert_eq!(later.provider, "claude");
        assert_eq!(later.api_key.as_deref(), Some("sk-ant"));
    }

    #[test]
    fn test_effective_settings_rejects_unknown_provider() {
        let session = AssistantSession::new(Arc::new(MemoryStore::new()));
        let err = effective_settings(
            &Config::default(),
            &session,
            AssistantOverrides {
                provider: Some("bard".to_string()),
                api_key: Some("k".to_string()),
                ..AssistantOverrides::default()
            },
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AspriError>(),
            Some(AspriError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn test_chat_commands() {
        let session = AssistantSession::new(Arc::new(MemoryStore::new()));
        session.append(ChatMessage::user("hello")).unwrap();

        assert!(handle_chat_command(&session, "history").unwrap());
        assert!(handle_chat_command(&session, "archive  Greeting ").unwrap());
        assert_eq!(session.completed_ai_tasks().unwrap()[0].title, "Greeting");
        assert!(session.history().unwrap().is_empty());
        assert!(!handle_chat_command(&session, "exit").unwrap());
    }
}
