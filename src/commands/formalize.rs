use crate::ai::AiBridge;
use crate::config::Config;
use crate::error::{AspriError, Result};
use crate::formalize::{FormalizationStyle, Formalizer};
use crate::locale::Language;
use crate::storage::KeyValueStore;
use colored::Colorize;
use std::sync::Arc;

/// Rewrite `text` and print the result
pub async fn run_formalize(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    text: &str,
    style: FormalizationStyle,
    language: Option<Language>,
    api_key: Option<String>,
) -> Result<()> {
    let formalizer = Formalizer::new(store, config.formalization.clone());
    if let Some(key) = api_key {
        formalizer.set_api_key(&key)?;
        println!("{}", "Saved formalization API key.".green());
    }

    let bridge = AiBridge::new(config.assistant.request_timeout_seconds)?;
    let language = language.unwrap_or(config.language);

    let result = match formalizer.formalize(&bridge, text, style, language).await {
        Ok(result) => result,
        Err(e) => {
            if let Some(AspriError::UsageLimitReached { limit, .. }) = e.downcast_ref::<AspriError>() {
                eprintln!(
                    "{}",
                    format!(
                        "All {} free formalizations are used. Save your own key with {}.",
                        limit,
                        "aspri formalize --api-key <KEY>"
                    )
                    .red()
                );
            }
            return Err(e);
        }
    };

    println!("{}", result.text);
    println!();
    if result.via_ai {
        if formalizer.user_api_key()?.is_none() {
            println!(
                "{}",
                format!("{} free formalizations left.", formalizer.remaining_free()?).dimmed()
            );
        }
    } else {
        println!(
            "{}",
            "AI unavailable, used the offline rewrite instead.".yellow()
        );
    }
    Ok(())
}
