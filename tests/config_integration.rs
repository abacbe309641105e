mod common;

use serial_test::serial;
use std::path::PathBuf;

use aspri::cli::{Cli, Commands, ViewArg, SearchFieldArg};
use aspri::config::Config;
use aspri::locale::Language;

use common::temp_config_file;

fn cli() -> Cli {
    Cli {
        config: None,
        verbose: false,
        storage_path: None,
        api_url: None,
        command: Commands::Tasks {
            view: ViewArg::All,
            query: None,
            field: SearchFieldArg::All,
            category: None,
        },
    }
}

#[test]
#[serial]
fn test_load_from_file() {
    let (_dir, path) = temp_config_file(
        r#"
api:
  base_url: http://tasks.example:9000/api
assistant:
  provider: openai
  model: gpt-4o
formalization:
  free_usage_limit: 3
  api_key: shared
language: id
"#,
    );

    let config = Config::load(path.to_str().unwrap(), &cli()).unwrap();
    assert_eq!(config.api.base_url, "http://tasks.example:9000/api");
    assert_eq!(config.api.request_timeout_seconds, 30);
    assert_eq!(config.assistant.provider, "openai");
    assert_eq!(config.assistant.model.as_deref(), Some("gpt-4o"));
    assert_eq!(config.formalization.free_usage_limit, 3);
    assert_eq!(config.formalization.api_key.as_deref(), Some("shared"));
    assert_eq!(config.language, Language::Id);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_env_and_cli_layer_over_file() {
    let (_dir, path) = temp_config_file(
        r#"
api:
  base_url: http://file.example/api
assistant:
  provider: gemini
"#,
    );

    std::env::set_var("ASPRI_API_KEY", "env-key");
    std::env::set_var("ASPRI_STORAGE_PATH", "/tmp/env.db");
    let mut cli = cli();
    cli.api_url = Some("http://cli.example/api".to_string());

    let config = Config::load(path.to_str().unwrap(), &cli).unwrap();
    std::env::remove_var("ASPRI_API_KEY");
    std::env::remove_var("ASPRI_STORAGE_PATH");

    assert_eq!(config.api.base_url, "http://cli.example/api");
    assert_eq!(config.assistant.api_key.as_deref(), Some("env-key"));
    assert_eq!(config.storage.path, Some(PathBuf::from("/tmp/env.db")));
}

#[test]
#[serial]
fn test_malformed_file_is_config_error() {
    let (_dir, path) = temp_config_file("api: [not, a, map");
    let err = Config::load(path.to_str().unwrap(), &cli()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
#[serial]
fn test_invalid_provider_fails_validation() {
    let (_dir, path) = temp_config_file("assistant:\n  provider: bard\n");
    let config = Config::load(path.to_str().unwrap(), &cli()).unwrap();
    assert!(config.validate().is_err());
}
