use llm_switchboard::AppConfig;
use llm_switchboard::config::ConfigError;
use serial_test::serial;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("switchboard.toml");
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn loads_full_document() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[server]
bind = "0.0.0.0:9100"
cors_origins = ["https://app.example.com"]

[dispatch]
listing_timeout_secs = 3
generation_timeout_secs = 45
system_prompt = ""

[providers.azure]
endpoint = "https://res.openai.azure.com/"
api_version = "2024-06-01"
models = ["gpt-4o", "gpt-4o-mini"]

[providers.NVIDIA]
enabled = false
"#,
    );

    let config = AppConfig::load(Some(path.as_path())).expect("config loads");

    assert_eq!(config.server.bind.to_string(), "0.0.0.0:9100");
    assert!(!config.server.allows_any_origin());
    assert_eq!(config.dispatch.listing_timeout, Duration::from_secs(3));
    assert_eq!(config.dispatch.generation_timeout, Some(Duration::from_secs(45)));
    assert_eq!(config.dispatch.system_prompt, "");

    let azure = config.provider_settings("azure");
    assert_eq!(azure.endpoint_or(""), "https://res.openai.azure.com");
    assert_eq!(azure.api_version.as_deref(), Some("2024-06-01"));
    assert_eq!(azure.models.len(), 2);

    assert!(!config.provider_settings("nvidia").enabled);
    assert!(config.provider_settings("groq").enabled);
}

#[test]
fn explicit_missing_file_is_an_error() {
    let err = AppConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server\nbind = ");
    let err = AppConfig::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[providers.openai]\napi_key = \"sk-nope\"\n");
    let err = AppConfig::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn invalid_bind_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[server]\nbind = \"localhost\"\n");
    let err = AppConfig::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBind { value } if value == "localhost"));
}

#[test]
fn unregistered_provider_section_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[providers.openia]\n");
    let err = AppConfig::load(Some(path.as_path())).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownProvider { provider } if provider == "openia"));
}

#[test]
#[serial]
fn endpoint_expands_environment_variables() {
    // SAFETY: serialized with the other env-touching tests.
    unsafe { std::env::set_var("SWITCHBOARD_TEST_DATABRICKS_HOST", "dbc-1234.cloud.databricks.com") };

    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "[providers.databricks]\nendpoint = \"https://${SWITCHBOARD_TEST_DATABRICKS_HOST}\"\n",
    );
    let config = AppConfig::load(Some(path.as_path())).expect("config loads");

    unsafe { std::env::remove_var("SWITCHBOARD_TEST_DATABRICKS_HOST") };

    assert_eq!(
        config.provider_settings("databricks").endpoint.as_deref(),
        Some("https://dbc-1234.cloud.databricks.com")
    );
}

#[test]
#[serial]
fn missing_default_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(dir.path()).unwrap();

    let result = AppConfig::load(None);

    std::env::set_current_dir(previous).unwrap();
    let config = result.expect("defaults");
    assert_eq!(config.server.bind.to_string(), "127.0.0.1:8000");
    assert_eq!(config.dispatch.listing_timeout, Duration::from_secs(10));
    assert!(config.dispatch.generation_timeout.is_none());
    assert_eq!(config.dispatch.system_prompt, "Answer the following question:");
    assert!(config.providers.is_empty());
}
