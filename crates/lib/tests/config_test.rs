//! # Configuration Loading Tests
//!
//! Environment variables are process-wide, so every test here holds `ENV_LOCK`.

use kbrefine::config::{load_config, ProviderKind};
use kbrefine::errors::ConfigError;
use std::env;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_yaml_with_variable_substitution() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    // --- 1. Arrange ---
    env::set_var("KB_TEST_GEMINI_KEY", "secret-from-env");
    let file = yaml_file(
        r#"
provider:
  kind: gemini
  model_name: gemini-2.0-flash
  api_key: ${KB_TEST_GEMINI_KEY}
generation:
  max_iterations: 5
quality:
  thresholds:
    overall: 8.0
"#,
    );

    // --- 2. Act ---
    let config = load_config(file.path().to_str()).unwrap();
    env::remove_var("KB_TEST_GEMINI_KEY");

    // --- 3. Assert ---
    assert_eq!(config.provider.kind, ProviderKind::Gemini);
    assert_eq!(config.provider.api_key.as_deref(), Some("secret-from-env"));
    assert_eq!(config.generation.max_iterations, 5);
    assert_eq!(config.quality.thresholds.overall, 8.0);
    // Untouched settings keep their defaults.
    assert_eq!(config.quality.thresholds.technical_accuracy, 8.0);
    assert_eq!(config.research.sources.len(), 3);
}

#[test]
fn test_environment_overrides_file() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let file = yaml_file("generation:\n  max_iterations: 5\n");
    env::set_var("KBREFINE_GENERATION__MAX_ITERATIONS", "2");

    let config = load_config(file.path().to_str());
    env::remove_var("KBREFINE_GENERATION__MAX_ITERATIONS");

    assert_eq!(config.unwrap().generation.max_iterations, 2);
}

#[test]
fn test_explicit_missing_path_is_an_error() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    let result = load_config(Some("/nonexistent/kbrefine.yml"));

    assert!(matches!(result, Err(ConfigError::General(msg)) if msg.contains("not found")));
}

#[test]
fn test_invalid_weights_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let file = yaml_file("quality:\n  weights:\n    technical_accuracy: 0.9\n");

    let result = load_config(file.path().to_str());

    assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("sum to 1.0")));
}

#[test]
fn test_zero_iterations_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let file = yaml_file("generation:\n  max_iterations: 0\n");

    let result = load_config(file.path().to_str());

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}
