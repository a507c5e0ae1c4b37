//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::Result;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Serving requires the language model credential.
    Serve,
    /// Asking requires the language model credential.
    Ask,
    /// Fetching a transcript talks to YouTube only.
    Transcript,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Serve | Operation::Ask => check_api_key(settings),
        Operation::Transcript => Ok(()),
    }
}

/// Check that the configured API key variable is set.
fn check_api_key(settings: &Settings) -> Result<()> {
    settings.api_key().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with_key_env(var: &str) -> Settings {
        let mut settings = Settings::default();
        settings.llm.api_key_env = var.to_string();
        settings
    }

    #[test]
    fn test_missing_key_fails_ask_and_serve() {
        let settings = settings_with_key_env("VIDQUERY_TEST_PREFLIGHT_UNSET");
        std::env::remove_var("VIDQUERY_TEST_PREFLIGHT_UNSET");

        let err = check(Operation::Ask, &settings).unwrap_err();
        assert!(err.to_string().contains("VIDQUERY_TEST_PREFLIGHT_UNSET not set"));
        assert!(check(Operation::Serve, &settings).is_err());
    }

    #[test]
    fn test_empty_key_fails() {
        let settings = settings_with_key_env("VIDQUERY_TEST_PREFLIGHT_EMPTY");
        std::env::set_var("VIDQUERY_TEST_PREFLIGHT_EMPTY", "  ");

        let err = check(Operation::Ask, &settings).unwrap_err();
        assert!(err.to_string().contains("is empty"));
    }

    #[test]
    fn test_present_key_passes() {
        let settings = settings_with_key_env("VIDQUERY_TEST_PREFLIGHT_SET");
        std::env::set_var("VIDQUERY_TEST_PREFLIGHT_SET", "sk-test");

        assert!(check(Operation::Serve, &settings).is_ok());
    }

    #[test]
    fn test_transcript_has_no_requirements() {
        let settings = settings_with_key_env("VIDQUERY_TEST_PREFLIGHT_UNSET_TOO");
        assert!(check(Operation::Transcript, &settings).is_ok());
    }
}
