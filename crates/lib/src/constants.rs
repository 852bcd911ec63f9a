//! # Shared Constants
//!
//! Names shared by the library, the CLI and the tests.

/// The configuration file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "kbrefine.yml";

/// Prefix of environment variables that override configuration values.
pub const ENV_PREFIX: &str = "KBREFINE";

/// Separator for nested keys in environment overrides.
pub const ENV_SEPARATOR: &str = "__";

/// Fallback environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "AI_API_KEY";
