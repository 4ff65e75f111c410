//! Configuration errors and parsing helpers.

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Expand environment variables in a string.
/// Supports ${VAR} and ${VAR:-default} syntax.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    regex
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .into_owned()
}

/// Characters that may not appear in a metric name.
///
/// `:` separates name and value, `|` and `@` delimit the StatsD type and rate.
const RESERVED_NAME_CHARS: [char; 3] = [':', '|', '@'];

/// Check that a metric name can travel through the sample encoding and the
/// StatsD line format unchanged.
pub fn validate_metric_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("name cannot be empty".to_string());
    }
    if let Some(c) = name
        .chars()
        .find(|c| RESERVED_NAME_CHARS.contains(c) || c.is_whitespace())
    {
        return Err(format!("name '{name}' contains reserved character {c:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_no_vars() {
        assert_eq!(expand_env_vars("plain-secret"), "plain-secret");
    }

    #[test]
    fn test_expand_env_vars_with_default() {
        let result = expand_env_vars("${NONEXISTENT_MAMBO_VAR_12345:-fallback}");
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_expand_env_vars_from_env() {
        // SAFETY: This test runs in isolation and only modifies a test-specific variable.
        unsafe {
            std::env::set_var("MAMBO_TEST_EXPAND_PASSWORD", "s3cret");
        }
        let result = expand_env_vars("${MAMBO_TEST_EXPAND_PASSWORD}");
        assert_eq!(result, "s3cret");
        // SAFETY: Cleanup test variable.
        unsafe {
            std::env::remove_var("MAMBO_TEST_EXPAND_PASSWORD");
        }
    }

    #[test]
    fn test_validate_metric_name() {
        assert!(validate_metric_name("mysql.server.query1").is_ok());
        assert!(validate_metric_name("replication_lag-01").is_ok());

        assert!(validate_metric_name("").unwrap_err().contains("empty"));
        assert!(validate_metric_name("a:b").unwrap_err().contains("reserved"));
        assert!(validate_metric_name("a|c").is_err());
        assert!(validate_metric_name("a@1").is_err());
        assert!(validate_metric_name("has space").is_err());
    }
}
