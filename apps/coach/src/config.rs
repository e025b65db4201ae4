use anyhow::{Context, Result};

const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub llm_timeout_secs: u64,
    /// Request body limit, sized for the resume upload.
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            llm_timeout_secs: optional_env("LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS)?,
            max_upload_bytes: optional_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a positive integer, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            anthropic_api_key: "test-key".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_env_uses_default_when_unset() {
        let value: u64 = optional_env("COACH_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_optional_env_rejects_garbage() {
        std::env::set_var("COACH_TEST_BAD_TIMEOUT", "soon");
        let result: Result<u64> = optional_env("COACH_TEST_BAD_TIMEOUT", 1);
        assert!(result.is_err());
        std::env::remove_var("COACH_TEST_BAD_TIMEOUT");
    }

    #[test]
    fn test_optional_env_parses_value() {
        std::env::set_var("COACH_TEST_UPLOAD_LIMIT", " 2048 ");
        let value: usize = optional_env("COACH_TEST_UPLOAD_LIMIT", 1).unwrap();
        assert_eq!(value, 2048);
        std::env::remove_var("COACH_TEST_UPLOAD_LIMIT");
    }
}
