use std::time::Duration;
use tracing::warn;

pub const API_BASE_ENV: &str = "ASK_API_BASE";
pub const TIMEOUT_ENV: &str = "ASK_REQUEST_TIMEOUT_SECS";
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base: String,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var(API_BASE_ENV).ok(),
            std::env::var(TIMEOUT_ENV).ok(),
        )
    }

    fn from_values(api_base: Option<String>, timeout_secs: Option<String>) -> Self {
        let api_base = api_base
            .map(|base| base.trim().trim_end_matches('/').to_string())
            .filter(|base| !base.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let request_timeout = match timeout_secs.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_REQUEST_TIMEOUT,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(value = raw, "ignoring invalid {TIMEOUT_ENV}, using default");
                    DEFAULT_REQUEST_TIMEOUT
                }
            },
        };

        Self {
            api_base,
            request_timeout,
        }
    }

    pub fn ask_url(&self) -> String {
        format!("{}/api/ask", self.api_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_values_fall_back_to_local_endpoint() {
        let config = Config::from_values(None, None);
        assert_eq!(config, Config::default());
        assert_eq!(config.ask_url(), "http://localhost:8000/api/ask");
    }

    #[test]
    fn trailing_slash_is_trimmed_from_base() {
        let config = Config::from_values(Some("https://qa.example.com/".to_string()), None);
        assert_eq!(config.ask_url(), "https://qa.example.com/api/ask");
    }

    #[test]
    fn blank_base_uses_default() {
        let config = Config::from_values(Some("   ".to_string()), None);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn timeout_override_parses_seconds_and_rejects_garbage() {
        let config = Config::from_values(None, Some("15".to_string()));
        assert_eq!(config.request_timeout, Duration::from_secs(15));

        let config = Config::from_values(None, Some("soon".to_string()));
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);

        let config = Config::from_values(None, Some("0".to_string()));
        assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }
}
