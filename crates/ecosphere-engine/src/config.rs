use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_REQUEST_TIMEOUT_S: f64 = 60.0;
const MIN_REQUEST_TIMEOUT_S: f64 = 5.0;
const MAX_REQUEST_TIMEOUT_S: f64 = 300.0;

const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY", "VITE_GEMINI_API_KEY"];

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    /// Upper bound for a single candidate attempt.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs_f64(DEFAULT_REQUEST_TIMEOUT_S),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(non_empty_env)
    }

    /// Builds the config from `lookup`, which returns a trimmed non-empty value
    /// for a variable name or `None`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = API_KEY_VARS.iter().find_map(|key| lookup(*key));
        let api_base = lookup("GEMINI_API_BASE")
            .map(|value| value.trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let timeout_s = lookup("GEMINI_REQUEST_TIMEOUT")
            .and_then(|value| value.parse::<f64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_S);
        Self {
            api_key,
            api_base,
            request_timeout: clamp_timeout(timeout_s),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: f64) -> Self {
        self.request_timeout = clamp_timeout(seconds);
        self
    }
}

fn clamp_timeout(seconds: f64) -> Duration {
    let seconds = if seconds.is_finite() {
        seconds.clamp(MIN_REQUEST_TIMEOUT_S, MAX_REQUEST_TIMEOUT_S)
    } else {
        DEFAULT_REQUEST_TIMEOUT_S
    };
    Duration::from_secs_f64(seconds)
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn api_key_follows_variable_precedence() {
        let config = EngineConfig::from_lookup(lookup_in(&[
            ("VITE_GEMINI_API_KEY", "vite-key"),
            ("GOOGLE_API_KEY", "google-key"),
            ("GEMINI_API_KEY", "gemini-key"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("gemini-key"));

        let config = EngineConfig::from_lookup(lookup_in(&[
            ("VITE_GEMINI_API_KEY", "vite-key"),
            ("GOOGLE_API_KEY", "google-key"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("google-key"));

        let config = EngineConfig::from_lookup(lookup_in(&[("VITE_GEMINI_API_KEY", "vite-key")]));
        assert_eq!(config.api_key.as_deref(), Some("vite-key"));

        assert!(EngineConfig::from_lookup(lookup_in(&[])).api_key.is_none());
    }

    #[test]
    fn api_base_drops_trailing_slashes() {
        let config = EngineConfig::from_lookup(lookup_in(&[(
            "GEMINI_API_BASE",
            "http://127.0.0.1:8080/v1beta//",
        )]));
        assert_eq!(config.api_base, "http://127.0.0.1:8080/v1beta");

        let config = EngineConfig::from_lookup(lookup_in(&[("GEMINI_API_BASE", "/")]));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn timeout_variable_is_parsed_or_defaulted() {
        let config = EngineConfig::from_lookup(lookup_in(&[("GEMINI_REQUEST_TIMEOUT", "12.5")]));
        assert_eq!(config.request_timeout, Duration::from_millis(12_500));

        let config = EngineConfig::from_lookup(lookup_in(&[("GEMINI_REQUEST_TIMEOUT", "soon")]));
        assert_eq!(config.request_timeout, Duration::from_secs(60));

        let config = EngineConfig::from_lookup(lookup_in(&[("GEMINI_REQUEST_TIMEOUT", "1")]));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn timeout_is_clamped() {
        let config = EngineConfig::default().with_timeout_seconds(1.0);
        assert_eq!(config.request_timeout, Duration::from_secs(5));

        let config = EngineConfig::default().with_timeout_seconds(900.0);
        assert_eq!(config.request_timeout, Duration::from_secs(300));

        let config = EngineConfig::default().with_timeout_seconds(f64::NAN);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn defaults_have_no_key() {
        let config = EngineConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }
}
