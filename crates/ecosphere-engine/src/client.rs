use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::gemini::GeminiBackend;
use crate::request::{GenerateRequest, GenerateResponse};

/// External generation capability, addressed per call by model identifier.
pub trait GenerativeBackend: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, model: &str, request: &GenerateRequest) -> Result<GenerateResponse>;
    /// Confirms `model` is reachable with the configured credentials.
    fn check_model(&self, model: &str) -> Result<()>;
}

/// Availability of the AI capability, decided once and shared read-only.
#[derive(Clone)]
pub enum AiClientState {
    Available(Arc<dyn GenerativeBackend>),
    Unavailable { reason: String },
}

impl fmt::Debug for AiClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(backend) => f
                .debug_tuple("Available")
                .field(&backend.name())
                .finish(),
            Self::Unavailable { reason } => f
                .debug_struct("Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

impl AiClientState {
    /// Builds the Gemini client from `config`.
    ///
    /// Never fails: a missing or malformed key, or a client that cannot be
    /// constructed, yields [`AiClientState::Unavailable`] plus a warning.
    pub fn initialize(config: &EngineConfig) -> Self {
        let Some(api_key) = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
        else {
            warn!("GEMINI_API_KEY is not set; AI features are disabled");
            return Self::unavailable("API key is not configured");
        };

        if let Err(reason) = validate_api_key(api_key) {
            warn!(%reason, "rejecting configured API key; AI features are disabled");
            return Self::unavailable(reason);
        }

        match GeminiBackend::new(api_key, &config.api_base, config.request_timeout) {
            Ok(backend) => {
                info!(api_base = %config.api_base, "Gemini client ready");
                Self::from_backend(backend)
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "Gemini client construction failed; AI features are disabled");
                Self::unavailable(format!("client construction failed: {err}"))
            }
        }
    }

    pub fn from_backend<B: GenerativeBackend + 'static>(backend: B) -> Self {
        Self::Available(Arc::new(backend))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn backend(&self) -> Option<&Arc<dyn GenerativeBackend>> {
        match self {
            Self::Available(backend) => Some(backend),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable { reason } => Some(reason.as_str()),
        }
    }
}

fn validate_api_key(key: &str) -> Result<(), String> {
    if key.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return Err("API key contains whitespace or control characters".to_string());
    }
    if !key.is_ascii() {
        return Err("API key contains non-ASCII characters".to_string());
    }
    Ok(())
}
