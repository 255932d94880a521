mod advice;
mod analysis;
mod chat;
mod client;
mod config;
mod error;
mod fallback;
mod gemini;
mod request;

use ecosphere_contracts::events::{payload, EventPayload, EventWriter};
use ecosphere_contracts::models::{ModelRegistry, ModelSelector};
use serde_json::json;
use tracing::{info, warn};

pub use analysis::ANALYSIS_SYSTEM_INSTRUCTION;
pub use chat::{ChatSession, CHAT_EMPTY_REPLY, CHAT_SYSTEM_INSTRUCTION};
pub use client::{AiClientState, GenerativeBackend};
pub use config::{EngineConfig, DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_S};
pub use error::{AnalysisError, CandidateFailure, FallbackError};
pub use fallback::{run_with_fallback, run_with_fallback_reporting, FallbackOutcome};
pub use gemini::GeminiBackend;
pub use request::{Content, GenerateRequest, GenerateResponse, Part, Role};

const EVENT_ERROR_MAX_CHARS: usize = 600;

/// Entry point for every AI-backed operation.
///
/// Holds the client state decided at startup, the model table candidates are
/// drawn from, and an optional audit log. Cheap to share behind a reference;
/// nothing here is mutated after construction.
pub struct EcoEngine {
    client: AiClientState,
    selector: ModelSelector,
    events: Option<EventWriter>,
}

impl EcoEngine {
    pub fn new(client: AiClientState) -> Self {
        Self {
            client,
            selector: ModelSelector::new(None),
            events: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(AiClientState::initialize(config))
    }

    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.selector = ModelSelector::new(Some(registry));
        self
    }

    pub fn with_events(mut self, writer: EventWriter) -> Self {
        self.events = Some(writer);
        self
    }

    pub fn is_available(&self) -> bool {
        self.client.is_available()
    }

    fn candidates(&self, capability: &str) -> Vec<String> {
        match self.selector.candidates(capability) {
            Ok(candidates) => candidates.models,
            Err(reason) => {
                warn!(capability, %reason, "no candidate models");
                Vec::new()
            }
        }
    }

    /// Runs `attempt` across the candidates for `capability`, recording the outcome.
    fn run_candidates<T, F>(
        &self,
        operation: &str,
        capability: &str,
        attempt: F,
    ) -> Result<FallbackOutcome<T>, FallbackError>
    where
        F: FnMut(&str) -> anyhow::Result<T>,
    {
        let candidates = self.candidates(capability);
        let result = run_with_fallback_reporting(&candidates, attempt, |failure| {
            self.emit_event(
                "candidate_failed",
                payload([
                    ("operation", json!(operation)),
                    ("model", json!(failure.model)),
                    ("error", json!(failure.error)),
                ]),
            );
        });
        match &result {
            Ok(outcome) => {
                info!(operation, model = %outcome.model, attempts = outcome.attempts(), "request completed");
                self.emit_event(
                    "request_completed",
                    payload([
                        ("operation", json!(operation)),
                        ("model", json!(outcome.model)),
                        ("attempts", json!(outcome.attempts())),
                    ]),
                );
            }
            Err(err) => {
                warn!(operation, error = %err, "request failed on every candidate");
                self.emit_event(
                    "request_failed",
                    payload([
                        ("operation", json!(operation)),
                        ("error", json!(truncate_text(&err.to_string(), EVENT_ERROR_MAX_CHARS))),
                    ]),
                );
            }
        }
        result
    }

    fn note_unavailable(&self, operation: &str) {
        let reason = self.client.unavailable_reason().unwrap_or_default();
        warn!(operation, reason, "AI service unavailable; skipping request");
        self.emit_event(
            "service_unavailable",
            payload([
                ("operation", json!(operation)),
                ("reason", json!(reason)),
            ]),
        );
    }

    fn emit_event(&self, event_type: &str, payload: EventPayload) {
        let Some(events) = self.events.as_ref() else {
            return;
        };
        if let Err(err) = events.emit(event_type, payload) {
            warn!(event_type, error = %format!("{err:#}"), "failed to record event");
        }
    }
}

pub(crate) fn error_chain_text(err: &anyhow::Error, max_chars: usize) -> String {
    let mut parts = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if parts
            .last()
            .map(|existing: &String| existing == trimmed)
            .unwrap_or(false)
        {
            continue;
        }
        parts.push(trimmed.to_string());
    }
    if parts.is_empty() {
        return truncate_text(&err.to_string(), max_chars);
    }
    truncate_text(&parts.join(" | caused by: "), max_chars)
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
