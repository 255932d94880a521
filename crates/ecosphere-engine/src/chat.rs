use std::sync::Arc;

use anyhow::{Context, Result};
use ecosphere_contracts::models::capability;
use tracing::{debug, warn};

use crate::client::GenerativeBackend;
use crate::request::{Content, GenerateRequest};
use crate::EcoEngine;

pub const CHAT_SYSTEM_INSTRUCTION: &str = "You are 'EcoBot', the AI assistant for Ecosphere Guardian. You help users with food waste reduction, plant health, pollution control, and general sustainability tips. Keep answers concise, friendly, and encouraging.";

pub const CHAT_EMPTY_REPLY: &str = "I'm not sure how to answer that right now.";

/// Multi-turn conversation pinned to one model.
///
/// Sending needs `&mut self`, so one session cannot serve two exchanges at
/// once. Dropping the session ends the conversation.
pub struct ChatSession {
    backend: Arc<dyn GenerativeBackend>,
    model: String,
    history: Vec<Content>,
}

impl ChatSession {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Sends `text` with the prior turns and returns the assistant reply.
    ///
    /// Both turns are kept only when the exchange succeeds.
    pub fn send_message(&mut self, text: &str) -> Result<String> {
        let user_turn = Content::user_text(text);
        let mut contents = self.history.clone();
        contents.push(user_turn.clone());
        let request = GenerateRequest {
            contents,
            ..GenerateRequest::default()
        }
        .with_system_instruction(CHAT_SYSTEM_INSTRUCTION);

        debug!(model = %self.model, turns = self.history.len(), "sending chat message");
        let response = self
            .backend
            .generate(&self.model, &request)
            .with_context(|| format!("chat message failed ({})", self.model))?;
        let reply = response
            .non_empty_text()
            .unwrap_or(CHAT_EMPTY_REPLY)
            .to_string();

        self.history.push(user_turn);
        self.history.push(Content::model_text(reply.clone()));
        Ok(reply)
    }
}

impl EcoEngine {
    /// Opens a chat on the first chat-capable model that answers a lookup.
    ///
    /// `None` when the client is unavailable or no candidate model responds.
    pub fn create_chat_session(&self) -> Option<ChatSession> {
        let Some(backend) = self.client.backend() else {
            self.note_unavailable("chat_session");
            return None;
        };

        match self.run_candidates("chat_session", capability::CHAT, |model| {
            backend.check_model(model)
        }) {
            Ok(outcome) => Some(ChatSession {
                backend: Arc::clone(backend),
                model: outcome.model,
                history: Vec::new(),
            }),
            Err(err) => {
                warn!(error = %err, "chat session unavailable");
                None
            }
        }
    }
}
