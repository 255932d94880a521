use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::client::GenerativeBackend;
use crate::request::{Content, GenerateRequest, GenerateResponse, Part};
use crate::truncate_text;

const ERROR_BODY_MAX_CHARS: usize = 512;

/// `generateContent` over the Gemini REST API.
pub struct GeminiBackend {
    api_key: String,
    api_base: String,
    http: HttpClient,
}

impl GeminiBackend {
    pub fn new(api_key: &str, api_base: &str, request_timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(request_timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            api_key: api_key.to_string(),
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            http,
        })
    }

    fn model_url(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}", self.api_base, model_path)
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        format!("{}:generateContent", self.model_url(model))
    }
}

impl GenerativeBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, model: &str, request: &GenerateRequest) -> Result<GenerateResponse> {
        let endpoint = self.endpoint_for_model(model);
        let payload = build_payload(request);
        debug!(%endpoint, web_search = request.web_search, "sending generateContent");

        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .with_context(|| format!("Gemini request failed ({model})"))?;
        let response_payload = response_json_or_error("Gemini", response)?;
        extract_response(&response_payload)
    }

    fn check_model(&self, model: &str) -> Result<()> {
        let response = self
            .http
            .get(self.model_url(model))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .with_context(|| format!("Gemini model lookup failed ({model})"))?;
        response_json_or_error("Gemini", response)?;
        Ok(())
    }
}

pub(crate) fn build_payload(request: &GenerateRequest) -> Value {
    let mut payload = Map::new();
    payload.insert(
        "contents".to_string(),
        Value::Array(request.contents.iter().map(content_json).collect()),
    );
    if let Some(instruction) = request
        .system_instruction
        .as_deref()
        .filter(|text| !text.trim().is_empty())
    {
        payload.insert(
            "systemInstruction".to_string(),
            json!({ "parts": [{ "text": instruction }] }),
        );
    }
    if let Some(schema) = request.response_schema.as_ref() {
        payload.insert(
            "generationConfig".to_string(),
            json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }),
        );
    }
    if request.web_search {
        payload.insert("tools".to_string(), json!([{ "googleSearch": {} }]));
    }
    Value::Object(payload)
}

fn content_json(content: &Content) -> Value {
    let parts: Vec<Value> = content
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": text }),
            Part::InlineData { mime_type, data } => json!({
                "inlineData": {
                    "mimeType": mime_type,
                    "data": data,
                }
            }),
        })
        .collect();
    json!({
        "role": content.role.as_str(),
        "parts": parts,
    })
}

pub(crate) fn extract_response(payload: &Value) -> Result<GenerateResponse> {
    if let Some(reason) = payload
        .get("promptFeedback")
        .and_then(|feedback| feedback.get("blockReason"))
        .and_then(Value::as_str)
    {
        bail!("Gemini blocked the prompt ({reason})");
    }

    let Some(candidate) = payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
    else {
        return Ok(GenerateResponse::default());
    };

    let finish_reason = candidate
        .get("finishReason")
        .and_then(Value::as_str)
        .map(str::to_string);
    let texts: Vec<&str> = candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|part| !part.get("thought").and_then(Value::as_bool).unwrap_or(false))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    Ok(GenerateResponse {
        text: if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        },
        finish_reason,
    })
}

fn response_json_or_error(provider: &str, response: HttpResponse) -> Result<Value> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        bail!(
            "{provider} request failed ({code}): {}",
            truncate_text(&body, ERROR_BODY_MAX_CHARS)
        );
    }
    let parsed: Value = serde_json::from_str(&body)
        .with_context(|| format!("{provider} returned invalid JSON payload"))?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ecosphere_contracts::analysis::{response_schema, InlineImage};
    use serde_json::json;

    use super::*;

    fn backend(base: &str) -> GeminiBackend {
        GeminiBackend::new("test-key", base, Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn endpoints_accept_prefixed_and_bare_model_names() {
        let gemini = backend("https://example.test/v1beta/");
        assert_eq!(
            gemini.endpoint_for_model("gemini-2.5-flash"),
            "https://example.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(
            gemini.endpoint_for_model(" models/gemini-2.0-flash "),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(
            gemini.model_url("gemini-1.5-flash"),
            "https://example.test/v1beta/models/gemini-1.5-flash"
        );
    }

    #[test]
    fn structured_payload_has_image_then_text_and_schema() {
        let image = InlineImage::from_encoded("data:image/png;base64,AAAA");
        let request = GenerateRequest {
            contents: vec![Content::user(vec![
                Part::from(image),
                Part::Text("classify food".to_string()),
            ])],
            ..GenerateRequest::default()
        }
        .with_system_instruction("You are an expert.")
        .with_response_schema(response_schema());

        let payload = build_payload(&request);
        assert_eq!(
            payload["contents"][0]["parts"][0],
            json!({ "inlineData": { "mimeType": "image/png", "data": "AAAA" } })
        );
        assert_eq!(payload["contents"][0]["parts"][1], json!({ "text": "classify food" }));
        assert_eq!(payload["contents"][0]["role"], json!("user"));
        assert_eq!(
            payload["systemInstruction"],
            json!({ "parts": [{ "text": "You are an expert." }] })
        );
        assert_eq!(
            payload["generationConfig"]["responseMimeType"],
            json!("application/json")
        );
        assert_eq!(payload["generationConfig"]["responseSchema"], response_schema());
        assert!(payload.get("tools").is_none());
    }

    #[test]
    fn search_payload_declares_google_search_tool() {
        let payload = build_payload(&GenerateRequest::text("AQI in Lagos").with_web_search(true));
        assert_eq!(payload["tools"], json!([{ "googleSearch": {} }]));
        assert!(payload.get("generationConfig").is_none());
        assert!(payload.get("systemInstruction").is_none());
    }

    #[test]
    fn extract_concatenates_text_parts_and_skips_thoughts() -> anyhow::Result<()> {
        let payload = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": "**AQI:** 42\n" },
                    { "text": "**Status:** Good" },
                ]},
                "finishReason": "STOP",
            }]
        });
        let response = extract_response(&payload)?;
        assert_eq!(response.text.as_deref(), Some("**AQI:** 42\n**Status:** Good"));
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        Ok(())
    }

    #[test]
    fn extract_without_candidates_has_no_text() -> anyhow::Result<()> {
        let response = extract_response(&json!({ "candidates": [] }))?;
        assert!(response.text.is_none());
        assert!(response.non_empty_text().is_none());
        Ok(())
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let err = extract_response(&json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Gemini blocked the prompt (SAFETY)");
    }
}
