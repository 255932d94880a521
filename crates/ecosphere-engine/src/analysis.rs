use ecosphere_contracts::analysis::{decode_analysis, response_schema, AnalysisResult, InlineImage};
use ecosphere_contracts::models::capability;
use tracing::warn;

use crate::error::AnalysisError;
use crate::request::{Content, GenerateRequest, Part};
use crate::EcoEngine;

pub const ANALYSIS_SYSTEM_INSTRUCTION: &str = "You are an expert environmental and agricultural scientist. Analyze the image and provide structured JSON output.";

impl EcoEngine {
    /// Classifies an image against `instruction` and decodes the structured reply.
    ///
    /// `image` may be a `data:image/...;base64,` URI or bare base64. Fails fast
    /// with [`AnalysisError::ServiceUnavailable`] when no client is configured.
    /// A reply that does not decode is [`AnalysisError::MalformedResponse`]; it is
    /// not retried on other models.
    pub fn analyze(&self, image: &str, instruction: &str) -> Result<AnalysisResult, AnalysisError> {
        let Some(backend) = self.client.backend() else {
            self.note_unavailable("analyze");
            return Err(AnalysisError::ServiceUnavailable(
                self.client
                    .unavailable_reason()
                    .unwrap_or("AI client unavailable")
                    .to_string(),
            ));
        };

        let request = analysis_request(image, instruction);
        let outcome = self.run_candidates("analyze", capability::VISION, |model| {
            backend.generate(model, &request)
        })?;

        let Some(text) = outcome.value.non_empty_text() else {
            warn!(model = %outcome.model, "analysis reply had no text");
            return Err(AnalysisError::MalformedResponse(format!(
                "{} returned no text",
                outcome.model
            )));
        };
        decode_analysis(text).map_err(|reason| {
            warn!(model = %outcome.model, %reason, "analysis reply did not decode");
            AnalysisError::MalformedResponse(reason)
        })
    }
}

fn analysis_request(image: &str, instruction: &str) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content::user(vec![
            Part::from(InlineImage::from_encoded(image)),
            Part::Text(instruction.to_string()),
        ])],
        ..GenerateRequest::default()
    }
    .with_system_instruction(ANALYSIS_SYSTEM_INSTRUCTION)
    .with_response_schema(response_schema())
}
