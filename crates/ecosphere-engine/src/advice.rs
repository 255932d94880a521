use ecosphere_contracts::models::capability;
use ecosphere_contracts::prompts::{DAILY_TIP_FALLBACK, DAILY_TIP_PROMPT};

use crate::request::GenerateRequest;
use crate::EcoEngine;

/// Fixed framing and degraded replies for one plain-text request kind.
#[derive(Debug, Clone, Copy)]
struct TextRequestSpec {
    operation: &'static str,
    capability: &'static str,
    system_instruction: Option<&'static str>,
    web_search: bool,
    empty_reply: &'static str,
    failure_reply: &'static str,
}

const ADVICE: TextRequestSpec = TextRequestSpec {
    operation: "advice",
    capability: capability::TEXT,
    system_instruction: Some(
        "You are a helpful eco-friendly assistant providing brief, actionable advice.",
    ),
    web_search: false,
    empty_reply: "No advice generated.",
    failure_reply: "Unable to retrieve advice at this moment.",
};

const DAILY_TIP: TextRequestSpec = TextRequestSpec {
    operation: "daily_tip",
    empty_reply: DAILY_TIP_FALLBACK,
    failure_reply: DAILY_TIP_FALLBACK,
    ..ADVICE
};

const CITY_AIR_QUALITY: TextRequestSpec = TextRequestSpec {
    operation: "city_air_quality",
    capability: capability::SEARCH,
    system_instruction: Some(
        "You are a real-time environmental monitor. Retrieve the latest AQI data using Google Search. Return a concise, well-formatted summary.",
    ),
    web_search: true,
    empty_reply: "Could not fetch air quality data.",
    failure_reply: "Service unavailable. Please try again later.",
};

const COORDINATES_AIR_QUALITY: TextRequestSpec = TextRequestSpec {
    operation: "coordinates_air_quality",
    capability: capability::SEARCH,
    system_instruction: Some(
        "You are a real-time environmental monitor. Retrieve the latest AQI data for the specific location coordinates using Google Search.",
    ),
    web_search: true,
    empty_reply: "Could not fetch air quality data for your location.",
    failure_reply: "Service unavailable. Please try again later.",
};

const CONTEXTUAL_ADVICE: TextRequestSpec = TextRequestSpec {
    operation: "contextual_advice",
    capability: capability::TEXT,
    system_instruction: None,
    web_search: false,
    empty_reply: "I couldn't generate an answer.",
    failure_reply: "Service unavailable.",
};

impl EcoEngine {
    /// Free-text sustainability advice. Never fails; degrades to a fixed message.
    pub fn get_advice(&self, prompt: &str) -> String {
        self.request_text(&ADVICE, prompt.to_string())
    }

    /// One short sustainability tip; the fixed fallback tip when degraded.
    pub fn get_daily_tip(&self) -> String {
        self.request_text(&DAILY_TIP, DAILY_TIP_PROMPT.to_string())
    }

    /// Live AQI report for a named city, looked up through web search.
    pub fn get_city_air_quality(&self, city: &str) -> String {
        let city = city.trim();
        if city.is_empty() {
            return CITY_AIR_QUALITY.empty_reply.to_string();
        }
        self.request_text(&CITY_AIR_QUALITY, city_air_quality_prompt(city))
    }

    /// Live AQI report for a coordinate pair; the model resolves the place name.
    pub fn get_air_quality_by_coordinates(&self, lat: f64, lon: f64) -> String {
        if !valid_coordinates(lat, lon) {
            return COORDINATES_AIR_QUALITY.empty_reply.to_string();
        }
        self.request_text(&COORDINATES_AIR_QUALITY, coordinates_air_quality_prompt(lat, lon))
    }

    /// Single-turn answer grounded in an earlier reply. Stateless.
    pub fn get_contextual_advice(&self, context: &str, question: &str) -> String {
        self.request_text(&CONTEXTUAL_ADVICE, contextual_prompt(context, question))
    }

    fn request_text(&self, spec: &TextRequestSpec, prompt: String) -> String {
        let Some(backend) = self.client.backend() else {
            self.note_unavailable(spec.operation);
            return spec.failure_reply.to_string();
        };

        let mut request = GenerateRequest::text(prompt).with_web_search(spec.web_search);
        if let Some(instruction) = spec.system_instruction {
            request = request.with_system_instruction(instruction);
        }

        match self.run_candidates(spec.operation, spec.capability, |model| {
            backend.generate(model, &request)
        }) {
            Ok(outcome) => outcome
                .value
                .non_empty_text()
                .unwrap_or(spec.empty_reply)
                .to_string(),
            Err(_) => spec.failure_reply.to_string(),
        }
    }
}

fn valid_coordinates(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

fn city_air_quality_prompt(city: &str) -> String {
    format!(
        "Find the real-time Air Quality Index (AQI) for {city}.\n\
         Provide the response in this structure:\n\
         **AQI:** [Value]\n\
         **Status:** [e.g. Good, Moderate, Unhealthy]\n\
         **Main Pollutant:** [e.g. PM2.5]\n\
         **Health Advice:** [Brief recommendation]\n\
         \n\
         Keep it concise and formatted like a report."
    )
}

fn coordinates_air_quality_prompt(lat: f64, lon: f64) -> String {
    format!(
        "Find the real-time Air Quality Index (AQI) for the location at Latitude {lat}, Longitude {lon}. Identify the nearest city/area.\n\
         Provide the response in this structure:\n\
         **Location:** [City/Area Name]\n\
         **AQI:** [Value]\n\
         **Status:** [e.g. Good, Moderate, Unhealthy]\n\
         **Health Advice:** [Brief recommendation]"
    )
}

fn contextual_prompt(context: &str, question: &str) -> String {
    format!(
        "Context: {context}\n\n\
         User Question: {question}\n\n\
         Answer the user's question based on the context provided. Keep it helpful, concise, and related to sustainability or health."
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ecosphere_contracts::models::{ModelRegistry, ModelSpec};

    use crate::testing::{Reply, StubBackend};
    use crate::{AiClientState, EcoEngine, Part};

    fn engine(stub: &Arc<StubBackend>) -> EcoEngine {
        EcoEngine::new(AiClientState::Available(stub.clone())).with_registry(
            ModelRegistry::from_specs(vec![
                ModelSpec::new("fast", &["text", "search"]),
                ModelSpec::new("legacy", &["text"]),
            ]),
        )
    }

    fn prompt_text(stub: &StubBackend) -> String {
        match stub.last_request().map(|request| request.contents[0].parts[0].clone()) {
            Some(Part::Text(text)) => text,
            other => panic!("unexpected part: {other:?}"),
        }
    }

    #[test]
    fn unavailable_client_returns_fallback_strings() {
        let engine = EcoEngine::new(AiClientState::unavailable("API key is not configured"));
        assert_eq!(engine.get_advice("tip"), "Unable to retrieve advice at this moment.");
        assert_eq!(
            engine.get_city_air_quality("Paris"),
            "Service unavailable. Please try again later."
        );
        assert_eq!(
            engine.get_air_quality_by_coordinates(48.85, 2.35),
            "Service unavailable. Please try again later."
        );
        assert_eq!(engine.get_contextual_advice("ctx", "q"), "Service unavailable.");
    }

    #[test]
    fn advice_falls_back_and_returns_text() {
        let stub = Arc::new(
            StubBackend::new()
                .reply("fast", Reply::Fail("503 overloaded"))
                .reply("legacy", Reply::Text("  Water early in the morning.  ")),
        );
        assert_eq!(engine(&stub).get_advice("irrigation?"), "Water early in the morning.");
        assert_eq!(stub.called_models(), vec!["fast", "legacy"]);
        let request = stub.last_request().unwrap();
        assert!(request
            .system_instruction
            .unwrap_or_default()
            .contains("eco-friendly assistant"));
    }

    #[test]
    fn exhausted_candidates_yield_failure_text() {
        let stub = Arc::new(StubBackend::new());
        assert_eq!(
            engine(&stub).get_advice("tip"),
            "Unable to retrieve advice at this moment."
        );
        assert_eq!(stub.called_models(), vec!["fast", "legacy"]);
    }

    #[test]
    fn empty_reply_yields_empty_text() {
        let stub = Arc::new(StubBackend::new().reply("fast", Reply::Empty));
        assert_eq!(engine(&stub).get_advice("tip"), "No advice generated.");
    }

    #[test]
    fn daily_tip_degrades_to_fixed_tip() {
        let stub = Arc::new(StubBackend::new().reply("fast", Reply::Empty));
        assert_eq!(engine(&stub).get_daily_tip(), "Reduce, Reuse, Recycle!");
        assert!(prompt_text(&stub).starts_with("Give me one short"));

        let offline = EcoEngine::new(AiClientState::unavailable("API key is not configured"));
        assert_eq!(offline.get_daily_tip(), "Reduce, Reuse, Recycle!");
    }

    #[test]
    fn city_lookup_uses_search_models_only() {
        let stub = Arc::new(StubBackend::new().reply("fast", Reply::Fail("timeout")));
        assert_eq!(
            engine(&stub).get_city_air_quality("Lagos"),
            "Service unavailable. Please try again later."
        );
        assert_eq!(stub.called_models(), vec!["fast"]);
        let request = stub.last_request().unwrap();
        assert!(request.web_search);
        assert!(prompt_text(&stub).starts_with("Find the real-time Air Quality Index (AQI) for Lagos."));
    }

    #[test]
    fn blank_city_is_not_sent() {
        let stub = Arc::new(StubBackend::new());
        assert_eq!(
            engine(&stub).get_city_air_quality("  "),
            "Could not fetch air quality data."
        );
        assert!(stub.called_models().is_empty());
    }

    #[test]
    fn coordinates_are_embedded_and_validated() {
        let stub = Arc::new(StubBackend::new().reply("fast", Reply::Text("**Location:** Nairobi")));
        let engine = engine(&stub);
        assert_eq!(
            engine.get_air_quality_by_coordinates(-1.29, 36.82),
            "**Location:** Nairobi"
        );
        assert!(prompt_text(&stub).contains("Latitude -1.29, Longitude 36.82"));

        assert_eq!(
            engine.get_air_quality_by_coordinates(123.0, 0.0),
            "Could not fetch air quality data for your location."
        );
        assert_eq!(stub.called_models().len(), 1);
    }

    #[test]
    fn contextual_prompt_carries_context_without_system_instruction() {
        let stub = Arc::new(StubBackend::new().reply("fast", Reply::Text("Wear an N95 mask.")));
        let answer = engine(&stub).get_contextual_advice("**AQI:** 180", "Can I jog today?");
        assert_eq!(answer, "Wear an N95 mask.");

        let request = stub.last_request().unwrap();
        assert!(request.system_instruction.is_none());
        assert!(!request.web_search);
        let prompt = prompt_text(&stub);
        assert!(prompt.starts_with("Context: **AQI:** 180\n\nUser Question: Can I jog today?\n\n"));
    }
}
