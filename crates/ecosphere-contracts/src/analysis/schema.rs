use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

pub const REQUIRED_FIELDS: &[&str] = &[
    "title",
    "category",
    "status",
    "description",
    "recommendations",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

/// Decoded outcome of an image analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    pub category: String,
    pub status: String,
    pub confidence: f64,
    pub description: String,
    pub recommendations: Vec<String>,
    pub metrics: Vec<Metric>,
}

/// Wire shape of the schema-constrained reply, before metric pairing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnalysisResponse {
    pub title: String,
    pub category: String,
    pub status: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    pub description: String,
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub metric_label1: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub metric_value1: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub metric_label2: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub metric_value2: Option<String>,
}

impl From<RawAnalysisResponse> for AnalysisResult {
    fn from(raw: RawAnalysisResponse) -> Self {
        let metrics = [
            (raw.metric_label1, raw.metric_value1),
            (raw.metric_label2, raw.metric_value2),
        ]
        .into_iter()
        .filter_map(|(label, value)| complete_pair(label, value))
        .collect();

        Self {
            title: raw.title,
            category: raw.category,
            status: raw.status,
            confidence: raw.confidence.unwrap_or(0.0),
            description: raw.description,
            recommendations: raw.recommendations,
            metrics,
        }
    }
}

// Half-filled pairs are dropped.
fn complete_pair(label: Option<String>, value: Option<String>) -> Option<Metric> {
    let label = label.filter(|text| !text.trim().is_empty())?;
    let value = value.filter(|text| !text.trim().is_empty())?;
    Some(Metric { label, value })
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Bool(flag)) => Ok(Some(flag.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected text metric, found {other}"
        ))),
    }
}

/// Decodes reply text into an [`AnalysisResult`].
///
/// Tolerates a Markdown code fence around the JSON body; anything else that
/// does not match [`RawAnalysisResponse`] is rejected with a short reason.
pub fn decode_analysis(text: &str) -> Result<AnalysisResult, String> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err("response text was empty".to_string());
    }
    let raw: RawAnalysisResponse = serde_json::from_str(body)
        .map_err(|err| format!("response does not match analysis schema: {err}"))?;
    Ok(raw.into())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Schema sent as `responseSchema` so the service replies with decodable JSON.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "A short title of the identified object or situation.",
            },
            "category": {
                "type": "STRING",
                "description": "The category (e.g., Perishable, Recyclable, Healthy).",
            },
            "status": {
                "type": "STRING",
                "description": "Status indicator: 'Good', 'Warning', 'Critical', 'Safe', 'Hazard'.",
            },
            "confidence": {
                "type": "NUMBER",
                "description": "Confidence score between 0 and 1.",
            },
            "description": {
                "type": "STRING",
                "description": "A brief 1-2 sentence description of what is seen.",
            },
            "recommendations": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of 3 actionable suggestions or disposal methods.",
            },
            "metricLabel1": {
                "type": "STRING",
                "description": "Optional label for a key metric (e.g., 'Estimated Days Left').",
            },
            "metricValue1": {
                "type": "STRING",
                "description": "Value for the first metric.",
            },
            "metricLabel2": {
                "type": "STRING",
                "description": "Optional label for a second metric.",
            },
            "metricValue2": {
                "type": "STRING",
                "description": "Value for the second metric.",
            },
        },
        "required": REQUIRED_FIELDS,
    })
}
