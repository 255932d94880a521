use thiserror::Error;

/// A single candidate that failed during a fallback run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFailure {
    pub model: String,
    pub error: String,
}

#[derive(Debug, Clone, Error)]
pub enum FallbackError {
    #[error("no candidate models available")]
    NoCandidates,

    #[error("all {attempts} candidate models failed; last was {model}: {detail}")]
    AllCandidatesExhausted {
        attempts: usize,
        model: String,
        detail: String,
        failures: Vec<CandidateFailure>,
    },
}

impl FallbackError {
    pub fn failures(&self) -> &[CandidateFailure] {
        match self {
            Self::NoCandidates => &[],
            Self::AllCandidatesExhausted { failures, .. } => failures,
        }
    }
}

/// Failure of a structured image analysis.
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    #[error("AI service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("analysis failed: {0}")]
    AnalysisFailed(#[from] FallbackError),

    #[error("malformed analysis response: {0}")]
    MalformedResponse(String),
}

impl AnalysisError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::AnalysisFailed(_) => "ANALYSIS_FAILED",
            Self::MalformedResponse(_) => "MALFORMED_RESPONSE",
        }
    }

    /// Whether retrying the same request later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ServiceUnavailable(_))
    }
}
