use anyhow::Result;
use tracing::{debug, warn};

use crate::error::{CandidateFailure, FallbackError};
use crate::error_chain_text;

const FAILURE_DETAIL_MAX_CHARS: usize = 600;

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackOutcome<T> {
    pub value: T,
    /// Candidate that produced `value`.
    pub model: String,
    /// Candidates that failed before it, in attempt order.
    pub failures: Vec<CandidateFailure>,
}

impl<T> FallbackOutcome<T> {
    pub fn attempts(&self) -> usize {
        self.failures.len() + 1
    }
}

/// Tries `attempt` against each candidate in order and returns the first success.
///
/// Attempts are strictly sequential and each candidate is tried at most once.
/// When every candidate fails, the error carries the last candidate's detail.
pub fn run_with_fallback<T, S, F>(
    candidates: &[S],
    attempt: F,
) -> Result<FallbackOutcome<T>, FallbackError>
where
    S: AsRef<str>,
    F: FnMut(&str) -> Result<T>,
{
    run_with_fallback_reporting(candidates, attempt, |_| {})
}

/// [`run_with_fallback`], calling `on_failure` as soon as each candidate fails
/// and before the next one is tried.
pub fn run_with_fallback_reporting<T, S, F, R>(
    candidates: &[S],
    mut attempt: F,
    mut on_failure: R,
) -> Result<FallbackOutcome<T>, FallbackError>
where
    S: AsRef<str>,
    F: FnMut(&str) -> Result<T>,
    R: FnMut(&CandidateFailure),
{
    let mut failures: Vec<CandidateFailure> = Vec::new();

    for (idx, candidate) in candidates.iter().enumerate() {
        let model = candidate.as_ref();
        debug!(model, attempt = idx + 1, total = candidates.len(), "trying candidate");
        match attempt(model) {
            Ok(value) => {
                return Ok(FallbackOutcome {
                    value,
                    model: model.to_string(),
                    failures,
                });
            }
            Err(err) => {
                let detail = error_chain_text(&err, FAILURE_DETAIL_MAX_CHARS);
                warn!(model, error = %detail, "candidate model failed");
                let failure = CandidateFailure {
                    model: model.to_string(),
                    error: detail,
                };
                on_failure(&failure);
                failures.push(failure);
            }
        }
    }

    let Some(last) = failures.last().cloned() else {
        return Err(FallbackError::NoCandidates);
    };
    Err(FallbackError::AllCandidatesExhausted {
        attempts: failures.len(),
        model: last.model,
        detail: last.error,
        failures,
    })
}
