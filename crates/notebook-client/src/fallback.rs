//! Ordered fallback across candidate endpoints.

use std::fmt;
use std::future::Future;

use notebook_core::{Error, Result};
use tracing::{info, warn};

/// Candidates tried in order; the first success wins.
///
/// A failure moves on to the next candidate only when it is
/// [fallback eligible](Error::is_fallback_eligible). Each candidate gets
/// exactly one attempt.
#[derive(Debug, Clone)]
pub struct FallbackChain<T> {
    candidates: Vec<T>,
}

impl<T: Clone + fmt::Display> FallbackChain<T> {
    pub fn new(candidates: Vec<T>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[T] {
        &self.candidates
    }

    /// Run `attempt` against each candidate until one succeeds.
    pub async fn run<F, Fut, R>(&self, mut attempt: F) -> Result<R>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Result<R>>,
    {
        let last = self.candidates.len().saturating_sub(1);
        for (i, candidate) in self.candidates.iter().enumerate() {
            match attempt(candidate.clone()).await {
                Ok(value) => {
                    if i > 0 {
                        info!(candidate = %candidate, attempt = i + 1, "Fallback candidate succeeded");
                    }
                    return Ok(value);
                }
                Err(e) if i < last && e.is_fallback_eligible() => {
                    warn!(candidate = %candidate, error = %e, "Candidate failed, trying next");
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::Config("no fallback candidates configured".to_string()))
    }
}
