//! Model invocation wrapper: primary model with bounded timeout and
//! transient retries, then a cheaper fallback model with a shorter
//! timeout. A terminal error surfaces only when both are exhausted —
//! the calling stage substitutes its own default in that case.

use std::sync::Arc;
use std::time::Duration;

use super::{ChatRequest, VlmClient, VlmError};

/// A model identifier plus its per-call timeout.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub name: String,
    pub timeout: Duration,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            name: name.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// Invokes the primary model, falling back to the secondary on any
/// failure. Retries are strictly internal to one `invoke` call.
pub struct ModelInvoker {
    client: Arc<dyn VlmClient>,
    primary: ModelSpec,
    fallback: ModelSpec,
    /// Extra attempts against the primary model for transient errors.
    transient_retries: usize,
}

impl ModelInvoker {
    pub fn new(
        client: Arc<dyn VlmClient>,
        primary: ModelSpec,
        fallback: ModelSpec,
        transient_retries: usize,
    ) -> Self {
        Self {
            client,
            primary,
            fallback,
            transient_retries,
        }
    }

    /// Produce model output text for the request, or `VlmError::Exhausted`
    /// when the primary (with retries) and the fallback have both failed.
    pub fn invoke(&self, request: &ChatRequest) -> Result<String, VlmError> {
        let mut last_error: Option<VlmError> = None;

        for attempt in 0..=self.transient_retries {
            match self
                .client
                .chat(&self.primary.name, request, self.primary.timeout)
            {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.transient_retries => {
                    tracing::warn!(
                        model = %self.primary.name,
                        attempt = attempt + 1,
                        error = %e,
                        "primary model call failed, retrying"
                    );
                    last_error = Some(e);
                }
                Err(e) => {
                    last_error = Some(e);
                    break;
                }
            }
        }

        let primary_error = last_error.expect("loop ran at least once");
        tracing::warn!(
            primary = %self.primary.name,
            fallback = %self.fallback.name,
            error = %primary_error,
            "primary model exhausted, invoking fallback"
        );

        match self
            .client
            .chat(&self.fallback.name, request, self.fallback.timeout)
        {
            Ok(text) => Ok(text),
            Err(fallback_error) => {
                tracing::error!(
                    primary = %self.primary.name,
                    fallback = %self.fallback.name,
                    error = %fallback_error,
                    "fallback model also failed"
                );
                Err(VlmError::Exhausted(format!(
                    "primary: {primary_error}; fallback: {fallback_error}"
                )))
            }
        }
    }
}
