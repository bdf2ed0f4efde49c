pub mod client;
pub mod invoke;

pub use client::*;
pub use invoke::*;

use thiserror::Error;

/// Errors from a single model call or an exhausted invocation attempt.
#[derive(Error, Debug)]
pub enum VlmError {
    #[error("Model server is not reachable at {0}")]
    Connection(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Model server returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode model server response: {0}")]
    ResponseDecode(String),

    #[error("Primary and fallback models both failed: {0}")]
    Exhausted(String),
}

impl VlmError {
    /// Transient errors are worth retrying within a single invocation;
    /// client-side API errors (4xx) are not.
    pub fn is_transient(&self) -> bool {
        match self {
            VlmError::Connection(_) | VlmError::Timeout(_) => true,
            VlmError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_and_timeout_are_transient() {
        assert!(VlmError::Connection("localhost".into()).is_transient());
        assert!(VlmError::Timeout(45).is_transient());
    }

    #[test]
    fn server_errors_are_transient_client_errors_are_not() {
        assert!(VlmError::Api { status: 503, body: String::new() }.is_transient());
        assert!(!VlmError::Api { status: 400, body: String::new() }.is_transient());
    }

    #[test]
    fn decode_errors_are_not_transient() {
        assert!(!VlmError::ResponseDecode("bad json".into()).is_transient());
    }
}
