//! HTTP surface: one POST endpoint per assessment domain plus a health
//! check. The pipeline itself never errors a request; everything 4xx
//! here is input validation, and 5xx means a bug, not a model failure.

pub mod error;
pub mod router;

pub use error::ApiError;
pub use router::app_router;
