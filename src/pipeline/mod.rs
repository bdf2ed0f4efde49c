//! The assessment pipeline: a fixed graph of model-backed stages over a
//! shared per-request context. Every stage is independently resilient —
//! model failure degrades to a stage default, never to a request error.

pub mod analyze;
pub mod classify;
pub mod context;
pub mod decide;
pub mod filter;
pub mod orchestrator;
pub mod prompt;
pub mod recommend;

pub use context::AssessmentContext;
pub use orchestrator::Workflow;
