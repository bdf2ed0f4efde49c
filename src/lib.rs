//! sightcheck — photo assessment service.
//!
//! Routes an uploaded photograph through a staged vision-language-model
//! pipeline: classify → validity filter → detailed analysis → decision
//! → recommendation. The engine is domain-blind; the vehicle-damage and
//! ergonomics domains plug in as data ([`domain::DomainProfile`]).

pub mod api;
pub mod coerce;
pub mod config;
pub mod domain;
pub mod image_prep;
pub mod pipeline;
pub mod report;
pub mod service;
pub mod vlm;

use tracing_subscriber::EnvFilter;

/// Initialize tracing from `RUST_LOG`, defaulting to info-level output
/// for this crate and warnings elsewhere.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,sightcheck=info")),
        )
        .init();
}
