//! The request entry point consumed by the HTTP layer: prepare the
//! image, run the domain's workflow, flatten the context into a report.
//!
//! The service is built once at startup and shared across requests; the
//! only per-request state is the pipeline context inside the workflow.

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::domain::{self, DomainError};
use crate::image_prep::{self, PrepError};
use crate::pipeline::Workflow;
use crate::report::AssessmentReport;
use crate::vlm::{ModelInvoker, OllamaClient, VlmClient, ModelSpec};

/// The two assessment domains the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    VehicleDamage,
    Ergonomics,
}

pub struct AssessmentService {
    vehicle: Workflow,
    ergonomics: Workflow,
}

impl AssessmentService {
    /// Wire up both domain workflows against a live model server.
    pub fn new(config: &Config) -> Result<Self, DomainError> {
        let client: Arc<dyn VlmClient> = Arc::new(OllamaClient::new(&config.vlm_base_url));
        Self::with_client(config, client)
    }

    /// Same wiring with an injected client; the test seam.
    pub fn with_client(config: &Config, client: Arc<dyn VlmClient>) -> Result<Self, DomainError> {
        let invoker = Arc::new(ModelInvoker::new(
            client,
            ModelSpec::new(&config.primary_model, config.primary_timeout_secs),
            ModelSpec::new(&config.fallback_model, config.fallback_timeout_secs),
            config.transient_retries,
        ));

        Ok(Self {
            vehicle: Workflow::new(Arc::new(domain::vehicle::profile()?), invoker.clone()),
            ergonomics: Workflow::new(Arc::new(domain::ergonomics::profile()?), invoker),
        })
    }

    /// Run a full assessment over an image file. Blocking: callers on an
    /// async runtime must dispatch this to a blocking-capable thread.
    pub fn analyze(&self, domain: Domain, image_path: &Path) -> Result<AssessmentReport, PrepError> {
        let workflow = match domain {
            Domain::VehicleDamage => &self.vehicle,
            Domain::Ergonomics => &self.ergonomics,
        };

        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("assessment", %request_id, domain = workflow.profile().name);
        let _guard = span.enter();

        let prepared = image_prep::prepare_file(image_path)?;
        tracing::info!(
            width = prepared.width,
            height = prepared.height,
            "image prepared, starting assessment"
        );

        let ctx = workflow.run(prepared.base64);
        Ok(AssessmentReport::from_context(workflow.profile().name, ctx))
    }
}
