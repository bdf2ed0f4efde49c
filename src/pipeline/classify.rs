//! Classification stage: map the image to one member of the domain's
//! closed category set, plus a short description and scene context.
//!
//! This stage never fails the request. Model failure or unparseable
//! output resolves to the sentinel category with the domain's fixed
//! description defaults, and the pipeline continues.

use crate::coerce::{extract_object, str_field};
use crate::domain::DomainProfile;
use crate::pipeline::context::AssessmentContext;
use crate::pipeline::prompt;
use crate::vlm::ModelInvoker;

pub fn run(invoker: &ModelInvoker, profile: &DomainProfile, ctx: &mut AssessmentContext) {
    let span = tracing::info_span!("classify", domain = profile.name);
    let _guard = span.enter();

    let request = prompt::classifier_request(profile, &ctx.image_base64);
    let defaults = &profile.classifier_defaults;

    match invoker.invoke(&request) {
        Ok(text) => match extract_object(&text) {
            Some(obj) => {
                ctx.category = profile.resolve_category(&str_field(&obj, "category", ""));
                ctx.description = str_field(&obj, "description", defaults.description);
                ctx.scene_context = str_field(&obj, "context", defaults.context);
            }
            None => {
                tracing::warn!("classifier response was not a JSON object, using defaults");
                ctx.description = defaults.description.to_string();
                ctx.scene_context = defaults.context.to_string();
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "classifier invocation exhausted, using defaults");
            ctx.description = defaults.description.to_string();
            ctx.scene_context = defaults.context.to_string();
        }
    }

    tracing::info!(
        category = ctx.category.label(),
        description = %ctx.description,
        "classification complete"
    );
    ctx.note(format!("classified as {}", ctx.category.label()));
}
