//! Validity filter stage: decide whether the photo is assessable at all.
//!
//! The only stage allowed to short-circuit the pipeline, and the only
//! fail-closed one: an unusable photo, an unparseable response, or an
//! exhausted invocation all set `skip_remaining` so no further model
//! calls are spent on the image.

use crate::coerce::{extract_object, str_field};
use crate::domain::DomainProfile;
use crate::pipeline::context::{AssessmentContext, FilterOutcome};
use crate::pipeline::prompt;
use crate::vlm::ModelInvoker;

const UNVERIFIABLE_REASON: &str =
    "Image validity could not be verified; please resubmit a clear photo.";

pub fn run(invoker: &ModelInvoker, profile: &DomainProfile, ctx: &mut AssessmentContext) {
    let span = tracing::info_span!("filter", domain = profile.name);
    let _guard = span.enter();

    let request = prompt::filter_request(profile, &ctx.category, &ctx.image_base64);

    let outcome = match invoker.invoke(&request) {
        Ok(text) => match extract_object(&text) {
            Some(obj) => {
                let verdict = str_field(&obj, "validity", "").to_uppercase();
                FilterOutcome {
                    usable: verdict == "VALID",
                    reason: str_field(&obj, "reason", "No reason provided."),
                    notes: str_field(&obj, "notes_for_downstream", ""),
                }
            }
            None => {
                tracing::warn!("filter response was not a JSON object, failing closed");
                FilterOutcome {
                    usable: false,
                    reason: UNVERIFIABLE_REASON.to_string(),
                    notes: String::new(),
                }
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "filter invocation exhausted, failing closed");
            FilterOutcome {
                usable: false,
                reason: UNVERIFIABLE_REASON.to_string(),
                notes: String::new(),
            }
        }
    };

    ctx.skip_remaining = !outcome.usable;
    tracing::info!(
        usable = outcome.usable,
        reason = %outcome.reason,
        "validity filter complete"
    );
    ctx.note(if outcome.usable {
        "image accepted by validity filter".to_string()
    } else {
        format!("image rejected: {}", outcome.reason)
    });
    ctx.filter = Some(outcome);
}
