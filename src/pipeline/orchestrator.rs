//! Fixed stage graph: Classify → Filter → (skip | Analyze → Decide →
//! Recommend) → Done. One workflow instance per request, strictly
//! sequential, no cycles and no re-entry.

use std::sync::Arc;

use crate::domain::DomainProfile;
use crate::pipeline::context::AssessmentContext;
use crate::pipeline::{analyze, classify, decide, filter, recommend};
use crate::vlm::ModelInvoker;

/// The orchestrator's states. Filter is the only state with a branch,
/// driven by the context's control flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Classify,
    Filter,
    Analyze,
    Decide,
    Recommend,
    Done,
}

impl Stage {
    fn next(self, ctx: &AssessmentContext) -> Stage {
        match self {
            Stage::Classify => Stage::Filter,
            Stage::Filter if ctx.skip_remaining => Stage::Done,
            Stage::Filter => Stage::Analyze,
            Stage::Analyze => Stage::Decide,
            Stage::Decide => Stage::Recommend,
            Stage::Recommend => Stage::Done,
            Stage::Done => Stage::Done,
        }
    }
}

/// Runs the assessment workflow for one domain. Cheap to clone per
/// request; the profile and invoker are shared read-only.
#[derive(Clone)]
pub struct Workflow {
    profile: Arc<DomainProfile>,
    invoker: Arc<ModelInvoker>,
}

impl Workflow {
    pub fn new(profile: Arc<DomainProfile>, invoker: Arc<ModelInvoker>) -> Self {
        Self { profile, invoker }
    }

    pub fn profile(&self) -> &DomainProfile {
        &self.profile
    }

    /// Execute the full stage graph over an encoded image and return the
    /// accumulated context. Stages swallow their own failures, so this
    /// always completes.
    pub fn run(&self, image_base64: String) -> AssessmentContext {
        let span = tracing::info_span!("workflow", domain = self.profile.name);
        let _guard = span.enter();

        let mut ctx = AssessmentContext::new(image_base64);
        let mut stage = Stage::Classify;

        while stage != Stage::Done {
            match stage {
                Stage::Classify => classify::run(&self.invoker, &self.profile, &mut ctx),
                Stage::Filter => filter::run(&self.invoker, &self.profile, &mut ctx),
                Stage::Analyze => analyze::run(&self.invoker, &self.profile, &mut ctx),
                Stage::Decide => decide::run(&self.invoker, &self.profile, &mut ctx),
                Stage::Recommend => recommend::run(&self.invoker, &self.profile, &mut ctx),
                Stage::Done => unreachable!("loop exits on Done"),
            }
            stage = stage.next(&ctx);
        }

        tracing::info!(
            skipped = ctx.skip_remaining,
            flagged = ctx.findings.len(),
            "workflow complete"
        );
        ctx
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::vehicle;
    use crate::vlm::{MockVlmClient, ModelSpec, VlmClient, VlmError};

    fn workflow(client: Arc<dyn VlmClient>) -> Workflow {
        let invoker = ModelInvoker::new(
            client,
            ModelSpec::new("primary", 45),
            ModelSpec::new("fallback", 30),
            0,
        );
        Workflow::new(Arc::new(vehicle::profile().unwrap()), Arc::new(invoker))
    }

    fn classifier_reply() -> String {
        r#"{"category": "FRONT_END_COLLISION", "description": "crushed bumper", "context": "highway collision"}"#.into()
    }

    fn valid_filter_reply() -> String {
        r#"{"validity": "VALID", "reason": "clear", "notes_for_downstream": ""}"#.into()
    }

    fn analysis_reply(profile: &crate::domain::DomainProfile) -> String {
        let category = profile.resolve_category("FRONT_END_COLLISION");
        let n = profile.checks_for(&category).len();
        let entries: Vec<serde_json::Value> = (0..n)
            .map(|i| {
                serde_json::json!({
                    "present": i == 0,
                    "confidence": "HIGH",
                    "severity": "SEVERE",
                    "observation": "bumper crushed inward",
                    "estimated_cost": "$2,800",
                })
            })
            .collect();
        serde_json::json!({ "analysis": entries }).to_string()
    }

    #[test]
    fn full_run_visits_all_five_stages() {
        let profile = vehicle::profile().unwrap();
        let mock = Arc::new(MockVlmClient::sequence(vec![
            Ok(classifier_reply()),
            Ok(valid_filter_reply()),
            Ok(analysis_reply(&profile)),
            Ok(r#"{"decision": "APPROVE_WITH_INSPECTION", "reasoning": "moderate cost"}"#.into()),
            Ok(r#"{"actions": [{"action_id": 2, "reasoning": "verify at workshop", "priority": "MEDIUM"}], "reasoning": "standard"}"#.into()),
        ]));

        let ctx = workflow(mock.clone()).run("img".into());

        assert_eq!(mock.call_count(), 5);
        assert_eq!(ctx.category.label(), "FRONT_END_COLLISION");
        assert!(!ctx.skip_remaining);
        assert_eq!(ctx.findings.len(), 1);
        assert_eq!(ctx.decision.as_ref().unwrap().verdict, "APPROVE_WITH_INSPECTION");
        assert_eq!(ctx.actions.as_ref().unwrap().picks[0].action_id, 2);
    }

    #[test]
    fn filter_rejection_stops_after_two_model_calls() {
        let mock = Arc::new(MockVlmClient::sequence(vec![
            Ok(classifier_reply()),
            Ok(r#"{"validity": "INVALID", "reason": "toy car"}"#.into()),
            // Any further call would consume this and fail the count check.
            Ok("unexpected".into()),
        ]));

        let ctx = workflow(mock.clone()).run("img".into());

        assert_eq!(mock.call_count(), 2);
        assert!(ctx.skip_remaining);
        assert!(ctx.analysis.is_empty());
        assert!(ctx.decision.is_none());
        assert!(ctx.actions.is_none());
    }

    #[test]
    fn total_model_outage_still_completes_with_skip() {
        // Every call fails: classifier defaults, then the filter fails
        // closed, so the run terminates after two exhausted invocations.
        let mock = Arc::new(MockVlmClient::failing());
        let ctx = workflow(mock).run("img".into());

        assert!(ctx.category.is_other());
        assert!(ctx.skip_remaining);
        let filter = ctx.filter.as_ref().unwrap();
        assert!(!filter.usable);
        assert!(!filter.reason.is_empty());
    }

    #[test]
    fn analyzer_outage_after_valid_filter_yields_no_findings_decision() {
        let mock = Arc::new(MockVlmClient::sequence(vec![
            Ok(classifier_reply()),
            Ok(valid_filter_reply()),
            Err(VlmError::Connection("down".into())),
        ]));

        let ctx = workflow(mock).run("img".into());

        assert!(!ctx.skip_remaining);
        assert!(ctx.findings.is_empty());
        // Empty findings short-circuit: the fixed no-findings verdict.
        assert_eq!(ctx.decision.as_ref().unwrap().verdict, "REJECT");
    }

    #[test]
    fn trace_records_stage_completions_in_order() {
        let profile = vehicle::profile().unwrap();
        let mock = Arc::new(MockVlmClient::sequence(vec![
            Ok(classifier_reply()),
            Ok(valid_filter_reply()),
            Ok(analysis_reply(&profile)),
            Ok(r#"{"decision": "APPROVE", "reasoning": "minor"}"#.into()),
            Ok(r#"{"actions": [{"action_id": 1, "reasoning": "ok"}]}"#.into()),
        ]));

        let ctx = workflow(mock).run("img".into());
        assert_eq!(ctx.trace.len(), 5);
        assert!(ctx.trace[0].contains("classified"));
        assert!(ctx.trace[1].contains("accepted"));
        assert!(ctx.trace[2].contains("analyzed"));
        assert!(ctx.trace[3].contains("decided"));
        assert!(ctx.trace[4].contains("recommended"));
    }
}
