//! Decision stage: turn the flagged findings into a verdict from the
//! domain's closed set, with reasoning and recommendations.
//!
//! Two deterministic paths bracket the model call: an empty findings
//! list short-circuits to the fixed "no issues" outcome with zero model
//! calls, and total invocation failure falls back to the domain's most
//! cautious verdict built directly from the findings.

use crate::coerce::{extract_object, str_field, string_list};
use crate::domain::DomainProfile;
use crate::pipeline::context::{AssessmentContext, DecisionOutcome};
use crate::pipeline::prompt;
use crate::vlm::ModelInvoker;

pub fn run(invoker: &ModelInvoker, profile: &DomainProfile, ctx: &mut AssessmentContext) {
    let span = tracing::info_span!("decide", domain = profile.name);
    let _guard = span.enter();

    if ctx.findings.is_empty() {
        tracing::info!(verdict = profile.no_findings_verdict, "no findings, deterministic outcome");
        ctx.note("no findings, decided without model");
        ctx.decision = Some(no_findings_outcome(profile));
        return;
    }

    let request = prompt::decision_request(profile, &ctx.category, &ctx.scene_context, &ctx.findings);

    let outcome = match invoker.invoke(&request) {
        Ok(text) => match extract_object(&text) {
            Some(obj) => DecisionOutcome {
                verdict: profile.resolve_verdict(&str_field(&obj, "decision", "")),
                reasoning: str_field(&obj, "reasoning", "No reasoning provided."),
                recommended_actions: string_list(&obj, "recommended_actions"),
                affected_regions: string_list(&obj, "affected_regions"),
                estimated_cost: optional_field(&obj, "estimated_total_cost"),
                anomaly_indicators: string_list(&obj, "anomaly_indicators"),
            },
            None => {
                tracing::warn!("decision response was not a JSON object, using conservative fallback");
                conservative_outcome(profile, ctx)
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "decision invocation exhausted, using conservative fallback");
            conservative_outcome(profile, ctx)
        }
    };

    tracing::info!(verdict = %outcome.verdict, "decision complete");
    ctx.note(format!("decided {}", outcome.verdict));
    ctx.decision = Some(outcome);
}

/// Fixed outcome for a clean image; no model involvement.
fn no_findings_outcome(profile: &DomainProfile) -> DecisionOutcome {
    DecisionOutcome {
        verdict: profile.no_findings_verdict.to_string(),
        reasoning: profile.no_findings_note.to_string(),
        recommended_actions: Vec::new(),
        affected_regions: Vec::new(),
        estimated_cost: None,
        anomaly_indicators: Vec::new(),
    }
}

/// Most cautious verdict, built from the findings without the model.
fn conservative_outcome(profile: &DomainProfile, ctx: &AssessmentContext) -> DecisionOutcome {
    let affected_regions: Vec<String> = {
        let mut regions: Vec<String> = ctx.findings.iter().map(|f| f.region.clone()).collect();
        regions.dedup();
        regions
    };
    let recommended_actions: Vec<String> = ctx
        .findings
        .iter()
        .filter(|f| !f.remediation.is_empty())
        .map(|f| f.remediation.clone())
        .collect();

    DecisionOutcome {
        verdict: profile.fallback_verdict.to_string(),
        reasoning: format!(
            "Automated decision unavailable; {} finding(s) require manual review.",
            ctx.findings.len()
        ),
        recommended_actions,
        affected_regions,
        estimated_cost: None,
        anomaly_indicators: Vec::new(),
    }
}

/// Optional string field: missing, mistyped, null, or "null" mean absent.
fn optional_field(obj: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    let raw = str_field(obj, key, "");
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(raw)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{ergonomics, vehicle};
    use crate::pipeline::context::{CheckFinding, Severity};
    use crate::vlm::{MockVlmClient, ModelSpec, PanicVlmClient, VlmClient};

    fn invoker(client: Arc<dyn VlmClient>) -> ModelInvoker {
        ModelInvoker::new(
            client,
            ModelSpec::new("primary", 45),
            ModelSpec::new("fallback", 30),
            0,
        )
    }

    fn finding(cue: &str, region: &str, severity: Severity) -> CheckFinding {
        CheckFinding {
            check_number: 1,
            cue: cue.into(),
            region: region.into(),
            present: true,
            confidence: None,
            severity: Some(severity),
            observation: "seen".into(),
            risk: "risk".into(),
            remediation: "fix it".into(),
            cost_hint: None,
            estimated_cost: None,
        }
    }

    #[test]
    fn empty_findings_decide_without_any_model_call() {
        let profile = vehicle::profile().unwrap();
        let mut ctx = AssessmentContext::new("img".into());
        // PanicVlmClient fails the test loudly if this path calls a model.
        run(&invoker(Arc::new(PanicVlmClient)), &profile, &mut ctx);
        let decision = ctx.decision.unwrap();
        assert_eq!(decision.verdict, "REJECT");
        assert_eq!(decision.reasoning, profile.no_findings_note);
        assert!(decision.recommended_actions.is_empty());
    }

    #[test]
    fn ergonomics_clean_image_gets_none_verdict() {
        let profile = ergonomics::profile().unwrap();
        let mut ctx = AssessmentContext::new("img".into());
        run(&invoker(Arc::new(PanicVlmClient)), &profile, &mut ctx);
        assert_eq!(ctx.decision.unwrap().verdict, "NONE");
    }

    #[test]
    fn well_formed_response_resolves_to_closed_verdict() {
        let profile = vehicle::profile().unwrap();
        let mut ctx = AssessmentContext::new("img".into());
        ctx.findings = vec![finding("Bumper crushed", "Front bumper", Severity::Severe)];

        let mock = Arc::new(MockVlmClient::always(
            r#"{"decision": "approve_with_inspection", "reasoning": "moderate repair scope",
                "recommended_actions": ["book workshop inspection"],
                "affected_regions": ["Front bumper"],
                "estimated_total_cost": "$3,400",
                "anomaly_indicators": []}"#,
        ));
        run(&invoker(mock), &profile, &mut ctx);

        let decision = ctx.decision.unwrap();
        assert_eq!(decision.verdict, "APPROVE_WITH_INSPECTION");
        assert_eq!(decision.estimated_cost.as_deref(), Some("$3,400"));
        assert_eq!(decision.recommended_actions, vec!["book workshop inspection"]);
    }

    #[test]
    fn off_list_verdict_falls_back_conservatively() {
        let profile = vehicle::profile().unwrap();
        let mut ctx = AssessmentContext::new("img".into());
        ctx.findings = vec![finding("Dent", "Doors", Severity::Minor)];

        let mock = Arc::new(MockVlmClient::always(
            r#"{"decision": "MAYBE_PAY_HALF", "reasoning": "unsure"}"#,
        ));
        run(&invoker(mock), &profile, &mut ctx);
        assert_eq!(ctx.decision.unwrap().verdict, "INVESTIGATE");
    }

    #[test]
    fn null_cost_estimate_is_absent() {
        let profile = vehicle::profile().unwrap();
        let mut ctx = AssessmentContext::new("img".into());
        ctx.findings = vec![finding("Dent", "Doors", Severity::Minor)];

        let mock = Arc::new(MockVlmClient::always(
            r#"{"decision": "APPROVE", "reasoning": "minor", "estimated_total_cost": null}"#,
        ));
        run(&invoker(mock), &profile, &mut ctx);
        assert!(ctx.decision.unwrap().estimated_cost.is_none());
    }

    #[test]
    fn exhausted_invocation_builds_fallback_from_findings() {
        let profile = vehicle::profile().unwrap();
        let mut ctx = AssessmentContext::new("img".into());
        ctx.findings = vec![
            finding("Bumper crushed", "Front bumper", Severity::Severe),
            finding("Headlight cracked", "Lighting", Severity::Moderate),
        ];

        run(&invoker(Arc::new(MockVlmClient::failing())), &profile, &mut ctx);

        let decision = ctx.decision.unwrap();
        assert_eq!(decision.verdict, "INVESTIGATE");
        assert_eq!(decision.affected_regions, vec!["Front bumper", "Lighting"]);
        assert_eq!(decision.recommended_actions.len(), 2);
        assert!(decision.reasoning.contains("2 finding(s)"));
    }

    #[test]
    fn ergonomics_fallback_verdict_is_undetermined() {
        let profile = ergonomics::profile().unwrap();
        let mut ctx = AssessmentContext::new("img".into());
        ctx.findings = vec![finding("Forward head", "Neck", Severity::Moderate)];
        run(&invoker(Arc::new(MockVlmClient::failing())), &profile, &mut ctx);
        assert_eq!(ctx.decision.unwrap().verdict, "UNDETERMINED");
    }
}
