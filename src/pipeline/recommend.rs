//! Recommendation stage: select a small number of next actions from the
//! domain's fixed catalog, using the decision verdict, cost estimate,
//! and anomaly count as selection signals.
//!
//! Domains without a catalog skip this stage entirely. Picks are
//! validated against the catalog by id; a domain with a catalog always
//! ends up with at least one pick, falling back to a deterministic
//! manual-review selection when inference fails.

use crate::coerce::{array_field, extract_object, str_field};
use crate::domain::DomainProfile;
use crate::pipeline::context::{ActionOutcome, ActionPick, AssessmentContext};
use crate::pipeline::prompt;
use crate::vlm::ModelInvoker;

pub fn run(invoker: &ModelInvoker, profile: &DomainProfile, ctx: &mut AssessmentContext) {
    if profile.catalog.is_empty() {
        return;
    }

    let span = tracing::info_span!("recommend", domain = profile.name);
    let _guard = span.enter();

    let Some(decision) = ctx.decision.as_ref() else {
        // Decide always runs before this stage; nothing to select from.
        return;
    };

    // A clean image needs no next actions; deterministic, zero-cost.
    if ctx.findings.is_empty() {
        tracing::info!("no findings, no actions to recommend");
        ctx.note("no actions needed");
        return;
    }

    let request = prompt::actions_request(
        &profile.catalog,
        &decision.verdict,
        decision.estimated_cost.as_deref(),
        decision.anomaly_indicators.len(),
    );

    let outcome = match invoker.invoke(&request) {
        Ok(text) => match extract_object(&text) {
            Some(obj) => {
                let picks = parse_picks(&obj, profile);
                if picks.is_empty() {
                    tracing::warn!("no valid catalog picks in response, using fallback selection");
                    fallback_outcome(profile)
                } else {
                    ActionOutcome {
                        picks,
                        reasoning: str_field(&obj, "reasoning", ""),
                    }
                }
            }
            None => {
                tracing::warn!("actions response was not a JSON object, using fallback selection");
                fallback_outcome(profile)
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "actions invocation exhausted, using fallback selection");
            fallback_outcome(profile)
        }
    };

    tracing::info!(picks = outcome.picks.len(), "recommendation complete");
    ctx.note(format!("recommended {} action(s)", outcome.picks.len()));
    ctx.actions = Some(outcome);
}

/// Keep only picks whose id exists in the catalog; the catalog name
/// always wins over whatever the model echoed back.
fn parse_picks(obj: &serde_json::Map<String, serde_json::Value>, profile: &DomainProfile) -> Vec<ActionPick> {
    array_field(obj, "actions")
        .iter()
        .filter_map(|entry| {
            let pick = entry.as_object()?;
            let id = pick.get("action_id")?.as_u64()? as u32;
            let action = profile.catalog_action(id)?;
            Some(ActionPick {
                action_id: id,
                action_name: action.name.clone(),
                reasoning: str_field(pick, "reasoning", ""),
                priority: str_field(pick, "priority", "MEDIUM").to_uppercase(),
            })
        })
        .collect()
}

/// Deterministic manual-review selection: the first catalog action that
/// mentions an inspection, else the first catalog entry.
fn fallback_outcome(profile: &DomainProfile) -> ActionOutcome {
    let action = profile
        .catalog
        .iter()
        .find(|a| {
            a.name.to_lowercase().contains("inspect") || a.applies_when.to_lowercase().contains("inspect")
        })
        .or_else(|| profile.catalog.first())
        .expect("caller checked the catalog is non-empty");

    ActionOutcome {
        picks: vec![ActionPick {
            action_id: action.id,
            action_name: action.name.clone(),
            reasoning: "Automated action selection unavailable; route for manual review.".to_string(),
            priority: "HIGH".to_string(),
        }],
        reasoning: "Fallback selection after action inference failure.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{ergonomics, vehicle};
    use crate::pipeline::context::DecisionOutcome;
    use crate::vlm::{MockVlmClient, ModelSpec, PanicVlmClient, VlmClient};

    fn invoker(client: Arc<dyn VlmClient>) -> ModelInvoker {
        ModelInvoker::new(
            client,
            ModelSpec::new("primary", 45),
            ModelSpec::new("fallback", 30),
            0,
        )
    }

    fn ctx_with_decision(verdict: &str) -> AssessmentContext {
        let mut ctx = AssessmentContext::new("img".into());
        ctx.findings = vec![crate::pipeline::context::CheckFinding {
            check_number: 1,
            cue: "Bumper crushed".into(),
            region: "Front bumper".into(),
            present: true,
            confidence: None,
            severity: None,
            observation: "crushed inward".into(),
            risk: "structural".into(),
            remediation: "replace".into(),
            cost_hint: None,
            estimated_cost: None,
        }];
        ctx.decision = Some(DecisionOutcome {
            verdict: verdict.into(),
            reasoning: "r".into(),
            recommended_actions: vec![],
            affected_regions: vec![],
            estimated_cost: Some("$6,000".into()),
            anomaly_indicators: vec!["inconsistent dent pattern".into()],
        });
        ctx
    }

    #[test]
    fn clean_image_skips_action_selection_entirely() {
        let profile = vehicle::profile().unwrap();
        let mut ctx = ctx_with_decision("REJECT");
        ctx.findings.clear();
        run(&invoker(Arc::new(PanicVlmClient)), &profile, &mut ctx);
        assert!(ctx.actions.is_none());
    }

    #[test]
    fn catalog_free_domain_makes_no_model_call() {
        let profile = ergonomics::profile().unwrap();
        let mut ctx = ctx_with_decision("MEDIUM");
        run(&invoker(Arc::new(PanicVlmClient)), &profile, &mut ctx);
        assert!(ctx.actions.is_none());
    }

    #[test]
    fn valid_picks_are_kept_with_catalog_names() {
        let profile = vehicle::profile().unwrap();
        let mut ctx = ctx_with_decision("INVESTIGATE");
        let mock = Arc::new(MockVlmClient::always(
            r#"{"actions": [
                {"action_id": 4, "action_name": "wrong name echoed", "reasoning": "cost band", "priority": "high"},
                {"action_id": 5, "action_name": "Refer to Fraud Investigation Unit", "reasoning": "anomaly", "priority": "MEDIUM"}
               ],
               "reasoning": "investigate before paying"}"#,
        ));
        run(&invoker(mock), &profile, &mut ctx);

        let actions = ctx.actions.unwrap();
        assert_eq!(actions.picks.len(), 2);
        assert_eq!(actions.picks[0].action_name, "Schedule Field Adjuster Inspection");
        assert_eq!(actions.picks[0].priority, "HIGH");
        assert_eq!(actions.picks[1].action_id, 5);
    }

    #[test]
    fn unknown_action_ids_are_dropped() {
        let profile = vehicle::profile().unwrap();
        let mut ctx = ctx_with_decision("APPROVE");
        let mock = Arc::new(MockVlmClient::always(
            r#"{"actions": [
                {"action_id": 999, "action_name": "Invented Action", "reasoning": "x"},
                {"action_id": 1, "action_name": "Immediate Repair Approval", "reasoning": "minor"}
               ]}"#,
        ));
        run(&invoker(mock), &profile, &mut ctx);
        let actions = ctx.actions.unwrap();
        assert_eq!(actions.picks.len(), 1);
        assert_eq!(actions.picks[0].action_id, 1);
    }

    #[test]
    fn all_picks_invalid_falls_back_to_manual_review() {
        let profile = vehicle::profile().unwrap();
        let mut ctx = ctx_with_decision("INVESTIGATE");
        let mock = Arc::new(MockVlmClient::always(r#"{"actions": [{"action_id": 42}]}"#));
        run(&invoker(mock), &profile, &mut ctx);
        let actions = ctx.actions.unwrap();
        assert_eq!(actions.picks.len(), 1);
        assert!(actions.picks[0].action_name.to_lowercase().contains("inspect"));
        assert_eq!(actions.picks[0].priority, "HIGH");
    }

    #[test]
    fn exhausted_invocation_falls_back_to_manual_review() {
        let profile = vehicle::profile().unwrap();
        let mut ctx = ctx_with_decision("INVESTIGATE");
        run(&invoker(Arc::new(MockVlmClient::failing())), &profile, &mut ctx);
        let actions = ctx.actions.unwrap();
        assert_eq!(actions.picks.len(), 1);
        assert!(!actions.picks[0].reasoning.is_empty());
    }
}
