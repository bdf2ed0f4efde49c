//! The response-formatting step: flattens the accumulated pipeline
//! context into the report returned to the caller. Reads only
//! documented context fields; the context is dropped afterwards.

use serde::Serialize;

use crate::pipeline::context::{ActionPick, AssessmentContext, CheckFinding};

/// One flagged finding as presented to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ReportFinding {
    pub issue: String,
    pub region: String,
    pub severity: Option<String>,
    pub confidence: Option<String>,
    pub observation: String,
    pub risk: String,
    pub remediation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
}

impl From<&CheckFinding> for ReportFinding {
    fn from(f: &CheckFinding) -> Self {
        Self {
            issue: f.cue.clone(),
            region: f.region.clone(),
            severity: f.severity.map(|s| format!("{s:?}").to_uppercase()),
            confidence: f.confidence.map(|c| format!("{c:?}").to_uppercase()),
            observation: f.observation.clone(),
            risk: f.risk.clone(),
            remediation: f.remediation.clone(),
            estimated_cost: f.estimated_cost.clone(),
        }
    }
}

/// Flat assessment report: classifier output, the skip flag and reason
/// when the filter rejected the image, and the decision/recommendation
/// output otherwise. Every field is always present and typed; a skipped
/// report simply carries empty findings and a null verdict.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub domain: String,
    pub category: String,
    pub description: String,
    pub context: String,

    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,

    pub findings: Vec<ReportFinding>,

    pub verdict: Option<String>,
    pub reasoning: Option<String>,
    pub recommended_actions: Vec<String>,
    pub affected_regions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<String>,
    pub anomaly_indicators: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub next_actions: Vec<ActionPick>,

    pub trace: Vec<String>,
}

impl AssessmentReport {
    pub fn from_context(domain: &str, ctx: AssessmentContext) -> Self {
        let skipped = ctx.skip_remaining;
        let skip_reason = if skipped {
            Some(
                ctx.filter
                    .as_ref()
                    .map(|f| f.reason.clone())
                    .filter(|r| !r.is_empty())
                    .unwrap_or_else(|| "Image rejected by validity filter.".to_string()),
            )
        } else {
            None
        };

        let (verdict, reasoning, recommended_actions, affected_regions, estimated_cost, anomaly_indicators) =
            match &ctx.decision {
                Some(d) => (
                    Some(d.verdict.clone()),
                    Some(d.reasoning.clone()),
                    d.recommended_actions.clone(),
                    d.affected_regions.clone(),
                    d.estimated_cost.clone(),
                    d.anomaly_indicators.clone(),
                ),
                None => (None, None, Vec::new(), Vec::new(), None, Vec::new()),
            };

        Self {
            domain: domain.to_string(),
            category: ctx.category.label().to_string(),
            description: ctx.description.clone(),
            context: ctx.scene_context.clone(),
            skipped,
            skip_reason,
            findings: ctx.findings.iter().map(ReportFinding::from).collect(),
            verdict,
            reasoning,
            recommended_actions,
            affected_regions,
            estimated_cost,
            anomaly_indicators,
            next_actions: ctx.actions.map(|a| a.picks).unwrap_or_default(),
            trace: ctx.trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::context::{
        ConfidenceLevel, DecisionOutcome, FilterOutcome, Severity,
    };

    #[test]
    fn skipped_context_yields_skip_report_with_reason() {
        let mut ctx = AssessmentContext::new("img".into());
        ctx.description = "unspecified damage".into();
        ctx.scene_context = "unknown incident".into();
        ctx.filter = Some(FilterOutcome {
            usable: false,
            reason: "image is a cartoon".into(),
            notes: String::new(),
        });
        ctx.skip_remaining = true;

        let report = AssessmentReport::from_context("vehicle-damage", ctx);
        assert!(report.skipped);
        assert_eq!(report.skip_reason.as_deref(), Some("image is a cartoon"));
        assert!(report.verdict.is_none());
        assert!(report.findings.is_empty());

        // Structurally valid JSON either way.
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["skipped"], true);
        assert!(json["verdict"].is_null());
    }

    #[test]
    fn full_context_flattens_all_stage_outputs() {
        let mut ctx = AssessmentContext::new("img".into());
        ctx.category = crate::domain::Category::Known("SIDE_IMPACT".into());
        ctx.description = "door dent".into();
        ctx.scene_context = "parking lot".into();
        ctx.findings = vec![CheckFinding {
            check_number: 1,
            cue: "Door skin dented".into(),
            region: "Doors".into(),
            present: true,
            confidence: Some(ConfidenceLevel::High),
            severity: Some(Severity::Moderate),
            observation: "visible crease".into(),
            risk: "panel replacement".into(),
            remediation: "PDR or panel swap".into(),
            cost_hint: Some("$500-$1,500".into()),
            estimated_cost: Some("$900".into()),
        }];
        ctx.decision = Some(DecisionOutcome {
            verdict: "APPROVE".into(),
            reasoning: "minor repair scope".into(),
            recommended_actions: vec!["book repair".into()],
            affected_regions: vec!["Doors".into()],
            estimated_cost: Some("$900".into()),
            anomaly_indicators: vec![],
        });
        ctx.note("decided APPROVE");

        let report = AssessmentReport::from_context("vehicle-damage", ctx);
        assert!(!report.skipped);
        assert!(report.skip_reason.is_none());
        assert_eq!(report.category, "SIDE_IMPACT");
        assert_eq!(report.verdict.as_deref(), Some("APPROVE"));
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity.as_deref(), Some("MODERATE"));
        assert_eq!(report.findings[0].confidence.as_deref(), Some("HIGH"));
        assert_eq!(report.trace, vec!["decided APPROVE"]);
    }

    #[test]
    fn missing_filter_reason_gets_a_fixed_one() {
        let mut ctx = AssessmentContext::new("img".into());
        ctx.skip_remaining = true;
        let report = AssessmentReport::from_context("ergonomics", ctx);
        assert!(report.skip_reason.is_some());
        assert!(!report.skip_reason.unwrap().is_empty());
    }
}
