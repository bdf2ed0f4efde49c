//! Detailed analyzer stage: judge the image against the category's
//! reference checks (or freely, when no checks exist) and derive the
//! present-subset of findings sorted most severe first.

use serde_json::Value;

use crate::coerce::{bool_field, extract_object, str_field};
use crate::domain::DomainProfile;
use crate::pipeline::context::{AssessmentContext, CheckFinding, ConfidenceLevel, Severity};
use crate::pipeline::prompt;
use crate::vlm::ModelInvoker;

pub fn run(invoker: &ModelInvoker, profile: &DomainProfile, ctx: &mut AssessmentContext) {
    let span = tracing::info_span!("analyze", domain = profile.name, category = ctx.category.label());
    let _guard = span.enter();

    let checks = profile.checks_for(&ctx.category).to_vec();
    let filter_notes = ctx.filter.as_ref().map(|f| f.notes.clone()).unwrap_or_default();

    // Empty check list (sentinel category included) selects the
    // open-ended variant; the output shape is identical.
    let open_ended = checks.is_empty();
    let request = if open_ended {
        prompt::open_analysis_request(profile, &filter_notes, &ctx.image_base64)
    } else {
        prompt::analyzer_request(profile, &ctx.category, &checks, &filter_notes, &ctx.image_base64)
    };

    let analysis = match invoker.invoke(&request) {
        Ok(text) => match extract_object(&text) {
            Some(obj) => {
                let entries = crate::coerce::array_field(&obj, "analysis");
                if open_ended {
                    parse_open_entries(entries)
                } else {
                    merge_positional(entries, &checks)
                }
            }
            None => {
                tracing::warn!("analyzer response was not a JSON object, treating as no findings");
                Vec::new()
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "analyzer invocation exhausted, treating as no findings");
            Vec::new()
        }
    };

    let mut findings: Vec<CheckFinding> =
        analysis.iter().filter(|f| f.present).cloned().collect();
    // Stable sort keeps check order among equal severities.
    findings.sort_by_key(|f| Severity::rank(f.severity));

    tracing::info!(
        checks = analysis.len(),
        flagged = findings.len(),
        open_ended,
        "analysis complete"
    );
    ctx.note(format!(
        "analyzed {} checks, {} flagged",
        analysis.len(),
        findings.len()
    ));
    ctx.analysis = analysis;
    ctx.findings = findings;
}

/// Fixed-check variant: pair model entries with reference checks by
/// position. Reference fields win for cue/region/risk/remediation; the
/// model supplies only its judgment. Entries beyond the check list are
/// dropped; missing trailing entries leave those checks unassessed.
fn merge_positional(
    entries: &[Value],
    checks: &[crate::domain::ReferenceCheck],
) -> Vec<CheckFinding> {
    entries
        .iter()
        .take(checks.len())
        .enumerate()
        .filter_map(|(i, entry)| {
            let obj = entry.as_object()?;
            let check = &checks[i];
            Some(CheckFinding {
                check_number: i + 1,
                cue: check.cue.clone(),
                region: check.region.clone(),
                present: bool_field(obj, "present"),
                confidence: ConfidenceLevel::parse(&str_field(obj, "confidence", "")),
                severity: Severity::parse(&str_field(obj, "severity", "")),
                observation: str_field(obj, "observation", ""),
                risk: check.risk.clone(),
                remediation: check.remediation.clone(),
                cost_hint: check.cost_hint.clone(),
                estimated_cost: cost_field(obj),
            })
        })
        .collect()
}

/// Open-ended variant: the model supplies its own cue/region/risk text.
fn parse_open_entries(entries: &[Value]) -> Vec<CheckFinding> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let obj = entry.as_object()?;
            let cue = str_field(obj, "cue", "");
            if cue.is_empty() {
                return None;
            }
            Some(CheckFinding {
                check_number: i + 1,
                cue,
                region: str_field(obj, "region", "unspecified"),
                present: bool_field(obj, "present"),
                confidence: ConfidenceLevel::parse(&str_field(obj, "confidence", "")),
                severity: Severity::parse(&str_field(obj, "severity", "")),
                observation: str_field(obj, "observation", ""),
                risk: str_field(obj, "risk", ""),
                remediation: str_field(obj, "remediation", ""),
                cost_hint: None,
                estimated_cost: cost_field(obj),
            })
        })
        .collect()
}

/// "Not applicable" and empty strings both mean no estimate.
fn cost_field(obj: &serde_json::Map<String, Value>) -> Option<String> {
    let raw = str_field(obj, "estimated_cost", "");
    if raw.is_empty() || raw.eq_ignore_ascii_case("not applicable") {
        None
    } else {
        Some(raw)
    }
}
