//! Prompt assembly for the pipeline stages. The domain profile supplies
//! the role/rule text blocks; these builders add the category lists,
//! check tables, findings summaries, and the strict response formats.

use std::fmt::Write as _;

use crate::domain::{CatalogAction, Category, DomainProfile, ReferenceCheck, SENTINEL_LABEL};
use crate::pipeline::context::CheckFinding;
use crate::vlm::ChatRequest;

/// Classifier: enumerate the closed category list plus the sentinel and
/// demand a strict JSON reply.
pub fn classifier_request(profile: &DomainProfile, image_base64: &str) -> ChatRequest {
    let mut categories = String::new();
    for name in profile.category_names() {
        let _ = writeln!(categories, "- {name}");
    }
    let _ = writeln!(categories, "- {SENTINEL_LABEL}");

    let system = format!(
        "{role}\n\nCategory list:\n{categories}\n\
         Respond ONLY in this JSON format:\n\
         {{\n  \"category\": \"exact category name or {SENTINEL_LABEL}\",\n  \
         \"description\": \"short description\",\n  \
         \"context\": \"brief scene or incident context\"\n}}",
        role = profile.prompts.classifier_role,
    );

    ChatRequest::new(system, profile.prompts.classifier_task).with_image(image_base64)
}

/// Validity filter: domain admissibility rules plus a two-valued verdict.
pub fn filter_request(
    profile: &DomainProfile,
    category: &Category,
    image_base64: &str,
) -> ChatRequest {
    let system = format!(
        "{rules}\n\nDecide if this photo is suitable for assessment of: `{category}`.\n\n\
         Classify into:\n\
         - \"VALID\" → the subject is clearly visible and assessable\n\
         - \"INVALID\" → the photo is unsuitable for assessment\n\n\
         Respond ONLY in this JSON format:\n\
         {{\n  \"validity\": \"VALID\" or \"INVALID\",\n  \
         \"reason\": \"one-sentence explanation\",\n  \
         \"notes_for_downstream\": \"hints for assessment or empty string\"\n}}",
        rules = profile.prompts.filter_rules,
        category = category.label(),
    );

    ChatRequest::new(system, profile.prompts.filter_task).with_image(image_base64)
}

/// Fixed-check analyzer: one numbered block per reference check, judged
/// by position.
pub fn analyzer_request(
    profile: &DomainProfile,
    category: &Category,
    checks: &[ReferenceCheck],
    filter_notes: &str,
    image_base64: &str,
) -> ChatRequest {
    let mut table = String::new();
    for (i, check) in checks.iter().enumerate() {
        let _ = write!(
            table,
            "CHECK #{n}:\n  Looking for: {cue}\n  Region: {region}\n  Risk: {risk}\n",
            n = i + 1,
            cue = check.cue,
            region = check.region,
            risk = check.risk,
        );
        if let Some(cost) = &check.cost_hint {
            let _ = writeln!(table, "  Typical cost: {cost}");
        }
        table.push('\n');
    }

    let mut system = format!(
        "{role}\n\nSubject category: `{category}`.\n\n\
         For EACH check below, assess:\n\
         1. \"present\": true/false — is this specific issue visible?\n\
         2. \"confidence\": \"HIGH\" / \"MEDIUM\" / \"LOW\"\n\
         3. \"severity\": \"SEVERE\" / \"MODERATE\" / \"MINOR\"\n\
         4. \"observation\": brief description of what you see (or don't see)\n\
         5. \"estimated_cost\": your estimate, or \"Not applicable\"\n\n\
         Checks to evaluate:\n\n{table}\
         Respond ONLY in this JSON format, one entry per check, in order:\n\
         {{\n  \"analysis\": [\n    {{\n      \"check_number\": 1,\n      \
         \"cue\": \"exact cue text\",\n      \"present\": true or false,\n      \
         \"confidence\": \"HIGH\" or \"MEDIUM\" or \"LOW\",\n      \
         \"severity\": \"SEVERE\" or \"MODERATE\" or \"MINOR\",\n      \
         \"observation\": \"what you see\",\n      \
         \"estimated_cost\": \"estimate or Not applicable\"\n    }}\n  ]\n}}",
        role = profile.prompts.analyzer_role,
        category = category.label(),
    );

    if !filter_notes.trim().is_empty() {
        let _ = write!(system, "\n\nValidator notes: {filter_notes}");
    }

    ChatRequest::new(system, profile.prompts.analyzer_task).with_image(image_base64)
}

/// Open-ended analyzer variant: no fixed check list, the model supplies
/// its own cue/region identifiers. Same output shape.
pub fn open_analysis_request(
    profile: &DomainProfile,
    filter_notes: &str,
    image_base64: &str,
) -> ChatRequest {
    let mut system = format!(
        "{role}\n\nFor EACH issue you identify, report:\n\
         - \"cue\": descriptive name of the issue\n\
         - \"region\": the specific area or component affected\n\
         - \"risk\": why this is a problem\n\
         - \"remediation\": what to do about it\n\n\
         Respond ONLY in this JSON format:\n\
         {{\n  \"analysis\": [\n    {{\n      \"check_number\": 1,\n      \
         \"cue\": \"issue name\",\n      \"region\": \"affected area\",\n      \
         \"present\": true,\n      \
         \"confidence\": \"HIGH\" or \"MEDIUM\" or \"LOW\",\n      \
         \"severity\": \"SEVERE\" or \"MODERATE\" or \"MINOR\",\n      \
         \"observation\": \"what you see\",\n      \
         \"risk\": \"why this is harmful\",\n      \
         \"remediation\": \"recommended fix\",\n      \
         \"estimated_cost\": \"estimate or Not applicable\"\n    }}\n  ]\n}}\n\n\
         Only include issues you can actually see in the image.",
        role = profile.prompts.open_analysis_role,
    );

    if !filter_notes.trim().is_empty() {
        let _ = write!(system, "\n\nValidator notes: {filter_notes}");
    }

    ChatRequest::new(
        system,
        "Analyze this image and report every issue you observe in the JSON format specified.",
    )
    .with_image(image_base64)
}

/// Decision stage: compact findings summary plus the domain's decision
/// rules. No image — the judgment is over the findings.
pub fn decision_request(
    profile: &DomainProfile,
    category: &Category,
    scene_context: &str,
    findings: &[CheckFinding],
) -> ChatRequest {
    let summaries: Vec<serde_json::Value> = findings
        .iter()
        .map(|f| {
            serde_json::json!({
                "region": f.region,
                "issue": f.cue,
                "severity": f.severity,
                "confidence": f.confidence,
                "observation": f.observation,
                "risk": f.risk,
                "estimated_cost": f.estimated_cost,
            })
        })
        .collect();

    let verdict_list = profile.verdicts.join("\" or \"");
    let system = format!(
        "{rules}\n\nSubject category: {category}\nContext: {scene_context}\n\n\
         Respond ONLY in this JSON format:\n\
         {{\n  \"decision\": \"{verdict_list}\",\n  \
         \"reasoning\": \"brief explanation of the decision\",\n  \
         \"recommended_actions\": [\"clear, actionable recommendations\"],\n  \
         \"affected_regions\": [\"affected areas\"],\n  \
         \"estimated_total_cost\": \"estimate or null\",\n  \
         \"anomaly_indicators\": []\n}}",
        rules = profile.prompts.decision_rules,
        category = category.label(),
    );

    let user = format!(
        "Flagged findings:\n{}",
        serde_json::json!({ "findings": summaries })
    );

    ChatRequest::new(system, user)
}

/// Recommendation stage: the fixed action catalog plus the decision
/// signals to select against.
pub fn actions_request(
    catalog: &[CatalogAction],
    verdict: &str,
    estimated_cost: Option<&str>,
    anomaly_count: usize,
) -> ChatRequest {
    let catalog_json = serde_json::to_string_pretty(catalog).unwrap_or_default();

    let system = format!(
        "You are an operations specialist recommending next actions from a fixed catalog.\n\n\
         Available actions catalog:\n{catalog_json}\n\n\
         Select 1-3 most appropriate actions based on the decision verdict, the \
         severity of findings, the cost estimate, and any anomaly indicators. \
         Match each selection against the catalog's \"applies_when\" guidance.\n\n\
         Respond ONLY in this JSON format:\n\
         {{\n  \"actions\": [\n    {{\n      \"action_id\": 2,\n      \
         \"action_name\": \"exact catalog name\",\n      \
         \"reasoning\": \"why this action fits\",\n      \
         \"priority\": \"HIGH\" or \"MEDIUM\" or \"LOW\"\n    }}\n  ],\n  \
         \"reasoning\": \"overall action strategy\"\n}}",
    );

    let user = format!(
        "Decision data:\n{}",
        serde_json::json!({
            "decision": verdict,
            "estimated_cost": estimated_cost,
            "anomaly_indicators_detected": anomaly_count,
        })
    );

    ChatRequest::new(system, user)
}
