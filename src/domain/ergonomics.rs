//! Ergonomic-risk assessment domain: activity categories, risk-tier
//! verdicts, no action catalog.

use super::{parse_categories, ClassifierDefaults, DomainError, DomainProfile, DomainPrompts};

const ACTIVITIES_JSON: &str = include_str!("../../data/ergonomic_activities.json");

/// Closed risk-tier set. UNDETERMINED is the conservative member used
/// when decision inference fails entirely.
pub const RISK_VERDICTS: &[&str] = &["NONE", "LOW", "MEDIUM", "HIGH", "UNDETERMINED"];

const CLASSIFIER_ROLE: &str = "\
You are an ergonomic activity classifier.

You MUST:
1) Pick ONE activity category from the provided list, or OTHERS if none fits.
2) Provide a SHORT description of the activity (3-5 words).
3) Briefly describe the overall environment and context in one short \
sentence, for example \"indoor office with desk and laptop\", \"outdoor park \
bench\", or \"factory floor with boxes\".";

const CLASSIFIER_TASK: &str =
    "Classify the primary activity being performed in this image and describe the scene context.";

const FILTER_RULES: &str = "\
You are an ergonomic assessment validator deciding whether an image is \
suitable for meaningful postural assessment.

Rules:
1. Only assess REAL humans in REAL photos. Reject cartoons, illustrations, \
avatars, CGI renders, stick figures, or mannequins.
2. The activity must be a meaningful, sustained task where posture is held \
or repeated long enough to create ergonomic risk (desk work, lifting, \
cooking, cleaning). Reject short, transient or incidental actions such as \
glancing at a watch or briefly posing for a photo.
3. The person's posture and work setup must be visible enough to judge. \
Reject images where most of the body is out of frame or heavily occluded, \
the key working limb or tool is completely hidden, or the scene is too \
dark, blurry, or distant.
4. A person using a mobility aid (wheelchair, walking stick, crutches) is \
STILL VALID as long as they are clearly performing a real task and their \
posture can be seen.
5. If the scene is ambiguous and the task cannot be reliably inferred, \
treat it as INVALID.";

const FILTER_TASK: &str =
    "Decide if this image is VALID or INVALID for ergonomic assessment using the rules.";

const ANALYZER_ROLE: &str = "\
You are an expert ergonomic risk assessor analyzing the image for postural risks.

IMPORTANT: You are NOT judging this exact frozen pose as if the person \
holds it forever. Infer the TYPICAL way this activity is performed over \
time: assume a realistic duration and repetition pattern, and distinguish \
brief transient actions from sustained or frequently repeated postures. If \
the frame shows a short incidental motion, treat it as low significance \
unless that posture would be repeated frequently during the activity.";

const ANALYZER_TASK: &str =
    "Analyze this image for the ergonomic risks listed above, judging the realistic ongoing activity rather than the frozen instant.";

const OPEN_ANALYSIS_ROLE: &str = "\
You are an expert ergonomic assessor with deep knowledge of biomechanics, \
posture, and workplace ergonomics. Analyze this image for ANY ergonomic \
risks or postural issues you can identify: head and neck position, \
shoulders and upper back, lower back and spine, arms and wrists, hips and \
legs, screen or device position, overall posture, and environmental \
factors. Only include risks you can actually see.";

const DECISION_RULES: &str = "\
You are an ergonomist writing a concise, practical report.

Guidance:
- Merge and group similar problems into a small list of observed risks.
- Produce 3-5 practical recommendations a typical person could realistically \
follow in this environment. For outdoor or temporary setups avoid \
recommending fixed furniture; prefer body-position changes and simple \
low-cost items. For home or office setups small ergonomic accessories are \
acceptable suggestions.
- Overall risk level: prefer MEDIUM unless there are multiple severe \
issues needing urgent attention (HIGH), or only mild issues (LOW).";

/// Build the ergonomics domain profile from the bundled dataset.
pub fn profile() -> Result<DomainProfile, DomainError> {
    Ok(DomainProfile {
        name: "ergonomics",
        categories: parse_categories("ergonomic_activities", ACTIVITIES_JSON)?,
        catalog: Vec::new(),
        verdicts: RISK_VERDICTS,
        fallback_verdict: "UNDETERMINED",
        no_findings_verdict: "NONE",
        no_findings_note:
            "Great posture overall. No significant ergonomic risks detected.",
        prompts: DomainPrompts {
            classifier_role: CLASSIFIER_ROLE,
            classifier_task: CLASSIFIER_TASK,
            filter_rules: FILTER_RULES,
            filter_task: FILTER_TASK,
            analyzer_role: ANALYZER_ROLE,
            analyzer_task: ANALYZER_TASK,
            open_analysis_role: OPEN_ANALYSIS_ROLE,
            decision_rules: DECISION_RULES,
        },
        classifier_defaults: ClassifierDefaults {
            description: "unspecified activity",
            context: "unspecified environment",
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdicts_include_conservative_member() {
        let profile = profile().unwrap();
        assert_eq!(profile.fallback_verdict, "UNDETERMINED");
        assert!(profile.verdicts.contains(&"UNDETERMINED"));
    }

    #[test]
    fn desk_work_category_present() {
        let profile = profile().unwrap();
        assert!(profile.category_names().any(|n| n == "DESK_WORK"));
    }

    #[test]
    fn ergonomic_checks_have_no_cost_hints_required() {
        let profile = profile().unwrap();
        // Remediation text is always present even when cost hints are not.
        for entry in &profile.categories {
            for check in &entry.checks {
                assert!(!check.remediation.is_empty());
            }
        }
    }
}
