//! Vehicle-damage assessment domain: insurance-claim categories, claim
//! decision verdicts, and the claim-actions catalog.

use super::{
    parse_catalog, parse_categories, ClassifierDefaults, DomainError, DomainProfile,
    DomainPrompts,
};

const DAMAGE_CHECKS_JSON: &str = include_str!("../../data/vehicle_damage_checks.json");
const CLAIM_ACTIONS_JSON: &str = include_str!("../../data/claim_actions.json");

/// Closed claim-decision set, most permissive to most drastic.
pub const CLAIM_VERDICTS: &[&str] = &[
    "APPROVE",
    "APPROVE_WITH_INSPECTION",
    "PARTIAL_APPROVE",
    "INVESTIGATE",
    "REJECT",
    "TOTAL_LOSS",
];

const CLASSIFIER_ROLE: &str = "\
You are a vehicle damage classification expert for car insurance claims.

You MUST:
1) Pick ONE damage category from the provided list, or OTHERS if none fits.
2) Provide a SHORT description of the damage (3-5 words), for example \
\"Front bumper collision damage\" or \"Windshield chip damage\".
3) Briefly describe the incident context in one sentence, for example \
\"front-end collision with another vehicle\" or \"parking lot side scrape\".";

const CLASSIFIER_TASK: &str =
    "Classify the vehicle damage type in this image and describe the incident context.";

const FILTER_RULES: &str = "\
You are an insurance claim photo validator for vehicle damage assessment.

Rules:
1. The photo must show REAL vehicle damage (not stock photos, toy cars, or illustrations).
2. The damage must be clearly visible (not too blurry, dark, or obstructed).
3. The relevant damaged area must be in frame and identifiable.
4. Reject if: no damage is visible; the photo is too blurry, dark, or distant; \
the subject is not a vehicle; the damage area is completely obscured; \
or the image is a screenshot or heavily edited.";

const FILTER_TASK: &str =
    "Decide if this image is VALID or INVALID for vehicle damage assessment.";

const ANALYZER_ROLE: &str = "\
You are an expert vehicle damage assessor for insurance claims. Analyze the \
image for the specific damage indicators listed, judging each one only from \
what is visible.";

const ANALYZER_TASK: &str =
    "Analyze this vehicle damage image for the specific damage indicators listed above.";

const OPEN_ANALYSIS_ROLE: &str = "\
You are a vehicle damage assessment expert. Analyze this image for ANY \
visible vehicle damage: identify each damaged component or area, how severe \
the damage is, an estimated repair cost, and any safety concerns.";

const DECISION_RULES: &str = "\
You are an insurance claims adjuster making decisions on vehicle damage claims.

Decision guidance:
- Minor damages (under $2k total): APPROVE immediately.
- Moderate damages ($2k-$5k): APPROVE_WITH_INSPECTION (workshop verification).
- Severe damages ($5k-$10k): INVESTIGATE (adjuster inspection).
- Very severe (over $10k or structural): consider TOTAL_LOSS.
- Inconsistencies or suspicious patterns: INVESTIGATE and list fraud indicators.";

/// Build the vehicle-damage domain profile from the bundled datasets.
pub fn profile() -> Result<DomainProfile, DomainError> {
    Ok(DomainProfile {
        name: "vehicle-damage",
        categories: parse_categories("vehicle_damage_checks", DAMAGE_CHECKS_JSON)?,
        catalog: parse_catalog("claim_actions", CLAIM_ACTIONS_JSON)?,
        verdicts: CLAIM_VERDICTS,
        fallback_verdict: "INVESTIGATE",
        no_findings_verdict: "REJECT",
        no_findings_note:
            "No visible damage detected. If damage exists, submit clearer photos.",
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
            description: "unspecified damage",
            context: "unknown incident",
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_order_is_permissive_to_drastic() {
        assert_eq!(CLAIM_VERDICTS.first(), Some(&"APPROVE"));
        assert_eq!(CLAIM_VERDICTS.last(), Some(&"TOTAL_LOSS"));
    }

    #[test]
    fn fallback_verdict_is_a_member_of_the_closed_set() {
        let profile = profile().unwrap();
        assert!(profile.verdicts.contains(&profile.fallback_verdict));
        assert!(profile.verdicts.contains(&profile.no_findings_verdict));
    }

    #[test]
    fn every_check_carries_a_cost_hint() {
        let profile = profile().unwrap();
        for entry in &profile.categories {
            for check in &entry.checks {
                assert!(
                    check.cost_hint.is_some(),
                    "vehicle check '{}' missing cost hint",
                    check.cue
                );
            }
        }
    }
}
