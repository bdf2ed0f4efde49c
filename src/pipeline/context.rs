//! The shared context threaded through every pipeline stage, and the
//! closed ordinal types stages coerce model output into.
//!
//! The context is constructed once per request, populated stage by
//! stage (each stage writes only its own fields), consumed by the
//! report builder, then dropped. It is never shared across requests.

use serde::Serialize;

use crate::domain::Category;

/// Three-point severity ordinal. Parsing accepts both the damage
/// vocabulary (SEVERE/MODERATE/MINOR) and the risk vocabulary
/// (HIGH/MEDIUM/LOW); anything else is unknown and sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Severe,
    Moderate,
    Minor,
}

impl Severity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "SEVERE" | "HIGH" => Some(Severity::Severe),
            "MODERATE" | "MEDIUM" => Some(Severity::Moderate),
            "MINOR" | "LOW" => Some(Severity::Minor),
            _ => None,
        }
    }

    /// Sort key: most severe first, unknown (`None`) last.
    pub fn rank(value: Option<Severity>) -> u8 {
        match value {
            Some(Severity::Severe) => 0,
            Some(Severity::Moderate) => 1,
            Some(Severity::Minor) => 2,
            None => 3,
        }
    }
}

/// Three-point model self-confidence ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "HIGH" => Some(ConfidenceLevel::High),
            "MEDIUM" => Some(ConfidenceLevel::Medium),
            "LOW" => Some(ConfidenceLevel::Low),
            _ => None,
        }
    }
}

/// The validity filter's outcome. Fail-closed: only an explicit VALID
/// token produces `usable == true`.
#[derive(Debug, Clone, Serialize)]
pub struct FilterOutcome {
    pub usable: bool,
    pub reason: String,
    /// Hints for later stages; threaded into the analyzer prompt.
    pub notes: String,
}

/// One per-check analyzer result, with reference-data fields merged in
/// by position (fixed-check variant) or model-supplied (open variant).
#[derive(Debug, Clone, Serialize)]
pub struct CheckFinding {
    pub check_number: usize,
    pub cue: String,
    pub region: String,
    pub present: bool,
    pub confidence: Option<ConfidenceLevel>,
    pub severity: Option<Severity>,
    pub observation: String,
    pub risk: String,
    pub remediation: String,
    /// Reference cost band for this check, where the domain has one.
    pub cost_hint: Option<String>,
    /// The model's own cost estimate for what it saw.
    pub estimated_cost: Option<String>,
}

/// The decision stage's outcome. `verdict` is always a member of the
/// domain's closed verdict set.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionOutcome {
    pub verdict: String,
    pub reasoning: String,
    pub recommended_actions: Vec<String>,
    pub affected_regions: Vec<String>,
    pub estimated_cost: Option<String>,
    pub anomaly_indicators: Vec<String>,
}

/// A catalog action selected by the recommendation stage.
#[derive(Debug, Clone, Serialize)]
pub struct ActionPick {
    pub action_id: u32,
    pub action_name: String,
    pub reasoning: String,
    pub priority: String,
}

/// The recommendation stage's outcome (domains with a catalog only).
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub picks: Vec<ActionPick>,
    pub reasoning: String,
}

/// Shared mutable record threaded through the stages.
#[derive(Debug, Default)]
pub struct AssessmentContext {
    // Input.
    pub image_base64: String,

    // Classifier output.
    pub category: Category,
    pub description: String,
    pub scene_context: String,

    // Filter output and the short-circuit flag it alone sets.
    pub filter: Option<FilterOutcome>,
    pub skip_remaining: bool,

    // Analyzer output.
    pub analysis: Vec<CheckFinding>,
    /// Present subset of `analysis`, most severe first.
    pub findings: Vec<CheckFinding>,

    // Decision / recommendation output.
    pub decision: Option<DecisionOutcome>,
    pub actions: Option<ActionOutcome>,

    /// Append-only stage-completion notes; diagnostic only.
    pub trace: Vec<String>,
}

impl AssessmentContext {
    pub fn new(image_base64: String) -> Self {
        Self {
            image_base64,
            ..Default::default()
        }
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.trace.push(message.into());
    }
}
