//! Domain profiles — everything that differs between the two assessment
//! domains (vehicle damage, ergonomics) lives here as data: the category
//! reference checks, the closed decision-verdict set, the action catalog,
//! and the prompt text blocks. The pipeline engine itself is domain-blind.

pub mod ergonomics;
pub mod vehicle;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The reserved label for "no predefined category matched".
pub const SENTINEL_LABEL: &str = "OTHERS";

/// Startup-time reference data failures. Fatal: the process must refuse
/// to start rather than run a degraded pipeline for every request.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Reference dataset '{name}' is malformed: {detail}")]
    MalformedDataset { name: &'static str, detail: String },

    #[error("Reference dataset '{name}' is empty")]
    EmptyDataset { name: &'static str },
}

/// One predefined check: what to look for, where, why it matters, and
/// what to do about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceCheck {
    pub cue: String,
    pub region: String,
    pub risk: String,
    pub remediation: String,
    #[serde(default)]
    pub cost_hint: Option<String>,
}

/// A category with its ordered check list. Dataset order is significant:
/// it defines the category declaration order used by fuzzy matching.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryChecks {
    pub category: String,
    pub checks: Vec<ReferenceCheck>,
}

/// One entry of the recommended-actions catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogAction {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub applies_when: String,
}

#[derive(Debug, Deserialize)]
struct ActionCatalogFile {
    actions: Vec<CatalogAction>,
}

/// The resolved classification: a guaranteed member of the domain's
/// category list, or the sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Category {
    Known(String),
    #[default]
    Other,
}

impl Category {
    pub fn label(&self) -> &str {
        match self {
            Category::Known(name) => name,
            Category::Other => SENTINEL_LABEL,
        }
    }

    pub fn is_other(&self) -> bool {
        matches!(self, Category::Other)
    }
}

/// Domain-specific prompt text blocks assembled by the prompt builders.
#[derive(Debug, Clone)]
pub struct DomainPrompts {
    /// System role for the classifier stage.
    pub classifier_role: &'static str,
    /// Final user-turn instruction for the classifier.
    pub classifier_task: &'static str,
    /// Admissibility rules for the validity filter.
    pub filter_rules: &'static str,
    pub filter_task: &'static str,
    /// System role for the fixed-check analyzer.
    pub analyzer_role: &'static str,
    pub analyzer_task: &'static str,
    /// System role for the open-ended analysis variant.
    pub open_analysis_role: &'static str,
    /// Decision thresholds and guidance for the decision stage.
    pub decision_rules: &'static str,
}

/// Fixed stage-default text for the classifier failure path.
#[derive(Debug, Clone)]
pub struct ClassifierDefaults {
    pub description: &'static str,
    pub context: &'static str,
}

/// Everything the generic engine needs to run one domain.
#[derive(Debug, Clone)]
pub struct DomainProfile {
    pub name: &'static str,
    pub categories: Vec<CategoryChecks>,
    pub catalog: Vec<CatalogAction>,
    /// Closed decision-verdict set, in declaration order.
    pub verdicts: &'static [&'static str],
    /// Conservative verdict used when decision inference fails entirely.
    pub fallback_verdict: &'static str,
    /// Deterministic verdict for the empty-findings short circuit.
    pub no_findings_verdict: &'static str,
    pub no_findings_note: &'static str,
    pub prompts: DomainPrompts,
    pub classifier_defaults: ClassifierDefaults,
}

impl DomainProfile {
    /// Category names in dataset order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.category.as_str())
    }

    /// Reference checks for a category; empty for the sentinel and for
    /// any category without dataset entries.
    pub fn checks_for(&self, category: &Category) -> &[ReferenceCheck] {
        match category {
            Category::Other => &[],
            Category::Known(name) => self
                .categories
                .iter()
                .find(|c| c.category == *name)
                .map(|c| c.checks.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Resolve free model text to a member of the closed category set.
    ///
    /// Exact match first, then a case-insensitive bidirectional substring
    /// match in dataset order (first match wins), else the sentinel. The
    /// substring heuristic can mis-map ambiguous short names; the policy
    /// is deliberately order-deterministic.
    pub fn resolve_category(&self, raw: &str) -> Category {
        let candidate = raw.trim();
        if candidate.is_empty() || candidate.eq_ignore_ascii_case(SENTINEL_LABEL) {
            return Category::Other;
        }

        if let Some(exact) = self
            .categories
            .iter()
            .find(|c| c.category == candidate)
        {
            return Category::Known(exact.category.clone());
        }

        let lowered = candidate.to_lowercase();
        for entry in &self.categories {
            let name_lower = entry.category.to_lowercase();
            if name_lower.contains(&lowered) || lowered.contains(&name_lower) {
                return Category::Known(entry.category.clone());
            }
        }

        Category::Other
    }

    /// Resolve free model text to a member of the closed verdict set,
    /// with the same ordered fuzzy policy and the conservative fallback.
    pub fn resolve_verdict(&self, raw: &str) -> String {
        let candidate = raw.trim().to_uppercase();
        if candidate.is_empty() {
            return self.fallback_verdict.to_string();
        }

        if let Some(exact) = self.verdicts.iter().find(|v| **v == candidate) {
            return exact.to_string();
        }

        for verdict in self.verdicts {
            if verdict.contains(candidate.as_str()) || candidate.contains(*verdict) {
                return verdict.to_string();
            }
        }

        self.fallback_verdict.to_string()
    }

    /// Look up a catalog action by id.
    pub fn catalog_action(&self, id: u32) -> Option<&CatalogAction> {
        self.catalog.iter().find(|a| a.id == id)
    }
}

/// Parse a bundled category-checks dataset; malformed or empty data is
/// fatal at startup.
pub(crate) fn parse_categories(
    name: &'static str,
    raw_json: &str,
) -> Result<Vec<CategoryChecks>, DomainError> {
    let categories: Vec<CategoryChecks> = serde_json::from_str(raw_json)
        .map_err(|e| DomainError::MalformedDataset { name, detail: e.to_string() })?;
    if categories.is_empty() {
        return Err(DomainError::EmptyDataset { name });
    }
    Ok(categories)
}

/// Parse a bundled action catalog.
pub(crate) fn parse_catalog(
    name: &'static str,
    raw_json: &str,
) -> Result<Vec<CatalogAction>, DomainError> {
    let file: ActionCatalogFile = serde_json::from_str(raw_json)
        .map_err(|e| DomainError::MalformedDataset { name, detail: e.to_string() })?;
    if file.actions.is_empty() {
        return Err(DomainError::EmptyDataset { name });
    }
    Ok(file.actions)
}
