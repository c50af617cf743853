//! Fix suggestions derived from an audit result

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Category, Check, LighthouseResult};

/// Options for [`FixHeuristic::derive`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FixOptions {
    /// Include the checks that did not pass
    pub only_failures: bool,
}

/// Suggested next step for improving an audited page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixSuggestion {
    pub suggestion: String,

    /// The performance category, `null` when it was not run
    pub performance: Option<Category>,

    /// Checks with an effective score below 1, `null` unless requested
    pub failures: Option<BTreeMap<String, Check>>,
}

/// Turns an audit result into a fix suggestion.
pub trait FixHeuristic: Send + Sync {
    fn derive(
        &self,
        result: &LighthouseResult,
        report: &serde_json::Value,
        options: FixOptions,
    ) -> FixSuggestion;
}

/// Points at the performance category and, on request, lists failing checks.
#[derive(Debug, Default)]
pub struct BaselineFixer;

const BASELINE_SUGGESTION: &str = "Review performance opportunities and apply targeted fixes";

impl FixHeuristic for BaselineFixer {
    fn derive(
        &self,
        result: &LighthouseResult,
        _report: &serde_json::Value,
        options: FixOptions,
    ) -> FixSuggestion {
        let failures = options.only_failures.then(|| failing_checks(result));

        FixSuggestion {
            suggestion: BASELINE_SUGGESTION.to_string(),
            performance: result.categories.get("performance").cloned(),
            failures,
        }
    }
}

/// Checks whose effective score is below 1. Unscored checks are skipped.
pub fn failing_checks(result: &LighthouseResult) -> BTreeMap<String, Check> {
    result
        .audits
        .iter()
        .filter(|(_, check)| matches!(check.effective_score(), Some(score) if score < 1.0))
        .map(|(name, check)| (name.clone(), check.clone()))
        .collect()
}
