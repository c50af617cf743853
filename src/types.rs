//! Core audit types
//!
//! All wire types use camelCase JSON serialization, matching the Lighthouse
//! result format and the MCP tool argument names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emulated device class for an audit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormFactor {
    Mobile,
    #[default]
    Desktop,
}

/// A request to audit one page
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    /// Absolute http(s) URL to audit
    #[serde(default)]
    pub url: String,

    /// Lighthouse categories to run, in order (all when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,

    #[serde(default)]
    pub form_factor: FormFactor,
}

impl AuditRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn with_form_factor(mut self, form_factor: FormFactor) -> Self {
        self.form_factor = form_factor;
        self
    }
}

/// Options forwarded to the audit engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Set only for mobile audits
    pub emulate_mobile: Option<bool>,
    pub categories: Option<Vec<String>>,
}

impl From<&AuditRequest> for EngineOptions {
    fn from(request: &AuditRequest) -> Self {
        Self {
            emulate_mobile: (request.form_factor == FormFactor::Mobile).then_some(true),
            categories: request.categories.clone().filter(|c| !c.is_empty()),
        }
    }
}

/// A scored Lighthouse category (performance, accessibility, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// Score in 0..=1, absent when the category could not be scored
    #[serde(default)]
    pub score: Option<f64>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A single Lighthouse audit check
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    #[serde(default)]
    pub score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_display_mode: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Check {
    /// Score used for failure filtering; `notApplicable` checks count as passing.
    pub fn effective_score(&self) -> Option<f64> {
        if self.score_display_mode.as_deref() == Some("notApplicable") {
            return Some(1.0);
        }
        self.score
    }
}

/// The structured Lighthouse result (the "LHR")
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LighthouseResult {
    #[serde(default)]
    pub categories: BTreeMap<String, Category>,

    #[serde(default)]
    pub audits: BTreeMap<String, Check>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LighthouseResult {
    /// Score of a category, `None` when the category was not run or not scored
    pub fn category_score(&self, name: &str) -> Option<f64> {
        self.categories.get(name).and_then(|c| c.score)
    }
}

/// Output of one successful engine run
#[derive(Debug, Clone, PartialEq)]
pub struct EngineReport {
    pub result: LighthouseResult,
    /// Full raw report payload, kept for verbatim retrieval
    pub report: serde_json::Value,
}

/// A stored audit. Immutable once inserted into the report store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Unique report identifier (rpt-<uuid>)
    pub id: String,

    pub url: String,

    pub fetched_at: DateTime<Utc>,

    pub raw_result: LighthouseResult,

    pub report_body: serde_json::Value,

    /// Set on degraded records produced by a failed engine run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditRecord {
    /// Build a record from a completed engine run
    pub fn completed(url: impl Into<String>, report: EngineReport) -> Self {
        Self {
            id: new_report_id(),
            url: url.into(),
            fetched_at: Utc::now(),
            raw_result: report.result,
            report_body: report.report,
            error: None,
        }
    }

    /// Build a degraded record carrying the engine failure instead of scores
    pub fn degraded(url: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            id: new_report_id(),
            url: url.into(),
            fetched_at: Utc::now(),
            raw_result: LighthouseResult::default(),
            report_body: serde_json::json!({ "error": error }),
            error: Some(error),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

fn new_report_id() -> String {
    format!("rpt-{}", uuid::Uuid::new_v4())
}

/// Compact view of an audit returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub report_id: String,
    pub url: String,
    pub fetched_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<u32>,
}

/// Convert a 0..=1 score into a whole percentage, rounding half up.
pub fn score_percent(score: f64) -> u32 {
    (score * 100.0 + 0.5).floor().clamp(0.0, 100.0) as u32
}
