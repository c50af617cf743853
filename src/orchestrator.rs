//! Audit orchestration
//!
//! `AuditService` is the single path by which audits are run and stored. It
//! validates the request, calls the engine exactly once, and inserts the
//! resulting record into the [`ReportStore`]. No retries, no timeouts, no
//! de-duplication: concurrent audits of the same URL run independently.
//!
//! Engine failures surface in one of two ways, depending on the caller:
//! - [`AuditService::run_audit`] stores and returns a *degraded* record that
//!   carries the error, so HTTP callers always get a well-formed payload.
//! - [`AuditService::try_run_audit`] returns the error and stores nothing;
//!   the MCP tool turns it into an error content item.

use std::sync::Arc;

use crate::engine::AuditEngine;
use crate::error::{LighthouseError, Result};
use crate::fix::{BaselineFixer, FixHeuristic, FixOptions, FixSuggestion};
use crate::store::ReportStore;
use crate::types::{score_percent, AuditRecord, AuditRequest, EngineOptions, Summary};

pub struct AuditService {
    engine: Arc<dyn AuditEngine>,
    fixer: Arc<dyn FixHeuristic>,
    store: ReportStore,
}

impl AuditService {
    pub fn new(engine: Arc<dyn AuditEngine>) -> Self {
        Self::with_fixer(engine, Arc::new(BaselineFixer))
    }

    pub fn with_fixer(engine: Arc<dyn AuditEngine>, fixer: Arc<dyn FixHeuristic>) -> Self {
        Self {
            engine,
            fixer,
            store: ReportStore::new(),
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Run an audit and store the result. Engine failures produce a stored
    /// degraded record instead of an error; only a missing URL is rejected.
    pub async fn run_audit(&self, request: &AuditRequest) -> Result<Arc<AuditRecord>> {
        validate(request)?;

        let options = EngineOptions::from(request);
        let record = match self.engine.run(&request.url, &options).await {
            Ok(report) => AuditRecord::completed(&request.url, report),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "Audit failed, storing degraded record");
                AuditRecord::degraded(&request.url, e.to_string())
            }
        };

        Ok(self.commit(record))
    }

    /// Run an audit, propagating engine failures. Nothing is stored on failure.
    pub async fn try_run_audit(&self, request: &AuditRequest) -> Result<Arc<AuditRecord>> {
        validate(request)?;

        let options = EngineOptions::from(request);
        let report = self.engine.run(&request.url, &options).await?;
        Ok(self.commit(AuditRecord::completed(&request.url, report)))
    }

    fn commit(&self, record: AuditRecord) -> Arc<AuditRecord> {
        let record = self.store.put(record);
        tracing::info!(
            report_id = %record.id,
            url = %record.url,
            degraded = record.is_degraded(),
            "Stored audit report"
        );
        record
    }

    /// Stored record by id
    pub fn get_record(&self, id: &str) -> Result<Arc<AuditRecord>> {
        self.store
            .get(id)
            .ok_or_else(|| LighthouseError::ReportNotFound(id.to_string()))
    }

    /// Raw report body of a stored record
    pub fn get_report(&self, id: &str) -> Result<serde_json::Value> {
        self.get_record(id).map(|record| record.report_body.clone())
    }

    pub fn derive_fix(&self, record: &AuditRecord, only_failures: bool) -> FixSuggestion {
        self.fixer.derive(
            &record.raw_result,
            &record.report_body,
            FixOptions { only_failures },
        )
    }
}

/// Compact summary: percentages for performance and accessibility, each
/// absent when the engine did not score that category.
pub fn summarize(record: &AuditRecord) -> Summary {
    Summary {
        report_id: record.id.clone(),
        url: record.url.clone(),
        fetched_at: record.fetched_at,
        performance: record.raw_result.category_score("performance").map(score_percent),
        accessibility: record
            .raw_result
            .category_score("accessibility")
            .map(score_percent),
    }
}

fn validate(request: &AuditRequest) -> Result<()> {
    if request.url.trim().is_empty() {
        return Err(LighthouseError::MissingUrl);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockEngine;
    use crate::types::FormFactor;
    use std::collections::HashSet;

    fn service(engine: MockEngine) -> (AuditService, Arc<MockEngine>) {
        let engine = Arc::new(engine);
        (AuditService::new(engine.clone()), engine)
    }

    #[tokio::test]
    async fn test_run_audit_roundtrip() {
        let (svc, _) = service(MockEngine::new());
        let record = svc
            .run_audit(&AuditRequest::new("https://a.dev"))
            .await
            .unwrap();

        let body = svc.get_report(&record.id).unwrap();
        assert_eq!(body, record.report_body);
        assert_eq!(body["requestedUrl"], "https://a.dev");
    }

    #[tokio::test]
    async fn test_run_audit_missing_url_skips_engine() {
        let (svc, engine) = service(MockEngine::new());
        let err = svc.run_audit(&AuditRequest::new("  ")).await.unwrap_err();
        assert!(matches!(err, LighthouseError::MissingUrl));
        assert_eq!(engine.calls(), 0);
        assert!(svc.store().is_empty());
    }

    #[tokio::test]
    async fn test_run_audit_forwards_options() {
        let (svc, engine) = service(MockEngine::new());
        let request = AuditRequest::new("https://a.dev")
            .with_form_factor(FormFactor::Mobile)
            .with_categories(vec!["performance".into()]);
        svc.run_audit(&request).await.unwrap();

        let (url, options) = engine.seen().remove(0);
        assert_eq!(url, "https://a.dev");
        assert_eq!(options.emulate_mobile, Some(true));
        assert_eq!(options.categories.unwrap(), vec!["performance"]);
    }

    #[tokio::test]
    async fn test_engine_failure_degrades() {
        let (svc, engine) = service(MockEngine::failing("chrome not found"));
        let record = svc
            .run_audit(&AuditRequest::new("https://a.dev"))
            .await
            .unwrap();

        assert_eq!(engine.calls(), 1);
        assert_eq!(record.error.as_deref(), Some("chrome not found"));
        assert!(record.raw_result.categories.is_empty());
        assert_eq!(
            svc.get_report(&record.id).unwrap()["error"],
            "chrome not found"
        );
    }

    #[tokio::test]
    async fn test_try_run_audit_propagates_failure() {
        let (svc, engine) = service(MockEngine::failing("navigation timeout"));
        let err = svc
            .try_run_audit(&AuditRequest::new("https://a.dev"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "navigation timeout");
        assert_eq!(engine.calls(), 1);
        assert!(svc.store().is_empty());
    }

    #[tokio::test]
    async fn test_get_report_unknown() {
        let (svc, _) = service(MockEngine::new());
        let err = svc.get_report("rpt-nope").unwrap_err();
        assert!(matches!(err, LighthouseError::ReportNotFound(id) if id == "rpt-nope"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_audits_distinct_ids() {
        let engine = Arc::new(MockEngine::new().with_delay(std::time::Duration::from_millis(5)));
        let svc = Arc::new(AuditService::new(engine.clone()));

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    svc.run_audit(&AuditRequest::new("https://same.dev"))
                        .await
                        .unwrap()
                        .id
                        .clone()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            ids.insert(handle.await.unwrap());
        }

        assert_eq!(ids.len(), 100);
        assert_eq!(svc.store().len(), 100);
        assert_eq!(engine.calls(), 100);
    }

    #[tokio::test]
    async fn test_summarize_rounds_and_omits() {
        let (svc, _) = service(MockEngine::with_result(serde_json::json!({
            "categories": {"performance": {"score": 0.873}}
        })));
        let record = svc
            .run_audit(&AuditRequest::new("https://a.dev"))
            .await
            .unwrap();

        let summary = summarize(&record);
        assert_eq!(summary.performance, Some(87));
        assert_eq!(summary.accessibility, None);
        assert_eq!(summary.report_id, record.id);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("accessibility").is_none());
    }

    #[tokio::test]
    async fn test_summarize_degraded_has_no_scores() {
        let (svc, _) = service(MockEngine::failing("boom"));
        let record = svc
            .run_audit(&AuditRequest::new("https://a.dev"))
            .await
            .unwrap();

        let json = serde_json::to_value(summarize(&record)).unwrap();
        assert!(json.get("performance").is_none());
        assert!(json.get("accessibility").is_none());
    }

    #[tokio::test]
    async fn test_derive_fix_only_failures() {
        let (svc, _) = service(MockEngine::with_result(serde_json::json!({
            "audits": {
                "a": {"score": 1},
                "b": {"score": 0.5},
                "c": {"scoreDisplayMode": "notApplicable"}
            }
        })));
        let record = svc
            .run_audit(&AuditRequest::new("https://a.dev"))
            .await
            .unwrap();

        let fix = svc.derive_fix(&record, true);
        let failures = fix.failures.unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures.contains_key("b"));
        assert!(fix.performance.is_none());
    }
}
