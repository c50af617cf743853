//! Mock audit engine for testing

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LighthouseError, Result};
use crate::types::{EngineOptions, EngineReport, LighthouseResult};

/// Engine double that returns a canned result (or a canned failure) and
/// records every call it receives.
pub struct MockEngine {
    result: serde_json::Value,
    failure: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, EngineOptions)>>,
}

impl MockEngine {
    /// Performance 0.873, accessibility 1.0, and a small mixed audit set.
    pub fn new() -> Self {
        Self::with_result(serde_json::json!({
            "categories": {
                "performance": {"id": "performance", "title": "Performance", "score": 0.873},
                "accessibility": {"id": "accessibility", "title": "Accessibility", "score": 1.0}
            },
            "audits": {
                "first-contentful-paint": {"score": 1, "scoreDisplayMode": "numeric"},
                "render-blocking-resources": {"score": 0.5, "scoreDisplayMode": "metricSavings"},
                "viewport": {"score": null, "scoreDisplayMode": "notApplicable"}
            }
        }))
    }

    pub fn with_result(result: serde_json::Value) -> Self {
        Self {
            result,
            failure: None,
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// An engine whose every run fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let mut engine = Self::new();
        engine.failure = Some(message.into());
        engine
    }

    /// Suspend each run for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URL and options of every run, in call order.
    pub fn seen(&self) -> Vec<(String, EngineOptions)> {
        self.seen.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl super::AuditEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, url: &str, options: &EngineOptions) -> Result<EngineReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((url.to_string(), options.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = &self.failure {
            return Err(LighthouseError::Engine(message.clone()));
        }

        let result: LighthouseResult = serde_json::from_value(self.result.clone())?;
        let mut report = self.result.clone();
        if let Some(obj) = report.as_object_mut() {
            obj.insert("requestedUrl".to_string(), serde_json::json!(url));
        }
        Ok(EngineReport { result, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AuditEngine;

    #[tokio::test]
    async fn test_mock_engine_counts_calls() {
        let engine = MockEngine::new();
        engine
            .run("https://a.dev", &EngineOptions::default())
            .await
            .unwrap();
        engine
            .run("https://b.dev", &EngineOptions::default())
            .await
            .unwrap();
        assert_eq!(engine.calls(), 2);
        assert_eq!(engine.seen()[1].0, "https://b.dev");
    }

    #[tokio::test]
    async fn test_mock_engine_failing() {
        let engine = MockEngine::failing("chrome crashed");
        let err = engine
            .run("https://a.dev", &EngineOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "chrome crashed");
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_engine_report_echoes_url() {
        let engine = MockEngine::new();
        let report = engine
            .run("https://a.dev", &EngineOptions::default())
            .await
            .unwrap();
        assert_eq!(report.report["requestedUrl"], "https://a.dev");
        assert_eq!(report.result.category_score("performance"), Some(0.873));
    }
}
