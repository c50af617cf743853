use serde::{Deserialize, Serialize};

use crate::fix::FixSuggestion;
use crate::types::{AuditRequest, FormFactor, Summary};

/// POST /audit request body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditBody {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub form_factor: Option<FormFactor>,
    /// Include failing checks in the fix suggestion
    #[serde(default)]
    pub only_failures: bool,
}

impl AuditBody {
    pub fn to_request(&self) -> AuditRequest {
        AuditRequest {
            url: self.url.clone().unwrap_or_default(),
            categories: self.categories.clone(),
            form_factor: self.form_factor.unwrap_or_default(),
        }
    }
}

/// POST /audit response body
#[derive(Debug, Clone, Serialize)]
pub struct AuditResponse {
    pub summary: Summary,
    pub fix: FixSuggestion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of the catch-all informational reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_body_defaults() {
        let body: AuditBody = serde_json::from_str("{}").unwrap();
        assert!(body.url.is_none());
        assert!(!body.only_failures);
        assert_eq!(body.to_request().url, "");
    }

    #[test]
    fn test_audit_body_camel_case() {
        let body: AuditBody = serde_json::from_str(
            r#"{"url":"https://a.dev","formFactor":"mobile","onlyFailures":true,"categories":["seo"]}"#,
        )
        .unwrap();
        let request = body.to_request();
        assert_eq!(request.form_factor, FormFactor::Mobile);
        assert_eq!(request.categories, Some(vec!["seo".to_string()]));
        assert!(body.only_failures);
    }
}
