//! Lighthouse tools exposed over MCP
//!
//! | Tool | Arguments |
//! |------|-----------|
//! | `lighthouse_run_audit` | `url`, `categories?`, `formFactor?` |
//! | `lighthouse_get_report` | `reportId` |

use serde::Deserialize;

use super::protocol::{CallToolResult, JsonRpcError, McpTool, ToolContent};
use crate::orchestrator::{summarize, AuditService};
use crate::types::{AuditRecord, AuditRequest, FormFactor};

pub const RUN_AUDIT: &str = "lighthouse_run_audit";
pub const GET_REPORT: &str = "lighthouse_get_report";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunAuditArgs {
    url: String,
    #[serde(default)]
    categories: Option<Vec<String>>,
    #[serde(default)]
    form_factor: Option<FormFactor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetReportArgs {
    report_id: String,
}

/// Tool definitions advertised by `tools/list`
pub fn definitions() -> Vec<McpTool> {
    vec![
        McpTool {
            name: RUN_AUDIT.to_string(),
            description: Some(
                "Run a Lighthouse audit against a URL and store the report".to_string(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The URL to audit, including protocol (http:// or https://)"
                    },
                    "categories": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional Lighthouse categories to run, e.g. ['performance','accessibility']"
                    },
                    "formFactor": {
                        "type": "string",
                        "enum": ["mobile", "desktop"],
                        "description": "Emulated form factor"
                    }
                },
                "required": ["url"]
            }),
        },
        McpTool {
            name: GET_REPORT.to_string(),
            description: Some("Retrieve a previously-run Lighthouse report by reportId".to_string()),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "reportId": {
                        "type": "string",
                        "description": "The report id returned by `lighthouse_run_audit`"
                    }
                },
                "required": ["reportId"]
            }),
        },
    ]
}

/// Execute a tool call. Unknown tools and malformed arguments are protocol
/// errors; audit failures are reported inside the tool result.
pub async fn call(
    service: &AuditService,
    name: &str,
    arguments: Option<serde_json::Value>,
) -> Result<CallToolResult, JsonRpcError> {
    let arguments = arguments.unwrap_or_else(|| serde_json::json!({}));
    match name {
        RUN_AUDIT => {
            let args: RunAuditArgs = parse_args(name, arguments)?;
            Ok(run_audit(service, args).await)
        }
        GET_REPORT => {
            let args: GetReportArgs = parse_args(name, arguments)?;
            Ok(get_report(service, &args.report_id))
        }
        other => Err(JsonRpcError::invalid_params(format!("Unknown tool: {other}"))),
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(
    tool: &str,
    arguments: serde_json::Value,
) -> Result<T, JsonRpcError> {
    serde_json::from_value(arguments)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid arguments for {tool}: {e}")))
}

async fn run_audit(service: &AuditService, args: RunAuditArgs) -> CallToolResult {
    let request = AuditRequest {
        url: args.url,
        categories: args.categories,
        form_factor: args.form_factor.unwrap_or_default(),
    };

    let record = match service.try_run_audit(&request).await {
        Ok(record) => record,
        Err(e) => return CallToolResult::error(format!("Lighthouse audit failed: {e}")),
    };

    match render_audit(&record) {
        Ok(content) => CallToolResult::success(content),
        Err(e) => CallToolResult::error(format!("Lighthouse audit failed: {e}")),
    }
}

/// Summary, raw result, and report body, each as pretty JSON text.
fn render_audit(record: &AuditRecord) -> serde_json::Result<Vec<ToolContent>> {
    Ok(vec![
        ToolContent::text(serde_json::to_string_pretty(&summarize(record))?),
        ToolContent::text(serde_json::to_string_pretty(&record.raw_result)?),
        ToolContent::text(serde_json::to_string_pretty(&record.report_body)?),
    ])
}

fn get_report(service: &AuditService, report_id: &str) -> CallToolResult {
    match service.get_report(report_id) {
        Ok(body) => match serde_json::to_string_pretty(&body) {
            Ok(text) => CallToolResult::success(vec![ToolContent::text(text)]),
            Err(e) => CallToolResult::error(format!("Failed to render report: {e}")),
        },
        Err(e) => CallToolResult::error(e.to_string()),
    }
}
