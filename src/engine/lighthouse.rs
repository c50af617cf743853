//! Lighthouse CLI engine.
//!
//! Runs `lighthouse` as a subprocess (through `npx` by default) and lets it
//! launch its own headless Chrome. Each run gets a throwaway Chrome profile
//! directory, removed when the run finishes regardless of outcome. The child
//! is spawned with `kill_on_drop`, so a dropped audit future also ends the
//! browser.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{LighthouseError, Result};
use crate::types::{EngineOptions, EngineReport, LighthouseResult};

use super::AuditEngine;

/// Default launcher for the Lighthouse CLI.
pub fn default_command() -> String {
    let command = if cfg!(windows) { "npx.cmd" } else { "npx" };
    command.to_string()
}

/// Audit engine backed by the Lighthouse CLI.
pub struct LighthouseEngine {
    command: String,
}

impl LighthouseEngine {
    pub fn new() -> Self {
        Self::with_command(default_command())
    }

    /// Use a custom launcher, e.g. a globally installed `lighthouse` binary.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn via_npx(&self) -> bool {
        Path::new(&self.command)
            .file_stem()
            .map(|stem| stem == "npx")
            .unwrap_or(false)
    }

    fn build_args(&self, url: &str, options: &EngineOptions, profile_dir: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if self.via_npx() {
            args.push("--yes".to_string());
            args.push("lighthouse".to_string());
        }
        args.push(url.to_string());
        args.push("--output=json".to_string());
        args.push("--quiet".to_string());
        args.push(format!(
            "--chrome-flags=--headless --user-data-dir=\"{}\"",
            profile_dir.display()
        ));

        if options.emulate_mobile == Some(true) {
            args.push("--form-factor=mobile".to_string());
            args.push("--screenEmulation.mobile".to_string());
        } else {
            args.push("--preset=desktop".to_string());
        }

        if let Some(categories) = options.categories.as_ref().filter(|c| !c.is_empty()) {
            args.push(format!("--only-categories={}", categories.join(",")));
        }

        args
    }
}

impl Default for LighthouseEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditEngine for LighthouseEngine {
    fn name(&self) -> &str {
        "lighthouse"
    }

    async fn run(&self, url: &str, options: &EngineOptions) -> Result<EngineReport> {
        let profile = ProfileDir::create()?;
        let args = self.build_args(url, options, profile.path());

        tracing::info!(url, command = %self.command, "Starting Lighthouse audit");

        let output = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                LighthouseError::Engine(format!("Failed to launch {}: {e}", self.command))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => format!("Lighthouse exited with {}", output.status),
                s => s.to_string(),
            };
            tracing::warn!(url, status = %output.status, "Lighthouse audit failed");
            return Err(LighthouseError::Engine(message));
        }

        let report = parse_output(&output.stdout)?;
        tracing::info!(url, "Lighthouse audit finished");
        Ok(report)
    }
}

/// Parse the CLI's JSON output. Older wrappers nest the result under `lhr`.
fn parse_output(stdout: &[u8]) -> Result<EngineReport> {
    let payload: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|e| LighthouseError::Engine(format!("Invalid Lighthouse output: {e}")))?;

    let lhr = payload.get("lhr").cloned().unwrap_or_else(|| payload.clone());

    if let Some(message) = lhr
        .get("runtimeError")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return Err(LighthouseError::Engine(message.to_string()));
    }

    let result: LighthouseResult = serde_json::from_value(lhr)
        .map_err(|e| LighthouseError::Engine(format!("Unexpected Lighthouse result: {e}")))?;

    Ok(EngineReport {
        result,
        report: payload,
    })
}

/// Temporary Chrome profile directory, removed on drop.
struct ProfileDir(PathBuf);

impl ProfileDir {
    fn create() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("lighthouse-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path)?;
        Ok(Self(path))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ProfileDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.0) {
            tracing::debug!(path = %self.0.display(), "Failed to remove Chrome profile: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PathBuf {
        PathBuf::from("/tmp/lh-profile")
    }

    #[test]
    fn test_args_desktop_default() {
        let engine = LighthouseEngine::with_command("npx");
        let args = engine.build_args("https://a.dev", &EngineOptions::default(), &profile());
        assert_eq!(&args[..3], &["--yes", "lighthouse", "https://a.dev"]);
        assert!(args.contains(&"--output=json".to_string()));
        assert!(args.contains(&"--preset=desktop".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--only-categories")));
    }

    #[test]
    fn test_args_mobile_and_categories() {
        let engine = LighthouseEngine::with_command("lighthouse");
        let options = EngineOptions {
            emulate_mobile: Some(true),
            categories: Some(vec!["performance".into(), "accessibility".into()]),
        };
        let args = engine.build_args("https://a.dev", &options, &profile());
        assert_eq!(args[0], "https://a.dev");
        assert!(args.contains(&"--form-factor=mobile".to_string()));
        assert!(!args.contains(&"--preset=desktop".to_string()));
        assert!(args.contains(&"--only-categories=performance,accessibility".to_string()));
    }

    #[test]
    fn test_args_chrome_profile() {
        let engine = LighthouseEngine::new();
        let args = engine.build_args("https://a.dev", &EngineOptions::default(), &profile());
        assert!(args
            .iter()
            .any(|a| a == r#"--chrome-flags=--headless --user-data-dir="/tmp/lh-profile""#));
    }

    #[test]
    fn test_args_chrome_profile_with_spaces() {
        let engine = LighthouseEngine::new();
        let dir = PathBuf::from("/Users/Jane Doe/AppData/Local/Temp/lh-profile");
        let args = engine.build_args("https://a.dev", &EngineOptions::default(), &dir);
        let flag = args.iter().find(|a| a.starts_with("--chrome-flags=")).unwrap();
        assert!(flag.ends_with(r#"--user-data-dir="/Users/Jane Doe/AppData/Local/Temp/lh-profile""#));
    }

    #[test]
    fn test_parse_plain_lhr() {
        let out = br#"{"categories":{"performance":{"score":0.5}},"audits":{}}"#;
        let report = parse_output(out).unwrap();
        assert_eq!(report.result.category_score("performance"), Some(0.5));
        assert_eq!(report.report["categories"]["performance"]["score"], 0.5);
    }

    #[test]
    fn test_parse_nested_lhr() {
        let out = br#"{"lhr":{"categories":{"seo":{"score":1}}},"report":"<html>"}"#;
        let report = parse_output(out).unwrap();
        assert_eq!(report.result.category_score("seo"), Some(1.0));
        assert_eq!(report.report["report"], "<html>");
    }

    #[test]
    fn test_parse_runtime_error() {
        let out = br#"{"runtimeError":{"code":"NO_FCP","message":"The page did not paint"}}"#;
        let err = parse_output(out).unwrap_err();
        assert_eq!(err.to_string(), "The page did not paint");
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_output(b"not json").unwrap_err();
        assert!(err.to_string().contains("Invalid Lighthouse output"));
    }

    #[test]
    fn test_profile_dir_removed_on_drop() {
        let dir = ProfileDir::create().unwrap();
        let path = dir.path().to_path_buf();
        assert!(path.exists());
        drop(dir);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_command_is_engine_error() {
        let engine = LighthouseEngine::with_command("nonexistent_lighthouse_12345");
        let err = engine
            .run("https://a.dev", &EngineOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LighthouseError::Engine(_)));
        assert!(err.to_string().contains("Failed to launch"));
    }
}
