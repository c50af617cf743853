use serde::{Deserialize, Serialize};

use crate::engine::lighthouse;
use crate::error::{LighthouseError, Result};

/// Port used when neither `PORT` nor `AUDIT_PORT` is set
pub const DEFAULT_PORT: u16 = 5000;

/// Primary port setting
pub const PORT_VAR: &str = "PORT";

/// Secondary port setting, consulted when `PORT` is absent
pub const AUDIT_PORT_VAR: &str = "AUDIT_PORT";

/// Launcher for the Lighthouse CLI
pub const LIGHTHOUSE_CMD_VAR: &str = "LIGHTHOUSE_CMD";

/// Settings for the HTTP/SSE listener and the audit engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address for the HTTP server (default: 127.0.0.1)
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the HTTP server (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Command used to launch Lighthouse (default: npx)
    #[serde(default = "lighthouse::default_command")]
    pub lighthouse_command: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            lighthouse_command: lighthouse::default_command(),
        }
    }
}

impl ServerConfig {
    /// Returns the server bind address string (e.g., "127.0.0.1:5000").
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Pick the listening port: explicit setting, then the alias, then the default.
pub fn resolve_port(explicit: Option<u16>, alias: Option<u16>) -> u16 {
    explicit.or(alias).unwrap_or(DEFAULT_PORT)
}

/// Parse a port from a named setting. Empty values count as unset.
pub fn parse_port(name: &str, value: Option<&str>) -> Result<Option<u16>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<u16>().map(Some).map_err(|_| {
            LighthouseError::Config(format!("{name} must be a port number, got '{raw}'"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5000);
        assert_eq!(config.lighthouse_command, lighthouse::default_command());
    }

    #[test]
    fn test_bind_address() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
    }

    #[test]
    fn test_resolve_port_precedence() {
        assert_eq!(resolve_port(Some(8080), Some(9090)), 8080);
        assert_eq!(resolve_port(None, Some(9090)), 9090);
        assert_eq!(resolve_port(None, None), DEFAULT_PORT);
    }

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port(PORT_VAR, Some("6000")).unwrap(), Some(6000));
        assert_eq!(parse_port(PORT_VAR, Some(" ")).unwrap(), None);
        assert_eq!(parse_port(PORT_VAR, None).unwrap(), None);

        let err = parse_port(AUDIT_PORT_VAR, Some("abc")).unwrap_err();
        assert!(err.to_string().contains("AUDIT_PORT"));
    }

    #[test]
    fn test_config_deserialize_defaults() {
        let config: ServerConfig = serde_json::from_str(r#"{"port": 7000}"#).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 7000);
    }
}
