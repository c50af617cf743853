pub mod serve;

use std::collections::HashMap;

use clap::Parser;

use crate::config::{
    self, ServerConfig, AUDIT_PORT_VAR, LIGHTHOUSE_CMD_VAR, PORT_VAR,
};
use crate::error::{LighthouseError, Result};

/// A3S Lighthouse - Lighthouse audits over HTTP, SSE, and stdio
#[derive(Debug, Parser)]
#[command(name = "a3s-lighthouse", version, about)]
pub struct Cli {
    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Port to listen on when --port/PORT are absent (overrides AUDIT_PORT)
    #[arg(long)]
    pub audit_port: Option<u16>,

    /// Command used to launch Lighthouse (overrides LIGHTHOUSE_CMD)
    #[arg(long)]
    pub lighthouse_cmd: Option<String>,

    /// Environment-style overrides, e.g. `PORT=8080`
    #[arg(value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,
}

impl Cli {
    /// Resolve the server configuration from flags, `KEY=VALUE` arguments,
    /// and the process environment, in that order of precedence.
    pub fn config(&self) -> Result<ServerConfig> {
        self.config_with_env(|key| std::env::var(key).ok())
    }

    pub fn config_with_env<F>(&self, env: F) -> Result<ServerConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let assigned = parse_assignments(&self.assignments)?;
        let lookup = |key: &str| assigned.get(key).cloned().or_else(|| env(key));

        let port = match self.port {
            Some(port) => Some(port),
            None => config::parse_port(PORT_VAR, lookup(PORT_VAR).as_deref())?,
        };
        let audit_port = match self.audit_port {
            Some(port) => Some(port),
            None => config::parse_port(AUDIT_PORT_VAR, lookup(AUDIT_PORT_VAR).as_deref())?,
        };

        let mut server = ServerConfig {
            host: self.host.clone(),
            port: config::resolve_port(port, audit_port),
            ..ServerConfig::default()
        };
        if let Some(command) = self
            .lighthouse_cmd
            .clone()
            .or_else(|| lookup(LIGHTHOUSE_CMD_VAR))
            .filter(|c| !c.trim().is_empty())
        {
            server.lighthouse_command = command;
        }

        Ok(server)
    }
}

/// Split `KEY=VALUE` arguments. Keys other than the known settings are
/// ignored with a warning.
fn parse_assignments(args: &[String]) -> Result<HashMap<String, String>> {
    let mut assigned = HashMap::new();
    for arg in args {
        let (key, value) = arg.split_once('=').ok_or_else(|| {
            LighthouseError::Config(format!("Expected KEY=VALUE argument, got '{arg}'"))
        })?;
        let key = key.trim();
        if [PORT_VAR, AUDIT_PORT_VAR, LIGHTHOUSE_CMD_VAR].contains(&key) {
            assigned.insert(key.to_string(), value.to_string());
        } else {
            tracing::warn!(key, "Ignoring unknown setting");
        }
    }
    Ok(assigned)
}
