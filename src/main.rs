use clap::Parser;
use tracing_subscriber::EnvFilter;

use a3s_lighthouse::bootstrap::{PipeProbe, TerminalProbe};
use a3s_lighthouse::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Stdout may carry MCP frames, so logs go to stderr whenever we are piped
    let piped = TerminalProbe.is_piped();
    init_tracing(piped);

    let config = cli.config()?;
    a3s_lighthouse::cli::serve::execute(config, piped).await?;

    Ok(())
}

fn init_tracing(to_stderr: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
