use std::path::PathBuf;

use clap::Parser;
use docchat_server::{AppConfig, run_server, telemetry::init_logging};

/// Ask questions about your documents.
#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "docchat - retrieval-augmented chat server", long_about = None)]
#[command(version)]
struct Cli {
    /// YAML config file (default: ./docchat.yaml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override server.host
    #[arg(long)]
    host: Option<String>,

    /// Override server.port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_logging(&config.log)?;
    run_server(config).await
}
