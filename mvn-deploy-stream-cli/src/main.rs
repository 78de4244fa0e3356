use anyhow::Result;
use clap::Parser;
use mvn_deploy_stream_cli::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // MVN_EXECUTABLE / MVN_DEPLOY_VERSION may come from a .env file.
    dotenvy::dotenv().ok();

    // Logs go to stderr; stdout carries the per-file report.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = run(cli).await;
    if let Err(e) = &result {
        tracing::error!(error = ?e, "mvn-deploy-stream failed");
    }
    result
}
