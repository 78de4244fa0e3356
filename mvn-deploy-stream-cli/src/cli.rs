///
/// This module implements the CLI interface for mvn-deploy-stream: command
/// parsing, argument handling and the async entrypoint used by `main` and the
/// integration tests.
///
/// All pipeline logic lives in the `mvn-deploy-stream` core crate; this module
/// reads the config, builds the Maven deployer and feeds files through
/// [`DeployStream`].
///
/// ## How To Use
/// - From the shell: `mvn-deploy-stream deploy --config deploy.yaml dist/*.war`
/// - Programmatically: call [`run`] with a constructed [`Cli`].
use crate::load_config::load_config;
use crate::mvn::MvnDeployer;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use futures::stream::{self, StreamExt};
use mvn_deploy_stream::{DeployError, DeployStream, StreamedFile};
use std::path::PathBuf;

/// CLI for mvn-deploy-stream: push build outputs to Maven repositories.
#[derive(Parser)]
#[clap(
    name = "mvn-deploy-stream",
    version,
    about = "Deploy or install build artifacts to Maven repositories"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy files to every repository listed in the config file
    Deploy {
        #[clap(flatten)]
        common: CommonArgs,
        /// Deploy as a snapshot version
        #[clap(long)]
        snapshot: bool,
        /// Process at most this many files at once
        #[clap(long)]
        max_in_flight: Option<usize>,
    },
    /// Install files into the local Maven repository
    Install {
        #[clap(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
pub struct CommonArgs {
    /// Path to the YAML config file
    #[clap(long)]
    pub config: PathBuf,
    /// Log the mvn commands instead of running them
    #[clap(long)]
    pub dry_run: bool,
    /// Base directory the files are relative to
    #[clap(long)]
    pub base: Option<PathBuf>,
    /// Files to deploy
    #[clap(required = true)]
    pub files: Vec<PathBuf>,
}

impl CommonArgs {
    fn streamed_files(&self) -> Vec<StreamedFile> {
        self.files
            .iter()
            .map(|path| {
                let file = StreamedFile::from_disk(path);
                match &self.base {
                    Some(base) => file.with_base(base),
                    None => file,
                }
            })
            .collect()
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    let (adapter, files) = match cli.command {
        Commands::Deploy {
            common,
            snapshot,
            max_in_flight,
        } => {
            let mut config = load_config(&common.config)?;
            config.snapshot |= snapshot;
            let deployer = MvnDeployer::from_env().dry_run(common.dry_run);
            let mut adapter = DeployStream::deploy(config, deployer)
                .with_context(|| format!("Invalid config {}", common.config.display()))?;
            if let Some(limit) = max_in_flight {
                adapter = adapter.with_max_in_flight(limit);
            }
            tracing::info!(command = "deploy", files = common.files.len(), "Starting deployment");
            (adapter, common.streamed_files())
        }
        Commands::Install { common } => {
            let config = load_config(&common.config)?;
            let deployer = MvnDeployer::from_env().dry_run(common.dry_run);
            tracing::info!(command = "install", files = common.files.len(), "Starting install");
            (DeployStream::install(config, deployer), common.streamed_files())
        }
    };

    let verb = adapter.mode().verb();
    let results: Vec<_> = adapter.pipe(stream::iter(files)).collect().await;

    let mut forwarded = 0usize;
    let mut first_error = None;
    for result in results {
        match result {
            Ok(file) => {
                forwarded += 1;
                println!("{verb} {}", file.relative().display());
            }
            Err(e) => {
                tracing::error!(error = %e, "File failed");
                eprintln!("[ERROR] {e}");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        None => {
            tracing::info!(forwarded, "All files processed");
            Ok(())
        }
        Some(e) => {
            tracing::error!(forwarded, "Stopping with first failure");
            Err(into_anyhow(e))
        }
    }
}

/// Keeps the deployer error's source chain intact for the CLI report.
fn into_anyhow(error: DeployError) -> anyhow::Error {
    anyhow::Error::from_boxed(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct UploadRejected(std::io::Error);

    impl fmt::Display for UploadRejected {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "upload rejected")
        }
    }

    impl std::error::Error for UploadRejected {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn deployer_error_keeps_its_source_chain() {
        let cause = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "repository unreachable");
        let err = into_anyhow(Box::new(UploadRejected(cause)));

        let messages: Vec<String> = err.chain().map(|e| e.to_string()).collect();
        assert_eq!(messages, vec!["upload rejected", "repository unreachable"]);
    }
}
