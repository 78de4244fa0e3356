//! Stream adapter: stage → configure → deploy → clean up → forward, per file.
//!
//! [`DeployStream`] sits in a stream of [`StreamedFile`]s. For every file it
//! writes a temp copy, asks the [`Deployer`] to configure itself with the
//! file's [`DeployOptions`], runs one deploy call per configured repository (or
//! one install call), deletes the temp copy and hands the original file back.
//!
//! # Responsibilities
//! - Fail fast on a bad configuration: [`DeployStream::deploy`] validates before
//!   any file is touched
//! - Surface the deployer's error unchanged; the file is then not forwarded
//! - Remove each staged file on every exit path, and sweep the staging
//!   directory once the input stream is exhausted
//!
//! # Concurrency
//! Files are processed concurrently as the input yields them, without a limit
//! unless [`DeployStream::with_max_in_flight`] sets one. The span from
//! `configure` to the last deploy call of a file holds a session lock, since
//! the deployer's configured state is shared.
//!
//! # Navigation
//! - Per-file entrypoint: [`DeployStream::process`]
//! - Stream entrypoint: [`DeployStream::pipe`]

use std::path::Path;
use std::sync::Arc;

use futures::future::{self, join_all};
use futures::stream::{self, Stream, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::{ConfigError, Configuration};
use crate::contract::{DeployError, Deployer};
use crate::file::StreamedFile;
use crate::options::{build_file_options, DeployOptions};
use crate::staging::TempRegistry;

/// What the deployer is asked to do with each staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Upload to each of these repositories, in configured order.
    Deploy { repository_ids: Vec<String> },
    /// Install into the local repository.
    Install,
}

impl Mode {
    /// Log prefix for this mode.
    pub fn tag(&self) -> &'static str {
        match self {
            Mode::Deploy { .. } => "[DEPLOY]",
            Mode::Install => "[INSTALL]",
        }
    }

    /// Past-tense verb used when reporting a forwarded file.
    pub fn verb(&self) -> &'static str {
        match self {
            Mode::Deploy { .. } => "deployed",
            Mode::Install => "installed",
        }
    }
}

pub struct DeployStream<D> {
    deployer: Arc<D>,
    config: Arc<Configuration>,
    mode: Mode,
    registry: TempRegistry,
    session: Arc<Mutex<()>>,
    max_in_flight: Option<usize>,
}

impl<D> Clone for DeployStream<D> {
    fn clone(&self) -> Self {
        Self {
            deployer: self.deployer.clone(),
            config: self.config.clone(),
            mode: self.mode.clone(),
            registry: self.registry.clone(),
            session: self.session.clone(),
            max_in_flight: self.max_in_flight,
        }
    }
}

impl<D> DeployStream<D>
where
    D: Deployer + 'static,
{
    /// Builds an adapter that deploys every file to all configured repositories.
    ///
    /// Fails if `repositories` is missing or any entry lacks `id` or `url`.
    pub fn deploy(config: Configuration, deployer: D) -> Result<Self, ConfigError> {
        let repository_ids = config.validate()?;
        info!(
            repositories = ?repository_ids,
            "[DEPLOY] Deploy stream configured"
        );
        Ok(Self::with_mode(config, deployer, Mode::Deploy { repository_ids }))
    }

    /// Builds an adapter that installs every file into the local repository.
    pub fn install(config: Configuration, deployer: D) -> Self {
        info!("[INSTALL] Install stream configured");
        Self::with_mode(config, deployer, Mode::Install)
    }

    fn with_mode(config: Configuration, deployer: D, mode: Mode) -> Self {
        config.trace_loaded();
        Self {
            deployer: Arc::new(deployer),
            config: Arc::new(config),
            mode,
            registry: TempRegistry::new(),
            session: Arc::new(Mutex::new(())),
            max_in_flight: None,
        }
    }

    /// Caps how many files [`DeployStream::pipe`] processes at once.
    pub fn with_max_in_flight(mut self, limit: usize) -> Self {
        self.max_in_flight = Some(limit.max(1));
        self
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn registry(&self) -> &TempRegistry {
        &self.registry
    }

    /// Runs one file through the pipeline and returns it unchanged on success.
    pub async fn process(&self, file: StreamedFile) -> Result<StreamedFile, DeployError> {
        let tag = self.mode.tag();
        let options = build_file_options(&file, &self.config);
        info!(
            file = %file.path.display(),
            artifact_id = %options.artifact_id,
            "{tag} Received file"
        );

        let staged = match self.registry.stage(&file).await {
            Ok(staged) => staged,
            Err(e) => {
                error!(file = %file.path.display(), error = ?e, "{tag}[ERROR] Staging failed");
                return Err(e.into());
            }
        };

        let outcome = self.run_deployer(&options, staged.path()).await;
        staged.release();

        match outcome {
            Ok(()) => {
                info!(file = %file.path.display(), "{tag} Forwarding file");
                Ok(file)
            }
            Err(e) => {
                error!(file = %file.path.display(), error = %e, "{tag}[ERROR] Deployer reported failure");
                Err(e)
            }
        }
    }

    async fn run_deployer(&self, options: &DeployOptions, staged: &Path) -> Result<(), DeployError> {
        let _session = self.session.lock().await;
        self.deployer.configure(options);

        match &self.mode {
            Mode::Deploy { repository_ids } => {
                let snapshot = options.snapshot;
                let calls = repository_ids.iter().map(|repository_id| async move {
                    debug!(repository_id = %repository_id, staged = %staged.display(), "[DEPLOY] Calling deploy");
                    let result = self.deployer.deploy(repository_id, staged, snapshot).await;
                    if result.is_ok() {
                        info!(repository_id = %repository_id, artifact_id = %options.artifact_id, "[DEPLOY] Deployed");
                    }
                    result
                });
                // Every repository call is issued; the first failure in order wins.
                join_all(calls).await.into_iter().collect()
            }
            Mode::Install => {
                debug!(staged = %staged.display(), "[INSTALL] Calling install");
                self.deployer.install(staged).await?;
                info!(artifact_id = %options.artifact_id, "[INSTALL] Installed");
                Ok(())
            }
        }
    }

    /// Removes staged files this handle left behind, and the staging
    /// directory once no other pipe is using it. Idempotent.
    pub async fn finish(&self) {
        let removed = self.registry.cleanup();
        debug!(removed, "{} Stream finished, staging swept", self.mode.tag());
    }

    /// A handle whose sweep only covers files it staged itself.
    fn scoped(&self) -> Self {
        Self {
            registry: self.registry.scope(),
            ..self.clone()
        }
    }

    /// Feeds `input` through the adapter.
    ///
    /// Yields each file once its deploy sequence succeeded, or the deployer's
    /// error in its place. Files staged by this call are swept after the last
    /// one is done; other pipes running on the same adapter are left alone.
    pub fn pipe<S>(&self, input: S) -> impl Stream<Item = Result<StreamedFile, DeployError>> + Send
    where
        S: Stream<Item = StreamedFile> + Send + 'static,
    {
        let adapter = self.scoped();
        let sweeper = adapter.clone();

        input
            .flat_map_unordered(self.max_in_flight, move |file| {
                let adapter = adapter.clone();
                stream::once(async move { adapter.process(file).await }).boxed()
            })
            .chain(
                stream::once(async move { sweeper.finish().await })
                    .filter_map(|()| future::ready(None)),
            )
    }
}
