//! # contract: interface to the external deploy collaborator
//!
//! The actual upload or local install is done by whatever implements
//! [`Deployer`]: a Maven process wrapper in the CLI crate, or a mock in tests.
//! This crate only stages files and decides which calls to make.
//!
//! ## Call sequence per file
//! - [`Deployer::configure`] once with that file's [`DeployOptions`]
//! - then [`Deployer::deploy`] once per configured repository, or a single
//!   [`Deployer::install`] in install mode
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; `MockDeployer` is exported under the
//!   `test-export-mocks` feature for integration tests.

use std::path::Path;

use async_trait::async_trait;
use mockall::automock;

use crate::options::DeployOptions;

/// Error reported by a deployer. Surfaced to the stream unchanged.
pub type DeployError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for the component that performs the actual upload or install.
///
/// `configure` sets up state that the following `deploy`/`install` calls use;
/// callers must not interleave another file's `configure` in between.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Set the options used by the next deploy or install calls.
    fn configure(&self, options: &DeployOptions);

    /// Upload `file` to the repository with the given id.
    async fn deploy(
        &self,
        repository_id: &str,
        file: &Path,
        snapshot: bool,
    ) -> Result<(), DeployError>;

    /// Install `file` into the local repository.
    async fn install(&self, file: &Path) -> Result<(), DeployError>;
}
