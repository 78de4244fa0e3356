#![doc = "mvn-deploy-stream: core logic for streaming files into Maven repositories."]

//! This crate maps streamed files onto Maven deploy options, stages each file
//! into a temporary copy and drives an external [`contract::Deployer`] to upload
//! or install it. The actual transfer is left to the deployer; see the CLI
//! crate for the Maven process wrapper.
//!
//! # Usage
//! Build a [`stream::DeployStream`] from a [`config::Configuration`] and a
//! deployer, then [`pipe`](stream::DeployStream::pipe) a stream of
//! [`file::StreamedFile`]s through it.

pub mod config;
pub mod contract;
pub mod file;
pub mod options;
pub mod staging;
pub mod stream;

pub use config::{ConfigError, Configuration, Repository};
pub use contract::{DeployError, Deployer};
pub use file::{Contents, StreamedFile};
pub use options::{build_file_options, DeployOptions};
pub use stream::{DeployStream, Mode};
