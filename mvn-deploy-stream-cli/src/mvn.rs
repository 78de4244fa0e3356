#![doc = "Deployer backed by the Maven executable: runs deploy:deploy-file and install:install-file for staged files."]
//
//! # Maven process deployer
//!
//! [`MvnDeployer`] implements the core [`Deployer`] trait by spawning `mvn`.
//! Uploading, checksums, metadata and authentication (via `settings.xml` server
//! ids) are all Maven's business; this module only builds the command line.
//!
//! - The executable is `mvn`, or whatever `MVN_EXECUTABLE` points to.
//! - With `dry_run`, commands are logged instead of executed.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use mvn_deploy_stream::{DeployError, DeployOptions, Deployer};
use serde_json::Value;
use tokio::process::Command;

pub const EXECUTABLE_ENV: &str = "MVN_EXECUTABLE";

const SNAPSHOT_SUFFIX: &str = "-SNAPSHOT";
const OUTPUT_TAIL_LINES: usize = 20;

pub struct MvnDeployer {
    executable: String,
    dry_run: bool,
    options: Mutex<Option<DeployOptions>>,
}

impl MvnDeployer {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            dry_run: false,
            options: Mutex::new(None),
        }
    }

    pub fn from_env() -> Self {
        let executable = std::env::var(EXECUTABLE_ENV).unwrap_or_else(|_| "mvn".to_string());
        tracing::info!(executable = %executable, "Initialized MvnDeployer from environment");
        Self::new(executable)
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn current_options(&self) -> Result<DeployOptions, DeployError> {
        let guard = self
            .options
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard
            .clone()
            .ok_or_else(|| "mvn deployer used before configure".into())
    }

    async fn run(&self, args: Vec<String>) -> Result<(), DeployError> {
        let command_line = format!("{} {}", self.executable, args.join(" "));
        if self.dry_run {
            tracing::info!(command = %command_line, "Dry run, not invoking mvn");
            return Ok(());
        }

        tracing::debug!(command = %command_line, "Invoking mvn");
        let output = Command::new(&self.executable).args(&args).output().await?;
        if output.status.success() {
            tracing::info!(status = %output.status, "mvn finished");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let log = if stderr.trim().is_empty() { stdout } else { stderr };
        let tail = tail_lines(&log, OUTPUT_TAIL_LINES);
        tracing::error!(status = %output.status, output = %tail, "mvn failed");
        Err(format!("mvn exited with {}: {}", output.status, tail).into())
    }
}

#[async_trait]
impl Deployer for MvnDeployer {
    fn configure(&self, options: &DeployOptions) {
        let mut guard = self
            .options
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(options.clone());
    }

    async fn deploy(
        &self,
        repository_id: &str,
        file: &Path,
        snapshot: bool,
    ) -> Result<(), DeployError> {
        let options = self.current_options()?;
        let url = options
            .repository_url(repository_id)
            .ok_or_else(|| format!("No url configured for repository {repository_id:?}"))?
            .to_owned();
        tracing::info!(
            repository_id,
            url = %url,
            artifact_id = %options.artifact_id,
            "Deploying file with mvn"
        );
        self.run(deploy_file_args(&options, repository_id, &url, file, snapshot))
            .await
    }

    async fn install(&self, file: &Path) -> Result<(), DeployError> {
        let options = self.current_options()?;
        tracing::info!(artifact_id = %options.artifact_id, "Installing file with mvn");
        self.run(install_file_args(&options, file)).await
    }
}

/// Arguments for `mvn deploy:deploy-file`.
pub fn deploy_file_args(
    options: &DeployOptions,
    repository_id: &str,
    url: &str,
    file: &Path,
    snapshot: bool,
) -> Vec<String> {
    let mut args = vec![
        "-B".to_string(),
        "deploy:deploy-file".to_string(),
        format!("-Dfile={}", file.display()),
        format!("-DrepositoryId={repository_id}"),
        format!("-Durl={url}"),
    ];
    args.extend(coordinate_args(options, snapshot));
    args
}

/// Arguments for `mvn install:install-file`.
pub fn install_file_args(options: &DeployOptions, file: &Path) -> Vec<String> {
    let mut args = vec![
        "-B".to_string(),
        "install:install-file".to_string(),
        format!("-Dfile={}", file.display()),
    ];
    args.extend(coordinate_args(options, options.snapshot));
    args
}

fn coordinate_args(options: &DeployOptions, snapshot: bool) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(group_id) = &options.group_id {
        args.push(format!("-DgroupId={group_id}"));
    }
    args.push(format!("-DartifactId={}", options.artifact_id));
    if let Some(version) = &options.version {
        let version = if snapshot {
            snapshot_version(version)
        } else {
            version.clone()
        };
        args.push(format!("-Dversion={version}"));
    }
    if !options.package_type.is_empty() {
        args.push(format!("-Dpackaging={}", options.package_type));
    }
    if let Some(classifier) = &options.classifier {
        args.push(format!("-Dclassifier={classifier}"));
    }
    if !options.extra.contains_key("generatePom") {
        args.push("-DgeneratePom=true".to_string());
    }
    for (key, value) in &options.extra {
        match value {
            Value::String(s) => args.push(format!("-D{key}={s}")),
            Value::Bool(b) => args.push(format!("-D{key}={b}")),
            Value::Number(n) => args.push(format!("-D{key}={n}")),
            // Only scalars map onto -D properties.
            Value::Null | Value::Array(_) | Value::Object(_) => {
                tracing::debug!(key = %key, "Skipping non-scalar pass-through option");
            }
        }
    }
    args
}

fn snapshot_version(version: &str) -> String {
    if version.ends_with(SNAPSHOT_SUFFIX) {
        version.to_string()
    } else {
        format!("{version}{SNAPSHOT_SUFFIX}")
    }
}

fn tail_lines(text: &str, count: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvn_deploy_stream::{build_file_options, Configuration, Repository, StreamedFile};
    use std::path::PathBuf;

    fn options() -> DeployOptions {
        let mut config = Configuration {
            group_id: Some("com.mygroup".into()),
            version: Some("1.2.0".into()),
            repositories: vec![Repository::new("releases", "https://repo.example.com/releases")],
            ..Default::default()
        };
        config.extra.insert("finalName".into(), Value::from("bundle"));
        config
            .extra
            .insert("nested".into(), serde_json::json!({"ignored": true}));
        build_file_options(&StreamedFile::from_bytes("dist/web.war", "x"), &config)
    }

    #[test]
    fn builds_deploy_file_command() {
        let args = deploy_file_args(
            &options(),
            "releases",
            "https://repo.example.com/releases",
            &PathBuf::from("/tmp/staged.war"),
            false,
        );
        assert_eq!(&args[..2], &["-B", "deploy:deploy-file"]);
        for expected in [
            "-Dfile=/tmp/staged.war",
            "-DrepositoryId=releases",
            "-Durl=https://repo.example.com/releases",
            "-DgroupId=com.mygroup",
            "-DartifactId=web",
            "-Dversion=1.2.0",
            "-Dpackaging=war",
            "-DgeneratePom=true",
            "-DfinalName=bundle",
        ] {
            assert!(args.iter().any(|a| a == expected), "missing {expected} in {args:?}");
        }
        assert!(!args.iter().any(|a| a.starts_with("-Dnested")));
    }

    #[test]
    fn snapshot_suffixes_version_once() {
        let args = deploy_file_args(&options(), "r", "u", Path::new("f"), true);
        assert!(args.iter().any(|a| a == "-Dversion=1.2.0-SNAPSHOT"));
        assert_eq!(snapshot_version("1.2.0-SNAPSHOT"), "1.2.0-SNAPSHOT");
    }

    #[test]
    fn explicit_generate_pom_is_not_duplicated() {
        let mut opts = options();
        opts.extra.insert("generatePom".into(), Value::Bool(false));
        let args = install_file_args(&opts, Path::new("/tmp/staged.war"));
        assert_eq!(args[1], "install:install-file");
        assert!(args.iter().any(|a| a == "-DgeneratePom=false"));
        assert!(!args.iter().any(|a| a == "-DgeneratePom=true"));
    }

    #[tokio::test]
    async fn deploy_before_configure_fails() {
        let deployer = MvnDeployer::new("mvn").dry_run(true);
        let err = deployer
            .deploy("releases", Path::new("/tmp/x.war"), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("before configure"));
    }

    #[tokio::test]
    async fn unknown_repository_id_fails() {
        let deployer = MvnDeployer::new("mvn").dry_run(true);
        deployer.configure(&options());
        let err = deployer
            .deploy("snapshots", Path::new("/tmp/x.war"), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("snapshots"));
    }

    #[tokio::test]
    async fn dry_run_succeeds_without_mvn() {
        let deployer = MvnDeployer::new("/nonexistent/mvn").dry_run(true);
        deployer.configure(&options());
        deployer
            .deploy("releases", Path::new("/tmp/x.war"), false)
            .await
            .unwrap();
        deployer.install(Path::new("/tmp/x.war")).await.unwrap();
    }

    #[tokio::test]
    async fn missing_executable_is_an_error() {
        let deployer = MvnDeployer::new("/nonexistent/mvn");
        deployer.configure(&options());
        assert!(deployer.install(Path::new("/tmp/x.war")).await.is_err());
    }

    #[test]
    fn keeps_last_lines_of_output() {
        assert_eq!(tail_lines("a\nb\nc", 2), "b\nc");
        assert_eq!(tail_lines("a", 5), "a");
    }
}
