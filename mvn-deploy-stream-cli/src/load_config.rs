/// `load_config` module: reads the YAML deployment configuration used by the CLI.
///
/// # Responsibilities
/// - Parse the user-supplied YAML file into [`Configuration`]
/// - Fill `version` from the `MVN_DEPLOY_VERSION` environment variable when the
///   file does not set one, so CI can stamp builds without editing the file
/// - Report read and parse failures with the file path for CLI diagnostics
///
/// Structural validation (repositories, ids, urls) is not done here; the
/// stream adapter does it when it is built.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use mvn_deploy_stream::Configuration;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const VERSION_ENV: &str = "MVN_DEPLOY_VERSION";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Configuration> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: Configuration = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if config.version.is_none() {
        if let Ok(version) = std::env::var(VERSION_ENV) {
            info!(version = %version, env = VERSION_ENV, "Using version from environment");
            config.version = Some(version);
        }
    }

    Ok(config)
}
