// mvn-deploy-stream/src/config.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info};

/// User-supplied deployment configuration, consumed once when a stream is built.
///
/// Keys are camelCase on the wire. Anything not modelled here is kept verbatim
/// in `extra` and handed to the deployer with every file's options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    /// Passed as the `snapshot` argument of every deploy call.
    #[serde(default)]
    pub snapshot: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A remote artifact destination. Both fields are required for deployment;
/// they are optional here so a bad entry fails validation instead of parsing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Repository {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            url: Some(url.into()),
        }
    }

    fn is_complete(&self) -> bool {
        let present = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.id) && present(&self.url)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing repositories configuration")]
    MissingRepositories,
    #[error("Deploy required \"id\" and \"url\". (repository #{index})")]
    IncompleteRepository { index: usize },
}

impl Configuration {
    /// Checks everything deploy mode needs before any file is streamed.
    ///
    /// Returns the repository ids in configured order.
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        if self.repositories.is_empty() {
            error!("No repositories configured for deployment");
            return Err(ConfigError::MissingRepositories);
        }

        let mut ids = Vec::with_capacity(self.repositories.len());
        for (index, repo) in self.repositories.iter().enumerate() {
            if !repo.is_complete() {
                error!(index, repository = ?repo, "Repository entry lacks id or url");
                return Err(ConfigError::IncompleteRepository { index });
            }
            ids.extend(repo.id.clone());
        }
        Ok(ids)
    }

    pub fn trace_loaded(&self) {
        info!(
            repositories_count = self.repositories.len(),
            group_id = self.group_id.as_deref().unwrap_or("<unset>"),
            artifact_id = self.artifact_id.as_deref().unwrap_or("<from file name>"),
            snapshot = self.snapshot,
            "Loaded deployment Configuration"
        );
        debug!(?self, "Configuration loaded (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_repos(repos: Vec<Repository>) -> Configuration {
        Configuration {
            group_id: Some("com.mygroup".into()),
            repositories: repos,
            ..Default::default()
        }
    }

    #[test]
    fn missing_repositories_fails() {
        let err = Configuration::default().validate().unwrap_err();
        assert_eq!(err, ConfigError::MissingRepositories);
        assert!(err.to_string().contains("Missing repositories configuration"));
    }

    #[test]
    fn repository_without_url_fails() {
        let config = with_repos(vec![
            Repository::new("some-repo", "http://some-repo/url"),
            Repository {
                id: Some("only-an-id".into()),
                url: None,
            },
        ]);
        let err = config.validate().unwrap_err();
        assert_eq!(err, ConfigError::IncompleteRepository { index: 1 });
        assert!(err.to_string().contains("Deploy required \"id\" and \"url\"."));
    }

    #[test]
    fn repository_without_id_fails() {
        let config = with_repos(vec![Repository {
            id: None,
            url: Some("http://only/an-url".into()),
        }]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IncompleteRepository { index: 0 })
        ));
    }

    #[test]
    fn empty_strings_count_as_missing() {
        let config = with_repos(vec![Repository::new("", "http://some-repo/url")]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn valid_config_yields_ids_in_order() {
        let config = with_repos(vec![
            Repository::new("some-repo-id", "http://some-repo/url"),
            Repository::new("another-repo-id", "http://another-repo/url"),
        ]);
        assert_eq!(
            config.validate().unwrap(),
            vec!["some-repo-id".to_string(), "another-repo-id".to_string()]
        );
    }

    #[test]
    fn unknown_fields_are_kept_as_pass_through() {
        let config: Configuration = serde_json::from_value(serde_json::json!({
            "groupId": "com.mygroup",
            "repositories": [{"id": "r", "url": "http://r"}],
            "generatePom": false,
            "finalName": "bundle"
        }))
        .unwrap();
        assert_eq!(config.group_id.as_deref(), Some("com.mygroup"));
        assert_eq!(config.extra.get("generatePom"), Some(&Value::Bool(false)));
        assert_eq!(config.extra.get("finalName"), Some(&Value::from("bundle")));
        assert!(!config.extra.contains_key("groupId"));
    }
}
