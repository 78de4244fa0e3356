//! Per-file deploy options derived from the configuration and the file's name.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{Configuration, Repository};
use crate::file::StreamedFile;

/// Options handed to [`crate::contract::Deployer::configure`] for one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOptions {
    pub artifact_id: String,
    /// Maven packaging, taken from the file extension.
    #[serde(rename = "type")]
    pub package_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    pub repositories: Vec<Repository>,
    pub snapshot: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeployOptions {
    pub fn repository_url(&self, repository_id: &str) -> Option<&str> {
        self.repositories
            .iter()
            .find(|r| r.id.as_deref() == Some(repository_id))
            .and_then(|r| r.url.as_deref())
    }
}

/// Maps a file onto deploy options. Assumes `config` was validated upstream.
pub fn build_file_options(file: &StreamedFile, config: &Configuration) -> DeployOptions {
    let artifact_id = config
        .artifact_id
        .clone()
        .or_else(|| file.stem().map(str::to_owned))
        .unwrap_or_default();

    let mut extra = config.extra.clone();
    // The extension decides the packaging even when the config names one.
    extra.remove("type");

    let options = DeployOptions {
        artifact_id,
        package_type: file.extension().to_owned(),
        group_id: config.group_id.clone(),
        version: config.version.clone(),
        classifier: config.classifier.clone(),
        repositories: config.repositories.clone(),
        snapshot: config.snapshot,
        extra,
    };
    debug!(
        file = %file.path.display(),
        artifact_id = %options.artifact_id,
        package_type = %options.package_type,
        "Derived deploy options"
    );
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Configuration {
        Configuration {
            group_id: Some("com.mygroup".into()),
            repositories: vec![Repository::new("some-repo-id", "http://some-repo/url")],
            ..Default::default()
        }
    }

    fn file_a() -> StreamedFile {
        StreamedFile::from_bytes(
            "/home/jdoe/gulp-maven-deploy/test/fileA.txt",
            "some content of file A",
        )
    }

    #[test]
    fn uses_file_name_as_artifact_id_and_extension_as_type() {
        let options = build_file_options(&file_a(), &test_config());
        assert_eq!(options.artifact_id, "fileA");
        assert_eq!(options.package_type, "txt");
        assert_eq!(options.group_id.as_deref(), Some("com.mygroup"));
    }

    #[test]
    fn configured_artifact_id_wins() {
        let mut config = test_config();
        config.artifact_id = Some("file".into());
        let options = build_file_options(&file_a(), &config);
        assert_eq!(options.artifact_id, "file");
        assert_eq!(options.package_type, "txt");
    }

    #[test]
    fn pass_through_fields_are_merged_and_type_is_overridden() {
        let mut config = test_config();
        config.extra.insert("generatePom".into(), Value::Bool(true));
        config.extra.insert("type".into(), Value::from("war"));
        let options = build_file_options(&file_a(), &config);

        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(json["type"], "txt");
        assert_eq!(json["generatePom"], true);
        assert_eq!(json["groupId"], "com.mygroup");
        assert_eq!(json["repositories"][0]["id"], "some-repo-id");
    }

    #[test]
    fn looks_up_repository_url_by_id() {
        let options = build_file_options(&file_a(), &test_config());
        assert_eq!(options.repository_url("some-repo-id"), Some("http://some-repo/url"));
        assert_eq!(options.repository_url("unknown"), None);
    }
}
