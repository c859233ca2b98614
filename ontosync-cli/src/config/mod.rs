//! Project configuration
//!
//! A project file (`project.yaml` or `project.toml`) describes the Wikibase
//! deployment to synchronize into and the ontology files to import. Everything
//! the adapter needs is derived from it and passed in explicitly.

pub mod credentials;

pub use credentials::{Credentials, resolve_credentials};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:8880/w/api.php";
pub const DEFAULT_SPARQL_ENDPOINT: &str =
    "http://localhost:8834/proxy/wdqs/bigdata/namespace/wdq/sparql";
pub const DEFAULT_LANGUAGE: &str = "en";

/// Public host used by deployments that serve a self-signed certificate
pub const SELF_SIGNED_HOST: &str = "wikibase.example.com";

/// File names looked up when no config path is given
pub const CONFIG_CANDIDATES: [&str; 3] = ["project.yaml", "project.yml", "project.toml"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported configuration file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings that shape how triples are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Language used for labels and descriptions whose literal has no tag
    pub default_language: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// TLS trust for one adapter's HTTP client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportPolicy {
    pub verify_certificates: bool,
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self {
            verify_certificates: true,
        }
    }
}

impl TransportPolicy {
    /// Accept self-signed and otherwise invalid certificates
    pub fn insecure() -> Self {
        Self {
            verify_certificates: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Name of the checked-out deployment repository under `target/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default)]
    pub wikibase: WikibaseSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikibaseSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikibase_public_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mw_admin_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mw_admin_password: Option<String>,
    /// Ontology files synchronized by `ontosync import`
    #[serde(default)]
    pub import: Vec<PathBuf>,
    #[serde(default)]
    pub adapter: AdapterSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_certificates: Option<bool>,
    /// Where the URI to entity id map is persisted between runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_factory_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparql_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProjectConfig {
    /// Load configuration from a `.yaml`/`.yml` or `.toml` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content)?,
            Some("toml") => Self::from_toml_str(&content)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        log::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Find a project file in `dir`
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_CANDIDATES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Project file in `dir`, falling back to the user config directory
    /// (`~/.config/ontosync` on Linux)
    pub fn discover_with_user_fallback(dir: &Path) -> Option<PathBuf> {
        Self::discover(dir).or_else(|| {
            dirs::config_dir().and_then(|config| Self::discover(&config.join("ontosync")))
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let adapter = &self.wikibase.adapter;

        for (field, value) in [
            ("wikibase.external_host", &self.wikibase.external_host),
            ("wikibase.adapter.api_endpoint", &adapter.api_endpoint),
            ("wikibase.adapter.sparql_endpoint", &adapter.sparql_endpoint),
        ] {
            let Some(url) = value else { continue };
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be an http(s) URL, got '{}'",
                    field, url
                )));
            }
        }

        for (field, value) in [
            ("wikibase.wikibase_public_host", &self.wikibase.wikibase_public_host),
            ("wikibase.adapter.default_lang", &adapter.default_lang),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!("{} must not be empty", field)));
            }
        }

        if let Some(lang) = &adapter.default_lang {
            let tag = Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{1,8})*$")
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            if !tag.is_match(lang.trim()) {
                return Err(ConfigError::Invalid(format!(
                    "wikibase.adapter.default_lang '{}' is not a language code",
                    lang
                )));
            }
        }

        Ok(())
    }

    /// MediaWiki Action API URL.
    ///
    /// A public host of plain `localhost` means the local deployment, which
    /// publishes the wiki and the query service on their own ports.
    pub fn api_endpoint(&self) -> String {
        if let Some(url) = &self.wikibase.adapter.api_endpoint {
            return url.clone();
        }
        if let Some(host) = &self.wikibase.wikibase_public_host {
            if is_bare_localhost(host) {
                return DEFAULT_API_ENDPOINT.to_string();
            }
            return format!("http://{}/w/api.php", host.trim_end_matches('/'));
        }
        if let Some(host) = &self.wikibase.external_host {
            return format!("{}/w/api.php", host.trim_end_matches('/'));
        }
        DEFAULT_API_ENDPOINT.to_string()
    }

    /// SPARQL query service URL
    pub fn sparql_endpoint(&self) -> String {
        if let Some(url) = &self.wikibase.adapter.sparql_endpoint {
            return url.clone();
        }
        if let Some(host) = &self.wikibase.wikibase_public_host {
            if is_bare_localhost(host) {
                return DEFAULT_SPARQL_ENDPOINT.to_string();
            }
            return format!("http://{}/query/sparql", host.trim_end_matches('/'));
        }
        if let Some(host) = &self.wikibase.external_host {
            return format!("{}/query/sparql", host.trim_end_matches('/'));
        }
        DEFAULT_SPARQL_ENDPOINT.to_string()
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            default_language: self
                .wikibase
                .adapter
                .default_lang
                .clone()
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        }
    }

    /// Explicit setting wins; otherwise the known self-signed host disables verification
    pub fn transport_policy(&self) -> TransportPolicy {
        let self_signed = self.wikibase.wikibase_public_host.as_deref() == Some(SELF_SIGNED_HOST);
        TransportPolicy {
            verify_certificates: self
                .wikibase
                .adapter
                .verify_certificates
                .unwrap_or(!self_signed),
        }
    }

    pub fn uri_factory_path(&self) -> Option<&Path> {
        self.wikibase.adapter.uri_factory_path.as_deref()
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.wikibase
            .adapter
            .timeout_secs
            .map(std::time::Duration::from_secs)
    }

    /// `.env` of the deployment checked out under `target/{repo}`
    pub fn deploy_env_path(&self) -> Option<PathBuf> {
        self.repo.as_ref().map(|repo| {
            Path::new("target")
                .join(repo)
                .join("src/scripts/wikibase-release-pipeline/deploy/.env")
        })
    }

    /// Import files, resolved relative to `base_dir`
    pub fn import_files(&self, base_dir: &Path) -> Vec<PathBuf> {
        self.wikibase
            .import
            .iter()
            .map(|path| {
                if path.is_absolute() {
                    path.clone()
                } else {
                    base_dir.join(path)
                }
            })
            .collect()
    }
}

fn is_bare_localhost(host: &str) -> bool {
    matches!(host.trim_end_matches('/'), "localhost" | "127.0.0.1")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_YAML: &str = r#"
repo: my-ontology
wikibase:
  external_host: https://wiki.example.org
  mw_admin_name: admin
  mw_admin_password: secret
  import:
    - ontology.ttl
    - /abs/extra.nt
  adapter:
    default_lang: fr
    uri_factory_path: .ontosync/uris.json
"#;

    #[test]
    fn test_parse_yaml() {
        let config = ProjectConfig::from_yaml_str(FULL_YAML).unwrap();

        assert_eq!(config.repo.as_deref(), Some("my-ontology"));
        assert_eq!(config.wikibase.mw_admin_name.as_deref(), Some("admin"));
        assert_eq!(config.sync_config().default_language, "fr");
        assert_eq!(
            config.import_files(Path::new("/project")),
            vec![PathBuf::from("/project/ontology.ttl"), PathBuf::from("/abs/extra.nt")]
        );
        assert_eq!(config.uri_factory_path(), Some(Path::new(".ontosync/uris.json")));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
repo = "my-ontology"

[wikibase]
wikibase_public_host = "localhost:8880"
import = ["ontology.ttl"]

[wikibase.adapter]
verify_certificates = false
"#;
        let config = ProjectConfig::from_toml_str(toml).unwrap();

        assert_eq!(config.api_endpoint(), "http://localhost:8880/w/api.php");
        assert!(!config.transport_policy().verify_certificates);
    }

    #[test]
    fn test_localhost_uses_published_ports() {
        let config = ProjectConfig::from_yaml_str("wikibase:\n  wikibase_public_host: localhost\n").unwrap();

        assert_eq!(config.api_endpoint(), "http://localhost:8880/w/api.php");
        assert_eq!(
            config.sparql_endpoint(),
            "http://localhost:8834/proxy/wdqs/bigdata/namespace/wdq/sparql"
        );
    }

    #[test]
    fn test_endpoint_defaults() {
        let config = ProjectConfig::default();

        assert_eq!(config.api_endpoint(), DEFAULT_API_ENDPOINT);
        assert_eq!(config.sparql_endpoint(), DEFAULT_SPARQL_ENDPOINT);
        assert_eq!(config.sync_config().default_language, "en");
        assert!(config.transport_policy().verify_certificates);
    }

    #[test]
    fn test_external_host_endpoints() {
        let config = ProjectConfig::from_yaml_str(FULL_YAML).unwrap();

        assert_eq!(config.api_endpoint(), "https://wiki.example.org/w/api.php");
        assert_eq!(config.sparql_endpoint(), "https://wiki.example.org/query/sparql");
    }

    #[test]
    fn test_public_host_takes_precedence_over_external_host() {
        let mut config = ProjectConfig::from_yaml_str(FULL_YAML).unwrap();
        config.wikibase.wikibase_public_host = Some("wiki.internal".to_string());

        assert_eq!(config.api_endpoint(), "http://wiki.internal/w/api.php");
        assert_eq!(config.sparql_endpoint(), "http://wiki.internal/query/sparql");
    }

    #[test]
    fn test_explicit_endpoints_win() {
        let mut config = ProjectConfig::from_yaml_str(FULL_YAML).unwrap();
        config.wikibase.adapter.api_endpoint = Some("http://10.0.0.5/w/api.php".to_string());
        config.wikibase.adapter.sparql_endpoint = Some("http://10.0.0.5/sparql".to_string());

        assert_eq!(config.api_endpoint(), "http://10.0.0.5/w/api.php");
        assert_eq!(config.sparql_endpoint(), "http://10.0.0.5/sparql");
    }

    #[test]
    fn test_self_signed_host_disables_verification() {
        let mut config = ProjectConfig::default();
        config.wikibase.wikibase_public_host = Some(SELF_SIGNED_HOST.to_string());
        assert!(!config.transport_policy().verify_certificates);

        config.wikibase.adapter.verify_certificates = Some(true);
        assert!(config.transport_policy().verify_certificates);
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let yaml = "wikibase:\n  external_host: wiki.example.org\n";
        let err = ProjectConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_language_code_validated() {
        let ok = "wikibase:\n  adapter:\n    default_lang: pt-BR\n";
        assert!(ProjectConfig::from_yaml_str(ok).is_ok());

        let bad = "wikibase:\n  adapter:\n    default_lang: english please\n";
        let err = ProjectConfig::from_yaml_str(bad).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_file_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProjectConfig::discover(dir.path()).is_none());

        let path = dir.path().join("project.yaml");
        std::fs::write(&path, FULL_YAML).unwrap();

        assert_eq!(ProjectConfig::discover(dir.path()), Some(path.clone()));
        let config = ProjectConfig::from_file(&path).unwrap();
        assert_eq!(config.wikibase.import.len(), 2);

        let other = dir.path().join("project.ini");
        std::fs::write(&other, "").unwrap();
        assert!(matches!(
            ProjectConfig::from_file(&other),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ProjectConfig::from_file(dir.path().join("missing.yaml")),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_deploy_env_path() {
        let config = ProjectConfig::from_yaml_str(FULL_YAML).unwrap();
        assert_eq!(
            config.deploy_env_path(),
            Some(PathBuf::from(
                "target/my-ontology/src/scripts/wikibase-release-pipeline/deploy/.env"
            ))
        );
        assert_eq!(ProjectConfig::default().deploy_env_path(), None);
    }
}
