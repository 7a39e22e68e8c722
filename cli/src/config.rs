//! Application configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables (a `.env` file is loaded into the environment by the
//! binary before this runs).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use simrank_ranker::RankerConfig;
use simrank_retrieval::{ChunkerConfig, RetrievalConfig};

/// Directory name under the user's config directory.
const APP_DIR: &str = "simrank";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`AppConfig`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A setting holds a value of the wrong type or out of range.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Settings for the `ask` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub temperature: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        let defaults = RetrievalConfig::default();
        Self {
            chunk_size: defaults.chunker.chunk_size,
            chunk_overlap: defaults.chunker.chunk_overlap,
            top_k: defaults.top_k,
            temperature: defaults.temperature,
        }
    }
}

/// Top-level configuration for the `simrank` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API key for the hosted provider.
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,

    /// Model used for embeddings.
    pub embedding_model: String,

    /// Model used for chat completions.
    pub chat_model: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum number of embedding requests in flight.
    pub concurrency: usize,

    /// JSON file for the persistent embedding cache.
    pub cache_file: Option<PathBuf>,

    pub retrieval: RetrievalSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: simrank_embeddings::DEFAULT_BASE_URL.to_string(),
            embedding_model: simrank_embeddings::DEFAULT_MODEL.to_string(),
            chat_model: simrank_retrieval::DEFAULT_CHAT_MODEL.to_string(),
            request_timeout_secs: 30,
            concurrency: 4,
            cache_file: None,
            retrieval: RetrievalSettings::default(),
        }
    }
}

impl AppConfig {
    /// `$XDG_CONFIG_HOME/simrank/config.toml` (or the platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Load configuration from `path`, or from [`Self::default_path`] when it
    /// exists, then apply environment overrides.
    ///
    /// An explicit path must exist; the default one is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::from_file(&default)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Read a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                var: "request_timeout_secs",
                value: "0".to_string(),
            });
        }
        Ok(config)
    }

    /// Override fields from environment variables looked up with `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup("OPENAI_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = lookup("SIMRANK_EMBEDDING_MODEL") {
            self.embedding_model = model;
        }
        if let Some(model) = lookup("SIMRANK_CHAT_MODEL") {
            self.chat_model = model;
        }
        if let Some(value) = lookup("SIMRANK_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_var("SIMRANK_TIMEOUT_SECS", value)?;
            if self.request_timeout_secs == 0 {
                return Err(ConfigError::InvalidValue {
                    var: "SIMRANK_TIMEOUT_SECS",
                    value: "0".to_string(),
                });
            }
        }
        if let Some(value) = lookup("SIMRANK_CONCURRENCY") {
            self.concurrency = parse_var("SIMRANK_CONCURRENCY", value)?;
        }
        if let Some(path) = lookup("SIMRANK_CACHE_FILE") {
            self.cache_file = Some(PathBuf::from(path));
        }
        Ok(())
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Ranker settings derived from this config.
    pub fn ranker_config(&self) -> RankerConfig {
        RankerConfig::default()
            .with_concurrency(self.concurrency)
            .with_model(&self.embedding_model)
    }

    /// Retrieval agent settings derived from this config.
    pub fn retrieval_config(&self) -> RetrievalConfig {
        let mut config = RetrievalConfig::default()
            .with_chunker(ChunkerConfig::new(
                self.retrieval.chunk_size,
                self.retrieval.chunk_overlap,
            ))
            .with_top_k(self.retrieval.top_k)
            .with_chat_model(&self.chat_model)
            .with_concurrency(self.concurrency);
        config.temperature = self.retrieval.temperature;
        config
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.embedding_model, "text-embedding-3-small");
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.retrieval.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            embedding_model = "text-embedding-3-large"
            concurrency = 8

            [retrieval]
            top_k = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.embedding_model, "text-embedding-3-large");
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.chat_model, "gpt-4o-mini");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
                ("SIMRANK_TIMEOUT_SECS", " 5 "),
                ("SIMRANK_CONCURRENCY", "2"),
                ("SIMRANK_CACHE_FILE", "/tmp/simrank-cache.json"),
            ]))
            .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.concurrency, 2);
        assert_eq!(
            config.cache_file,
            Some(PathBuf::from("/tmp/simrank-cache.json"))
        );
    }

    #[test]
    fn test_empty_api_key_ignored() {
        let mut config = AppConfig {
            api_key: Some("from-file".to_string()),
            ..AppConfig::default()
        };
        config
            .apply_env_overrides(env(&[("OPENAI_API_KEY", "")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_invalid_number_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_overrides(env(&[("SIMRANK_CONCURRENCY", "many")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: "SIMRANK_CONCURRENCY",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_overrides(env(&[("SIMRANK_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: "SIMRANK_TIMEOUT_SECS",
                ..
            }
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "request_timeout_secs = 0\n").unwrap();
        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: "request_timeout_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "request_timeout_secs = 12\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.request_timeout_secs, 12);

        let missing = AppConfig::from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Read { .. }));
    }

    #[test]
    fn test_retrieval_config_mapping() {
        let mut config = AppConfig::default();
        config.retrieval.chunk_size = 200;
        config.retrieval.chunk_overlap = 20;
        config.retrieval.temperature = 0.2;

        let retrieval = config.retrieval_config();
        assert_eq!(retrieval.chunker, ChunkerConfig::new(200, 20));
        assert_eq!(retrieval.top_k, 3);
        assert_eq!(retrieval.chat_model.as_deref(), Some("gpt-4o-mini"));
        assert!((retrieval.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bad_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "concurrency = \"four\"\n").unwrap();

        let err = AppConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }
}
