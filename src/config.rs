// file: src/config.rs
// description: application configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{RagError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "DOCS_RAG";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub storage: StorageConfig,
    pub index: IndexConfig,
    pub reader: ReaderConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub embedding_model: String,
    pub base_url: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub embedding_batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub persist_dir: PathBuf,
    pub data_dir: PathBuf,
    pub table_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub similarity_top_k: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub recursive: bool,
    pub exclude_hidden: bool,
    /// Lowercase extensions without the dot. Empty accepts every file.
    pub extensions: Vec<String>,
    pub skip_patterns: Vec<String>,
    pub max_file_size_mb: usize,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.1,
            timeout_secs: 60,
            max_retries: 3,
            embedding_batch_size: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            persist_dir: PathBuf::from("./storage"),
            data_dir: PathBuf::from("./data"),
            table_name: "chunks".to_string(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 20,
            similarity_top_k: 2,
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            exclude_hidden: true,
            extensions: vec![],
            skip_patterns: vec!["*.zip".to_string(), ".git/".to_string()],
            max_file_size_mb: 10,
        }
    }
}

/// The three plain environment variables the tool has always honoured.
#[derive(Debug, Clone, Default)]
pub struct LegacyEnv {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub persist_dir: Option<String>,
}

impl LegacyEnv {
    pub fn from_process() -> Self {
        let read = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: read("OPENAI_API_KEY"),
            model: read("OPENAI_API_MODEL"),
            persist_dir: read("PERSIST_DIR"),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();
        Self::from_sources(path, &LegacyEnv::from_process())
    }

    /// Layering: defaults, optional TOML file, `DOCS_RAG__*` variables, then
    /// `OPENAI_API_KEY` / `OPENAI_API_MODEL` / `PERSIST_DIR`.
    pub fn from_sources(path: Option<&Path>, legacy: &LegacyEnv) -> Result<Self> {
        Self::from_layers(path, None, legacy)
    }

    /// `env` replaces the process environment for the `DOCS_RAG__*` layer
    /// when given.
    fn from_layers(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
        legacy: &LegacyEnv,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();

        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        builder = builder.add_source(config::File::from(file).required(path.is_some()));

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        builder = builder
            .set_override_option("openai.api_key", legacy.api_key.clone())
            .and_then(|b| b.set_override_option("openai.model", legacy.model.clone()))
            .and_then(|b| b.set_override_option("storage.persist_dir", legacy.persist_dir.clone()))
            .map_err(|e| RagError::Config(e.to_string()))?;

        let settings = builder
            .build()
            .map_err(|e| RagError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| RagError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.index.chunk_size == 0 {
            return Err(RagError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.index.chunk_overlap >= self.index.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.index.chunk_overlap, self.index.chunk_size
            )));
        }

        if self.index.similarity_top_k == 0 {
            return Err(RagError::Config(
                "similarity_top_k must be greater than 0".to_string(),
            ));
        }

        if self.openai.embedding_batch_size == 0 {
            return Err(RagError::Config(
                "embedding_batch_size must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.openai.temperature) {
            return Err(RagError::Config(format!(
                "temperature must be between 0 and 2, got {}",
                self.openai.temperature
            )));
        }

        if !self.openai.base_url.starts_with("http://")
            && !self.openai.base_url.starts_with("https://")
        {
            return Err(RagError::Config(format!(
                "Invalid OpenAI base_url: {}",
                self.openai.base_url
            )));
        }

        if self.storage.table_name.trim().is_empty() {
            return Err(RagError::Config("table_name must not be empty".to_string()));
        }

        Ok(())
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.openai
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                RagError::Config(
                    "OPENAI_API_KEY is not set (environment, .env, or openai.api_key)".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.index.chunk_size, 1024);
        assert_eq!(config.index.similarity_top_k, 2);
        assert_eq!(config.storage.persist_dir, PathBuf::from("./storage"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("absent.toml");
        assert!(Config::from_sources(Some(&missing), &LegacyEnv::default()).is_err());
    }

    #[test]
    fn test_legacy_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(
            &path,
            "[openai]\nmodel = \"gpt-4\"\n\n[storage]\npersist_dir = \"./from-file\"\n\n[index]\nsimilarity_top_k = 5\n",
        )
        .unwrap();

        let legacy = LegacyEnv {
            api_key: Some("sk-test".to_string()),
            model: Some("gpt-4o-mini".to_string()),
            persist_dir: Some("./from-env".to_string()),
        };

        let config = Config::from_sources(Some(&path), &legacy).unwrap();
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.storage.persist_dir, PathBuf::from("./from-env"));
        assert_eq!(config.index.similarity_top_k, 5);
        assert_eq!(config.index.chunk_size, 1024);
    }

    #[test]
    fn test_prefixed_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(&path, "[index]\nsimilarity_top_k = 5\nchunk_size = 512\n").unwrap();

        let env = config::Map::from([
            ("DOCS_RAG__INDEX__SIMILARITY_TOP_K".to_string(), "4".to_string()),
            ("DOCS_RAG__STORAGE__DATA_DIR".to_string(), "./essays".to_string()),
            ("UNRELATED__INDEX__CHUNK_SIZE".to_string(), "7".to_string()),
        ]);

        let config = Config::from_layers(Some(&path), Some(env), &LegacyEnv::default()).unwrap();
        assert_eq!(config.index.similarity_top_k, 4);
        assert_eq!(config.index.chunk_size, 512);
        assert_eq!(config.storage.data_dir, PathBuf::from("./essays"));
    }

    #[test]
    fn test_legacy_env_wins_over_prefixed_env() {
        let env = config::Map::from([(
            "DOCS_RAG__STORAGE__PERSIST_DIR".to_string(),
            "./prefixed".to_string(),
        )]);
        let legacy = LegacyEnv {
            persist_dir: Some("./legacy".to_string()),
            ..LegacyEnv::default()
        };

        let config = Config::from_layers(None, Some(env), &legacy).unwrap();
        assert_eq!(config.storage.persist_dir, PathBuf::from("./legacy"));
    }

    #[test]
    fn test_file_values_without_overrides() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(&path, "[storage]\ndata_dir = \"./docs\"\n").unwrap();

        let config = Config::from_sources(Some(&path), &LegacyEnv::default()).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("./docs"));
        assert!(config.openai.api_key.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.index.chunk_overlap = config.index.chunk_size;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.index.similarity_top_k = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.openai.base_url = "api.openai.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.openai.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_api_key() {
        let mut config = Config::default();
        assert!(config.require_api_key().is_err());

        config.openai.api_key = Some("   ".to_string());
        assert!(config.require_api_key().is_err());

        config.openai.api_key = Some("sk-abc".to_string());
        assert_eq!(config.require_api_key().unwrap(), "sk-abc");
    }
}
