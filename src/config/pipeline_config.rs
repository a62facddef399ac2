use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Pipeline configuration, loaded from a TOML file. Every section has a
/// working default so the pipeline runs without any config file on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// Where the pipeline reads and writes its files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub raw_dir: PathBuf,
    pub extracted_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub database_path: PathBuf,
    pub standardized_file: String,
    pub processed_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Providers attempted in order; any failure advances to the next one.
    pub source_order: Vec<String>,
    pub record_count: usize,
    pub tmdb_base_url: String,
    /// Environment variable holding the TMDB API key.
    pub tmdb_key_env: String,
    /// File fallback for the key when the variable is unset.
    pub tmdb_key_file: String,
    pub wikipedia_url: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            raw_dir: PathBuf::from("data/raw"),
            extracted_dir: PathBuf::from("extracted_data"),
            processed_dir: PathBuf::from("data/processed"),
            database_path: PathBuf::from("database/movies.db"),
            standardized_file: "standardized_movies.csv".to_string(),
            processed_file: "processed_movies.csv".to_string(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            source_order: vec!["tmdb".to_string(), "wikipedia".to_string()],
            record_count: 500,
            tmdb_base_url: "https://api.themoviedb.org/3".to_string(),
            tmdb_key_env: "TMDB_API_KEY".to_string(),
            tmdb_key_file: "tmdb_api_key.txt".to_string(),
            wikipedia_url: "https://en.wikipedia.org/wiki/List_of_films_considered_the_best"
                .to_string(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data: DataConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: PipelineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load the config file if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let config = Self::from_file(path)?;
            info!("loaded configuration from {}", path.display());
            Ok(config)
        } else {
            info!(
                "config file {} not found, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn standardized_path(&self) -> PathBuf {
        self.data.extracted_dir.join(&self.data.standardized_file)
    }

    pub fn processed_path(&self) -> PathBuf {
        self.data.processed_dir.join(&self.data.processed_file)
    }

    /// TMDB API key from the configured environment variable, falling back
    /// to the key file. `None` when neither is set.
    pub fn tmdb_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var(&self.extraction.tmdb_key_env) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Some(key);
            }
        }

        std::fs::read_to_string(&self.extraction.tmdb_key_file)
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
    }
}
