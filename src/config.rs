//! Analysis configuration.
//!
//! Configuration is read from a YAML file (path given explicitly or via `SEMANTIC_CONFIG`),
//! then selected environment variables are layered on top. Every section has defaults, so an
//! empty file (or no file) yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::reduction::{EigenOrder, NeighborEmbeddingParams};
use crate::{Error, Result};

pub const CONFIG_ENV: &str = "SEMANTIC_CONFIG";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const OUTPUT_DIR_ENV: &str = "SEMANTIC_OUTPUT_DIR";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub embedding: EmbeddingConfig,
    pub chat: ChatConfig,
    pub reduction: ReductionConfig,
    pub paths: PathsConfig,
    pub plot: PlotConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    pub max_batch_size: usize,
    pub timeout_secs: u64,
    /// Usually left unset and taken from `OPENAI_API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com".to_string(),
            dimensions: None,
            max_batch_size: 100,
            timeout_secs: 60,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com".to_string(),
            timeout_secs: 60,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReductionConfig {
    pub components: usize,
    pub eigen_order: EigenOrder,
    pub perplexity: f64,
    pub theta: f64,
    pub learning_rate: f64,
    pub max_iterations: usize,
    pub seed: u64,
}

impl Default for ReductionConfig {
    fn default() -> Self {
        let params = NeighborEmbeddingParams::default();
        Self {
            components: 2,
            eigen_order: EigenOrder::default(),
            perplexity: params.perplexity,
            theta: params.theta,
            learning_rate: params.learning_rate,
            max_iterations: params.max_iterations,
            seed: params.seed,
        }
    }
}

impl ReductionConfig {
    pub fn neighbor_params(&self) -> NeighborEmbeddingParams {
        NeighborEmbeddingParams {
            perplexity: self.perplexity,
            theta: self.theta,
            learning_rate: self.learning_rate,
            max_iterations: self.max_iterations,
            seed: self.seed,
            ..NeighborEmbeddingParams::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub documents_dir: PathBuf,
    pub words_dir: PathBuf,
    pub datasets_dir: PathBuf,
    pub output_csv_dir: PathBuf,
    pub output_json_dir: PathBuf,
    pub output_plot_dir: PathBuf,
    pub default_dataset: String,
    /// Pretrained word vectors in GloVe text layout.
    pub word_vectors: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("Datasets/Documents"),
            words_dir: PathBuf::from("Datasets/TXTs"),
            datasets_dir: PathBuf::from("Datasets/CSVs"),
            output_csv_dir: PathBuf::from("Outputs/CSVs"),
            output_json_dir: PathBuf::from("Outputs"),
            output_plot_dir: PathBuf::from("Outputs/Plots"),
            default_dataset: "imdb_1000.csv".to_string(),
            word_vectors: PathBuf::from("Datasets/glove.6B.300d.txt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub interpreter: String,
    pub script: PathBuf,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            script: PathBuf::from("scripts/scatter_plot.py"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub namespace: String,
    pub top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_host: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            top_k: 4,
            index_host: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::not_found(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let text = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loaded analysis config");
        Self::from_yaml_str(&text)
    }

    /// Resolve configuration the way the CLI does: explicit path, then `SEMANTIC_CONFIG`, then
    /// defaults; environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.embedding.api_key = Some(key.clone());
                self.chat.api_key = Some(key);
            }
        }
        if let Ok(dir) = std::env::var(OUTPUT_DIR_ENV) {
            let root = PathBuf::from(dir);
            self.paths.output_csv_dir = root.join("CSVs");
            self.paths.output_plot_dir = root.join("Plots");
            self.paths.output_json_dir = root;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding.max_batch_size == 0 {
            return Err(Error::configuration("embedding.max_batch_size must be at least 1"));
        }
        if self.reduction.components == 0 {
            return Err(Error::configuration("reduction.components must be at least 1"));
        }
        if !(self.reduction.perplexity > 0.0) {
            return Err(Error::configuration("reduction.perplexity must be positive"));
        }
        if self.store.top_k == 0 {
            return Err(Error::configuration("store.top_k must be at least 1"));
        }
        Ok(())
    }

    pub fn with_components(mut self, components: usize) -> Self {
        self.reduction.components = components;
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let root = dir.into();
        self.paths.output_csv_dir = root.join("CSVs");
        self.paths.output_plot_dir = root.join("Plots");
        self.paths.output_json_dir = root;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = AnalysisConfig::from_yaml_str("").unwrap();
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.reduction.components, 2);
        assert_eq!(config.reduction.perplexity, 0.65);
        assert_eq!(config.paths.default_dataset, "imdb_1000.csv");
        assert_eq!(config.chat.model, "gpt-4o");
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
embedding:
  model: text-embedding-3-large
  dimensions: 256
reduction:
  components: 3
  eigen_order: descending_variance
"#;
        let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.embedding.model, "text-embedding-3-large");
        assert_eq!(config.embedding.dimensions, Some(256));
        assert_eq!(config.embedding.max_batch_size, 100);
        assert_eq!(config.reduction.components, 3);
        assert_eq!(config.reduction.eigen_order, EigenOrder::DescendingVariance);
        assert_eq!(config.store.top_k, 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AnalysisConfig::from_yaml_str("reduction:\n  components: 0\n").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        let err = AnalysisConfig::from_yaml_str("reduction:\n  perplexity: -1.0\n").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = AnalysisConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_with_output_dir_rewrites_outputs() {
        let config = AnalysisConfig::default().with_output_dir("/tmp/out");
        assert_eq!(config.paths.output_json_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.paths.output_csv_dir, PathBuf::from("/tmp/out/CSVs"));
    }

    #[test]
    fn test_neighbor_params_follow_config() {
        let mut config = AnalysisConfig::default();
        config.reduction.seed = 7;
        config.reduction.max_iterations = 50;
        let params = config.reduction.neighbor_params();
        assert_eq!(params.seed, 7);
        assert_eq!(params.max_iterations, 50);
    }
}
