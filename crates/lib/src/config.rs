//! # Pipeline Configuration
//!
//! This module defines the configuration structure of the refinement pipeline and
//! the logic for loading it in layers:
//! 1. Programmatic defaults (`PipelineConfig::default()`).
//! 2. An optional YAML file, with `${VAR}` placeholders substituted from the environment.
//! 3. `KBREFINE_`-prefixed environment variables, using `__` for nesting
//!    (e.g. `KBREFINE_QUALITY__THRESHOLDS__OVERALL=8.0`).
//!
//! Quality weights, thresholds and the retry budget are policy, so all of them
//! can be overridden here rather than being fixed in the stage logic.

use crate::constants::{API_KEY_ENV, DEFAULT_CONFIG_FILE, ENV_PREFIX, ENV_SEPARATOR};
use crate::errors::ConfigError;
use crate::providers::ai::GenerationParams;
use crate::types::SourceDomain;
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::time::Duration;
use tracing::info;

/// Which backend serves generation calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Openai,
    Gemini,
    Local,
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::Openai),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "local" => Ok(ProviderKind::Local),
            other => Err(ConfigError::Invalid(format!("unsupported provider '{other}'"))),
        }
    }
}

impl ProviderKind {
    /// The model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Openai => "gpt-4o",
            ProviderKind::Gemini => "gemini-2.0-flash",
            ProviderKind::Local => "local-model",
        }
    }
}

/// Connection settings for the generation backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// The API URL. Optional for providers where it can be derived from the model name.
    #[serde(default)]
    pub api_url: Option<String>,
    /// Usually supplied through `${AI_API_KEY}` substitution or the environment.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Openai,
            api_url: None,
            api_key: None,
            model_name: ProviderKind::Openai.default_model().to_string(),
        }
    }
}

/// Sampling settings for one kind of stage call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl StageParams {
    const fn new(temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            max_output_tokens,
        }
    }

    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Deadline applied to every generation call.
    pub timeout_secs: u64,
    /// Upper bound on generate/evaluate cycles per run.
    pub max_iterations: u32,
    pub intent: StageParams,
    pub synthesis: StageParams,
    pub writer: StageParams,
    pub review: StageParams,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            max_iterations: 3,
            intent: StageParams::new(0.3, 2000),
            synthesis: StageParams::new(0.3, 3000),
            writer: StageParams::new(0.3, 2000),
            review: StageParams::new(0.3, 1000),
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchConfig {
    pub sources: Vec<SourceDomain>,
    /// Maximum lookups in flight at once.
    pub lookup_concurrency: usize,
    /// Minimum spacing between lookup starts.
    pub lookup_interval_ms: u64,
    pub lookup_timeout_secs: u64,
    pub max_queries: usize,
    pub max_hits_in_prompt: usize,
    /// Hits with fewer normalized words than this are discarded.
    pub min_hit_words: usize,
    /// Whether to combine the title with the architecture phrase catalog.
    pub use_pattern_catalog: bool,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                SourceDomain::new("documentation", "docs.githedgehog.com"),
                SourceDomain::new("blog", "githedgehog.com/blog"),
                SourceDomain::new("code", "github.com/githedgehog"),
            ],
            lookup_concurrency: 4,
            lookup_interval_ms: 250,
            lookup_timeout_secs: 10,
            max_queries: 48,
            max_hits_in_prompt: 40,
            min_hit_words: 6,
            use_pattern_catalog: true,
        }
    }
}

impl ResearchConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn lookup_interval(&self) -> Duration {
        Duration::from_millis(self.lookup_interval_ms)
    }
}

/// Fixed linear weights of the four gated dimensions. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub technical_accuracy: f64,
    pub educational_value: f64,
    pub seo_optimization: f64,
    pub content_structure: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            technical_accuracy: 0.35,
            educational_value: 0.25,
            seo_optimization: 0.20,
            content_structure: 0.20,
        }
    }
}

impl QualityWeights {
    pub fn sum(&self) -> f64 {
        self.technical_accuracy + self.educational_value + self.seo_optimization + self.content_structure
    }
}

/// Minimum scores required for a verdict to pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub technical_accuracy: f64,
    pub educational_value: f64,
    pub seo_optimization: f64,
    pub content_structure: f64,
    pub overall: f64,
    /// Advisory only: below this, missed-opportunity notes are added to feedback.
    pub product_integration: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            technical_accuracy: 8.0,
            educational_value: 7.0,
            seo_optimization: 7.0,
            content_structure: 8.0,
            overall: 7.5,
            product_integration: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    pub weights: QualityWeights,
    pub thresholds: QualityThresholds,
    pub subtitle_min_words: usize,
    pub subtitle_max_words: usize,
    pub max_paragraphs: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            weights: QualityWeights::default(),
            thresholds: QualityThresholds::default(),
            subtitle_min_words: 40,
            subtitle_max_words: 85,
            max_paragraphs: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of entries refined at the same time.
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { concurrency: 2 }
    }
}

/// The root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub research: ResearchConfig,
    #[serde(default)]
    pub quality: QualityConfig,
    #[serde(default)]
    pub batch: BatchConfig,
}

impl PipelineConfig {
    /// Rejects settings the pipeline cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.quality.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid(format!(
                "quality weights must sum to 1.0, got {sum}"
            )));
        }
        if self.generation.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "generation.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.research.lookup_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "research.lookup_concurrency must be at least 1".to_string(),
            ));
        }
        if self.batch.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "batch.concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// Reads a file and substitutes `${VAR}` placeholders from the environment.
// Returns Ok(None) if the file does not exist.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_string(),
        source,
    })?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(e.to_string()))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the pipeline configuration from defaults, an optional YAML file and the environment.
///
/// When `path` is `None`, `kbrefine.yml` in the working directory is used if it exists.
/// An explicitly supplied path that does not exist is an error.
pub fn load_config(path: Option<&str>) -> Result<PipelineConfig, ConfigError> {
    dotenvy::dotenv().ok();

    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults.
        .add_source(ConfigBuilder::try_from(&PipelineConfig::default())?);

    // Layer 2: YAML file.
    let file_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match read_and_substitute(file_path)? {
        Some(content) => {
            info!(path = %file_path, "Loading pipeline configuration file");
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
        None if path.is_some() => {
            return Err(ConfigError::General(format!(
                "Config file not found at '{file_path}'"
            )));
        }
        None => {}
    }

    // Layer 3: Prefixed environment overrides.
    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true)
                .separator(ENV_SEPARATOR),
        )
        .build()?;

    let mut config: PipelineConfig = settings.try_deserialize()?;

    // The API key is commonly provided without the prefix.
    if config.provider.api_key.as_deref().map_or(true, str::is_empty) {
        if let Ok(key) = env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.provider.api_key = Some(key);
            }
        }
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.generation.max_iterations, 3);
        assert_eq!(config.quality.thresholds.overall, 7.5);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let mut config = PipelineConfig::default();
        config.quality.weights.technical_accuracy = 0.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn provider_kind_parses_aliases() {
        assert_eq!("google".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::Openai);
        assert!("anthropic-direct".parse::<ProviderKind>().is_err());
    }
}
