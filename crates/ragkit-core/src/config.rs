use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "ragkit.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RagkitConfig {
    #[serde(default)]
    pub lexical: LexicalConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub context: ContextConfig,
}

/// BM25 constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalConfig {
    /// Term-frequency saturation.
    #[serde(default = "default_k1")]
    pub k1: f64,
    /// Document-length normalization, in `[0, 1]`.
    #[serde(default = "default_b")]
    pub b: f64,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            k1: default_k1(),
            b: default_b(),
        }
    }
}

/// Which fusion strategy hybrid retrieval uses by default.
///
/// Spelled `weighted` / `reciprocal_rank`, the same names fusion results use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStrategy {
    /// Min-max normalize, then interpolate with `alpha`.
    Weighted,
    /// Sum of `1 / (rrf_k + rank)`.
    #[default]
    ReciprocalRank,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub strategy: FusionStrategy,
    /// Weight of the semantic signal for weighted fusion.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_rrf_k")]
    pub rrf_k: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            strategy: FusionStrategy::default(),
            alpha: default_alpha(),
            rrf_k: default_rrf_k(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Context window size in (approximate) tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
        }
    }
}

impl RagkitConfig {
    /// Reject parameter values the scorers cannot use.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.lexical.k1.is_finite() || self.lexical.k1 < 0.0 {
            bail!("lexical.k1 must be a non-negative number, got {}", self.lexical.k1);
        }
        if !(0.0..=1.0).contains(&self.lexical.b) {
            bail!("lexical.b must be within [0, 1], got {}", self.lexical.b);
        }
        if !(0.0..=1.0).contains(&self.fusion.alpha) {
            bail!("fusion.alpha must be within [0, 1], got {}", self.fusion.alpha);
        }
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be at least 1");
        }
        Ok(())
    }
}

/// Parse and validate a config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or holds
/// out-of-range values.
pub fn load_config_file(path: &Path) -> Result<RagkitConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let config = toml::from_str::<RagkitConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(config)
}

/// Path of the per-user config file, if the platform has a config dir.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ragkit/config.toml"))
}

/// Resolve the effective configuration.
///
/// Precedence: `explicit` path, then `ragkit.toml` in `project_root`, then the
/// per-user config file, then built-in defaults. An explicit path that does not
/// exist is an error; the other locations are optional.
///
/// # Errors
///
/// Returns an error if the chosen file is missing (explicit only), unreadable,
/// malformed, or invalid.
pub fn load_config(explicit: Option<&Path>, project_root: &Path) -> Result<RagkitConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            bail!("config file {} does not exist", path.display());
        }
        debug!("loading config from {}", path.display());
        return load_config_file(path);
    }

    let project = project_root.join(PROJECT_CONFIG_FILE);
    if project.exists() {
        debug!("loading project config from {}", project.display());
        return load_config_file(&project);
    }

    if let Some(user) = user_config_path().filter(|p| p.exists()) {
        debug!("loading user config from {}", user.display());
        return load_config_file(&user);
    }

    debug!("no config file found; using defaults");
    Ok(RagkitConfig::default())
}

const fn default_k1() -> f64 {
    1.5
}

const fn default_b() -> f64 {
    0.75
}

const fn default_alpha() -> f64 {
    0.5
}

const fn default_rrf_k() -> usize {
    60
}

const fn default_top_k() -> usize {
    3
}

const fn default_max_tokens() -> usize {
    8000
}
