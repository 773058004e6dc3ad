// src/config/curation.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::RunParams;
use crate::ingest::types::Source;

const ENV_PATH: &str = "CURATE_CONFIG_PATH";
const ENV_LOOKBACK: &str = "CURATE_LOOKBACK_HOURS";
const ENV_THRESHOLD: &str = "CURATE_SIMILARITY_THRESHOLD";

fn default_lookback_hours() -> u64 {
    crate::filter::DEFAULT_LOOKBACK_HOURS
}
fn default_similarity_threshold() -> f64 {
    crate::topics::DEFAULT_SIMILARITY_THRESHOLD
}
fn default_max_concurrency() -> usize {
    crate::engine::DEFAULT_MAX_CONCURRENCY
}
fn default_fast_timeout_secs() -> u64 {
    crate::ingest::fetcher::DEFAULT_FAST_TIMEOUT.as_secs()
}
fn default_fallback_timeout_secs() -> u64 {
    crate::ingest::fetcher::DEFAULT_FALLBACK_TIMEOUT.as_secs()
}
fn default_fallback_limit() -> usize {
    crate::ingest::fetcher::DEFAULT_FALLBACK_LIMIT
}
fn default_resolve_timeout_secs() -> u64 {
    crate::engine::DEFAULT_RESOLVE_TIMEOUT.as_secs()
}
fn default_true() -> bool {
    true
}
fn default_ytdlp_path() -> String {
    "yt-dlp".to_string()
}
fn default_state_dir() -> PathBuf {
    PathBuf::from("state")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationConfig {
    pub sources: Vec<Source>,
    /// Words too broad to mark a topic (e.g. the channels' shared beat).
    #[serde(default)]
    pub generic_terms: Vec<String>,
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u64,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_fast_timeout_secs")]
    pub fast_timeout_secs: u64,
    #[serde(default = "default_fallback_timeout_secs")]
    pub fallback_timeout_secs: u64,
    #[serde(default = "default_fallback_limit")]
    pub fallback_limit: usize,
    #[serde(default = "default_resolve_timeout_secs")]
    pub resolve_timeout_secs: u64,
    #[serde(default = "default_true")]
    pub cluster: bool,
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: String,
    /// Channel cache, seen store, snapshots and metrics textfile live here.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

impl CurationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("config has no sources");
        }
        let mut names = HashSet::new();
        for (i, s) in self.sources.iter().enumerate() {
            if s.name.trim().is_empty() {
                bail!("source #{i} has an empty name");
            }
            if s.url.trim().is_empty() {
                bail!("source `{}` has an empty url", s.name);
            }
            if !names.insert(s.name.trim()) {
                bail!("duplicate source name `{}`", s.name);
            }
        }
        if self.max_concurrency == 0 {
            bail!("max_concurrency must be at least 1");
        }
        if !self.similarity_threshold.is_finite() {
            bail!("similarity_threshold must be a finite number");
        }
        Ok(())
    }

    /// Apply `CURATE_*` env overrides. Unparseable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var(ENV_LOOKBACK) {
            match v.trim().parse::<u64>() {
                Ok(h) => self.lookback_hours = h,
                Err(_) => tracing::warn!(var = ENV_LOOKBACK, value = %v, "ignoring unparseable override"),
            }
        }
        if let Ok(v) = std::env::var(ENV_THRESHOLD) {
            match v.trim().parse::<f64>() {
                Ok(t) if t.is_finite() => self.similarity_threshold = t,
                _ => tracing::warn!(var = ENV_THRESHOLD, value = %v, "ignoring unparseable override"),
            }
        }
        self.similarity_threshold = self.similarity_threshold.clamp(0.0, 1.0);
    }

    pub fn run_params(&self) -> RunParams {
        RunParams {
            lookback_hours: self.lookback_hours,
            similarity_threshold: self.similarity_threshold,
            max_concurrency: self.max_concurrency,
            cluster: self.cluster,
            generic_terms: self.generic_terms.clone(),
            resolve_timeout: self.resolve_timeout(),
        }
    }

    pub fn fast_timeout(&self) -> Duration {
        Duration::from_secs(self.fast_timeout_secs.max(1))
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs.max(1))
    }

    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_secs(self.fallback_timeout_secs.max(1))
    }

    pub fn channel_cache_path(&self) -> PathBuf {
        self.state_dir.join("channel_ids.json")
    }

    pub fn seen_store_path(&self) -> PathBuf {
        self.state_dir.join("seen.json")
    }

    pub fn snapshot_dir(&self) -> PathBuf {
        self.state_dir.join("snapshots")
    }

    pub fn metrics_textfile_path(&self) -> PathBuf {
        self.state_dir.join("curate.prom")
    }
}

/// Load, apply env overrides and validate. Supports TOML or JSON.
pub fn load_from(path: &Path) -> Result<CurationConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading curation config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let mut cfg = parse_config(&content, ext.as_str())
        .with_context(|| format!("parsing {}", path.display()))?;
    cfg.apply_env_overrides();
    cfg.validate()
        .with_context(|| format!("validating {}", path.display()))?;
    Ok(cfg)
}

/// Load config using env var + fallbacks:
/// 1) $CURATE_CONFIG_PATH
/// 2) config/curation.toml
/// 3) config/curation.json
pub fn load_default() -> Result<CurationConfig> {
    if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        }
        return Err(anyhow!("{ENV_PATH} points to non-existent path {}", pb.display()));
    }
    let toml_p = PathBuf::from("config/curation.toml");
    if toml_p.exists() {
        return load_from(&toml_p);
    }
    let json_p = PathBuf::from("config/curation.json");
    if json_p.exists() {
        return load_from(&json_p);
    }
    Err(anyhow!(
        "no curation config: set {ENV_PATH} or create config/curation.toml"
    ))
}

fn parse_config(s: &str, hint_ext: &str) -> Result<CurationConfig> {
    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    if hint_ext == "toml" {
        return Ok(toml::from_str(s)?);
    }
    // Unknown extension: JSON if it looks like an object, else TOML.
    if s.trim_start().starts_with('{') {
        Ok(serde_json::from_str(s)?)
    } else {
        Ok(toml::from_str(s)?)
    }
}
