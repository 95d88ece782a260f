//! Configuration types for docbench.
//!
//! [`Config::load`] layers, lowest first: the embedded defaults, an optional
//! TOML file, then `DOCBENCH__<SECTION>__<KEY>` environment variables.
//! [`Config::defaults`] returns the embedded defaults without touching the
//! filesystem or the environment (useful in tests).
//!
//! Loaded values are validated, never clamped.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{unit_interval, ConfigError};
use crate::runner::{IndexOptions, RunnerConfig, TimingSource};
use crate::stats::RunMetadata;
use crate::terms::{default_phrase_counts, Skew};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[generate]
num_docs         = 10000
seed             = 42
vocab_size       = 200
phrase_counts    = []
term_doc_ratio   = 1.0
overwrite_chance = 0.0
skew             = "zipf"
zipf_exponent    = 1.0

[index]
batch_size    = 500
track_commits = true
label         = "index"

[search]
rep_n             = 5
ignore_n          = 1
timing            = "engine"
include_match_all = true
label             = "search"

[metadata]
"#;

const ENV_PREFIX: &str = "DOCBENCH";
const ENV_SEPARATOR: &str = "__";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub generate: GenerateConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
}

/// Skew curve over search-term rank, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkewKind {
    Uniform,
    Zipf,
    LongTail,
}

/// `[generate]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateConfig {
    #[serde(default = "default_num_docs")]
    pub num_docs: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_vocab_size")]
    pub vocab_size: usize,
    /// Phrases per length, starting at two words. Empty means derived from
    /// `vocab_size`.
    #[serde(default)]
    pub phrase_counts: Vec<usize>,
    #[serde(default = "default_term_doc_ratio")]
    pub term_doc_ratio: f64,
    #[serde(default)]
    pub overwrite_chance: f64,
    #[serde(default = "default_skew")]
    pub skew: SkewKind,
    #[serde(default = "default_zipf_exponent")]
    pub zipf_exponent: f64,
}

fn default_num_docs() -> usize { 10_000 }
fn default_seed() -> u64 { 42 }
fn default_vocab_size() -> usize { 200 }
fn default_term_doc_ratio() -> f64 { 1.0 }
fn default_skew() -> SkewKind { SkewKind::Zipf }
fn default_zipf_exponent() -> f64 { 1.0 }

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            num_docs: default_num_docs(),
            seed: default_seed(),
            vocab_size: default_vocab_size(),
            phrase_counts: Vec::new(),
            term_doc_ratio: default_term_doc_ratio(),
            overwrite_chance: 0.0,
            skew: default_skew(),
            zipf_exponent: default_zipf_exponent(),
        }
    }
}

impl GenerateConfig {
    /// The configured curve for a search-term vocabulary of `n` items.
    pub fn skew(&self, n: usize) -> Skew {
        match self.skew {
            SkewKind::Uniform => Skew::Uniform,
            SkewKind::Zipf => Skew::Zipf { exponent: self.zipf_exponent },
            SkewKind::LongTail => Skew::long_tail(n),
        }
    }

    pub fn phrase_counts(&self) -> Vec<usize> {
        if self.phrase_counts.is_empty() {
            default_phrase_counts(self.vocab_size)
        } else {
            self.phrase_counts.clone()
        }
    }
}

/// `[index]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_true")]
    pub track_commits: bool,
    #[serde(default = "default_index_label")]
    pub label: String,
}

fn default_batch_size() -> usize { 500 }
fn default_true() -> bool { true }
fn default_index_label() -> String { "index".to_string() }

impl Default for IndexConfig {
    fn default() -> Self {
        Self { batch_size: default_batch_size(), track_commits: true, label: default_index_label() }
    }
}

impl IndexConfig {
    pub fn options(&self) -> IndexOptions {
        IndexOptions { batch_size: self.batch_size, track_commits: self.track_commits, label: self.label.clone() }
    }
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_rep_n")]
    pub rep_n: usize,
    #[serde(default = "default_ignore_n")]
    pub ignore_n: usize,
    #[serde(default)]
    pub timing: TimingSource,
    #[serde(default = "default_true")]
    pub include_match_all: bool,
    #[serde(default = "default_search_label")]
    pub label: String,
}

fn default_rep_n() -> usize { 5 }
fn default_ignore_n() -> usize { 1 }
fn default_search_label() -> String { "search".to_string() }

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rep_n: default_rep_n(),
            ignore_n: default_ignore_n(),
            timing: TimingSource::default(),
            include_match_all: true,
            label: default_search_label(),
        }
    }
}

/// `[metadata]` section. Every key is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataConfig {
    pub engine_version: Option<String>,
    pub engine_caches: Option<String>,
    pub engine_config: Option<String>,
    pub engine_schema: Option<String>,
    pub os: Option<String>,
    pub os_memory: Option<String>,
    pub jvm_memory: Option<String>,
    pub jvm_settings: Option<String>,
    pub collection_size: Option<String>,
    pub notes: Option<String>,
}

impl MetadataConfig {
    pub fn to_metadata(&self, test_id: impl Into<String>) -> RunMetadata {
        RunMetadata {
            test_id: test_id.into(),
            derived_from: None,
            engine_version: self.engine_version.clone(),
            engine_caches: self.engine_caches.clone(),
            engine_config: self.engine_config.clone(),
            engine_schema: self.engine_schema.clone(),
            os: self.os.clone(),
            os_memory: self.os_memory.clone(),
            jvm_memory: self.jvm_memory.clone(),
            jvm_settings: self.jvm_settings.clone(),
            collection_size: self.collection_size.clone(),
            notes: self.notes.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load `path` (or the default location, if present) and the process
    /// environment on top of the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true);
        Self::from_sources(path, env)
    }

    /// [`Config::load`] with an explicit environment source.
    pub fn from_sources(path: Option<&Path>, env: config::Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::from(default_path().as_path()).required(false),
        };

        let cfg: Config = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()?;
        cfg.validate()?;
        tracing::debug!(num_docs = cfg.generate.num_docs, seed = cfg.generate.seed, "config loaded");
        Ok(cfg)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.generate;
        if g.num_docs == 0 {
            return Err(ConfigError::Zero("generate.num_docs"));
        }
        if g.vocab_size == 0 {
            return Err(ConfigError::Zero("generate.vocab_size"));
        }
        if !g.term_doc_ratio.is_finite() || g.term_doc_ratio <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "generate.term_doc_ratio must be positive, got {}",
                g.term_doc_ratio
            )));
        }
        unit_interval("generate.overwrite_chance", g.overwrite_chance)?;
        if g.skew == SkewKind::Zipf && (!g.zipf_exponent.is_finite() || g.zipf_exponent < 0.0) {
            return Err(ConfigError::Skew(format!("zipf exponent {} is not a finite non-negative number", g.zipf_exponent)));
        }

        if self.index.batch_size == 0 {
            return Err(ConfigError::Zero("index.batch_size"));
        }
        if self.search.rep_n == 0 {
            return Err(ConfigError::Zero("search.rep_n"));
        }
        if self.search.ignore_n >= self.search.rep_n {
            return Err(ConfigError::IgnoreNotBelowReps { rep_n: self.search.rep_n, ignore_n: self.search.ignore_n });
        }
        Ok(())
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig { timing: self.search.timing }
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// `$XDG_CONFIG_HOME/docbench/config.toml`, falling back to `~/.config`.
pub fn default_path() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string())).join(".config")
        })
        .join("docbench")
        .join("config.toml")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
