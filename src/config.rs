//! Service configuration: TOML file plus environment overrides.
//!
//! Precedence, lowest first: built-in defaults, the file named by `--config`
//! or `MBSEARCH_CONFIG`, the legacy `SEARCH_HOME`/`INDEXES_VERSION` pair,
//! then `MBSEARCH_*` variables. Variables are read through `dotenvy`, so a
//! `.env` file in the working directory counts as environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::daemon::Backoff;
use crate::indexer::{ExternalBuilder, GenerationLayout, Label, parse_entity_list};
use crate::model::EntityType;
use crate::render::RenderOptions;
use crate::search::facade::SearchOptions;
use crate::sync::SyncDaemon;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("label {0} has no entity types")]
    EmptyLabel(String),

    #[error("no labels configured")]
    NoLabels,

    #[error("unknown label {0}")]
    UnknownLabel(String),

    #[error("no index builder configured (set `builder` or MBSEARCH_BUILDER)")]
    NoBuilder,

    #[error("backoff.initial_secs must be >= 1 and <= backoff.max_secs")]
    Backoff,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Published generations live at `<indexes_root>/<label>/<timestamp>/`.
    pub indexes_root: PathBuf,
    /// Defaults to the `in-progress` sibling of `indexes_root`.
    pub staging_root: Option<PathBuf>,
    pub builder: Option<PathBuf>,
    /// Passed to the builder before the entity list.
    pub builder_args: Vec<String>,
    pub log_dir: Option<PathBuf>,
    pub labels: Vec<LabelConfig>,
    pub backoff: BackoffConfig,
    pub sync: SyncConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Directory name; the comma-joined entity list when omitted.
    #[serde(default)]
    pub name: Option<String>,
    pub entities: Vec<EntityType>,
}

impl LabelConfig {
    pub fn label(&self) -> Label {
        match &self.name {
            Some(name) => Label::named(name.clone(), self.entities.clone()),
            None => Label::new(self.entities.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_secs: u64,
    pub max_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_secs: 1,
            max_secs: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: bool,
    pub rsync: PathBuf,
    pub config: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rsync: PathBuf::from("rsync"),
            config: PathBuf::from("/etc/rsyncd.conf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub slow_query_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { slow_query_ms: 1000 }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            indexes_root: default_indexes_root(),
            staging_root: None,
            builder: None,
            builder_args: Vec::new(),
            log_dir: None,
            labels: Vec::new(),
            backoff: BackoffConfig::default(),
            sync: SyncConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

/// Platform data dir (`~/.local/share/mbsearch/indexes` on Linux).
pub fn default_indexes_root() -> PathBuf {
    directories::ProjectDirs::from("org", "musicbrainz", "mbsearch")
        .map(|dirs| dirs.data_dir().join("indexes"))
        .unwrap_or_else(|| PathBuf::from("indexes"))
}

impl ServiceConfig {
    /// Load `path` (or `$MBSEARCH_CONFIG`, or defaults), then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = dotenvy::var("MBSEARCH_CONFIG").ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(home) = dotenvy::var("SEARCH_HOME") {
            let home = PathBuf::from(home);
            self.indexes_root = home.join("data");
            self.staging_root = Some(home.join("data").join("in-progress"));
            self.builder = Some(home.join("bin").join("build-indexes.sh"));
            if let Ok(version) = dotenvy::var("INDEXES_VERSION") {
                let entities = self
                    .labels
                    .first()
                    .map(|l| l.entities.clone())
                    .unwrap_or_else(|| EntityType::ALL.to_vec());
                self.labels = vec![LabelConfig {
                    name: Some(version),
                    entities,
                }];
            }
        }

        if let Ok(root) = dotenvy::var("MBSEARCH_INDEXES_ROOT") {
            self.indexes_root = PathBuf::from(root);
        }
        if let Ok(staging) = dotenvy::var("MBSEARCH_STAGING_ROOT") {
            self.staging_root = Some(PathBuf::from(staging));
        }
        if let Ok(builder) = dotenvy::var("MBSEARCH_BUILDER") {
            self.builder = Some(PathBuf::from(builder));
        }
        if let Ok(dir) = dotenvy::var("MBSEARCH_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(dir));
        }
        if let Ok(val) = dotenvy::var("MBSEARCH_SLOW_QUERY_MS") {
            self.search.slow_query_ms = val.trim().parse().map_err(|e| ConfigError::Env {
                var: "MBSEARCH_SLOW_QUERY_MS",
                reason: format!("{e}"),
            })?;
        }
        if let Ok(val) = dotenvy::var("MBSEARCH_LABELS") {
            self.labels = parse_labels(&val)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for label in &self.labels {
            if label.entities.is_empty() {
                return Err(ConfigError::EmptyLabel(label.label().name));
            }
        }
        if self.backoff.initial_secs == 0 || self.backoff.initial_secs > self.backoff.max_secs {
            return Err(ConfigError::Backoff);
        }
        Ok(())
    }

    pub fn layout(&self) -> GenerationLayout {
        let layout = GenerationLayout::new(&self.indexes_root);
        match &self.staging_root {
            Some(staging) => layout.with_staging_root(staging),
            None => layout,
        }
    }

    pub fn labels(&self) -> Result<Vec<Label>, ConfigError> {
        if self.labels.is_empty() {
            return Err(ConfigError::NoLabels);
        }
        Ok(self.labels.iter().map(LabelConfig::label).collect())
    }

    /// The configured label called `name`.
    pub fn label(&self, name: &str) -> Result<Label, ConfigError> {
        self.labels()?
            .into_iter()
            .find(|l| l.name == name)
            .ok_or_else(|| ConfigError::UnknownLabel(name.to_string()))
    }

    pub fn builder(&self) -> Result<ExternalBuilder, ConfigError> {
        let program = self.builder.as_ref().ok_or(ConfigError::NoBuilder)?;
        Ok(ExternalBuilder::new(program).with_args(self.builder_args.iter().cloned()))
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_secs(self.backoff.initial_secs),
            Duration::from_secs(self.backoff.max_secs),
        )
    }

    pub fn search_options(&self, render: RenderOptions) -> SearchOptions {
        SearchOptions {
            render,
            slow_query: Duration::from_millis(self.search.slow_query_ms),
        }
    }

    pub fn sync_daemon(&self) -> Option<SyncDaemon> {
        self.sync
            .enabled
            .then(|| SyncDaemon::new(&self.sync.rsync, &self.sync.config))
    }
}

/// `name=artist,label;release` (the `name=` part is optional).
fn parse_labels(value: &str) -> Result<Vec<LabelConfig>, ConfigError> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|item| {
            let (name, list) = match item.split_once('=') {
                Some((name, list)) => (Some(name.trim().to_string()), list),
                None => (None, item),
            };
            let entities = parse_entity_list(list).map_err(|e| ConfigError::Env {
                var: "MBSEARCH_LABELS",
                reason: e.to_string(),
            })?;
            Ok(LabelConfig { name, entities })
        })
        .collect()
}
