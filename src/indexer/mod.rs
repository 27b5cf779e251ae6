//! Index generations: build, atomic publish, retention.
//!
//! A label's generations live at `<indexes_root>/<label>/<unix_timestamp>/`.
//! Each cycle runs the builder inside the label's private staging directory,
//! then publishes its `data/` output with a single `rename(2)` so readers never
//! observe a half-written generation. After a publish only the
//! [`RETAINED_GENERATIONS`] newest generations of the label are kept.

pub mod builder;
pub mod load;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::model::EntityType;

pub use builder::{ExternalBuilder, IndexBuilder};

/// Published generations kept per label.
pub const RETAINED_GENERATIONS: usize = 2;

/// Directory inside the staging dir the builder writes to.
pub const STAGING_OUTPUT: &str = "data";

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("failed to create staging dir {path}: {source}")]
    CreateStaging { path: PathBuf, source: io::Error },

    #[error("failed to clear stale staging output {path}: {source}")]
    ClearStaging { path: PathBuf, source: io::Error },

    #[error("cannot start builder {program}: {source}")]
    BuilderSpawn { program: PathBuf, source: io::Error },

    #[error("builder {program} failed: {status}")]
    BuilderExit { program: PathBuf, status: String },

    #[error("builder left no output at {0}")]
    MissingOutput(PathBuf),

    #[error("failed to publish {from} -> {to}: {source}")]
    Publish {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("retention failed in {path}: {source}")]
    Retention { path: PathBuf, source: io::Error },
}

/// A set of entity types built and published together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Directory name under the indexes root.
    pub name: String,
    pub entities: Vec<EntityType>,
}

impl Label {
    /// Label named after its entity list (`artist,label`).
    pub fn new(entities: Vec<EntityType>) -> Self {
        let name = entity_list(&entities);
        Self { name, entities }
    }

    pub fn named(name: impl Into<String>, entities: Vec<EntityType>) -> Self {
        Self {
            name: name.into(),
            entities,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Comma-joined entity names, the builder's single argument.
pub fn entity_list(entities: &[EntityType]) -> String {
    entities
        .iter()
        .map(|e| e.name())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse `artist,release,...` (whitespace and empty items ignored).
pub fn parse_entity_list(
    list: &str,
) -> Result<Vec<EntityType>, crate::model::types::UnknownEntityType> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// Where published and in-progress generations live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationLayout {
    pub indexes_root: PathBuf,
    pub staging_root: PathBuf,
}

impl GenerationLayout {
    /// Layout with staging in the `in-progress` sibling of `indexes_root`.
    pub fn new(indexes_root: impl Into<PathBuf>) -> Self {
        let indexes_root = indexes_root.into();
        let staging_root = default_staging_root(&indexes_root);
        Self {
            indexes_root,
            staging_root,
        }
    }

    pub fn with_staging_root(mut self, staging_root: impl Into<PathBuf>) -> Self {
        self.staging_root = staging_root.into();
        self
    }

    pub fn label_dir(&self, label: &str) -> PathBuf {
        self.indexes_root.join(label)
    }

    pub fn staging_dir(&self, label: &str) -> PathBuf {
        self.staging_root.join(label)
    }

    pub fn staging_output(&self, label: &str) -> PathBuf {
        self.staging_dir(label).join(STAGING_OUTPUT)
    }

    /// Published generations of `label`, newest first.
    pub fn published(&self, label: &str) -> io::Result<Vec<(i64, PathBuf)>> {
        list_generations(&self.label_dir(label))
    }

    /// Newest published generation of `label`, if any.
    pub fn current(&self, label: &str) -> io::Result<Option<PathBuf>> {
        Ok(self.published(label)?.into_iter().next().map(|(_, p)| p))
    }
}

pub fn default_staging_root(indexes_root: &Path) -> PathBuf {
    match indexes_root.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join("in-progress"),
        _ => indexes_root.join("in-progress"),
    }
}

/// Numeric-named subdirectories of `label_dir`, sorted by timestamp descending.
/// A missing label directory has no generations.
fn list_generations(label_dir: &Path) -> io::Result<Vec<(i64, PathBuf)>> {
    let entries = match std::fs::read_dir(label_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let mut generations = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(ts) = entry
            .file_name()
            .to_str()
            .and_then(|name| name.parse::<i64>().ok())
        {
            generations.push((ts, entry.path()));
        }
    }
    generations.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(generations)
}

/// Delete every generation of `label_dir` beyond the `keep` newest.
/// Returns the removed paths; directories already gone are skipped.
pub fn retain_latest(label_dir: &Path, keep: usize) -> io::Result<Vec<PathBuf>> {
    let mut retired = Vec::new();
    // TODO: hold a per-generation reader lease so a query still reading an
    // old generation cannot have it deleted underneath it.
    for (_, path) in list_generations(label_dir)?.into_iter().skip(keep) {
        match std::fs::remove_dir_all(&path) {
            Ok(()) => {
                info!(path = %path.display(), "generation_retired");
                retired.push(path);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(retired)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Building,
    Publishing,
    Published,
    Failed,
}

/// Outcome of a successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedGeneration {
    pub timestamp: i64,
    pub path: PathBuf,
    pub retired: Vec<PathBuf>,
}

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

/// Drives build → publish → retain cycles for one label.
pub struct GenerationManager<B: IndexBuilder> {
    layout: GenerationLayout,
    label: Label,
    builder: B,
    state: GenerationState,
    clock: Clock,
}

impl<B: IndexBuilder> GenerationManager<B> {
    pub fn new(layout: GenerationLayout, label: Label, builder: B) -> Self {
        Self {
            layout,
            label,
            builder,
            state: GenerationState::Idle,
            clock: Box::new(|| chrono::Utc::now().timestamp()),
        }
    }

    /// Replace the wall clock used to timestamp generations.
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// State reached by the last cycle (`Published` or `Failed`), or `Idle`.
    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn layout(&self) -> &GenerationLayout {
        &self.layout
    }

    /// Run one full cycle. Retention problems are logged, not returned: the
    /// new generation is already published by then.
    pub fn run_cycle(&mut self) -> Result<PublishedGeneration, GenerationError> {
        info!(label = %self.label, entities = %entity_list(&self.label.entities), "cycle_start");

        self.state = GenerationState::Building;
        if let Err(e) = self.build() {
            self.state = GenerationState::Failed;
            return Err(e);
        }

        self.state = GenerationState::Publishing;
        let (timestamp, path) = match self.publish() {
            Ok(published) => published,
            Err(e) => {
                self.state = GenerationState::Failed;
                return Err(e);
            }
        };
        self.state = GenerationState::Published;
        info!(label = %self.label, path = %path.display(), "generation_published");

        let label_dir = self.layout.label_dir(&self.label.name);
        let retired = match retain_latest(&label_dir, RETAINED_GENERATIONS) {
            Ok(retired) => retired,
            Err(source) => {
                let e = GenerationError::Retention {
                    path: label_dir,
                    source,
                };
                warn!(label = %self.label, error = %e, "retention_failed");
                Vec::new()
            }
        };
        Ok(PublishedGeneration {
            timestamp,
            path,
            retired,
        })
    }

    fn build(&self) -> Result<(), GenerationError> {
        let staging = self.layout.staging_dir(&self.label.name);
        std::fs::create_dir_all(&staging).map_err(|source| GenerationError::CreateStaging {
            path: staging.clone(),
            source,
        })?;

        let output = staging.join(STAGING_OUTPUT);
        match std::fs::remove_dir_all(&output) {
            Ok(()) => warn!(path = %output.display(), "cleared_stale_staging_output"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(GenerationError::ClearStaging {
                    path: output,
                    source,
                });
            }
        }

        self.builder.build(&staging, &self.label.entities)
    }

    fn publish(&self) -> Result<(i64, PathBuf), GenerationError> {
        let output = self.layout.staging_output(&self.label.name);
        if !output.is_dir() {
            return Err(GenerationError::MissingOutput(output));
        }
        let label_dir = self.layout.label_dir(&self.label.name);
        std::fs::create_dir_all(&label_dir).map_err(|source| GenerationError::Publish {
            from: output.clone(),
            to: label_dir.clone(),
            source,
        })?;

        // Two cycles within one second must not collide.
        let mut timestamp = (self.clock)();
        let mut dest = label_dir.join(timestamp.to_string());
        while dest.exists() {
            timestamp += 1;
            dest = label_dir.join(timestamp.to_string());
        }

        std::fs::rename(&output, &dest).map_err(|source| GenerationError::Publish {
            from: output,
            to: dest.clone(),
            source,
        })?;
        Ok((timestamp, dest))
    }
}
