//! Index builder invocation.
//!
//! The builder runs with the label's staging directory as its working
//! directory and receives one comma-separated argument naming the entity
//! types to build. It must write one backend index per entity under
//! `./data/<entity>/` and exit 0.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use tracing::{info, warn};

use crate::model::EntityType;

use super::{GenerationError, entity_list};

/// Produces a generation's indexes inside `staging`.
pub trait IndexBuilder: Send + Sync {
    fn build(&self, staging: &Path, entities: &[EntityType]) -> Result<(), GenerationError>;
}

impl<F> IndexBuilder for F
where
    F: Fn(&Path, &[EntityType]) -> Result<(), GenerationError> + Send + Sync,
{
    fn build(&self, staging: &Path, entities: &[EntityType]) -> Result<(), GenerationError> {
        self(staging, entities)
    }
}

/// Runs an external executable, synchronously.
#[derive(Debug, Clone)]
pub struct ExternalBuilder {
    program: PathBuf,
    /// Arguments placed before the entity list.
    leading_args: Vec<String>,
}

impl ExternalBuilder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl IndexBuilder for ExternalBuilder {
    fn build(&self, staging: &Path, entities: &[EntityType]) -> Result<(), GenerationError> {
        let start = Instant::now();
        let list = entity_list(entities);
        info!(program = %self.program.display(), entities = %list, "builder_start");

        let status = Command::new(&self.program)
            .args(&self.leading_args)
            .arg(&list)
            .current_dir(staging)
            .status()
            .map_err(|source| GenerationError::BuilderSpawn {
                program: self.program.clone(),
                source,
            })?;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if !status.success() {
            warn!(program = %self.program.display(), %status, elapsed_ms, "builder_failed");
            return Err(GenerationError::BuilderExit {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        info!(program = %self.program.display(), elapsed_ms, "builder_done");
        Ok(())
    }
}
