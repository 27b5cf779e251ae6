//! Reference index builder: JSON-lines exports to one index per entity.
//!
//! `mbsearch load --source DIR <entities>` reads `DIR/<entity>.jsonl` and
//! writes `./data/<entity>/`, so it can be configured as the generation
//! builder directly.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::model::EntityType;
use crate::search::descriptor::descriptor;
use crate::search::tantivy::GenerationWriter;

/// Outcome of loading one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub entity: EntityType,
    pub documents: u64,
    /// Lines that were blank, not JSON, or not an object.
    pub skipped: u64,
}

/// Flatten one exported record into field -> values.
///
/// Scalars become single values; arrays of scalars keep their order; nulls
/// and nested objects are dropped.
pub fn record_from_json(value: &Value) -> Option<BTreeMap<String, Vec<String>>> {
    let object = value.as_object()?;
    let mut record = BTreeMap::new();
    for (key, value) in object {
        let values: Vec<String> = match value {
            Value::Array(items) => items.iter().filter_map(scalar).collect(),
            other => scalar(other).into_iter().collect(),
        };
        if !values.is_empty() {
            record.insert(key.clone(), values);
        }
    }
    Some(record)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Build `output/<entity>/` for every entity from `source/<entity>.jsonl`.
///
/// A missing export file fails the whole load, which fails the cycle that
/// invoked it.
pub fn load_generation(source: &Path, output: &Path, entities: &[EntityType]) -> Result<Vec<LoadReport>> {
    if entities.is_empty() {
        bail!("no entity types to load");
    }
    let mut reports = Vec::with_capacity(entities.len());
    for &entity in entities {
        reports.push(load_entity(source, output, entity)?);
    }
    Ok(reports)
}

fn load_entity(source: &Path, output: &Path, entity: EntityType) -> Result<LoadReport> {
    let start = Instant::now();
    let input = source.join(format!("{}.jsonl", entity.name()));
    let file = File::open(&input).with_context(|| format!("opening {}", input.display()))?;
    let mut writer = GenerationWriter::create(&output.join(entity.name()), descriptor(entity))?;

    let mut skipped = 0u64;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", input.display()))?;
        if line.trim().is_empty() {
            skipped += 1;
            continue;
        }
        let record = match serde_json::from_str::<Value>(&line) {
            Ok(value) => record_from_json(&value),
            Err(err) => {
                debug!(file = %input.display(), line = line_no + 1, error = %err, "skipping malformed line");
                None
            }
        };
        match record {
            Some(record) => writer.add_record(&record)?,
            None => skipped += 1,
        }
    }

    let documents = writer.commit()?;
    if skipped > 0 {
        warn!(entity = %entity, skipped, "skipped unusable export lines");
    }
    info!(
        entity = %entity,
        documents,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "entity_loaded"
    );
    Ok(LoadReport {
        entity,
        documents,
        skipped,
    })
}
