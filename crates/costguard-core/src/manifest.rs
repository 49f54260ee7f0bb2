//! Compiled-manifest ingestion.
//!
//! The transformation tool writes a JSON manifest describing every compiled
//! node; estimation reads that file and never talks to the tool itself. Only
//! `model` nodes become jobs; tests, seeds and the rest are skipped here.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::job::{DependencyRef, JobDescriptor};

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    nodes: HashMap<String, RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(default)]
    resource_type: String,
    name: String,
    #[serde(default)]
    database: String,
    #[serde(default)]
    schema: String,
    #[serde(default)]
    alias: Option<String>,
    /// Compiled SQL when the compiler ran; falls back to the raw template.
    #[serde(default)]
    compiled_sql: Option<String>,
    #[serde(default)]
    raw_sql: Option<String>,
    #[serde(default)]
    config: RawNodeConfig,
    #[serde(default)]
    depends_on: RawDeps,
}

#[derive(Debug, Default, Deserialize)]
struct RawNodeConfig {
    #[serde(default)]
    meta: RawMeta,
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    #[serde(default)]
    costguard_skip: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RawDeps {
    #[serde(default)]
    nodes: Vec<String>,
}

/// Parse a manifest document into job descriptors, sorted by name so batch
/// reports are stable across runs.
pub fn jobs_from_manifest_str(json: &str) -> Result<Vec<JobDescriptor>> {
    let raw: RawManifest =
        serde_json::from_str(json).map_err(|e| Error::Manifest(format!("bad manifest: {e}")))?;

    let mut jobs: Vec<JobDescriptor> = raw
        .nodes
        .into_iter()
        .filter(|(_, node)| node.resource_type == "model")
        .map(|(unique_id, node)| JobDescriptor {
            unique_id,
            name: node.name,
            database: node.database,
            schema: node.schema,
            alias: node.alias,
            sql: node.compiled_sql.or(node.raw_sql),
            depends_on: node
                .depends_on
                .nodes
                .iter()
                .filter_map(|id| DependencyRef::parse(id))
                .collect(),
            skip: node.config.meta.costguard_skip,
        })
        .collect();
    jobs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(jobs)
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> Result<Vec<JobDescriptor>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Manifest(format!("cannot read {}: {e}", path.display())))?;
    jobs_from_manifest_str(&text)
}
