//! Job descriptors: one compiled SQL transformation awaiting estimation.

use serde::{Deserialize, Serialize};

use crate::signal::TableRef;

/// A parsed upstream dependency. Source references point at physical tables
/// (the heuristic estimator sizes those); model references point at other
/// jobs and carry no table of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DependencyRef {
    Source { schema: String, table: String },
    Model { name: String },
}

impl DependencyRef {
    /// Parse a manifest node id: `source.<project>.<schema>.<table>` or
    /// `model.<project>.<name>`. Other node kinds (tests, seeds, macros)
    /// yield `None` and are dropped.
    pub fn parse(node_id: &str) -> Option<Self> {
        let parts: Vec<&str> = node_id.split('.').collect();
        match parts.as_slice() {
            ["source", _, schema, table, ..] => Some(DependencyRef::Source {
                schema: schema.to_uppercase(),
                table: table.to_uppercase(),
            }),
            ["model", _, rest @ ..] if !rest.is_empty() => Some(DependencyRef::Model {
                // Some projects nest package names in the id; the job name is
                // always the last segment.
                name: rest[rest.len() - 1].to_string(),
            }),
            _ => None,
        }
    }
}

/// One transformation job, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Manifest node id, unique across the project.
    pub unique_id: String,
    /// Short job name (the unit users select and configure by).
    pub name: String,
    /// Target database for the job's output and its source lookups.
    pub database: String,
    /// Target schema.
    pub schema: String,
    /// Relation alias, when it differs from the name.
    pub alias: Option<String>,
    /// Compiled SQL. `None` for malformed manifest entries; estimated as empty.
    pub sql: Option<String>,
    /// Parsed upstream references.
    pub depends_on: Vec<DependencyRef>,
    /// Per-job opt-out carried in the manifest.
    pub skip: bool,
}

impl JobDescriptor {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            unique_id: format!("model.local.{name}"),
            name,
            database: String::new(),
            schema: String::new(),
            alias: None,
            sql: Some(sql.into()),
            depends_on: Vec::new(),
            skip: false,
        }
    }

    /// The SQL to analyze; missing SQL reads as an empty query.
    pub fn sql_text(&self) -> &str {
        self.sql.as_deref().unwrap_or("")
    }

    /// Physical tables this job reads, qualified with the job's database.
    /// Model dependencies are intermediate results and are not counted.
    pub fn source_refs(&self) -> Vec<TableRef> {
        self.depends_on
            .iter()
            .filter_map(|dep| match dep {
                DependencyRef::Source { schema, table } => {
                    Some(TableRef::new(&self.database, schema, table))
                }
                DependencyRef::Model { .. } => None,
            })
            .collect()
    }
}
