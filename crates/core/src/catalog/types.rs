use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Display metadata of one searchable database, as published to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    /// Identifier used in submissions (the `.params` file stem).
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Pre-selected in client UIs.
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub order: i64,
}

/// Contents of a `<id>.params` file.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamsFile {
    pub display: DatabaseEntry,
    /// Pipeline parameters. Opaque to this service.
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read database catalog at {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("Invalid database parameters in {path}: {reason}")]
    InvalidParams { path: PathBuf, reason: String },

    #[error("Unknown database: {0}")]
    UnknownDatabase(String),
}
