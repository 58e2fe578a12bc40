//! Catalog of searchable databases.
//!
//! Every `<id>.params` file in the databases directory describes one target
//! collection. The catalog is loaded once at startup; it drives the
//! `/databases` listing and validates database selections on submission.

mod types;

pub use types::*;

use std::fs;
use std::path::Path;

use tracing::debug;

/// Loaded database catalog, sorted by display order.
#[derive(Debug, Clone, Default)]
pub struct DatabaseCatalog {
    entries: Vec<DatabaseEntry>,
}

impl DatabaseCatalog {
    pub fn new(mut entries: Vec<DatabaseEntry>) -> Self {
        entries.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        Self { entries }
    }

    /// Load every `*.params` file in `dir`.
    ///
    /// Any unreadable or malformed file fails the whole load.
    pub fn load(dir: &Path) -> Result<Self, CatalogError> {
        let read_dir = fs::read_dir(dir).map_err(|e| CatalogError::Io {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut entries = Vec::new();
        for item in read_dir {
            let item = item.map_err(|e| CatalogError::Io {
                path: dir.to_path_buf(),
                reason: e.to_string(),
            })?;
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("params") {
                continue;
            }
            entries.push(load_params_file(&path)?);
        }

        debug!(dir = %dir.display(), count = entries.len(), "Loaded database catalog");
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[DatabaseEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    /// Fails with [`CatalogError::UnknownDatabase`] on the first id not in
    /// the catalog.
    pub fn check_selection(&self, ids: &[String]) -> Result<(), CatalogError> {
        match ids.iter().find(|id| !self.contains(id)) {
            Some(unknown) => Err(CatalogError::UnknownDatabase(unknown.clone())),
            None => Ok(()),
        }
    }
}

fn load_params_file(path: &Path) -> Result<DatabaseEntry, CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidParams {
        path: path.to_path_buf(),
        reason,
    };

    let id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| invalid("file name is not valid UTF-8".to_string()))?
        .to_string();

    let contents = fs::read_to_string(path).map_err(|e| CatalogError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let params: ParamsFile = serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?;
    if params.display.name.trim().is_empty() {
        return Err(invalid("display.name must not be empty".to_string()));
    }

    Ok(DatabaseEntry {
        id,
        ..params.display
    })
}
