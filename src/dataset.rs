//! Dataset resolution: the bundled default leads file or an operator-supplied
//! upload, with loads memoized by source identity.
//!
//! Bundled loads are keyed by path; uploads by a content fingerprint, so a
//! re-render never re-parses the same file and a new upload always produces a
//! fresh cache entry.

use crate::table::Table;
use crate::util::sha256_hex;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadSource {
    Bundled(PathBuf),
    Upload(PathBuf),
}

impl LeadSource {
    /// Suffix distinguishing download artifacts between the two modes.
    pub fn tag(&self) -> &'static str {
        match self {
            LeadSource::Bundled(_) => "default",
            LeadSource::Upload(_) => "uploaded",
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            LeadSource::Bundled(path) | LeadSource::Upload(path) => path,
        }
    }
}

#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<String, Arc<Table>>,
}

impl DatasetCache {
    pub fn new() -> DatasetCache {
        DatasetCache::default()
    }

    /// Load a dataset, reusing the prior parse of the same source.
    pub fn load(&mut self, source: &LeadSource) -> Result<Arc<Table>> {
        let (key, bytes) = match source {
            LeadSource::Bundled(path) => {
                let key = format!("bundled:{}", path.display());
                if let Some(table) = self.entries.get(&key) {
                    tracing::debug!(key = %key, "dataset cache hit");
                    return Ok(Arc::clone(table));
                }
                let bytes = fs::read(path)
                    .with_context(|| format!("read bundled leads {}", path.display()))?;
                (key, bytes)
            }
            LeadSource::Upload(path) => {
                let bytes =
                    fs::read(path).with_context(|| format!("read upload {}", path.display()))?;
                let key = format!("upload:{}", sha256_hex(&bytes));
                if let Some(table) = self.entries.get(&key) {
                    tracing::debug!(key = %key, "dataset cache hit");
                    return Ok(Arc::clone(table));
                }
                (key, bytes)
            }
        };
        let table = Table::from_csv_reader(bytes.as_slice())
            .with_context(|| format!("parse leads CSV {}", source.path().display()))?;
        tracing::info!(
            rows = table.len(),
            source = %source.path().display(),
            "loaded leads dataset"
        );
        let table = Arc::new(table);
        self.entries.insert(key, Arc::clone(&table));
        Ok(table)
    }
}
