//! Source-to-destination key table threaded through every sync stage.
//!
//! Entries are append-only. The ordered list keeps the full history for
//! audit export; the index answers foreign-key lookups, and the most recent
//! entry for a `(category, source key)` pair wins there.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{io_err, CoreError};
use crate::types::{EntityKind, MapKey};

/// One recorded correspondence between a source record and its destination twin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMapEntry {
    pub category: EntityKind,
    pub identity: String,
    #[serde(rename = "original_key")]
    pub original_primary_key: String,
    #[serde(rename = "new_key")]
    pub new_primary_key: String,
}

impl IdentityMapEntry {
    pub fn new(
        category: EntityKind,
        identity: impl Into<String>,
        original_primary_key: impl Into<String>,
        new_primary_key: impl Into<String>,
    ) -> Self {
        Self {
            category,
            identity: identity.into(),
            original_primary_key: original_primary_key.into(),
            new_primary_key: new_primary_key.into(),
        }
    }
}

/// Append-only identity table with O(1) lookup by category and source key.
#[derive(Debug, Default, Clone)]
pub struct IdentityMap {
    items: Vec<IdentityMapEntry>,
    index: HashMap<MapKey, usize>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. A later entry for the same category and source key
    /// replaces the earlier one in the index; both stay in [`items`](Self::items).
    pub fn add_item(&mut self, entry: IdentityMapEntry) {
        match MapKey::new(entry.category, entry.original_primary_key.as_str()) {
            Ok(key) => {
                self.index.insert(key, self.items.len());
            }
            Err(_) => {
                tracing::debug!(
                    "{} '{}' has no source key; recorded but not indexed",
                    entry.category,
                    entry.identity
                );
            }
        }
        self.items.push(entry);
    }

    /// The authoritative entry for a source key, if any.
    pub fn entry(&self, kind: EntityKind, original: &str) -> Option<&IdentityMapEntry> {
        let key = MapKey::new(kind, original).ok()?;
        self.index.get(&key).map(|&i| &self.items[i])
    }

    /// The destination key recorded for a source key, unparsed.
    pub fn new_key(&self, kind: EntityKind, original: &str) -> Option<&str> {
        self.entry(kind, original)
            .map(|entry| entry.new_primary_key.as_str())
    }

    /// Translate a source-side id into the destination id.
    ///
    /// `None` when the input is `None`, when no entry exists, or when the
    /// recorded destination key is not a valid UUID.
    pub fn map_key_guid(&self, kind: EntityKind, original: Option<Uuid>) -> Option<Uuid> {
        let original = original?;
        let new_key = self.new_key(kind, &original.to_string())?;
        Uuid::parse_str(new_key).ok()
    }

    /// Full ordered history.
    pub fn items(&self) -> &[IdentityMapEntry] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of recorded entries in one category.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.items.iter().filter(|e| e.category == kind).count()
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Serialize every entry as CSV with a header row.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), CoreError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for entry in &self.items {
            wtr.serialize(entry)?;
        }
        if self.items.is_empty() {
            wtr.write_record(["category", "identity", "original_key", "new_key"])?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Write the CSV export to `path` via a sibling `.tmp` file and rename.
    pub fn export_csv_at(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let tmp = PathBuf::from(format!("{}.tmp", path.display()));
        let file = std::fs::File::create(&tmp).map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = self.write_csv(file) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(io_err(path, e));
        }

        tracing::info!("wrote {} identity map entries to {}", self.len(), path.display());
        Ok(())
    }
}
