//! Durable one-file-per-document record storage.
//!
//! Each [`DocumentRecord`] is serialized as pretty-printed JSON to
//! `<records_dir>/<id>.json`. Writes go to a temporary path in the
//! same directory and are renamed into place, so a crash mid-write
//! never leaves a record that parses but holds truncated content.
//!
//! Corrupt files are skipped (with a stderr warning) by the listing
//! and bulk-load paths; only [`RecordStore::get`] surfaces corruption
//! as a typed error, so callers can tell "absent" from "unreadable".

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::DocumentRecord;

/// Filesystem-backed store of document records, one JSON file per id.
///
/// A single process owns the directory at a time; concurrent writers
/// sharing it are unsupported and would corrupt store/cache coherence.
pub struct RecordStore {
    dir: PathBuf,
}

impl RecordStore {
    /// Open (creating if needed) a record store rooted at `dir`.
    ///
    /// An uncreatable directory is a structural error and aborts
    /// startup — there is nothing to recover into.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Persist a record, replacing any existing record under the same id.
    pub fn put(&self, record: &DocumentRecord) -> Result<()> {
        let json = serde_json::to_vec_pretty(record)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", record.id));
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, self.record_path(&record.id))?;
        Ok(())
    }

    /// Load the record stored under `id`.
    ///
    /// Fails with [`Error::NotFound`] when no file exists and
    /// [`Error::Corrupt`] when the file exists but does not parse.
    pub fn get(&self, id: &str) -> Result<DocumentRecord> {
        let path = self.record_path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| Error::Corrupt {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }

    /// Enumerate the ids of all parseable records.
    ///
    /// Corrupt files are skipped with a warning; they never abort the
    /// listing.
    pub fn list_ids(&self) -> Result<BTreeSet<String>> {
        Ok(self.load_all()?.into_iter().map(|r| r.id).collect())
    }

    /// Load every parseable record, skipping corrupt files with a warning.
    pub fn load_all(&self) -> Result<Vec<DocumentRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            // In-flight temp files and other strays are not records.
            if name.starts_with('.') || !name.ends_with(".json") {
                continue;
            }
            let id = name.trim_end_matches(".json");
            match self.get(id) {
                Ok(record) => records.push(record),
                Err(Error::Corrupt { id, reason }) => {
                    eprintln!("Warning: skipping corrupt record '{}': {}", id, reason);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    /// Remove the record file for `id`. Idempotent — removing an
    /// absent record succeeds.
    pub fn delete(&self, id: &str) -> Result<()> {
        match fs::remove_file(self.record_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
