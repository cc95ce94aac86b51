//! On-disk coordinate → country code cache.
//!
//! The file is a single JSON object mapping `"<lng>|<lat>"` to an alpha-2
//! country code. It is read whole at the start of a run and rewritten whole
//! at the end. Entries are only ever added.

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::path::Path;

use caseload_core::Coordinates;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::CacheError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationCache {
    entries: BTreeMap<String, String>,
}

impl LocationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a cache from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CacheError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Serialise as pretty-printed JSON (two-space indent).
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<(), CacheError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        Ok(())
    }

    /// Load the cache file at `path`. A missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self, CacheError> {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no location cache yet, starting empty");
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(CacheError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let cache = Self::from_reader(io::BufReader::new(file))?;
        info!(path = %path.display(), entries = cache.len(), "loaded location cache");
        Ok(cache)
    }

    /// Rewrite the whole cache file at `path`.
    ///
    /// Written to a sibling temp file and renamed into place, so a crash
    /// mid-write leaves the previous cache intact.
    pub fn save(&self, path: &Path) -> Result<(), CacheError> {
        let write_err = |source: io::Error| CacheError::Write {
            path: path.to_path_buf(),
            source,
        };
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        {
            let mut writer = io::BufWriter::new(tmp.as_file_mut());
            self.write_to(&mut writer)?;
            writer.flush().map_err(write_err)?;
        }
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        info!(path = %path.display(), entries = self.len(), "saved location cache");
        Ok(())
    }

    pub fn get(&self, coordinates: &Coordinates) -> Option<&str> {
        self.entries.get(&coordinates.key()).map(String::as_str)
    }

    pub fn contains(&self, coordinates: &Coordinates) -> bool {
        self.entries.contains_key(&coordinates.key())
    }

    /// Add entries whose keys are not already present. Existing entries are
    /// left untouched. Returns the number added.
    pub fn merge(&mut self, delta: BTreeMap<String, String>) -> usize {
        let mut added = 0;
        for (key, code) in delta {
            if let std::collections::btree_map::Entry::Vacant(slot) = self.entries.entry(key) {
                slot.insert(code);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
