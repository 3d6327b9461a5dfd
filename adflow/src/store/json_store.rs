//! JSON-file backed keyed collections.
//!
//! A store file holds a JSON array of records. Reads tolerate a missing or
//! blank file (empty collection) and reject anything else that fails to
//! parse. Writes always replace the whole file via a sibling temp file and
//! a rename, so a crash mid-write leaves the previous version intact.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::core::{Artifact, ContentKey, Product};
use crate::errors::StoreError;

/// A record that can live in a [`JsonStore`].
pub trait StoreRecord: Serialize + DeserializeOwned + Clone {
    /// The merge key of the record.
    fn store_key(&self) -> &str;
}

impl StoreRecord for Artifact {
    fn store_key(&self) -> &str {
        self.id.as_str()
    }
}

impl StoreRecord for Product {
    fn store_key(&self) -> &str {
        &self.id
    }
}

/// How [`JsonStore::upsert_all`] treats keys that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// First write wins; incoming records with existing keys are dropped.
    #[default]
    KeepExisting,
    /// Incoming records overwrite existing ones in place.
    Replace,
}

/// Counts from one merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeReport {
    /// New keys appended.
    pub inserted: usize,
    /// Existing keys overwritten (only under [`MergePolicy::Replace`]).
    pub replaced: usize,
    /// Incoming records dropped because their key already existed.
    pub ignored: usize,
    /// Size of the collection after the write.
    pub total: usize,
}

/// Set of keys present in a store, built once from [`JsonStore::load_all`].
#[derive(Debug, Clone, Default)]
pub struct StoreIndex {
    keys: HashSet<String>,
}

impl StoreIndex {
    /// Builds an index from loaded records.
    #[must_use]
    pub fn from_records<T: StoreRecord>(records: &[T]) -> Self {
        Self {
            keys: records.iter().map(|r| r.store_key().to_string()).collect(),
        }
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains(&self, key: &ContentKey) -> bool {
        self.keys.contains(key.as_str())
    }

    /// Records a key as present.
    pub fn insert(&mut self, key: &ContentKey) -> bool {
        self.keys.insert(key.to_string())
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// A keyed collection persisted as one JSON array file.
#[derive(Debug, Clone)]
pub struct JsonStore<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: StoreRecord> JsonStore<T> {
    /// Creates a store handle for a file path. Nothing is read yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the backing file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the whole collection in stored order.
    ///
    /// A key that appears more than once in the file keeps its first record.
    pub fn load_all(&self) -> Result<Vec<T>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<T> = serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        let loaded = records.len();
        let mut seen = HashSet::with_capacity(loaded);
        let records: Vec<T> = records
            .into_iter()
            .filter(|r| seen.insert(r.store_key().to_string()))
            .collect();
        if records.len() < loaded {
            tracing::warn!(
                path = %self.path.display(),
                duplicates = loaded - records.len(),
                "Store file has duplicate keys, keeping the first record of each"
            );
        }
        Ok(records)
    }

    /// Loads the collection and indexes its keys.
    pub fn index(&self) -> Result<StoreIndex, StoreError> {
        Ok(StoreIndex::from_records(&self.load_all()?))
    }

    /// Returns true if a record with this key is stored.
    pub fn contains_key(&self, key: &ContentKey) -> Result<bool, StoreError> {
        Ok(self.index()?.contains(key))
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.load_all()?.len())
    }

    /// Merges records into the store by key and writes the result.
    ///
    /// Stored order is preserved; new keys are appended in incoming order.
    /// Duplicate keys inside `incoming` follow the same policy as keys
    /// already on disk. An empty `incoming` performs no write.
    pub fn upsert_all(&self, incoming: Vec<T>, policy: MergePolicy) -> Result<MergeReport, StoreError> {
        let mut records = self.load_all()?;
        let mut report = MergeReport::default();
        if incoming.is_empty() {
            report.total = records.len();
            return Ok(report);
        }

        let mut positions: std::collections::HashMap<String, usize> = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.store_key().to_string(), i))
            .collect();

        for record in incoming {
            match positions.get(record.store_key()) {
                Some(&pos) => match policy {
                    MergePolicy::KeepExisting => report.ignored += 1,
                    MergePolicy::Replace => {
                        records[pos] = record;
                        report.replaced += 1;
                    }
                },
                None => {
                    positions.insert(record.store_key().to_string(), records.len());
                    records.push(record);
                    report.inserted += 1;
                }
            }
        }

        self.write_atomic(&records)?;
        report.total = records.len();
        Ok(report)
    }

    fn write_atomic(&self, records: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records).map_err(|e| StoreError::Serialize {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let mut file = File::create(&temp_path).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);
        fs::rename(&temp_path, &self.path).map_err(io_err)?;

        tracing::debug!(path = %self.path.display(), records = records.len(), "Store written");
        Ok(())
    }
}
