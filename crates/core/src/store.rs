//! In-memory versioned collections.
//!
//! A [`Collection`] holds the live revision of each record plus an archive of every
//! superseded or deleted revision. Versions start at 1 and increase by one per update.
//! Integer ids are allocated monotonically and never reused, even after deletion.

use crate::resources::{Record, RecordId, Resource, Versioned};
use crate::{EhrError, EhrResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;

/// The live revision of one record.
#[derive(Clone, Debug, PartialEq)]
pub struct Row<T> {
    pub version: u32,
    pub data: T,
}

/// An archived revision.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Revision<K, T> {
    #[serde(rename = "id")]
    pub key: K,
    pub version: u32,
    pub archived_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

#[derive(Clone, Debug)]
pub struct Collection<K, T> {
    rows: BTreeMap<K, Row<T>>,
    /// Archived revisions per key, oldest first. Kept after the live record is removed.
    history: BTreeMap<K, Vec<Revision<K, T>>>,
    last_id: RecordId,
}

impl<K, T> Default for Collection<K, T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            history: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<K, T> Collection<K, T>
where
    K: Ord + Clone + Display,
    T: Resource,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    /// Live records ordered by key.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Row<T>)> {
        self.rows.iter()
    }

    /// # Errors
    ///
    /// Returns `EhrError::NotFound` if no live record has this key.
    pub fn get(&self, key: &K) -> EhrResult<&Row<T>> {
        self.rows
            .get(key)
            .ok_or_else(|| EhrError::not_found(T::KIND, key))
    }

    /// Insert a record under a caller-supplied key at version 1.
    ///
    /// # Errors
    ///
    /// Returns `EhrError::AlreadyExists` if the key is live.
    pub fn insert(&mut self, key: K, data: T) -> EhrResult<Row<T>> {
        if self.rows.contains_key(&key) {
            return Err(EhrError::AlreadyExists {
                kind: T::KIND,
                key: key.to_string(),
            });
        }
        let row = Row { version: 1, data };
        self.rows.insert(key, row.clone());
        Ok(row)
    }

    /// Replace the data of a live record, archiving the previous revision.
    ///
    /// # Errors
    ///
    /// Returns `EhrError::NotFound` if no live record has this key.
    pub fn update(&mut self, key: &K, data: T) -> EhrResult<Row<T>> {
        let row = self
            .rows
            .get_mut(key)
            .ok_or_else(|| EhrError::not_found(T::KIND, key))?;

        let version = row.version + 1;
        let previous = std::mem::replace(row, Row { version, data });
        let updated = row.clone();
        self.archive(key.clone(), previous);
        Ok(updated)
    }

    /// Remove a live record, archiving its final revision.
    ///
    /// # Errors
    ///
    /// Returns `EhrError::NotFound` if no live record has this key.
    pub fn remove(&mut self, key: &K) -> EhrResult<Row<T>> {
        let row = self
            .rows
            .remove(key)
            .ok_or_else(|| EhrError::not_found(T::KIND, key))?;
        self.archive(key.clone(), row.clone());
        Ok(row)
    }

    /// Archived revisions of `key`, oldest first. Empty for unknown keys.
    pub fn history(&self, key: &K) -> Vec<Revision<K, T>> {
        self.history.get(key).cloned().unwrap_or_default()
    }

    /// Whether `key` has archived revisions, i.e. it was updated or deleted at some point.
    pub fn has_history(&self, key: &K) -> bool {
        self.history.contains_key(key)
    }

    fn archive(&mut self, key: K, row: Row<T>) {
        self.history.entry(key.clone()).or_default().push(Revision {
            key,
            version: row.version,
            archived_at: Utc::now(),
            data: row.data,
        });
    }
}

impl<T: Resource> Collection<RecordId, T> {
    /// Store a new record under the next free id.
    pub fn create(&mut self, data: T) -> Record<T> {
        self.last_id += 1;
        let id = self.last_id;
        let row = Row { version: 1, data };
        self.rows.insert(id, row.clone());
        Record {
            id,
            data: row.data,
            version: row.version,
        }
    }

    pub fn record(&self, id: RecordId) -> EhrResult<Record<T>> {
        self.get(&id).map(|row| row.to_record(id))
    }

    pub fn records(&self) -> Vec<Record<T>> {
        self.iter().map(|(id, row)| row.to_record(*id)).collect()
    }

    /// First live record matching `pred`, used for reverse-reference checks.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<RecordId> {
        self.iter()
            .find(|(_, row)| pred(&row.data))
            .map(|(id, _)| *id)
    }
}

impl<T: Clone> Row<T> {
    pub fn to_record(&self, id: RecordId) -> Record<T> {
        Record {
            id,
            data: self.data.clone(),
            version: self.version,
        }
    }

    pub fn to_versioned(&self) -> Versioned<T> {
        Versioned {
            data: self.data.clone(),
            version: self.version,
        }
    }
}
