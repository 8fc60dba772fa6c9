//! In-memory keyed store with a segregated metadata namespace.
//!
//! The store maps string keys to arbitrary JSON values and keeps a second
//! mapping for metadata about its own contents. Metadata keys are always
//! wrapped in the reserved `__` delimiter, so data keys and metadata keys
//! can never collide.
//!
//! Nested values are addressed with colon-delimited key paths
//! (`repo:pull_requests`); intermediate objects are created on write and
//! missing segments fail lookups with [`StoreError::KeyNotFound`].

use serde_json::{Map, Value};
use thiserror::Error;

/// Reserved delimiter wrapped around metadata keys.
pub const META_DELIM: &str = "__";

/// Separator between segments of a key path.
pub const PATH_DELIM: char = ':';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A path lookup hit a segment with no entry. Usually a logic error:
    /// something expected the store to be populated at this path.
    #[error("key path `{path}` has no entry at segment `{segment}`")]
    KeyNotFound { path: String, segment: String },

    /// A path write found a non-object value at an intermediate segment.
    /// We refuse to overwrite it rather than silently destroy data.
    #[error("key path `{path}` hit a non-object value at segment `{segment}`")]
    KeyConflict { path: String, segment: String },
}

/// Verdict returned by a [`MemStore::filter`] predicate for each entry.
///
/// `Halt` short-circuits the remaining entries and returns the results
/// collected so far; it is control flow, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    Include,
    Exclude,
    Halt,
}

/// A dict-like structure that maintains separate metadata about its contents.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    store: Map<String, Value>,
    meta: Map<String, Value>,
}

impl MemStore {
    /// Creates an empty store whose identifier is recorded in metadata
    /// under the `id` key.
    pub fn new(identifier: &str) -> Self {
        let mut store = Self::default();
        store.set_meta("id", Value::String(identifier.to_string()));
        store
    }

    pub fn identifier(&self) -> Option<&str> {
        self.get_meta("id").and_then(Value::as_str)
    }

    /// Wraps `key` in the metadata delimiter unless it is already wrapped.
    pub fn to_meta_key(key: &str) -> String {
        let mut key = key.to_string();
        if !key.starts_with(META_DELIM) {
            key = format!("{META_DELIM}{key}");
        }
        if !key.ends_with(META_DELIM) {
            key.push_str(META_DELIM);
        }
        key
    }

    pub fn is_meta_key(key: &str) -> bool {
        key.starts_with(META_DELIM) && key.ends_with(META_DELIM)
    }

    /// Sets a flat data key, returning the previous value if any.
    pub fn set(&mut self, key: &str, value: Value) -> Option<Value> {
        self.store.insert(key.to_string(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.store.get(key)
    }

    /// Sets a metadata key (normalized via [`Self::to_meta_key`]),
    /// returning the previous value if any.
    pub fn set_meta(&mut self, key: &str, value: Value) -> Option<Value> {
        self.meta.insert(Self::to_meta_key(key), value)
    }

    pub fn get_meta(&self, key: &str) -> Option<&Value> {
        self.meta.get(&Self::to_meta_key(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.contains_key(key) || self.meta.contains_key(key)
    }

    /// Number of data entries (metadata not counted).
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.store.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.store.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.store.iter()
    }

    /// Indexes an array of objects by the value of `index_key`, storing each
    /// record under that value. Records missing the key (or holding a
    /// non-string there) are skipped with a warning.
    pub fn update_from_array(&mut self, records: Vec<Value>, index_key: &str) {
        for record in records {
            match record.get(index_key).and_then(Value::as_str) {
                Some(key) => {
                    self.store.insert(key.to_string(), record);
                }
                None => {
                    tracing::warn!(index_key, "Skipping record without a usable index key");
                }
            }
        }
    }

    /// Joins path segments with the path delimiter.
    ///
    /// Known limitation: a segment that itself contains the delimiter makes
    /// the resulting path ambiguous to [`Self::split_path`].
    pub fn build_path(segments: &[&str]) -> String {
        segments.join(&PATH_DELIM.to_string())
    }

    pub fn split_path(path: &str) -> Vec<&str> {
        path.split(PATH_DELIM).collect()
    }

    /// Writes `value` at a nested key path, creating intermediate objects
    /// for every missing segment but the last.
    ///
    /// Fails with [`StoreError::KeyConflict`] if an intermediate segment
    /// already holds a non-object value.
    pub fn set_path(&mut self, path: &str, value: Value) -> Result<(), StoreError> {
        let mut segments = Self::split_path(path);
        let last = segments.pop().unwrap_or(path);

        let mut current = &mut self.store;
        for segment in segments {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = entry.as_object_mut().ok_or_else(|| StoreError::KeyConflict {
                path: path.to_string(),
                segment: segment.to_string(),
            })?;
        }

        current.insert(last.to_string(), value);
        Ok(())
    }

    /// Reads the value at a nested key path.
    pub fn get_path(&self, path: &str) -> Result<&Value, StoreError> {
        let missing = |segment: &str| StoreError::KeyNotFound {
            path: path.to_string(),
            segment: segment.to_string(),
        };

        let mut segments = Self::split_path(path).into_iter();
        let first = segments.next().unwrap_or(path);
        let mut current = self.store.get(first).ok_or_else(|| missing(first))?;

        for segment in segments {
            current = current
                .as_object()
                .and_then(|map| map.get(segment))
                .ok_or_else(|| missing(segment))?;
        }

        Ok(current)
    }

    /// Returns the entries for which the predicate says [`FilterOutcome::Include`].
    /// [`FilterOutcome::Halt`] stops the scan and keeps what was collected so far.
    pub fn filter<F>(&self, mut predicate: F, include_meta: bool) -> Map<String, Value>
    where
        F: FnMut(&str, &Value) -> FilterOutcome,
    {
        let mut filtered = Map::new();

        let data = self.store.iter();
        let entries: Box<dyn Iterator<Item = (&String, &Value)>> = if include_meta {
            Box::new(self.meta.iter().chain(data))
        } else {
            Box::new(data)
        };

        for (key, value) in entries {
            match predicate(key, value) {
                FilterOutcome::Include => {
                    filtered.insert(key.clone(), value.clone());
                }
                FilterOutcome::Exclude => {}
                FilterOutcome::Halt => break,
            }
        }

        filtered
    }

    /// Overlays another store's data entries onto this one, last write wins.
    /// With `include_meta`, metadata entries are overlaid too.
    pub fn merge(&mut self, other: &MemStore, include_meta: bool) {
        for (key, value) in &other.store {
            self.store.insert(key.clone(), value.clone());
        }
        if include_meta {
            for (key, value) in &other.meta {
                self.meta.insert(key.clone(), value.clone());
            }
        }
    }
}
