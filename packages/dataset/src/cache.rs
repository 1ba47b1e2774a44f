//! Memoized dataset loads.
//!
//! One entry is kept per set of paths, tagged with the SHA-256 of each
//! file's bytes. An edited file is reparsed and replaces the entry; an
//! unchanged one is served from memory. Cached values are shared
//! read-only behind [`Arc`].

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use sha2::{Digest as _, Sha256};

use crate::{DatasetError, DatasetPaths, LoadOptions, LoadedDatasets, parse_datasets, read_file};

type ContentHashes = [String; 3];

/// Thread-safe cache of parsed datasets.
#[derive(Debug)]
pub struct DatasetCache {
    options: LoadOptions,
    entries: Mutex<BTreeMap<DatasetPaths, (ContentHashes, Arc<LoadedDatasets>)>>,
}

fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

impl DatasetCache {
    /// Creates an empty cache that parses with `options`.
    #[must_use]
    pub const fn new(options: LoadOptions) -> Self {
        Self {
            options,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Options used for every parse.
    #[must_use]
    pub const fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Number of memoized path sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been loaded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads the tables at `paths`, reusing the previous parse when every
    /// file's content is unchanged and replacing it otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if a file cannot be read or parsed.
    pub fn load(&self, paths: &DatasetPaths) -> Result<Arc<LoadedDatasets>, DatasetError> {
        let incidents = read_file(&paths.incidents)?;
        let indicators = read_file(&paths.indicators)?;
        let predictions = read_file(&paths.predictions)?;

        let hashes: ContentHashes = [
            content_hash(&incidents),
            content_hash(&indicators),
            content_hash(&predictions),
        ];

        if let Some((cached, hit)) = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(paths)
            && *cached == hashes
        {
            log::debug!("Dataset cache hit for {}", paths.incidents.display());
            return Ok(Arc::clone(hit));
        }

        let loaded = Arc::new(parse_datasets(
            paths,
            [
                incidents.as_slice(),
                indicators.as_slice(),
                predictions.as_slice(),
            ],
            &self.options,
        )?);

        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(paths.clone(), (hashes, Arc::clone(&loaded)));

        Ok(loaded)
    }

    /// Drops every memoized load.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
