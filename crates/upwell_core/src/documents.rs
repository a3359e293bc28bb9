//! Registry of open bundles.
//!
//! [`Documents`] keeps decoded bundles in memory for one author, loads them
//! from a [`BundleStorage`] on first use, and folds in replicas received from
//! elsewhere with [`Documents::sync`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use upwell_core::{Author, Documents, MemoryStorage};
//!
//! let mut docs = Documents::new(Arc::new(MemoryStorage::new()), Author::new("Ada"));
//! let id = docs.create(None).await?.id();
//! docs.save(&id).await?;
//!
//! // later, with bytes from a peer
//! if docs.sync(&id, &incoming).await? {
//!     println!("{} changed", id);
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::author::Author;
use crate::error::{Result, UpwellError};
use crate::storage::BundleStorage;
use crate::upwell::{Upwell, UpwellOptions};

/// Open bundles for one author over a storage backend.
pub struct Documents {
    author: Author,
    storage: Arc<dyn BundleStorage>,
    open: HashMap<String, Upwell>,
}

impl Documents {
    pub fn new(storage: Arc<dyn BundleStorage>, author: Author) -> Self {
        Self {
            author,
            storage,
            open: HashMap::new(),
        }
    }

    /// Registry over the configured library directory, acting as the
    /// configured author.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_config(config: &crate::config::Config) -> Self {
        let storage = crate::storage::FileStorage::new(config.library_dir.clone());
        Self::new(Arc::new(storage), config.author())
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    /// Create a bundle, persist it and keep it open. An open bundle with the
    /// same id is replaced.
    pub async fn create(&mut self, id: Option<&str>) -> Result<&mut Upwell> {
        let upwell = Upwell::create(UpwellOptions {
            id: id.map(str::to_string),
            author: Some(self.author.clone()),
        })?;
        let id = upwell.id();
        self.storage.save(&id, &upwell.to_bytes()?).await?;
        log::info!("created bundle {}", id);
        self.open.insert(id.clone(), upwell);
        self.get_mut(&id)
    }

    /// Open a bundle, loading it from storage unless it is already open.
    pub async fn open(&mut self, id: &str) -> Result<&mut Upwell> {
        if !self.open.contains_key(id) {
            let bytes = self.storage.load(id).await?;
            let upwell = Upwell::from_bytes(&bytes, self.author.clone())?;
            self.open.insert(id.to_string(), upwell);
        }
        self.get_mut(id)
    }

    /// An already open bundle.
    pub fn get(&self, id: &str) -> Result<&Upwell> {
        self.open
            .get(id)
            .ok_or_else(|| UpwellError::BundleNotFound(id.to_string()))
    }

    pub fn get_mut(&mut self, id: &str) -> Result<&mut Upwell> {
        self.open
            .get_mut(id)
            .ok_or_else(|| UpwellError::BundleNotFound(id.to_string()))
    }

    /// Persist an open bundle.
    pub async fn save(&self, id: &str) -> Result<()> {
        let bytes = self.get(id)?.to_bytes()?;
        self.storage.save(id, &bytes).await
    }

    /// Merge a replica received as archive bytes into the local bundle,
    /// opening it first if needed. The bundle is saved only when the merge
    /// changed something; the return value says whether it did.
    ///
    /// A replica of a bundle that doesn't exist locally is adopted as is.
    /// Bytes of a bundle other than `id` are rejected.
    pub async fn sync(&mut self, id: &str, incoming: &[u8]) -> Result<bool> {
        let theirs = Upwell::from_bytes(incoming, self.author.clone())?;
        if theirs.id() != id {
            return Err(UpwellError::BundleMismatch {
                expected: id.to_string(),
                found: theirs.id(),
            });
        }

        let known = match self.open(id).await {
            Ok(_) => true,
            Err(UpwellError::BundleNotFound(_)) => false,
            Err(e) => return Err(e),
        };
        let changed = if known {
            self.get_mut(id)?.merge(theirs)?
        } else {
            log::info!("adopting unknown bundle {}", id);
            self.open.insert(id.to_string(), theirs);
            true
        };

        if changed {
            self.save(id).await?;
        } else {
            log::debug!("sync of {} changed nothing", id);
        }
        Ok(changed)
    }

    /// Drop a bundle from memory without saving it. Returns whether it was
    /// open.
    pub fn close(&mut self, id: &str) -> bool {
        self.open.remove(id).is_some()
    }

    /// Ids of every bundle in storage.
    pub async fn list(&self) -> Result<Vec<String>> {
        self.storage.list().await
    }

    /// Ids of the bundles currently open, sorted.
    pub fn open_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.open.keys().cloned().collect();
        ids.sort();
        ids
    }
}
