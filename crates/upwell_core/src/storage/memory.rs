//! In-memory bundle storage, for tests and ephemeral sessions.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{BoxFuture, BundleStorage};
use crate::error::{Result, UpwellError};

/// Bundles kept in a map for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    bundles: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BundleStorage for MemoryStorage {
    fn load<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let bundles = self.bundles.read().unwrap_or_else(|e| e.into_inner());
            bundles
                .get(id)
                .cloned()
                .ok_or_else(|| UpwellError::BundleNotFound(id.to_string()))
        })
    }

    fn save<'a>(&'a self, id: &'a str, bytes: &'a [u8]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut bundles = self.bundles.write().unwrap_or_else(|e| e.into_inner());
            bundles.insert(id.to_string(), bytes.to_vec());
            Ok(())
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut bundles = self.bundles.write().unwrap_or_else(|e| e.into_inner());
            bundles.remove(id);
            Ok(())
        })
    }

    fn list<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(async move {
            let bundles = self.bundles.read().unwrap_or_else(|e| e.into_inner());
            let mut ids: Vec<String> = bundles.keys().cloned().collect();
            ids.sort();
            Ok(ids)
        })
    }
}
