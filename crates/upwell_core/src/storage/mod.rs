//! Persistence of encoded bundles.
//!
//! [`BundleStorage`] is the seam between the in-memory registry and wherever
//! bundles live. It deals only in archive bytes keyed by bundle id; encoding
//! and decoding stay with the bundle itself.
//!
//! ## Object safety
//!
//! `BundleStorage` is used behind `Arc<dyn BundleStorage>`, so every method
//! returns a boxed future instead of being an `async fn`.

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

#[cfg(not(target_arch = "wasm32"))]
mod file;
mod memory;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// A boxed future for object-safe async methods.
///
/// On native targets, futures are `Send` for compatibility with multi-threaded runtimes.
#[cfg(not(target_arch = "wasm32"))]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A boxed future for object-safe async methods.
///
/// WASM version without `Send` requirement - JavaScript is single-threaded.
#[cfg(target_arch = "wasm32")]
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Async key-value store of encoded bundles.
///
/// # Example
///
/// ```ignore
/// use upwell_core::storage::BundleStorage;
///
/// async fn copy(from: &dyn BundleStorage, to: &dyn BundleStorage, id: &str) {
///     let bytes = from.load(id).await.unwrap();
///     to.save(id, &bytes).await.unwrap();
/// }
/// ```
pub trait BundleStorage: Send + Sync {
    /// Read a bundle's archive bytes. Fails with `BundleNotFound` when absent.
    fn load<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;

    /// Store a bundle's archive bytes, replacing any previous version.
    fn save<'a>(&'a self, id: &'a str, bytes: &'a [u8]) -> BoxFuture<'a, Result<()>>;

    /// Remove a bundle. Removing an unknown bundle is not an error.
    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Ids of every stored bundle, sorted.
    fn list<'a>(&'a self) -> BoxFuture<'a, Result<Vec<String>>>;
}
