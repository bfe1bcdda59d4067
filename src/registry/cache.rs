//! Registry snapshot cache
//!
//! Holds the current registry as an `Arc` snapshot. Refreshing swaps the
//! whole snapshot under the write lock, so an evaluation holding a snapshot
//! never sees a partially updated registry.

use crate::error::Result;
use crate::registry::store::FieldRegistry;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

type Loader = dyn Fn() -> Result<FieldRegistry> + Send + Sync;

/// Lazily loaded, explicitly invalidated registry holder
pub struct RegistryCache {
    slot: RwLock<Option<Arc<FieldRegistry>>>,
    loader: Box<Loader>,
}

impl RegistryCache {
    /// Create an empty cache that loads through `loader` on first use
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<FieldRegistry> + Send + Sync + 'static,
    {
        Self {
            slot: RwLock::new(None),
            loader: Box::new(loader),
        }
    }

    /// Create a cache around a fixed registry
    ///
    /// Invalidating it reloads the same registry.
    pub fn preloaded(registry: FieldRegistry) -> Self {
        let snapshot = Arc::new(registry);
        let source = Arc::clone(&snapshot);
        Self {
            slot: RwLock::new(Some(snapshot)),
            loader: Box::new(move || Ok(FieldRegistry::clone(&source))),
        }
    }

    /// Load the registry if no snapshot is present
    pub fn init(&self) -> Result<Arc<FieldRegistry>> {
        self.get()
    }

    /// Current snapshot, loading it on a miss
    pub fn get(&self) -> Result<Arc<FieldRegistry>> {
        // Fast path: read lock only
        if let Some(snapshot) = self.slot.read().as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let mut slot = self.slot.write();
        if let Some(snapshot) = slot.as_ref() {
            return Ok(Arc::clone(snapshot));
        }

        let registry = (self.loader)()?;
        log::debug!("field registry loaded with {} fields", registry.len());
        let snapshot = Arc::new(registry);
        *slot = Some(Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Replace the snapshot atomically
    pub fn replace(&self, registry: FieldRegistry) -> Arc<FieldRegistry> {
        let snapshot = Arc::new(registry);
        *self.slot.write() = Some(Arc::clone(&snapshot));
        log::debug!("field registry replaced with {} fields", snapshot.len());
        snapshot
    }

    /// Drop the snapshot; the next `get` reloads
    pub fn invalidate(&self) {
        *self.slot.write() = None;
        log::debug!("field registry invalidated");
    }

    pub fn is_loaded(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl fmt::Debug for RegistryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCache")
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}
