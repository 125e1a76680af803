//! The view of the resource system handed to each loading task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::asset::Asset;
use crate::error::ResourceResult;
use crate::lock::AssetLock;
use crate::operation::BatchId;
use crate::system::ResourceSystem;

/// Cooperative cancellation flag shared by the operations of one load.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelScope {
    cancelled: Arc<AtomicBool>,
}

impl CancelScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Scoped access to a [`ResourceSystem`] for one task of one batch.
///
/// Locks taken through the context are attributed to the context's batch,
/// which is what enforces the one-lock-per-batch rule.
pub struct LoaderContext<'a> {
    system: &'a ResourceSystem,
    batch: BatchId,
    scope: &'a CancelScope,
}

impl<'a> LoaderContext<'a> {
    pub(crate) fn new(system: &'a ResourceSystem, batch: BatchId, scope: &'a CancelScope) -> Self {
        Self {
            system,
            batch,
            scope,
        }
    }

    /// Block until this batch owns `asset`.
    ///
    /// The returned lock must be released before the batch locks anything else.
    ///
    /// # Panics
    /// Panics if the asset is not in the manifest or the batch already holds
    /// a lock.
    #[track_caller]
    pub fn lock(&self, asset: Asset) -> AssetLock<'a> {
        self.system.lock_asset(self.batch, asset)
    }

    /// Bounded form of [`LoaderContext::lock`]; `None` on timeout.
    #[track_caller]
    pub fn try_lock_for(&self, asset: Asset, timeout: Duration) -> Option<AssetLock<'a>> {
        self.system.try_lock_asset_for(self.batch, asset, timeout)
    }

    /// Read the raw bytes of `asset`. Does not take any lock.
    pub fn read_bytes(&self, asset: Asset) -> ResourceResult<Vec<u8>> {
        self.system.read_bytes(asset)
    }

    pub fn contains(&self, asset: Asset) -> bool {
        self.system.contains(asset)
    }

    pub fn batch(&self) -> BatchId {
        self.batch
    }

    pub fn system(&self) -> &'a ResourceSystem {
        self.system
    }

    pub fn scope(&self) -> &'a CancelScope {
        self.scope
    }

    pub fn is_cancelled(&self) -> bool {
        self.scope.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let scope = CancelScope::new();
        let clone = scope.clone();
        assert!(!clone.is_cancelled());

        scope.cancel();
        assert!(clone.is_cancelled());
    }
}
