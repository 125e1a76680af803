//! Per-asset locking.
//!
//! Every asset gets its own mutex, created on first use and kept for the
//! lifetime of the registry. A batch may hold at most one asset lock at a
//! time, so no task can ever wait on a second asset while holding a first.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use flinch_core::alloc::HashMap;
use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use crate::asset::Asset;
use crate::error::LockViolation;
use crate::operation::BatchId;

type AssetGuard = ArcMutexGuard<RawMutex, ()>;

#[derive(Default)]
struct RegistryState {
    /// Never shrinks. Removing an entry could let a thread keep locking a
    /// stale mutex while a fresh one is installed for the same asset.
    mutexes: HashMap<Asset, Arc<Mutex<()>>>,
    /// The asset each in-flight batch currently holds (or waits for).
    held: HashMap<BatchId, Asset>,
}

/// Registry of per-asset mutexes and per-batch lock ownership.
///
/// The registry guard is only held for map operations, never while waiting
/// on an asset mutex. Callers go through [`ResourceSystem`](crate::ResourceSystem),
/// which checks the manifest before a mutex is ever created.
#[derive(Default)]
pub(crate) struct LockRegistry {
    state: Mutex<RegistryState>,
}

impl LockRegistry {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                mutexes: HashMap::with_capacity(capacity),
                held: HashMap::new(),
            }),
        }
    }

    /// Block until `batch` owns `asset`.
    ///
    /// # Panics
    /// Panics if `batch` already holds a lock.
    #[track_caller]
    pub(crate) fn acquire(&self, batch: BatchId, asset: Asset) -> AssetLock<'_> {
        let mutex = self.reserve(batch, asset);

        tracing::trace!("Batch {} waiting for asset {}", batch, asset);
        let guard = mutex.lock_arc();
        tracing::trace!("Batch {} locked asset {}", batch, asset);

        AssetLock::held(self, batch, asset, guard)
    }

    /// Like [`LockRegistry::acquire`], but gives up after `timeout`.
    ///
    /// On timeout the batch registration is rolled back, so the batch may
    /// request any asset again.
    ///
    /// # Panics
    /// Panics if `batch` already holds a lock.
    #[track_caller]
    pub(crate) fn try_acquire_for(
        &self,
        batch: BatchId,
        asset: Asset,
        timeout: Duration,
    ) -> Option<AssetLock<'_>> {
        let mutex = self.reserve(batch, asset);

        match mutex.try_lock_arc_for(timeout) {
            Some(guard) => {
                tracing::trace!("Batch {} locked asset {}", batch, asset);
                Some(AssetLock::held(self, batch, asset, guard))
            }
            None => {
                self.unregister(batch, asset);
                tracing::warn!(
                    "Batch {} gave up waiting for asset {} after {:?}",
                    batch,
                    asset,
                    timeout
                );
                None
            }
        }
    }

    /// Number of assets that have ever been locked.
    pub(crate) fn tracked_assets(&self) -> usize {
        self.state.lock().mutexes.len()
    }

    /// The asset `batch` currently holds, if any.
    pub(crate) fn holder(&self, batch: BatchId) -> Option<Asset> {
        self.state.lock().held.get(&batch).copied()
    }

    /// Register `batch` as the owner of `asset` and hand back the asset mutex.
    #[track_caller]
    fn reserve(&self, batch: BatchId, asset: Asset) -> Arc<Mutex<()>> {
        let mut state = self.state.lock();

        let held = state.held.get(&batch).copied();
        if let Some(held) = held {
            drop(state);
            LockViolation::BatchAlreadyLocked {
                batch,
                held,
                requested: asset,
            }
            .raise();
        }

        let mutex = Arc::clone(
            state
                .mutexes
                .entry(asset)
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        );
        state.held.insert(batch, asset);
        mutex
    }

    fn unregister(&self, batch: BatchId, asset: Asset) {
        let mut state = self.state.lock();
        if state.held.get(&batch) == Some(&asset) {
            state.held.remove(&batch);
        }
    }
}

/// Exclusive ownership of one asset by one batch.
///
/// Call [`AssetLock::release`] exactly once when done; a second call panics.
/// A lock that is dropped while still held is released automatically.
///
/// Locks are only handed out by [`ResourceSystem`](crate::ResourceSystem)
/// after the manifest check; the registry behind them is not reachable:
///
/// ```compile_fail
/// use flinch_resources::lock::LockRegistry;
/// ```
pub struct AssetLock<'a> {
    registry: &'a LockRegistry,
    batch: BatchId,
    asset: Asset,
    guard: Option<AssetGuard>,
}

impl<'a> AssetLock<'a> {
    fn held(registry: &'a LockRegistry, batch: BatchId, asset: Asset, guard: AssetGuard) -> Self {
        Self {
            registry,
            batch,
            asset,
            guard: Some(guard),
        }
    }

    /// The asset this lock guards.
    pub fn asset(&self) -> Asset {
        self.asset
    }

    /// The batch that owns this lock.
    pub fn batch(&self) -> BatchId {
        self.batch
    }

    pub fn is_released(&self) -> bool {
        self.guard.is_none()
    }

    /// Unlock the asset and free the batch to lock another one.
    ///
    /// # Panics
    /// Panics if the lock was already released.
    #[track_caller]
    pub fn release(&mut self) {
        let Some(guard) = self.guard.take() else {
            LockViolation::DoubleRelease {
                batch: self.batch,
                asset: self.asset,
            }
            .raise();
        };

        drop(guard);
        self.registry.unregister(self.batch, self.asset);
        tracing::trace!("Batch {} released asset {}", self.batch, self.asset);
    }
}

impl Drop for AssetLock<'_> {
    fn drop(&mut self) {
        if self.guard.is_some() {
            self.release();
        }
    }
}

impl fmt::Debug for AssetLock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetLock")
            .field("batch", &self.batch)
            .field("asset", &self.asset)
            .field("released", &self.is_released())
            .finish()
    }
}
