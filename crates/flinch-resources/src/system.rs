//! The resource system - gateway from asset ids to raw file bytes.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::asset::{Asset, AssetManifest};
use crate::context::CancelScope;
use crate::error::{LockViolation, ResourceError, ResourceResult};
use crate::io::FileSystem;
use crate::lock::{AssetLock, LockRegistry};
use crate::operation::{BatchId, BoxedTask, LoadingOperation};
use crate::options::ResourceSystemOptions;

/// Loads asset bytes from a linked filesystem with per-asset locking.
///
/// Each system has its own manifest, filesystem and lock registry, so several
/// systems with disjoint id spaces can coexist.
///
/// # Example
///
/// ```ignore
/// let manifest: AssetManifest = [(Asset::new(1), "a.bin")].into_iter().collect();
/// let system = ResourceSystem::new("static", manifest, ResourceSystemOptions::default())
///     .with_filesystem(DirectoryFs::new("assets"));
///
/// let mut batch = system.create_batch([task(|ctx| {
///     let mut lock = ctx.lock(Asset::new(1));
///     let bytes = ctx.read_bytes(Asset::new(1));
///     lock.release();
///     bytes.map(drop)
/// })]);
/// batch.execute(&CancelScope::new())?;
/// ```
pub struct ResourceSystem {
    name: String,
    options: ResourceSystemOptions,
    manifest: RwLock<Arc<AssetManifest>>,
    filesystem: RwLock<Option<Arc<dyn FileSystem>>>,
    locks: LockRegistry,
    next_batch: AtomicU64,
}

impl ResourceSystem {
    pub fn new(
        name: impl Into<String>,
        manifest: AssetManifest,
        options: ResourceSystemOptions,
    ) -> Self {
        let name = name.into();
        tracing::debug!(
            "Created resource system '{}' with {} assets",
            name,
            manifest.len()
        );

        Self {
            locks: LockRegistry::with_capacity(manifest.len()),
            name,
            options,
            manifest: RwLock::new(Arc::new(manifest)),
            filesystem: RwLock::new(None),
            next_batch: AtomicU64::new(1),
        }
    }

    /// Link a filesystem at construction time.
    pub fn with_filesystem(self, filesystem: impl FileSystem + 'static) -> Self {
        self.use_filesystem(filesystem);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &ResourceSystemOptions {
        &self.options
    }

    pub fn manifest(&self) -> Arc<AssetManifest> {
        Arc::clone(&self.manifest.read())
    }

    /// Replace the manifest. Locks on assets from the old manifest stay valid.
    pub fn set_manifest(&self, manifest: AssetManifest) {
        tracing::debug!(
            "Resource system '{}' switched to a manifest with {} assets",
            self.name,
            manifest.len()
        );
        *self.manifest.write() = Arc::new(manifest);
    }

    pub fn contains(&self, asset: Asset) -> bool {
        self.manifest.read().contains(asset)
    }

    /// Link a filesystem, or unlink it with `None`.
    ///
    /// Reads made while no filesystem is linked fail with
    /// [`ResourceError::MissingFileSystem`].
    pub fn set_filesystem(&self, filesystem: Option<Arc<dyn FileSystem>>) {
        tracing::debug!(
            "Resource system '{}' {} filesystem",
            self.name,
            if filesystem.is_some() { "linked" } else { "unlinked" }
        );
        *self.filesystem.write() = filesystem;
    }

    pub fn use_filesystem(&self, filesystem: impl FileSystem + 'static) {
        self.set_filesystem(Some(Arc::new(filesystem)));
    }

    pub fn filesystem(&self) -> Option<Arc<dyn FileSystem>> {
        self.filesystem.read().clone()
    }

    pub fn has_filesystem(&self) -> bool {
        self.filesystem.read().is_some()
    }

    /// Block until `batch` owns `asset`.
    ///
    /// Different assets lock independently; the same asset is handed out to
    /// one batch at a time.
    ///
    /// # Panics
    /// Panics if `asset` is not in the manifest, or if `batch` already holds
    /// a lock.
    #[track_caller]
    pub fn lock_asset(&self, batch: BatchId, asset: Asset) -> AssetLock<'_> {
        if !self.contains(asset) {
            LockViolation::UnknownAsset { asset }.raise();
        }
        self.locks.acquire(batch, asset)
    }

    /// Like [`ResourceSystem::lock_asset`], but returns `None` if the asset
    /// is still held by another batch after `timeout`.
    ///
    /// # Panics
    /// Same conditions as [`ResourceSystem::lock_asset`].
    #[track_caller]
    pub fn try_lock_asset_for(
        &self,
        batch: BatchId,
        asset: Asset,
        timeout: Duration,
    ) -> Option<AssetLock<'_>> {
        if !self.contains(asset) {
            LockViolation::UnknownAsset { asset }.raise();
        }
        self.locks.try_acquire_for(batch, asset, timeout)
    }

    /// Whether `batch` currently holds (or waits for) an asset lock.
    pub fn is_batch_locked(&self, batch: BatchId) -> bool {
        self.locks.holder(batch).is_some()
    }

    /// Number of assets that have ever been locked through this system.
    pub fn tracked_assets(&self) -> usize {
        self.locks.tracked_assets()
    }

    /// The path handed to the filesystem for `asset`, after root trimming.
    pub fn resolve_path(&self, asset: Asset) -> Option<String> {
        let manifest = self.manifest.read();
        let path = manifest.get(asset)?.as_str();

        let path = if self.options.trim_root {
            path.split_once('/').map_or(path, |(_, rest)| rest)
        } else {
            path
        };
        Some(path.to_string())
    }

    /// Read the raw bytes of `asset` through the linked filesystem.
    ///
    /// No lock is taken; hold the asset's lock first if exclusivity matters.
    pub fn read_bytes(&self, asset: Asset) -> ResourceResult<Vec<u8>> {
        let path = self
            .resolve_path(asset)
            .ok_or_else(|| ResourceError::NotInManifest {
                system: self.name.clone(),
                asset,
            })?;

        let filesystem = self
            .filesystem()
            .ok_or_else(|| ResourceError::MissingFileSystem {
                system: self.name.clone(),
            })?;

        tracing::trace!("Reading asset {} from '{}'", asset, path);
        filesystem.read(&path).map_err(|source| ResourceError::Io {
            system: self.name.clone(),
            asset,
            path,
            source,
        })
    }

    /// Allocate a fresh batch id, unique within this system.
    pub fn next_batch_id(&self) -> BatchId {
        BatchId::new(self.next_batch.fetch_add(1, Ordering::Relaxed))
    }

    /// Bundle `tasks` into an operation with a fresh batch id.
    pub fn create_batch<'a>(
        &'a self,
        tasks: impl IntoIterator<Item = BoxedTask<'a>>,
    ) -> LoadingOperation<'a> {
        let batch = self.next_batch_id();
        LoadingOperation::new(self, batch, tasks.into_iter().collect())
    }

    /// Load `tasks`, split into operations of `options.batch_size` tasks.
    ///
    /// Operations are drained from a shared queue by at most
    /// [`worker_limit`](Self::worker_limit) workers, the calling thread being
    /// one of them. They share one [`CancelScope`]; the first operation to
    /// fail cancels the rest and its error is returned. Tasks inside an
    /// operation run in order.
    ///
    /// # Panics
    /// Re-raises any panic from a task, including lock contract violations.
    pub fn load<'a>(&'a self, tasks: Vec<BoxedTask<'a>>) -> ResourceResult<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let chunk_size = match self.options.batch_size {
            0 => tasks.len(),
            size => size,
        };

        let mut operations = VecDeque::with_capacity(tasks.len().div_ceil(chunk_size));
        let mut tasks = tasks.into_iter().peekable();
        while tasks.peek().is_some() {
            operations.push_back(self.create_batch(tasks.by_ref().take(chunk_size)));
        }

        let workers = Self::worker_limit().min(operations.len());
        tracing::debug!(
            "Resource system '{}' loading {} operations on {} workers",
            self.name,
            operations.len(),
            workers
        );

        let scope = CancelScope::new();
        let queue = Mutex::new(operations);
        let failure: Mutex<Option<ResourceError>> = Mutex::new(None);

        let drain = || {
            while !scope.is_cancelled() {
                let Some(mut operation) = queue.lock().pop_front() else {
                    break;
                };
                if let Err(err) = operation.execute(&scope) {
                    let mut failure = failure.lock();
                    // Cancellation errors only stand in until the failure that
                    // caused them is recorded.
                    let replace = match &*failure {
                        None => true,
                        Some(ResourceError::Cancelled { .. }) => {
                            !matches!(err, ResourceError::Cancelled { .. })
                        }
                        Some(_) => false,
                    };
                    if replace {
                        *failure = Some(err);
                    }
                    drop(failure);
                    scope.cancel();
                }
            }
        };

        let panic = thread::scope(|s| {
            let drain = &drain;
            let mut handles = Vec::with_capacity(workers.saturating_sub(1));
            for index in 1..workers {
                let spawned = thread::Builder::new()
                    .name(format!("flinch-load-{}", index))
                    .spawn_scoped(s, drain);
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        tracing::warn!(
                            "Resource system '{}' could not spawn load worker {}: {}",
                            self.name,
                            index,
                            err
                        );
                        break;
                    }
                }
            }

            drain();

            let mut panic = None;
            for handle in handles {
                if let Err(payload) = handle.join() {
                    panic.get_or_insert(payload);
                }
            }
            panic
        });

        if let Some(payload) = panic {
            std::panic::resume_unwind(payload);
        }

        match failure.into_inner() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Upper bound on the threads [`load`](Self::load) runs operations on.
    pub fn worker_limit() -> usize {
        num_cpus::get().max(1)
    }
}

impl fmt::Debug for ResourceSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceSystem")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("assets", &self.manifest.read().len())
            .field("has_filesystem", &self.has_filesystem())
            .finish()
    }
}

static_assertions::assert_impl_all!(ResourceSystem: Send, Sync);
static_assertions::assert_impl_all!(LoadingOperation<'static>: Send);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryFs;

    fn test_system(options: ResourceSystemOptions) -> ResourceSystem {
        let manifest: AssetManifest = [
            (Asset::new(1), "static/a.bin"),
            (Asset::new(2), "static/b.bin"),
        ]
        .into_iter()
        .collect();
        ResourceSystem::new("test", manifest, options)
    }

    #[test]
    fn test_batch_ids_are_unique() {
        let system = test_system(ResourceSystemOptions::default());
        let first = system.next_batch_id();
        let second = system.next_batch_id();
        assert_ne!(first, second);
        assert!(second > first);
    }

    #[test]
    fn test_resolve_path_trims_root() {
        let plain = test_system(ResourceSystemOptions::default());
        assert_eq!(plain.resolve_path(Asset::new(1)).as_deref(), Some("static/a.bin"));

        let trimmed = test_system(ResourceSystemOptions::new().trim_root(true));
        assert_eq!(trimmed.resolve_path(Asset::new(1)).as_deref(), Some("a.bin"));
        assert_eq!(trimmed.resolve_path(Asset::new(3)), None);
    }

    #[test]
    fn test_single_segment_path_is_not_trimmed() {
        let manifest: AssetManifest = [(Asset::new(1), "a.bin")].into_iter().collect();
        let system =
            ResourceSystem::new("test", manifest, ResourceSystemOptions::new().trim_root(true));
        assert_eq!(system.resolve_path(Asset::new(1)).as_deref(), Some("a.bin"));
    }

    #[test]
    fn test_filesystem_can_be_unlinked() {
        let system = test_system(ResourceSystemOptions::default())
            .with_filesystem(MemoryFs::new().with_file("static/a.bin", vec![1u8]));
        assert!(system.has_filesystem());
        assert_eq!(system.read_bytes(Asset::new(1)).unwrap(), vec![1]);

        system.set_filesystem(None);
        assert!(system.read_bytes(Asset::new(1)).unwrap_err().is_missing_filesystem());
    }

    #[test]
    fn test_set_manifest_replaces_lookup() {
        let system = test_system(ResourceSystemOptions::default());
        assert!(system.contains(Asset::new(1)));

        system.set_manifest([(Asset::new(5), "c.bin")].into_iter().collect());
        assert!(!system.contains(Asset::new(1)));
        assert!(system.contains(Asset::new(5)));
    }

    #[test]
    #[should_panic(expected = "not in manifest")]
    fn test_locking_unknown_asset_panics() {
        let system = test_system(ResourceSystemOptions::default());
        let batch = system.next_batch_id();
        let _lock = system.lock_asset(batch, Asset::new(99));
    }
}
