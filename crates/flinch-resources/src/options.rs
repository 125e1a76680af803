//! Configuration for a resource system.

/// Options recognized by [`ResourceSystem::new`](crate::ResourceSystem::new).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSystemOptions {
    /// Strip the first path segment of manifest paths before reading.
    ///
    /// Some filesystems are rooted one directory below the one the manifest
    /// was generated from, so `tiles/grass.png` must be read as `grass.png`.
    pub trim_root: bool,

    /// Number of tasks per operation when loading through
    /// [`ResourceSystem::load`](crate::ResourceSystem::load).
    ///
    /// Operations run in parallel. `0` puts every task into a single
    /// operation, which then runs sequentially.
    pub batch_size: usize,
}

impl ResourceSystemOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trim_root(mut self, trim_root: bool) -> Self {
        self.trim_root = trim_root;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}
