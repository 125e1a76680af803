//! Filesystem adapters the resource system reads through.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flinch_core::alloc::HashMap;

/// Read access to files at relative paths.
///
/// Implementations are injected into a resource system, so tests and embedded
/// builds can substitute virtual filesystems for the OS one.
pub trait FileSystem: Send + Sync {
    /// Read the whole file at `path`.
    fn read(&self, path: &str) -> io::Result<Vec<u8>>;

    /// Check if a file exists at `path`.
    fn exists(&self, path: &str) -> bool;
}

impl<F: FileSystem + ?Sized> FileSystem for Arc<F> {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        (**self).read(path)
    }

    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }
}

/// Host filesystem rooted at a base directory.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct DirectoryFs {
    /// Base path for relative paths.
    base_path: PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl DirectoryFs {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl FileSystem for DirectoryFs {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve_path(path))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve_path(path).is_file()
    }
}

/// In-memory filesystem for tests or embedded assets.
#[derive(Debug, Default)]
pub struct MemoryFs {
    /// Stored bytes keyed by path string.
    files: HashMap<String, Arc<[u8]>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add bytes for a path, replacing any previous contents.
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Add bytes from static data.
    pub fn insert_static(&mut self, path: impl Into<String>, bytes: &'static [u8]) {
        self.files.insert(path.into(), Arc::from(bytes));
    }

    /// Chained form of [`MemoryFs::insert`].
    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn remove(&mut self, path: &str) -> Option<Arc<[u8]>> {
        self.files.remove(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FileSystem for MemoryFs {
    fn read(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files.get(path).map(|bytes| bytes.to_vec()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file in memory filesystem: {}", path),
            )
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_fs_read() {
        let fs = MemoryFs::new().with_file("a.bin", vec![1u8, 2, 3]);

        assert!(fs.exists("a.bin"));
        assert_eq!(fs.read("a.bin").unwrap(), vec![1, 2, 3]);

        let err = fs.read("b.bin").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_memory_fs_remove() {
        let mut fs = MemoryFs::new();
        fs.insert_static("logo.png", b"PNG");
        assert_eq!(fs.len(), 1);

        assert!(fs.remove("logo.png").is_some());
        assert!(fs.is_empty());
        assert!(!fs.exists("logo.png"));
    }

    #[test]
    fn test_directory_fs_resolves_relative_paths() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(temp_dir.path().join("tiles")).unwrap();
        std::fs::write(temp_dir.path().join("tiles/grass.png"), b"grass").unwrap();

        let fs = DirectoryFs::new(temp_dir.path());
        assert!(fs.exists("tiles/grass.png"));
        assert!(!fs.exists("tiles"));
        assert_eq!(fs.read("tiles/grass.png").unwrap(), b"grass");
        assert!(fs.read("tiles/water.png").is_err());
    }

    #[test]
    fn test_shared_adapter() {
        let fs: Arc<dyn FileSystem> = Arc::new(MemoryFs::new().with_file("a.bin", vec![9u8]));
        let shared = Arc::clone(&fs);
        assert_eq!(shared.read("a.bin").unwrap(), vec![9]);
    }
}
