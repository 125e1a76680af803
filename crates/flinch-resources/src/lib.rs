//! Flinch resource system.
//!
//! Maps opaque [`Asset`] ids to raw file bytes through an injected
//! [`FileSystem`], with one mutex per asset so independent loads can run in
//! parallel without stepping on each other.
//!
//! Work is organised in [`LoadingOperation`]s (batches). Every task of a batch
//! receives a [`LoaderContext`] through which it locks assets and reads bytes.
//! A batch may hold at most one asset lock at a time, which rules out lock
//! ordering deadlocks between tasks. Breaking that rule, locking an asset the
//! manifest does not know, or releasing a lock twice is a bug in the caller
//! and panics.
//!
//! Decoding and caching the bytes is left to the caller.

pub mod asset;
pub mod context;
pub mod error;
pub mod io;
mod lock;
pub mod operation;
pub mod options;
pub mod system;

pub use asset::{Asset, AssetManifest, AssetPath};
pub use context::{CancelScope, LoaderContext};
pub use error::{LockViolation, ResourceError, ResourceResult};
#[cfg(not(target_arch = "wasm32"))]
pub use io::DirectoryFs;
pub use io::{FileSystem, MemoryFs};
pub use lock::AssetLock;
pub use operation::{BatchId, BoxedTask, LoadingOperation, LoadingTask, task};
pub use options::ResourceSystemOptions;
pub use system::ResourceSystem;

pub mod prelude {
    pub use crate::asset::{Asset, AssetManifest};
    pub use crate::context::{CancelScope, LoaderContext};
    pub use crate::error::{ResourceError, ResourceResult};
    pub use crate::io::{FileSystem, MemoryFs};
    pub use crate::operation::{BatchId, LoadingOperation, task};
    pub use crate::options::ResourceSystemOptions;
    pub use crate::system::ResourceSystem;

    #[cfg(not(target_arch = "wasm32"))]
    pub use crate::io::DirectoryFs;
}
