//! Error types for the resource system.
//!
//! Two tiers exist. [`ResourceError`] values are ordinary, recoverable
//! failures returned to the caller. [`LockViolation`]s are contract
//! violations by the calling code; they are never returned, the resource
//! system panics with their message instead.

use std::fmt;

use crate::asset::Asset;
use crate::operation::BatchId;

/// Recoverable errors produced while loading resources.
#[derive(Debug)]
pub enum ResourceError {
    /// The asset has no entry in the system's manifest.
    NotInManifest {
        /// Name of the resource system.
        system: String,
        /// The requested asset.
        asset: Asset,
    },

    /// No filesystem adapter is linked to the resource system.
    MissingFileSystem {
        /// Name of the resource system.
        system: String,
    },

    /// The filesystem adapter failed to read the asset's file.
    Io {
        /// Name of the resource system.
        system: String,
        /// The asset being read.
        asset: Asset,
        /// The resolved path handed to the adapter.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// A task had nothing to do. Never aborts a loading operation.
    Skipped,

    /// The operation's scope was cancelled before it finished.
    Cancelled {
        /// The cancelled batch.
        batch: BatchId,
    },

    /// A loading task failed after reading its bytes (e.g. while decoding).
    Loader {
        /// The asset the task was processing.
        asset: Asset,
        /// Description of the error.
        message: String,
    },
}

impl ResourceError {
    /// Returns `true` for the "nothing to do" sentinel.
    pub fn is_skipped(&self) -> bool {
        matches!(self, ResourceError::Skipped)
    }

    /// Returns `true` if the asset is unknown to the manifest.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResourceError::NotInManifest { .. })
    }

    /// Returns `true` if no filesystem was linked.
    pub fn is_missing_filesystem(&self) -> bool {
        matches!(self, ResourceError::MissingFileSystem { .. })
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotInManifest { system, asset } => {
                write!(f, "asset {} not found in manifest of '{}'", asset, system)
            }
            ResourceError::MissingFileSystem { system } => {
                write!(f, "missing filesystem for resource system '{}'", system)
            }
            ResourceError::Io {
                system,
                asset,
                path,
                source,
            } => {
                write!(
                    f,
                    "failed to read asset {} ('{}') from '{}': {}",
                    asset, path, system, source
                )
            }
            ResourceError::Skipped => write!(f, "resource loading skipped"),
            ResourceError::Cancelled { batch } => {
                write!(f, "loading operation {} was cancelled", batch)
            }
            ResourceError::Loader { asset, message } => {
                write!(f, "failed to load asset {}: {}", asset, message)
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Misuse of the locking contract.
///
/// These indicate a bug in the calling code, not a runtime condition, and are
/// raised as panics carrying the `Display` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockViolation {
    /// A lock was requested for an asset the manifest does not know.
    UnknownAsset {
        /// The requested asset.
        asset: Asset,
    },

    /// A batch requested a second lock while still holding one.
    BatchAlreadyLocked {
        /// The offending batch.
        batch: BatchId,
        /// The asset the batch already holds.
        held: Asset,
        /// The asset that was requested.
        requested: Asset,
    },

    /// A lock was released more than once.
    DoubleRelease {
        /// The batch that owned the lock.
        batch: BatchId,
        /// The asset the lock guarded.
        asset: Asset,
    },
}

impl fmt::Display for LockViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockViolation::UnknownAsset { asset } => {
                write!(f, "cannot lock asset {}: not in manifest", asset)
            }
            LockViolation::BatchAlreadyLocked {
                batch,
                held,
                requested,
            } => {
                write!(
                    f,
                    "batch {} already has an acquired asset lock (holds {}, requested {})",
                    batch, held, requested
                )
            }
            LockViolation::DoubleRelease { batch, asset } => {
                write!(
                    f,
                    "attempted to release an already released asset lock ({} in batch {})",
                    asset, batch
                )
            }
        }
    }
}

impl LockViolation {
    /// Log the violation and panic with its message.
    #[track_caller]
    pub(crate) fn raise(self) -> ! {
        tracing::error!("{}", self);
        panic!("{}", self)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_io_error_exposes_source() {
        let err = ResourceError::Io {
            system: "static".to_string(),
            asset: Asset::new(1),
            path: "a.bin".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };

        assert!(err.source().is_some());
        let text = err.to_string();
        assert!(text.contains("a.bin"));
        assert!(text.contains("static"));
    }

    #[test]
    fn test_sentinel_helpers() {
        assert!(ResourceError::Skipped.is_skipped());
        let missing = ResourceError::MissingFileSystem {
            system: "static".to_string(),
        };
        assert!(missing.is_missing_filesystem());
        assert!(!missing.is_skipped());
    }

    #[test]
    fn test_violation_messages() {
        let violation = LockViolation::BatchAlreadyLocked {
            batch: BatchId::new(3),
            held: Asset::new(1),
            requested: Asset::new(2),
        };
        assert!(violation.to_string().contains("already has an acquired asset lock"));

        let violation = LockViolation::DoubleRelease {
            batch: BatchId::new(3),
            asset: Asset::new(1),
        };
        assert!(violation.to_string().contains("already released"));
    }
}
