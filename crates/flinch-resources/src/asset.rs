//! Asset identifiers and the manifest that maps them to files.

use std::fmt;
use std::path::Path;

use flinch_core::alloc::HashMap;
use flinch_core::hash::fnv1a_64_str;

/// Opaque identifier of a loadable asset.
///
/// Only meaningful relative to the manifest of a specific resource system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Asset(u64);

impl Asset {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Derive the identifier from a file name, the same way the manifest
    /// generator does.
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a_64_str(name))
    }

    pub const fn id(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Asset {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

/// Relative path of an asset inside a filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetPath(String);

impl AssetPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetPath {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

impl From<String> for AssetPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl AsRef<str> for AssetPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static mapping from [`Asset`] to its relative file path.
///
/// Built once at startup and treated as immutable afterwards.
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    entries: HashMap<Asset, AssetPath>,
}

impl AssetManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Map `asset` to `path`, returning the previous path if there was one.
    pub fn insert(&mut self, asset: Asset, path: impl Into<AssetPath>) -> Option<AssetPath> {
        self.entries.insert(asset, path.into())
    }

    /// Add `path` keyed by the hash of its file name and return the new id.
    ///
    /// Two files with the same name in different directories collide; the
    /// later registration wins.
    pub fn register(&mut self, path: impl Into<AssetPath>) -> Asset {
        let path = path.into();
        let name = Path::new(path.as_str())
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(path.as_str());
        let asset = Asset::from_name(name);

        if let Some(previous) = self.entries.insert(asset, path) {
            tracing::warn!("Asset {} re-registered, replacing '{}'", asset, previous);
        }
        asset
    }

    pub fn get(&self, asset: Asset) -> Option<&AssetPath> {
        self.entries.get(&asset)
    }

    pub fn contains(&self, asset: Asset) -> bool {
        self.entries.contains_key(&asset)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (Asset, &AssetPath)> + '_ {
        self.entries.iter().map(|(asset, path)| (*asset, path))
    }

    /// All known assets, in unspecified order.
    pub fn assets(&self) -> impl Iterator<Item = Asset> + '_ {
        self.entries.keys().copied()
    }
}

impl<P: Into<AssetPath>> FromIterator<(Asset, P)> for AssetManifest {
    fn from_iter<I: IntoIterator<Item = (Asset, P)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(asset, path)| (asset, path.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_lookup() {
        let manifest: AssetManifest = [(Asset::new(1), "a.bin"), (Asset::new(2), "b.bin")]
            .into_iter()
            .collect();

        assert_eq!(manifest.len(), 2);
        assert!(manifest.contains(Asset::new(1)));
        assert!(!manifest.contains(Asset::new(3)));
        assert_eq!(manifest.get(Asset::new(2)).map(AssetPath::as_str), Some("b.bin"));
    }

    #[test]
    fn test_register_hashes_file_name() {
        let mut manifest = AssetManifest::new();
        let asset = manifest.register("tiles/tile_0000.png");

        assert_eq!(asset, Asset::from_name("tile_0000.png"));
        assert_eq!(
            manifest.get(asset).map(AssetPath::as_str),
            Some("tiles/tile_0000.png")
        );
    }

    #[test]
    fn test_asset_display_is_fixed_width_hex() {
        assert_eq!(Asset::new(0xff).to_string(), "0x00000000000000ff");
    }
}
