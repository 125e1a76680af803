//! Batch loading example.
//!
//! This example demonstrates:
//! - Building a manifest from file names
//! - Loading through single operations and through parallel `load`
//! - Skipping assets that are already cached
//! - Handling a missing filesystem

use std::collections::HashMap;
use std::sync::Mutex;

use flinch_resources::prelude::*;

/// Decoded "sprites": here just the byte length of each file.
#[derive(Default)]
struct SpriteCache {
    sprites: Mutex<HashMap<Asset, usize>>,
}

impl SpriteCache {
    fn loader(&self, asset: Asset) -> flinch_resources::BoxedTask<'_> {
        task(move |ctx| {
            let mut lock = ctx.lock(asset);
            if self.sprites.lock().unwrap().contains_key(&asset) {
                lock.release();
                return Err(ResourceError::Skipped);
            }

            let bytes = ctx.read_bytes(asset);
            lock.release();

            let bytes = bytes?;
            if bytes.is_empty() {
                return Err(ResourceError::Loader {
                    asset,
                    message: "empty sprite".to_string(),
                });
            }

            self.sprites.lock().unwrap().insert(asset, bytes.len());
            Ok(())
        })
    }
}

fn main() {
    flinch_core::logging::init();

    let mut manifest = AssetManifest::new();
    let mut fs = MemoryFs::new();
    let mut assets = Vec::new();
    for i in 0..16 {
        let path = format!("sprites/tile_{:04}.png", i);
        fs.insert(path.clone(), vec![0x89; 64 * (i + 1)]);
        assets.push(manifest.register(path));
    }

    let system = ResourceSystem::new(
        "sprites",
        manifest,
        ResourceSystemOptions::new().batch_size(4),
    )
    .with_filesystem(fs);
    let cache = SpriteCache::default();

    // One operation, sequential.
    let mut boot = system.create_batch([cache.loader(assets[0]), cache.loader(assets[0])]);
    match boot.execute(&CancelScope::new()) {
        Ok(()) => tracing::info!("Boot batch {} loaded", boot.batch()),
        Err(err) => tracing::error!("Boot batch failed: {}", err),
    }

    // Everything, four tasks per parallel operation.
    let tasks = assets.iter().map(|&asset| cache.loader(asset)).collect();
    if let Err(err) = system.load(tasks) {
        tracing::error!("Loading failed: {}", err);
    }
    tracing::info!("{} sprites cached", cache.sprites.lock().unwrap().len());

    // Reads fail cleanly once the filesystem is gone.
    system.set_filesystem(None);
    if let Err(err) = system.read_bytes(assets[1]) {
        tracing::warn!("Expected failure: {}", err);
    }
}
