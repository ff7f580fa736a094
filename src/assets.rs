//! Image assets placed by the insert-image tool
//!
//! Decoding happens off the gesture path: the shell starts a load, the
//! tool shows a placeholder, and the decoded image is handed back with
//! `Editor::finish_asset_load`.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use futures::future::BoxFuture;
use image::RgbaImage;

/// Load state of one asset
#[derive(Debug, Clone)]
pub enum AssetState {
    Pending,
    Ready(Arc<RgbaImage>),
    Failed(String),
}

/// Decoded assets keyed by the name annotations refer to them by
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    assets: HashMap<String, AssetState>,
}

impl AssetStore {
    /// Mark an asset as loading
    pub fn begin(&mut self, key: &str) {
        self.assets.insert(key.to_string(), AssetState::Pending);
    }

    /// Record the outcome of a load
    ///
    /// Failures are logged and kept, so annotations using the asset keep
    /// showing their placeholder. Returns true if the asset is now ready.
    pub fn finish(&mut self, key: &str, result: anyhow::Result<RgbaImage>) -> bool {
        match result {
            Ok(image) => {
                log::debug!(
                    "Asset {key:?} ready ({}x{})",
                    image.width(),
                    image.height()
                );
                self.assets
                    .insert(key.to_string(), AssetState::Ready(Arc::new(image)));
                true
            }
            Err(err) => {
                log::warn!("Failed to load asset {key:?}: {err:#}");
                self.assets
                    .insert(key.to_string(), AssetState::Failed(format!("{err:#}")));
                false
            }
        }
    }

    /// Insert an already decoded image
    pub fn insert(&mut self, key: &str, image: RgbaImage) {
        self.assets
            .insert(key.to_string(), AssetState::Ready(Arc::new(image)));
    }

    pub fn get(&self, key: &str) -> Option<&AssetState> {
        self.assets.get(key)
    }

    /// Pixels of a decoded asset
    pub fn ready(&self, key: &str) -> Option<Arc<RgbaImage>> {
        match self.assets.get(key)? {
            AssetState::Ready(image) => Some(Arc::clone(image)),
            _ => None,
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        matches!(self.assets.get(key), Some(AssetState::Pending))
    }
}

/// Decode encoded image bytes (PNG, JPEG, WebP...) into RGBA pixels
pub async fn decode_image(bytes: Vec<u8>) -> anyhow::Result<RgbaImage> {
    let image = image::load_from_memory(&bytes).context("Failed to decode image asset")?;
    Ok(image.to_rgba8())
}

/// Source of encoded asset bytes (filesystem, network, extension storage)
pub trait AssetFetcher {
    fn fetch<'a>(&'a self, key: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<u8>>>;
}

/// Fetch and decode one asset
pub async fn load_asset(fetcher: &dyn AssetFetcher, key: &str) -> anyhow::Result<RgbaImage> {
    let bytes = fetcher
        .fetch(key)
        .await
        .with_context(|| format!("Failed to fetch asset {key:?}"))?;
    decode_image(bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::io::Cursor;

    struct MapFetcher(HashMap<String, Vec<u8>>);

    impl AssetFetcher for MapFetcher {
        fn fetch<'a>(&'a self, key: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<u8>>> {
            let result = self
                .0
                .get(key)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such asset"));
            async move { result }.boxed()
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_load_asset_decodes() {
        let fetcher = MapFetcher(HashMap::from([("logo".to_string(), png_bytes())]));
        let image = futures::executor::block_on(load_asset(&fetcher, "logo")).unwrap();
        assert_eq!(image.dimensions(), (3, 2));
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3, 255]);
    }

    #[test]
    fn test_failed_load_is_recorded() {
        let fetcher = MapFetcher(HashMap::new());
        let mut store = AssetStore::default();
        store.begin("missing");
        assert!(store.is_pending("missing"));
        let result = futures::executor::block_on(load_asset(&fetcher, "missing"));
        assert!(!store.finish("missing", result));
        assert!(matches!(store.get("missing"), Some(AssetState::Failed(_))));
        assert!(store.ready("missing").is_none());
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let result = futures::executor::block_on(decode_image(vec![0, 1, 2, 3]));
        assert!(result.is_err());
    }
}
