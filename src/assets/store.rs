//! Cached asset retrieval
//!
//! `AssetStore` pairs a source with the process cache and is the handle the
//! compositor and world loaders share. All fetches go through the cache.

use std::sync::Arc;

use bytes::Bytes;
use image::RgbaImage;

use super::{AssetCache, AssetError, AssetId, AssetResult, AssetSource, ImageFormat};

pub struct AssetStore {
    source: Arc<dyn AssetSource>,
    cache: AssetCache,
}

impl AssetStore {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self { source, cache: AssetCache::new() }
    }

    /// Raw bytes for an asset, from cache when possible.
    pub async fn fetch_bytes(&self, id: AssetId) -> AssetResult<Bytes> {
        if let Some(data) = self.cache.get(&id).await {
            return Ok(data);
        }
        let data = self.source.fetch(id).await?;
        self.cache.put(id, data.clone()).await;
        Ok(data)
    }

    /// Fetch and decode an asset as an RGBA image.
    pub async fn fetch_image(&self, id: AssetId) -> AssetResult<RgbaImage> {
        let data = self.fetch_bytes(id).await?;
        decode_image(id, &data)
    }

    pub async fn cache_stats(&self) -> super::CacheStats {
        self.cache.stats().await
    }
}

/// Decode an image blob, trusting the sniffed container format over file
/// naming (icon blobs arrive with no name at all).
pub fn decode_image(id: AssetId, data: &[u8]) -> AssetResult<RgbaImage> {
    decode_inline_image(data).map_err(|reason| AssetError::Decode { id, reason })
}

/// Decode an image blob that did not come through the asset source, such
/// as a community icon inlined in the data feed.
pub fn decode_inline_image(data: &[u8]) -> Result<RgbaImage, String> {
    let decoded = match ImageFormat::sniff(data) {
        Some(format) => image::load_from_memory_with_format(data, format.to_image_format()),
        None => image::load_from_memory(data),
    };
    decoded.map(|image| image.to_rgba8()).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::Rgba;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingSource {
        fetches: AtomicU32,
        payload: Bytes,
    }

    #[async_trait]
    impl AssetSource for CountingSource {
        async fn fetch(&self, id: AssetId) -> AssetResult<Bytes> {
            if id.0 == 404 {
                return Err(AssetError::NotFound { id });
            }
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.payload.clone())
        }
    }

    fn png_bytes() -> Bytes {
        let image = RgbaImage::from_pixel(3, 3, Rgba([9, 8, 7, 255]));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
        Bytes::from(buffer.into_inner())
    }

    #[tokio::test]
    async fn test_fetch_goes_through_cache() {
        let source = Arc::new(CountingSource { fetches: AtomicU32::new(0), payload: png_bytes() });
        let store = AssetStore::new(source.clone());

        store.fetch_bytes(AssetId(1)).await.unwrap();
        store.fetch_bytes(AssetId(1)).await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_image_decodes() {
        let source = Arc::new(CountingSource { fetches: AtomicU32::new(0), payload: png_bytes() });
        let store = AssetStore::new(source);

        let image = store.fetch_image(AssetId(2)).await.unwrap();
        assert_eq!(image.dimensions(), (3, 3));
        assert_eq!(image.get_pixel(1, 1).0, [9, 8, 7, 255]);
    }

    #[tokio::test]
    async fn test_missing_asset_propagates() {
        let source = Arc::new(CountingSource { fetches: AtomicU32::new(0), payload: png_bytes() });
        let store = AssetStore::new(source);
        let err = store.fetch_image(AssetId(404)).await.unwrap_err();
        assert!(matches!(err, AssetError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_decode_failure_reports_id() {
        let err = decode_image(AssetId(11), b"definitely not an image").unwrap_err();
        match err {
            AssetError::Decode { id, .. } => assert_eq!(id, AssetId(11)),
            other => panic!("unexpected error: {other}"),
        }
    }
}
