//! Asset source implementations
//!
//! The asset source is the external collaborator that owns the actual
//! imagery and meshes. Production uses the HTTP source against the asset
//! service; the directory source serves a local folder for offline runs and
//! tests.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use url::Url;

use super::{AssetError, AssetId, AssetResult};

/// Anything that can produce the raw bytes behind an asset ID.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, id: AssetId) -> AssetResult<Bytes>;
}

/// Fetches assets over HTTP as `{base_url}/{id}`.
pub struct HttpAssetSource {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAssetSource {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn asset_url(&self, id: AssetId) -> AssetResult<Url> {
        self.base_url
            .join(&id.to_string())
            .map_err(|e| AssetError::Fetch { id, reason: e.to_string() })
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch(&self, id: AssetId) -> AssetResult<Bytes> {
        let url = self.asset_url(id)?;
        debug!("fetching asset {} from {}", id, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AssetError::Fetch { id, reason: e.to_string() })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AssetError::NotFound { id });
        }
        let response = response
            .error_for_status()
            .map_err(|e| AssetError::Fetch { id, reason: e.to_string() })?;

        response
            .bytes()
            .await
            .map_err(|e| AssetError::Fetch { id, reason: e.to_string() })
    }
}

/// Serves assets from a local directory, looking for `{id}.png` first and
/// `{id}.tga` as the fallback.
pub struct DirAssetSource {
    root: PathBuf,
}

impl DirAssetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl AssetSource for DirAssetSource {
    async fn fetch(&self, id: AssetId) -> AssetResult<Bytes> {
        for extension in ["png", "tga"] {
            let path = self.root.join(format!("{id}.{extension}"));
            match tokio::fs::read(&path).await {
                Ok(data) => {
                    debug!("loaded asset {} from {:?}", id, path);
                    return Ok(Bytes::from(data));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(AssetError::Fetch { id, reason: e.to_string() });
                }
            }
        }
        Err(AssetError::NotFound { id })
    }
}
