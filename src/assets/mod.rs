//! Asset addressing, caching and retrieval
//!
//! The asset source is an external collaborator that serves feature mask
//! images, humanoid meshes and icon blobs, keyed by numeric ID. This module
//! owns the ID scheme, a process-scoped byte cache and the fetch seam the
//! compositor and world loaders go through.

pub mod cache;
pub mod source;
pub mod store;

pub use cache::{AssetCache, CacheStats};
pub use source::{AssetSource, DirAssetSource, HttpAssetSource};
pub use store::AssetStore;

use std::fmt;

use thiserror::Error;

/// Numeric asset address understood by the asset source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u32);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Face part image IDs: one contiguous block per feature category, addressed
// as base + shape index. The mole has a single fixed image.
pub const EYE_BASE_ID: u32 = 0;
pub const EYEBROW_BASE_ID: u32 = 60;
pub const NOSE_BASE_ID: u32 = 84;
pub const MOUTH_BASE_ID: u32 = 102;
pub const MUSTACHE_BASE_ID: u32 = 138;
pub const GLASSES_BASE_ID: u32 = 144;
pub const MOLE_ID: u32 = 153;

// Mesh IDs for the humanoid parts the renderer assembles around the face.
pub const BODY_MESH_ID: u32 = 200;
pub const HEAD_MESH_ID: u32 = 201;
pub const HAIR_MESH_BASE_ID: u32 = 210;
pub const BEARD_MESH_BASE_ID: u32 = 300;

/// Address a feature mask image by category base and shape index.
pub fn face_part_id(base: u32, shape_index: u32) -> AssetId {
    AssetId(base + shape_index)
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset {id} not found")]
    NotFound { id: AssetId },

    #[error("asset {id} fetch failed: {reason}")]
    Fetch { id: AssetId, reason: String },

    #[error("asset {id} decode failed: {reason}")]
    Decode { id: AssetId, reason: String },
}

pub type AssetResult<T> = Result<T, AssetError>;

/// Image container formats the asset source may serve. Community icons
/// arrive as TGA blobs, face parts as PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Tga,
    Jpeg,
}

impl ImageFormat {
    /// Detect format from the blob header.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG signature
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(ImageFormat::Png);
        }

        // JPEG signature
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // TGA has no magic; type byte 2 is uncompressed truecolor
        if data.len() >= 18 && data[1] <= 1 && data[2] == 2 {
            return Some(ImageFormat::Tga);
        }

        None
    }

    pub fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Tga => image::ImageFormat::Tga,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_part_id() {
        assert_eq!(face_part_id(EYE_BASE_ID, 7), AssetId(7));
        assert_eq!(face_part_id(MOUTH_BASE_ID, 3), AssetId(105));
    }

    #[test]
    fn test_sniff_png() {
        let header = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(ImageFormat::sniff(&header), Some(ImageFormat::Png));
    }

    #[test]
    fn test_sniff_tga() {
        let mut header = [0u8; 18];
        header[2] = 2;
        assert_eq!(ImageFormat::sniff(&header), Some(ImageFormat::Tga));
    }

    #[test]
    fn test_sniff_unknown() {
        assert_eq!(ImageFormat::sniff(&[1, 2, 3, 4, 5]), None);
        assert_eq!(ImageFormat::sniff(&[0x89]), None);
    }
}
