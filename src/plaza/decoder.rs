//! Descriptor blob decoding seam
//!
//! The wire format of the avatar descriptor blob belongs to the upstream
//! service; decoding it is not this crate's business. `DescriptorDecoder`
//! is the seam a real format decoder plugs into. `SeededDecoder` is the
//! shipped stand-in: it derives a stable, valid descriptor from a hash of
//! the blob so the full pipeline runs end to end without the format.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::face::descriptor::{
    AvatarDescriptor, BEARD_TYPES, EYEBROW_TYPES, EYE_TYPES, GLASSES_TYPES, HAIR_TYPES,
    MOLE_X_MAX, MOLE_Y_MAX, MOUTH_TYPES, MUSTACHE_TYPES, NOSE_TYPES, ROTATION_MAX, SCALE_MAX,
    SPACING_MAX, Y_POSITION_MAX, Y_STRETCH_MAX,
};
use crate::face::palette;

use super::PlazaResult;

/// Converts a raw descriptor blob into the decoded record the compositor
/// consumes.
pub trait DescriptorDecoder: Send + Sync {
    fn decode(&self, blob: &[u8]) -> PlazaResult<AvatarDescriptor>;
}

/// Deterministic stand-in decoder: the same blob always yields the same
/// descriptor, and every descriptor it yields validates.
pub struct SeededDecoder;

impl DescriptorDecoder for SeededDecoder {
    fn decode(&self, blob: &[u8]) -> PlazaResult<AvatarDescriptor> {
        let mut rng = StdRng::seed_from_u64(fnv1a(blob));
        Ok(AvatarDescriptor {
            eye_type: rng.random_range(0..EYE_TYPES),
            eyebrow_type: rng.random_range(0..EYEBROW_TYPES),
            nose_type: rng.random_range(0..NOSE_TYPES),
            mouth_type: rng.random_range(0..MOUTH_TYPES),
            mustache_type: rng.random_range(0..MUSTACHE_TYPES),
            glasses_type: rng.random_range(0..GLASSES_TYPES),
            beard_type: rng.random_range(0..BEARD_TYPES),
            hair_type: rng.random_range(0..HAIR_TYPES),
            skin_color: rng.random_range(0..palette::SKIN_COLORS.len() as u32),
            hair_color: rng.random_range(0..palette::HAIR_COLORS.len() as u32),
            eye_color: rng.random_range(0..palette::EYE_COLORS.len() as u32),
            mouth_color: rng.random_range(0..palette::MOUTH_COLORS.len() as u32),
            glasses_color: rng.random_range(0..palette::GLASSES_COLORS.len() as u32),
            favorite_color: rng.random_range(0..palette::FAVORITE_COLORS.len() as u32),
            eye_scale: rng.random_range(0..=SCALE_MAX),
            eye_y_stretch: rng.random_range(0..=Y_STRETCH_MAX),
            eye_rotation: rng.random_range(0..=ROTATION_MAX),
            eye_spacing: rng.random_range(0..=SPACING_MAX),
            eye_y_position: rng.random_range(0..=Y_POSITION_MAX),
            eyebrow_scale: rng.random_range(0..=SCALE_MAX),
            eyebrow_y_stretch: rng.random_range(0..=Y_STRETCH_MAX),
            eyebrow_rotation: rng.random_range(0..=ROTATION_MAX),
            eyebrow_spacing: rng.random_range(0..=SPACING_MAX),
            eyebrow_y_position: rng.random_range(0..=Y_POSITION_MAX),
            nose_scale: rng.random_range(0..=SCALE_MAX),
            nose_y_position: rng.random_range(0..=Y_POSITION_MAX),
            mouth_scale: rng.random_range(0..=SCALE_MAX),
            mouth_y_stretch: rng.random_range(0..=Y_STRETCH_MAX),
            mouth_y_position: rng.random_range(0..=Y_POSITION_MAX),
            mustache_scale: rng.random_range(0..=SCALE_MAX),
            mustache_spacing: rng.random_range(0..=SPACING_MAX),
            mustache_y_position: rng.random_range(0..=Y_POSITION_MAX),
            glasses_scale: rng.random_range(0..=SCALE_MAX),
            glasses_spacing: rng.random_range(0..=SPACING_MAX),
            glasses_y_position: rng.random_range(0..=Y_POSITION_MAX),
            mole_enabled: rng.random_bool(0.2),
            mole_scale: rng.random_range(0..=SCALE_MAX),
            mole_x: rng.random_range(0..=MOLE_X_MAX),
            mole_y: rng.random_range(0..=MOLE_Y_MAX),
        })
    }
}

fn fnv1a(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_decoder_is_deterministic() {
        let decoder = SeededDecoder;
        let a = decoder.decode(b"same blob").unwrap();
        let b = decoder.decode(b"same blob").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_seeded_decoder_varies_with_blob() {
        let decoder = SeededDecoder;
        let a = decoder.decode(b"blob one").unwrap();
        let b = decoder.decode(b"blob two").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_seeded_descriptors_always_validate() {
        let decoder = SeededDecoder;
        for seed in 0..64u32 {
            let descriptor = decoder.decode(&seed.to_le_bytes()).unwrap();
            assert!(descriptor.validate().is_ok());
        }
    }
}
