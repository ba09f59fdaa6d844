//! Decoded avatar descriptor
//!
//! The compact record of feature shape indices, palette indices and geometry
//! sliders that parameterizes face composition. Wire-format decoding happens
//! upstream; this type only carries the already-decoded values and enforces
//! their bounds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::palette;

/// Number of selectable shapes per feature category.
pub const EYE_TYPES: u32 = 60;
pub const EYEBROW_TYPES: u32 = 24;
pub const NOSE_TYPES: u32 = 18;
pub const MOUTH_TYPES: u32 = 36;
pub const MUSTACHE_TYPES: u32 = 6;
pub const GLASSES_TYPES: u32 = 9;
pub const BEARD_TYPES: u32 = 6;
pub const HAIR_TYPES: u32 = 72;

/// Slider ranges. Scale-like sliders sit on a center value; position sliders
/// are offsets from a feature anchor except the mole, which is absolute.
pub const SCALE_MAX: u32 = 8;
pub const Y_STRETCH_MAX: u32 = 6;
pub const ROTATION_MAX: u32 = 8;
pub const SPACING_MAX: u32 = 12;
pub const Y_POSITION_MAX: u32 = 18;
pub const MOLE_X_MAX: u32 = 16;
pub const MOLE_Y_MAX: u32 = 30;

/// A descriptor field held an index outside its palette or slider range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("descriptor field `{field}` out of range: {value} (max {max})")]
pub struct ValidationError {
    pub field: &'static str,
    pub value: u32,
    pub max: u32,
}

/// Immutable per-avatar feature selection.
///
/// All index fields must satisfy `value < bound` (`value <= max` for
/// sliders); [`AvatarDescriptor::validate`] reports the first violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarDescriptor {
    // Feature shapes
    pub eye_type: u32,
    pub eyebrow_type: u32,
    pub nose_type: u32,
    pub mouth_type: u32,
    pub mustache_type: u32,
    pub glasses_type: u32,
    pub beard_type: u32,
    pub hair_type: u32,

    // Palette indices
    pub skin_color: u32,
    pub hair_color: u32,
    pub eye_color: u32,
    pub mouth_color: u32,
    pub glasses_color: u32,
    pub favorite_color: u32,

    // Eye geometry
    pub eye_scale: u32,
    pub eye_y_stretch: u32,
    pub eye_rotation: u32,
    pub eye_spacing: u32,
    pub eye_y_position: u32,

    // Eyebrow geometry
    pub eyebrow_scale: u32,
    pub eyebrow_y_stretch: u32,
    pub eyebrow_rotation: u32,
    pub eyebrow_spacing: u32,
    pub eyebrow_y_position: u32,

    // Nose geometry
    pub nose_scale: u32,
    pub nose_y_position: u32,

    // Mouth geometry
    pub mouth_scale: u32,
    pub mouth_y_stretch: u32,
    pub mouth_y_position: u32,

    // Mustache geometry
    pub mustache_scale: u32,
    pub mustache_spacing: u32,
    pub mustache_y_position: u32,

    // Glasses geometry
    pub glasses_scale: u32,
    pub glasses_spacing: u32,
    pub glasses_y_position: u32,

    // Mole
    pub mole_enabled: bool,
    pub mole_scale: u32,
    pub mole_x: u32,
    pub mole_y: u32,
}

impl Default for AvatarDescriptor {
    fn default() -> Self {
        Self {
            eye_type: 0,
            eyebrow_type: 0,
            nose_type: 0,
            mouth_type: 0,
            mustache_type: 0,
            glasses_type: 0,
            beard_type: 0,
            hair_type: 0,
            skin_color: 0,
            hair_color: 0,
            eye_color: 0,
            mouth_color: 0,
            glasses_color: 0,
            favorite_color: 0,
            eye_scale: 4,
            eye_y_stretch: 3,
            eye_rotation: 4,
            eye_spacing: 2,
            eye_y_position: 12,
            eyebrow_scale: 4,
            eyebrow_y_stretch: 3,
            eyebrow_rotation: 4,
            eyebrow_spacing: 2,
            eyebrow_y_position: 12,
            nose_scale: 4,
            nose_y_position: 12,
            mouth_scale: 4,
            mouth_y_stretch: 3,
            mouth_y_position: 12,
            mustache_scale: 4,
            mustache_spacing: 2,
            mustache_y_position: 12,
            glasses_scale: 4,
            glasses_spacing: 2,
            glasses_y_position: 12,
            mole_enabled: false,
            mole_scale: 4,
            mole_x: 2,
            mole_y: 20,
        }
    }
}

impl AvatarDescriptor {
    /// Check every index and slider against its bound.
    ///
    /// Returns the first offending field. Compositing an unvalidated
    /// descriptor would index a palette out of bounds, so the compositor
    /// calls this before doing any work.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let index_checks: [(&'static str, u32, u32); 14] = [
            ("eye_type", self.eye_type, EYE_TYPES),
            ("eyebrow_type", self.eyebrow_type, EYEBROW_TYPES),
            ("nose_type", self.nose_type, NOSE_TYPES),
            ("mouth_type", self.mouth_type, MOUTH_TYPES),
            ("mustache_type", self.mustache_type, MUSTACHE_TYPES),
            ("glasses_type", self.glasses_type, GLASSES_TYPES),
            ("beard_type", self.beard_type, BEARD_TYPES),
            ("hair_type", self.hair_type, HAIR_TYPES),
            ("skin_color", self.skin_color, palette::SKIN_COLORS.len() as u32),
            ("hair_color", self.hair_color, palette::HAIR_COLORS.len() as u32),
            ("eye_color", self.eye_color, palette::EYE_COLORS.len() as u32),
            ("mouth_color", self.mouth_color, palette::MOUTH_COLORS.len() as u32),
            ("glasses_color", self.glasses_color, palette::GLASSES_COLORS.len() as u32),
            ("favorite_color", self.favorite_color, palette::FAVORITE_COLORS.len() as u32),
        ];
        for (field, value, bound) in index_checks {
            if value >= bound {
                return Err(ValidationError { field, value, max: bound - 1 });
            }
        }

        let slider_checks: [(&'static str, u32, u32); 22] = [
            ("eye_scale", self.eye_scale, SCALE_MAX),
            ("eye_y_stretch", self.eye_y_stretch, Y_STRETCH_MAX),
            ("eye_rotation", self.eye_rotation, ROTATION_MAX),
            ("eye_spacing", self.eye_spacing, SPACING_MAX),
            ("eye_y_position", self.eye_y_position, Y_POSITION_MAX),
            ("eyebrow_scale", self.eyebrow_scale, SCALE_MAX),
            ("eyebrow_y_stretch", self.eyebrow_y_stretch, Y_STRETCH_MAX),
            ("eyebrow_rotation", self.eyebrow_rotation, ROTATION_MAX),
            ("eyebrow_spacing", self.eyebrow_spacing, SPACING_MAX),
            ("eyebrow_y_position", self.eyebrow_y_position, Y_POSITION_MAX),
            ("nose_scale", self.nose_scale, SCALE_MAX),
            ("nose_y_position", self.nose_y_position, Y_POSITION_MAX),
            ("mouth_scale", self.mouth_scale, SCALE_MAX),
            ("mouth_y_stretch", self.mouth_y_stretch, Y_STRETCH_MAX),
            ("mouth_y_position", self.mouth_y_position, Y_POSITION_MAX),
            ("mustache_scale", self.mustache_scale, SCALE_MAX),
            ("mustache_spacing", self.mustache_spacing, SPACING_MAX),
            ("mustache_y_position", self.mustache_y_position, Y_POSITION_MAX),
            ("glasses_scale", self.glasses_scale, SCALE_MAX),
            ("glasses_spacing", self.glasses_spacing, SPACING_MAX),
            ("glasses_y_position", self.glasses_y_position, Y_POSITION_MAX),
            ("mole_scale", self.mole_scale, SCALE_MAX),
        ];
        for (field, value, max) in slider_checks {
            if value > max {
                return Err(ValidationError { field, value, max });
            }
        }

        if self.mole_x > MOLE_X_MAX {
            return Err(ValidationError { field: "mole_x", value: self.mole_x, max: MOLE_X_MAX });
        }
        if self.mole_y > MOLE_Y_MAX {
            return Err(ValidationError { field: "mole_y", value: self.mole_y, max: MOLE_Y_MAX });
        }

        Ok(())
    }

    /// Whether the avatar needs the separate facial-hair mesh part. The
    /// mustache rides the face texture instead and does not add a load
    /// stage.
    pub fn has_facial_hair(&self) -> bool {
        self.beard_type != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AvatarDescriptor::default().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_type_names_field() {
        let descriptor = AvatarDescriptor { eye_type: EYE_TYPES, ..Default::default() };
        let err = descriptor.validate().unwrap_err();
        assert_eq!(err.field, "eye_type");
        assert_eq!(err.value, EYE_TYPES);
    }

    #[test]
    fn test_out_of_range_palette_index() {
        let descriptor = AvatarDescriptor { hair_color: 8, ..Default::default() };
        let err = descriptor.validate().unwrap_err();
        assert_eq!(err.field, "hair_color");
        assert_eq!(err.max, 7);
    }

    #[test]
    fn test_out_of_range_slider() {
        let descriptor = AvatarDescriptor { mouth_y_position: 19, ..Default::default() };
        let err = descriptor.validate().unwrap_err();
        assert_eq!(err.field, "mouth_y_position");
    }

    #[test]
    fn test_mole_bounds() {
        let descriptor = AvatarDescriptor { mole_y: 31, ..Default::default() };
        assert_eq!(descriptor.validate().unwrap_err().field, "mole_y");
    }

    #[test]
    fn test_facial_hair_flag() {
        let mut descriptor = AvatarDescriptor::default();
        assert!(!descriptor.has_facial_hair());
        descriptor.mustache_type = 2;
        assert!(!descriptor.has_facial_hair());
        descriptor.beard_type = 1;
        assert!(descriptor.has_facial_hair());
    }
}
