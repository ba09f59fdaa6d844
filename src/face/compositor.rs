//! Face texture composition
//!
//! Orchestrates the per-feature pipeline: load the mask image from the
//! asset store, remap its colors from the descriptor's palette picks, run
//! the transform pipeline (scale, stretch, rotate, mirror), and composite
//! onto the shared 200×200 canvas in fixed z-order. Features are rendered
//! concurrently and independently; one failed asset load drops that feature
//! and is reported, never aborting the rest of the face.

use std::sync::Arc;

use image::RgbaImage;
use tokio::task::JoinSet;
use tracing::warn;

use crate::assets::{
    face_part_id, AssetError, AssetId, AssetStore, EYEBROW_BASE_ID, EYE_BASE_ID, GLASSES_BASE_ID,
    MOLE_ID, MOUTH_BASE_ID, MUSTACHE_BASE_ID, NOSE_BASE_ID,
};

use super::canvas::CompositeCanvas;
use super::color::{remap_black_white, remap_black_white_alpha, remap_tricolor};
use super::descriptor::{AvatarDescriptor, ValidationError};
use super::palette::{opaque, scale_rgb, EYE_COLORS, GLASSES_COLORS, HAIR_COLORS, MOUTH_COLORS};
use super::transform::TransformPipeline;

/// Horizontal face midline on the canvas.
const FACE_CENTER_X: f32 = 100.0;

/// Slider calibration shared by every feature: scale sliders sit on center
/// 4, stretch on center 3, rotation on center 4, vertical position on
/// center 12.
const SCALE_CENTER: f32 = 4.0;
const SCALE_SENSITIVITY: f32 = 0.1;
const STRETCH_CENTER: f32 = 3.0;
const STRETCH_SENSITIVITY: f32 = 0.1;
const ROTATION_CENTER: f32 = 4.0;
const ROTATION_STEP: f32 = std::f32::consts::PI / 32.0;
const Y_POSITION_CENTER: f32 = 12.0;

/// White with a zero alpha byte; the "background" end of the grayscale
/// remaps.
const CLEAR_WHITE: u32 = 0x00FF_FFFF;

/// Line color for the nose outline and the mole dot.
const NOSE_LINE_COLOR: u32 = 0x2A1B12;
const MOLE_COLOR: u32 = 0x18_1210;

/// Mole sliders address the canvas absolutely.
const MOLE_BASE_SCALE: f32 = 0.30;
const MOLE_X_STEP: f32 = 12.5;
const MOLE_Y_STEP: f32 = 200.0 / 30.0;

/// One visually distinct facial element, in compositing z-order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FaceFeature {
    Eyes,
    Eyebrows,
    Nose,
    Mouth,
    Mustache,
    Glasses,
    Mole,
}

impl FaceFeature {
    pub fn name(self) -> &'static str {
        match self {
            FaceFeature::Eyes => "eyes",
            FaceFeature::Eyebrows => "eyebrows",
            FaceFeature::Nose => "nose",
            FaceFeature::Mouth => "mouth",
            FaceFeature::Mustache => "mustache",
            FaceFeature::Glasses => "glasses",
            FaceFeature::Mole => "mole",
        }
    }
}

/// Per-feature placement and scaling calibration.
struct FeatureLayout {
    anchor_y: f32,
    base_scale: f32,
    y_pixels_per_unit: f32,
    base_half_gap: f32,
    gap_pixels_per_unit: f32,
}

const EYES_LAYOUT: FeatureLayout = FeatureLayout {
    anchor_y: 93.0,
    base_scale: 0.45,
    y_pixels_per_unit: 1.5,
    base_half_gap: 16.0,
    gap_pixels_per_unit: 2.0,
};
const EYEBROWS_LAYOUT: FeatureLayout = FeatureLayout {
    anchor_y: 76.0,
    base_scale: 0.40,
    y_pixels_per_unit: 1.5,
    base_half_gap: 16.0,
    gap_pixels_per_unit: 2.0,
};
const NOSE_LAYOUT: FeatureLayout = FeatureLayout {
    anchor_y: 112.0,
    base_scale: 0.35,
    y_pixels_per_unit: 1.5,
    base_half_gap: 0.0,
    gap_pixels_per_unit: 0.0,
};
const MOUTH_LAYOUT: FeatureLayout = FeatureLayout {
    anchor_y: 136.0,
    base_scale: 0.45,
    y_pixels_per_unit: 1.5,
    base_half_gap: 0.0,
    gap_pixels_per_unit: 0.0,
};
const MUSTACHE_LAYOUT: FeatureLayout = FeatureLayout {
    anchor_y: 128.0,
    base_scale: 0.40,
    y_pixels_per_unit: 1.5,
    base_half_gap: 10.0,
    gap_pixels_per_unit: 1.5,
};
const GLASSES_LAYOUT: FeatureLayout = FeatureLayout {
    anchor_y: 95.0,
    base_scale: 0.50,
    y_pixels_per_unit: 1.5,
    base_half_gap: 18.0,
    gap_pixels_per_unit: 2.0,
};

/// A transformed feature instance with its canvas placement.
struct Layer {
    image: RgbaImage,
    center_x: f32,
    center_y: f32,
}

/// One feature that could not be rendered.
#[derive(Debug)]
pub struct FeatureFailure {
    pub feature: FaceFeature,
    pub error: AssetError,
}

/// Result of one face composition: the finished texture plus the features
/// that had to be omitted.
#[derive(Debug)]
pub struct CompositeOutcome {
    pub texture: RgbaImage,
    pub failures: Vec<FeatureFailure>,
}

pub struct FaceCompositor {
    assets: Arc<AssetStore>,
}

impl FaceCompositor {
    pub fn new(assets: Arc<AssetStore>) -> Self {
        Self { assets }
    }

    /// Compose the full face texture for one descriptor.
    ///
    /// Features load and transform concurrently; completion order is
    /// unconstrained and only the final canvas pass applies z-order. An
    /// out-of-range descriptor is rejected up front, before any asset I/O.
    pub async fn composite_face(
        &self,
        descriptor: &AvatarDescriptor,
    ) -> Result<CompositeOutcome, ValidationError> {
        descriptor.validate()?;

        let mut features = vec![
            FaceFeature::Eyes,
            FaceFeature::Eyebrows,
            FaceFeature::Nose,
            FaceFeature::Mouth,
        ];
        if descriptor.mustache_type != 0 {
            features.push(FaceFeature::Mustache);
        }
        if descriptor.glasses_type != 0 {
            features.push(FaceFeature::Glasses);
        }
        if descriptor.mole_enabled {
            features.push(FaceFeature::Mole);
        }

        let mut jobs: JoinSet<(FaceFeature, Result<Vec<Layer>, AssetError>)> = JoinSet::new();
        for feature in features {
            let assets = Arc::clone(&self.assets);
            let descriptor = descriptor.clone();
            jobs.spawn(async move {
                let layers = render_feature(&assets, &descriptor, feature).await;
                (feature, layers)
            });
        }

        let mut rendered: Vec<(FaceFeature, Vec<Layer>)> = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = jobs.join_next().await {
            let (feature, result) = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("feature render task died: {e}");
                    continue;
                }
            };
            match result {
                Ok(layers) => rendered.push((feature, layers)),
                Err(error) => {
                    warn!("skipping {} for this face: {}", feature.name(), error);
                    failures.push(FeatureFailure { feature, error });
                }
            }
        }

        // z-order is the enum order
        rendered.sort_by_key(|(feature, _)| *feature);

        let mut canvas = CompositeCanvas::new();
        for (_, layers) in &rendered {
            for layer in layers {
                canvas.draw_centered(&layer.image, layer.center_x, layer.center_y);
            }
        }

        Ok(CompositeOutcome { texture: canvas.into_image(), failures })
    }
}

/// `base_scale * (1 + (slider - center) * sensitivity)`
fn scale_factor(base_scale: f32, slider: u32) -> f32 {
    base_scale * (1.0 + (slider as f32 - SCALE_CENTER) * SCALE_SENSITIVITY)
}

fn stretch_factor(slider: u32) -> f32 {
    1.0 + (slider as f32 - STRETCH_CENTER) * STRETCH_SENSITIVITY
}

fn rotation_angle(slider: u32) -> f32 {
    (slider as f32 - ROTATION_CENTER) * ROTATION_STEP
}

fn y_offset(slider: u32, layout: &FeatureLayout) -> f32 {
    (slider as f32 - Y_POSITION_CENTER) * layout.y_pixels_per_unit
}

fn half_gap(spacing: u32, layout: &FeatureLayout) -> f32 {
    layout.base_half_gap + spacing as f32 * layout.gap_pixels_per_unit
}

async fn render_feature(
    assets: &AssetStore,
    descriptor: &AvatarDescriptor,
    feature: FaceFeature,
) -> Result<Vec<Layer>, AssetError> {
    match feature {
        FaceFeature::Eyes => {
            let mask = assets.fetch_image(face_part_id(EYE_BASE_ID, descriptor.eye_type)).await?;
            let colored = remap_tricolor(
                &mask,
                EYE_COLORS[descriptor.eye_color as usize],
                0xFFFFFF,
                0x000000,
            );
            Ok(bilateral_layers(
                &colored,
                scale_factor(EYES_LAYOUT.base_scale, descriptor.eye_scale),
                stretch_factor(descriptor.eye_y_stretch),
                rotation_angle(descriptor.eye_rotation),
                half_gap(descriptor.eye_spacing, &EYES_LAYOUT),
                EYES_LAYOUT.anchor_y + y_offset(descriptor.eye_y_position, &EYES_LAYOUT),
            ))
        }
        FaceFeature::Eyebrows => {
            let mask = assets
                .fetch_image(face_part_id(EYEBROW_BASE_ID, descriptor.eyebrow_type))
                .await?;
            let colored = remap_black_white_alpha(
                &mask,
                opaque(HAIR_COLORS[descriptor.hair_color as usize]),
                CLEAR_WHITE,
            );
            Ok(bilateral_layers(
                &colored,
                scale_factor(EYEBROWS_LAYOUT.base_scale, descriptor.eyebrow_scale),
                stretch_factor(descriptor.eyebrow_y_stretch),
                rotation_angle(descriptor.eyebrow_rotation),
                half_gap(descriptor.eyebrow_spacing, &EYEBROWS_LAYOUT),
                EYEBROWS_LAYOUT.anchor_y
                    + y_offset(descriptor.eyebrow_y_position, &EYEBROWS_LAYOUT),
            ))
        }
        FaceFeature::Nose => {
            let mask = assets.fetch_image(face_part_id(NOSE_BASE_ID, descriptor.nose_type)).await?;
            let colored = remap_black_white_alpha(&mask, opaque(NOSE_LINE_COLOR), CLEAR_WHITE);
            let scale = scale_factor(NOSE_LAYOUT.base_scale, descriptor.nose_scale);
            let image = TransformPipeline::new(colored).stretch(scale, scale).finalize();
            Ok(vec![Layer {
                image,
                center_x: FACE_CENTER_X,
                center_y: NOSE_LAYOUT.anchor_y + y_offset(descriptor.nose_y_position, &NOSE_LAYOUT),
            }])
        }
        FaceFeature::Mouth => {
            let mask =
                assets.fetch_image(face_part_id(MOUTH_BASE_ID, descriptor.mouth_type)).await?;
            let lip = MOUTH_COLORS[descriptor.mouth_color as usize];
            // darker inner-lip tone rides the G channel, white backdrop the B
            let colored = remap_tricolor(&mask, lip, scale_rgb(lip, 0.8), 0xFFFFFF);
            let scale = scale_factor(MOUTH_LAYOUT.base_scale, descriptor.mouth_scale);
            let image = TransformPipeline::new(colored)
                .stretch(scale * stretch_factor(descriptor.mouth_y_stretch), scale)
                .finalize();
            Ok(vec![Layer {
                image,
                center_x: FACE_CENTER_X,
                center_y: MOUTH_LAYOUT.anchor_y
                    + y_offset(descriptor.mouth_y_position, &MOUTH_LAYOUT),
            }])
        }
        FaceFeature::Mustache => {
            let mask = assets
                .fetch_image(face_part_id(MUSTACHE_BASE_ID, descriptor.mustache_type))
                .await?;
            let colored = remap_black_white_alpha(
                &mask,
                opaque(HAIR_COLORS[descriptor.hair_color as usize]),
                CLEAR_WHITE,
            );
            Ok(bilateral_layers(
                &colored,
                scale_factor(MUSTACHE_LAYOUT.base_scale, descriptor.mustache_scale),
                1.0,
                0.0,
                half_gap(descriptor.mustache_spacing, &MUSTACHE_LAYOUT),
                MUSTACHE_LAYOUT.anchor_y
                    + y_offset(descriptor.mustache_y_position, &MUSTACHE_LAYOUT),
            ))
        }
        FaceFeature::Glasses => {
            let mask = assets
                .fetch_image(face_part_id(GLASSES_BASE_ID, descriptor.glasses_type))
                .await?;
            let colored = remap_black_white(
                &mask,
                GLASSES_COLORS[descriptor.glasses_color as usize],
                0xFFFFFF,
            );
            Ok(bilateral_layers(
                &colored,
                scale_factor(GLASSES_LAYOUT.base_scale, descriptor.glasses_scale),
                1.0,
                0.0,
                half_gap(descriptor.glasses_spacing, &GLASSES_LAYOUT),
                GLASSES_LAYOUT.anchor_y
                    + y_offset(descriptor.glasses_y_position, &GLASSES_LAYOUT),
            ))
        }
        FaceFeature::Mole => {
            let mask = assets.fetch_image(AssetId(MOLE_ID)).await?;
            let colored = remap_black_white_alpha(&mask, opaque(MOLE_COLOR), CLEAR_WHITE);
            let scale = scale_factor(MOLE_BASE_SCALE, descriptor.mole_scale);
            let image = TransformPipeline::new(colored).stretch(scale, scale).finalize();
            Ok(vec![Layer {
                image,
                center_x: descriptor.mole_x as f32 * MOLE_X_STEP,
                center_y: descriptor.mole_y as f32 * MOLE_Y_STEP,
            }])
        }
    }
}

/// Render the two instances of a bilateral feature: the left as-is, the
/// right rotated the opposite way and mirrored, both placed symmetrically
/// about the face midline.
fn bilateral_layers(
    colored: &RgbaImage,
    scale: f32,
    y_stretch: f32,
    angle: f32,
    half_gap: f32,
    center_y: f32,
) -> Vec<Layer> {
    let mut layers = Vec::with_capacity(2);
    for mirrored in [false, true] {
        let signed_angle = if mirrored { -angle } else { angle };
        let image = TransformPipeline::new(colored.clone())
            .stretch(scale * y_stretch, scale)
            .rotate(signed_angle)
            .flip(mirrored)
            .finalize();
        let center_x = if mirrored { FACE_CENTER_X + half_gap } else { FACE_CENTER_X - half_gap };
        layers.push(Layer { image, center_x, center_y });
    }
    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_factor_center_is_base_scale() {
        assert!((scale_factor(0.45, 4) - 0.45).abs() < f32::EPSILON);
        assert!((scale_factor(1.0, 8) - 1.4).abs() < 1e-6);
        assert!((scale_factor(1.0, 0) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_sign_symmetry() {
        assert_eq!(rotation_angle(4), 0.0);
        assert!((rotation_angle(6) + rotation_angle(2)).abs() < 1e-6);
    }

    #[test]
    fn test_half_gap_grows_with_spacing() {
        let narrow = half_gap(0, &EYES_LAYOUT);
        let wide = half_gap(12, &EYES_LAYOUT);
        assert!(wide > narrow);
        assert!((wide - narrow - 24.0).abs() < 1e-6);
    }

    #[test]
    fn test_feature_z_order() {
        let mut features = vec![FaceFeature::Mole, FaceFeature::Eyes, FaceFeature::Glasses];
        features.sort();
        assert_eq!(features, vec![FaceFeature::Eyes, FaceFeature::Glasses, FaceFeature::Mole]);
    }
}
