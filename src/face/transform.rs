//! Chainable image transform pipeline
//!
//! Wraps one pixel buffer and applies stretch / rotate / mirror steps before
//! a terminal [`TransformPipeline::finalize`]. The pipeline moves through
//! each call, so the type system enforces that a finalized pipeline cannot
//! be touched again. A zero-area buffer short-circuits every operation and
//! finalizes to a 1×1 blank image.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::debug;

/// In-flight transform state for a single feature layer.
#[derive(Debug)]
pub struct TransformPipeline {
    image: RgbaImage,
    ops_applied: usize,
}

impl TransformPipeline {
    pub fn new(image: RgbaImage) -> Self {
        Self { image, ops_applied: 0 }
    }

    fn is_degenerate(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    /// Resize the canvas to `width * scale_x` by `height * scale_y` and
    /// redraw the contents scaled to fill it. Non-uniform scaling is the
    /// normal case (vertical feature stretch). A factor that rounds a
    /// dimension down to zero leaves the pipeline in the degenerate state.
    pub fn stretch(mut self, scale_y: f32, scale_x: f32) -> Self {
        if self.is_degenerate() {
            return self;
        }
        self.ops_applied += 1;

        let new_width = (self.image.width() as f32 * scale_x).round().max(0.0) as u32;
        let new_height = (self.image.height() as f32 * scale_y).round().max(0.0) as u32;
        if new_width == self.image.width() && new_height == self.image.height() {
            return self;
        }
        if new_width == 0 || new_height == 0 {
            self.image = RgbaImage::new(new_width, new_height);
            return self;
        }

        self.image = imageops::resize(&self.image, new_width, new_height, FilterType::Triangle);
        self
    }

    /// Rotate the contents by `angle` radians about the image center.
    ///
    /// The output canvas is the axis-aligned bounding box of the four input
    /// corners rotated by `-angle` around the center (min/max of X and Y),
    /// so nothing is clipped; the contents are then drawn rotated by
    /// `+angle` about the new center. That corner pass must stay an inverse
    /// rotation to keep output dimensions in step with the drawing step.
    pub fn rotate(mut self, angle: f32) -> Self {
        if self.is_degenerate() {
            return self;
        }
        self.ops_applied += 1;
        if angle == 0.0 {
            return self;
        }

        let width = self.image.width() as f32;
        let height = self.image.height() as f32;
        let center_x = width / 2.0;
        let center_y = height / 2.0;

        let (inv_sin, inv_cos) = (-angle).sin_cos();
        let corners = [(0.0, 0.0), (width, 0.0), (0.0, height), (width, height)];
        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        for (x, y) in corners {
            let dx = x - center_x;
            let dy = y - center_y;
            let rx = dx * inv_cos - dy * inv_sin;
            let ry = dx * inv_sin + dy * inv_cos;
            min_x = min_x.min(rx);
            max_x = max_x.max(rx);
            min_y = min_y.min(ry);
            max_y = max_y.max(ry);
        }

        let out_width = (max_x - min_x).ceil() as u32;
        let out_height = (max_y - min_y).ceil() as u32;
        let out_center_x = out_width as f32 / 2.0;
        let out_center_y = out_height as f32 / 2.0;

        // Forward drawing rotates by +angle, so each output pixel samples
        // the source through the inverse rotation.
        let (sin, cos) = angle.sin_cos();
        let mut out = RgbaImage::new(out_width, out_height);
        for y in 0..out_height {
            for x in 0..out_width {
                let dx = x as f32 + 0.5 - out_center_x;
                let dy = y as f32 + 0.5 - out_center_y;
                let src_x = center_x + dx * cos + dy * sin;
                let src_y = center_y - dx * sin + dy * cos;
                let sample = sample_bilinear(&self.image, src_x - 0.5, src_y - 0.5);
                out.put_pixel(x, y, Rgba(sample));
            }
        }
        self.image = out;
        self
    }

    /// Mirror horizontally about the vertical centerline when `condition`
    /// holds. The recentering translation uses the canvas width for both
    /// the X and Y terms, as the calibration downstream expects; the
    /// vertical pair cancels, leaving a pure horizontal reflection.
    pub fn flip(mut self, condition: bool) -> Self {
        if !condition || self.is_degenerate() {
            return self;
        }
        self.ops_applied += 1;

        let (width, height) = self.image.dimensions();
        let recenter = width as f32 / 2.0;
        let mut out = RgbaImage::new(width, height);
        for (x, y, pixel) in self.image.enumerate_pixels() {
            // translate(recenter, recenter) · scale(-1, 1) · translate(-recenter, -recenter)
            let tx = recenter - (x as f32 + 0.5 - recenter);
            let ty = (y as f32 + 0.5 - recenter) + recenter;
            out.put_pixel((tx - 0.5).round() as u32, (ty - 0.5).round() as u32, *pixel);
        }
        self.image = out;
        self
    }

    /// Side-channel visualization hook. Logs the current pipeline state and
    /// leaves the pixels untouched.
    pub fn show_debug(self) -> Self {
        debug!(
            width = self.image.width(),
            height = self.image.height(),
            ops = self.ops_applied,
            "transform pipeline state"
        );
        self
    }

    /// Terminal operation: extract the pixel buffer. A degenerate pipeline
    /// finalizes to a 1×1 blank image no matter which operations were
    /// queued before.
    pub fn finalize(self) -> RgbaImage {
        if self.is_degenerate() {
            return RgbaImage::new(1, 1);
        }
        self.image
    }
}

fn sample_bilinear(image: &RgbaImage, x: f32, y: f32) -> [u8; 4] {
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let fetch = |ix: f32, iy: f32| -> [f32; 4] {
        if ix < 0.0 || iy < 0.0 || ix >= image.width() as f32 || iy >= image.height() as f32 {
            [0.0; 4]
        } else {
            let pixel = image.get_pixel(ix as u32, iy as u32).0;
            [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32, pixel[3] as f32]
        }
    };

    let p00 = fetch(x0, y0);
    let p10 = fetch(x0 + 1.0, y0);
    let p01 = fetch(x0, y0 + 1.0);
    let p11 = fetch(x0 + 1.0, y0 + 1.0);

    let mut result = [0u8; 4];
    for channel in 0..4 {
        let top = p00[channel] * (1.0 - fx) + p10[channel] * fx;
        let bottom = p01[channel] * (1.0 - fx) + p11[channel] * fx;
        result[channel] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn test_stretch_identity() {
        let source = checker(8, 6);
        let out = TransformPipeline::new(source.clone()).stretch(1.0, 1.0).finalize();
        assert_eq!(out.dimensions(), (8, 6));
        assert_eq!(out.as_raw(), source.as_raw());
    }

    #[test]
    fn test_stretch_dimensions() {
        let out = TransformPipeline::new(checker(10, 10)).stretch(2.0, 0.5).finalize();
        assert_eq!(out.dimensions(), (5, 20));
    }

    #[test]
    fn test_stretch_to_zero_degenerates() {
        let out = TransformPipeline::new(checker(4, 4)).stretch(0.0, 1.0).finalize();
        assert_eq!(out.dimensions(), (1, 1));
    }

    #[test]
    fn test_rotate_zero_is_identity() {
        let source = checker(9, 5);
        let out = TransformPipeline::new(source.clone()).rotate(0.0).finalize();
        assert_eq!(out.dimensions(), (9, 5));
        assert_eq!(out.as_raw(), source.as_raw());
    }

    #[test]
    fn test_rotate_quarter_turn_swaps_bounding_box() {
        let out = TransformPipeline::new(checker(10, 4)).rotate(FRAC_PI_2).finalize();
        let (width, height) = out.dimensions();
        // bounding box of a 10x4 rectangle after a quarter turn
        assert!((width as i32 - 4).abs() <= 1, "width {width}");
        assert!((height as i32 - 10).abs() <= 1, "height {height}");
    }

    #[test]
    fn test_flip_mirrors_horizontally() {
        let mut source = RgbaImage::new(4, 2);
        source.put_pixel(0, 0, Rgba([10, 0, 0, 255]));
        source.put_pixel(3, 1, Rgba([20, 0, 0, 255]));
        let out = TransformPipeline::new(source).flip(true).finalize();
        assert_eq!(out.get_pixel(3, 0).0, [10, 0, 0, 255]);
        assert_eq!(out.get_pixel(0, 1).0, [20, 0, 0, 255]);
    }

    #[test]
    fn test_flip_false_is_noop() {
        let source = checker(5, 5);
        let out = TransformPipeline::new(source.clone()).flip(false).finalize();
        assert_eq!(out.as_raw(), source.as_raw());
    }

    #[test]
    fn test_flip_is_involution() {
        let source = checker(7, 3);
        let out = TransformPipeline::new(source.clone()).flip(true).flip(true).finalize();
        assert_eq!(out.as_raw(), source.as_raw());
    }

    #[test]
    fn test_degenerate_finalizes_to_single_pixel() {
        let out = TransformPipeline::new(RgbaImage::new(0, 12))
            .stretch(3.0, 3.0)
            .rotate(1.0)
            .flip(true)
            .finalize();
        assert_eq!(out.dimensions(), (1, 1));
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 0]);
    }
}
