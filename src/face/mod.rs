//! Avatar face texture pipeline
//!
//! Everything between a decoded avatar descriptor and the finished 200×200
//! face texture: fixed palettes, color remapping, the chainable transform
//! pipeline, the composite canvas and the per-feature orchestration.

pub mod canvas;
pub mod color;
pub mod compositor;
pub mod descriptor;
pub mod palette;
pub mod transform;

// Re-export the working set for convenience
pub use canvas::{CompositeCanvas, CANVAS_SIZE};
pub use compositor::{CompositeOutcome, FaceCompositor, FaceFeature, FeatureFailure};
pub use descriptor::{AvatarDescriptor, ValidationError};
pub use transform::TransformPipeline;
