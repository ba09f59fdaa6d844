pub mod avatar;
pub mod crowd;

// Re-export the entity types for easier access
pub use avatar::{Avatar, AvatarParts, PartHandle, PartKind};
pub use crowd::CrowdSeparation;
