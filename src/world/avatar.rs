//! Plaza avatar entity
//!
//! One humanoid figure standing in the plaza. Visual parts live in explicit
//! optional ownership slots; an avatar whose asset loads have not all
//! landed yet is a valid, partially-initialized entity that the simulation
//! simply skips.

use glam::Vec2;
use uuid::Uuid;

use crate::face::AvatarDescriptor;

/// Kinds of visual sub-parts a figure is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    Body,
    Head,
    Hair,
    Beard,
    Face,
}

/// A loaded visual part, positioned in plaza space alongside its owner.
#[derive(Debug, Clone)]
pub struct PartHandle {
    pub kind: PartKind,
    pub position: Vec2,
}

/// Ownership slots for the figure's parts, one per kind. A `None` slot
/// means the load has not completed (or failed and was reported).
#[derive(Debug, Clone, Default)]
pub struct AvatarParts {
    pub body: Option<PartHandle>,
    pub head: Option<PartHandle>,
    pub hair: Option<PartHandle>,
    pub beard: Option<PartHandle>,
    pub face: Option<PartHandle>,
}

impl AvatarParts {
    fn slot_mut(&mut self, kind: PartKind) -> &mut Option<PartHandle> {
        match kind {
            PartKind::Body => &mut self.body,
            PartKind::Head => &mut self.head,
            PartKind::Hair => &mut self.hair,
            PartKind::Beard => &mut self.beard,
            PartKind::Face => &mut self.face,
        }
    }

    fn for_each_mut(&mut self, mut f: impl FnMut(&mut PartHandle)) {
        for slot in [
            &mut self.body,
            &mut self.head,
            &mut self.hair,
            &mut self.beard,
            &mut self.face,
        ] {
            if let Some(part) = slot {
                f(part);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Avatar {
    pub id: Uuid,
    pub screen_name: String,
    pub descriptor: AvatarDescriptor,
    pub community_id: u64,
    /// Current plaza position (x, z ground plane).
    pub position: Vec2,
    /// Fixed anchor of the assigned community.
    pub target: Vec2,
    pub parts: AvatarParts,
    pub loaded_stages: u32,
    pub expected_stages: u32,
    pub frame: u32,
}

impl Avatar {
    pub fn new(
        screen_name: impl Into<String>,
        descriptor: AvatarDescriptor,
        community_id: u64,
        position: Vec2,
        target: Vec2,
    ) -> Self {
        // body, head, hair and face always load; the beard mesh is a fifth
        // stage only for avatars that carry facial hair
        let expected_stages = if descriptor.has_facial_hair() { 5 } else { 4 };
        Self {
            id: Uuid::new_v4(),
            screen_name: screen_name.into(),
            descriptor,
            community_id,
            position,
            target,
            parts: AvatarParts::default(),
            loaded_stages: 0,
            expected_stages,
            frame: 0,
        }
    }

    /// Fill a part slot and count the load stage. Attaching the same kind
    /// twice replaces the handle without double-counting.
    pub fn attach_part(&mut self, kind: PartKind) {
        let slot = self.parts.slot_mut(kind);
        if slot.is_none() {
            self.loaded_stages += 1;
        }
        *slot = Some(PartHandle { kind, position: self.position });
    }

    /// Eligible for simulation once every expected asset stage landed.
    pub fn is_ready(&self) -> bool {
        self.loaded_stages == self.expected_stages
    }

    /// Move the figure and every owned part by the same delta.
    pub fn apply_translation(&mut self, delta: Vec2) {
        self.position += delta;
        self.parts.for_each_mut(|part| part.position += delta);
    }

    pub fn advance_frame(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }
}
