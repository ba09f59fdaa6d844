//! Crowd steering and separation
//!
//! One discrete simulation step per tick over every fully-loaded avatar:
//! steer toward the community anchor with linear arrival falloff, then
//! resolve pairwise overlaps in a single order-dependent pass. The pass is
//! deliberately not a simultaneous solve: a displacement applied to a
//! neighbor is visible to every later pair in the same tick, which gives
//! the crowd its characteristic mild jitter.

use glam::Vec2;

use super::avatar::Avatar;

#[derive(Debug, Clone, Copy)]
pub struct CrowdSeparation {
    /// Distance covered per tick when far from the target.
    pub max_speed: f32,
    /// Radius inside which steering speed falls off linearly to zero.
    pub arrival_radius: f32,
    /// Minimum pairwise distance before a neighbor gets pushed away.
    pub min_separation: f32,
}

impl Default for CrowdSeparation {
    fn default() -> Self {
        Self { max_speed: 0.08, arrival_radius: 10.0, min_separation: 1.0 }
    }
}

impl CrowdSeparation {
    /// Advance the crowd by one tick.
    pub fn step(&self, avatars: &mut [Avatar]) {
        for current in 0..avatars.len() {
            if !avatars[current].is_ready() {
                continue;
            }

            let velocity = self.steering_velocity(&avatars[current]);
            let next = avatars[current].position + velocity;

            for other in 0..avatars.len() {
                if other == current || !avatars[other].is_ready() {
                    continue;
                }
                let distance = next.distance(avatars[other].position);
                if distance >= self.min_separation {
                    continue;
                }
                let overlap = self.min_separation - distance;
                let midpoint = (next + avatars[other].position) * 0.5;
                let away = avatars[other].position - midpoint;
                let away = if away.length_squared() > f32::EPSILON {
                    away.normalize()
                } else {
                    // coincident figures pick a fixed axis
                    Vec2::X
                };
                avatars[other].apply_translation(away * (overlap * 0.5));
            }

            avatars[current].apply_translation(velocity);
            avatars[current].advance_frame();
        }
    }

    /// Velocity toward the community anchor: full speed outside the arrival
    /// radius, proportionally reduced inside it.
    fn steering_velocity(&self, avatar: &Avatar) -> Vec2 {
        let to_target = avatar.target - avatar.position;
        let distance = to_target.length();
        if distance <= f32::EPSILON {
            return Vec2::ZERO;
        }
        let speed = if distance > self.arrival_radius {
            self.max_speed
        } else {
            self.max_speed * (distance / self.arrival_radius)
        };
        to_target / distance * speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::AvatarDescriptor;
    use crate::world::avatar::PartKind;

    fn ready_avatar(position: Vec2, target: Vec2) -> Avatar {
        let mut avatar =
            Avatar::new("walker", AvatarDescriptor::default(), 1, position, target);
        avatar.attach_part(PartKind::Body);
        avatar.attach_part(PartKind::Head);
        avatar.attach_part(PartKind::Hair);
        avatar.attach_part(PartKind::Face);
        avatar
    }

    #[test]
    fn test_lone_avatar_moves_at_full_speed_when_far() {
        let crowd = CrowdSeparation::default();
        let mut avatars = vec![ready_avatar(Vec2::ZERO, Vec2::new(100.0, 0.0))];
        crowd.step(&mut avatars);
        let moved = avatars[0].position.length();
        assert!((moved - crowd.max_speed).abs() < 1e-6, "moved {moved}");
    }

    #[test]
    fn test_arrival_falloff_scales_speed() {
        let crowd = CrowdSeparation::default();
        // 5 units out: half the arrival radius, so half speed
        let mut avatars = vec![ready_avatar(Vec2::new(5.0, 0.0), Vec2::ZERO)];
        crowd.step(&mut avatars);
        let moved = (Vec2::new(5.0, 0.0) - avatars[0].position).length();
        assert!((moved - crowd.max_speed * 0.5).abs() < 1e-6, "moved {moved}");
    }

    #[test]
    fn test_avatar_at_target_stays_put_when_alone() {
        let crowd = CrowdSeparation::default();
        let mut avatars = vec![ready_avatar(Vec2::new(3.0, 3.0), Vec2::new(3.0, 3.0))];
        crowd.step(&mut avatars);
        assert_eq!(avatars[0].position, Vec2::new(3.0, 3.0));
    }

    #[test]
    fn test_coincident_pair_separates() {
        let crowd = CrowdSeparation::default();
        let spot = Vec2::new(1.0, 2.0);
        let mut avatars = vec![ready_avatar(spot, spot), ready_avatar(spot, spot)];
        crowd.step(&mut avatars);
        let gap = avatars[0].position.distance(avatars[1].position);
        assert!(gap > 0.0, "avatars still coincident");
    }

    #[test]
    fn test_unready_avatars_are_skipped() {
        let crowd = CrowdSeparation::default();
        let mut waiting =
            Avatar::new("waiting", AvatarDescriptor::default(), 1, Vec2::ZERO, Vec2::new(50.0, 0.0));
        waiting.attach_part(PartKind::Body);
        let mut avatars = vec![waiting];
        crowd.step(&mut avatars);
        assert_eq!(avatars[0].position, Vec2::ZERO);
        assert_eq!(avatars[0].frame, 0);
    }

    #[test]
    fn test_neighbor_outside_threshold_is_untouched() {
        let crowd = CrowdSeparation::default();
        let mut avatars = vec![
            ready_avatar(Vec2::ZERO, Vec2::ZERO),
            ready_avatar(Vec2::new(3.0, 0.0), Vec2::new(3.0, 0.0)),
        ];
        crowd.step(&mut avatars);
        assert_eq!(avatars[0].position, Vec2::ZERO);
        assert_eq!(avatars[1].position, Vec2::new(3.0, 0.0));
    }

    #[test]
    fn test_separation_pushes_neighbor_not_self() {
        let crowd = CrowdSeparation::default();
        // both settled on the same target, 0.5 apart: inside min separation
        let mut avatars = vec![
            ready_avatar(Vec2::ZERO, Vec2::ZERO),
            ready_avatar(Vec2::new(0.5, 0.0), Vec2::new(0.5, 0.0)),
        ];
        crowd.step(&mut avatars);
        // the first pass pushes the neighbor further right
        assert!(avatars[1].position.x > 0.5);
    }
}
