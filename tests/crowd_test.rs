use glam::Vec2;

use plaza_rust::face::descriptor::AvatarDescriptor;
use plaza_rust::world::{Avatar, CrowdSeparation, PartKind};

fn loaded_avatar(position: Vec2, target: Vec2) -> Avatar {
    let mut avatar = Avatar::new("visitor", AvatarDescriptor::default(), 7, position, target);
    avatar.attach_part(PartKind::Body);
    avatar.attach_part(PartKind::Head);
    avatar.attach_part(PartKind::Hair);
    avatar.attach_part(PartKind::Face);
    avatar
}

#[test]
fn test_coincident_avatars_separate_in_one_tick() {
    let crowd = CrowdSeparation::default();
    let spot = Vec2::new(10.0, -4.0);
    let mut avatars = vec![loaded_avatar(spot, spot), loaded_avatar(spot, spot)];

    crowd.step(&mut avatars);

    let gap = avatars[0].position.distance(avatars[1].position);
    assert!(gap > 0.0, "avatars still on top of each other");
}

#[test]
fn test_isolated_avatar_moves_by_exact_steering_magnitude() {
    let crowd = CrowdSeparation::default();
    // far outside the arrival radius, no neighbor within a unit
    let mut avatars = vec![
        loaded_avatar(Vec2::ZERO, Vec2::new(40.0, 30.0)),
        loaded_avatar(Vec2::new(25.0, 0.0), Vec2::new(25.0, 0.0)),
    ];

    crowd.step(&mut avatars);

    let moved = avatars[0].position.length();
    assert!(
        (moved - crowd.max_speed).abs() < 1e-6,
        "expected exactly {} but moved {}",
        crowd.max_speed,
        moved
    );
    // and the motion points at the target
    let direction = avatars[0].position.normalize();
    let expected = Vec2::new(40.0, 30.0).normalize();
    assert!((direction - expected).length() < 1e-6);
}

#[test]
fn test_crowd_converges_on_community_anchor() {
    let crowd = CrowdSeparation::default();
    let anchor = Vec2::ZERO;
    let mut avatars: Vec<Avatar> = (0..4)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::FRAC_PI_2;
            loaded_avatar(Vec2::new(angle.cos(), angle.sin()) * 30.0, anchor)
        })
        .collect();

    let start: f32 = avatars.iter().map(|a| a.position.length()).sum();
    for _ in 0..200 {
        crowd.step(&mut avatars);
    }
    let end: f32 = avatars.iter().map(|a| a.position.length()).sum();

    assert!(end < start, "crowd did not move toward the anchor");
    // nobody ends up stacked on a neighbor
    for i in 0..avatars.len() {
        for j in (i + 1)..avatars.len() {
            assert!(avatars[i].position.distance(avatars[j].position) > 0.0);
        }
    }
}

#[test]
fn test_partially_loaded_avatar_neither_moves_nor_animates() {
    let crowd = CrowdSeparation::default();
    let mut waiting =
        Avatar::new("waiting", AvatarDescriptor::default(), 7, Vec2::ZERO, Vec2::new(50.0, 0.0));
    waiting.attach_part(PartKind::Body);
    waiting.attach_part(PartKind::Head);

    let mut avatars = vec![waiting, loaded_avatar(Vec2::new(0.2, 0.0), Vec2::new(30.0, 0.0))];
    crowd.step(&mut avatars);

    assert_eq!(avatars[0].position, Vec2::ZERO, "unready avatar moved");
    assert_eq!(avatars[0].frame, 0, "unready avatar animated");
    assert!(avatars[1].frame > 0, "ready avatar did not animate");
}

#[test]
fn test_beard_avatar_needs_fifth_stage() {
    let crowd = CrowdSeparation::default();
    let descriptor = AvatarDescriptor { beard_type: 3, ..Default::default() };
    let mut bearded =
        Avatar::new("bearded", descriptor, 7, Vec2::ZERO, Vec2::new(50.0, 0.0));
    bearded.attach_part(PartKind::Body);
    bearded.attach_part(PartKind::Head);
    bearded.attach_part(PartKind::Hair);
    bearded.attach_part(PartKind::Face);

    let mut avatars = vec![bearded];
    crowd.step(&mut avatars);
    assert_eq!(avatars[0].position, Vec2::ZERO, "moved without the beard stage");

    avatars[0].attach_part(PartKind::Beard);
    crowd.step(&mut avatars);
    assert!(avatars[0].position.length() > 0.0);
}
