mod common;

use common::*;
use mmd::cgmath::{self, Euler, InnerSpace, Rad, Rotation3};
use mmd::{Model, ModelError, Scene};
use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

type Quat = cgmath::Quaternion<f32>;
type Vec3 = cgmath::Vector3<f32>;

fn scene_from(fixture: Fixture) -> Scene {
    Scene::new(Model::read(&fixture.build()).unwrap())
}

fn root_bone() -> Vec<u8> {
    bone("root", "root", -1, [0.0; 3], 0, 0x0002, &[])
}

#[test]
fn vertex_morph_scales_offset() {
    let mut scene = scene_from(Fixture {
        vertices: vec![vertex([1.0, 0.0, 0.0])],
        bones: vec![root_bone()],
        morphs: vec![morph("up", 1, &[vertex_offset(0, [0.0, 1.0, 0.0])])],
        ..Fixture::default()
    });
    scene.set_morph_weight(0, 0.5);
    scene.apply_morphs().unwrap();
    assert_eq!(
        <[f32; 3]>::from(scene.vertex_state(0).unwrap().position),
        [1.0, 0.5, 0.0]
    );
}

#[test]
fn morph_weights_are_linear() {
    let mut scene = scene_from(Fixture {
        vertices: vec![vertex([0.0; 3])],
        bones: vec![root_bone()],
        morphs: vec![morph("up", 1, &[vertex_offset(0, [0.0, 1.0, 0.0])])],
        ..Fixture::default()
    });
    for weight in [0.25, 0.75, -0.5] {
        scene.set_morph_weight(0, weight);
        scene.apply_morphs().unwrap();
        assert_eq!(scene.vertex_state(0).unwrap().position.y, weight);
    }
}

#[test]
fn zero_weights_leave_baseline_untouched() {
    let mut scene = scene_from(Fixture {
        vertices: vec![vertex([1.0, 2.0, 3.0])],
        materials: vec![material("m", [0.5, 0.5, 0.5, 1.0], -1, 0)],
        bones: vec![root_bone()],
        morphs: vec![
            morph("up", 1, &[vertex_offset(0, [0.0, 1.0, 0.0])]),
            morph("tint", 8, &[material_offset(-1, 1, 0.5)]),
        ],
        ..Fixture::default()
    });
    let vertices = scene.vertex_states().to_vec();
    let materials = scene.material_states().to_vec();

    scene.set_morph_weight(0, 1.0);
    scene.set_morph_weight(1, 1.0);
    scene.apply_morphs().unwrap();
    assert_ne!(scene.vertex_states(), &vertices[..]);
    assert_ne!(scene.material_states(), &materials[..]);

    scene.set_morph_weight(0, 0.0);
    scene.set_morph_weight(1, 0.0);
    scene.apply_morphs().unwrap();
    assert_eq!(scene.vertex_states(), &vertices[..]);
    assert_eq!(scene.material_states(), &materials[..]);
}

#[test]
fn uv_morph_channels() {
    // position + normal + uv, then one additional uv channel
    let mut entry = f32s(&[0.0; 8]);
    entry.extend(f32s(&[0.0; 4]));
    entry.push(0); // BDEF1
    entry.push(0);
    entry.extend(f32s(&[1.0]));
    let mut scene = scene_from(Fixture {
        additional_uv: 1,
        vertices: vec![entry],
        bones: vec![root_bone()],
        morphs: vec![
            morph("shift", 3, &[uv_offset(0, [0.5, 0.25, 0.0, 0.0])]),
            morph("spill", 4, &[uv_offset(0, [0.1, 0.2, 0.3, 0.4])]),
        ],
        ..Fixture::default()
    });
    scene.set_morph_weight(0, 1.0);
    scene.set_morph_weight(1, 0.5);
    scene.apply_morphs().unwrap();
    let state = scene.vertex_state(0).unwrap();
    assert_eq!(<[f32; 4]>::from(state.uv), [0.5, 0.25, 0.0, 0.0]);
    assert_eq!(
        <[f32; 4]>::from(state.additional_uv[0]),
        [0.05, 0.1, 0.15, 0.2]
    );
}

#[test]
fn bone_morph_composes_normalized_quaternion() {
    let mut scene = scene_from(Fixture {
        bones: vec![root_bone()],
        morphs: vec![morph(
            "turn",
            2,
            &[bone_offset(
                0,
                [0.0; 3],
                [FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2],
            )],
        )],
        ..Fixture::default()
    });
    scene.set_morph_weight(0, 1.0);
    scene.deform().unwrap();
    let orientation = scene.bone_world_orientation(0).unwrap();
    assert!((orientation.magnitude() - 1.0).abs() < 1e-5);
    let rotated = orientation * Vec3::new(0.0, 0.0, 1.0);
    assert!((rotated - Vec3::new(0.0, -1.0, 0.0)).magnitude() < 1e-5);
}

#[test]
fn half_weight_bone_morph_blends_half_the_angle() {
    let mut scene = scene_from(Fixture {
        bones: vec![root_bone()],
        morphs: vec![morph(
            "turn",
            2,
            &[bone_offset(
                0,
                [0.0; 3],
                [FRAC_1_SQRT_2, 0.0, 0.0, FRAC_1_SQRT_2],
            )],
        )],
        ..Fixture::default()
    });
    scene.set_morph_weight(0, 0.5);
    scene.deform().unwrap();
    let orientation = scene.bone_world_orientation(0).unwrap();
    let expected = Quat::from_axis_angle(Vec3::unit_x(), Rad(FRAC_PI_2 / 2.0));
    assert!((orientation - expected).magnitude() < 1e-5);
}

#[test]
fn material_morph_add() {
    let mut scene = scene_from(Fixture {
        materials: vec![material("m", [0.5, 0.5, 0.5, 1.0], -1, 0)],
        morphs: vec![morph("tint", 8, &[material_offset(-1, 1, 0.5)])],
        ..Fixture::default()
    });
    scene.set_morph_weight(0, 1.0);
    scene.apply_morphs().unwrap();
    let state = scene.material_state(0).unwrap();
    assert_eq!(<[f32; 4]>::from(state.diffuse), [1.0, 1.0, 1.0, 1.5]);
    assert_eq!(state.specular_power, 5.5);
    assert_eq!(<[f32; 4]>::from(state.texture_tint), [1.5, 1.5, 1.5, 1.5]);
}

#[test]
fn material_morph_multiply_applies_from_baseline() {
    let mut scene = scene_from(Fixture {
        materials: vec![material("m", [0.5, 0.5, 0.5, 1.0], -1, 0)],
        morphs: vec![morph("dim", 8, &[material_offset(0, 0, -0.5)])],
        ..Fixture::default()
    });
    scene.set_morph_weight(0, 1.0);
    // two frames must give the same result, multiply never compounds
    for _ in 0..2 {
        scene.apply_morphs().unwrap();
        let state = scene.material_state(0).unwrap();
        assert_eq!(<[f32; 4]>::from(state.diffuse), [0.25, 0.25, 0.25, 0.5]);
        assert_eq!(state.specular_power, 2.5);
        assert_eq!(<[f32; 4]>::from(state.toon_tint), [0.5, 0.5, 0.5, 0.5]);
    }
}

#[test]
fn group_morph_scales_child_effect() {
    let mut scene = scene_from(Fixture {
        vertices: vec![vertex([0.0; 3])],
        bones: vec![root_bone()],
        morphs: vec![
            morph("group", 0, &[morph_reference(1, 0.5)]),
            morph("up", 1, &[vertex_offset(0, [0.0, 1.0, 0.0])]),
        ],
        ..Fixture::default()
    });
    scene.set_morph_weight(0, 0.5);
    scene.apply_morphs().unwrap();
    assert_eq!(scene.vertex_state(0).unwrap().position.y, 0.25);
}

#[test]
fn group_morph_cycle_fails_the_frame() {
    let mut scene = scene_from(Fixture {
        morphs: vec![
            morph("a", 0, &[morph_reference(1, 1.0)]),
            morph("b", 0, &[morph_reference(0, 1.0)]),
        ],
        ..Fixture::default()
    });
    scene.set_morph_weight(0, 1.0);
    assert!(matches!(
        scene.apply_morphs(),
        Err(ModelError::MorphCycle(_))
    ));
    // the baseline stays intact and the next frame starts clean
    scene.set_morph_weight(0, 0.0);
    scene.apply_morphs().unwrap();
}

#[test]
fn flip_morph_selects_one_child() {
    let fixture = Fixture {
        vertices: vec![vertex([0.0; 3])],
        bones: vec![root_bone()],
        morphs: vec![
            morph(
                "flip",
                9,
                &[morph_reference(1, 0.4), morph_reference(2, 0.6)],
            ),
            morph("first", 1, &[vertex_offset(0, [1.0, 0.0, 0.0])]),
            morph("second", 1, &[vertex_offset(0, [0.0, 1.0, 0.0])]),
        ],
        ..Fixture::default()
    };

    let mut scene = scene_from(fixture);
    scene.set_morph_weight(0, 0.3);
    scene.apply_morphs().unwrap();
    // the chosen child applies at full weight
    assert_eq!(
        <[f32; 3]>::from(scene.vertex_state(0).unwrap().position),
        [1.0, 0.0, 0.0]
    );

    scene.set_morph_weight(0, 0.5);
    scene.apply_morphs().unwrap();
    assert_eq!(
        <[f32; 3]>::from(scene.vertex_state(0).unwrap().position),
        [0.0, 1.0, 0.0]
    );

    // the exact boundary falls to the next child
    scene.set_morph_weight(0, 0.4);
    scene.apply_morphs().unwrap();
    assert_eq!(
        <[f32; 3]>::from(scene.vertex_state(0).unwrap().position),
        [0.0, 1.0, 0.0]
    );
}

#[test]
fn impulse_morph_queues_for_physics() {
    let mut scene = scene_from(Fixture {
        bones: vec![root_bone()],
        rigid_bodies: vec![rigid_body("hip", 0)],
        morphs: vec![morph(
            "push",
            10,
            &[impulse_offset(0, true, [0.0, 0.0, 2.0], [1.0, 0.0, 0.0])],
        )],
        ..Fixture::default()
    });
    scene.set_morph_weight(0, 0.5);
    scene.apply_morphs().unwrap();
    let impulses = scene.drain_impulses();
    assert_eq!(impulses.len(), 1);
    assert_eq!(impulses[0].rigid_body, 0);
    assert!(impulses[0].is_local);
    assert_eq!(<[f32; 3]>::from(impulses[0].velocity), [0.0, 0.0, 1.0]);
    assert_eq!(<[f32; 3]>::from(impulses[0].torque), [0.5, 0.0, 0.0]);
    assert!(scene.pending_impulses().is_empty());
}

#[test]
fn world_transforms_compose_parent_to_child() {
    let mut scene = scene_from(Fixture {
        bones: vec![
            root_bone(),
            bone("child", "child", 0, [0.0, 1.0, 0.0], 0, 0x0002, &[]),
        ],
        ..Fixture::default()
    });
    scene.set_bone_local_translation(0, Vec3::new(1.0, 0.0, 0.0));
    scene.update_bones();
    let child = scene.bone_world_transform(1).unwrap();
    assert!((child.w.truncate() - Vec3::new(1.0, 1.0, 0.0)).magnitude() < 1e-6);

    scene.set_bone_local_translation(0, Vec3::new(0.0, 0.0, 0.0));
    scene.set_bone_local_orientation(0, Quat::from_axis_angle(Vec3::unit_z(), Rad(FRAC_PI_2)));
    scene.update_bones();
    let child = scene.bone_world_transform(1).unwrap();
    assert!((child.w.truncate() - Vec3::new(-1.0, 0.0, 0.0)).magnitude() < 1e-5);
}

#[test]
fn update_order_honors_parents_then_stages() {
    let scene = scene_from(Fixture {
        bones: vec![
            bone("root", "root", -1, [0.0; 3], 0, 0x0002, &[]),
            bone("late", "late", 0, [0.0, 1.0, 0.0], 1, 0x0002, &[]),
            bone("early", "early", 0, [0.0, 1.0, 0.0], 0, 0x0002, &[]),
            bone("leaf", "leaf", 1, [0.0, 2.0, 0.0], 0, 0x0002, &[]),
        ],
        ..Fixture::default()
    });
    // stage order where possible, parent before child always
    assert_eq!(scene.bone_update_order(), &[0, 2, 1, 3]);
    let order = scene.bone_update_order();
    let position = |index: usize| order.iter().position(|bone| *bone == index).unwrap();
    assert!(position(0) < position(1));
    assert!(position(0) < position(2));
    assert!(position(1) < position(3));
}

#[test]
fn inherent_orientation_blends_by_coefficient() {
    let mut inherent = vec![0u8];
    inherent.extend(f32s(&[0.5]));
    let mut scene = scene_from(Fixture {
        bones: vec![
            root_bone(),
            bone("follow", "follow", -1, [1.0, 0.0, 0.0], 0, 0x0102, &inherent),
        ],
        ..Fixture::default()
    });
    scene.set_bone_local_orientation(0, Quat::from_axis_angle(Vec3::unit_z(), Rad(FRAC_PI_2)));
    scene.update_bones();
    let orientation = scene.bone_world_orientation(1).unwrap();
    let expected = Quat::from_axis_angle(Vec3::unit_z(), Rad(FRAC_PI_2 / 2.0));
    assert!((orientation - expected).magnitude() < 1e-5);
}

#[test]
fn fixed_axis_keeps_only_the_twist() {
    let mut scene = scene_from(Fixture {
        bones: vec![bone(
            "twist",
            "twist",
            -1,
            [0.0; 3],
            0,
            0x0402,
            &f32s(&[0.0, 1.0, 0.0]),
        )],
        ..Fixture::default()
    });
    // rotation orthogonal to the fixed axis is dropped entirely
    scene.set_bone_local_orientation(0, Quat::from_axis_angle(Vec3::unit_x(), Rad(FRAC_PI_2)));
    scene.update_bones();
    let orientation = scene.bone_world_orientation(0).unwrap();
    let rotated = orientation * Vec3::new(0.0, 0.0, 1.0);
    assert!((rotated - Vec3::new(0.0, 0.0, 1.0)).magnitude() < 1e-5);

    // rotation around the fixed axis passes through
    scene.set_bone_local_orientation(0, Quat::from_axis_angle(Vec3::unit_y(), Rad(FRAC_PI_2)));
    scene.update_bones();
    let orientation = scene.bone_world_orientation(0).unwrap();
    let rotated = orientation * Vec3::new(1.0, 0.0, 0.0);
    assert!((rotated - Vec3::new(0.0, 0.0, -1.0)).magnitude() < 1e-5);
}

fn two_link_chain(links: &[Vec<u8>]) -> Fixture {
    Fixture {
        bones: vec![
            bone("lower", "lower", -1, [0.0, 0.0, 0.0], 0, 0x0002, &[]),
            bone("upper", "upper", 0, [0.0, 1.0, 0.0], 0, 0x0002, &[]),
            bone("tip", "tip", 1, [0.0, 2.0, 0.0], 0, 0x0002, &[]),
            bone(
                "ik",
                "ik",
                -1,
                [1.0, 1.0, 0.0],
                0,
                0x0022,
                &constraint(2, 20, 2.0, links),
            ),
        ],
        ..Fixture::default()
    }
}

#[test]
fn two_link_ik_reaches_the_target() {
    let mut scene = scene_from(two_link_chain(&[link(1), link(0)]));
    scene.update_bones();
    let effector = scene.bone_world_transform(2).unwrap().w.truncate();
    let target = Vec3::new(1.0, 1.0, 0.0);
    assert!(
        (effector - target).magnitude() < 1e-4,
        "effector ended at {:?}",
        effector
    );
}

#[test]
fn ik_respects_link_angle_bounds() {
    let bound = 0.1;
    let mut scene = scene_from(two_link_chain(&[
        limited_link(1, [-bound; 3], [bound; 3]),
        link(0),
    ]));
    scene.update_bones();

    let pose = scene.bone_resolved_pose(1).unwrap();
    let euler = Euler::from(pose.orientation);
    for angle in [euler.x.0, euler.y.0, euler.z.0] {
        assert!(angle >= -bound - 1e-4 && angle <= bound + 1e-4, "angle {angle}");
    }

    // the clamped chain still makes progress towards the target
    let effector = scene.bone_world_transform(2).unwrap().w.truncate();
    let target = Vec3::new(1.0, 1.0, 0.0);
    assert!((effector - target).magnitude() < Vec3::new(-1.0, 1.0, 0.0).magnitude());
}

#[test]
fn orientations_stay_normalized() {
    let mut scene = scene_from(two_link_chain(&[link(1), link(0)]));
    scene.update_bones();
    for index in 0..scene.model().bones.len() {
        let orientation = scene.bone_world_orientation(index).unwrap();
        assert!((orientation.magnitude() - 1.0).abs() < 1e-5);
    }
}

#[test]
fn physics_feedback_overwrites_world_transform() {
    let mut scene = scene_from(Fixture {
        bones: vec![root_bone()],
        ..Fixture::default()
    });
    let transform = cgmath::Matrix4::from_translation(Vec3::new(0.0, 3.0, 0.0));
    scene.set_bone_world_transform(0, transform);
    assert_eq!(scene.bone_world_transform(0).unwrap(), transform);
}

#[test]
fn out_of_range_mutations_are_ignored() {
    let mut scene = scene_from(Fixture {
        bones: vec![root_bone()],
        ..Fixture::default()
    });
    scene.set_morph_weight(3, 1.0);
    assert_eq!(scene.morph_weight(3), 0.0);
    scene.set_bone_local_translation(5, Vec3::new(1.0, 0.0, 0.0));
    assert!(scene.bone_local_pose(5).is_none());
    assert!(scene.vertex_state(0).is_none());
    assert!(scene.material_state(0).is_none());
}
