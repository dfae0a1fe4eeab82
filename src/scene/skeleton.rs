use super::{BonePose, PoseBuffers, Quat, Scene, Vec3};
use crate::pmx::Bone;
use cgmath::{InnerSpace, Matrix3, Matrix4};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Bone evaluation order: topological over parent links, ascending by
/// (stage, index) wherever the hierarchy leaves a choice.
pub(super) fn update_order(bones: &[Bone]) -> Vec<usize> {
    let mut children = vec![Vec::new(); bones.len()];
    let mut blocked = vec![false; bones.len()];
    for (index, bone) in bones.iter().enumerate() {
        if let Ok(parent) = usize::try_from(bone.parent) {
            if parent < bones.len() && parent != index {
                children[parent].push(index);
                blocked[index] = true;
            }
        }
    }
    let mut ready: BinaryHeap<Reverse<(i32, usize)>> = bones
        .iter()
        .enumerate()
        .filter(|(index, _)| !blocked[*index])
        .map(|(index, bone)| Reverse((bone.stage, index)))
        .collect();
    let mut order = Vec::with_capacity(bones.len());
    let mut emitted = vec![false; bones.len()];
    while let Some(Reverse((_, index))) = ready.pop() {
        emitted[index] = true;
        order.push(index);
        for &child in &children[index] {
            ready.push(Reverse((bones[child].stage, child)));
        }
    }
    // a parent cycle in a malformed graph leaves stragglers
    if order.len() < bones.len() {
        let mut rest: Vec<usize> = (0..bones.len()).filter(|index| !emitted[*index]).collect();
        rest.sort_by_key(|index| (bones[*index].stage, *index));
        order.extend(rest);
    }
    order
}

pub(super) fn update(scene: &mut Scene) {
    let Scene {
        model,
        bone_poses,
        morph_poses,
        frame_poses,
        accumulated,
        local_transforms,
        world_transforms,
        world_orientations,
        update_order,
        rest_offsets,
        ..
    } = scene;

    for (step, &index) in update_order.iter().enumerate() {
        let bone = &model.bones[index];
        let user = &bone_poses[index];
        let morph = &morph_poses[index];
        let mut translation = user.translation + morph.translation;
        let mut orientation = (user.orientation * morph.orientation).normalize();

        let inherent = usize::try_from(bone.inherent_parent)
            .ok()
            .filter(|parent| *parent < accumulated.len() && *parent != index);
        if let Some(parent) = inherent {
            let coefficient = bone.inherent_coefficient;
            if bone.has_inherent_orientation() {
                let identity = Quat::new(1.0, 0.0, 0.0, 0.0);
                orientation = (orientation
                    * identity.slerp(accumulated[parent].orientation, coefficient))
                .normalize();
            }
            if bone.has_inherent_translation() {
                translation += accumulated[parent].translation * coefficient;
            }
        }
        accumulated[index] = BonePose {
            translation,
            orientation,
        };

        if let Some(axis) = &bone.fixed_axis {
            orientation = project_twist(orientation, (*axis).into());
        }
        if let Some(axes) = &bone.local_axes {
            orientation = conjugate_into_frame(orientation, axes.x.into(), axes.z.into());
        }

        frame_poses[index] = BonePose {
            translation,
            orientation,
        };
        local_transforms[index] = local_matrix(rest_offsets[index], translation, orientation);
        let parent = usize::try_from(bone.parent)
            .ok()
            .filter(|parent| *parent < world_transforms.len());
        match parent {
            Some(parent) => {
                world_transforms[index] = world_transforms[parent] * local_transforms[index];
                world_orientations[index] = (world_orientations[parent] * orientation).normalize();
            }
            None => {
                world_transforms[index] = local_transforms[index];
                world_orientations[index] = orientation;
            }
        }

        if let Some(constraint) = &model.bones[index].constraint {
            let mut buffers = PoseBuffers {
                frame_poses: &mut frame_poses[..],
                local_transforms: &mut local_transforms[..],
                world_transforms: &mut world_transforms[..],
                world_orientations: &mut world_orientations[..],
                rest_offsets: &rest_offsets[..],
            };
            super::ik::solve(model, index, constraint, &mut buffers);

            // already visited bones hanging off the rewritten chain pick up
            // the new transforms before the traversal moves on
            let mut dirty = vec![false; model.bones.len()];
            for link in &constraint.links {
                if let Ok(bone) = usize::try_from(link.bone) {
                    if bone < dirty.len() {
                        dirty[bone] = true;
                    }
                }
            }
            if let Ok(effector) = usize::try_from(constraint.effector) {
                if effector < dirty.len() {
                    dirty[effector] = true;
                }
            }
            for &earlier in &update_order[..step] {
                if dirty[earlier] {
                    continue;
                }
                let refreshed_parent = usize::try_from(model.bones[earlier].parent)
                    .ok()
                    .filter(|parent| *parent < dirty.len() && dirty[*parent]);
                if refreshed_parent.is_some() {
                    super::ik::refresh(model, &mut buffers, earlier);
                    dirty[earlier] = true;
                }
            }
        }
    }
}

pub(super) fn local_matrix(rest_offset: Vec3, translation: Vec3, orientation: Quat) -> Matrix4<f32> {
    Matrix4::from_translation(rest_offset + translation) * Matrix4::from(orientation)
}

/// Keep only the rotation component around the given axis.
fn project_twist(orientation: Quat, axis: Vec3) -> Quat {
    if axis.magnitude2() <= f32::EPSILON {
        return orientation;
    }
    let axis = axis.normalize();
    let projected = axis * orientation.v.dot(axis);
    let twist = Quat::from_sv(orientation.s, projected);
    if twist.magnitude2() <= f32::EPSILON {
        Quat::new(1.0, 0.0, 0.0, 0.0)
    } else {
        twist.normalize()
    }
}

/// Express the rotation in the frame spanned by the bone's local axes.
fn conjugate_into_frame(orientation: Quat, x: Vec3, z: Vec3) -> Quat {
    let y = z.cross(x);
    if x.magnitude2() <= f32::EPSILON || y.magnitude2() <= f32::EPSILON {
        return orientation;
    }
    let x = x.normalize();
    let y = y.normalize();
    let z = x.cross(y).normalize();
    let basis = Quat::from(Matrix3::from_cols(x, y, z));
    (basis * orientation * basis.conjugate()).normalize()
}
