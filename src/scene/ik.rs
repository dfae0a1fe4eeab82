use super::{PoseBuffers, Quat, Vec3};
use crate::pmx::{AngleLimit, Constraint, Model};
use cgmath::{Euler, InnerSpace, Matrix4, Rad, Rotation3};

const EPSILON: f32 = 1e-6;

/// Cyclic coordinate descent over the constraint's link chain.
///
/// `target` is the bone carrying the constraint; each pass rotates every
/// link so the effector moves towards it, clamping per link angle limits,
/// until the distance converges or the iterations run out.
pub(super) fn solve(
    model: &Model,
    target: usize,
    constraint: &Constraint,
    buffers: &mut PoseBuffers,
) {
    let Ok(effector) = usize::try_from(constraint.effector) else {
        return;
    };
    if effector >= buffers.world_transforms.len() {
        return;
    }
    let target_position = translation_of(&buffers.world_transforms[target]);

    'outer: for _ in 0..constraint.iterations {
        for (depth, link) in constraint.links.iter().enumerate() {
            let Ok(bone) = usize::try_from(link.bone) else {
                continue;
            };
            if bone >= buffers.world_transforms.len() {
                continue;
            }
            let effector_position = translation_of(&buffers.world_transforms[effector]);
            if (effector_position - target_position).magnitude() < EPSILON {
                break 'outer;
            }
            let origin = translation_of(&buffers.world_transforms[bone]);
            let to_effector = effector_position - origin;
            let to_target = target_position - origin;
            if to_effector.magnitude() < EPSILON || to_target.magnitude() < EPSILON {
                continue;
            }
            let to_effector = to_effector.normalize();
            let to_target = to_target.normalize();
            let axis = to_effector.cross(to_target);
            if axis.magnitude() < EPSILON {
                continue;
            }
            let axis = axis.normalize();
            let angle = to_effector
                .dot(to_target)
                .clamp(-1.0, 1.0)
                .acos()
                .min(constraint.angle_limit);

            let local_axis = (buffers.world_orientations[bone].conjugate() * axis).normalize();
            let delta = Quat::from_axis_angle(local_axis, Rad(angle));
            let mut orientation = (buffers.frame_poses[bone].orientation * delta).normalize();
            if let Some(limit) = &link.limit {
                orientation = clamp_euler(orientation, limit);
            }
            buffers.frame_poses[bone].orientation = orientation;
            buffers.local_transforms[bone] = super::skeleton::local_matrix(
                buffers.rest_offsets[bone],
                buffers.frame_poses[bone].translation,
                orientation,
            );
            propagate(model, buffers, constraint, depth, effector);
        }
    }
}

/// Refresh world transforms from the rotated link down to the effector.
/// Links are stored closest-to-effector first, so walk them in reverse.
fn propagate(
    model: &Model,
    buffers: &mut PoseBuffers,
    constraint: &Constraint,
    from: usize,
    effector: usize,
) {
    for link in constraint.links[..=from].iter().rev() {
        if let Ok(bone) = usize::try_from(link.bone) {
            if bone < buffers.world_transforms.len() {
                refresh(model, buffers, bone);
            }
        }
    }
    refresh(model, buffers, effector);
}

pub(super) fn refresh(model: &Model, buffers: &mut PoseBuffers, bone: usize) {
    let parent = usize::try_from(model.bones[bone].parent)
        .ok()
        .filter(|parent| *parent < buffers.world_transforms.len());
    match parent {
        Some(parent) => {
            buffers.world_transforms[bone] =
                buffers.world_transforms[parent] * buffers.local_transforms[bone];
            buffers.world_orientations[bone] = (buffers.world_orientations[parent]
                * buffers.frame_poses[bone].orientation)
                .normalize();
        }
        None => {
            buffers.world_transforms[bone] = buffers.local_transforms[bone];
            buffers.world_orientations[bone] = buffers.frame_poses[bone].orientation;
        }
    }
}

/// Clamp the cumulative local Euler angles per axis and re-derive the
/// quaternion from the clamped angles.
fn clamp_euler(orientation: Quat, limit: &AngleLimit) -> Quat {
    let euler = Euler::from(orientation);
    Quat::from(Euler::new(
        Rad(euler.x.0.clamp(limit.lower.x, limit.upper.x)),
        Rad(euler.y.0.clamp(limit.lower.y, limit.upper.y)),
        Rad(euler.z.0.clamp(limit.lower.z, limit.upper.z)),
    ))
    .normalize()
}

fn translation_of(matrix: &Matrix4<f32>) -> Vec3 {
    matrix.w.truncate()
}
