use super::{BonePose, MaterialState, PendingImpulse, Quat, Scene, VertexState};
use crate::pmx::{MaterialOffset, MaterialOperation, Model, MorphPayload, UvChannel};
use crate::{ModelError, Vector3, Vector4};
use cgmath::InnerSpace;

struct Targets<'a> {
    vertices: &'a mut [VertexState],
    materials: &'a mut [MaterialState],
    bones: &'a mut [BonePose],
    impulses: &'a mut Vec<PendingImpulse>,
}

pub(super) fn apply(scene: &mut Scene) -> Result<(), ModelError> {
    scene.reset_derived();
    let effective = effective_weights(&scene.model, &scene.morph_weights);
    let Scene {
        model,
        vertex_state,
        material_state,
        morph_poses,
        impulses,
        ..
    } = scene;
    let mut targets = Targets {
        vertices: &mut vertex_state[..],
        materials: &mut material_state[..],
        bones: &mut morph_poses[..],
        impulses,
    };
    let mut visiting = vec![false; model.morphs.len()];
    for index in 0..model.morphs.len() {
        let weight = effective[index];
        if weight == 0.0 || matches!(model.morphs[index].payload, MorphPayload::Flip(_)) {
            continue;
        }
        apply_morph(model, index, weight, &mut targets, &mut visiting)?;
    }
    Ok(())
}

/// The frame's weight table: the persisted weights with flip morph
/// overrides folded in. A flip morph with weight `w` picks the first child
/// whose cumulative entry weight strictly exceeds `w` (the last child once
/// `w` reaches the total) and forces its children to 1 / 0 for this frame.
fn effective_weights(model: &Model, weights: &[f32]) -> Vec<f32> {
    let mut effective = weights.to_vec();
    for (index, morph) in model.morphs.iter().enumerate() {
        let MorphPayload::Flip(items) = &morph.payload else {
            continue;
        };
        let weight = weights[index];
        if weight == 0.0 || items.is_empty() {
            continue;
        }
        let mut cumulative = 0.0;
        let mut chosen = items.len() - 1;
        for (child, item) in items.iter().enumerate() {
            cumulative += item.weight;
            if weight < cumulative {
                chosen = child;
                break;
            }
        }
        for (child, item) in items.iter().enumerate() {
            if let Ok(target) = usize::try_from(item.morph) {
                if let Some(slot) = effective.get_mut(target) {
                    *slot = if child == chosen { 1.0 } else { 0.0 };
                }
            }
        }
    }
    effective
}

fn apply_morph(
    model: &Model,
    index: usize,
    weight: f32,
    targets: &mut Targets,
    visiting: &mut [bool],
) -> Result<(), ModelError> {
    if visiting[index] {
        return Err(ModelError::MorphCycle(index));
    }
    match &model.morphs[index].payload {
        MorphPayload::Vertex(items) => {
            for item in items {
                if let Some(vertex) = target_mut(targets.vertices, item.vertex) {
                    vertex.position += item.offset * weight;
                }
            }
        }
        MorphPayload::Uv(channel, items) => {
            for item in items {
                if let Some(vertex) = target_mut(targets.vertices, item.vertex) {
                    let target = match channel {
                        UvChannel::Primary => &mut vertex.uv,
                        UvChannel::Additional(slot) => &mut vertex.additional_uv[*slot as usize],
                    };
                    *target += item.offset * weight;
                }
            }
        }
        MorphPayload::Bone(items) => {
            for item in items {
                if let Some(pose) = target_mut(targets.bones, item.bone) {
                    pose.translation += cgmath::Vector3::from(item.translation) * weight;
                    let offset = Quat::from(item.orientation);
                    let identity = Quat::new(1.0, 0.0, 0.0, 0.0);
                    pose.orientation =
                        (pose.orientation * identity.slerp(offset, weight)).normalize();
                }
            }
        }
        MorphPayload::Material(items) => {
            for item in items {
                if item.material < 0 {
                    for material in targets.materials.iter_mut() {
                        blend_material(material, item, weight);
                    }
                } else if let Some(material) = target_mut(targets.materials, item.material) {
                    blend_material(material, item, weight);
                }
            }
        }
        MorphPayload::Group(items) => {
            visiting[index] = true;
            for item in items {
                let contribution = weight * item.weight;
                if contribution == 0.0 {
                    continue;
                }
                if let Ok(child) = usize::try_from(item.morph) {
                    if child < model.morphs.len() {
                        apply_morph(model, child, contribution, targets, visiting)?;
                    }
                }
            }
            visiting[index] = false;
        }
        // flip morphs act through the weight table only
        MorphPayload::Flip(_) => {}
        MorphPayload::Impulse(items) => {
            for item in items {
                if let Ok(rigid_body) = usize::try_from(item.rigid_body) {
                    if rigid_body < model.rigid_bodies.len() {
                        targets.impulses.push(PendingImpulse {
                            rigid_body,
                            is_local: item.is_local,
                            velocity: item.velocity * weight,
                            torque: item.torque * weight,
                        });
                    }
                }
            }
        }
    }
    Ok(())
}

fn target_mut<T>(items: &mut [T], index: i32) -> Option<&mut T> {
    usize::try_from(index).ok().and_then(|index| items.get_mut(index))
}

fn blend_material(state: &mut MaterialState, offset: &MaterialOffset, weight: f32) {
    match offset.operation {
        MaterialOperation::Add => {
            state.diffuse += offset.diffuse * weight;
            state.specular += offset.specular * weight;
            state.specular_power += offset.specular_power * weight;
            state.ambient += offset.ambient * weight;
            state.edge_color += offset.edge_color * weight;
            state.edge_size += offset.edge_size * weight;
            state.texture_tint += offset.texture_tint * weight;
            state.sphere_tint += offset.sphere_tint * weight;
            state.toon_tint += offset.toon_tint * weight;
        }
        MaterialOperation::Multiply => {
            multiply4(&mut state.diffuse, offset.diffuse, weight);
            multiply3(&mut state.specular, offset.specular, weight);
            state.specular_power *= 1.0 + offset.specular_power * weight;
            multiply3(&mut state.ambient, offset.ambient, weight);
            multiply4(&mut state.edge_color, offset.edge_color, weight);
            state.edge_size *= 1.0 + offset.edge_size * weight;
            multiply4(&mut state.texture_tint, offset.texture_tint, weight);
            multiply4(&mut state.sphere_tint, offset.sphere_tint, weight);
            multiply4(&mut state.toon_tint, offset.toon_tint, weight);
        }
    }
}

fn multiply3(value: &mut Vector3, offset: Vector3, weight: f32) {
    value.x *= 1.0 + offset.x * weight;
    value.y *= 1.0 + offset.y * weight;
    value.z *= 1.0 + offset.z * weight;
}

fn multiply4(value: &mut Vector4, offset: Vector4, weight: f32) {
    value.x *= 1.0 + offset.x * weight;
    value.y *= 1.0 + offset.y * weight;
    value.z *= 1.0 + offset.z * weight;
    value.w *= 1.0 + offset.w * weight;
}
