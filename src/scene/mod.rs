mod ik;
mod morph;
mod skeleton;

use crate::pmx::{Material, Model, Vertex};
use crate::{ModelError, Vector3 as WireVector3, Vector4};
use bytemuck::{Pod, Zeroable};
use cgmath::{InnerSpace, Matrix3, Matrix4, SquareMatrix};

type Vec3 = cgmath::Vector3<f32>;
type Quat = cgmath::Quaternion<f32>;

/// Per vertex deformable state, reset to the model baseline every frame.
///
/// The primary UV is zero extended to four components so all four components
/// of a UV morph offset accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct VertexState {
    pub position: WireVector3,
    pub uv: Vector4,
    pub additional_uv: [Vector4; 4],
}

impl From<&Vertex> for VertexState {
    fn from(vertex: &Vertex) -> Self {
        VertexState {
            position: vertex.position,
            uv: Vector4::new(vertex.uv.x, vertex.uv.y, 0.0, 0.0),
            additional_uv: vertex.additional_uv,
        }
    }
}

/// Per material deformable color set. Tint factors start at one.
#[derive(Debug, Clone, Copy, PartialEq, Zeroable, Pod)]
#[repr(C)]
pub struct MaterialState {
    /// rgb + opacity
    pub diffuse: Vector4,
    pub specular: WireVector3,
    pub specular_power: f32,
    pub ambient: WireVector3,
    pub edge_size: f32,
    pub edge_color: Vector4,
    pub texture_tint: Vector4,
    pub sphere_tint: Vector4,
    pub toon_tint: Vector4,
}

impl From<&Material> for MaterialState {
    fn from(material: &Material) -> Self {
        MaterialState {
            diffuse: material.diffuse,
            specular: material.specular,
            specular_power: material.specular_power,
            ambient: material.ambient,
            edge_size: material.edge_size,
            edge_color: material.edge_color,
            texture_tint: Vector4::splat(1.0),
            sphere_tint: Vector4::splat(1.0),
            toon_tint: Vector4::splat(1.0),
        }
    }
}

/// Local rigid pose of a bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BonePose {
    pub translation: Vec3,
    pub orientation: Quat,
}

impl BonePose {
    fn identity() -> Self {
        BonePose {
            translation: Vec3::new(0.0, 0.0, 0.0),
            orientation: Quat::new(1.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Impulse queued by an impulse morph for the physics collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingImpulse {
    pub rigid_body: usize,
    pub is_local: bool,
    pub velocity: WireVector3,
    pub torque: WireVector3,
}

pub(crate) struct PoseBuffers<'a> {
    pub(crate) frame_poses: &'a mut [BonePose],
    pub(crate) local_transforms: &'a mut [Matrix4<f32>],
    pub(crate) world_transforms: &'a mut [Matrix4<f32>],
    pub(crate) world_orientations: &'a mut [Quat],
    pub(crate) rest_offsets: &'a [Vec3],
}

/// A model plus everything that changes per frame.
///
/// The scene persists morph weights and user set bone poses across frames;
/// every other field is derived. A frame is
/// [`apply_morphs`](Scene::apply_morphs) followed by
/// [`update_bones`](Scene::update_bones), always in that order.
#[derive(Debug, Clone)]
pub struct Scene {
    model: Model,
    morph_weights: Vec<f32>,
    bone_poses: Vec<BonePose>,
    vertex_state: Vec<VertexState>,
    material_state: Vec<MaterialState>,
    /// Morph contribution to bone poses, reset each frame.
    morph_poses: Vec<BonePose>,
    /// Resolved local poses of the running frame, rewritten by IK.
    frame_poses: Vec<BonePose>,
    /// Post inherent poses, the values inherent children blend from.
    accumulated: Vec<BonePose>,
    local_transforms: Vec<Matrix4<f32>>,
    world_transforms: Vec<Matrix4<f32>>,
    world_orientations: Vec<Quat>,
    update_order: Vec<usize>,
    /// Bone origin relative to its parent's origin.
    rest_offsets: Vec<Vec3>,
    impulses: Vec<PendingImpulse>,
}

impl Scene {
    pub fn new(model: Model) -> Self {
        let bones = model.bones.len();
        let rest_offsets = model
            .bones
            .iter()
            .map(|bone| {
                let origin = Vec3::from(bone.origin);
                match usize::try_from(bone.parent).ok().and_then(|parent| model.bones.get(parent)) {
                    Some(parent) => origin - Vec3::from(parent.origin),
                    None => origin,
                }
            })
            .collect();
        let world_transforms = model
            .bones
            .iter()
            .map(|bone| Matrix4::from_translation(bone.origin.into()))
            .collect();
        let mut scene = Scene {
            morph_weights: vec![0.0; model.morphs.len()],
            bone_poses: vec![BonePose::identity(); bones],
            vertex_state: Vec::with_capacity(model.vertices.len()),
            material_state: Vec::with_capacity(model.materials.len()),
            morph_poses: vec![BonePose::identity(); bones],
            frame_poses: vec![BonePose::identity(); bones],
            accumulated: vec![BonePose::identity(); bones],
            local_transforms: vec![Matrix4::identity(); bones],
            world_transforms,
            world_orientations: vec![Quat::new(1.0, 0.0, 0.0, 0.0); bones],
            update_order: skeleton::update_order(&model.bones),
            rest_offsets,
            impulses: Vec::new(),
            model,
        };
        scene.reset_derived();
        scene
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn into_model(self) -> Model {
        self.model
    }

    /// Current weight of a morph, 0 when the index is out of range.
    pub fn morph_weight(&self, index: usize) -> f32 {
        self.morph_weights.get(index).copied().unwrap_or(0.0)
    }

    /// Out of range indexes are ignored.
    pub fn set_morph_weight(&mut self, index: usize, weight: f32) {
        if let Some(slot) = self.morph_weights.get_mut(index) {
            *slot = weight;
        }
    }

    pub fn bone_local_pose(&self, index: usize) -> Option<&BonePose> {
        self.bone_poses.get(index)
    }

    pub fn set_bone_local_translation(&mut self, index: usize, translation: Vec3) {
        if let Some(pose) = self.bone_poses.get_mut(index) {
            pose.translation = translation;
        }
    }

    pub fn set_bone_local_orientation(&mut self, index: usize, orientation: Quat) {
        if let Some(pose) = self.bone_poses.get_mut(index) {
            pose.orientation = orientation;
        }
    }

    pub fn bone_world_transform(&self, index: usize) -> Option<Matrix4<f32>> {
        self.world_transforms.get(index).copied()
    }

    pub fn bone_world_orientation(&self, index: usize) -> Option<Quat> {
        self.world_orientations.get(index).copied()
    }

    /// The local pose the last [`update_bones`](Scene::update_bones) pass
    /// resolved for a bone, morphs, inherent blending and IK included.
    pub fn bone_resolved_pose(&self, index: usize) -> Option<&BonePose> {
        self.frame_poses.get(index)
    }

    /// Overwrite a bone's world transform, for simulation results being fed
    /// back by the physics collaborator. The transform must be rigid.
    pub fn set_bone_world_transform(&mut self, index: usize, transform: Matrix4<f32>) {
        if let Some(slot) = self.world_transforms.get_mut(index) {
            *slot = transform;
            self.world_orientations[index] = Quat::from(Matrix3::from_cols(
                transform.x.truncate(),
                transform.y.truncate(),
                transform.z.truncate(),
            ))
            .normalize();
        }
    }

    pub fn vertex_states(&self) -> &[VertexState] {
        &self.vertex_state
    }

    pub fn vertex_state(&self, index: usize) -> Option<&VertexState> {
        self.vertex_state.get(index)
    }

    pub fn material_states(&self) -> &[MaterialState] {
        &self.material_state
    }

    pub fn material_state(&self, index: usize) -> Option<&MaterialState> {
        self.material_state.get(index)
    }

    /// The order [`update_bones`](Scene::update_bones) visits bones in.
    pub fn bone_update_order(&self) -> &[usize] {
        &self.update_order
    }

    pub fn pending_impulses(&self) -> &[PendingImpulse] {
        &self.impulses
    }

    /// Hand the queued impulses to the physics collaborator.
    pub fn drain_impulses(&mut self) -> Vec<PendingImpulse> {
        std::mem::take(&mut self.impulses)
    }

    /// Reset derived state to the baseline, then apply every morph with a
    /// non zero weight.
    ///
    /// A failed frame leaves the baseline untouched; the next call starts
    /// clean.
    pub fn apply_morphs(&mut self) -> Result<(), ModelError> {
        morph::apply(self)
    }

    /// Recompute world transforms in dependency order, solving IK
    /// constraints along the way.
    pub fn update_bones(&mut self) {
        skeleton::update(self);
    }

    /// One full frame: morphs, then bones.
    pub fn deform(&mut self) -> Result<(), ModelError> {
        self.apply_morphs()?;
        self.update_bones();
        Ok(())
    }

    fn reset_derived(&mut self) {
        self.vertex_state.clear();
        self.vertex_state
            .extend(self.model.vertices.iter().map(VertexState::from));
        self.material_state.clear();
        self.material_state
            .extend(self.model.materials.iter().map(MaterialState::from));
        for pose in &mut self.morph_poses {
            *pose = BonePose::identity();
        }
        self.impulses.clear();
    }
}
