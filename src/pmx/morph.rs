use crate::pmx::Names;
use crate::{Quaternion, Vector3, Vector4};
use num_enum::TryFromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum MorphCategory {
    System = 0,
    Eyebrow = 1,
    Eye = 2,
    Lip = 3,
    Other = 4,
}

/// Morph kind tag as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum MorphKind {
    Group = 0,
    Vertex = 1,
    Bone = 2,
    Uv = 3,
    Uv1 = 4,
    Uv2 = 5,
    Uv3 = 6,
    Uv4 = 7,
    Material = 8,
    Flip = 9,
    Impulse = 10,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvChannel {
    Primary,
    /// Additional channel 0..4.
    Additional(u8),
}

#[derive(Debug, Clone)]
pub struct Morph {
    pub name: Names,
    pub category: MorphCategory,
    pub payload: MorphPayload,
}

impl Morph {
    pub fn kind(&self) -> MorphKind {
        match &self.payload {
            MorphPayload::Group(_) => MorphKind::Group,
            MorphPayload::Vertex(_) => MorphKind::Vertex,
            MorphPayload::Bone(_) => MorphKind::Bone,
            MorphPayload::Uv(UvChannel::Primary, _) => MorphKind::Uv,
            MorphPayload::Uv(UvChannel::Additional(0), _) => MorphKind::Uv1,
            MorphPayload::Uv(UvChannel::Additional(1), _) => MorphKind::Uv2,
            MorphPayload::Uv(UvChannel::Additional(2), _) => MorphKind::Uv3,
            MorphPayload::Uv(UvChannel::Additional(_), _) => MorphKind::Uv4,
            MorphPayload::Material(_) => MorphKind::Material,
            MorphPayload::Flip(_) => MorphKind::Flip,
            MorphPayload::Impulse(_) => MorphKind::Impulse,
        }
    }
}

/// Tagged per kind payload list; the discriminant is the on-disk kind tag.
#[derive(Debug, Clone)]
pub enum MorphPayload {
    Group(Vec<MorphReference>),
    Vertex(Vec<VertexOffset>),
    Bone(Vec<BoneOffset>),
    Uv(UvChannel, Vec<UvOffset>),
    Material(Vec<MaterialOffset>),
    Flip(Vec<MorphReference>),
    Impulse(Vec<ImpulseOffset>),
}

/// Group and flip morph entry.
#[derive(Debug, Clone)]
pub struct MorphReference {
    pub morph: i32, // -1 == none
    pub weight: f32,
}

#[derive(Debug, Clone)]
pub struct VertexOffset {
    pub vertex: i32,
    pub offset: Vector3,
}

#[derive(Debug, Clone)]
pub struct UvOffset {
    pub vertex: i32,
    pub offset: Vector4,
}

#[derive(Debug, Clone)]
pub struct BoneOffset {
    pub bone: i32,
    pub translation: Vector3,
    pub orientation: Quaternion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum MaterialOperation {
    Multiply = 0,
    Add = 1,
}

#[derive(Debug, Clone)]
pub struct MaterialOffset {
    /// Target material, -1 == every material.
    pub material: i32,
    pub operation: MaterialOperation,
    pub diffuse: Vector4,
    pub specular: Vector3,
    pub specular_power: f32,
    pub ambient: Vector3,
    pub edge_color: Vector4,
    pub edge_size: f32,
    pub texture_tint: Vector4,
    pub sphere_tint: Vector4,
    pub toon_tint: Vector4,
}

#[derive(Debug, Clone)]
pub struct ImpulseOffset {
    pub rigid_body: i32,
    pub is_local: bool,
    pub velocity: Vector3,
    pub torque: Vector3,
}
