use crate::{Vector2, Vector3, Vector4};
use num_enum::TryFromPrimitive;

#[derive(Debug, Clone)]
pub struct Vertex {
    pub position: Vector3,
    pub normal: Vector3,
    pub uv: Vector2,
    /// Up to four additional 4D UV channels; unused channels stay zero.
    pub additional_uv: [Vector4; 4],
    pub skinning: Skinning,
    pub edge_scale: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum SkinningKind {
    Bdef1 = 0,
    Bdef2 = 1,
    Bdef4 = 2,
    Sdef = 3,
    Qdef = 4,
}

/// Per vertex bone weighting. Bone references are indexes, -1 == none.
#[derive(Debug, Clone)]
pub enum Skinning {
    Bdef1 {
        bone: i32,
    },
    Bdef2 {
        bones: [i32; 2],
        weight: f32,
    },
    Bdef4 {
        bones: [i32; 4],
        weights: [f32; 4],
    },
    Sdef {
        bones: [i32; 2],
        weight: f32,
        c: Vector3,
        r0: Vector3,
        r1: Vector3,
    },
    Qdef {
        bones: [i32; 4],
        weights: [f32; 4],
    },
}

impl Skinning {
    pub fn kind(&self) -> SkinningKind {
        match self {
            Skinning::Bdef1 { .. } => SkinningKind::Bdef1,
            Skinning::Bdef2 { .. } => SkinningKind::Bdef2,
            Skinning::Bdef4 { .. } => SkinningKind::Bdef4,
            Skinning::Sdef { .. } => SkinningKind::Sdef,
            Skinning::Qdef { .. } => SkinningKind::Qdef,
        }
    }

    pub fn bones(&self) -> &[i32] {
        match self {
            Skinning::Bdef1 { bone } => std::slice::from_ref(bone),
            Skinning::Bdef2 { bones, .. } | Skinning::Sdef { bones, .. } => bones,
            Skinning::Bdef4 { bones, .. } | Skinning::Qdef { bones, .. } => bones,
        }
    }
}
