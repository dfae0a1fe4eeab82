use crate::pmx::Names;
use crate::{Vector3, Vector4};
use bitflags::bitflags;
use num_enum::TryFromPrimitive;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MaterialFlags: u8 {
        const NO_CULL = 0x01;
        const GROUND_SHADOW = 0x02;
        const CAST_SHADOW = 0x04;
        const RECEIVE_SHADOW = 0x08;
        const EDGE = 0x10;
        /// PMX 2.1
        const VERTEX_COLOR = 0x20;
        /// PMX 2.1
        const POINT_DRAW = 0x40;
        /// PMX 2.1
        const LINE_DRAW = 0x80;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum SphereMode {
    Disabled = 0,
    Multiply = 1,
    Additive = 2,
    SubTexture = 3,
}

/// Toon shading source, either one of the ten shared toon textures or a
/// texture of this model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToonReference {
    Texture(i32),
    Shared(u8),
}

#[derive(Debug, Clone)]
pub struct Material {
    pub name: Names,
    /// rgb + opacity
    pub diffuse: Vector4,
    pub specular: Vector3,
    pub specular_power: f32,
    pub ambient: Vector3,
    pub flags: MaterialFlags,
    pub edge_color: Vector4,
    pub edge_size: f32,
    pub diffuse_texture: i32, // -1 == none
    pub sphere_texture: i32,  // -1 == none
    pub sphere_mode: SphereMode,
    pub toon: ToonReference,
    pub memo: String,
    /// Length of this material's contiguous span of the shared index buffer.
    pub index_count: u32,
}
