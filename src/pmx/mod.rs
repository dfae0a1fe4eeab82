mod bone;
mod display;
mod material;
mod morph;
mod physics;
mod read;
mod vertex;

pub use bone::*;
pub use display::*;
pub use material::*;
pub use morph::*;
pub use physics::*;
pub use vertex::*;

use crate::{Handle, ModelError, TextCodec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Japanese,
    English,
}

/// Japanese and english name pair carried by every named entity.
#[derive(Debug, Clone, Default)]
pub struct Names {
    pub japanese: String,
    pub english: String,
}

impl Names {
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Japanese => &self.japanese,
            Language::English => &self.english,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Texture {
    pub path: String,
}

/// A loaded PMX model.
///
/// Entities live in flat arrays and reference each other by index into
/// those arrays; a negative stored index means "no referent". The model is
/// the loader's baseline and is never mutated after loading, per frame
/// deformation state lives in [`Scene`](crate::Scene).
#[derive(Debug, Clone)]
pub struct Model {
    pub version: f32,
    pub codec: TextCodec,
    pub additional_uv_count: usize,
    pub name: Names,
    pub comment: Names,
    pub vertices: Vec<Vertex>,
    /// Triangle list partitioned into per material spans.
    pub indices: Vec<u32>,
    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,
    pub bones: Vec<Bone>,
    pub morphs: Vec<Morph>,
    pub display_frames: Vec<DisplayFrame>,
    pub rigid_bodies: Vec<RigidBody>,
    pub joints: Vec<PhysicsJoint>,
}

fn get<T>(items: &[T], index: i32) -> Option<&T> {
    usize::try_from(index).ok().and_then(|index| items.get(index))
}

impl Model {
    pub fn read(data: &[u8]) -> Result<Self, ModelError> {
        read::read_model(data)
    }

    pub fn name(&self, language: Language) -> &str {
        self.name.get(language)
    }

    pub fn comment(&self, language: Language) -> &str {
        self.comment.get(language)
    }

    pub fn vertex(&self, index: i32) -> Option<&Vertex> {
        get(&self.vertices, index)
    }

    pub fn texture(&self, index: i32) -> Option<&Texture> {
        get(&self.textures, index)
    }

    pub fn material(&self, index: i32) -> Option<Handle<'_, Material>> {
        get(&self.materials, index).map(|material| Handle::new(self, material))
    }

    pub fn bone(&self, index: i32) -> Option<Handle<'_, Bone>> {
        get(&self.bones, index).map(|bone| Handle::new(self, bone))
    }

    pub fn morph(&self, index: i32) -> Option<&Morph> {
        get(&self.morphs, index)
    }

    pub fn display_frame(&self, index: i32) -> Option<&DisplayFrame> {
        get(&self.display_frames, index)
    }

    pub fn rigid_body(&self, index: i32) -> Option<Handle<'_, RigidBody>> {
        get(&self.rigid_bodies, index).map(|body| Handle::new(self, body))
    }

    pub fn joint(&self, index: i32) -> Option<Handle<'_, PhysicsJoint>> {
        get(&self.joints, index).map(|joint| Handle::new(self, joint))
    }

    /// Index of the first bone with the given name, in either language.
    pub fn bone_by_name(&self, name: &str) -> Option<usize> {
        self.bones
            .iter()
            .position(|bone| bone.name.japanese == name || bone.name.english == name)
    }

    /// Index of the first morph with the given name, in either language.
    pub fn morph_by_name(&self, name: &str) -> Option<usize> {
        self.morphs
            .iter()
            .position(|morph| morph.name.japanese == name || morph.name.english == name)
    }
}
