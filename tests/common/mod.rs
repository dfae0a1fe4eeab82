//! Synthesized PMX byte streams for the parser and pipeline tests.
//!
//! Every fixture uses UTF-8 text and one byte index widths, so entries can
//! be assembled by hand without tracking the header.
#![allow(dead_code)]

pub fn text(value: &str) -> Vec<u8> {
    let mut bytes = (value.len() as u32).to_le_bytes().to_vec();
    bytes.extend_from_slice(value.as_bytes());
    bytes
}

pub fn f32s(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

pub fn count(value: u32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// A PMX file built from raw section entries.
#[derive(Default)]
pub struct Fixture {
    pub additional_uv: u8,
    pub vertices: Vec<Vec<u8>>,
    pub indices: Vec<u32>,
    pub textures: Vec<&'static str>,
    pub materials: Vec<Vec<u8>>,
    pub bones: Vec<Vec<u8>>,
    pub morphs: Vec<Vec<u8>>,
    pub display_frames: Vec<Vec<u8>>,
    pub rigid_bodies: Vec<Vec<u8>>,
    pub joints: Vec<Vec<u8>>,
}

impl Fixture {
    pub fn build(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"PMX ");
        bytes.extend_from_slice(&2.0f32.to_le_bytes());
        bytes.push(8);
        bytes.extend_from_slice(&[1, self.additional_uv, 1, 1, 1, 1, 1, 1]);
        for _ in 0..4 {
            bytes.extend(text(""));
        }

        section(&mut bytes, &self.vertices);
        bytes.extend(count(self.indices.len() as u32));
        for &index in &self.indices {
            bytes.push(index as u8);
        }
        bytes.extend(count(self.textures.len() as u32));
        for path in &self.textures {
            bytes.extend(text(path));
        }
        section(&mut bytes, &self.materials);
        section(&mut bytes, &self.bones);
        section(&mut bytes, &self.morphs);
        section(&mut bytes, &self.display_frames);
        section(&mut bytes, &self.rigid_bodies);
        section(&mut bytes, &self.joints);
        bytes
    }
}

fn section(bytes: &mut Vec<u8>, entries: &[Vec<u8>]) {
    bytes.extend(count(entries.len() as u32));
    for entry in entries {
        bytes.extend_from_slice(entry);
    }
}

/// Vertex at `position` weighted entirely to bone 0.
pub fn vertex(position: [f32; 3]) -> Vec<u8> {
    let mut bytes = f32s(&position);
    bytes.extend(f32s(&[0.0, 1.0, 0.0])); // normal
    bytes.extend(f32s(&[0.0, 0.0])); // uv
    bytes.push(0); // BDEF1
    bytes.push(0); // bone 0
    bytes.extend(f32s(&[1.0])); // edge scale
    bytes
}

/// Bone entry; `extra` holds the flag dependent blocks that follow the
/// destination (inherent parent, axes, constraint).
pub fn bone(
    name: &str,
    english: &str,
    parent: i32,
    origin: [f32; 3],
    stage: i32,
    flags: u16,
    extra: &[u8],
) -> Vec<u8> {
    let mut bytes = text(name);
    bytes.extend(text(english));
    bytes.extend(f32s(&origin));
    bytes.push(parent as u8);
    bytes.extend_from_slice(&stage.to_le_bytes());
    bytes.extend_from_slice(&flags.to_le_bytes());
    if flags & 0x0001 == 0 {
        bytes.extend(f32s(&[0.0; 3])); // destination offset
    }
    bytes.extend_from_slice(extra);
    bytes
}

/// Constraint block for a bone entry with the CONSTRAINT flag (0x0020).
pub fn constraint(effector: i32, iterations: u32, angle_limit: f32, links: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = vec![effector as u8];
    bytes.extend_from_slice(&iterations.to_le_bytes());
    bytes.extend(f32s(&[angle_limit]));
    bytes.extend(count(links.len() as u32));
    for link in links {
        bytes.extend_from_slice(link);
    }
    bytes
}

pub fn link(bone: i32) -> Vec<u8> {
    vec![bone as u8, 0]
}

pub fn limited_link(bone: i32, lower: [f32; 3], upper: [f32; 3]) -> Vec<u8> {
    let mut bytes = vec![bone as u8, 1];
    bytes.extend(f32s(&lower));
    bytes.extend(f32s(&upper));
    bytes
}

pub fn material(name: &str, diffuse: [f32; 4], texture: i32, index_count: u32) -> Vec<u8> {
    let mut bytes = text(name);
    bytes.extend(text(name));
    bytes.extend(f32s(&diffuse));
    bytes.extend(f32s(&[0.2, 0.2, 0.2])); // specular
    bytes.extend(f32s(&[5.0])); // specular power
    bytes.extend(f32s(&[0.4, 0.4, 0.4])); // ambient
    bytes.push(0); // flags
    bytes.extend(f32s(&[0.0, 0.0, 0.0, 1.0])); // edge color
    bytes.extend(f32s(&[1.0])); // edge size
    bytes.push(texture as u8); // diffuse texture
    bytes.push(0xff); // sphere texture
    bytes.push(0); // sphere mode
    bytes.push(1); // shared toon
    bytes.push(0);
    bytes.extend(text(""));
    bytes.extend_from_slice(&(index_count as i32).to_le_bytes());
    bytes
}

pub fn morph(name: &str, kind: u8, items: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = text(name);
    bytes.extend(text(name));
    bytes.push(4); // category: other
    bytes.push(kind);
    bytes.extend(count(items.len() as u32));
    for item in items {
        bytes.extend_from_slice(item);
    }
    bytes
}

pub fn vertex_offset(vertex: u8, offset: [f32; 3]) -> Vec<u8> {
    let mut bytes = vec![vertex];
    bytes.extend(f32s(&offset));
    bytes
}

pub fn uv_offset(vertex: u8, offset: [f32; 4]) -> Vec<u8> {
    let mut bytes = vec![vertex];
    bytes.extend(f32s(&offset));
    bytes
}

pub fn bone_offset(bone: u8, translation: [f32; 3], orientation: [f32; 4]) -> Vec<u8> {
    let mut bytes = vec![bone];
    bytes.extend(f32s(&translation));
    bytes.extend(f32s(&orientation));
    bytes
}

pub fn morph_reference(morph: i32, weight: f32) -> Vec<u8> {
    let mut bytes = vec![morph as u8];
    bytes.extend(f32s(&[weight]));
    bytes
}

/// Material morph item; `scalars` feeds every color and factor slot.
pub fn material_offset(material: i32, operation: u8, scalars: f32) -> Vec<u8> {
    let mut bytes = vec![material as u8, operation];
    bytes.extend(f32s(&[scalars; 28]));
    bytes
}

pub fn impulse_offset(rigid_body: u8, local: bool, velocity: [f32; 3], torque: [f32; 3]) -> Vec<u8> {
    let mut bytes = vec![rigid_body, local as u8];
    bytes.extend(f32s(&velocity));
    bytes.extend(f32s(&torque));
    bytes
}

pub fn rigid_body(name: &str, bone: i32) -> Vec<u8> {
    let mut bytes = text(name);
    bytes.extend(text(name));
    bytes.push(bone as u8);
    bytes.push(0); // collision group
    bytes.extend_from_slice(&0u16.to_le_bytes()); // collision mask
    bytes.push(0); // sphere
    bytes.extend(f32s(&[1.0, 1.0, 1.0])); // size
    bytes.extend(f32s(&[0.0; 3])); // origin
    bytes.extend(f32s(&[0.0; 3])); // orientation
    bytes.extend(f32s(&[1.0, 0.1, 0.1, 0.0, 0.5])); // mass, damping, restitution, friction
    bytes.push(1); // from simulation
    bytes
}

pub fn joint(name: &str, body_a: i32, body_b: i32) -> Vec<u8> {
    let mut bytes = text(name);
    bytes.extend(text(name));
    bytes.push(0); // spring 6dof
    bytes.push(body_a as u8);
    bytes.push(body_b as u8);
    bytes.extend(f32s(&[0.0; 24]));
    bytes
}

pub fn display_frame(name: &str, items: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = text(name);
    bytes.extend(text(name));
    bytes.push(0); // not special
    bytes.extend(count(items.len() as u32));
    for item in items {
        bytes.extend_from_slice(item);
    }
    bytes
}

pub fn display_bone(bone: u8) -> Vec<u8> {
    vec![0, bone]
}

pub fn display_morph(morph: u8) -> Vec<u8> {
    vec![1, morph]
}
