use crate::pmx::{
    AngleLimit, Bone, BoneDestination, BoneFlags, BoneOffset, Constraint, ConstraintJoint,
    DisplayFrame, DisplayItem, ImpulseOffset, LocalAxes, Material, MaterialFlags, MaterialOffset,
    Model, Morph, MorphPayload, MorphReference, Names, PhysicsJoint, RigidBody, Skinning, Texture,
    ToonReference, UvChannel, UvOffset, Vertex, VertexOffset,
};
use crate::pmx::{JointKind, MorphCategory, MorphKind, RigidBodyTransform, ShapeKind, SkinningKind, SphereMode};
use crate::reader::{Cursor, IndexWidth};
use crate::{ModelError, TextCodec, Vector3, Vector4};
use num_enum::TryFromPrimitive;
use tracing::debug;

/// Per model decoding parameters from the globals block of the header.
#[derive(Debug, Clone, Copy)]
struct Globals {
    codec: TextCodec,
    additional_uv: usize,
    vertex: IndexWidth,
    texture: IndexWidth,
    material: IndexWidth,
    bone: IndexWidth,
    morph: IndexWidth,
    rigid_body: IndexWidth,
}

fn parse_enum<T: TryFromPrimitive<Primitive = u8>>(
    value: u8,
    what: &'static str,
) -> Result<T, ModelError> {
    T::try_from_primitive(value).map_err(|_| ModelError::OutOfRange {
        what,
        value: u32::from(value),
    })
}

fn read_bool(cursor: &mut Cursor, what: &'static str) -> Result<bool, ModelError> {
    match cursor.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        value => Err(ModelError::OutOfRange {
            what,
            value: u32::from(value),
        }),
    }
}

fn read_text(cursor: &mut Cursor, codec: TextCodec) -> Result<String, ModelError> {
    let bytes = cursor.read_length_prefixed()?;
    Ok(codec.decode(bytes)?)
}

fn read_names(cursor: &mut Cursor, codec: TextCodec) -> Result<Names, ModelError> {
    Ok(Names {
        japanese: read_text(cursor, codec)?,
        english: read_text(cursor, codec)?,
    })
}

fn read_count(cursor: &mut Cursor) -> Result<usize, ModelError> {
    Ok(cursor.read_u32()? as usize)
}

/// Every entry consumes at least one byte, so the remaining buffer length
/// bounds any honest entry count.
fn section_capacity(count: usize, cursor: &Cursor) -> usize {
    count.min(cursor.remaining())
}

pub(super) fn read_model(data: &[u8]) -> Result<Model, ModelError> {
    let mut cursor = Cursor::new(data);
    if cursor.read_bytes(4)? != b"PMX " {
        return Err(ModelError::BadSignature);
    }
    let version = cursor.read_f32()?;
    if version != 2.0 && version != 2.1 {
        return Err(ModelError::UnsupportedVersion(version));
    }
    let globals = read_globals(&mut cursor)?;
    let name = read_names(&mut cursor, globals.codec)?;
    let comment = read_names(&mut cursor, globals.codec)?;
    debug!(version, name = %name.japanese, "read PMX header");

    let count = read_count(&mut cursor)?;
    let mut vertices = Vec::with_capacity(section_capacity(count, &cursor));
    for _ in 0..count {
        vertices.push(read_vertex(&mut cursor, &globals)?);
    }
    debug!(count = vertices.len(), "read vertex section");

    let count = read_count(&mut cursor)?;
    let mut indices = Vec::with_capacity(section_capacity(count, &cursor));
    for _ in 0..count {
        let index = cursor.read_vertex_index(globals.vertex)?;
        if index < 0 || index as usize >= vertices.len() {
            return Err(ModelError::DanglingReference {
                referrer: "index buffer",
                kind: "vertex",
                index,
                len: vertices.len(),
            });
        }
        indices.push(index as u32);
    }

    let count = read_count(&mut cursor)?;
    let mut textures = Vec::with_capacity(section_capacity(count, &cursor));
    for _ in 0..count {
        textures.push(Texture {
            path: read_text(&mut cursor, globals.codec)?,
        });
    }

    let count = read_count(&mut cursor)?;
    let mut materials = Vec::with_capacity(section_capacity(count, &cursor));
    for _ in 0..count {
        materials.push(read_material(&mut cursor, &globals)?);
    }
    debug!(count = materials.len(), "read material section");

    let count = read_count(&mut cursor)?;
    let mut bones = Vec::with_capacity(section_capacity(count, &cursor));
    for _ in 0..count {
        bones.push(read_bone(&mut cursor, &globals)?);
    }
    debug!(count = bones.len(), "read bone section");

    let count = read_count(&mut cursor)?;
    let mut morphs = Vec::with_capacity(section_capacity(count, &cursor));
    for _ in 0..count {
        morphs.push(read_morph(&mut cursor, &globals)?);
    }
    debug!(count = morphs.len(), "read morph section");

    let count = read_count(&mut cursor)?;
    let mut display_frames = Vec::with_capacity(section_capacity(count, &cursor));
    for _ in 0..count {
        display_frames.push(read_display_frame(&mut cursor, &globals)?);
    }

    let count = read_count(&mut cursor)?;
    let mut rigid_bodies = Vec::with_capacity(section_capacity(count, &cursor));
    for _ in 0..count {
        rigid_bodies.push(read_rigid_body(&mut cursor, &globals)?);
    }

    let count = read_count(&mut cursor)?;
    let mut joints = Vec::with_capacity(section_capacity(count, &cursor));
    for _ in 0..count {
        joints.push(read_joint(&mut cursor, &globals)?);
    }
    debug!(
        rigid_bodies = rigid_bodies.len(),
        joints = joints.len(),
        "read physics sections"
    );

    let model = Model {
        version,
        codec: globals.codec,
        additional_uv_count: globals.additional_uv,
        name,
        comment,
        vertices,
        indices,
        textures,
        materials,
        bones,
        morphs,
        display_frames,
        rigid_bodies,
        joints,
    };
    validate(&model)?;
    Ok(model)
}

fn read_globals(cursor: &mut Cursor) -> Result<Globals, ModelError> {
    let length = cursor.read_u8()? as usize;
    if length < 8 {
        return Err(ModelError::OutOfRange {
            what: "globals length",
            value: length as u32,
        });
    }
    let codec = parse_enum(cursor.read_u8()?, "text codec")?;
    let additional_uv = cursor.read_u8()?;
    if additional_uv > 4 {
        return Err(ModelError::OutOfRange {
            what: "additional uv count",
            value: u32::from(additional_uv),
        });
    }
    let mut width = |what| -> Result<IndexWidth, ModelError> { parse_enum(cursor.read_u8()?, what) };
    let globals = Globals {
        codec,
        additional_uv: additional_uv as usize,
        vertex: width("vertex index width")?,
        texture: width("texture index width")?,
        material: width("material index width")?,
        bone: width("bone index width")?,
        morph: width("morph index width")?,
        rigid_body: width("rigid body index width")?,
    };
    cursor.skip(length - 8)?;
    Ok(globals)
}

fn read_vertex(cursor: &mut Cursor, globals: &Globals) -> Result<Vertex, ModelError> {
    let position = cursor.read_vector3()?;
    let normal = cursor.read_vector3()?;
    let uv = cursor.read_vector2()?;
    let mut additional_uv = [Vector4::ZERO; 4];
    for channel in additional_uv.iter_mut().take(globals.additional_uv) {
        *channel = cursor.read_vector4()?;
    }
    let kind = parse_enum(cursor.read_u8()?, "skinning kind")?;
    let skinning = match kind {
        SkinningKind::Bdef1 => Skinning::Bdef1 {
            bone: cursor.read_index(globals.bone)?,
        },
        SkinningKind::Bdef2 => Skinning::Bdef2 {
            bones: [cursor.read_index(globals.bone)?, cursor.read_index(globals.bone)?],
            weight: cursor.read_f32()?,
        },
        SkinningKind::Bdef4 | SkinningKind::Qdef => {
            let bones = [
                cursor.read_index(globals.bone)?,
                cursor.read_index(globals.bone)?,
                cursor.read_index(globals.bone)?,
                cursor.read_index(globals.bone)?,
            ];
            let weights = [
                cursor.read_f32()?,
                cursor.read_f32()?,
                cursor.read_f32()?,
                cursor.read_f32()?,
            ];
            if kind == SkinningKind::Bdef4 {
                Skinning::Bdef4 { bones, weights }
            } else {
                Skinning::Qdef { bones, weights }
            }
        }
        SkinningKind::Sdef => Skinning::Sdef {
            bones: [cursor.read_index(globals.bone)?, cursor.read_index(globals.bone)?],
            weight: cursor.read_f32()?,
            c: cursor.read_vector3()?,
            r0: cursor.read_vector3()?,
            r1: cursor.read_vector3()?,
        },
    };
    Ok(Vertex {
        position,
        normal,
        uv,
        additional_uv,
        skinning,
        edge_scale: cursor.read_f32()?,
    })
}

fn read_material(cursor: &mut Cursor, globals: &Globals) -> Result<Material, ModelError> {
    let name = read_names(cursor, globals.codec)?;
    let diffuse = cursor.read_vector4()?;
    let specular = cursor.read_vector3()?;
    let specular_power = cursor.read_f32()?;
    let ambient = cursor.read_vector3()?;
    let flags = MaterialFlags::from_bits_retain(cursor.read_u8()?);
    let edge_color = cursor.read_vector4()?;
    let edge_size = cursor.read_f32()?;
    let diffuse_texture = cursor.read_index(globals.texture)?;
    let sphere_texture = cursor.read_index(globals.texture)?;
    let sphere_mode = parse_enum::<SphereMode>(cursor.read_u8()?, "sphere mode")?;
    let toon = match cursor.read_u8()? {
        0 => ToonReference::Texture(cursor.read_index(globals.texture)?),
        1 => {
            let index = cursor.read_u8()?;
            if index > 9 {
                return Err(ModelError::OutOfRange {
                    what: "shared toon index",
                    value: u32::from(index),
                });
            }
            ToonReference::Shared(index)
        }
        value => {
            return Err(ModelError::OutOfRange {
                what: "toon mode",
                value: u32::from(value),
            })
        }
    };
    let memo = read_text(cursor, globals.codec)?;
    let index_count = cursor.read_i32()?;
    if index_count < 0 {
        return Err(ModelError::OutOfRange {
            what: "material index count",
            value: index_count as u32,
        });
    }
    Ok(Material {
        name,
        diffuse,
        specular,
        specular_power,
        ambient,
        flags,
        edge_color,
        edge_size,
        diffuse_texture,
        sphere_texture,
        sphere_mode,
        toon,
        memo,
        index_count: index_count as u32,
    })
}

fn read_bone(cursor: &mut Cursor, globals: &Globals) -> Result<Bone, ModelError> {
    let name = read_names(cursor, globals.codec)?;
    let origin = cursor.read_vector3()?;
    let parent = cursor.read_index(globals.bone)?;
    let stage = cursor.read_i32()?;
    let flags = BoneFlags::from_bits_retain(cursor.read_u16()?);

    let destination = if flags.contains(BoneFlags::HAS_DESTINATION_BONE) {
        BoneDestination::Bone(cursor.read_index(globals.bone)?)
    } else {
        BoneDestination::Offset(cursor.read_vector3()?)
    };
    let (inherent_parent, inherent_coefficient) = if flags
        .intersects(BoneFlags::INHERENT_ORIENTATION | BoneFlags::INHERENT_TRANSLATION)
    {
        (cursor.read_index(globals.bone)?, cursor.read_f32()?)
    } else {
        (-1, 0.0)
    };
    let fixed_axis = flags
        .contains(BoneFlags::FIXED_AXIS)
        .then(|| cursor.read_vector3())
        .transpose()?;
    let local_axes = if flags.contains(BoneFlags::LOCAL_AXES) {
        Some(LocalAxes {
            x: cursor.read_vector3()?,
            z: cursor.read_vector3()?,
        })
    } else {
        None
    };
    let external_parent = if flags.contains(BoneFlags::EXTERNAL_PARENT) {
        cursor.read_index(globals.bone)?
    } else {
        -1
    };
    let constraint = flags
        .contains(BoneFlags::HAS_CONSTRAINT)
        .then(|| read_constraint(cursor, globals))
        .transpose()?;

    Ok(Bone {
        name,
        origin,
        parent,
        stage,
        flags,
        destination,
        inherent_parent,
        inherent_coefficient,
        fixed_axis,
        local_axes,
        external_parent,
        constraint,
    })
}

fn read_constraint(cursor: &mut Cursor, globals: &Globals) -> Result<Constraint, ModelError> {
    let effector = cursor.read_index(globals.bone)?;
    let iterations = cursor.read_u32()?;
    let angle_limit = cursor.read_f32()?;
    let count = read_count(cursor)?;
    let mut links = Vec::with_capacity(section_capacity(count, cursor));
    for _ in 0..count {
        let bone = cursor.read_index(globals.bone)?;
        let limit = read_bool(cursor, "angle limit flag")?
            .then(|| -> Result<AngleLimit, ModelError> {
                let lower = cursor.read_vector3()?;
                let upper = cursor.read_vector3()?;
                // some exporters store the bounds swapped
                Ok(AngleLimit {
                    lower: Vector3::new(
                        lower.x.min(upper.x),
                        lower.y.min(upper.y),
                        lower.z.min(upper.z),
                    ),
                    upper: Vector3::new(
                        lower.x.max(upper.x),
                        lower.y.max(upper.y),
                        lower.z.max(upper.z),
                    ),
                })
            })
            .transpose()?;
        links.push(ConstraintJoint { bone, limit });
    }
    Ok(Constraint {
        effector,
        iterations,
        angle_limit,
        links,
    })
}

fn read_morph(cursor: &mut Cursor, globals: &Globals) -> Result<Morph, ModelError> {
    let name = read_names(cursor, globals.codec)?;
    let category: MorphCategory = parse_enum(cursor.read_u8()?, "morph category")?;
    let kind: MorphKind = parse_enum(cursor.read_u8()?, "morph kind")?;
    let count = read_count(cursor)?;

    let payload = match kind {
        MorphKind::Group | MorphKind::Flip => {
            let mut items = Vec::with_capacity(section_capacity(count, cursor));
            for _ in 0..count {
                items.push(MorphReference {
                    morph: cursor.read_index(globals.morph)?,
                    weight: cursor.read_f32()?,
                });
            }
            if kind == MorphKind::Group {
                MorphPayload::Group(items)
            } else {
                MorphPayload::Flip(items)
            }
        }
        MorphKind::Vertex => {
            let mut items = Vec::with_capacity(section_capacity(count, cursor));
            for _ in 0..count {
                items.push(VertexOffset {
                    vertex: cursor.read_vertex_index(globals.vertex)?,
                    offset: cursor.read_vector3()?,
                });
            }
            MorphPayload::Vertex(items)
        }
        MorphKind::Bone => {
            let mut items = Vec::with_capacity(section_capacity(count, cursor));
            for _ in 0..count {
                items.push(BoneOffset {
                    bone: cursor.read_index(globals.bone)?,
                    translation: cursor.read_vector3()?,
                    orientation: cursor.read_quaternion()?,
                });
            }
            MorphPayload::Bone(items)
        }
        MorphKind::Uv | MorphKind::Uv1 | MorphKind::Uv2 | MorphKind::Uv3 | MorphKind::Uv4 => {
            let channel = match kind {
                MorphKind::Uv => UvChannel::Primary,
                MorphKind::Uv1 => UvChannel::Additional(0),
                MorphKind::Uv2 => UvChannel::Additional(1),
                MorphKind::Uv3 => UvChannel::Additional(2),
                _ => UvChannel::Additional(3),
            };
            let mut items = Vec::with_capacity(section_capacity(count, cursor));
            for _ in 0..count {
                items.push(UvOffset {
                    vertex: cursor.read_vertex_index(globals.vertex)?,
                    offset: cursor.read_vector4()?,
                });
            }
            MorphPayload::Uv(channel, items)
        }
        MorphKind::Material => {
            let mut items = Vec::with_capacity(section_capacity(count, cursor));
            for _ in 0..count {
                items.push(MaterialOffset {
                    material: cursor.read_index(globals.material)?,
                    operation: parse_enum(cursor.read_u8()?, "material morph operation")?,
                    diffuse: cursor.read_vector4()?,
                    specular: cursor.read_vector3()?,
                    specular_power: cursor.read_f32()?,
                    ambient: cursor.read_vector3()?,
                    edge_color: cursor.read_vector4()?,
                    edge_size: cursor.read_f32()?,
                    texture_tint: cursor.read_vector4()?,
                    sphere_tint: cursor.read_vector4()?,
                    toon_tint: cursor.read_vector4()?,
                });
            }
            MorphPayload::Material(items)
        }
        MorphKind::Impulse => {
            let mut items = Vec::with_capacity(section_capacity(count, cursor));
            for _ in 0..count {
                items.push(ImpulseOffset {
                    rigid_body: cursor.read_index(globals.rigid_body)?,
                    is_local: read_bool(cursor, "impulse local flag")?,
                    velocity: cursor.read_vector3()?,
                    torque: cursor.read_vector3()?,
                });
            }
            MorphPayload::Impulse(items)
        }
    };
    Ok(Morph {
        name,
        category,
        payload,
    })
}

fn read_display_frame(cursor: &mut Cursor, globals: &Globals) -> Result<DisplayFrame, ModelError> {
    let name = read_names(cursor, globals.codec)?;
    let special = read_bool(cursor, "display frame flag")?;
    let count = read_count(cursor)?;
    let mut items = Vec::with_capacity(section_capacity(count, cursor));
    for _ in 0..count {
        items.push(match cursor.read_u8()? {
            0 => DisplayItem::Bone(cursor.read_index(globals.bone)?),
            1 => DisplayItem::Morph(cursor.read_index(globals.morph)?),
            value => {
                return Err(ModelError::OutOfRange {
                    what: "display item kind",
                    value: u32::from(value),
                })
            }
        });
    }
    Ok(DisplayFrame {
        name,
        special,
        items,
    })
}

fn read_rigid_body(cursor: &mut Cursor, globals: &Globals) -> Result<RigidBody, ModelError> {
    Ok(RigidBody {
        name: read_names(cursor, globals.codec)?,
        bone: cursor.read_index(globals.bone)?,
        collision_group: cursor.read_u8()?,
        collision_mask: cursor.read_u16()?,
        shape: parse_enum::<ShapeKind>(cursor.read_u8()?, "rigid body shape")?,
        size: cursor.read_vector3()?,
        origin: cursor.read_vector3()?,
        orientation: cursor.read_vector3()?,
        mass: cursor.read_f32()?,
        linear_damping: cursor.read_f32()?,
        angular_damping: cursor.read_f32()?,
        restitution: cursor.read_f32()?,
        friction: cursor.read_f32()?,
        transform: parse_enum::<RigidBodyTransform>(cursor.read_u8()?, "rigid body transform")?,
    })
}

fn read_joint(cursor: &mut Cursor, globals: &Globals) -> Result<PhysicsJoint, ModelError> {
    Ok(PhysicsJoint {
        name: read_names(cursor, globals.codec)?,
        kind: parse_enum::<JointKind>(cursor.read_u8()?, "joint kind")?,
        body_a: cursor.read_index(globals.rigid_body)?,
        body_b: cursor.read_index(globals.rigid_body)?,
        origin: cursor.read_vector3()?,
        orientation: cursor.read_vector3()?,
        linear_lower: cursor.read_vector3()?,
        linear_upper: cursor.read_vector3()?,
        angular_lower: cursor.read_vector3()?,
        angular_upper: cursor.read_vector3()?,
        linear_stiffness: cursor.read_vector3()?,
        angular_stiffness: cursor.read_vector3()?,
    })
}

fn check(
    referrer: &'static str,
    kind: &'static str,
    index: i32,
    len: usize,
) -> Result<(), ModelError> {
    if index < 0 || (index as usize) < len {
        Ok(())
    } else {
        Err(ModelError::DanglingReference {
            referrer,
            kind,
            index,
            len,
        })
    }
}

/// Walk every stored cross-reference of a freshly read model.
fn validate(model: &Model) -> Result<(), ModelError> {
    let bones = model.bones.len();
    let vertices = model.vertices.len();
    let textures = model.textures.len();
    let materials = model.materials.len();
    let morphs = model.morphs.len();
    let rigid_bodies = model.rigid_bodies.len();

    for vertex in &model.vertices {
        for &bone in vertex.skinning.bones() {
            check("vertex", "bone", bone, bones)?;
        }
    }

    let mut spanned = 0usize;
    for material in &model.materials {
        check("material", "texture", material.diffuse_texture, textures)?;
        check("material", "texture", material.sphere_texture, textures)?;
        if let ToonReference::Texture(index) = material.toon {
            check("material", "texture", index, textures)?;
        }
        spanned += material.index_count as usize;
    }
    if spanned != model.indices.len() {
        return Err(ModelError::DanglingReference {
            referrer: "material spans",
            kind: "index buffer entry",
            index: spanned as i32,
            len: model.indices.len(),
        });
    }

    for bone in &model.bones {
        check("bone", "bone", bone.parent, bones)?;
        if let BoneDestination::Bone(index) = bone.destination {
            check("bone", "bone", index, bones)?;
        }
        check("bone", "bone", bone.inherent_parent, bones)?;
        check("bone", "bone", bone.external_parent, bones)?;
        if let Some(constraint) = &bone.constraint {
            check("constraint", "bone", constraint.effector, bones)?;
            for link in &constraint.links {
                check("constraint link", "bone", link.bone, bones)?;
            }
        }
    }

    for morph in &model.morphs {
        match &morph.payload {
            MorphPayload::Group(items) | MorphPayload::Flip(items) => {
                for item in items {
                    check("morph", "morph", item.morph, morphs)?;
                }
            }
            MorphPayload::Vertex(items) => {
                for item in items {
                    check("morph", "vertex", item.vertex, vertices)?;
                }
            }
            MorphPayload::Uv(_, items) => {
                for item in items {
                    check("morph", "vertex", item.vertex, vertices)?;
                }
            }
            MorphPayload::Bone(items) => {
                for item in items {
                    check("morph", "bone", item.bone, bones)?;
                }
            }
            MorphPayload::Material(items) => {
                for item in items {
                    check("morph", "material", item.material, materials)?;
                }
            }
            MorphPayload::Impulse(items) => {
                for item in items {
                    check("morph", "rigid body", item.rigid_body, rigid_bodies)?;
                }
            }
        }
    }

    for frame in &model.display_frames {
        for item in &frame.items {
            match *item {
                DisplayItem::Bone(index) => check("display frame", "bone", index, bones)?,
                DisplayItem::Morph(index) => check("display frame", "morph", index, morphs)?,
            }
        }
    }

    for body in &model.rigid_bodies {
        check("rigid body", "bone", body.bone, bones)?;
    }
    for joint in &model.joints {
        check("joint", "rigid body", joint.body_a, rigid_bodies)?;
        check("joint", "rigid body", joint.body_b, rigid_bodies)?;
    }
    Ok(())
}
