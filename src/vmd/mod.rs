use crate::reader::Cursor;
use crate::text::decode_shift_jis;
use crate::{ModelError, Quaternion, Vector3};

const SIGNATURE: &[u8] = b"Vocaloid Motion Data 0002";
const HEADER_LEN: usize = 30;
const MODEL_NAME_LEN: usize = 20;
const NAME_LEN: usize = 15;

/// Bone pose sample. The interpolation block carries the per curve bezier
/// control points the motion sampler evaluates.
#[derive(Debug, Clone)]
pub struct BoneKeyframe {
    pub name: String,
    pub frame: u32,
    pub translation: Vector3,
    pub orientation: Quaternion,
    pub interpolation: [u8; 64],
}

#[derive(Debug, Clone)]
pub struct MorphKeyframe {
    pub name: String,
    pub frame: u32,
    pub weight: f32,
}

/// A VMD motion container.
///
/// Keyframes reference bones and morphs by Shift_JIS name, in file order.
/// Sampling is left to the caller; the per frame snapshot it produces is
/// fed into [`Scene`](crate::Scene).
#[derive(Debug, Clone)]
pub struct Vmd {
    pub model_name: String,
    pub bone_keyframes: Vec<BoneKeyframe>,
    pub morph_keyframes: Vec<MorphKeyframe>,
}

impl Vmd {
    pub fn read(data: &[u8]) -> Result<Self, ModelError> {
        let mut cursor = Cursor::new(data);
        let header = cursor.read_bytes(HEADER_LEN)?;
        if !header.starts_with(SIGNATURE) {
            return Err(ModelError::BadSignature);
        }
        let model_name = decode_shift_jis(cursor.read_bytes(MODEL_NAME_LEN)?)?;

        let count = cursor.read_u32()? as usize;
        let mut bone_keyframes = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            let name = decode_shift_jis(cursor.read_bytes(NAME_LEN)?)?;
            let frame = cursor.read_u32()?;
            let translation = cursor.read_vector3()?;
            let orientation = cursor.read_quaternion()?;
            let mut interpolation = [0; 64];
            interpolation.copy_from_slice(cursor.read_bytes(64)?);
            bone_keyframes.push(BoneKeyframe {
                name,
                frame,
                translation,
                orientation,
                interpolation,
            });
        }

        // ancient exports end after the bone block
        let mut morph_keyframes = Vec::new();
        if !cursor.is_empty() {
            let count = cursor.read_u32()? as usize;
            morph_keyframes.reserve(count.min(cursor.remaining()));
            for _ in 0..count {
                morph_keyframes.push(MorphKeyframe {
                    name: decode_shift_jis(cursor.read_bytes(NAME_LEN)?)?,
                    frame: cursor.read_u32()?,
                    weight: cursor.read_f32()?,
                });
            }
        }
        // camera, light, shadow and IK blocks are outside the model core

        Ok(Vmd {
            model_name,
            bone_keyframes,
            morph_keyframes,
        })
    }

    /// Keyframes of one bone, in file order.
    pub fn bone_track<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a BoneKeyframe> {
        self.bone_keyframes
            .iter()
            .filter(move |keyframe| keyframe.name == name)
    }

    /// Keyframes of one morph, in file order.
    pub fn morph_track<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MorphKeyframe> {
        self.morph_keyframes
            .iter()
            .filter(move |keyframe| keyframe.name == name)
    }
}
