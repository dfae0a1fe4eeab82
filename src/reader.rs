use crate::{ModelError, Quaternion, Vector2, Vector3, Vector4};
use num_enum::TryFromPrimitive;

/// Width of a cross-reference index, fixed per model by the PMX header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum IndexWidth {
    Byte = 1,
    Short = 2,
    Int = 4,
}

macro_rules! read_primitive {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self) -> Result<$ty, ModelError> {
            let mut buf = [0; std::mem::size_of::<$ty>()];
            let len = buf.len();
            buf.copy_from_slice(self.take(len)?);
            Ok(<$ty>::from_le_bytes(buf))
        }
    };
}

/// Positioned little-endian reader over an in-memory byte slice.
///
/// Every read either advances the position and returns the value or fails
/// with [`ModelError::Eof`]; a cursor that returned an error should not be
/// reused.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Cursor { data, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_empty(&self) -> bool {
        self.position == self.data.len()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], ModelError> {
        let end = self
            .position
            .checked_add(count)
            .filter(|end| *end <= self.data.len())
            .ok_or(ModelError::Eof(self.position))?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    pub fn skip(&mut self, count: usize) -> Result<(), ModelError> {
        self.take(count).map(|_| ())
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], ModelError> {
        self.take(count)
    }

    /// u32 little-endian byte count followed by that many bytes.
    pub fn read_length_prefixed(&mut self) -> Result<&'a [u8], ModelError> {
        let length = self.read_u32()? as usize;
        self.take(length)
    }

    read_primitive!(read_u8, u8);
    read_primitive!(read_u16, u16);
    read_primitive!(read_u32, u32);
    read_primitive!(read_i8, i8);
    read_primitive!(read_i16, i16);
    read_primitive!(read_i32, i32);
    read_primitive!(read_f32, f32);

    pub fn read_vector2(&mut self) -> Result<Vector2, ModelError> {
        Ok(Vector2 {
            x: self.read_f32()?,
            y: self.read_f32()?,
        })
    }

    pub fn read_vector3(&mut self) -> Result<Vector3, ModelError> {
        Ok(Vector3 {
            x: self.read_f32()?,
            y: self.read_f32()?,
            z: self.read_f32()?,
        })
    }

    pub fn read_vector4(&mut self) -> Result<Vector4, ModelError> {
        Ok(Vector4 {
            x: self.read_f32()?,
            y: self.read_f32()?,
            z: self.read_f32()?,
            w: self.read_f32()?,
        })
    }

    pub fn read_quaternion(&mut self) -> Result<Quaternion, ModelError> {
        Ok(Quaternion {
            x: self.read_f32()?,
            y: self.read_f32()?,
            z: self.read_f32()?,
            w: self.read_f32()?,
        })
    }

    /// Signed fixed-width index; the all-ones "none" pattern of every width
    /// sign-extends to -1.
    pub fn read_index(&mut self, width: IndexWidth) -> Result<i32, ModelError> {
        Ok(match width {
            IndexWidth::Byte => i32::from(self.read_i8()?),
            IndexWidth::Short => i32::from(self.read_i16()?),
            IndexWidth::Int => self.read_i32()?,
        })
    }

    /// Unsigned fixed-width index; the all-ones pattern of the width maps
    /// to -1 so "none" is uniform across widths.
    pub fn read_vertex_index(&mut self, width: IndexWidth) -> Result<i32, ModelError> {
        Ok(match width {
            IndexWidth::Byte => match self.read_u8()? {
                u8::MAX => -1,
                value => i32::from(value),
            },
            IndexWidth::Short => match self.read_u16()? {
                u16::MAX => -1,
                value => i32::from(value),
            },
            IndexWidth::Int => self.read_i32()?,
        })
    }
}
