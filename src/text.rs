use crate::TextError;
use num_enum::TryFromPrimitive;
use std::borrow::Cow;

/// Text codec recorded in the PMX header, used for every name, comment and
/// texture path in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum TextCodec {
    Utf16Le = 0,
    Utf8 = 1,
}

impl TextCodec {
    /// Strict decode; malformed input is an error, never replaced.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, TextError> {
        match self {
            TextCodec::Utf8 => Ok(String::from_utf8(bytes.to_vec())?),
            TextCodec::Utf16Le => {
                if bytes.len() % 2 != 0 {
                    return Err(TextError::OddLength(bytes.len()));
                }
                encoding_rs::UTF_16LE
                    .decode_without_bom_handling_and_without_replacement(bytes)
                    .map(Cow::into_owned)
                    .ok_or(TextError::NonUtf16)
            }
        }
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextCodec::Utf8 => text.as_bytes().to_vec(),
            TextCodec::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        }
    }
}

/// Shift_JIS decode for the fixed-width name fields of VMD motions.
/// The fields are NUL padded, everything from the first NUL on is dropped.
pub(crate) fn decode_shift_jis(bytes: &[u8]) -> Result<String, TextError> {
    let end = bytes.iter().position(|byte| *byte == 0).unwrap_or(bytes.len());
    encoding_rs::SHIFT_JIS
        .decode_without_bom_handling_and_without_replacement(&bytes[..end])
        .map(Cow::into_owned)
        .ok_or(TextError::NonShiftJis)
}
