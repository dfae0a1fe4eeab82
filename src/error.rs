use std::str::Utf8Error;
use std::string::FromUtf8Error;
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("trying to read past the end of the buffer at offset {0}")]
    Eof(usize),
    #[error("unrecognized file signature")]
    BadSignature,
    #[error("unsupported PMX version {0}")]
    UnsupportedVersion(f32),
    #[error(transparent)]
    Text(#[from] TextError),
    #[error("{value} is not a valid {what}")]
    OutOfRange { what: &'static str, value: u32 },
    #[error("{referrer} references {kind} {index} but the model only has {len}")]
    DanglingReference {
        referrer: &'static str,
        kind: &'static str,
        index: i32,
        len: usize,
    },
    #[error("group morph {0} closes a reference cycle")]
    MorphCycle(usize),
    #[error("model invariant violated: {0}")]
    InvariantViolated(&'static str),
}

#[derive(Debug, Error)]
pub enum TextError {
    #[error(transparent)]
    NonUtf8(#[from] Utf8Error),
    #[error("invalid UTF-16LE text")]
    NonUtf16,
    #[error("invalid Shift_JIS text")]
    NonShiftJis,
    #[error("UTF-16LE text has odd byte length {0}")]
    OddLength(usize),
}

impl From<FromUtf8Error> for TextError {
    fn from(value: FromUtf8Error) -> Self {
        TextError::NonUtf8(value.utf8_error())
    }
}

impl From<FromUtf8Error> for ModelError {
    fn from(value: FromUtf8Error) -> Self {
        TextError::NonUtf8(value.utf8_error()).into()
    }
}
