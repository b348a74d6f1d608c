//! Module: db::codec
//! Responsibility: byte encodings for stored keys and values.
//! Does not own: key layout (table/index prefixes) or row materialization.
//! Boundary: `db::store` builds keys from these segments; `db::row` decodes them lazily.

mod ordered;
mod value;


use crate::error::InternalError;
use thiserror::Error as ThisError;

pub(crate) use ordered::{decode_key_segment, encode_key_segment, key_segment_len};
pub(crate) use value::{decode_value_columns, encode_value_columns};

///
/// CodecError
///
/// Encoding and decoding failures for one datum or one stored value.
///

#[derive(Debug, ThisError)]
pub enum CodecError {
    #[error("null values are not indexable")]
    NullNotIndexable,

    #[error("value of type {found} does not fit column of type {expected}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("truncated key segment: {what}")]
    Truncated { what: &'static str },

    #[error("unknown key segment tag 0x{tag:02x}")]
    UnknownTag { tag: u8 },

    #[error("key segment is not valid utf-8")]
    InvalidUtf8,

    #[error("stored value failed to (de)serialize: {message}")]
    Value { message: String },
}

impl CodecError {
    // Errors a writer can cause are unsupported; everything else means the
    // stored bytes are damaged.
    const fn is_unsupported(&self) -> bool {
        matches!(self, Self::NullNotIndexable | Self::TypeMismatch { .. })
    }
}

impl From<CodecError> for InternalError {
    fn from(err: CodecError) -> Self {
        if err.is_unsupported() {
            Self::codec_unsupported(err.to_string())
        } else {
            Self::codec_corruption(err.to_string())
        }
    }
}
