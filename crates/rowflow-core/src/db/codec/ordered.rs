use crate::{db::codec::CodecError, types::ColumnType, value::Value};

const TAG_BOOL: u8 = 0x10;
const TAG_INT: u8 = 0x20;
const TAG_UINT: u8 = 0x30;
const TAG_FLOAT: u8 = 0x40;
const TAG_TEXT: u8 = 0x50;
const TAG_BYTES: u8 = 0x60;

const ESCAPE: u8 = 0x00;
const ESCAPED_ZERO: u8 = 0xFF;
const TERMINATOR: u8 = 0x00;

/// Append one order-preserving key segment (`tag ‖ payload`) for `value`.
///
/// Lexicographic byte order of two segments of the same column type matches
/// `canonical_cmp` of their values.
pub(crate) fn encode_key_segment(
    value: &Value,
    ty: ColumnType,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    if !value.is_null() && !ty.admits(value) {
        return Err(CodecError::TypeMismatch {
            expected: ty.label(),
            found: value.label(),
        });
    }

    match value {
        Value::Bool(v) => {
            out.push(TAG_BOOL);
            out.push(u8::from(*v));
        }
        Value::Int(v) => {
            out.push(TAG_INT);
            out.extend_from_slice(&ordered_i64_bytes(*v));
        }
        Value::Uint(v) => {
            out.push(TAG_UINT);
            out.extend_from_slice(&v.to_be_bytes());
        }
        Value::Float(v) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&ordered_f64_bytes(*v));
        }
        Value::Text(v) => {
            out.push(TAG_TEXT);
            push_terminated_bytes(out, v.as_bytes());
        }
        Value::Bytes(v) => {
            out.push(TAG_BYTES);
            push_terminated_bytes(out, v);
        }
        Value::Null => return Err(CodecError::NullNotIndexable),
    }

    Ok(())
}

/// Byte length of the key segment at the front of `bytes`, without decoding it.
pub(crate) fn key_segment_len(bytes: &[u8]) -> Result<usize, CodecError> {
    let Some(&tag) = bytes.first() else {
        return Err(CodecError::Truncated { what: "tag" });
    };

    let payload = match tag {
        TAG_BOOL => 1,
        TAG_INT | TAG_UINT | TAG_FLOAT => 8,
        TAG_TEXT | TAG_BYTES => terminated_len(&bytes[1..])?,
        _ => return Err(CodecError::UnknownTag { tag }),
    };
    if bytes.len() < 1 + payload {
        return Err(CodecError::Truncated { what: "payload" });
    }

    Ok(1 + payload)
}

/// Decode one key segment for a column of type `ty`.
/// Returns the value and the number of bytes consumed.
pub(crate) fn decode_key_segment(
    bytes: &[u8],
    ty: ColumnType,
) -> Result<(Value, usize), CodecError> {
    let len = key_segment_len(bytes)?;
    let tag = bytes[0];
    let payload = &bytes[1..len];

    let value = match (tag, ty) {
        (TAG_BOOL, ColumnType::Bool) => Value::Bool(payload[0] != 0),
        (TAG_INT, ColumnType::Int) => Value::Int(decode_ordered_i64(fixed8(payload))),
        (TAG_UINT, ColumnType::Uint) => Value::Uint(u64::from_be_bytes(fixed8(payload))),
        (TAG_FLOAT, ColumnType::Float) => Value::Float(decode_ordered_f64(fixed8(payload))),
        (TAG_TEXT, ColumnType::Text) => {
            let bytes = unescape_terminated(payload);
            Value::Text(String::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?)
        }
        (TAG_BYTES, ColumnType::Bytes) => Value::Bytes(unescape_terminated(payload)),
        _ => {
            return Err(CodecError::TypeMismatch {
                expected: ty.label(),
                found: tag_label(tag),
            });
        }
    };

    Ok((value, len))
}

const fn tag_label(tag: u8) -> &'static str {
    match tag {
        TAG_BOOL => "BOOL",
        TAG_INT => "INT",
        TAG_UINT => "UINT",
        TAG_FLOAT => "FLOAT",
        TAG_TEXT => "TEXT",
        _ => "BYTES",
    }
}

fn push_terminated_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    for &byte in bytes {
        if byte == ESCAPE {
            out.extend_from_slice(&[ESCAPE, ESCAPED_ZERO]);
        } else {
            out.push(byte);
        }
    }

    out.extend_from_slice(&[ESCAPE, TERMINATOR]);
}

// Length of an escaped payload including its two-byte terminator.
fn terminated_len(bytes: &[u8]) -> Result<usize, CodecError> {
    let mut idx = 0;
    while idx + 1 < bytes.len() {
        if bytes[idx] == ESCAPE {
            match bytes[idx + 1] {
                TERMINATOR => return Ok(idx + 2),
                ESCAPED_ZERO => idx += 2,
                _ => return Err(CodecError::Truncated { what: "escape" }),
            }
        } else {
            idx += 1;
        }
    }

    Err(CodecError::Truncated {
        what: "terminator",
    })
}

// Payload passed here was already validated by `terminated_len`.
fn unescape_terminated(payload: &[u8]) -> Vec<u8> {
    let body = &payload[..payload.len().saturating_sub(2)];
    let mut out = Vec::with_capacity(body.len());
    let mut idx = 0;
    while idx < body.len() {
        out.push(body[idx]);
        idx += if body[idx] == ESCAPE { 2 } else { 1 };
    }

    out
}

fn fixed8(payload: &[u8]) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&payload[..8]);
    buf
}

const fn ordered_i64_bytes(value: i64) -> [u8; 8] {
    let biased = value.cast_unsigned() ^ (1u64 << 63);
    biased.to_be_bytes()
}

const fn decode_ordered_i64(bytes: [u8; 8]) -> i64 {
    (u64::from_be_bytes(bytes) ^ (1u64 << 63)).cast_signed()
}

const fn ordered_f64_bytes(value: f64) -> [u8; 8] {
    let bits = value.to_bits();
    let ordered = if bits & 0x8000_0000_0000_0000 == 0 {
        bits ^ 0x8000_0000_0000_0000
    } else {
        !bits
    };

    ordered.to_be_bytes()
}

const fn decode_ordered_f64(bytes: [u8; 8]) -> f64 {
    let ordered = u64::from_be_bytes(bytes);
    let bits = if ordered & 0x8000_0000_0000_0000 == 0 {
        !ordered
    } else {
        ordered ^ 0x8000_0000_0000_0000
    };

    f64::from_bits(bits)
}
