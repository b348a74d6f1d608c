use crate::{db::codec::CodecError, value::Value};

/// Encode the non-key columns of one stored row.
pub(crate) fn encode_value_columns(values: &[Value]) -> Result<Vec<u8>, CodecError> {
    serde_cbor::to_vec(&values).map_err(|err| CodecError::Value {
        message: err.to_string(),
    })
}

/// Decode the non-key columns of one stored row.
pub(crate) fn decode_value_columns(bytes: &[u8]) -> Result<Vec<Value>, CodecError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }

    serde_cbor::from_slice(bytes).map_err(|err| CodecError::Value {
        message: err.to_string(),
    })
}
