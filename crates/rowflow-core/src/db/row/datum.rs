use crate::{
    db::codec::{decode_key_segment, encode_key_segment},
    error::InternalError,
    types::ColumnType,
    value::{Value, canonical_cmp},
};
use std::{cell::OnceCell, cmp::Ordering};

///
/// EncDatum
///
/// One column value that may still be in its ascending key encoding.
/// Decoding is idempotent and the decoded value is cached on first use.
///

#[derive(Clone, Debug)]
pub struct EncDatum {
    encoded: Option<Vec<u8>>,
    decoded: OnceCell<Value>,
}

impl EncDatum {
    /// Wrap an already decoded value.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        Self {
            encoded: None,
            decoded: OnceCell::from(value),
        }
    }

    /// Wrap one ascending key segment; decoding is deferred.
    #[must_use]
    pub(crate) const fn from_key_segment(bytes: Vec<u8>) -> Self {
        Self {
            encoded: Some(bytes),
            decoded: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn null() -> Self {
        Self::from_value(Value::Null)
    }

    /// Whether the datum still holds key bytes that were never decoded.
    #[must_use]
    pub fn is_undecoded(&self) -> bool {
        self.decoded.get().is_none() && self.encoded.is_some()
    }

    #[must_use]
    pub fn key_bytes(&self) -> Option<&[u8]> {
        self.encoded.as_deref()
    }

    /// Decode (once) and borrow the native value.
    pub fn ensure_decoded(&self, ty: ColumnType) -> Result<&Value, InternalError> {
        if let Some(value) = self.decoded.get() {
            return Ok(value);
        }

        let value = match &self.encoded {
            Some(bytes) => {
                let (value, consumed) = decode_key_segment(bytes, ty)?;
                if consumed != bytes.len() {
                    return Err(InternalError::codec_corruption(format!(
                        "key segment has {} trailing bytes",
                        bytes.len() - consumed
                    )));
                }
                value
            }
            None => Value::Null,
        };

        Ok(self.decoded.get_or_init(|| value))
    }

    /// Produce the ascending key bytes for this datum, reusing the stored
    /// encoding when present.
    pub(crate) fn encode_key(&self, ty: ColumnType, out: &mut Vec<u8>) -> Result<(), InternalError> {
        if let Some(bytes) = &self.encoded {
            out.extend_from_slice(bytes);
            return Ok(());
        }

        encode_key_segment(self.ensure_decoded(ty)?, ty, out)?;
        Ok(())
    }

    /// Compare two datums of the same column.
    ///
    /// Two key-encoded datums compare by bytes without decoding.
    pub fn compare(&self, ty: ColumnType, other: &Self) -> Result<Ordering, InternalError> {
        if let (Some(left), Some(right)) = (&self.encoded, &other.encoded) {
            return Ok(left.cmp(right));
        }

        Ok(canonical_cmp(
            self.ensure_decoded(ty)?,
            other.ensure_decoded(ty)?,
        ))
    }
}

impl From<Value> for EncDatum {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}
