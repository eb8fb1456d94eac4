//! Vector codec.
//!
//! Embeddings are stored as packed little-endian IEEE-754 `f32` values,
//! four bytes per element, no header. The layout never changes at runtime.

use serde_json::Value;

use mnemos_protocols::CodecError;

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Encode a vector into its on-disk form.
pub fn encode(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * F32_BYTES);
    for value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Encode an optional vector; absent stays absent.
pub fn encode_optional(vector: Option<&[f32]>) -> Option<Vec<u8>> {
    vector.map(encode)
}

/// Decode the on-disk form back into a vector.
pub fn decode(bytes: &[u8]) -> Result<Vec<f32>, CodecError> {
    if bytes.len() % F32_BYTES != 0 {
        return Err(CodecError::MisalignedBlob { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(F32_BYTES)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Coerce a JSON value into a vector.
///
/// Accepts a plain numeric array or an index-keyed object (`{"0": .., "1": ..}`),
/// which is what a serialised typed float buffer looks like. Non-numeric,
/// non-finite and sparse input is rejected.
pub fn vector_from_json(value: &Value) -> Result<Vec<f32>, CodecError> {
    match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| element(index, item))
            .collect(),
        Value::Object(map) => {
            let mut indexed = Vec::with_capacity(map.len());
            for (key, item) in map {
                let index: usize = key.parse().map_err(|_| {
                    CodecError::NotAVector(format!("object with non-index key {key:?}"))
                })?;
                indexed.push((index, item));
            }
            indexed.sort_by_key(|(index, _)| *index);

            let mut vector = Vec::with_capacity(indexed.len());
            for (expected, (index, item)) in indexed.into_iter().enumerate() {
                if index != expected {
                    return Err(CodecError::SparseIndex { index: expected });
                }
                vector.push(element(index, item)?);
            }
            Ok(vector)
        }
        other => Err(CodecError::NotAVector(kind(other).to_string())),
    }
}

fn element(index: usize, value: &Value) -> Result<f32, CodecError> {
    let number = value.as_f64().ok_or(CodecError::NonNumeric { index })?;
    let narrowed = number as f32;
    if !number.is_finite() || !narrowed.is_finite() {
        return Err(CodecError::NonFinite { index });
    }
    Ok(narrowed)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
