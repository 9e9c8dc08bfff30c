//! Materializing framed CBOR items into values, and canonical encoding back
//! out. Both directions go through `ciborium`; this module only maps between
//! its value model and JSON values and fixes the map key order.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ciborium::Value as Cbor;
use serde_json::{Map, Number, Value};

use super::token::{decode_err, read_byte, read_token};
use crate::error::{Error, Result};

/// Decodes exactly one complete item from `bytes`.
///
/// Byte strings become base64 (standard alphabet) text. Map keys must be
/// text strings.
///
/// # Errors
/// Truncated or trailing input, tags, indefinite lengths, non-text map keys,
/// or non-finite floats.
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    let mut rest = bytes;
    let initial = read_byte(&mut rest)?.ok_or_else(|| decode_err("empty item"))?;
    let mut framed = Vec::with_capacity(bytes.len());
    read_token(&mut rest, initial, &mut framed)?;
    if !rest.is_empty() {
        return Err(decode_err(format!("{} trailing bytes after item", rest.len())));
    }
    materialize(&framed)
}

/// Decodes an item already framed by [`read_token`].
pub(crate) fn materialize(framed: &[u8]) -> Result<Value> {
    let item: Cbor = ciborium::de::from_reader(framed)
        .map_err(|e| decode_err(format!("malformed item: {e:?}")))?;
    to_json(item)
}

fn to_json(item: Cbor) -> Result<Value> {
    Ok(match item {
        Cbor::Null => Value::Null,
        Cbor::Bool(b) => Value::Bool(b),
        Cbor::Integer(i) => integer(i128::from(i)),
        Cbor::Float(f) => Number::from_f64(f)
            .map(Value::Number)
            .ok_or_else(|| decode_err(format!("non-finite float {f}")))?,
        Cbor::Text(s) => Value::String(s),
        Cbor::Bytes(b) => Value::String(STANDARD.encode(b)),
        Cbor::Array(items) => Value::Array(items.into_iter().map(to_json).collect::<Result<_>>()?),
        Cbor::Map(pairs) => {
            let mut map = Map::new();
            for (key, value) in pairs {
                let Cbor::Text(key) = key else {
                    return Err(decode_err(format!("map keys must be text strings, found {key:?}")));
                };
                map.insert(key, to_json(value)?);
            }
            Value::Object(map)
        }
        Cbor::Tag(tag, _) => return Err(decode_err(format!("tagged values are not supported (tag {tag})"))),
        other => return Err(decode_err(format!("unsupported item {other:?}"))),
    })
}

/// Integers outside the `i64`/`u64` range fall back to a float.
fn integer(n: i128) -> Value {
    if let Ok(u) = u64::try_from(n) {
        Value::from(u)
    } else if let Ok(i) = i64::try_from(n) {
        Value::from(i)
    } else {
        #[allow(clippy::cast_precision_loss)]
        let f = n as f64;
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

/// Encodes `value` canonically: shortest-form integer, length and float
/// arguments, and map keys sorted by encoded length, then bytewise.
///
/// Encoding the same value twice yields identical bytes regardless of the
/// insertion order of its maps.
///
/// # Errors
/// [`Error::UnsupportedValueShape`] for a number with no integer or float
/// representation.
pub fn encode_canonical(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(&to_cbor(value)?, &mut out)
        .map_err(|e| Error::UnsupportedValueShape(format!("cbor encoding failed: {e:?}")))?;
    Ok(out)
}

fn to_cbor(value: &Value) -> Result<Cbor> {
    Ok(match value {
        Value::Null => Cbor::Null,
        Value::Bool(b) => Cbor::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Cbor::Integer(u.into())
            } else if let Some(i) = n.as_i64() {
                Cbor::Integer(i.into())
            } else if let Some(f) = n.as_f64() {
                Cbor::Float(f)
            } else {
                return Err(Error::UnsupportedValueShape(format!("number {n}")));
            }
        }
        Value::String(s) => Cbor::Text(s.clone()),
        Value::Array(items) => Cbor::Array(items.iter().map(to_cbor).collect::<Result<_>>()?),
        Value::Object(map) => {
            // a text key's head grows with its length, so length then bytes
            // is the order of the encoded keys
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.as_bytes().cmp(b.as_bytes())));
            let mut pairs = Vec::with_capacity(keys.len());
            for key in keys {
                pairs.push((Cbor::Text(key.clone()), to_cbor(&map[key])?));
            }
            Cbor::Map(pairs)
        }
    })
}
