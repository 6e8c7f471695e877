//! The closed typed-value union exchanged with engines.
//!
//! `Value::Nil` is the codec-defined "no value" sentinel: a RESULT carrying
//! no host value still encodes a `Nil`, never an absent field.

use crate::hexint::HexInt;
use crate::wire::{self, Cursor, DecodeError};

/// Decode guard against unboundedly nested lists/maps.
pub const MAX_VALUE_DEPTH: usize = 32;

const TAG_NIL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_BYTES: u8 = 3;
const TAG_STR: u8 = 4;
const TAG_LIST: u8 = 5;
const TAG_MAP: u8 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(HexInt),
    Bytes(Vec<u8>),
    Str(String),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Value::Nil => wire::put_u8(out, TAG_NIL),
            Value::Bool(v) => {
                wire::put_u8(out, TAG_BOOL);
                wire::put_bool(out, *v);
            }
            Value::Int(v) => {
                wire::put_u8(out, TAG_INT);
                wire::put_int(out, *v);
            }
            Value::Bytes(v) => {
                wire::put_u8(out, TAG_BYTES);
                wire::put_bytes(out, v);
            }
            Value::Str(v) => {
                wire::put_u8(out, TAG_STR);
                wire::put_str(out, v);
            }
            Value::List(items) => {
                wire::put_u8(out, TAG_LIST);
                wire::put_u32(out, items.len() as u32);
                for item in items {
                    item.encode_into(out);
                }
            }
            Value::Map(entries) => {
                wire::put_u8(out, TAG_MAP);
                wire::put_u32(out, entries.len() as u32);
                for (key, item) in entries {
                    wire::put_str(out, key);
                    item.encode_into(out);
                }
            }
        }
    }

    /// Decode a payload holding exactly one value.
    pub fn decode(bytes: &[u8]) -> Result<Value, DecodeError> {
        let mut c = Cursor::new(bytes);
        let v = Value::read(&mut c)?;
        c.finish()?;
        Ok(v)
    }

    /// Read one value from the cursor (for values embedded in payloads).
    pub fn read(c: &mut Cursor<'_>) -> Result<Value, DecodeError> {
        Value::read_at_depth(c, 0)
    }

    fn read_at_depth(c: &mut Cursor<'_>, depth: usize) -> Result<Value, DecodeError> {
        if depth >= MAX_VALUE_DEPTH {
            return Err(DecodeError::TooDeep(MAX_VALUE_DEPTH));
        }
        match c.read_u8()? {
            TAG_NIL => Ok(Value::Nil),
            TAG_BOOL => Ok(Value::Bool(c.read_bool()?)),
            TAG_INT => Ok(Value::Int(c.read_int()?)),
            TAG_BYTES => Ok(Value::Bytes(c.read_bytes()?)),
            TAG_STR => Ok(Value::Str(c.read_str()?)),
            TAG_LIST => {
                let n = c.read_u32()? as usize;
                let mut items = Vec::new();
                for _ in 0..n {
                    items.push(Value::read_at_depth(c, depth + 1)?);
                }
                Ok(Value::List(items))
            }
            TAG_MAP => {
                let n = c.read_u32()? as usize;
                let mut entries = Vec::new();
                for _ in 0..n {
                    let key = c.read_str()?;
                    entries.push((key, Value::read_at_depth(c, depth + 1)?));
                }
                Ok(Value::Map(entries))
            }
            tag => Err(DecodeError::BadValueTag(tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::Map(vec![
            ("height".to_string(), Value::Int(HexInt::new(77))),
            ("hash".to_string(), Value::Bytes(vec![0xde, 0xad])),
            (
                "flags".to_string(),
                Value::List(vec![Value::Bool(true), Value::Nil, Value::Str("q".into())]),
            ),
        ])
    }

    #[test]
    fn roundtrip_nested() {
        let v = sample();
        assert_eq!(Value::decode(&v.encode()).unwrap(), v);
    }

    #[test]
    fn nil_roundtrips_as_explicit_marker() {
        let bytes = Value::Nil.encode();
        assert_eq!(bytes, vec![TAG_NIL]);
        assert!(Value::decode(&bytes).unwrap().is_nil());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(Value::decode(&[0x7f]), Err(DecodeError::BadValueTag(0x7f)));
    }

    #[test]
    fn depth_guard_trips() {
        let mut bytes = Vec::new();
        for _ in 0..MAX_VALUE_DEPTH + 1 {
            bytes.push(5u8); // list tag
            bytes.extend_from_slice(&1u32.to_le_bytes());
        }
        bytes.push(TAG_NIL);
        assert_eq!(
            Value::decode(&bytes),
            Err(DecodeError::TooDeep(MAX_VALUE_DEPTH))
        );
    }

    #[test]
    fn truncated_list_is_too_short() {
        let v = Value::List(vec![Value::Int(HexInt::new(1)), Value::Int(HexInt::new(2))]);
        let mut bytes = v.encode();
        bytes.truncate(bytes.len() - 2);
        assert_eq!(Value::decode(&bytes), Err(DecodeError::TooShort));
    }
}
