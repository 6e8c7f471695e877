//! Wire payloads for the ten engine messages.
//!
//! Tags 0..=9 are fixed protocol constants. Each payload struct encodes and
//! decodes itself with the `keel-codec` wire primitives; both sides of the
//! connection use the same shapes, so the fake engines in the tests reuse
//! these types directly.

use keel_codec::wire::{self, Cursor, DecodeError};
use keel_codec::{Address, HexInt, Value};

use crate::api::ApiInfo;

pub mod tag {
    pub const VERSION: u16 = 0;
    pub const INVOKE: u16 = 1;
    pub const RESULT: u16 = 2;
    pub const GETVALUE: u16 = 3;
    pub const SETVALUE: u16 = 4;
    pub const CALL: u16 = 5;
    pub const EVENT: u16 = 6;
    pub const GETINFO: u16 = 7;
    pub const GETBALANCE: u16 = 8;
    pub const GETAPI: u16 = 9;
}

/// Engine handshake, sent once per connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPayload {
    pub version: u16,
    pub uid: String,
    pub kind: String,
}

impl VersionPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        wire::put_u16(&mut out, self.version);
        wire::put_str(&mut out, &self.uid);
        wire::put_str(&mut out, &self.kind);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<VersionPayload, DecodeError> {
        let mut c = Cursor::new(bytes);
        let m = VersionPayload {
            version: c.read_u16()?,
            uid: c.read_str()?,
            kind: c.read_str()?,
        };
        c.finish()?;
        Ok(m)
    }
}

/// Host-to-engine invocation descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokePayload {
    pub code: String,
    pub is_query: bool,
    pub from: Address,
    pub to: Address,
    pub value: HexInt,
    pub limit: HexInt,
    pub method: String,
    pub params: Value,
}

impl InvokePayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        wire::put_str(&mut out, &self.code);
        wire::put_bool(&mut out, self.is_query);
        wire::put_address(&mut out, &self.from);
        wire::put_address(&mut out, &self.to);
        wire::put_int(&mut out, self.value);
        wire::put_int(&mut out, self.limit);
        wire::put_str(&mut out, &self.method);
        self.params.encode_into(&mut out);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<InvokePayload, DecodeError> {
        let mut c = Cursor::new(bytes);
        let m = InvokePayload {
            code: c.read_str()?,
            is_query: c.read_bool()?,
            from: c.read_address()?,
            to: c.read_address()?,
            value: c.read_int()?,
            limit: c.read_int()?,
            method: c.read_str()?,
            params: Value::read(&mut c)?,
        };
        c.finish()?;
        Ok(m)
    }
}

/// Terminal answer for an invocation or an engine-initiated sub-call.
///
/// `result` is `Value::Nil` when there is no result value; the field is
/// never absent on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPayload {
    pub status: u16,
    pub step_used: HexInt,
    pub result: Value,
}

impl ResultPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        wire::put_u16(&mut out, self.status);
        wire::put_int(&mut out, self.step_used);
        self.result.encode_into(&mut out);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<ResultPayload, DecodeError> {
        let mut c = Cursor::new(bytes);
        let m = ResultPayload {
            status: c.read_u16()?,
            step_used: c.read_int()?,
            result: Value::read(&mut c)?,
        };
        c.finish()?;
        Ok(m)
    }
}

/// Host answer to a GETVALUE read. `success=false` means the key is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetValueResponse {
    pub success: bool,
    pub value: Vec<u8>,
}

impl GetValueResponse {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        wire::put_bool(&mut out, self.success);
        wire::put_bytes(&mut out, &self.value);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<GetValueResponse, DecodeError> {
        let mut c = Cursor::new(bytes);
        let m = GetValueResponse {
            success: c.read_bool()?,
            value: c.read_bytes()?,
        };
        c.finish()?;
        Ok(m)
    }
}

/// Engine-driven storage write or delete. No reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetValuePayload {
    pub key: Vec<u8>,
    pub is_delete: bool,
    pub value: Vec<u8>,
}

impl SetValuePayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        wire::put_bytes(&mut out, &self.key);
        wire::put_bool(&mut out, self.is_delete);
        wire::put_bytes(&mut out, &self.value);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<SetValuePayload, DecodeError> {
        let mut c = Cursor::new(bytes);
        let m = SetValuePayload {
            key: c.read_bytes()?,
            is_delete: c.read_bool()?,
            value: c.read_bytes()?,
        };
        c.finish()?;
        Ok(m)
    }
}

/// Engine-initiated sub-call. The caller is the top frame's address.
#[derive(Debug, Clone, PartialEq)]
pub struct CallPayload {
    pub to: Address,
    pub value: HexInt,
    pub limit: HexInt,
    pub method: String,
    pub params: Value,
}

impl CallPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        wire::put_address(&mut out, &self.to);
        wire::put_int(&mut out, self.value);
        wire::put_int(&mut out, self.limit);
        wire::put_str(&mut out, &self.method);
        self.params.encode_into(&mut out);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<CallPayload, DecodeError> {
        let mut c = Cursor::new(bytes);
        let m = CallPayload {
            to: c.read_address()?,
            value: c.read_int()?,
            limit: c.read_int()?,
            method: c.read_str()?,
            params: Value::read(&mut c)?,
        };
        c.finish()?;
        Ok(m)
    }
}

/// Contract event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPayload {
    pub indexed: Vec<Vec<u8>>,
    pub data: Vec<Vec<u8>>,
}

impl EventPayload {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        put_bytes_list(&mut out, &self.indexed);
        put_bytes_list(&mut out, &self.data);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<EventPayload, DecodeError> {
        let mut c = Cursor::new(bytes);
        let m = EventPayload {
            indexed: read_bytes_list(&mut c)?,
            data: read_bytes_list(&mut c)?,
        };
        c.finish()?;
        Ok(m)
    }
}

/// Engine answer to a GETAPI request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetApiResponse {
    pub status: u16,
    pub info: ApiInfo,
}

impl GetApiResponse {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        wire::put_u16(&mut out, self.status);
        self.info.encode_into(&mut out);
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<GetApiResponse, DecodeError> {
        let mut c = Cursor::new(bytes);
        let m = GetApiResponse {
            status: c.read_u16()?,
            info: ApiInfo::read(&mut c)?,
        };
        c.finish()?;
        Ok(m)
    }
}

// Bare one-field payloads (GETVALUE/GETAPI/GETBALANCE requests, GETINFO and
// GETBALANCE responses) share these helpers.

pub fn encode_bytes_payload(v: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    wire::put_bytes(&mut out, v);
    out
}

pub fn decode_bytes_payload(bytes: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut c = Cursor::new(bytes);
    let v = c.read_bytes()?;
    c.finish()?;
    Ok(v)
}

pub fn encode_str_payload(v: &str) -> Vec<u8> {
    let mut out = Vec::new();
    wire::put_str(&mut out, v);
    out
}

pub fn decode_str_payload(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut c = Cursor::new(bytes);
    let v = c.read_str()?;
    c.finish()?;
    Ok(v)
}

pub fn encode_address_payload(v: &Address) -> Vec<u8> {
    let mut out = Vec::new();
    wire::put_address(&mut out, v);
    out
}

pub fn decode_address_payload(bytes: &[u8]) -> Result<Address, DecodeError> {
    let mut c = Cursor::new(bytes);
    let v = c.read_address()?;
    c.finish()?;
    Ok(v)
}

pub fn encode_int_payload(v: HexInt) -> Vec<u8> {
    let mut out = Vec::new();
    wire::put_int(&mut out, v);
    out
}

pub fn decode_int_payload(bytes: &[u8]) -> Result<HexInt, DecodeError> {
    let mut c = Cursor::new(bytes);
    let v = c.read_int()?;
    c.finish()?;
    Ok(v)
}

pub fn encode_value_payload(v: &Value) -> Vec<u8> {
    v.encode()
}

pub fn decode_value_payload(bytes: &[u8]) -> Result<Value, DecodeError> {
    Value::decode(bytes)
}

fn put_bytes_list(out: &mut Vec<u8>, items: &[Vec<u8>]) {
    wire::put_u32(out, items.len() as u32);
    for item in items {
        wire::put_bytes(out, item);
    }
}

fn read_bytes_list(c: &mut Cursor<'_>) -> Result<Vec<Vec<u8>>, DecodeError> {
    let n = c.read_u32()? as usize;
    let mut items = Vec::new();
    for _ in 0..n {
        items.push(c.read_bytes()?);
    }
    Ok(items)
}
