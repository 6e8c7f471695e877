//! Contract API descriptors returned by the GETAPI exchange.
//!
//! A descriptor lists the externally callable surface of one deployed
//! contract: functions, the fallback handler and declared event logs.

use keel_codec::wire::{self, Cursor, DecodeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Function,
    Fallback,
    EventLog,
}

impl MethodKind {
    fn to_tag(self) -> u8 {
        match self {
            MethodKind::Function => 0,
            MethodKind::Fallback => 1,
            MethodKind::EventLog => 2,
        }
    }

    fn from_tag(tag: u8) -> Result<MethodKind, DecodeError> {
        match tag {
            0 => Ok(MethodKind::Function),
            1 => Ok(MethodKind::Fallback),
            2 => Ok(MethodKind::EventLog),
            tag => Err(DecodeError::BadEnumTag {
                what: "method kind",
                tag,
            }),
        }
    }
}

/// Declared parameter/return types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Str,
    Bytes,
    Bool,
    Address,
}

impl ParamType {
    fn to_tag(self) -> u8 {
        match self {
            ParamType::Int => 0,
            ParamType::Str => 1,
            ParamType::Bytes => 2,
            ParamType::Bool => 3,
            ParamType::Address => 4,
        }
    }

    fn from_tag(tag: u8) -> Result<ParamType, DecodeError> {
        match tag {
            0 => Ok(ParamType::Int),
            1 => Ok(ParamType::Str),
            2 => Ok(ParamType::Bytes),
            3 => Ok(ParamType::Bool),
            4 => Ok(ParamType::Address),
            tag => Err(DecodeError::BadEnumTag {
                what: "param type",
                tag,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiParam {
    pub name: String,
    pub ty: ParamType,
    /// Event-log topics are marked indexed; meaningless for functions.
    pub indexed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiMethod {
    pub kind: MethodKind,
    pub name: String,
    pub inputs: Vec<ApiParam>,
    pub outputs: Vec<ParamType>,
    pub readonly: bool,
    pub payable: bool,
}

impl ApiMethod {
    fn write_into(&self, out: &mut Vec<u8>) {
        wire::put_u8(out, self.kind.to_tag());
        wire::put_str(out, &self.name);
        wire::put_u32(out, self.inputs.len() as u32);
        for p in &self.inputs {
            wire::put_str(out, &p.name);
            wire::put_u8(out, p.ty.to_tag());
            wire::put_bool(out, p.indexed);
        }
        wire::put_u32(out, self.outputs.len() as u32);
        for ty in &self.outputs {
            wire::put_u8(out, ty.to_tag());
        }
        wire::put_bool(out, self.readonly);
        wire::put_bool(out, self.payable);
    }

    fn read_from(c: &mut Cursor<'_>) -> Result<ApiMethod, DecodeError> {
        let kind = MethodKind::from_tag(c.read_u8()?)?;
        let name = c.read_str()?;
        let n_inputs = c.read_u32()? as usize;
        let mut inputs = Vec::new();
        for _ in 0..n_inputs {
            inputs.push(ApiParam {
                name: c.read_str()?,
                ty: ParamType::from_tag(c.read_u8()?)?,
                indexed: c.read_bool()?,
            });
        }
        let n_outputs = c.read_u32()? as usize;
        let mut outputs = Vec::new();
        for _ in 0..n_outputs {
            outputs.push(ParamType::from_tag(c.read_u8()?)?);
        }
        Ok(ApiMethod {
            kind,
            name,
            inputs,
            outputs,
            readonly: c.read_bool()?,
            payable: c.read_bool()?,
        })
    }
}

/// The callable surface of one contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiInfo {
    pub methods: Vec<ApiMethod>,
}

impl ApiInfo {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        wire::put_u32(out, self.methods.len() as u32);
        for m in &self.methods {
            m.write_into(out);
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<ApiInfo, DecodeError> {
        let mut c = Cursor::new(bytes);
        let info = ApiInfo::read(&mut c)?;
        c.finish()?;
        Ok(info)
    }

    pub fn read(c: &mut Cursor<'_>) -> Result<ApiInfo, DecodeError> {
        let n = c.read_u32()? as usize;
        let mut methods = Vec::new();
        for _ in 0..n {
            methods.push(ApiMethod::read_from(c)?);
        }
        Ok(ApiInfo { methods })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_api() -> ApiInfo {
        ApiInfo {
            methods: vec![
                ApiMethod {
                    kind: MethodKind::Function,
                    name: "transfer".into(),
                    inputs: vec![
                        ApiParam {
                            name: "to".into(),
                            ty: ParamType::Address,
                            indexed: false,
                        },
                        ApiParam {
                            name: "amount".into(),
                            ty: ParamType::Int,
                            indexed: false,
                        },
                    ],
                    outputs: vec![ParamType::Bool],
                    readonly: false,
                    payable: false,
                },
                ApiMethod {
                    kind: MethodKind::EventLog,
                    name: "Transfer".into(),
                    inputs: vec![ApiParam {
                        name: "from".into(),
                        ty: ParamType::Address,
                        indexed: true,
                    }],
                    outputs: Vec::new(),
                    readonly: false,
                    payable: false,
                },
                ApiMethod {
                    kind: MethodKind::Fallback,
                    name: "fallback".into(),
                    inputs: Vec::new(),
                    outputs: Vec::new(),
                    readonly: false,
                    payable: true,
                },
            ],
        }
    }

    #[test]
    fn roundtrip() {
        let info = token_api();
        assert_eq!(ApiInfo::decode(&info.encode()).unwrap(), info);
    }

    #[test]
    fn empty_descriptor_roundtrips() {
        let info = ApiInfo::default();
        assert_eq!(ApiInfo::decode(&info.encode()).unwrap(), info);
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let mut bytes = token_api().encode();
        // First method kind byte sits right after the method count.
        bytes[4] = 9;
        assert_eq!(
            ApiInfo::decode(&bytes),
            Err(DecodeError::BadEnumTag {
                what: "method kind",
                tag: 9
            })
        );
    }
}
