//! Account and contract addresses.
//!
//! Binary form is 21 bytes: one flag byte (`0x00` account, `0x01` contract)
//! followed by the 20-byte body. Text form is `hx`/`cx` plus 40 lowercase hex
//! chars.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Body length in bytes (without the flag byte).
pub const BODY_LEN: usize = 20;

/// Full binary length: flag byte + body.
pub const ADDRESS_LEN: usize = BODY_LEN + 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("bad address length: {0} bytes")]
    BadLength(usize),
    #[error("bad address flag byte: {0:#04x}")]
    BadFlag(u8),
    #[error("bad address prefix (want hx or cx)")]
    BadPrefix,
    #[error("invalid hex digit {0:?} in address")]
    BadDigit(char),
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    contract: bool,
    body: [u8; BODY_LEN],
}

impl Address {
    pub fn account(body: [u8; BODY_LEN]) -> Address {
        Address {
            contract: false,
            body,
        }
    }

    pub fn contract(body: [u8; BODY_LEN]) -> Address {
        Address {
            contract: true,
            body,
        }
    }

    pub fn is_contract(&self) -> bool {
        self.contract
    }

    pub fn body(&self) -> &[u8; BODY_LEN] {
        &self.body
    }

    /// Decode the 21-byte binary form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Address, AddressError> {
        if bytes.len() != ADDRESS_LEN {
            return Err(AddressError::BadLength(bytes.len()));
        }
        let contract = match bytes[0] {
            0x00 => false,
            0x01 => true,
            flag => return Err(AddressError::BadFlag(flag)),
        };
        let mut body = [0u8; BODY_LEN];
        body.copy_from_slice(&bytes[1..]);
        Ok(Address { contract, body })
    }

    /// Encode the 21-byte binary form.
    pub fn to_bytes(&self) -> [u8; ADDRESS_LEN] {
        let mut out = [0u8; ADDRESS_LEN];
        out[0] = u8::from(self.contract);
        out[1..].copy_from_slice(&self.body);
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.contract { "cx" } else { "hx" })?;
        for b in &self.body {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (contract, digits) = match (s.strip_prefix("hx"), s.strip_prefix("cx")) {
            (Some(d), _) => (false, d),
            (_, Some(d)) => (true, d),
            _ => return Err(AddressError::BadPrefix),
        };
        if digits.len() != BODY_LEN * 2 {
            return Err(AddressError::BadLength(digits.len() / 2));
        }
        let mut body = [0u8; BODY_LEN];
        let mut chars = digits.chars();
        for b in &mut body {
            let hi = next_nibble(&mut chars)?;
            let lo = next_nibble(&mut chars)?;
            *b = (hi << 4) | lo;
        }
        Ok(Address { contract, body })
    }
}

fn next_nibble(chars: &mut std::str::Chars<'_>) -> Result<u8, AddressError> {
    // Length was checked up front, so the iterator cannot run dry here.
    let ch = chars.next().ok_or(AddressError::BadPrefix)?;
    ch.to_digit(16)
        .map(|d| d as u8)
        .ok_or(AddressError::BadDigit(ch))
}
