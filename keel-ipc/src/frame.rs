//! Tagged message framing: u32 little-endian length prefix, then a u16
//! little-endian tag, then the payload.
//!
//! The length covers the tag and the payload. Boundaries and ordering are
//! the whole contract; the payload bytes are opaque here.

use std::io::{Read, Write};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame too large: {len} > {max}")]
    TooLarge { len: u32, max: u32 },
    #[error("frame too short to carry a message tag")]
    MissingTag,
    #[error("unexpected EOF while reading frame")]
    UnexpectedEof,
}

/// Guardrail against absurd frames from a broken engine.
pub const MAX_FRAME_LEN: u32 = 8 * 1024 * 1024;

const TAG_LEN: usize = 2;

pub fn write_message<W: Write>(w: &mut W, tag: u16, payload: &[u8]) -> Result<(), FrameError> {
    let len: u32 = payload
        .len()
        .checked_add(TAG_LEN)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(FrameError::TooLarge {
            len: u32::MAX,
            max: MAX_FRAME_LEN,
        })?;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    w.write_all(&len.to_le_bytes())?;
    w.write_all(&tag.to_le_bytes())?;
    w.write_all(payload)?;
    w.flush()?;
    Ok(())
}

pub fn read_message<R: Read>(r: &mut R) -> Result<(u16, Vec<u8>), FrameError> {
    let mut len_bytes = [0u8; 4];
    read_exact_or_eof(r, &mut len_bytes)?;
    let len = u32::from_le_bytes(len_bytes);
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    if (len as usize) < TAG_LEN {
        return Err(FrameError::MissingTag);
    }
    let mut tag_bytes = [0u8; TAG_LEN];
    read_exact_or_eof(r, &mut tag_bytes)?;
    let tag = u16::from_le_bytes(tag_bytes);
    let mut payload = vec![0u8; len as usize - TAG_LEN];
    read_exact_or_eof(r, &mut payload)?;
    Ok((tag, payload))
}

fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<(), FrameError> {
    let mut off = 0usize;
    while off < buf.len() {
        match r.read(&mut buf[off..])? {
            0 => return Err(FrameError::UnexpectedEof),
            n => off += n,
        }
    }
    Ok(())
}
