//! Simple building-block reads and writes shared by every codec in the crate.
//!
//! All multi-byte integers in a Standard MIDI File are big-endian. Readers
//! take a `&mut &[u8]` cursor and advance it past whatever they consume.

use crate::prelude::*;

/// The largest value representable as a MIDI variable-length quantity
/// (28 bits, 4 bytes of 7 payload bits each).
pub const MAX_VARLEN: u32 = 0x0FFF_FFFF;

#[inline]
pub(crate) fn read_slice<'a>(raw: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    if raw.len() < len {
        return Err(Error::TruncatedChunk {
            needed: len,
            available: raw.len(),
        });
    }
    let (take, rem) = raw.split_at(len);
    *raw = rem;
    Ok(take)
}

#[inline]
pub(crate) fn read_u8(raw: &mut &[u8]) -> Result<u8> {
    Ok(read_slice(raw, 1)?[0])
}

#[inline]
pub(crate) fn read_u16(raw: &mut &[u8]) -> Result<u16> {
    let buf = read_slice(raw, 2)?;
    Ok(u16::from_be_bytes([buf[0], buf[1]]))
}

#[inline]
pub(crate) fn read_u24(raw: &mut &[u8]) -> Result<u32> {
    let buf = read_slice(raw, 3)?;
    Ok(u32::from_be_bytes([0, buf[0], buf[1], buf[2]]))
}

#[inline]
pub(crate) fn read_u32(raw: &mut &[u8]) -> Result<u32> {
    let buf = read_slice(raw, 4)?;
    Ok(u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]))
}

/// Read a variable-length quantity, advancing the cursor past it.
///
/// At most 4 bytes are consumed; a 4th byte that still carries the
/// continuation bit makes the quantity malformed.
#[inline]
pub(crate) fn read_varlen(raw: &mut &[u8]) -> Result<u32> {
    let mut int: u32 = 0;
    for _ in 0..4 {
        let byte = read_u8(raw).map_err(|_| Error::MalformedVarlen)?;
        int <<= 7;
        int |= (byte & 0x7F) as u32;
        if byte & 0x80 == 0 {
            return Ok(int);
        }
    }
    Err(Error::MalformedVarlen)
}

/// Decode a variable-length quantity from the start of `raw`, reporting the
/// decoded value and how many bytes (1-4) it occupied.
///
/// # Examples
///
/// ```
/// assert_eq!(smfedit::decode_varlen(&[0x81, 0x00]).unwrap(), (0x80, 2));
/// ```
#[inline]
pub fn decode_varlen(raw: &[u8]) -> Result<(u32, usize)> {
    let mut cursor = raw;
    let int = read_varlen(&mut cursor)?;
    Ok((int, raw.len() - cursor.len()))
}

/// Append the variable-length encoding of `int` (1-4 bytes) to `out`.
#[inline]
pub(crate) fn write_varlen(out: &mut Vec<u8>, int: u32) -> Result<()> {
    if int > MAX_VARLEN {
        return Err(Error::VarlenOverflow(int));
    }
    let mut skipping = true;
    for i in (0..4).rev() {
        let byte = ((int >> (i * 7)) & 0x7F) as u8;
        if skipping && byte == 0 && i != 0 {
            // Leading zero group
        } else {
            skipping = false;
            out.push(if i == 0 { byte } else { byte | 0x80 });
        }
    }
    Ok(())
}

/// Encode `int` as a standalone variable-length quantity.
///
/// # Examples
///
/// ```
/// assert_eq!(smfedit::encode_varlen(0x2000).unwrap(), vec![0xC0, 0x00]);
/// ```
#[inline]
pub fn encode_varlen(int: u32) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(4);
    write_varlen(&mut out, int)?;
    Ok(out)
}

/// Read a slice prefixed by a varlen length.
///
/// If the declared length overruns the chunk, the remainder of the chunk is
/// taken instead; framing stays authoritative and the caller keeps parsing.
#[inline]
pub(crate) fn read_varlen_slice<'a>(raw: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len = read_varlen(raw)? as usize;
    if raw.len() < len {
        return Ok(std::mem::take(raw));
    }
    read_slice(raw, len)
}

/// Write a varlen length followed by the bytes of `data`.
#[inline]
pub(crate) fn write_varlen_slice(out: &mut Vec<u8>, data: &[u8]) -> Result<()> {
    if data.len() > MAX_VARLEN as usize {
        return Err(Error::Unencodable("data length exceeds 28 bits"));
    }
    write_varlen(out, data.len() as u32)?;
    out.extend_from_slice(data);
    Ok(())
}
