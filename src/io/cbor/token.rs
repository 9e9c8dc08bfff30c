//! Raw CBOR item framing.
//!
//! Copies the complete byte span of one data item into a buffer without
//! materializing it. Containers are walked recursively so the span ends
//! exactly where the item does. Indefinite-length items and tags are
//! rejected here, before any value is built.

use std::io::{self, Read};

use crate::error::{Error, Result};
use crate::structure::DataFormat;

/// Containers nested deeper than this are rejected.
pub(crate) const MAX_DEPTH: usize = 256;

pub(crate) fn decode_err(message: impl Into<String>) -> Error {
    Error::decode(DataFormat::Cbor, message)
}

/// Argument of an initial byte: inline, trailing big-endian bytes, or the
/// indefinite-length marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Argument {
    Definite(u64),
    Indefinite,
}

/// Reads a single byte, `None` on clean end of stream.
pub(crate) fn read_byte<R: Read>(r: &mut R) -> Result<Option<u8>> {
    let mut b = [0u8; 1];
    loop {
        match r.read(&mut b) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(b[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
}

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => decode_err("unexpected end of input inside item"),
        _ => e.into(),
    })
}

/// Reads the argument that follows `initial`, appending its bytes to `out`.
///
/// Additional info 0..=23 is inline; 24/25/26/27 select 1/2/4/8 trailing
/// big-endian bytes; 31 is indefinite; 28..=30 are reserved.
pub(crate) fn read_argument<R: Read>(r: &mut R, initial: u8, out: &mut Vec<u8>) -> Result<Argument> {
    let width = match initial & 0x1f {
        ai @ 0..=23 => return Ok(Argument::Definite(u64::from(ai))),
        24 => 1,
        25 => 2,
        26 => 4,
        27 => 8,
        31 => return Ok(Argument::Indefinite),
        ai => return Err(decode_err(format!("reserved additional info {ai} in byte {initial:#04x}"))),
    };
    let mut bytes = [0u8; 8];
    read_exact(r, &mut bytes[8 - width..])?;
    out.extend_from_slice(&bytes[8 - width..]);
    Ok(Argument::Definite(u64::from_be_bytes(bytes)))
}

fn definite(arg: Argument, what: &str) -> Result<u64> {
    match arg {
        Argument::Definite(n) => Ok(n),
        Argument::Indefinite => Err(decode_err(format!(
            "indefinite-length {what} is not supported"
        ))),
    }
}

/// Appends the full encoding of the item starting with `initial` to `out`.
pub(crate) fn read_token<R: Read>(r: &mut R, initial: u8, out: &mut Vec<u8>) -> Result<()> {
    read_token_at(r, initial, out, 0)
}

fn read_token_at<R: Read>(r: &mut R, initial: u8, out: &mut Vec<u8>, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(decode_err(format!("items nested deeper than {MAX_DEPTH}")));
    }
    out.push(initial);
    match initial {
        // unsigned and negative integers
        0x00..=0x1f | 0x20..=0x3f => {
            definite(read_argument(r, initial, out)?, "integer")?;
        }
        // byte and text strings
        0x40..=0x5f | 0x60..=0x7f => {
            let len = definite(read_argument(r, initial, out)?, "string")?;
            let start = out.len();
            let got = r.by_ref().take(len).read_to_end(out)?;
            if (got as u64) < len {
                out.truncate(start);
                return Err(decode_err(format!("string declares {len} bytes, found {got}")));
            }
        }
        // arrays
        0x80..=0x9f => {
            let n = definite(read_argument(r, initial, out)?, "array")?;
            for _ in 0..n {
                let next = next_initial(r)?;
                read_token_at(r, next, out, depth + 1)?;
            }
        }
        // maps
        0xa0..=0xbf => {
            let n = definite(read_argument(r, initial, out)?, "map")?;
            for _ in 0..n.saturating_mul(2) {
                let next = next_initial(r)?;
                read_token_at(r, next, out, depth + 1)?;
            }
        }
        0xc0..=0xdf => return Err(decode_err("tagged values are not supported")),
        0xff => return Err(decode_err("unexpected break byte")),
        // simple values and floats
        0xe0..=0xfe => match initial & 0x1f {
            0..=23 => {}
            24 => {
                let mut b = [0u8; 1];
                read_exact(r, &mut b)?;
                out.extend_from_slice(&b);
            }
            25 => read_into(r, out, 2)?,
            26 => read_into(r, out, 4)?,
            27 => read_into(r, out, 8)?,
            ai => return Err(decode_err(format!("reserved additional info {ai} in byte {initial:#04x}"))),
        },
    }
    Ok(())
}

fn read_into<R: Read>(r: &mut R, out: &mut Vec<u8>, n: usize) -> Result<()> {
    let mut buf = [0u8; 8];
    read_exact(r, &mut buf[..n])?;
    out.extend_from_slice(&buf[..n]);
    Ok(())
}

fn next_initial<R: Read>(r: &mut R) -> Result<u8> {
    read_byte(r)?.ok_or_else(|| decode_err("unexpected end of input inside container"))
}
