//! Base65536: 16 bits of input per code point.
//!
//! Each input byte pair `(hi, lo)` becomes the code point
//! `U+10000 + (hi << 8 | lo)`; in UTF-16 transports that is exactly one
//! surrogate pair. A trailing odd byte is emitted from the one-byte block
//! at `U+1500 + hi`, which keeps the oddness of the input explicit and the
//! encoding reversible for every byte string, including those ending in a
//! zero byte.

use crate::error::{Error, Result};

const PAIR_BASE: u32 = 0x10000;
const PAIR_MAX: u32 = 0x1FFFF;
const TAIL_BASE: u32 = 0x1500;
const TAIL_MAX: u32 = 0x15FF;

pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(2) * 4);
    for pair in data.chunks(2) {
        let cp = match pair {
            [hi, lo] => PAIR_BASE + (u32::from(*hi) << 8 | u32::from(*lo)),
            [hi] => TAIL_BASE + u32::from(*hi),
            _ => unreachable!("chunks(2) yields 1 or 2 bytes"),
        };
        // Both blocks sit outside the surrogate gap.
        out.push(char::from_u32(cp).expect("valid code point"));
    }
    out
}

pub fn decode(token: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(token.len());
    let mut iter = token.chars().peekable();
    while let Some(ch) = iter.next() {
        let cp = ch as u32;
        if (PAIR_BASE..=PAIR_MAX).contains(&cp) {
            let value = cp - PAIR_BASE;
            out.push((value >> 8) as u8);
            out.push((value & 0xFF) as u8);
        } else if (TAIL_BASE..=TAIL_MAX).contains(&cp) {
            if iter.peek().is_some() {
                return Err(Error::malformed("base65536 tail symbol before end of input"));
            }
            out.push((cp - TAIL_BASE) as u8);
        } else {
            return Err(Error::malformed(format!("invalid base65536 symbol: {ch:?}")));
        }
    }
    Ok(out)
}
