//! Base85 with an embedded length header.
//!
//! Uses the RFC 1924 alphabet. The encoded stream starts with the original
//! byte length as a 4-byte big-endian header, so the header itself travels
//! through the 4-to-5 packing and the decoder can discard the padding bytes
//! a trailing partial group produces.
//!
//! A trailing group of n input bytes is left-aligned in a 32-bit word and
//! emitted as its leading n+1 symbols. The decoder pads missing symbols with
//! the maximum value (84); because the dropped input bytes were zero, the
//! reconstructed word agrees with the original in its top n bytes.

use crate::error::{Error, Result};

const ALPHABET: &[u8; 85] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+-;<=>?@^_`{|}~";

const POWERS: [u64; 5] = [52_200_625, 614_125, 7_225, 85, 1];

const INVALID: u8 = 0xFF;

const DECODE_TABLE: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

pub fn encode(data: &[u8]) -> String {
    let mut stream = Vec::with_capacity(4 + data.len());
    stream.extend_from_slice(&(data.len() as u32).to_be_bytes());
    stream.extend_from_slice(data);

    let mut out = String::with_capacity(stream.len().div_ceil(4) * 5);
    for group in stream.chunks(4) {
        let mut word = [0u8; 4];
        word[..group.len()].copy_from_slice(group);
        let value = u64::from(u32::from_be_bytes(word));

        // Full groups emit all 5 symbols, a partial group of n bytes only
        // its leading n+1.
        let keep = if group.len() == 4 { 5 } else { group.len() + 1 };
        for power in &POWERS[..keep] {
            out.push(ALPHABET[((value / power) % 85) as usize] as char);
        }
    }
    out
}

pub fn decode(token: &str) -> Result<Vec<u8>> {
    let mut symbols = Vec::with_capacity(token.len());
    for ch in token.chars() {
        let value = u32::try_from(ch)
            .ok()
            .and_then(|cp| usize::try_from(cp).ok())
            .filter(|&cp| cp < 256)
            .map(|cp| DECODE_TABLE[cp])
            .unwrap_or(INVALID);
        if value == INVALID {
            return Err(Error::malformed(format!("invalid base85 symbol: {ch:?}")));
        }
        symbols.push(value);
    }

    let mut stream = Vec::with_capacity(symbols.len().div_ceil(5) * 4);
    for group in symbols.chunks(5) {
        if group.len() == 1 {
            return Err(Error::malformed("truncated base85 group"));
        }
        let mut value = 0u64;
        for i in 0..5 {
            let symbol = group.get(i).copied().unwrap_or(84);
            value += u64::from(symbol) * POWERS[i];
        }
        let word = u32::try_from(value)
            .map_err(|_| Error::malformed("base85 group out of range"))?;
        stream.extend_from_slice(&word.to_be_bytes());
    }

    if stream.len() < 4 {
        return Err(Error::malformed("base85 stream too short for length header"));
    }
    let declared = u32::from_be_bytes([stream[0], stream[1], stream[2], stream[3]]) as usize;
    let payload = &stream[4..];
    if declared > payload.len() {
        return Err(Error::malformed(format!(
            "base85 length header {declared} exceeds payload {}",
            payload.len()
        )));
    }
    Ok(payload[..declared].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_just_the_header() {
        let encoded = encode(b"");
        assert_eq!(encoded.len(), 5);
        assert_eq!(decode(&encoded).unwrap(), b"");
    }

    #[test]
    fn round_trips_every_partial_tail_length() {
        for len in 0..=9 {
            let data: Vec<u8> = (0..len).map(|i| (i * 37 + 1) as u8).collect();
            let encoded = encode(&data);
            assert_eq!(decode(&encoded).unwrap(), data, "len {len}");
        }
    }

    #[test]
    fn round_trips_high_bytes() {
        let data = [0xFFu8; 11];
        assert_eq!(decode(&encode(&data)).unwrap(), data);
    }

    #[test]
    fn length_header_is_big_endian_and_leading() {
        // 1-byte payload: stream is 00 00 00 01 xx, first full group encodes
        // the header plus nothing of the payload.
        let encoded = encode(&[0xAB]);
        // 5 bytes of stream pack into one full group and one 2-symbol tail.
        assert_eq!(encoded.len(), 7);
    }

    #[test]
    fn rejects_foreign_symbols() {
        assert!(decode("abc de").is_err());
        assert!(decode("abc\u{1F600}").is_err());
    }

    #[test]
    fn rejects_truncated_group() {
        let encoded = encode(b"four");
        assert!(decode(&encoded[..encoded.len() - 4]).is_err());
    }

    #[test]
    fn rejects_overflowing_group() {
        // "~~~~~" decodes above 2^32 - 1.
        assert!(decode("~~~~~").is_err());
    }

    #[test]
    fn rejects_lying_length_header() {
        // Header claims 255 bytes, payload has none.
        let mut stream = String::new();
        let value = 255u64; // 00 00 00 FF
        for p in POWERS {
            stream.push(ALPHABET[((value / p) % 85) as usize] as char);
        }
        assert!(decode(&stream).is_err());
    }
}
