//! The structured token payload.
//!
//! A token carries a short title plus free-form instructions. Both fields
//! are length-prefixed so the frame parses exactly even when a block cipher
//! pads the plaintext with zeros; anything after the second field is
//! ignored.

use crate::error::{Error, Result};

/// Title and instructions carried inside a token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    pub title: String,
    pub instructions: String,
}

impl Payload {
    #[must_use]
    pub fn new(title: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self { title: title.into(), instructions: instructions.into() }
    }

    /// Serialises to `u32-LE len ‖ title ‖ u32-LE len ‖ instructions`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.title.len() + self.instructions.len());
        out.extend_from_slice(&(self.title.len() as u32).to_le_bytes());
        out.extend_from_slice(self.title.as_bytes());
        out.extend_from_slice(&(self.instructions.len() as u32).to_le_bytes());
        out.extend_from_slice(self.instructions.as_bytes());
        out
    }

    /// Parses a payload frame.
    ///
    /// # Errors
    /// `Malformed` on truncated fields or non-UTF-8 contents.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let (title, rest) = read_field(data, "title")?;
        let (instructions, _) = read_field(rest, "instructions")?;
        Ok(Self { title, instructions })
    }
}

fn read_field<'a>(data: &'a [u8], name: &str) -> Result<(String, &'a [u8])> {
    if data.len() < 4 {
        return Err(Error::malformed(format!("payload truncated before {name} length")));
    }
    let len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let rest = &data[4..];
    if len > rest.len() {
        return Err(Error::malformed(format!("payload {name} length {len} exceeds frame")));
    }
    let text = core::str::from_utf8(&rest[..len])
        .map_err(|_| Error::malformed(format!("payload {name} is not UTF-8")))?
        .to_string();
    Ok((text, &rest[len..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let payload = Payload::new("demo", "hello");
        assert_eq!(Payload::from_bytes(&payload.to_bytes()).unwrap(), payload);
    }

    #[test]
    fn empty_fields_round_trip() {
        let payload = Payload::new("", "");
        assert_eq!(Payload::from_bytes(&payload.to_bytes()).unwrap(), payload);
    }

    #[test]
    fn trailing_zero_padding_is_ignored() {
        let mut bytes = Payload::new("t", "i").to_bytes();
        bytes.extend_from_slice(&[0u8; 37]);
        assert_eq!(Payload::from_bytes(&bytes).unwrap(), Payload::new("t", "i"));
    }

    #[test]
    fn rejects_truncated_frame() {
        let bytes = Payload::new("title", "body").to_bytes();
        assert!(Payload::from_bytes(&bytes[..7]).is_err());
        assert!(Payload::from_bytes(&[]).is_err());
    }

    #[test]
    fn rejects_lying_length() {
        let mut bytes = Payload::new("abc", "").to_bytes();
        bytes[0] = 0xFF;
        assert!(Payload::from_bytes(&bytes).is_err());
    }
}
