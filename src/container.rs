//! The BPIO container codec.
//!
//! Every token blob opens with a fixed 10-byte header that makes the blob
//! self-describing:
//!
//! ```text
//! offset 0 : 'B' 'P' 'I' 'O'
//! offset 4 : u16 version (little-endian, currently 1)
//! offset 6 : 4 ASCII characters of algorithm id, NUL-padded
//! offset 10: algorithm-specific payload
//! ```
//!
//! The algorithm id is what lets `decode_and_decrypt` route a blob to the
//! cipher that produced it, independent of the engine's own configuration.

use crate::config::{ALGORITHM_ID_SIZE, CONTAINER_VERSION, HEADER_SIZE, MAGIC};
use crate::error::{Error, Result};

/// A parsed or to-be-written container header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    version: u16,
    algorithm_id: String,
}

impl Header {
    /// Creates a version-1 header for the given algorithm id.
    ///
    /// The id must be 1 to 4 ASCII characters; shorter ids are NUL-padded
    /// on write.
    #[must_use]
    pub fn new(algorithm_id: &str) -> Self {
        debug_assert!(algorithm_id.len() <= ALGORITHM_ID_SIZE);
        debug_assert!(algorithm_id.is_ascii());
        Self { version: CONTAINER_VERSION, algorithm_id: algorithm_id.to_string() }
    }

    #[must_use]
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Algorithm id with trailing NULs stripped.
    #[must_use]
    pub fn algorithm_id(&self) -> &str {
        &self.algorithm_id
    }

    /// Serialises the header to its 10-byte wire form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[..4].copy_from_slice(&MAGIC);
        out[4..6].copy_from_slice(&self.version.to_le_bytes());
        out[6..6 + self.algorithm_id.len()].copy_from_slice(self.algorithm_id.as_bytes());
        out
    }

    /// Parses a header off the front of `blob`, returning it together with
    /// the algorithm payload that follows.
    ///
    /// # Errors
    /// `Malformed` on truncation, wrong magic, unknown version, or a
    /// non-ASCII algorithm id.
    pub fn read(blob: &[u8]) -> Result<(Self, &[u8])> {
        if blob.len() < HEADER_SIZE {
            return Err(Error::malformed(format!(
                "container truncated: {} bytes, header needs {HEADER_SIZE}",
                blob.len()
            )));
        }
        if blob[..4] != MAGIC {
            return Err(Error::malformed("bad container magic"));
        }
        let version = u16::from_le_bytes([blob[4], blob[5]]);
        if version != CONTAINER_VERSION {
            return Err(Error::malformed(format!(
                "unsupported container version: {version} (expected {CONTAINER_VERSION})"
            )));
        }
        let raw_id = &blob[6..HEADER_SIZE];
        let id_len = raw_id.iter().position(|&b| b == 0).unwrap_or(ALGORITHM_ID_SIZE);
        let algorithm_id = core::str::from_utf8(&raw_id[..id_len])
            .map_err(|_| Error::malformed("non-ASCII algorithm id"))?;
        if !algorithm_id.is_ascii() {
            return Err(Error::malformed("non-ASCII algorithm id"));
        }
        Ok((Self { version, algorithm_id: algorithm_id.to_string() }, &blob[HEADER_SIZE..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_version_and_id() {
        for id in ["AESG", "CC20", "RC2_", "3FSH"] {
            let header = Header::new(id);
            let bytes = header.to_bytes();
            let (parsed, rest) = Header::read(&bytes).unwrap();
            assert_eq!(parsed, header);
            assert_eq!(parsed.version(), 1);
            assert_eq!(parsed.algorithm_id(), id);
            assert!(rest.is_empty());
        }
    }

    #[test]
    fn short_ids_are_nul_padded_and_stripped() {
        let header = Header::new("AB");
        let bytes = header.to_bytes();
        assert_eq!(&bytes[6..], &[b'A', b'B', 0, 0]);
        let (parsed, _) = Header::read(&bytes).unwrap();
        assert_eq!(parsed.algorithm_id(), "AB");
    }

    #[test]
    fn payload_follows_the_header() {
        let mut blob = Header::new("SL20").to_bytes().to_vec();
        blob.extend_from_slice(b"payload");
        let (_, payload) = Header::read(&blob).unwrap();
        assert_eq!(payload, b"payload");
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = Header::new("AESG").to_bytes();
        bytes[0] = b'X';
        assert!(matches!(Header::read(&bytes), Err(Error::Malformed(_))));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = Header::new("AESG").to_bytes();
        bytes[4] = 2;
        assert!(matches!(Header::read(&bytes), Err(Error::Malformed(_))));
    }

    #[test]
    fn rejects_truncation() {
        let bytes = Header::new("AESG").to_bytes();
        assert!(matches!(Header::read(&bytes[..9]), Err(Error::Malformed(_))));
    }
}
