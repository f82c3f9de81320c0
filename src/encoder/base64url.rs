//! URL-safe Base64 without padding.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::error::{Error, Result};

pub fn encode(data: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub fn decode(token: &str) -> Result<Vec<u8>> {
    // Tolerate tokens that arrive with their padding intact.
    let trimmed = token.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .map_err(|e| Error::malformed(format!("base64 decode failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_bytes_use_url_safe_alphabet() {
        assert_eq!(encode(&[0xFB, 0xFF, 0xBF]), "-_-_");
        assert_eq!(decode("-_-_").unwrap(), [0xFB, 0xFF, 0xBF]);
    }

    #[test]
    fn padding_is_stripped_and_tolerated() {
        assert_eq!(encode(b"hi"), "aGk");
        assert_eq!(decode("aGk").unwrap(), b"hi");
        assert_eq!(decode("aGk=").unwrap(), b"hi");
    }

    #[test]
    fn rejects_foreign_symbols() {
        assert!(decode("ab/c").is_err());
        assert!(decode("sp ace").is_err());
    }
}
