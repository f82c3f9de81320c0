//! The cipher registry.
//!
//! [`Algorithm`] is the closed set of token channels. Each variant carries
//! its wire identity (the 4-character container id), its key size, its
//! legacy and authentication flags, and dispatches `encrypt`/`decrypt` to
//! the module that implements the channel. Dispatch happens here and
//! nowhere else; the cipher modules are plain function pairs.

use strum::EnumIter;

use crate::config::{KEY_SIZE, RC2_KEY_SIZE, TDES_KEY_SIZE, THREEFISH_KEY_SIZE};
use crate::encoder::Encoder;
use crate::error::{Error, Result};

pub mod aes_gcm;
pub mod chacha20poly1305;
pub mod rc2;
pub mod salsa20;
pub mod threefish;
pub mod triple_des;

/// Fills a buffer from the OS-seeded CSPRNG.
///
/// Used for every nonce and IV; uniqueness per key is what the callers'
/// security rests on.
pub(crate) fn fill_random(buf: &mut [u8]) {
    use rand::RngCore;
    rand::rng().fill_bytes(buf);
}

/// A token encryption channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Algorithm {
    AesGcm,
    ChaCha20Poly1305,
    XChaCha20Poly1305,
    Salsa20,
    Threefish512,
    TripleDes,
    Rc2,
    AesLegacy,
}

impl Algorithm {
    /// Human-facing name, accepted by [`Algorithm::from_name`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AesGcm => "aes-gcm",
            Self::ChaCha20Poly1305 => "chacha20-poly1305",
            Self::XChaCha20Poly1305 => "xchacha20-poly1305",
            Self::Salsa20 => "salsa20",
            Self::Threefish512 => "threefish-512",
            Self::TripleDes => "3des",
            Self::Rc2 => "rc2",
            Self::AesLegacy => "aes-cbc",
        }
    }

    /// Container id: exactly the 4 ASCII characters written to the header.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::AesGcm => "AESG",
            Self::ChaCha20Poly1305 => "CC20",
            Self::XChaCha20Poly1305 => "XCCH",
            Self::Salsa20 => "SL20",
            Self::Threefish512 => "3FSH",
            Self::TripleDes => "3DES",
            Self::Rc2 => "RC2_",
            Self::AesLegacy => "AES_",
        }
    }

    /// Required key length in bytes.
    #[must_use]
    pub fn key_size(self) -> usize {
        match self {
            Self::AesGcm
            | Self::ChaCha20Poly1305
            | Self::XChaCha20Poly1305
            | Self::Salsa20
            | Self::AesLegacy => KEY_SIZE,
            Self::Threefish512 => THREEFISH_KEY_SIZE,
            Self::TripleDes => TDES_KEY_SIZE,
            Self::Rc2 => RC2_KEY_SIZE,
        }
    }

    /// Legacy channels are kept for decryption of old tokens; new tokens
    /// should prefer the authenticated 256-bit channels.
    #[must_use]
    pub fn is_legacy(self) -> bool {
        matches!(self, Self::TripleDes | Self::Rc2 | Self::AesLegacy)
    }

    /// Whether decryption verifies an authenticator before releasing
    /// plaintext. Salsa20, Threefish and Triple-DES are confidentiality-only
    /// channels; RC2 counts because the enhanced variant checks its
    /// integrity hash.
    #[must_use]
    pub fn is_authenticated(self) -> bool {
        !matches!(self, Self::Salsa20 | Self::Threefish512 | Self::TripleDes)
    }

    /// Encoder used when the caller does not pick one.
    #[must_use]
    pub fn default_encoder(self) -> Encoder {
        Encoder::Base64Url
    }

    /// Looks a channel up by name.
    ///
    /// # Errors
    /// `InvalidArgument` for unknown names.
    pub fn from_name(name: &str) -> Result<Self> {
        use strum::IntoEnumIterator;
        Self::iter()
            .find(|a| a.name() == name.to_ascii_lowercase())
            .ok_or_else(|| Error::invalid(format!("unknown algorithm: {name}")))
    }

    /// Looks a channel up by container id.
    ///
    /// # Errors
    /// `InvalidArgument` for ids outside the closed set.
    pub fn from_id(id: &str) -> Result<Self> {
        use strum::IntoEnumIterator;
        Self::iter()
            .find(|a| a.id() == id)
            .ok_or_else(|| Error::invalid(format!("unknown algorithm id: {id:?}")))
    }

    /// Encrypts `plaintext`, producing the raw channel blob (no container
    /// header, no encoding).
    ///
    /// # Errors
    /// `InvalidArgument` on a wrong key length or empty plaintext.
    pub fn encrypt(self, plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::AesGcm => aes_gcm::encrypt(key, plaintext),
            Self::ChaCha20Poly1305 => chacha20poly1305::encrypt(key, plaintext),
            Self::XChaCha20Poly1305 => chacha20poly1305::encrypt_xchacha(key, plaintext),
            Self::Salsa20 => salsa20::encrypt(key, plaintext),
            Self::Threefish512 => threefish::encrypt(key, plaintext),
            Self::TripleDes => triple_des::encrypt(key, plaintext),
            Self::Rc2 => rc2::encrypt(key, plaintext),
            Self::AesLegacy => aes_gcm::encrypt_legacy(key, plaintext),
        }
    }

    /// Decrypts a raw channel blob.
    ///
    /// # Errors
    /// `Malformed` when the blob does not parse, `AuthenticationFailure`
    /// when a tag or integrity hash does not verify.
    pub fn decrypt(self, blob: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::AesGcm => aes_gcm::decrypt(key, blob),
            Self::ChaCha20Poly1305 => chacha20poly1305::decrypt(key, blob),
            Self::XChaCha20Poly1305 => chacha20poly1305::decrypt_xchacha(key, blob),
            Self::Salsa20 => salsa20::decrypt(key, blob),
            Self::Threefish512 => threefish::decrypt(key, blob),
            Self::TripleDes => triple_des::decrypt(key, blob),
            Self::Rc2 => rc2::decrypt(key, blob),
            Self::AesLegacy => aes_gcm::decrypt_legacy(key, blob),
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn ids_are_four_ascii_chars_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for algorithm in Algorithm::iter() {
            let id = algorithm.id();
            assert_eq!(id.len(), 4);
            assert!(id.is_ascii());
            assert!(seen.insert(id), "duplicate id {id}");
        }
    }

    #[test]
    fn lookup_round_trips() {
        for algorithm in Algorithm::iter() {
            assert_eq!(Algorithm::from_name(algorithm.name()).unwrap(), algorithm);
            assert_eq!(Algorithm::from_id(algorithm.id()).unwrap(), algorithm);
        }
        assert!(matches!(Algorithm::from_name("rot13"), Err(Error::InvalidArgument(_))));
        assert!(matches!(Algorithm::from_id("XXXX"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn every_channel_round_trips() {
        for algorithm in Algorithm::iter() {
            let key = vec![0xA7u8; algorithm.key_size()];
            let plaintext = b"the quick brown fox jumps over the lazy dog";
            let blob = algorithm.encrypt(plaintext, &key).unwrap();
            assert_eq!(
                algorithm.decrypt(&blob, &key).unwrap(),
                plaintext,
                "{} failed",
                algorithm.name()
            );
        }
    }

    #[test]
    fn every_channel_rejects_wrong_key_length() {
        for algorithm in Algorithm::iter() {
            let key = vec![0u8; algorithm.key_size() + 1];
            assert!(matches!(
                algorithm.encrypt(b"x", &key),
                Err(Error::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn flags_partition_the_registry() {
        assert!(Algorithm::AesGcm.is_authenticated());
        assert!(!Algorithm::Salsa20.is_authenticated());
        assert!(!Algorithm::AesGcm.is_legacy());
        assert!(Algorithm::Rc2.is_legacy());
    }
}
