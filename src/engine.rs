//! The engine façade.
//!
//! An [`Engine`] pairs one [`Algorithm`] with one [`Encoder`] and exposes
//! the full token pipeline:
//!
//! ```text
//! encrypt:  plaintext → cipher blob → BPIO header prepended → encoder → token
//! decrypt:  token → encoder → header parsed → cipher chosen by id → plaintext
//! ```
//!
//! `encrypt`/`decrypt` operate on raw cipher blobs without header or
//! encoding; the `*_and_encode` pair speaks the full token format. On
//! decode the container id picks the cipher, so an engine configured for
//! one algorithm can still open any well-formed token whose key it holds.
//!
//! Engines are cheap value objects and thread-safe: ciphers hold no per-call
//! state and the backend caches publish through acquire/release.

use tracing::debug;

use crate::cipher::Algorithm;
use crate::container::Header;
use crate::encoder::Encoder;
use crate::error::{Error, Result};

/// A configured encryption engine.
#[derive(Debug, Clone, Copy)]
pub struct Engine {
    algorithm: Algorithm,
    encoder: Encoder,
}

impl Engine {
    /// Creates an engine using the algorithm's default encoder.
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm, encoder: algorithm.default_encoder() }
    }

    /// Replaces the encoder.
    #[must_use]
    pub fn with_encoder(mut self, encoder: Encoder) -> Self {
        self.encoder = encoder;
        self
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[must_use]
    pub fn encoder(&self) -> Encoder {
        self.encoder
    }

    /// Encrypts to a raw cipher blob (no header, no encoding).
    ///
    /// # Errors
    /// `InvalidArgument` on wrong key length or empty plaintext.
    pub fn encrypt(&self, plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.algorithm.encrypt(plaintext, key)
    }

    /// Decrypts a raw cipher blob produced by this engine's algorithm.
    ///
    /// # Errors
    /// `Malformed` or `AuthenticationFailure`, see [`Algorithm::decrypt`].
    pub fn decrypt(&self, blob: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.algorithm.decrypt(blob, key)
    }

    /// Encrypts arbitrary bytes into a complete encoded token.
    ///
    /// # Errors
    /// See [`Engine::encrypt`].
    pub fn encrypt_and_encode_bytes(&self, data: &[u8], key: &[u8]) -> Result<String> {
        let blob = self.encrypt(data, key)?;
        let mut framed = Header::new(self.algorithm.id()).to_bytes().to_vec();
        framed.extend_from_slice(&blob);
        Ok(self.encoder.encode(&framed))
    }

    /// Encrypts UTF-8 text into a complete encoded token.
    ///
    /// # Errors
    /// See [`Engine::encrypt`].
    pub fn encrypt_and_encode(&self, text: &str, key: &[u8]) -> Result<String> {
        self.encrypt_and_encode_bytes(text.as_bytes(), key)
    }

    /// Decodes a token and decrypts it, routing by the container id.
    ///
    /// The engine's encoder decodes the string; the header then dispatches
    /// to whichever cipher wrote the blob.
    ///
    /// # Errors
    /// `Malformed` on undecodable tokens or bad containers,
    /// `InvalidArgument` on an id outside the registry,
    /// `AuthenticationFailure` from the cipher.
    pub fn decode_and_decrypt_bytes(&self, token: &str, key: &[u8]) -> Result<Vec<u8>> {
        let framed = self.encoder.decode(token)?;
        let (header, blob) = Header::read(&framed)?;
        let algorithm = Algorithm::from_id(header.algorithm_id())?;
        debug!(
            id = header.algorithm_id(),
            algorithm = algorithm.name(),
            "container dispatch"
        );
        algorithm.decrypt(blob, key)
    }

    /// Decodes a token and decrypts it to UTF-8 text.
    ///
    /// # Errors
    /// As [`Engine::decode_and_decrypt_bytes`], plus `Malformed` when the
    /// plaintext is not UTF-8.
    pub fn decode_and_decrypt(&self, token: &str, key: &[u8]) -> Result<String> {
        let plaintext = self.decode_and_decrypt_bytes(token, key)?;
        String::from_utf8(plaintext).map_err(|_| Error::malformed("plaintext is not UTF-8"))
    }

    /// Generates a fresh random key of the algorithm's required size.
    #[must_use]
    pub fn generate_key(&self) -> Vec<u8> {
        let mut key = vec![0u8; self.algorithm.key_size()];
        crate::cipher::fill_random(&mut key);
        key
    }
}

/// One row of the algorithm listing.
#[derive(Debug, Clone)]
pub struct AlgorithmInfo {
    pub name: &'static str,
    pub id: &'static str,
    pub key_size: usize,
    pub legacy: bool,
    pub authenticated: bool,
    pub default_encoder: &'static str,
}

/// One row of the encoder listing.
#[derive(Debug, Clone)]
pub struct EncoderInfo {
    pub name: &'static str,
    pub url_safe: bool,
}

/// Metadata for every registered algorithm, for the CLI listing.
#[must_use]
pub fn list_algorithms() -> Vec<AlgorithmInfo> {
    use strum::IntoEnumIterator;
    Algorithm::iter()
        .map(|a| AlgorithmInfo {
            name: a.name(),
            id: a.id(),
            key_size: a.key_size(),
            legacy: a.is_legacy(),
            authenticated: a.is_authenticated(),
            default_encoder: a.default_encoder().name(),
        })
        .collect()
}

/// Metadata for every encoder, for the CLI listing.
#[must_use]
pub fn list_encoders() -> Vec<EncoderInfo> {
    use strum::IntoEnumIterator;
    Encoder::iter()
        .map(|e| EncoderInfo { name: e.name(), url_safe: e.is_url_safe() })
        .collect()
}
