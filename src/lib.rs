//! bpio - self-describing token encryption.
//!
//! Encrypts short structured payloads (a title plus instructions) under a
//! chosen symmetric algorithm and encoder, producing a self-describing
//! token: a `BPIO` container in front of the cipher blob, rendered as
//! Base64-URL, Base85 or Base65536 text. Decryption reverses the path, with
//! the container header routing each blob to the cipher that wrote it.
//!
//! The Bernstein stream ciphers (ChaCha20, XChaCha20, Salsa20) carry their
//! own scalar, SSE2, AVX2 and NEON kernels; a process-wide selector picks
//! the fastest one the host supports. AES delegates to the platform-backed
//! `aes-gcm` implementation, the legacy block channels to the matching
//! RustCrypto primitives.

pub mod backend;
pub mod bernstein;
pub mod bytes;
pub mod cipher;
pub mod cli;
pub mod config;
pub mod constant_time;
pub mod container;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod payload;
pub mod poly1305;

pub use backend::{Backend, Selector};
pub use cipher::Algorithm;
pub use container::Header;
pub use encoder::Encoder;
pub use engine::{Engine, list_algorithms, list_encoders};
pub use error::{Error, Result};
pub use payload::Payload;
