//! Error taxonomy for the encryption engine.
//!
//! Every fallible public operation surfaces one of these kinds; nothing is
//! swallowed. Authentication failures deliberately carry no detail so that
//! neither plaintext nor tag material can leak through an error message.

use thiserror::Error;

/// Errors produced by the engine, the ciphers, the encoders and the
/// container codec.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller-supplied input is unusable: wrong key or nonce length, empty
    /// plaintext, unknown algorithm or encoder name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Input data does not parse: truncated blob, bad magic, unknown
    /// container version, invalid encoder symbol, inconsistent length field.
    #[error("malformed input: {0}")]
    Malformed(String),

    /// An authentication tag or integrity hash did not verify. The blob is
    /// rejected as a whole and no plaintext is released.
    #[error("authentication failed")]
    AuthenticationFailure,

    /// A forced cipher backend is not available on this host.
    #[error("backend not supported on this host: {0}")]
    Unsupported(&'static str),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

pub type Result<T> = core::result::Result<T, Error>;
