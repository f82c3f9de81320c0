//! The Bernstein stream-cipher family.
//!
//! ChaCha20, XChaCha20 (through HChaCha20 subkey derivation) and Salsa20
//! share the same skeleton: a 16-word little-endian state, 20 rounds of
//! quarter-round mixing arranged as 10 double rounds, the initial state
//! added back, and the resulting 64-byte block XORed into the data.
//!
//! The scalar kernels are the reference; the SIMD kernels under each cipher
//! are required to be bit-exact with them and are checked against them in
//! the unit tests.

pub mod chacha;
pub mod salsa;

/// `"expand 32-byte k"` as four little-endian words.
pub(crate) const SIGMA: [u32; 4] = [0x6170_7865, 0x3320_646E, 0x7962_2D32, 0x6B20_6574];
