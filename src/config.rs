//! Wire-format and cryptographic constants.
//!
//! Single source of truth for the container layout and for the sizes every
//! cipher module relies on. Changing anything here changes the on-disk token
//! format, so the values are documented with the rationale that fixed them.

/// Magic bytes opening every container: `"BPIO"`.
pub const MAGIC: [u8; 4] = *b"BPIO";

/// Current container format version.
///
/// Version 1 is the only version ever emitted; readers reject anything else
/// rather than guessing at an unknown payload layout.
pub const CONTAINER_VERSION: u16 = 1;

/// Total size of the container header in bytes (magic + version + id).
pub const HEADER_SIZE: usize = 10;

/// Size of the NUL-padded ASCII algorithm identifier in the header.
pub const ALGORITHM_ID_SIZE: usize = 4;

/// Key size for the 256-bit ciphers (AES-256, ChaCha family, Salsa20).
pub const KEY_SIZE: usize = 32;

/// Key size for Threefish-512 (eight 64-bit words).
pub const THREEFISH_KEY_SIZE: usize = 64;

/// Key size for Triple-DES (three 8-byte DES keys, EDE order).
pub const TDES_KEY_SIZE: usize = 24;

/// Key size for RC2 (128-bit, matching the effective key size below).
pub const RC2_KEY_SIZE: usize = 16;

/// Nonce size for ChaCha20 and AES-GCM (96 bits).
pub const CHACHA_NONCE_SIZE: usize = 12;

/// Extended nonce size for XChaCha20 (192 bits).
///
/// The first 16 bytes feed HChaCha20 subkey derivation, the remaining 8
/// become the tail of the derived ChaCha20 nonce.
pub const XCHACHA_NONCE_SIZE: usize = 24;

/// Nonce size for Salsa20 (64 bits).
pub const SALSA_NONCE_SIZE: usize = 8;

/// IV size for the 64-bit block ciphers (Triple-DES, RC2).
pub const BLOCK_IV_SIZE: usize = 8;

/// Poly1305 / GCM / HMAC-truncated authentication tag size.
pub const TAG_SIZE: usize = 16;

/// One-time Poly1305 key size (clamped `r` plus `s`).
pub const POLY1305_KEY_SIZE: usize = 32;

/// Keystream block size of the Bernstein ciphers.
pub const STREAM_BLOCK_SIZE: usize = 64;

/// Threefish-512 block size (eight 64-bit words).
pub const THREEFISH_BLOCK_SIZE: usize = 64;

/// SHA-256 digest size, used by the RC2 enhanced integrity field.
pub const HASH_SIZE: usize = 32;

/// PBKDF2-HMAC-SHA-256 iteration count for the RC2 enhanced key schedule.
///
/// 10 000 iterations keeps old blobs readable; raising it would silently
/// break compatibility because the count is not recorded in the container.
pub const RC2_PBKDF2_ITERATIONS: u32 = 10_000;

/// RC2 effective key size in bits.
pub const RC2_EFFECTIVE_KEY_BITS: usize = 128;

/// Chunk size for Salsa20 bulk processing.
///
/// 16 KiB (256 keystream blocks) keeps the working set inside L1 while
/// amortising the per-call dispatch cost.
pub const SALSA_CHUNK_SIZE: usize = 16 * 1024;
