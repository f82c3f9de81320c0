//! ChaCha20, XChaCha20 and the HChaCha20 subkey derivation.
//!
//! State layout (16 little-endian words):
//!
//! ```text
//! c0 c1 c2 c3   constants "expand 32-byte k"
//! k0 k1 k2 k3   key words 0..3
//! k4 k5 k6 k7   key words 4..7
//! ctr n0 n1 n2  32-bit block counter, 96-bit nonce
//! ```
//!
//! The counter lives in word 12; when it wraps, word 13 is carried into,
//! which lets the counter pair behave as a single 64-bit little-endian
//! value. Callers keep well under 2^32 blocks per nonce, so the carry is a
//! convenience, not a promise.

mod scalar;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod sse2;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
mod avx2;

#[cfg(target_arch = "aarch64")]
mod neon;

use zeroize::Zeroize;

use super::SIGMA;
use crate::backend::{self, Backend};
use crate::bytes::read_u32_le;
use crate::config::{CHACHA_NONCE_SIZE, KEY_SIZE, XCHACHA_NONCE_SIZE};

/// Builds the initial 16-word state for a key, nonce and block counter.
fn init_state(key: &[u8; KEY_SIZE], nonce: &[u8; CHACHA_NONCE_SIZE], counter: u32) -> [u32; 16] {
    let mut state = [0u32; 16];
    state[..4].copy_from_slice(&SIGMA);
    for (i, word) in state[4..12].iter_mut().enumerate() {
        *word = read_u32_le(&key[4 * i..4 * i + 4]);
    }
    state[12] = counter;
    state[13] = read_u32_le(&nonce[0..4]);
    state[14] = read_u32_le(&nonce[4..8]);
    state[15] = read_u32_le(&nonce[8..12]);
    state
}

/// Advances the block counter, carrying into the adjacent nonce word.
#[inline]
pub(crate) fn increment(state: &mut [u32; 16]) {
    state[12] = state[12].wrapping_add(1);
    if state[12] == 0 {
        state[13] = state[13].wrapping_add(1);
    }
}

/// XORs the ChaCha20 keystream into `data` using the selected backend.
pub fn xor_keystream(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; CHACHA_NONCE_SIZE],
    counter: u32,
    data: &mut [u8],
) {
    let mut state = init_state(key, nonce, counter);
    apply(&mut state, backend::CHACHA.current(), data);
    state.zeroize();
}

/// Dispatches one keystream application to a specific kernel.
///
/// The state is scratch: kernels may advance it in place, callers must not
/// reuse it.
pub(crate) fn apply(state: &mut [u32; 16], backend: Backend, data: &mut [u8]) {
    match backend {
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        Backend::Sse2 => unsafe { sse2::xor_keystream(state, data) },
        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        Backend::Avx2 => unsafe { avx2::xor_keystream(state, data) },
        #[cfg(target_arch = "aarch64")]
        Backend::Neon => unsafe { neon::xor_keystream(state, data) },
        _ => scalar::xor_keystream(state, data),
    }
}

/// Derives the XChaCha20 subkey: a ChaCha state keyed as usual, with the
/// first 16 nonce bytes in words 12..15, run for 20 rounds *without* the
/// final state addition. Output is words {0..3, 12..15}.
#[must_use]
pub fn hchacha20(key: &[u8; KEY_SIZE], nonce: &[u8; 16]) -> [u8; KEY_SIZE] {
    let mut state = [0u32; 16];
    state[..4].copy_from_slice(&SIGMA);
    for (i, word) in state[4..12].iter_mut().enumerate() {
        *word = read_u32_le(&key[4 * i..4 * i + 4]);
    }
    for (i, word) in state[12..16].iter_mut().enumerate() {
        *word = read_u32_le(&nonce[4 * i..4 * i + 4]);
    }

    scalar::rounds(&mut state);

    let mut subkey = [0u8; KEY_SIZE];
    crate::bytes::write_u32v_le(&mut subkey[..16], &state[0..4]);
    crate::bytes::write_u32v_le(&mut subkey[16..], &state[12..16]);
    state.zeroize();
    subkey
}

/// XORs the XChaCha20 keystream into `data`.
///
/// Runs ordinary ChaCha20 under the HChaCha20 subkey, with the last 8 nonce
/// bytes behind a 4-byte zero prefix.
pub fn xor_keystream_xchacha(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; XCHACHA_NONCE_SIZE],
    counter: u32,
    data: &mut [u8],
) {
    let mut subkey = hchacha20(key, nonce[..16].try_into().expect("16-byte prefix"));
    let mut short_nonce = [0u8; CHACHA_NONCE_SIZE];
    short_nonce[4..].copy_from_slice(&nonce[16..]);
    xor_keystream(&subkey, &short_nonce, counter, data);
    subkey.zeroize();
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8439 section 2.8.2: the AEAD example's ciphertext is the sunscreen
    // plaintext XORed with the ChaCha20 keystream at counter 1.
    const RFC_KEY: [u8; 32] = [
        0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8a, 0x8b, 0x8c, 0x8d, 0x8e,
        0x8f, 0x90, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0x9b, 0x9c, 0x9d,
        0x9e, 0x9f,
    ];
    const RFC_NONCE: [u8; 12] = [
        0x07, 0x00, 0x00, 0x00, 0x40, 0x41, 0x42, 0x43, 0x44, 0x45, 0x46, 0x47,
    ];
    const RFC_PLAINTEXT: &[u8] = &[
        0x4c, 0x61, 0x64, 0x69, 0x65, 0x73, 0x20, 0x61, 0x6e, 0x64, 0x20, 0x47, 0x65, 0x6e, 0x74,
        0x6c, 0x65, 0x6d, 0x65, 0x6e, 0x20, 0x6f, 0x66, 0x20, 0x74, 0x68, 0x65, 0x20, 0x63, 0x6c,
        0x61, 0x73, 0x73, 0x20, 0x6f, 0x66, 0x20, 0x27, 0x39, 0x39, 0x3a, 0x20, 0x49, 0x66, 0x20,
        0x49, 0x20, 0x63, 0x6f, 0x75, 0x6c, 0x64, 0x20, 0x6f, 0x66, 0x66, 0x65, 0x72, 0x20, 0x79,
        0x6f, 0x75, 0x20, 0x6f, 0x6e, 0x6c, 0x79, 0x20, 0x6f, 0x6e, 0x65, 0x20, 0x74, 0x69, 0x70,
        0x20, 0x66, 0x6f, 0x72, 0x20, 0x74, 0x68, 0x65, 0x20, 0x66, 0x75, 0x74, 0x75, 0x72, 0x65,
        0x2c, 0x20, 0x73, 0x75, 0x6e, 0x73, 0x63, 0x72, 0x65, 0x65, 0x6e, 0x20, 0x77, 0x6f, 0x75,
        0x6c, 0x64, 0x20, 0x62, 0x65, 0x20, 0x69, 0x74, 0x2e,
    ];
    const RFC_CIPHERTEXT: &[u8] = &[
        0xd3, 0x1a, 0x8d, 0x34, 0x64, 0x8e, 0x60, 0xdb, 0x7b, 0x86, 0xaf, 0xbc, 0x53, 0xef, 0x7e,
        0xc2, 0xa4, 0xad, 0xed, 0x51, 0x29, 0x6e, 0x08, 0xfe, 0xa9, 0xe2, 0xb5, 0xa7, 0x36, 0xee,
        0x62, 0xd6, 0x3d, 0xbe, 0xa4, 0x5e, 0x8c, 0xa9, 0x67, 0x12, 0x82, 0xfa, 0xfb, 0x69, 0xda,
        0x92, 0x72, 0x8b, 0x1a, 0x71, 0xde, 0x0a, 0x9e, 0x06, 0x0b, 0x29, 0x05, 0xd6, 0xa5, 0xb6,
        0x7e, 0xcd, 0x3b, 0x36, 0x92, 0xdd, 0xbd, 0x7f, 0x2d, 0x77, 0x8b, 0x8c, 0x98, 0x03, 0xae,
        0xe3, 0x28, 0x09, 0x1b, 0x58, 0xfa, 0xb3, 0x24, 0xe4, 0xfa, 0xd6, 0x75, 0x94, 0x55, 0x85,
        0x80, 0x8b, 0x48, 0x31, 0xd7, 0xbc, 0x3f, 0xf4, 0xde, 0xf0, 0x8e, 0x4b, 0x7a, 0x9d, 0xe5,
        0x76, 0xd2, 0x65, 0x86, 0xce, 0xc6, 0x4b, 0x61, 0x16,
    ];

    #[test]
    fn rfc8439_keystream_vector() {
        let mut data = RFC_PLAINTEXT.to_vec();
        let mut state = init_state(&RFC_KEY, &RFC_NONCE, 1);
        scalar::xor_keystream(&mut state, &mut data);
        assert_eq!(data, RFC_CIPHERTEXT);
    }

    #[test]
    fn keystream_is_invertible() {
        let key = [7u8; 32];
        let nonce = [3u8; 12];
        let mut data = vec![0x5Au8; 301];
        xor_keystream(&key, &nonce, 1, &mut data);
        assert_ne!(data, vec![0x5Au8; 301]);
        xor_keystream(&key, &nonce, 1, &mut data);
        assert_eq!(data, vec![0x5Au8; 301]);
    }

    #[test]
    fn counter_carries_into_nonce_word() {
        let mut state = [0u32; 16];
        state[12] = u32::MAX;
        increment(&mut state);
        assert_eq!(state[12], 0);
        assert_eq!(state[13], 1);
    }

    // draft-irtf-cfrg-xchacha section 2.2.1.
    #[test]
    fn hchacha20_subkey_vector() {
        let key: [u8; 32] = core::array::from_fn(|i| i as u8);
        let nonce = [
            0x00, 0x00, 0x00, 0x09, 0x00, 0x00, 0x00, 0x4a, 0x00, 0x00, 0x00, 0x00, 0x31, 0x41,
            0x59, 0x27,
        ];
        let expected = [
            0x82, 0x41, 0x3b, 0x42, 0x27, 0xb2, 0x7b, 0xfe, 0xd3, 0x0e, 0x42, 0x50, 0x8a, 0x87,
            0x7d, 0x73, 0xa0, 0xf9, 0xe4, 0xd5, 0x8a, 0x74, 0xa8, 0x53, 0xc1, 0x2e, 0xc4, 0x13,
            0x26, 0xd3, 0xec, 0xdc,
        ];
        assert_eq!(hchacha20(&key, &nonce), expected);
    }

    #[test]
    fn xchacha_round_trips() {
        let key = [0x42u8; 32];
        let nonce = [0x24u8; 24];
        let original: Vec<u8> = (0..200u16).map(|i| (i % 251) as u8).collect();
        let mut data = original.clone();
        xor_keystream_xchacha(&key, &nonce, 1, &mut data);
        assert_ne!(data, original);
        xor_keystream_xchacha(&key, &nonce, 1, &mut data);
        assert_eq!(data, original);
    }

    #[test]
    fn backends_match_scalar() {
        let key: [u8; 32] = core::array::from_fn(|i| i as u8);
        let nonce: [u8; 12] = core::array::from_fn(|i| (i * 3 + 1) as u8);
        let lengths = [1usize, 63, 64, 65, 127, 128, 200, 16 * 1024 + 5];
        for backend in [Backend::Sse2, Backend::Avx2, Backend::Neon] {
            if !backend.is_supported() {
                continue;
            }
            for &len in &lengths {
                let mut reference: Vec<u8> = (0..len).map(|i| (i % 255) as u8).collect();
                let mut candidate = reference.clone();
                let mut state = init_state(&key, &nonce, 0xFFFF_FFFE);
                scalar::xor_keystream(&mut state, &mut reference);
                let mut state = init_state(&key, &nonce, 0xFFFF_FFFE);
                apply(&mut state, backend, &mut candidate);
                assert_eq!(reference, candidate, "{} diverged at len {len}", backend.name());
            }
        }
    }
}
