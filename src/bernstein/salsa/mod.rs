//! Salsa20.
//!
//! State layout (16 little-endian words): constants at {0, 5, 10, 15}, key
//! words at {1..4, 11..14}, nonce at {6, 7}, block counter at {8, 9}. The
//! 32-bit counter lives in word 8 and carries into word 9 on overflow.
//!
//! The SIMD kernels hold the state as four diagonals of the Salsa matrix so
//! that the column round is a plain vector quarter round and the row round
//! is the same operation after a lane rotation, mirroring the ChaCha
//! kernels' shape.

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
use crate::config::{KEY_SIZE, SALSA_NONCE_SIZE};

fn init_state(key: &[u8; KEY_SIZE], nonce: &[u8; SALSA_NONCE_SIZE], counter: u32) -> [u32; 16] {
    [
        SIGMA[0],
        read_u32_le(&key[0..4]),
        read_u32_le(&key[4..8]),
        read_u32_le(&key[8..12]),
        read_u32_le(&key[12..16]),
        SIGMA[1],
        read_u32_le(&nonce[0..4]),
        read_u32_le(&nonce[4..8]),
        counter,
        0,
        SIGMA[2],
        read_u32_le(&key[16..20]),
        read_u32_le(&key[20..24]),
        read_u32_le(&key[24..28]),
        read_u32_le(&key[28..32]),
        SIGMA[3],
    ]
}

/// Advances the block counter, carrying into word 9.
#[inline]
pub(crate) fn increment(state: &mut [u32; 16]) {
    state[8] = state[8].wrapping_add(1);
    if state[8] == 0 {
        state[9] = state[9].wrapping_add(1);
    }
}

/// XORs the Salsa20 keystream into `data` using the selected backend.
pub fn xor_keystream(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; SALSA_NONCE_SIZE],
    counter: u32,
    data: &mut [u8],
) {
    let mut state = init_state(key, nonce, counter);
    apply(&mut state, backend::SALSA.current(), data);
    state.zeroize();
}

/// Dispatches one keystream application to a specific kernel.
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
