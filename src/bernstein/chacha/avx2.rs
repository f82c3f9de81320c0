//! AVX2 kernel: two 64-byte blocks per iteration.
//!
//! Each 256-bit register carries one state row for two consecutive counter
//! values, block n in the low 128-bit lane and block n+1 in the high lane.
//! `_mm256_shuffle_epi32` rotates lanes independently, so the SSE2 swizzle
//! constants apply unchanged.

#![allow(clippy::cast_ptr_alignment)]

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::bytes::xor_keystream_mut;
use crate::config::STREAM_BLOCK_SIZE;

const WIDE_BLOCK: usize = 2 * STREAM_BLOCK_SIZE;

macro_rules! add_rotate_xor {
    ($a:expr, $b:expr, $c:expr, $r:literal) => {
        $a = _mm256_add_epi32($a, $b);
        $c = _mm256_xor_si256($c, $a);
        $c = _mm256_xor_si256(_mm256_slli_epi32($c, $r), _mm256_srli_epi32($c, 32 - $r));
    };
}

macro_rules! round {
    ($a:expr, $b:expr, $c:expr, $d:expr) => {
        add_rotate_xor!($a, $b, $d, 16);
        add_rotate_xor!($c, $d, $b, 12);
        add_rotate_xor!($a, $b, $d, 8);
        add_rotate_xor!($c, $d, $b, 7);
    };
}

macro_rules! swizzle {
    ($b:expr, $c:expr, $d:expr) => {
        $b = _mm256_shuffle_epi32($b, 0b0011_1001);
        $c = _mm256_shuffle_epi32($c, 0b0100_1110);
        $d = _mm256_shuffle_epi32($d, 0b1001_0011);
    };
}

#[target_feature(enable = "avx2")]
pub(super) unsafe fn xor_keystream(state: &mut [u32; 16], data: &mut [u8]) {
    unsafe {
        let row_a = _mm_loadu_si128(state.as_ptr().cast::<__m128i>());
        let row_b = _mm_loadu_si128(state.as_ptr().add(4).cast::<__m128i>());
        let row_c = _mm_loadu_si128(state.as_ptr().add(8).cast::<__m128i>());
        let row_d = _mm_loadu_si128(state.as_ptr().add(12).cast::<__m128i>());

        let a0 = _mm256_broadcastsi128_si256(row_a);
        let b0 = _mm256_broadcastsi128_si256(row_b);
        let c0 = _mm256_broadcastsi128_si256(row_c);
        // High lane runs one block ahead; the counter add is 64-bit across
        // words 12/13 to reproduce the scalar carry.
        let row_d1 = _mm_add_epi64(row_d, _mm_set_epi64x(0, 1));
        let mut d0 = _mm256_inserti128_si256(_mm256_castsi128_si256(row_d), row_d1, 1);
        let two = _mm256_set_epi64x(0, 2, 0, 2);

        let mut keystream = [0u8; WIDE_BLOCK];
        for chunk in data.chunks_mut(WIDE_BLOCK) {
            let mut a = a0;
            let mut b = b0;
            let mut c = c0;
            let mut d = d0;
            for _ in 0..10 {
                round!(a, b, c, d);
                swizzle!(b, c, d);
                round!(a, b, c, d);
                swizzle!(d, c, b);
            }
            a = _mm256_add_epi32(a, a0);
            b = _mm256_add_epi32(b, b0);
            c = _mm256_add_epi32(c, c0);
            d = _mm256_add_epi32(d, d0);

            // Interleave rows back into two serial 64-byte blocks.
            let kp = keystream.as_mut_ptr().cast::<__m128i>();
            _mm_storeu_si128(kp, _mm256_extracti128_si256(a, 0));
            _mm_storeu_si128(kp.add(1), _mm256_extracti128_si256(b, 0));
            _mm_storeu_si128(kp.add(2), _mm256_extracti128_si256(c, 0));
            _mm_storeu_si128(kp.add(3), _mm256_extracti128_si256(d, 0));
            _mm_storeu_si128(kp.add(4), _mm256_extracti128_si256(a, 1));
            _mm_storeu_si128(kp.add(5), _mm256_extracti128_si256(b, 1));
            _mm_storeu_si128(kp.add(6), _mm256_extracti128_si256(c, 1));
            _mm_storeu_si128(kp.add(7), _mm256_extracti128_si256(d, 1));

            xor_keystream_mut(chunk, &keystream);
            d0 = _mm256_add_epi64(d0, two);
        }
    }
}
