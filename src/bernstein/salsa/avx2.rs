//! AVX2 kernel: two 64-byte blocks per iteration.
//!
//! Same diagonal layout as the SSE2 kernel, with block n in the low 128-bit
//! lane and block n+1 in the high lane. `_mm256_shuffle_epi32` rotates the
//! lanes independently, so the swizzle constants carry over unchanged.

#![allow(clippy::cast_ptr_alignment)]

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::bytes::{write_u32v_le, xor_keystream_mut};
use crate::config::STREAM_BLOCK_SIZE;

const WIDE_BLOCK: usize = 2 * STREAM_BLOCK_SIZE;

const DIAG_A: [usize; 4] = [0, 5, 10, 15];
const DIAG_B: [usize; 4] = [4, 9, 14, 3];
const DIAG_C: [usize; 4] = [8, 13, 2, 7];
const DIAG_D: [usize; 4] = [12, 1, 6, 11];

macro_rules! rotate_left {
    ($v:expr, $r:literal) => {{
        let v = $v;
        _mm256_xor_si256(_mm256_slli_epi32(v, $r), _mm256_srli_epi32(v, 32 - $r))
    }};
}

macro_rules! quarter_round {
    ($a:expr, $b:expr, $c:expr, $d:expr) => {
        $b = _mm256_xor_si256($b, rotate_left!(_mm256_add_epi32($a, $d), 7));
        $c = _mm256_xor_si256($c, rotate_left!(_mm256_add_epi32($b, $a), 9));
        $d = _mm256_xor_si256($d, rotate_left!(_mm256_add_epi32($c, $b), 13));
        $a = _mm256_xor_si256($a, rotate_left!(_mm256_add_epi32($d, $c), 18));
    };
}

macro_rules! swizzle {
    ($b:expr, $c:expr, $d:expr) => {
        let tmp = $b;
        $b = _mm256_shuffle_epi32($d, 0b0011_1001);
        $c = _mm256_shuffle_epi32($c, 0b0100_1110);
        $d = _mm256_shuffle_epi32(tmp, 0b1001_0011);
    };
}

#[inline]
unsafe fn diagonal(lo: &[u32; 16], hi: &[u32; 16], idx: [usize; 4]) -> __m256i {
    unsafe {
        _mm256_set_epi32(
            hi[idx[3]] as i32,
            hi[idx[2]] as i32,
            hi[idx[1]] as i32,
            hi[idx[0]] as i32,
            lo[idx[3]] as i32,
            lo[idx[2]] as i32,
            lo[idx[1]] as i32,
            lo[idx[0]] as i32,
        )
    }
}

#[inline]
unsafe fn store(v: __m256i) -> [u32; 8] {
    let mut out = [0u32; 8];
    unsafe { _mm256_storeu_si256(out.as_mut_ptr().cast::<__m256i>(), v) };
    out
}

#[target_feature(enable = "avx2")]
pub(super) unsafe fn xor_keystream(state: &mut [u32; 16], data: &mut [u8]) {
    unsafe {
        let mut keystream = [0u8; WIDE_BLOCK];
        for chunk in data.chunks_mut(WIDE_BLOCK) {
            let lo = *state;
            super::increment(state);
            let hi = *state;
            super::increment(state);

            let a0 = diagonal(&lo, &hi, DIAG_A);
            let b0 = diagonal(&lo, &hi, DIAG_B);
            let c0 = diagonal(&lo, &hi, DIAG_C);
            let d0 = diagonal(&lo, &hi, DIAG_D);
            let mut a = a0;
            let mut b = b0;
            let mut c = c0;
            let mut d = d0;
            for _ in 0..10 {
                quarter_round!(a, b, c, d);
                swizzle!(b, c, d);
                quarter_round!(a, b, c, d);
                swizzle!(b, c, d);
            }
            a = _mm256_add_epi32(a, a0);
            b = _mm256_add_epi32(b, b0);
            c = _mm256_add_epi32(c, c0);
            d = _mm256_add_epi32(d, d0);

            let (ta, tb, tc, td) = (store(a), store(b), store(c), store(d));
            for lane in 0..2 {
                let o = 4 * lane;
                let words = [
                    ta[o], td[o + 1], tc[o + 2], tb[o + 3], tb[o], ta[o + 1], td[o + 2],
                    tc[o + 3], tc[o], tb[o + 1], ta[o + 2], td[o + 3], td[o], tc[o + 1],
                    tb[o + 2], ta[o + 3],
                ];
                let offset = lane * STREAM_BLOCK_SIZE;
                write_u32v_le(&mut keystream[offset..offset + STREAM_BLOCK_SIZE], &words);
            }
            xor_keystream_mut(chunk, &keystream);
        }
    }
}
