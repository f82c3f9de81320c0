//! SSE2 kernel.
//!
//! The Salsa matrix is held as its four diagonals, so the column round is a
//! single vector quarter round. The swizzle between rounds rotates rows b
//! and d past each other, which turns the row round into the same vector
//! operation; applying the swizzle twice per double round restores the
//! diagonal layout.
//!
//! Diagonal layout (lane 0..3):
//!
//! ```text
//! a = s0  s5  s10 s15
//! b = s4  s9  s14 s3
//! c = s8  s13 s2  s7
//! d = s12 s1  s6  s11
//! ```

#![allow(clippy::cast_ptr_alignment)]

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::bytes::{write_u32v_le, xor_keystream_mut};
use crate::config::STREAM_BLOCK_SIZE;

macro_rules! rotate_left {
    ($v:expr, $r:literal) => {{
        let v = $v;
        _mm_xor_si128(_mm_slli_epi32(v, $r), _mm_srli_epi32(v, 32 - $r))
    }};
}

macro_rules! quarter_round {
    ($a:expr, $b:expr, $c:expr, $d:expr) => {
        $b = _mm_xor_si128($b, rotate_left!(_mm_add_epi32($a, $d), 7));
        $c = _mm_xor_si128($c, rotate_left!(_mm_add_epi32($b, $a), 9));
        $d = _mm_xor_si128($d, rotate_left!(_mm_add_epi32($c, $b), 13));
        $a = _mm_xor_si128($a, rotate_left!(_mm_add_epi32($d, $c), 18));
    };
}

// Rows b and d swap roles between the column and row rounds.
macro_rules! swizzle {
    ($b:expr, $c:expr, $d:expr) => {
        let tmp = $b;
        $b = _mm_shuffle_epi32($d, 0b0011_1001);
        $c = _mm_shuffle_epi32($c, 0b0100_1110);
        $d = _mm_shuffle_epi32(tmp, 0b1001_0011);
    };
}

#[inline]
unsafe fn diagonals(s: &[u32; 16]) -> (__m128i, __m128i, __m128i, __m128i) {
    unsafe {
        (
            _mm_set_epi32(s[15] as i32, s[10] as i32, s[5] as i32, s[0] as i32),
            _mm_set_epi32(s[3] as i32, s[14] as i32, s[9] as i32, s[4] as i32),
            _mm_set_epi32(s[7] as i32, s[2] as i32, s[13] as i32, s[8] as i32),
            _mm_set_epi32(s[11] as i32, s[6] as i32, s[1] as i32, s[12] as i32),
        )
    }
}

#[inline]
unsafe fn store(v: __m128i) -> [u32; 4] {
    let mut out = [0u32; 4];
    unsafe { _mm_storeu_si128(out.as_mut_ptr().cast::<__m128i>(), v) };
    out
}

#[target_feature(enable = "sse2")]
pub(super) unsafe fn xor_keystream(state: &mut [u32; 16], data: &mut [u8]) {
    unsafe {
        let mut block = [0u8; STREAM_BLOCK_SIZE];
        for chunk in data.chunks_mut(STREAM_BLOCK_SIZE) {
            // The counter words s8/s9 live in rows b and c, so the initial
            // diagonals are rebuilt from the scalar state each block.
            let (a0, b0, c0, d0) = diagonals(state);
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
            a = _mm_add_epi32(a, a0);
            b = _mm_add_epi32(b, b0);
            c = _mm_add_epi32(c, c0);
            d = _mm_add_epi32(d, d0);

            let (ta, tb, tc, td) = (store(a), store(b), store(c), store(d));
            let words = [
                ta[0], td[1], tc[2], tb[3], tb[0], ta[1], td[2], tc[3], tc[0], tb[1], ta[2],
                td[3], td[0], tc[1], tb[2], ta[3],
            ];
            write_u32v_le(&mut block, &words);
            xor_keystream_mut(chunk, &block);
            super::increment(state);
        }
    }
}
