//! SSE2 kernel: one 64-byte block per iteration, state rows in four
//! 128-bit lanes. The diagonal step is a lane rotation of rows b, c, d.

#![allow(clippy::cast_ptr_alignment)]

#[cfg(target_arch = "x86")]
use core::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::bytes::xor_keystream_mut;
use crate::config::STREAM_BLOCK_SIZE;

macro_rules! add_rotate_xor {
    ($a:expr, $b:expr, $c:expr, $r:literal) => {
        $a = _mm_add_epi32($a, $b);
        $c = _mm_xor_si128($c, $a);
        $c = _mm_xor_si128(_mm_slli_epi32($c, $r), _mm_srli_epi32($c, 32 - $r));
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
        $b = _mm_shuffle_epi32($b, 0b0011_1001); // lanes <<< 1
        $c = _mm_shuffle_epi32($c, 0b0100_1110); // lanes <<< 2
        $d = _mm_shuffle_epi32($d, 0b1001_0011); // lanes <<< 3
    };
}

#[target_feature(enable = "sse2")]
pub(super) unsafe fn xor_keystream(state: &mut [u32; 16], data: &mut [u8]) {
    unsafe {
        let a0 = _mm_loadu_si128(state.as_ptr().cast::<__m128i>());
        let b0 = _mm_loadu_si128(state.as_ptr().add(4).cast::<__m128i>());
        let c0 = _mm_loadu_si128(state.as_ptr().add(8).cast::<__m128i>());
        let mut d0 = _mm_loadu_si128(state.as_ptr().add(12).cast::<__m128i>());
        // Words 12 and 13 form a little-endian u64, so a 64-bit add gives
        // the same counter carry as the scalar kernel.
        let one = _mm_set_epi64x(0, 1);

        for chunk in data.chunks_mut(STREAM_BLOCK_SIZE) {
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
            a = _mm_add_epi32(a, a0);
            b = _mm_add_epi32(b, b0);
            c = _mm_add_epi32(c, c0);
            d = _mm_add_epi32(d, d0);

            if chunk.len() == STREAM_BLOCK_SIZE {
                let p = chunk.as_mut_ptr().cast::<__m128i>();
                _mm_storeu_si128(p, _mm_xor_si128(_mm_loadu_si128(p), a));
                _mm_storeu_si128(p.add(1), _mm_xor_si128(_mm_loadu_si128(p.add(1)), b));
                _mm_storeu_si128(p.add(2), _mm_xor_si128(_mm_loadu_si128(p.add(2)), c));
                _mm_storeu_si128(p.add(3), _mm_xor_si128(_mm_loadu_si128(p.add(3)), d));
            } else {
                let mut block = [0u8; STREAM_BLOCK_SIZE];
                let bp = block.as_mut_ptr().cast::<__m128i>();
                _mm_storeu_si128(bp, a);
                _mm_storeu_si128(bp.add(1), b);
                _mm_storeu_si128(bp.add(2), c);
                _mm_storeu_si128(bp.add(3), d);
                xor_keystream_mut(chunk, &block);
            }

            d0 = _mm_add_epi64(d0, one);
        }
    }
}
