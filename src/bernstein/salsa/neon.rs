//! NEON kernel for AArch64, one block per iteration in the same diagonal
//! layout as the SSE2 kernel.

use core::arch::aarch64::*;

use crate::bytes::{write_u32v_le, xor_keystream_mut};
use crate::config::STREAM_BLOCK_SIZE;

macro_rules! rotate_left {
    ($v:expr, $r:literal) => {{
        let v = $v;
        vorrq_u32(vshlq_n_u32(v, $r), vshrq_n_u32(v, 32 - $r))
    }};
}

macro_rules! quarter_round {
    ($a:expr, $b:expr, $c:expr, $d:expr) => {
        $b = veorq_u32($b, rotate_left!(vaddq_u32($a, $d), 7));
        $c = veorq_u32($c, rotate_left!(vaddq_u32($b, $a), 9));
        $d = veorq_u32($d, rotate_left!(vaddq_u32($c, $b), 13));
        $a = veorq_u32($a, rotate_left!(vaddq_u32($d, $c), 18));
    };
}

macro_rules! swizzle {
    ($b:expr, $c:expr, $d:expr) => {
        let tmp = $b;
        $b = vextq_u32($d, $d, 1);
        $c = vextq_u32($c, $c, 2);
        $d = vextq_u32(tmp, tmp, 3);
    };
}

#[inline]
unsafe fn diagonal(s: &[u32; 16], idx: [usize; 4]) -> uint32x4_t {
    let lanes = [s[idx[0]], s[idx[1]], s[idx[2]], s[idx[3]]];
    unsafe { vld1q_u32(lanes.as_ptr()) }
}

#[inline]
unsafe fn store(v: uint32x4_t) -> [u32; 4] {
    let mut out = [0u32; 4];
    unsafe { vst1q_u32(out.as_mut_ptr(), v) };
    out
}

#[target_feature(enable = "neon")]
pub(super) unsafe fn xor_keystream(state: &mut [u32; 16], data: &mut [u8]) {
    unsafe {
        let mut block = [0u8; STREAM_BLOCK_SIZE];
        for chunk in data.chunks_mut(STREAM_BLOCK_SIZE) {
            let a0 = diagonal(state, [0, 5, 10, 15]);
            let b0 = diagonal(state, [4, 9, 14, 3]);
            let c0 = diagonal(state, [8, 13, 2, 7]);
            let d0 = diagonal(state, [12, 1, 6, 11]);
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
            a = vaddq_u32(a, a0);
            b = vaddq_u32(b, b0);
            c = vaddq_u32(c, c0);
            d = vaddq_u32(d, d0);

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
