//! NEON kernel for AArch64: one 64-byte block per iteration, rows in four
//! `uint32x4_t` registers, lane rotations via `vextq_u32`.

use core::arch::aarch64::*;

use crate::bytes::xor_keystream_mut;
use crate::config::STREAM_BLOCK_SIZE;

macro_rules! rotate_left {
    ($v:expr, $r:literal) => {
        vorrq_u32(vshlq_n_u32($v, $r), vshrq_n_u32($v, 32 - $r))
    };
}

macro_rules! add_rotate_xor {
    ($a:expr, $b:expr, $c:expr, $r:literal) => {
        $a = vaddq_u32($a, $b);
        $c = veorq_u32($c, $a);
        $c = rotate_left!($c, $r);
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

// vextq_u32(v, v, n) rotates lanes left by n elements.
macro_rules! swizzle {
    ($b:expr, $c:expr, $d:expr) => {
        $b = vextq_u32($b, $b, 1);
        $c = vextq_u32($c, $c, 2);
        $d = vextq_u32($d, $d, 3);
    };
}

#[target_feature(enable = "neon")]
pub(super) unsafe fn xor_keystream(state: &mut [u32; 16], data: &mut [u8]) {
    unsafe {
        let a0 = vld1q_u32(state.as_ptr());
        let b0 = vld1q_u32(state.as_ptr().add(4));
        let c0 = vld1q_u32(state.as_ptr().add(8));
        let mut d0 = vld1q_u32(state.as_ptr().add(12));
        // 64-bit add over words 12/13 reproduces the scalar counter carry.
        let one = vcombine_u64(vcreate_u64(1), vcreate_u64(0));

        let mut block = [0u8; STREAM_BLOCK_SIZE];
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
            a = vaddq_u32(a, a0);
            b = vaddq_u32(b, b0);
            c = vaddq_u32(c, c0);
            d = vaddq_u32(d, d0);

            vst1q_u8(block.as_mut_ptr(), vreinterpretq_u8_u32(a));
            vst1q_u8(block.as_mut_ptr().add(16), vreinterpretq_u8_u32(b));
            vst1q_u8(block.as_mut_ptr().add(32), vreinterpretq_u8_u32(c));
            vst1q_u8(block.as_mut_ptr().add(48), vreinterpretq_u8_u32(d));
            xor_keystream_mut(chunk, &block);

            d0 = vreinterpretq_u32_u64(vaddq_u64(vreinterpretq_u64_u32(d0), one));
        }
    }
}
