//! Portable reference kernel.
//!
//! This implementation defines the cipher; the SIMD kernels must match it
//! bit for bit.

use crate::bytes::{write_u32v_le, xor_keystream_mut};
use crate::config::STREAM_BLOCK_SIZE;

macro_rules! quarter_round {
    ($a:ident, $b:ident, $c:ident, $d:ident) => {
        $a = $a.wrapping_add($b);
        $d = ($d ^ $a).rotate_left(16);
        $c = $c.wrapping_add($d);
        $b = ($b ^ $c).rotate_left(12);
        $a = $a.wrapping_add($b);
        $d = ($d ^ $a).rotate_left(8);
        $c = $c.wrapping_add($d);
        $b = ($b ^ $c).rotate_left(7);
    };
}

/// Runs 20 rounds (10 column/diagonal double rounds) in place, without the
/// final state addition.
pub(super) fn rounds(state: &mut [u32; 16]) {
    let [mut x0, mut x1, mut x2, mut x3, mut x4, mut x5, mut x6, mut x7, mut x8, mut x9, mut x10, mut x11, mut x12, mut x13, mut x14, mut x15] =
        *state;

    for _ in 0..10 {
        quarter_round!(x0, x4, x8, x12);
        quarter_round!(x1, x5, x9, x13);
        quarter_round!(x2, x6, x10, x14);
        quarter_round!(x3, x7, x11, x15);

        quarter_round!(x0, x5, x10, x15);
        quarter_round!(x1, x6, x11, x12);
        quarter_round!(x2, x7, x8, x13);
        quarter_round!(x3, x4, x9, x14);
    }

    *state = [
        x0, x1, x2, x3, x4, x5, x6, x7, x8, x9, x10, x11, x12, x13, x14, x15,
    ];
}

pub(super) fn xor_keystream(state: &mut [u32; 16], data: &mut [u8]) {
    let mut block = [0u8; STREAM_BLOCK_SIZE];
    for chunk in data.chunks_mut(STREAM_BLOCK_SIZE) {
        let mut working = *state;
        rounds(&mut working);
        for (w, s) in working.iter_mut().zip(state.iter()) {
            *w = w.wrapping_add(*s);
        }
        write_u32v_le(&mut block, &working);
        xor_keystream_mut(chunk, &block);
        super::increment(state);
    }
}
