//! Portable reference kernel.

use crate::bytes::{write_u32v_le, xor_keystream_mut};
use crate::config::STREAM_BLOCK_SIZE;

macro_rules! quarter_round {
    ($a:ident, $b:ident, $c:ident, $d:ident) => {
        $b ^= $a.wrapping_add($d).rotate_left(7);
        $c ^= $b.wrapping_add($a).rotate_left(9);
        $d ^= $c.wrapping_add($b).rotate_left(13);
        $a ^= $d.wrapping_add($c).rotate_left(18);
    };
}

/// Runs 20 rounds (10 column/row double rounds) in place, without the final
/// state addition.
pub(super) fn rounds(state: &mut [u32; 16]) {
    let [mut x0, mut x1, mut x2, mut x3, mut x4, mut x5, mut x6, mut x7, mut x8, mut x9, mut x10, mut x11, mut x12, mut x13, mut x14, mut x15] =
        *state;

    for _ in 0..10 {
        quarter_round!(x0, x4, x8, x12);
        quarter_round!(x5, x9, x13, x1);
        quarter_round!(x10, x14, x2, x6);
        quarter_round!(x15, x3, x7, x11);

        quarter_round!(x0, x1, x2, x3);
        quarter_round!(x5, x6, x7, x4);
        quarter_round!(x10, x11, x8, x9);
        quarter_round!(x15, x12, x13, x14);
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
