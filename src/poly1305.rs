//! The Poly1305 one-time authenticator.
//!
//! A 130-bit accumulator over five 26-bit limbs, with the `r` half of the
//! key clamped as RFC 8439 prescribes (bytes 3, 7, 11, 15 masked with 0x0F,
//! bytes 4, 8, 12 with 0xFC). The message is absorbed in 16-byte blocks;
//! the final short block gets its 0x01 delimiter written inside the same
//! 16-byte window, full blocks carry the delimiter as the implicit 2^128
//! bit. After the last block the `s` half is added mod 2^128 and the tag is
//! the low 16 bytes, little-endian.
//!
//! The key is one-time: the state is zeroed on drop, and the caller is
//! expected never to reuse `(r, s)` across messages.

use zeroize::Zeroize;

use crate::bytes::read_u32_le;
use crate::config::{POLY1305_KEY_SIZE, TAG_SIZE};

const LIMB_MASK: u32 = 0x03FF_FFFF;

pub struct Poly1305 {
    r: [u32; 5],
    h: [u32; 5],
    pad: [u32; 4],
    buffer: [u8; 16],
    leftover: usize,
}

impl Poly1305 {
    #[must_use]
    pub fn new(key: &[u8; POLY1305_KEY_SIZE]) -> Self {
        // Clamp r into 26-bit limbs in one pass.
        let r = [
            read_u32_le(&key[0..4]) & 0x03FF_FFFF,
            (read_u32_le(&key[3..7]) >> 2) & 0x03FF_FF03,
            (read_u32_le(&key[6..10]) >> 4) & 0x03FF_C0FF,
            (read_u32_le(&key[9..13]) >> 6) & 0x03F0_3FFF,
            (read_u32_le(&key[12..16]) >> 8) & 0x000F_FFFF,
        ];
        let pad = [
            read_u32_le(&key[16..20]),
            read_u32_le(&key[20..24]),
            read_u32_le(&key[24..28]),
            read_u32_le(&key[28..32]),
        ];
        Self { r, h: [0u32; 5], pad, buffer: [0u8; 16], leftover: 0 }
    }

    /// One-shot tag computation.
    #[must_use]
    pub fn tag(key: &[u8; POLY1305_KEY_SIZE], message: &[u8]) -> [u8; TAG_SIZE] {
        let mut mac = Self::new(key);
        mac.update(message);
        mac.finalize()
    }

    pub fn update(&mut self, mut data: &[u8]) {
        if self.leftover > 0 {
            let want = (16 - self.leftover).min(data.len());
            self.buffer[self.leftover..self.leftover + want].copy_from_slice(&data[..want]);
            self.leftover += want;
            data = &data[want..];
            if self.leftover < 16 {
                return;
            }
            let block = self.buffer;
            self.block(&block, 1 << 24);
            self.leftover = 0;
        }

        let mut chunks = data.chunks_exact(16);
        for chunk in &mut chunks {
            let block: [u8; 16] = chunk.try_into().expect("exact chunk");
            self.block(&block, 1 << 24);
        }
        let rest = chunks.remainder();
        if !rest.is_empty() {
            self.buffer[..rest.len()].copy_from_slice(rest);
            self.leftover = rest.len();
        }
    }

    #[must_use]
    pub fn finalize(mut self) -> [u8; TAG_SIZE] {
        if self.leftover > 0 {
            // Delimiter bit inside the final 16-byte window, hibit clear.
            let mut block = [0u8; 16];
            block[..self.leftover].copy_from_slice(&self.buffer[..self.leftover]);
            block[self.leftover] = 1;
            self.block(&block, 0);
        }

        let [mut h0, mut h1, mut h2, mut h3, mut h4] = self.h;

        let mut c = h1 >> 26;
        h1 &= LIMB_MASK;
        h2 += c;
        c = h2 >> 26;
        h2 &= LIMB_MASK;
        h3 += c;
        c = h3 >> 26;
        h3 &= LIMB_MASK;
        h4 += c;
        c = h4 >> 26;
        h4 &= LIMB_MASK;
        h0 += c * 5;
        c = h0 >> 26;
        h0 &= LIMB_MASK;
        h1 += c;

        // Compute h + 5 - 2^130 and select it when h >= p.
        let mut g0 = h0.wrapping_add(5);
        c = g0 >> 26;
        g0 &= LIMB_MASK;
        let mut g1 = h1.wrapping_add(c);
        c = g1 >> 26;
        g1 &= LIMB_MASK;
        let mut g2 = h2.wrapping_add(c);
        c = g2 >> 26;
        g2 &= LIMB_MASK;
        let mut g3 = h3.wrapping_add(c);
        c = g3 >> 26;
        g3 &= LIMB_MASK;
        let g4 = h4.wrapping_add(c).wrapping_sub(1 << 26);

        let select = (g4 >> 31).wrapping_sub(1);
        h0 = (h0 & !select) | (g0 & select);
        h1 = (h1 & !select) | (g1 & select);
        h2 = (h2 & !select) | (g2 & select);
        h3 = (h3 & !select) | (g3 & select);
        h4 = (h4 & !select) | (g4 & select);

        // Repack into 32-bit words and add s mod 2^128.
        let packed = [
            h0 | (h1 << 26),
            (h1 >> 6) | (h2 << 20),
            (h2 >> 12) | (h3 << 14),
            (h3 >> 18) | (h4 << 8),
        ];
        let mut tag = [0u8; TAG_SIZE];
        let mut f: u64 = 0;
        for i in 0..4 {
            f = u64::from(packed[i]) + u64::from(self.pad[i]) + (f >> 32);
            tag[4 * i..4 * i + 4].copy_from_slice(&(f as u32).to_le_bytes());
        }
        tag
    }

    fn block(&mut self, block: &[u8; 16], hibit: u32) {
        let [r0, r1, r2, r3, r4] = self.r.map(u64::from);
        let (s1, s2, s3, s4) = (r1 * 5, r2 * 5, r3 * 5, r4 * 5);

        let h0 = u64::from(self.h[0] + (read_u32_le(&block[0..4]) & LIMB_MASK));
        let h1 = u64::from(self.h[1] + ((read_u32_le(&block[3..7]) >> 2) & LIMB_MASK));
        let h2 = u64::from(self.h[2] + ((read_u32_le(&block[6..10]) >> 4) & LIMB_MASK));
        let h3 = u64::from(self.h[3] + ((read_u32_le(&block[9..13]) >> 6) & LIMB_MASK));
        let h4 = u64::from(self.h[4] + ((read_u32_le(&block[12..16]) >> 8) | hibit));

        let d0 = h0 * r0 + h1 * s4 + h2 * s3 + h3 * s2 + h4 * s1;
        let mut d1 = h0 * r1 + h1 * r0 + h2 * s4 + h3 * s3 + h4 * s2;
        let mut d2 = h0 * r2 + h1 * r1 + h2 * r0 + h3 * s4 + h4 * s3;
        let mut d3 = h0 * r3 + h1 * r2 + h2 * r1 + h3 * r0 + h4 * s4;
        let mut d4 = h0 * r4 + h1 * r3 + h2 * r2 + h3 * r1 + h4 * r0;

        let mut c = d0 >> 26;
        self.h[0] = (d0 as u32) & LIMB_MASK;
        d1 += c;
        c = d1 >> 26;
        self.h[1] = (d1 as u32) & LIMB_MASK;
        d2 += c;
        c = d2 >> 26;
        self.h[2] = (d2 as u32) & LIMB_MASK;
        d3 += c;
        c = d3 >> 26;
        self.h[3] = (d3 as u32) & LIMB_MASK;
        d4 += c;
        c = d4 >> 26;
        self.h[4] = (d4 as u32) & LIMB_MASK;
        self.h[0] += (c as u32) * 5;
        let carry = self.h[0] >> 26;
        self.h[0] &= LIMB_MASK;
        self.h[1] += carry;
    }
}

impl Drop for Poly1305 {
    fn drop(&mut self) {
        self.r.zeroize();
        self.h.zeroize();
        self.pad.zeroize();
        self.buffer.zeroize();
    }
}
