//! Threefish-512 token channel.
//!
//! The block function is the Skein 1.3 Threefish-512: eight 64-bit words,
//! 72 rounds of MIX and word permutation, a subkey injected every four
//! rounds. The key schedule extends the key with the XOR of all key words
//! and the parity constant; the tweak is fixed at zero for this channel.
//!
//! Blocks are chained CBC-style. The plaintext is framed with its length
//! and zero-padded to a block multiple, so padding strips exactly on
//! decrypt. Blob layout: `iv(64) ‖ ciphertext`.

use zeroize::Zeroize;

use crate::bytes::{read_u64_le, write_u64_le};
use crate::config::{THREEFISH_BLOCK_SIZE, THREEFISH_KEY_SIZE};
use crate::error::{Error, Result};

const WORDS: usize = 8;
const ROUNDS: usize = 72;
const SUBKEYS: usize = ROUNDS / 4 + 1;

/// Key schedule parity constant (Skein 1.3).
const PARITY: u64 = 0x1BD1_1BDA_A9FC_1A22;

/// Per-round rotation amounts, indexed by round mod 8.
const ROTATION: [[u32; 4]; 8] = [
    [46, 36, 19, 37],
    [33, 27, 14, 42],
    [17, 49, 36, 39],
    [44, 9, 54, 56],
    [39, 30, 34, 24],
    [13, 50, 10, 17],
    [25, 29, 39, 43],
    [8, 35, 56, 22],
];

/// Word permutation applied after each round.
const PERMUTE: [usize; 8] = [2, 1, 4, 7, 6, 5, 0, 3];

struct Threefish512 {
    subkeys: [[u64; WORDS]; SUBKEYS],
}

impl Threefish512 {
    fn new(key: &[u8; THREEFISH_KEY_SIZE], tweak: [u64; 2]) -> Self {
        let mut k = [0u64; WORDS + 1];
        for (i, word) in k[..WORDS].iter_mut().enumerate() {
            *word = read_u64_le(&key[8 * i..8 * i + 8]);
        }
        k[WORDS] = k[..WORDS].iter().fold(PARITY, |acc, w| acc ^ w);
        let t = [tweak[0], tweak[1], tweak[0] ^ tweak[1]];

        let mut subkeys = [[0u64; WORDS]; SUBKEYS];
        for (s, subkey) in subkeys.iter_mut().enumerate() {
            for (i, word) in subkey.iter_mut().enumerate() {
                *word = k[(s + i) % (WORDS + 1)];
            }
            subkey[5] = subkey[5].wrapping_add(t[s % 3]);
            subkey[6] = subkey[6].wrapping_add(t[(s + 1) % 3]);
            subkey[7] = subkey[7].wrapping_add(s as u64);
        }
        k.zeroize();
        Self { subkeys }
    }

    fn encrypt_block(&self, block: &mut [u64; WORDS]) {
        for round in 0..ROUNDS {
            if round % 4 == 0 {
                for (word, sk) in block.iter_mut().zip(&self.subkeys[round / 4]) {
                    *word = word.wrapping_add(*sk);
                }
            }
            let rotation = &ROTATION[round % 8];
            for pair in 0..4 {
                let x0 = block[2 * pair];
                let x1 = block[2 * pair + 1];
                let y0 = x0.wrapping_add(x1);
                block[2 * pair] = y0;
                block[2 * pair + 1] = x1.rotate_left(rotation[pair]) ^ y0;
            }
            let old = *block;
            for (i, word) in block.iter_mut().enumerate() {
                *word = old[PERMUTE[i]];
            }
        }
        for (word, sk) in block.iter_mut().zip(&self.subkeys[SUBKEYS - 1]) {
            *word = word.wrapping_add(*sk);
        }
    }

    fn decrypt_block(&self, block: &mut [u64; WORDS]) {
        for (word, sk) in block.iter_mut().zip(&self.subkeys[SUBKEYS - 1]) {
            *word = word.wrapping_sub(*sk);
        }
        for round in (0..ROUNDS).rev() {
            let old = *block;
            for (i, &p) in PERMUTE.iter().enumerate() {
                block[p] = old[i];
            }
            let rotation = &ROTATION[round % 8];
            for pair in 0..4 {
                let y0 = block[2 * pair];
                let y1 = block[2 * pair + 1];
                let x1 = (y1 ^ y0).rotate_right(rotation[pair]);
                block[2 * pair] = y0.wrapping_sub(x1);
                block[2 * pair + 1] = x1;
            }
            if round % 4 == 0 {
                for (word, sk) in block.iter_mut().zip(&self.subkeys[round / 4]) {
                    *word = word.wrapping_sub(*sk);
                }
            }
        }
    }
}

impl Drop for Threefish512 {
    fn drop(&mut self) {
        for subkey in &mut self.subkeys {
            subkey.zeroize();
        }
    }
}

fn check_key(key: &[u8]) -> Result<&[u8; THREEFISH_KEY_SIZE]> {
    key.try_into().map_err(|_| {
        Error::invalid(format!("key must be {THREEFISH_KEY_SIZE} bytes, got {}", key.len()))
    })
}

fn load_block(bytes: &[u8]) -> [u64; WORDS] {
    core::array::from_fn(|i| read_u64_le(&bytes[8 * i..8 * i + 8]))
}

fn store_block(words: &[u64; WORDS], out: &mut [u8]) {
    for (i, word) in words.iter().enumerate() {
        write_u64_le(&mut out[8 * i..8 * i + 8], *word);
    }
}

pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    if plaintext.is_empty() {
        return Err(Error::invalid("plaintext cannot be empty"));
    }
    let cipher = Threefish512::new(key, [0, 0]);

    // Length framing inside the ciphertext makes the zero padding strippable.
    let framed_len = (8 + plaintext.len()).div_ceil(THREEFISH_BLOCK_SIZE) * THREEFISH_BLOCK_SIZE;
    let mut frame = vec![0u8; framed_len];
    write_u64_le(&mut frame[..8], plaintext.len() as u64);
    frame[8..8 + plaintext.len()].copy_from_slice(plaintext);

    let mut out = vec![0u8; THREEFISH_BLOCK_SIZE + framed_len];
    super::fill_random(&mut out[..THREEFISH_BLOCK_SIZE]);

    let mut chain = load_block(&out[..THREEFISH_BLOCK_SIZE]);
    for (i, block_bytes) in frame.chunks(THREEFISH_BLOCK_SIZE).enumerate() {
        let mut block = load_block(block_bytes);
        for (word, prev) in block.iter_mut().zip(&chain) {
            *word ^= prev;
        }
        cipher.encrypt_block(&mut block);
        chain = block;
        let offset = THREEFISH_BLOCK_SIZE * (i + 1);
        store_block(&block, &mut out[offset..offset + THREEFISH_BLOCK_SIZE]);
    }
    frame.zeroize();
    Ok(out)
}

pub fn decrypt(key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    if blob.len() < 2 * THREEFISH_BLOCK_SIZE
        || !(blob.len() - THREEFISH_BLOCK_SIZE).is_multiple_of(THREEFISH_BLOCK_SIZE)
    {
        return Err(Error::malformed("threefish blob is not a block multiple"));
    }
    let cipher = Threefish512::new(key, [0, 0]);

    let mut frame = vec![0u8; blob.len() - THREEFISH_BLOCK_SIZE];
    let mut chain = load_block(&blob[..THREEFISH_BLOCK_SIZE]);
    for (i, block_bytes) in blob[THREEFISH_BLOCK_SIZE..].chunks(THREEFISH_BLOCK_SIZE).enumerate() {
        let encrypted = load_block(block_bytes);
        let mut block = encrypted;
        cipher.decrypt_block(&mut block);
        for (word, prev) in block.iter_mut().zip(&chain) {
            *word ^= prev;
        }
        chain = encrypted;
        store_block(&block, &mut frame[THREEFISH_BLOCK_SIZE * i..THREEFISH_BLOCK_SIZE * (i + 1)]);
    }

    let declared = read_u64_le(&frame[..8]) as usize;
    if declared > frame.len() - 8 {
        frame.zeroize();
        return Err(Error::malformed("threefish length frame inconsistent"));
    }
    let plaintext = frame[8..8 + declared].to_vec();
    frame.zeroize();
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_function_is_invertible() {
        let key: [u8; 64] = core::array::from_fn(|i| (i * 11 + 5) as u8);
        let cipher = Threefish512::new(&key, [0, 0]);
        let original: [u64; 8] = core::array::from_fn(|i| (i as u64) * 0x0123_4567_89AB_CDEF);
        let mut block = original;
        cipher.encrypt_block(&mut block);
        assert_ne!(block, original);
        cipher.decrypt_block(&mut block);
        assert_eq!(block, original);
    }

    #[test]
    fn tweak_changes_the_permutation() {
        let key = [0u8; 64];
        let plain = [0u64; 8];
        let mut a = plain;
        let mut b = plain;
        Threefish512::new(&key, [0, 0]).encrypt_block(&mut a);
        Threefish512::new(&key, [1, 0]).encrypt_block(&mut b);
        assert_ne!(a, b);
    }

    #[test]
    fn round_trip_various_lengths() {
        let key: [u8; 64] = core::array::from_fn(|i| (255 - i) as u8);
        for len in [1usize, 55, 56, 57, 64, 120, 128, 4096] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();
            let blob = encrypt(&key, &plaintext).unwrap();
            assert_eq!(blob.len() % 64, 0);
            assert_eq!(decrypt(&key, &blob).unwrap(), plaintext, "len {len}");
        }
    }

    #[test]
    fn ciphertext_depends_on_the_iv() {
        let key = [7u8; 64];
        let a = encrypt(&key, b"determinism check").unwrap();
        let b = encrypt(&key, b"determinism check").unwrap();
        assert_ne!(a[64..], b[64..]);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(encrypt(&[0u8; 32], b"x"), Err(Error::InvalidArgument(_))));
        assert!(matches!(encrypt(&[0u8; 64], b""), Err(Error::InvalidArgument(_))));
        assert!(matches!(decrypt(&[0u8; 64], &[0u8; 100]), Err(Error::Malformed(_))));
        // A wrong key produces an inconsistent length frame, not a panic.
        let blob = encrypt(&[1u8; 64], b"some plaintext").unwrap();
        let result = decrypt(&[2u8; 64], &blob);
        if let Ok(garbage) = result {
            assert_ne!(garbage, b"some plaintext");
        }
    }
}
