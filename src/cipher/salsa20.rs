//! Salsa20 token channel.
//!
//! Confidentiality only: the registry keeps this channel without an
//! authenticator to stay readable against the existing blob population.
//! Blob layout: `nonce(8) ‖ ciphertext`.

use crate::bernstein::salsa;
use crate::config::{KEY_SIZE, SALSA_CHUNK_SIZE, SALSA_NONCE_SIZE, STREAM_BLOCK_SIZE};
use crate::error::{Error, Result};

const BLOCKS_PER_CHUNK: u32 = (SALSA_CHUNK_SIZE / STREAM_BLOCK_SIZE) as u32;

fn check_key(key: &[u8]) -> Result<&[u8; KEY_SIZE]> {
    key.try_into()
        .map_err(|_| Error::invalid(format!("key must be {KEY_SIZE} bytes, got {}", key.len())))
}

/// Applies the keystream in 16 KiB chunks to keep the working set in L1.
fn apply_chunked(key: &[u8; KEY_SIZE], nonce: &[u8; SALSA_NONCE_SIZE], data: &mut [u8]) {
    for (i, chunk) in data.chunks_mut(SALSA_CHUNK_SIZE).enumerate() {
        salsa::xor_keystream(key, nonce, (i as u32).wrapping_mul(BLOCKS_PER_CHUNK), chunk);
    }
}

pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    if plaintext.is_empty() {
        return Err(Error::invalid("plaintext cannot be empty"));
    }
    let mut nonce = [0u8; SALSA_NONCE_SIZE];
    super::fill_random(&mut nonce);

    let mut out = Vec::with_capacity(SALSA_NONCE_SIZE + plaintext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(plaintext);
    apply_chunked(key, &nonce, &mut out[SALSA_NONCE_SIZE..]);
    Ok(out)
}

pub fn decrypt(key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    if blob.len() <= SALSA_NONCE_SIZE {
        return Err(Error::malformed("salsa20 blob too short"));
    }
    let (nonce, ciphertext) = blob.split_at(SALSA_NONCE_SIZE);
    let nonce: &[u8; SALSA_NONCE_SIZE] = nonce.try_into().expect("split length");
    let mut plaintext = ciphertext.to_vec();
    apply_chunked(key, nonce, &mut plaintext);
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let key = [0x77u8; 32];
        let blob = encrypt(&key, b"no authenticator here").unwrap();
        assert_eq!(decrypt(&key, &blob).unwrap(), b"no authenticator here");
    }

    #[test]
    fn round_trip_across_chunk_boundaries() {
        let key = [0x21u8; 32];
        let plaintext: Vec<u8> = (0..SALSA_CHUNK_SIZE * 2 + 100).map(|i| (i % 256) as u8).collect();
        let blob = encrypt(&key, &plaintext).unwrap();
        assert_eq!(decrypt(&key, &blob).unwrap(), plaintext);
    }

    #[test]
    fn chunking_matches_a_single_pass() {
        let key = [0x42u8; 32];
        let nonce = [0x10u8; 8];
        let len = SALSA_CHUNK_SIZE + 77;
        let mut chunked: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let mut single = chunked.clone();
        apply_chunked(&key, &nonce, &mut chunked);
        salsa::xor_keystream(&key, &nonce, 0, &mut single);
        assert_eq!(chunked, single);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(encrypt(&[0u8; 8], b"x"), Err(Error::InvalidArgument(_))));
        assert!(matches!(encrypt(&[0u8; 32], b""), Err(Error::InvalidArgument(_))));
        assert!(matches!(decrypt(&[0u8; 32], &[0u8; 8]), Err(Error::Malformed(_))));
    }
}
