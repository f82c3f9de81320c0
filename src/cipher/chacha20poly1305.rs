//! ChaCha20-Poly1305 and XChaCha20-Poly1305 token channels.
//!
//! The one-time Poly1305 key is the first 32 bytes of the keystream block
//! at counter 0; the payload is encrypted starting at counter 1. The tag
//! authenticates the ciphertext bytes alone. This is the construction the
//! existing blob population was written with, so it is kept as the wire
//! contract; it is not the RFC 8439 AAD/length-padded construction.
//!
//! Blob layouts:
//!
//! ```text
//! CC20: nonce(12) ‖ ciphertext ‖ tag(16)
//! XCCH: nonce(24) ‖ ciphertext ‖ tag(16)
//! ```

use zeroize::Zeroize;

use crate::bernstein::chacha;
use crate::config::{CHACHA_NONCE_SIZE, KEY_SIZE, POLY1305_KEY_SIZE, TAG_SIZE, XCHACHA_NONCE_SIZE};
use crate::constant_time::constant_time_eq;
use crate::error::{Error, Result};
use crate::poly1305::Poly1305;

fn check_key(key: &[u8]) -> Result<&[u8; KEY_SIZE]> {
    key.try_into()
        .map_err(|_| Error::invalid(format!("key must be {KEY_SIZE} bytes, got {}", key.len())))
}

fn one_time_key(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; CHACHA_NONCE_SIZE],
) -> [u8; POLY1305_KEY_SIZE] {
    let mut block = [0u8; 64];
    chacha::xor_keystream(key, nonce, 0, &mut block);
    let mut poly_key = [0u8; POLY1305_KEY_SIZE];
    poly_key.copy_from_slice(&block[..POLY1305_KEY_SIZE]);
    block.zeroize();
    poly_key
}

fn seal(
    key: &[u8; KEY_SIZE],
    nonce: &[u8],
    short_nonce: &[u8; CHACHA_NONCE_SIZE],
    plaintext: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(nonce.len() + plaintext.len() + TAG_SIZE);
    out.extend_from_slice(nonce);
    out.extend_from_slice(plaintext);
    chacha::xor_keystream(key, short_nonce, 1, &mut out[nonce.len()..]);

    let mut poly_key = one_time_key(key, short_nonce);
    let tag = Poly1305::tag(&poly_key, &out[nonce.len()..]);
    poly_key.zeroize();
    out.extend_from_slice(&tag);
    out
}

fn open(
    key: &[u8; KEY_SIZE],
    short_nonce: &[u8; CHACHA_NONCE_SIZE],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>> {
    let mut poly_key = one_time_key(key, short_nonce);
    let expected = Poly1305::tag(&poly_key, ciphertext);
    poly_key.zeroize();
    if !constant_time_eq(tag, &expected) {
        return Err(Error::AuthenticationFailure);
    }

    let mut plaintext = ciphertext.to_vec();
    chacha::xor_keystream(key, short_nonce, 1, &mut plaintext);
    Ok(plaintext)
}

pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    if plaintext.is_empty() {
        return Err(Error::invalid("plaintext cannot be empty"));
    }
    let mut nonce = [0u8; CHACHA_NONCE_SIZE];
    super::fill_random(&mut nonce);
    Ok(seal(key, &nonce, &nonce, plaintext))
}

pub fn decrypt(key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    if blob.len() < CHACHA_NONCE_SIZE + TAG_SIZE {
        return Err(Error::malformed("chacha20-poly1305 blob too short"));
    }
    let (nonce, rest) = blob.split_at(CHACHA_NONCE_SIZE);
    let (ciphertext, tag) = rest.split_at(rest.len() - TAG_SIZE);
    let nonce: &[u8; CHACHA_NONCE_SIZE] = nonce.try_into().expect("split length");
    open(key, nonce, ciphertext, tag)
}

pub fn encrypt_xchacha(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    if plaintext.is_empty() {
        return Err(Error::invalid("plaintext cannot be empty"));
    }
    let mut nonce = [0u8; XCHACHA_NONCE_SIZE];
    super::fill_random(&mut nonce);

    let (mut subkey, short_nonce) = derive_xchacha(key, &nonce);
    let out = seal(&subkey, &nonce, &short_nonce, plaintext);
    subkey.zeroize();
    Ok(out)
}

pub fn decrypt_xchacha(key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    if blob.len() < XCHACHA_NONCE_SIZE + TAG_SIZE {
        return Err(Error::malformed("xchacha20-poly1305 blob too short"));
    }
    let (nonce, rest) = blob.split_at(XCHACHA_NONCE_SIZE);
    let (ciphertext, tag) = rest.split_at(rest.len() - TAG_SIZE);
    let nonce: &[u8; XCHACHA_NONCE_SIZE] = nonce.try_into().expect("split length");

    let (mut subkey, short_nonce) = derive_xchacha(key, nonce);
    let result = open(&subkey, &short_nonce, ciphertext, tag);
    subkey.zeroize();
    result
}

/// HChaCha20 subkey plus the 4-zero-prefixed short nonce.
fn derive_xchacha(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; XCHACHA_NONCE_SIZE],
) -> ([u8; KEY_SIZE], [u8; CHACHA_NONCE_SIZE]) {
    let subkey = chacha::hchacha20(key, nonce[..16].try_into().expect("16-byte prefix"));
    let mut short_nonce = [0u8; CHACHA_NONCE_SIZE];
    short_nonce[4..].copy_from_slice(&nonce[16..]);
    (subkey, short_nonce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let key = [0x4Du8; 32];
        let blob = encrypt(&key, b"attack at dawn").unwrap();
        assert_eq!(decrypt(&key, &blob).unwrap(), b"attack at dawn");
    }

    #[test]
    fn xchacha_round_trip() {
        let key = [0x4Du8; 32];
        let blob = encrypt_xchacha(&key, b"attack at dawn").unwrap();
        assert_eq!(decrypt_xchacha(&key, &blob).unwrap(), b"attack at dawn");
    }

    #[test]
    fn blob_layout() {
        let key = [1u8; 32];
        let blob = encrypt(&key, &[0u8; 40]).unwrap();
        assert_eq!(blob.len(), 12 + 40 + 16);
        let blob = encrypt_xchacha(&key, &[0u8; 40]).unwrap();
        assert_eq!(blob.len(), 24 + 40 + 16);
    }

    #[test]
    fn any_flipped_bit_fails_authentication() {
        let key = [9u8; 32];
        let blob = encrypt(&key, b"integrity matters").unwrap();
        for i in 12..blob.len() {
            let mut tampered = blob.clone();
            tampered[i] ^= 0x01;
            assert!(matches!(
                decrypt(&key, &tampered),
                Err(Error::AuthenticationFailure)
            ));
        }
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let blob = encrypt(&[1u8; 32], b"secret").unwrap();
        assert!(matches!(
            decrypt(&[2u8; 32], &blob),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn rejects_bad_key_length_and_empty_input() {
        assert!(matches!(encrypt(&[0u8; 16], b"x"), Err(Error::InvalidArgument(_))));
        assert!(matches!(encrypt(&[0u8; 32], b""), Err(Error::InvalidArgument(_))));
        assert!(matches!(decrypt(&[0u8; 32], &[0u8; 5]), Err(Error::Malformed(_))));
    }

    #[test]
    fn nonces_are_fresh() {
        let key = [3u8; 32];
        let a = encrypt(&key, b"same plaintext").unwrap();
        let b = encrypt(&key, b"same plaintext").unwrap();
        assert_ne!(a, b);
    }
}
