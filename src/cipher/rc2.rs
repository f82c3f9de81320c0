//! RC2 token channel (legacy), in two wire variants.
//!
//! **Standard** uses the caller's 16-byte key directly:
//! `iv(8) ‖ ciphertext_len(4 LE) ‖ ciphertext`.
//!
//! **Enhanced** derives the cipher key with PBKDF2-HMAC-SHA-256 (10 000
//! iterations, salt = IV) and stores a SHA-256 of the plaintext that is
//! verified in constant time before any plaintext is released:
//! `iv(8) ‖ sha256(plaintext)(32) ‖ rc2_cbc(plaintext_len(4 LE) ‖ plaintext)`.
//!
//! Both variants share the `RC2_` container id and are not interoperable;
//! the engine writes enhanced and keeps standard selectable for old blobs.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, InnerIvInit, KeyIvInit};
use pbkdf2::pbkdf2_hmac;
use rc2::Rc2;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::config::{
    BLOCK_IV_SIZE, HASH_SIZE, RC2_EFFECTIVE_KEY_BITS, RC2_KEY_SIZE, RC2_PBKDF2_ITERATIONS,
};
use crate::constant_time::constant_time_eq;
use crate::error::{Error, Result};

type Rc2CbcEnc = cbc::Encryptor<Rc2>;
type Rc2CbcDec = cbc::Decryptor<Rc2>;

/// Which wire variant to speak. Enhanced outranks standard when the engine
/// picks a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
    Standard,
    #[default]
    Enhanced,
}

impl Variant {
    #[must_use]
    pub const fn priority(self) -> u32 {
        match self {
            Self::Enhanced => 200,
            Self::Standard => 100,
        }
    }
}

fn check_key(key: &[u8]) -> Result<()> {
    if key.len() != RC2_KEY_SIZE {
        return Err(Error::invalid(format!(
            "key must be {RC2_KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }
    Ok(())
}

pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with(Variant::default(), key, plaintext)
}

pub fn decrypt(key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    decrypt_with(Variant::default(), key, blob)
}

pub fn encrypt_with(variant: Variant, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    check_key(key)?;
    if plaintext.is_empty() {
        return Err(Error::invalid("plaintext cannot be empty"));
    }
    match variant {
        Variant::Standard => encrypt_standard(key, plaintext),
        Variant::Enhanced => encrypt_enhanced(key, plaintext),
    }
}

pub fn decrypt_with(variant: Variant, key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    check_key(key)?;
    match variant {
        Variant::Standard => decrypt_standard(key, blob),
        Variant::Enhanced => decrypt_enhanced(key, blob),
    }
}

fn encrypt_standard(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; BLOCK_IV_SIZE];
    super::fill_random(&mut iv);

    let ciphertext = Rc2CbcEnc::new_from_slices(key, &iv)
        .map_err(|_| Error::invalid("rc2 key rejected"))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = Vec::with_capacity(BLOCK_IV_SIZE + 4 + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&(ciphertext.len() as u32).to_le_bytes());
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn decrypt_standard(key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < BLOCK_IV_SIZE + 4 {
        return Err(Error::malformed("rc2 blob too short"));
    }
    let (iv, rest) = blob.split_at(BLOCK_IV_SIZE);
    let declared = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as usize;
    let ciphertext = &rest[4..];
    if declared != ciphertext.len() {
        return Err(Error::malformed(format!(
            "rc2 length field {declared} does not match ciphertext {}",
            ciphertext.len()
        )));
    }
    Rc2CbcDec::new_from_slices(key, iv)
        .map_err(|_| Error::invalid("rc2 key rejected"))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::malformed("rc2 padding invalid"))
}

fn encrypt_enhanced(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; BLOCK_IV_SIZE];
    super::fill_random(&mut iv);
    let mut derived = derive_key(key, &iv);

    let mut frame = Vec::with_capacity(4 + plaintext.len());
    frame.extend_from_slice(&(plaintext.len() as u32).to_le_bytes());
    frame.extend_from_slice(plaintext);
    let cipher = Rc2::new_with_eff_key_len(&derived, RC2_EFFECTIVE_KEY_BITS);
    let ciphertext = Rc2CbcEnc::inner_iv_slice_init(cipher, &iv)
        .map_err(|_| Error::invalid("rc2 iv rejected"))?
        .encrypt_padded_vec_mut::<Pkcs7>(&frame);
    frame.zeroize();
    derived.zeroize();

    let digest = Sha256::digest(plaintext);
    let mut out = Vec::with_capacity(BLOCK_IV_SIZE + HASH_SIZE + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&digest);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn decrypt_enhanced(key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < BLOCK_IV_SIZE + HASH_SIZE + 8 {
        return Err(Error::malformed("rc2 enhanced blob too short"));
    }
    let (iv, rest) = blob.split_at(BLOCK_IV_SIZE);
    let (stored_hash, ciphertext) = rest.split_at(HASH_SIZE);

    let mut derived = derive_key(key, iv);
    let cipher = Rc2::new_with_eff_key_len(&derived, RC2_EFFECTIVE_KEY_BITS);
    derived.zeroize();
    let mut frame = Rc2CbcDec::inner_iv_slice_init(cipher, iv)
        .map_err(|_| Error::invalid("rc2 iv rejected"))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::malformed("rc2 padding invalid"))?;

    if frame.len() < 4 {
        frame.zeroize();
        return Err(Error::malformed("rc2 length frame truncated"));
    }
    let declared = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    if declared != frame.len() - 4 {
        frame.zeroize();
        return Err(Error::malformed("rc2 length frame inconsistent"));
    }

    // Verify the integrity hash before releasing any plaintext.
    let digest = Sha256::digest(&frame[4..]);
    if !constant_time_eq(stored_hash, &digest) {
        frame.zeroize();
        return Err(Error::AuthenticationFailure);
    }
    let plaintext = frame[4..].to_vec();
    frame.zeroize();
    Ok(plaintext)
}

fn derive_key(key: &[u8], salt: &[u8]) -> [u8; RC2_KEY_SIZE] {
    let mut derived = [0u8; RC2_KEY_SIZE];
    pbkdf2_hmac::<Sha256>(key, salt, RC2_PBKDF2_ITERATIONS, &mut derived);
    derived
}
