//! AES token channels.
//!
//! The `AESG` channel gzips the plaintext and seals it with AES-256-GCM
//! when the CPU has AES instructions. Hosts without them fall back to
//! AES-256-CBC with an HMAC-SHA-256 tag truncated to 16 bytes. The two
//! constructions share the `nonce(12) ‖ ciphertext ‖ tag(16)` layout but
//! are not interoperable, and the container carries no flag telling them
//! apart; a blob only opens on a host that picks the same path. The
//! fallback is reported through [`hardware_accelerated`] and a warning log.
//!
//! The `AES_` channel is the legacy CBC+HMAC construction without the gzip
//! framing, kept for blobs written before the GCM channel existed.

use std::io::{Read, Write};
use std::sync::Once;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use hmac::{Hmac, Mac as _};
use sha2::Sha256;
use tracing::warn;

use crate::config::{CHACHA_NONCE_SIZE as NONCE_SIZE, KEY_SIZE, TAG_SIZE};
use crate::constant_time::constant_time_eq;
use crate::error::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
cpufeatures::new!(cpuid_aes, "aes");

/// Whether this host takes the real AES-GCM path.
#[must_use]
pub fn hardware_accelerated() -> bool {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        cpuid_aes::init().get()
    }
    #[cfg(target_arch = "aarch64")]
    {
        std::arch::is_aarch64_feature_detected!("aes")
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    {
        false
    }
}

fn warn_fallback() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        warn!("no AES instructions on this host; using the CBC+HMAC fallback (not AES-GCM interoperable)");
    });
}

fn check_key(key: &[u8]) -> Result<&[u8; KEY_SIZE]> {
    key.try_into()
        .map_err(|_| Error::invalid(format!("key must be {KEY_SIZE} bytes, got {}", key.len())))
}

pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    if plaintext.is_empty() {
        return Err(Error::invalid("plaintext cannot be empty"));
    }
    let compressed = gzip(plaintext)?;
    if hardware_accelerated() {
        seal_gcm(key, &compressed)
    } else {
        warn_fallback();
        seal_cbc_hmac(key, &compressed)
    }
}

pub fn decrypt(key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    let compressed = if hardware_accelerated() {
        open_gcm(key, blob)?
    } else {
        warn_fallback();
        open_cbc_hmac(key, blob)?
    };
    gunzip(&compressed)
}

/// Legacy `AES_` channel: CBC+HMAC, no compression framing.
pub fn encrypt_legacy(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    if plaintext.is_empty() {
        return Err(Error::invalid("plaintext cannot be empty"));
    }
    seal_cbc_hmac(key, plaintext)
}

pub fn decrypt_legacy(key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    let key = check_key(key)?;
    open_cbc_hmac(key, blob)
}

fn seal_gcm(key: &[u8; KEY_SIZE], data: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| Error::invalid("aes-gcm key rejected"))?;
    let mut nonce = [0u8; NONCE_SIZE];
    super::fill_random(&mut nonce);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), data)
        .map_err(|_| Error::invalid("aes-gcm encryption failed"))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn open_gcm(key: &[u8; KEY_SIZE], blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::malformed("aes-gcm blob too short"));
    }
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| Error::invalid("aes-gcm key rejected"))?;
    let (nonce, ciphertext) = blob.split_at(NONCE_SIZE);
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::AuthenticationFailure)
}

fn seal_cbc_hmac(key: &[u8; KEY_SIZE], data: &[u8]) -> Result<Vec<u8>> {
    let mut nonce = [0u8; NONCE_SIZE];
    super::fill_random(&mut nonce);

    // The CBC IV is the nonce zero-padded to the block size.
    let mut iv = [0u8; 16];
    iv[..NONCE_SIZE].copy_from_slice(&nonce);
    let ciphertext = Aes256CbcEnc::new_from_slices(key, &iv)
        .map_err(|_| Error::invalid("aes-cbc key rejected"))?
        .encrypt_padded_vec_mut::<Pkcs7>(data);

    let tag = cbc_hmac_tag(key, &nonce, &ciphertext)?;
    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len() + TAG_SIZE);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    out.extend_from_slice(&tag);
    Ok(out)
}

fn open_cbc_hmac(key: &[u8; KEY_SIZE], blob: &[u8]) -> Result<Vec<u8>> {
    if blob.len() < NONCE_SIZE + TAG_SIZE {
        return Err(Error::malformed("aes-cbc blob too short"));
    }
    let (nonce, rest) = blob.split_at(NONCE_SIZE);
    let (ciphertext, tag) = rest.split_at(rest.len() - TAG_SIZE);

    // Verify before touching the ciphertext.
    let expected = cbc_hmac_tag(key, nonce, ciphertext)?;
    if !constant_time_eq(tag, &expected) {
        return Err(Error::AuthenticationFailure);
    }

    let mut iv = [0u8; 16];
    iv[..NONCE_SIZE].copy_from_slice(nonce);
    Aes256CbcDec::new_from_slices(key, &iv)
        .map_err(|_| Error::invalid("aes-cbc key rejected"))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::malformed("aes-cbc padding invalid"))
}

fn cbc_hmac_tag(key: &[u8; KEY_SIZE], nonce: &[u8], ciphertext: &[u8]) -> Result<[u8; TAG_SIZE]> {
    let mut mac = <HmacSha256 as hmac::Mac>::new_from_slice(key)
        .map_err(|_| Error::invalid("hmac key rejected"))?;
    mac.update(nonce);
    mac.update(ciphertext);
    let digest = mac.finalize().into_bytes();
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&digest[..TAG_SIZE]);
    Ok(tag)
}

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|()| encoder.finish())
        .map_err(|e| Error::malformed(format!("gzip failed: {e}")))
}

fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::malformed(format!("gunzip failed: {e}")))?;
    Ok(out)
}
