//! Triple-DES token channel (legacy).
//!
//! EDE with a 24-byte key, CBC mode, PKCS#7 padding. Blob layout:
//! `iv(8) ‖ ciphertext`. Kept only so old tokens stay readable.

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use des::TdesEde3;

use crate::config::{BLOCK_IV_SIZE, TDES_KEY_SIZE};
use crate::error::{Error, Result};

type TdesCbcEnc = cbc::Encryptor<TdesEde3>;
type TdesCbcDec = cbc::Decryptor<TdesEde3>;

pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    if key.len() != TDES_KEY_SIZE {
        return Err(Error::invalid(format!(
            "key must be {TDES_KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }
    if plaintext.is_empty() {
        return Err(Error::invalid("plaintext cannot be empty"));
    }
    let mut iv = [0u8; BLOCK_IV_SIZE];
    super::fill_random(&mut iv);

    let ciphertext = TdesCbcEnc::new_from_slices(key, &iv)
        .map_err(|_| Error::invalid("3des key rejected"))?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut out = Vec::with_capacity(BLOCK_IV_SIZE + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

pub fn decrypt(key: &[u8], blob: &[u8]) -> Result<Vec<u8>> {
    if key.len() != TDES_KEY_SIZE {
        return Err(Error::invalid(format!(
            "key must be {TDES_KEY_SIZE} bytes, got {}",
            key.len()
        )));
    }
    if blob.len() <= BLOCK_IV_SIZE || !(blob.len() - BLOCK_IV_SIZE).is_multiple_of(8) {
        return Err(Error::malformed("3des blob is not a block multiple"));
    }
    let (iv, ciphertext) = blob.split_at(BLOCK_IV_SIZE);
    TdesCbcDec::new_from_slices(key, iv)
        .map_err(|_| Error::invalid("3des key rejected"))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::malformed("3des padding invalid"))
}
