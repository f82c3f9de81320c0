//! End-to-end token scenarios.

use rand::RngCore;

use bpio::backend::{self, Backend};
use bpio::{Algorithm, Encoder, Engine, Error, Payload};

fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::rng().fill_bytes(&mut data);
    data
}

#[test]
fn aes_gcm_base64_token_is_self_describing() {
    let engine = Engine::new(Algorithm::AesGcm).with_encoder(Encoder::Base64Url);
    let key = engine.generate_key();
    let payload = Payload::new("demo", "hello");
    let token = engine.encrypt_and_encode_bytes(&payload.to_bytes(), &key).unwrap();

    // Container header: magic, version 1, "AESG", then the 12-byte nonce.
    let framed = Encoder::Base64Url.decode(&token).unwrap();
    assert_eq!(&framed[..10], &[0x42, 0x50, 0x49, 0x4F, 0x01, 0x00, 0x41, 0x45, 0x53, 0x47]);
    assert!(framed.len() > 10 + 12 + 16);

    let decrypted = engine.decode_and_decrypt_bytes(&token, &key).unwrap();
    assert_eq!(Payload::from_bytes(&decrypted).unwrap(), payload);
}

#[test]
fn xchacha_base85_one_mebibyte_round_trip() {
    let engine = Engine::new(Algorithm::XChaCha20Poly1305).with_encoder(Encoder::Base85);
    let key = engine.generate_key();
    let plaintext = random_bytes(1024 * 1024);

    let token = engine.encrypt_and_encode_bytes(&plaintext, &key).unwrap();
    assert_eq!(engine.decode_and_decrypt_bytes(&token, &key).unwrap(), plaintext);
}

#[test]
fn aes_gcm_tamper_is_an_authentication_failure() {
    let engine = Engine::new(Algorithm::AesGcm);
    let key = engine.generate_key();
    let mut blob = engine.encrypt(b"tamper target", &key).unwrap();

    // Flip one byte inside the ciphertext region (past the 12-byte nonce).
    let index = 12 + (blob.len() - 12) / 2;
    blob[index] ^= 0x10;
    assert!(matches!(
        engine.decrypt(&blob, &key),
        Err(Error::AuthenticationFailure)
    ));
}

#[test]
fn rc2_enhanced_hash_tamper_fails_before_plaintext_release() {
    let engine = Engine::new(Algorithm::Rc2);
    let key = engine.generate_key();
    let mut blob = engine.encrypt(b"integrity protected", &key).unwrap();

    // Stored SHA-256 sits at bytes 8..40.
    blob[20] ^= 0x01;
    assert!(matches!(
        engine.decrypt(&blob, &key),
        Err(Error::AuthenticationFailure)
    ));
}

#[test]
fn threefish_long_title_empty_instructions() {
    let engine = Engine::new(Algorithm::Threefish512);
    let key = engine.generate_key();
    let title = "t".repeat(4096);
    let payload = Payload::new(title, "");

    let token = engine.encrypt_and_encode_bytes(&payload.to_bytes(), &key).unwrap();
    let decrypted = engine.decode_and_decrypt_bytes(&token, &key).unwrap();
    assert_eq!(Payload::from_bytes(&decrypted).unwrap(), payload);
}

#[test]
fn forced_backends_interoperate() {
    let engine = Engine::new(Algorithm::ChaCha20Poly1305);
    let key = engine.generate_key();

    backend::CHACHA.force(Backend::Scalar).unwrap();
    let token = engine.encrypt_and_encode("cross-backend", &key).unwrap();

    let best = Backend::detect();
    backend::CHACHA.force(best).unwrap();
    let decrypted = engine.decode_and_decrypt(&token, &key);
    backend::CHACHA.reset();
    assert_eq!(decrypted.unwrap(), "cross-backend");
}

#[test]
fn every_algorithm_round_trips_through_every_encoder() {
    use strum::IntoEnumIterator;
    for algorithm in Algorithm::iter() {
        for encoder in [Encoder::Base64Url, Encoder::Base85, Encoder::Base65536] {
            let engine = Engine::new(algorithm).with_encoder(encoder);
            let key = engine.generate_key();
            let plaintext = random_bytes(777);
            let token = engine.encrypt_and_encode_bytes(&plaintext, &key).unwrap();
            assert_eq!(
                engine.decode_and_decrypt_bytes(&token, &key).unwrap(),
                plaintext,
                "{} / {}",
                algorithm.name(),
                encoder.name()
            );
        }
    }
}

#[test]
fn repeated_encryption_yields_distinct_blobs() {
    use strum::IntoEnumIterator;
    for algorithm in Algorithm::iter() {
        let engine = Engine::new(algorithm);
        let key = engine.generate_key();
        let a = engine.encrypt(b"nonce freshness", &key).unwrap();
        let b = engine.encrypt(b"nonce freshness", &key).unwrap();
        assert_ne!(a, b, "{} reused a nonce", algorithm.name());
    }
}

#[test]
fn authenticated_channels_reject_every_ciphertext_bit_flip() {
    for algorithm in [Algorithm::ChaCha20Poly1305, Algorithm::XChaCha20Poly1305] {
        let engine = Engine::new(algorithm);
        let key = engine.generate_key();
        let blob = engine.encrypt(b"bit flip sweep", &key).unwrap();
        let nonce_len = if algorithm == Algorithm::ChaCha20Poly1305 { 12 } else { 24 };
        for index in nonce_len..blob.len() {
            let mut tampered = blob.clone();
            tampered[index] ^= 0x01;
            assert!(
                matches!(engine.decrypt(&tampered, &key), Err(Error::AuthenticationFailure)),
                "{} accepted a flipped bit at {index}",
                algorithm.name()
            );
        }
    }
}

#[test]
fn truncated_and_corrupted_tokens_are_malformed() {
    let engine = Engine::new(Algorithm::ChaCha20Poly1305);
    let key = engine.generate_key();
    let token = engine.encrypt_and_encode("short-lived", &key).unwrap();

    // Garbage that still decodes must fail on the container, not panic.
    let garbage = Encoder::Base64Url.encode(b"definitely not a container");
    assert!(matches!(
        engine.decode_and_decrypt(&garbage, &key),
        Err(Error::Malformed(_))
    ));

    // Symbols outside the encoder alphabet fail in the decoder.
    assert!(matches!(
        engine.decode_and_decrypt("not!valid*base64", &key),
        Err(Error::Malformed(_))
    ));

    // An unknown algorithm id is a lookup error.
    let mut framed = Encoder::Base64Url.decode(&token).unwrap();
    framed[6..10].copy_from_slice(b"ZZZZ");
    let renamed = Encoder::Base64Url.encode(&framed);
    assert!(matches!(
        engine.decode_and_decrypt(&renamed, &key),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn wrong_key_never_reveals_plaintext_on_authenticated_channels() {
    use strum::IntoEnumIterator;
    for algorithm in Algorithm::iter().filter(|a| a.is_authenticated()) {
        let engine = Engine::new(algorithm);
        let key = engine.generate_key();
        let other = engine.generate_key();
        let blob = engine.encrypt(b"keyed out", &key).unwrap();
        assert!(
            engine.decrypt(&blob, &other).is_err(),
            "{} accepted the wrong key",
            algorithm.name()
        );
    }
}
