//! Sealed-token codec: encrypt-then-MAC
//!
//! A payload is serialized, AES-CTR encrypted under a fresh random IV, and
//! the IV-prefixed ciphertext is signed with HMAC-SHA256 under a separate
//! key. The transport form is `base64(iv‖ciphertext) | base64(mac)`.
//!
//! Opening verifies the signature in constant time *before* touching the
//! ciphertext, so tampered input is rejected without ever running the
//! decryption or deserialization code it would reach.

use aes::cipher::generic_array::GenericArray;
use aes::{Aes128, Aes192, Aes256};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ctr::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// AES block size; the IV prepended to every ciphertext.
const IV_LEN: usize = 16;

/// Separator between the ciphertext and signature halves. Not part of the
/// URL-safe base64 alphabet, so splitting on it is unambiguous.
const SEPARATOR: char = '|';

/// Symmetric codec sealing payloads into transport-safe strings.
#[derive(Clone)]
pub struct TokenCodec {
    encrypt_key: Vec<u8>,
    sign_key: Vec<u8>,
}

impl TokenCodec {
    /// Create a codec. The encryption key length selects AES-128/192/256;
    /// the signing key must be non-empty and independent of it.
    pub fn new(encrypt_key: &[u8], sign_key: &[u8]) -> Result<Self, CodecError> {
        if !matches!(encrypt_key.len(), 16 | 24 | 32) {
            return Err(CodecError::KeyLength(encrypt_key.len()));
        }
        if sign_key.is_empty() {
            return Err(CodecError::EmptySignKey);
        }
        Ok(Self {
            encrypt_key: encrypt_key.to_vec(),
            sign_key: sign_key.to_vec(),
        })
    }

    /// Serialize, encrypt, and sign a payload.
    pub fn seal<T: Serialize>(&self, payload: &T) -> Result<String, CodecError> {
        let plaintext = serde_json::to_vec(payload).map_err(|_| CodecError::Malformed)?;
        self.seal_bytes(plaintext)
    }

    /// Verify, decrypt, and deserialize a sealed payload.
    pub fn open<T: DeserializeOwned>(&self, sealed: &str) -> Result<T, CodecError> {
        let plaintext = self.open_bytes(sealed)?;
        serde_json::from_slice(&plaintext).map_err(|_| CodecError::Malformed)
    }

    /// Encrypt and sign raw bytes. Consumes the buffer; CTR mode encrypts in
    /// place.
    pub fn seal_bytes(&self, mut plaintext: Vec<u8>) -> Result<String, CodecError> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        self.apply_ctr(&iv, &mut plaintext)?;

        let mut message = iv.to_vec();
        message.append(&mut plaintext);

        let mac = self.signature(&message)?;
        Ok(format!(
            "{}{SEPARATOR}{}",
            URL_SAFE_NO_PAD.encode(&message),
            URL_SAFE_NO_PAD.encode(mac)
        ))
    }

    /// Verify the signature and decrypt raw bytes.
    pub fn open_bytes(&self, sealed: &str) -> Result<Vec<u8>, CodecError> {
        let (message_b64, mac_b64) = sealed.split_once(SEPARATOR).ok_or(CodecError::Malformed)?;
        let message = URL_SAFE_NO_PAD
            .decode(message_b64)
            .map_err(|_| CodecError::Malformed)?;
        let claimed_mac = URL_SAFE_NO_PAD
            .decode(mac_b64)
            .map_err(|_| CodecError::Malformed)?;

        let expected_mac = self.signature(&message)?;
        if !bool::from(claimed_mac.as_slice().ct_eq(&expected_mac)) {
            return Err(CodecError::Integrity);
        }

        if message.len() <= IV_LEN {
            return Err(CodecError::Malformed);
        }
        let (iv, ciphertext) = message.split_at(IV_LEN);
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| CodecError::Malformed)?;
        let mut plaintext = ciphertext.to_vec();
        self.apply_ctr(&iv, &mut plaintext)?;
        Ok(plaintext)
    }

    fn signature(&self, message: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.sign_key).map_err(|_| CodecError::EmptySignKey)?;
        mac.update(message);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// CTR keystream is its own inverse; the same call encrypts and decrypts.
    fn apply_ctr(&self, iv: &[u8; IV_LEN], buf: &mut [u8]) -> Result<(), CodecError> {
        let iv = GenericArray::from(*iv);
        match self.encrypt_key.len() {
            16 => ctr::Ctr128BE::<Aes128>::new(
                GenericArray::from_slice(&self.encrypt_key),
                &iv,
            )
            .apply_keystream(buf),
            24 => ctr::Ctr128BE::<Aes192>::new(
                GenericArray::from_slice(&self.encrypt_key),
                &iv,
            )
            .apply_keystream(buf),
            32 => ctr::Ctr128BE::<Aes256>::new(
                GenericArray::from_slice(&self.encrypt_key),
                &iv,
            )
            .apply_keystream(buf),
            len => return Err(CodecError::KeyLength(len)),
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("encryption key must be 16, 24, or 32 bytes, got {0}")]
    KeyLength(usize),
    #[error("signing key must not be empty")]
    EmptySignKey,
    #[error("signature mismatch")]
    Integrity,
    #[error("malformed token")]
    Malformed,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(&[7u8; 32], b"test-signing-key").expect("codec")
    }

    #[test]
    fn test_seal_open_round_trip() {
        let codec = codec();
        let sealed = codec.seal(&("spencer".to_string(), 42u32)).expect("seal");
        let (name, n): (String, u32) = codec.open(&sealed).expect("open");
        assert_eq!(name, "spencer");
        assert_eq!(n, 42);
    }

    #[test]
    fn test_fresh_iv_per_seal() {
        let codec = codec();
        let a = codec.seal_bytes(b"same payload".to_vec()).expect("seal");
        let b = codec.seal_bytes(b"same payload".to_vec()).expect("seal");
        assert_ne!(a, b);
    }

    #[test]
    fn test_every_byte_flip_fails_integrity() {
        let codec = codec();
        let sealed = codec.seal_bytes(b"payload".to_vec()).expect("seal");
        for i in 0..sealed.len() {
            let mut bytes = sealed.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            if bytes == sealed.as_bytes() {
                continue;
            }
            let tampered = String::from_utf8(bytes).expect("ascii");
            let err = codec.open_bytes(&tampered).expect_err("tampered token accepted");
            assert!(
                matches!(err, CodecError::Integrity | CodecError::Malformed),
                "byte {i}: unexpected error {err:?}"
            );
        }
    }

    #[test]
    fn test_garbage_is_malformed_not_a_panic() {
        let codec = codec();
        for junk in ["", "|", "not-base64!!", "a|b|c", "dG9rZW4"] {
            let err = codec.open_bytes(junk).expect_err("garbage accepted");
            assert!(matches!(err, CodecError::Malformed | CodecError::Integrity));
        }
    }

    #[test]
    fn test_wrong_sign_key_is_rejected_before_decryption() {
        let codec = codec();
        let other = TokenCodec::new(&[7u8; 32], b"different-signing-key").expect("codec");
        let sealed = codec.seal_bytes(b"payload".to_vec()).expect("seal");
        assert!(matches!(other.open_bytes(&sealed), Err(CodecError::Integrity)));
    }

    #[test]
    fn test_all_key_sizes_round_trip() {
        for len in [16usize, 24, 32] {
            let codec = TokenCodec::new(&vec![1u8; len], b"sign").expect("codec");
            let sealed = codec.seal_bytes(b"hello".to_vec()).expect("seal");
            assert_eq!(codec.open_bytes(&sealed).expect("open"), b"hello");
        }
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(matches!(
            TokenCodec::new(&[0u8; 20], b"sign"),
            Err(CodecError::KeyLength(20))
        ));
        assert!(matches!(
            TokenCodec::new(&[0u8; 16], b""),
            Err(CodecError::EmptySignKey)
        ));
    }
}
