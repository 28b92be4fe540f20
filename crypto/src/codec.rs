//! Token codec: symmetric sealing of short plaintext payloads.
//!
//! A wire token is `<iv_hex>:<ciphertext_hex>`. The IV is 16 random bytes
//! generated per call; the ciphertext is AES-256-CBC with PKCS#7 padding.
//! The `:` delimiter is distinct from the `;` used inside payloads, and
//! never appears in hex output.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use crate::{CodecError, TokenKey};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size, and therefore IV length, in bytes.
pub const IV_LEN: usize = 16;

/// Separates the hex IV from the hex ciphertext.
pub const IV_DELIMITER: char = ':';

/// Seals and opens wire tokens with the shared key.
pub struct TokenCodec {
    key: TokenKey,
}

impl TokenCodec {
    pub fn new(key: TokenKey) -> Self {
        Self { key }
    }

    /// Encrypt `plaintext` under a fresh random IV.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        let mut iv = [0u8; IV_LEN];
        getrandom::getrandom(&mut iv).map_err(|e| CodecError::Random(e.to_string()))?;
        Ok(self.encrypt_with_iv(plaintext, &iv))
    }

    fn encrypt_with_iv(&self, plaintext: &str, iv: &[u8; IV_LEN]) -> String {
        let cipher = Aes256CbcEnc::new(
            GenericArray::from_slice(self.key.as_bytes()),
            GenericArray::from_slice(iv),
        );
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
        format!(
            "{}{}{}",
            hex::encode(iv),
            IV_DELIMITER,
            hex::encode(ciphertext)
        )
    }

    /// Decrypt a wire token produced by [`TokenCodec::encrypt`] under the same key.
    pub fn decrypt(&self, token: &str) -> Result<String, CodecError> {
        let mut parts = token.split(IV_DELIMITER);
        let (Some(iv_hex), Some(ct_hex), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CodecError::Delimiter {
                delimiter: IV_DELIMITER,
            });
        };

        let iv = hex::decode(iv_hex).map_err(|e| CodecError::Hex(e.to_string()))?;
        if iv.len() != IV_LEN {
            return Err(CodecError::IvLength {
                expected: IV_LEN,
                got: iv.len(),
            });
        }
        let ciphertext = hex::decode(ct_hex).map_err(|e| CodecError::Hex(e.to_string()))?;

        let cipher = Aes256CbcDec::new(
            GenericArray::from_slice(self.key.as_bytes()),
            GenericArray::from_slice(&iv),
        );
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CodecError::Cipher)?;

        String::from_utf8(plaintext).map_err(|_| CodecError::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(TokenKey::derive(secret).unwrap())
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let codec = codec("shared-secret");
        let plaintext = "TOTP1;eu-central-1;1700000000000;203.0.113.7";
        let token = codec.encrypt(plaintext).unwrap();
        assert_eq!(codec.decrypt(&token).unwrap(), plaintext);
    }

    #[test]
    fn wire_format_is_iv_then_ciphertext() {
        let token = codec("k").encrypt("hello").unwrap();
        let (iv, ct) = token.split_once(':').unwrap();
        assert_eq!(iv.len(), IV_LEN * 2);
        // "hello" pads to exactly one block.
        assert_eq!(ct.len(), 32);
        assert!(!token.contains(';'));
    }

    #[test]
    fn fresh_iv_per_call() {
        let codec = codec("k");
        let a = codec.encrypt("same").unwrap();
        let b = codec.encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn fixed_iv_is_deterministic() {
        let codec = codec("k");
        let iv = [7u8; IV_LEN];
        assert_eq!(
            codec.encrypt_with_iv("payload", &iv),
            codec.encrypt_with_iv("payload", &iv)
        );
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let codec = codec("k");
        let token = codec.encrypt("").unwrap();
        assert_eq!(codec.decrypt(&token).unwrap(), "");
    }

    #[test]
    fn wrong_key_fails() {
        let token = codec("right").encrypt("TOTP1;a;1;10.0.0.1").unwrap();
        // With a wrong key the padding check almost always fails; if it
        // happens to pass, the plaintext must still differ.
        match codec("wrong").decrypt(&token) {
            Err(_) => {}
            Ok(plain) => assert_ne!(plain, "TOTP1;a;1;10.0.0.1"),
        }
    }

    #[test]
    fn malformed_delimiters_rejected() {
        let codec = codec("k");
        assert_eq!(
            codec.decrypt("00112233"),
            Err(CodecError::Delimiter { delimiter: ':' })
        );
        assert_eq!(
            codec.decrypt("00:11:22"),
            Err(CodecError::Delimiter { delimiter: ':' })
        );
    }

    #[test]
    fn invalid_hex_rejected() {
        let codec = codec("k");
        assert!(matches!(codec.decrypt("zz:00"), Err(CodecError::Hex(_))));
        let iv = "00".repeat(IV_LEN);
        assert!(matches!(
            codec.decrypt(&format!("{iv}:abc")),
            Err(CodecError::Hex(_))
        ));
    }

    #[test]
    fn short_iv_rejected() {
        assert_eq!(
            codec("k").decrypt("0011:00112233445566778899aabbccddeeff"),
            Err(CodecError::IvLength {
                expected: IV_LEN,
                got: 2
            })
        );
    }

    #[test]
    fn truncated_ciphertext_rejected() {
        let codec = codec("k");
        let token = codec.encrypt("some longer payload text").unwrap();
        let truncated = &token[..token.len() - 2];
        assert!(codec.decrypt(truncated).is_err());

        let iv = "00".repeat(IV_LEN);
        assert_eq!(codec.decrypt(&format!("{iv}:")), Err(CodecError::Cipher));
    }
}
