//! Payload encryption for submission envelopes.
//!
//! The key is generated once at process start and reused for every call.
//! Ciphertexts are framed as nonce || ciphertext and base64-encoded so
//! they can travel inside a JSON string.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// Errors from payload encryption/decryption.
#[derive(Debug, Error)]
pub enum CipherError {
    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed")]
    Decrypt,

    #[error("ciphertext is malformed: {0}")]
    Malformed(String),
}

/// Opaque encrypt/decrypt capability for submission payloads.
///
/// Implementations must reuse the same process-lifetime key for all calls;
/// the agent never re-derives key material per request.
pub trait PayloadCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError>;
}

/// AES-256-GCM cipher with a random key drawn at construction.
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    /// Draw a fresh random key. Called once at startup.
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self::from_key(&key)
    }

    /// Build from raw key bytes.
    pub fn from_key(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }
}

impl PayloadCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        // Nonce must be unique per encryption under the same key
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut framed = Vec::with_capacity(12 + ciphertext.len());
        framed.extend_from_slice(&nonce_bytes);
        framed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(framed))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CipherError> {
        let framed = URL_SAFE_NO_PAD
            .decode(ciphertext)
            .map_err(|e| CipherError::Malformed(e.to_string()))?;
        if framed.len() < 12 {
            return Err(CipherError::Malformed(
                "ciphertext shorter than nonce".to_string(),
            ));
        }

        let (nonce_bytes, body) = framed.split_at(12);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), body)
            .map_err(|_| CipherError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|e| CipherError::Malformed(e.to_string()))
    }
}
