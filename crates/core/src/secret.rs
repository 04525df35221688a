// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Encryption at rest for tracker access tokens.
//!
//! Tokens are sealed with AES-256-GCM under a key derived from a
//! deployment passphrase. The stored form is base64(nonce || ciphertext);
//! a fresh random nonce is drawn per encryption, so the same token never
//! produces the same ciphertext twice.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

const NONCE_LEN: usize = 12;

/// Seals and opens tracker access tokens.
#[derive(Clone)]
pub struct TokenCipher {
    key: Key<Aes256Gcm>,
}

impl TokenCipher {
    /// Derive the cipher key from a deployment passphrase.
    pub fn new(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = Key::<Aes256Gcm>::default();
        key.copy_from_slice(&digest);
        TokenCipher { key }
    }

    /// Encrypt a plaintext token for storage.
    pub fn encrypt(&self, token: &str) -> Result<String> {
        let cipher = Aes256Gcm::new(&self.key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = cipher
            .encrypt(&nonce, token.as_bytes())
            .map_err(|e| Error::Crypto(format!("encrypt failed: {e}")))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(combined))
    }

    /// Decrypt a stored token. Fails on tampered data or a wrong key.
    pub fn decrypt(&self, stored: &str) -> Result<String> {
        let combined = BASE64
            .decode(stored)
            .map_err(|e| Error::Crypto(format!("base64 decode failed: {e}")))?;

        if combined.len() < NONCE_LEN {
            return Err(Error::Crypto("ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new(&self.key);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| Error::Crypto(format!("decrypt failed: {e}")))?;

        String::from_utf8(plaintext).map_err(|e| Error::Crypto(format!("invalid utf-8: {e}")))
    }
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;
