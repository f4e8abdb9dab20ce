// src/wallet/key_management.rs
//! Cryptographic key management for registry participants.
//!
//! Provides generation and use of the secp256k1 keys that back an
//! [`Identity`]:
//! - Identity derivation (Ethereum address of the public key)
//! - EIP-191 `personal_sign` message signing, as expected by `/login`
//!
//! Uses the following cryptographic primitives:
//! - secp256k1 curve (via `k256` crate)
//! - Keccak-256 hashing (via `ethers-core`)

use crate::error::{RegistryError, Result};
use crate::models::identity::Identity;
use ethers_core::types::Signature;
use ethers_core::utils::{hash_message, hex, secret_key_to_address};
use k256::ecdsa::SigningKey;

/// Key pair of one registry participant.
#[derive(Clone)]
pub struct KeyManager {
    /// Private key (never exposed except through `secret_hex`)
    signing_key: SigningKey,
}

impl KeyManager {
    /// Generates a fresh random key pair.
    pub fn new() -> Self {
        KeyManager {
            signing_key: SigningKey::random(&mut rand::thread_rng()),
        }
    }

    /// Restores a key pair from a hex-encoded 32-byte private key.
    ///
    /// # Errors
    /// `Signature` if the input is not valid hex or not a valid scalar.
    pub fn from_hex(secret: &str) -> Result<Self> {
        let bytes = hex::decode(secret.trim().trim_start_matches("0x"))
            .map_err(|e| RegistryError::Signature(format!("invalid key hex: {}", e)))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| RegistryError::Signature(format!("invalid private key: {}", e)))?;
        Ok(KeyManager { signing_key })
    }

    /// Hex encoding of the private key, `0x`-prefixed.
    pub fn secret_hex(&self) -> String {
        format!("0x{}", hex::encode(self.signing_key.to_bytes()))
    }

    /// Identity controlled by this key.
    pub fn identity(&self) -> Identity {
        Identity::from(secret_key_to_address(&self.signing_key))
    }

    /// Signs `message` with the EIP-191 personal-message prefix.
    ///
    /// # Returns
    /// 65-byte recoverable signature (r || s || v, v in {27, 28})
    pub fn sign_message(&self, message: &[u8]) -> Result<Signature> {
        let digest = hash_message(message);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| RegistryError::Signature(e.to_string()))?;

        let mut bytes = signature.to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        Signature::try_from(bytes.as_slice()).map_err(|e| RegistryError::Signature(e.to_string()))
    }
}

impl Default for KeyManager {
    fn default() -> Self {
        Self::new()
    }
}
