// ECDSA key pairs, signing and verification (secp256k1)

use crate::core::sha256_digest;
use rand::rngs::OsRng;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(#[from] secp256k1::Error),
}

/// Key pair
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new key pair from the OS random source
    pub fn generate() -> Self {
        let secp = Secp256k1::signing_only();
        let mut rng = OsRng;

        let secret_key = SecretKey::new(&mut rng);
        let public_key = secret_key.public_key(&secp);

        Self {
            secret_key,
            public_key,
        }
    }

    /// Create from secret key bytes
    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, SignatureError> {
        let secp = Secp256k1::signing_only();
        let secret_key = SecretKey::from_slice(bytes)?;
        let public_key = secret_key.public_key(&secp);

        Ok(Self {
            secret_key,
            public_key,
        })
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &encode_key(&self.public_key))
            .finish_non_exhaustive()
    }
}

/// Hex of the compressed public key (33 bytes)
pub fn encode_key(key: &PublicKey) -> String {
    hex::encode(key.serialize())
}

/// Sign SHA256(message), returning a DER-encoded signature
pub fn sign(secret_key: &SecretKey, message: &[u8]) -> Vec<u8> {
    let secp = Secp256k1::signing_only();
    let message = Message::from_digest(sha256_digest(message));
    secp.sign_ecdsa(&message, secret_key).serialize_der().to_vec()
}

/// Verify a DER signature over SHA256(message).
/// Malformed signatures verify as false.
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
    let secp = Secp256k1::verification_only();

    let signature = match Signature::from_der(signature) {
        Ok(sig) => sig,
        Err(_) => return false,
    };

    let message = Message::from_digest(sha256_digest(message));
    secp.verify_ecdsa(&message, &signature, public_key).is_ok()
}
