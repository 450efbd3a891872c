use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};

use crate::error::{NodeError, Result};
use crate::utils::{ecdsa_p256_sha256_sign, ecdsa_p256_sha256_verify, new_key_pair, sha256_hex};

/// Signatures are r and s concatenated, each left-padded to 32 bytes.
pub const SIGNATURE_LEN: usize = 64;

/// An ECDSA P-256 key pair together with its derived ledger address.
pub struct Wallet {
    pkcs8: Vec<u8>,
    public_key: Vec<u8>,
    address: String,
}

impl Wallet {
    pub fn new() -> Result<Wallet> {
        let pkcs8 = new_key_pair()?;
        let rng = SystemRandom::new();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8.as_ref(), &rng)
                .map_err(|e| {
                    NodeError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
                })?;
        let public_key = key_pair.public_key().as_ref().to_vec();
        let address = public_key_to_address(&public_key);
        Ok(Wallet {
            pkcs8,
            public_key,
            address,
        })
    }

    pub fn address(&self) -> &str {
        self.address.as_str()
    }

    /// Uncompressed SEC1 public key bytes (0x04 tag followed by X and Y).
    pub fn public_key(&self) -> &[u8] {
        self.public_key.as_slice()
    }

    pub fn pkcs8(&self) -> &[u8] {
        self.pkcs8.as_slice()
    }

    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        ecdsa_p256_sha256_sign(&self.pkcs8, data)
    }
}

/// Derive the ledger address for an uncompressed P-256 public key: the
/// lowercase hex SHA-256 of the X and Y coordinates. Coordinates enter the
/// hash at their fixed 32-byte big-endian width; leading zero bytes are
/// kept, so every key has exactly one address.
pub fn public_key_to_address(public_key: &[u8]) -> String {
    let coordinates = public_key.strip_prefix(&[0x04u8]).unwrap_or(public_key);
    sha256_hex(coordinates)
}

/// Verify a 64-byte signature against data and an uncompressed public key.
pub fn verify_signature(public_key: &[u8], data: &[u8], signature: &[u8]) -> bool {
    if signature.len() != SIGNATURE_LEN {
        return false;
    }
    ecdsa_p256_sha256_verify(public_key, signature, data)
}
