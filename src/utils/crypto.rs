use data_encoding::HEXLOWER;
use ring::digest::{Context, SHA256};
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_FIXED, ECDSA_P256_SHA256_FIXED_SIGNING};

use crate::error::{NodeError, Result};

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

pub fn sha256_hex(data: &[u8]) -> String {
    HEXLOWER.encode(sha256_digest(data).as_slice())
}

pub fn new_key_pair() -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &rng)
        .map_err(|e| NodeError::Crypto(format!("Failed to generate ECDSA key pair: {e}")))?
        .as_ref()
        .to_vec();
    Ok(pkcs8)
}

/// Sign a message with an ECDSA P-256 key. The fixed signing scheme encodes
/// the signature as r and s concatenated, each left-padded to 32 bytes.
pub fn ecdsa_p256_sha256_sign(pkcs8: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let rng = SystemRandom::new();
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
        .map_err(|e| {
            NodeError::Crypto(format!("Failed to create key pair from PKCS8: {e}"))
        })?;
    let signature = key_pair
        .sign(&rng, message)
        .map_err(|e| NodeError::Crypto(format!("Failed to sign message: {e}")))?
        .as_ref()
        .to_vec();
    Ok(signature)
}

pub fn ecdsa_p256_sha256_verify(public_key: &[u8], signature: &[u8], message: &[u8]) -> bool {
    let peer_public_key =
        ring::signature::UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, public_key);
    let result = peer_public_key.verify(message, signature);
    result.is_ok()
}
