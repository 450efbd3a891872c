//! Utility functions and helpers
//!
//! This module contains cryptographic utilities, hex encoding, and the
//! canonical string encodings that block and transaction hashes depend on.

pub mod canonical;
pub mod crypto;

pub use crypto::{
    ecdsa_p256_sha256_sign, ecdsa_p256_sha256_verify, new_key_pair, sha256_digest, sha256_hex,
};
