//! Wallet management and cryptographic operations
//!
//! This module handles key pair creation, address derivation, and
//! signature verification for the ledger.

#[allow(clippy::module_inception)]
pub mod wallet;

pub use wallet::{public_key_to_address, verify_signature, Wallet, SIGNATURE_LEN};
