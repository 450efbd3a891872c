//! # Account Chain
//!
//! A proof-of-work blockchain node built on the account-balance model:
//! signed transactions move value between addresses, miners collect a fixed
//! reward per block, and a mesh of nodes converges on the longest valid
//! chain through HTTP gossip.
//!
//! ## Layout
//! - `core/`: transactions, blocks, proof-of-work, and the chain state machine
//! - `wallet/`: ECDSA P-256 key pairs and address derivation
//! - `storage/`: mempool of pending transactions
//! - `network/`: the node, gossip, chain sync, and the HTTP surface
//! - `cli/`: command-line flags for the node binary
//! - `utils/`: hashing and the canonical encodings every hash depends on

pub mod cli;
pub mod core;
pub mod error;
pub mod network;
pub mod storage;
pub mod utils;
pub mod wallet;

// Re-export commonly used types for convenience
pub use crate::cli::Opt;
pub use crate::core::{hash_meets_difficulty, Block, Chain, Transaction, COINBASE_SENDER};
pub use crate::error::{NodeError, Result};
pub use crate::network::{server, Node, NODE_ADDRESS_HEADER};
pub use crate::storage::Mempool;
pub use crate::utils::{sha256_digest, sha256_hex};
pub use crate::wallet::{public_key_to_address, verify_signature, Wallet, SIGNATURE_LEN};
