use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::core::Transaction;
use crate::error::Result;
use crate::utils::canonical::{self, timestamp_rfc3339};
use crate::utils::sha256_hex;

/// Previous-hash marker carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    #[serde(with = "timestamp_rfc3339")]
    pub timestamp: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub hash: String,
    pub nonce: u64,
}

impl Block {
    pub fn new(index: u64, transactions: &[Transaction], previous_hash: &str) -> Block {
        Block {
            index,
            timestamp: Utc::now(),
            transactions: transactions.to_vec(),
            previous_hash: previous_hash.to_string(),
            hash: String::new(),
            nonce: 0,
        }
    }

    /// Hash over index, timestamp, the canonical JSON of the transaction
    /// list, previous hash, and nonce. The transaction list must serialize
    /// exactly as it does on the wire so all nodes hash the same bytes.
    pub fn compute_hash(&self) -> Result<String> {
        let transactions = serde_json::to_string(&self.transactions)?;
        let record = format!(
            "{}{}{}{}{}",
            self.index,
            canonical::format_timestamp(&self.timestamp),
            transactions,
            self.previous_hash,
            self.nonce,
        );
        Ok(sha256_hex(record.as_bytes()))
    }

    /// Proof-of-work: increment the nonce until the hash has `difficulty`
    /// leading zero hex digits. Runs on the calling thread.
    pub fn mine(&mut self, difficulty: u32) -> Result<()> {
        loop {
            let hash = self.compute_hash()?;
            if hash_meets_difficulty(&hash, difficulty) {
                self.hash = hash;
                info!(
                    "Mined block {} with hash: {} (nonce: {})",
                    self.index, self.hash, self.nonce
                );
                return Ok(());
            }
            self.nonce += 1;
        }
    }

    /// A block is internally consistent when its stored hash matches a
    /// recomputation over its current contents.
    pub fn is_valid(&self) -> bool {
        match self.compute_hash() {
            Ok(hash) => hash == self.hash,
            Err(_) => false,
        }
    }
}

/// A hash satisfies difficulty D when its first D hex characters are '0'.
pub fn hash_meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let prefix_len = difficulty as usize;
    hash.len() >= prefix_len && hash.as_bytes()[..prefix_len].iter().all(|&b| b == b'0')
}
