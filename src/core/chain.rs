// The ledger state machine: an append-only block list plus the account
// balances and public-key registry derived from it. Balances are a pure
// function of the blocks; the registry is populated out-of-band and is
// neither persisted nor gossiped.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::core::block::{hash_meets_difficulty, Block, GENESIS_PREVIOUS_HASH};
use crate::core::Transaction;
use crate::error::{NodeError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    pub blocks: Vec<Block>,
    pub difficulty: u32,
    pub mining_reward: f64,
    #[serde(skip)]
    balances: HashMap<String, f64>,
    #[serde(skip)]
    public_keys: HashMap<String, Vec<u8>>,
}

impl Chain {
    /// Create a chain holding a freshly mined genesis block: index 0, no
    /// transactions, previous hash "0".
    pub fn new(difficulty: u32, mining_reward: f64) -> Result<Chain> {
        let mut genesis = Block::new(0, &[], GENESIS_PREVIOUS_HASH);
        genesis.mine(difficulty)?;

        Ok(Chain {
            blocks: vec![genesis],
            difficulty,
            mining_reward,
            balances: HashMap::new(),
            public_keys: HashMap::new(),
        })
    }

    /// Associate a public key with an address. Required before any
    /// transaction from that address can be validated.
    pub fn register_public_key(&mut self, address: &str, public_key: Vec<u8>) {
        self.public_keys.insert(address.to_string(), public_key);
    }

    pub fn public_key(&self, address: &str) -> Option<&[u8]> {
        self.public_keys.get(address).map(Vec::as_slice)
    }

    pub fn get_balance(&self, address: &str) -> f64 {
        self.balances.get(address).copied().unwrap_or(0.0)
    }

    /// Mine a new block from the given transactions. The coinbase paying
    /// `miner_address` is prepended before mining. Any failure leaves the
    /// chain untouched.
    pub fn add_block(&mut self, transactions: &[Transaction], miner_address: &str) -> Result<()> {
        self.validate_transactions(transactions)?;

        let coinbase = Transaction::coinbase(miner_address, self.mining_reward);
        let mut all_transactions = Vec::with_capacity(transactions.len() + 1);
        all_transactions.push(coinbase);
        all_transactions.extend_from_slice(transactions);

        let prev_block = self.latest_block().clone();
        let mut new_block = Block::new(prev_block.index + 1, &all_transactions, &prev_block.hash);
        new_block.mine(self.difficulty)?;

        self.validate_new_block(&new_block, &prev_block)?;

        self.blocks.push(new_block);
        self.apply_transactions(&all_transactions);
        Ok(())
    }

    /// Validate a candidate transaction list against a simulated copy of the
    /// balances. Simulating sequentially is what rejects two transactions
    /// that together overdraw an account within one block.
    pub fn validate_transactions(&self, transactions: &[Transaction]) -> Result<()> {
        let mut simulated = self.balances.clone();

        for tx in transactions {
            tx.validate_shape()?;

            if tx.is_coinbase() {
                // The chain mints the reward itself in add_block; accepting a
                // submitted coinbase would let anyone print money.
                return Err(NodeError::Transaction(
                    "coinbase transactions cannot be submitted".to_string(),
                ));
            }

            let public_key = self.public_keys.get(&tx.from).ok_or_else(|| {
                NodeError::Signature(format!(
                    "public key not registered for address {}",
                    tx.from
                ))
            })?;

            if !tx.verify(public_key) {
                return Err(NodeError::Signature(format!(
                    "invalid signature for transaction {}",
                    tx.id
                )));
            }

            let balance = simulated.get(&tx.from).copied().unwrap_or(0.0);
            if balance < tx.amount {
                return Err(NodeError::InsufficientBalance {
                    address: tx.from.clone(),
                    balance,
                    amount: tx.amount,
                });
            }

            *simulated.entry(tx.from.clone()).or_insert(0.0) -= tx.amount;
            *simulated.entry(tx.to.clone()).or_insert(0.0) += tx.amount;
        }
        Ok(())
    }

    fn apply_transactions(&mut self, transactions: &[Transaction]) {
        for tx in transactions {
            if !tx.is_coinbase() {
                *self.balances.entry(tx.from.clone()).or_insert(0.0) -= tx.amount;
            }
            *self.balances.entry(tx.to.clone()).or_insert(0.0) += tx.amount;
        }
    }

    /// Check that a block extends its predecessor: consecutive index,
    /// matching previous hash, self-consistent hash, sufficient work.
    pub fn validate_new_block(&self, new_block: &Block, prev_block: &Block) -> Result<()> {
        if new_block.index != prev_block.index + 1 {
            return Err(NodeError::InvalidBlock(format!(
                "invalid index: expected {}, got {}",
                prev_block.index + 1,
                new_block.index
            )));
        }

        if new_block.previous_hash != prev_block.hash {
            return Err(NodeError::InvalidBlock("invalid previous hash".to_string()));
        }

        if !new_block.is_valid() {
            return Err(NodeError::InvalidBlock("invalid hash".to_string()));
        }

        if !hash_meets_difficulty(&new_block.hash, self.difficulty) {
            return Err(NodeError::InvalidBlock(
                "insufficient proof-of-work".to_string(),
            ));
        }

        Ok(())
    }

    /// Replay the whole chain: linkage and proof-of-work for every block,
    /// balances never negative at any step. Signatures are re-verified for
    /// senders whose keys are registered; chains decoded from peers or disk
    /// carry an empty registry and fall back to the structural checks only.
    pub fn is_valid(&self) -> bool {
        let mut simulated: HashMap<String, f64> = HashMap::new();

        for i in 1..self.blocks.len() {
            let current = &self.blocks[i];
            let prev = &self.blocks[i - 1];

            if let Err(e) = self.validate_new_block(current, prev) {
                warn!("Chain validation failed at block {i}: {e}");
                return false;
            }

            for tx in &current.transactions {
                if !tx.is_coinbase() {
                    if let Some(public_key) = self.public_keys.get(&tx.from) {
                        if !tx.verify(public_key) {
                            warn!("Invalid signature in block {i} for transaction {}", tx.id);
                            return false;
                        }
                    }

                    let balance = simulated.get(&tx.from).copied().unwrap_or(0.0);
                    if balance < tx.amount {
                        warn!("Invalid transaction in block {i}: insufficient balance");
                        return false;
                    }
                    *simulated.entry(tx.from.clone()).or_insert(0.0) -= tx.amount;
                }
                *simulated.entry(tx.to.clone()).or_insert(0.0) += tx.amount;
            }
        }

        true
    }

    /// Recompute balances by replaying every block. Used after decoding a
    /// chain from JSON, where only the blocks travel. The public-key
    /// registry cannot be rebuilt from blocks and stays empty.
    pub fn rebuild_state(&mut self) {
        self.balances.clear();
        for block in &self.blocks {
            for tx in &block.transactions {
                if !tx.is_coinbase() {
                    *self.balances.entry(tx.from.clone()).or_insert(0.0) -= tx.amount;
                }
                *self.balances.entry(tx.to.clone()).or_insert(0.0) += tx.amount;
            }
        }
    }

    pub fn latest_block(&self) -> &Block {
        self.blocks
            .last()
            .expect("chain always contains the genesis block")
    }

    pub fn length(&self) -> usize {
        self.blocks.len()
    }

    /// Persist the chain as pretty-printed canonical JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    /// Load a chain from disk and rebuild its balances from the blocks.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Chain> {
        let data = fs::read_to_string(path)?;
        let mut chain: Chain = serde_json::from_str(&data)?;
        chain.rebuild_state();
        Ok(chain)
    }
}
