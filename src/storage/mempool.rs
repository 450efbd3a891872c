use std::collections::HashMap;
use std::sync::RwLock;

use crate::core::Transaction;
use crate::error::{NodeError, Result};

/// ( K -> transaction id, V -> Transaction )
///
/// Every member has passed shape validation and ids are unique. Readers and
/// writers are serialized internally; callers never lock.
pub struct Mempool {
    inner: RwLock<HashMap<String, Transaction>>,
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

impl Mempool {
    pub fn new() -> Mempool {
        Mempool {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Add a transaction. Fails on a shape violation or a duplicate id.
    pub fn add(&self, tx: Transaction) -> Result<()> {
        tx.validate_shape()?;

        match self.inner.write() {
            Ok(mut pool) => {
                if pool.contains_key(&tx.id) {
                    return Err(NodeError::DuplicateTransaction(tx.id.clone()));
                }
                pool.insert(tx.id.clone(), tx);
                Ok(())
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on mempool");
                Err(NodeError::Transaction("mempool unavailable".to_string()))
            }
        }
    }

    pub fn get(&self, txid: &str) -> Option<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.get(txid).cloned(),
            Err(_) => {
                log::error!("Failed to acquire read lock on mempool");
                None
            }
        }
    }

    pub fn contains(&self, txid: &str) -> bool {
        match self.inner.read() {
            Ok(pool) => pool.contains_key(txid),
            Err(_) => {
                log::error!("Failed to acquire read lock on mempool");
                false
            }
        }
    }

    /// Remove by id; removing an absent id is a no-op.
    pub fn remove(&self, txid: &str) {
        match self.inner.write() {
            Ok(mut pool) => {
                pool.remove(txid);
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on mempool");
            }
        }
    }

    /// Remove every listed transaction, typically after mining them.
    pub fn remove_many(&self, transactions: &[Transaction]) {
        match self.inner.write() {
            Ok(mut pool) => {
                for tx in transactions {
                    pool.remove(&tx.id);
                }
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on mempool");
            }
        }
    }

    /// Snapshot of all pending transactions. Iteration order is unspecified.
    pub fn get_all(&self) -> Vec<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.values().cloned().collect(),
            Err(_) => {
                log::error!("Failed to acquire read lock on mempool");
                Vec::new()
            }
        }
    }

    /// Snapshot of up to `n` pending transactions.
    pub fn get_n(&self, n: usize) -> Vec<Transaction> {
        match self.inner.read() {
            Ok(pool) => pool.values().take(n).cloned().collect(),
            Err(_) => {
                log::error!("Failed to acquire read lock on mempool");
                Vec::new()
            }
        }
    }

    pub fn size(&self) -> usize {
        match self.inner.read() {
            Ok(pool) => pool.len(),
            Err(_) => {
                log::error!("Failed to acquire read lock on mempool");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self.inner.read() {
            Ok(pool) => pool.is_empty(),
            Err(_) => {
                log::error!("Failed to acquire read lock on mempool");
                true
            }
        }
    }

    pub fn clear(&self) {
        match self.inner.write() {
            Ok(mut pool) => {
                pool.clear();
            }
            Err(_) => {
                log::error!("Failed to acquire write lock on mempool");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    fn signed_transaction(from: &str, to: &str, amount: f64) -> Transaction {
        let wallet = Wallet::new().unwrap();
        let mut tx = Transaction::new(from, to, amount);
        tx.sign(wallet.pkcs8()).unwrap();
        tx
    }

    #[test]
    fn test_add_and_get() {
        let pool = Mempool::new();
        let tx = signed_transaction("alice", "bob", 5.0);
        let id = tx.id.clone();

        pool.add(tx).unwrap();

        assert_eq!(pool.size(), 1);
        assert!(pool.contains(&id));
        assert_eq!(pool.get(&id).unwrap().from, "alice");
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let pool = Mempool::new();
        let tx = signed_transaction("alice", "bob", 5.0);

        pool.add(tx.clone()).unwrap();
        let err = pool.add(tx).unwrap_err();

        assert!(matches!(err, NodeError::DuplicateTransaction(_)));
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_add_rejects_unsigned_transaction() {
        let pool = Mempool::new();
        let tx = Transaction::new("alice", "bob", 5.0);

        assert!(pool.add(tx).is_err());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let pool = Mempool::new();
        let tx = signed_transaction("alice", "bob", 5.0);
        pool.add(tx).unwrap();

        pool.remove("no-such-id");
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_size_tracks_adds_and_removes() {
        let pool = Mempool::new();
        let tx1 = signed_transaction("alice", "bob", 1.0);
        let tx2 = signed_transaction("bob", "charlie", 2.0);
        let id1 = tx1.id.clone();

        pool.add(tx1).unwrap();
        pool.add(tx2).unwrap();
        assert_eq!(pool.size(), 2);

        pool.remove(&id1);
        assert_eq!(pool.size(), 1);

        pool.clear();
        assert!(pool.is_empty());
    }

    #[test]
    fn test_get_n_caps_snapshot() {
        let pool = Mempool::new();
        for i in 1..=5 {
            pool.add(signed_transaction("alice", "bob", i as f64)).unwrap();
        }

        assert_eq!(pool.get_n(3).len(), 3);
        assert_eq!(pool.get_n(10).len(), 5);
        assert_eq!(pool.get_all().len(), 5);
    }

    #[test]
    fn test_remove_many() {
        let pool = Mempool::new();
        let tx1 = signed_transaction("alice", "bob", 1.0);
        let tx2 = signed_transaction("bob", "charlie", 2.0);
        let tx3 = signed_transaction("charlie", "alice", 3.0);

        pool.add(tx1.clone()).unwrap();
        pool.add(tx2.clone()).unwrap();
        pool.add(tx3.clone()).unwrap();

        pool.remove_many(&[tx1, tx2]);

        assert_eq!(pool.size(), 1);
        assert!(pool.contains(&tx3.id));
    }
}
