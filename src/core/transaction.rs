// Value transfers in the account model: a transaction moves an amount from
// one address balance to another and is signed by the sender's key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NodeError, Result};
use crate::utils::canonical::{self, signature_hex, timestamp_rfc3339};
use crate::utils::{ecdsa_p256_sha256_sign, sha256_hex};
use crate::wallet::{verify_signature, SIGNATURE_LEN};

/// Sender address of mining-reward transactions.
pub const COINBASE_SENDER: &str = "COINBASE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: f64,
    #[serde(with = "timestamp_rfc3339")]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "signature_hex")]
    pub signature: Vec<u8>,
}

impl Transaction {
    /// Create a new unsigned transaction. The id and signature stay empty
    /// until [`Transaction::sign`] runs.
    pub fn new(from: &str, to: &str, amount: f64) -> Transaction {
        Transaction {
            id: String::new(),
            from: from.to_string(),
            to: to.to_string(),
            amount,
            timestamp: Utc::now(),
            signature: vec![],
        }
    }

    /// Create a mining-reward transaction paying `reward` to the miner.
    /// Coinbase transactions carry no signature but still get an id.
    pub fn coinbase(to: &str, reward: f64) -> Transaction {
        let mut tx = Transaction::new(COINBASE_SENDER, to, reward);
        tx.id = tx.hash();
        tx
    }

    /// The byte sequence hashed for the id and covered by the signature.
    /// Amount and timestamp use the fixed canonical renderings; changing
    /// either rendering invalidates every existing transaction.
    pub fn canonical_data(&self) -> Vec<u8> {
        format!(
            "{}{}{}{}",
            self.from,
            self.to,
            canonical::format_amount(self.amount),
            canonical::format_timestamp(&self.timestamp),
        )
        .into_bytes()
    }

    /// Lowercase hex SHA-256 of the canonical data.
    pub fn hash(&self) -> String {
        sha256_hex(&self.canonical_data())
    }

    /// Sign the transaction with the sender's key, setting the signature
    /// and the id. A transaction is signed exactly once.
    pub fn sign(&mut self, pkcs8: &[u8]) -> Result<()> {
        let signature = ecdsa_p256_sha256_sign(pkcs8, &self.canonical_data())?;
        self.signature = signature;
        self.id = self.hash();
        Ok(())
    }

    /// Check the signature against the sender's public key.
    pub fn verify(&self, public_key: &[u8]) -> bool {
        verify_signature(public_key, &self.canonical_data(), &self.signature)
    }

    /// Structural validation. Coinbase transactions skip the signature
    /// check but still need an id and a positive amount.
    pub fn validate_shape(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(NodeError::Transaction("from address is required".to_string()));
        }
        if self.to.is_empty() {
            return Err(NodeError::Transaction("to address is required".to_string()));
        }
        if self.amount <= 0.0 {
            return Err(NodeError::Transaction("amount must be positive".to_string()));
        }
        if !self.is_coinbase() && self.signature.len() != SIGNATURE_LEN {
            return Err(NodeError::Transaction("transaction must be signed".to_string()));
        }
        if self.id.is_empty() {
            return Err(NodeError::Transaction("transaction must have an ID".to_string()));
        }
        Ok(())
    }

    pub fn is_coinbase(&self) -> bool {
        self.from == COINBASE_SENDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;
    use chrono::TimeZone;

    #[test]
    fn test_new_transaction_is_unsigned() {
        let tx = Transaction::new("alice", "bob", 10.0);

        assert_eq!(tx.from, "alice");
        assert_eq!(tx.to, "bob");
        assert_eq!(tx.amount, 10.0);
        assert!(tx.id.is_empty());
        assert!(tx.signature.is_empty());
    }

    #[test]
    fn test_hash_golden_vectors() {
        // Pinned digests over the canonical data. If these move, every
        // existing chain and signature is invalidated.
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let mut tx = Transaction::new("alice", "bob", 10.0);
        tx.timestamp = base;
        assert_eq!(
            tx.canonical_data(),
            b"alicebob10.0000002024-01-01T00:00:00Z"
        );
        assert_eq!(
            tx.hash(),
            "618b7800a2afd5d6a34b825d4b067ca3b92e0fbf36fdf6d6f3a0e42cdbfd68e7"
        );

        tx.timestamp = base + chrono::Duration::nanoseconds(123_456_789);
        assert_eq!(
            tx.hash(),
            "85952b5e09f94bb593a36fd22a10dc08230306f1d7f365a0616830605a232006"
        );

        let mut coinbase = Transaction::new(COINBASE_SENDER, "miner", 50.0);
        coinbase.timestamp = base;
        assert_eq!(
            coinbase.hash(),
            "84c66cb3a845792fc2b31a8c720063be165c6dca7b9867cc195d8ec62a810186"
        );
    }

    #[test]
    fn test_hash_is_deterministic() {
        let mut tx = Transaction::new("alice", "bob", 10.0);
        tx.timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let hash1 = tx.hash();
        assert_eq!(hash1, tx.hash());
        assert_eq!(hash1.len(), 64);

        tx.amount = 20.0;
        assert_ne!(hash1, tx.hash());
    }

    #[test]
    fn test_sign_sets_signature_and_id() {
        let wallet = Wallet::new().unwrap();
        let mut tx = Transaction::new("alice", "bob", 10.0);

        tx.sign(wallet.pkcs8()).unwrap();

        assert_eq!(tx.signature.len(), SIGNATURE_LEN);
        assert_eq!(tx.id, tx.hash());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let wallet = Wallet::new().unwrap();
        let mut tx = Transaction::new("alice", "bob", 10.0);
        tx.sign(wallet.pkcs8()).unwrap();

        assert!(tx.verify(wallet.public_key()));

        let other = Wallet::new().unwrap();
        assert!(!tx.verify(other.public_key()));

        // Every signed field is covered: mutating any of them must break
        // verification.
        let signed = tx.clone();

        tx = signed.clone();
        tx.amount = 999.0;
        assert!(!tx.verify(wallet.public_key()));

        tx = signed.clone();
        tx.from = "mallory".to_string();
        assert!(!tx.verify(wallet.public_key()));

        tx = signed.clone();
        tx.to = "mallory".to_string();
        assert!(!tx.verify(wallet.public_key()));

        tx = signed.clone();
        tx.timestamp = tx.timestamp + chrono::Duration::nanoseconds(1);
        assert!(!tx.verify(wallet.public_key()));

        tx = signed;
        tx.signature[0] ^= 0xff;
        assert!(!tx.verify(wallet.public_key()));
    }

    #[test]
    fn test_validate_shape() {
        let wallet = Wallet::new().unwrap();

        let mut signed = Transaction::new("alice", "bob", 10.0);
        signed.sign(wallet.pkcs8()).unwrap();
        assert!(signed.validate_shape().is_ok());

        let mut missing_from = Transaction::new("", "bob", 10.0);
        missing_from.sign(wallet.pkcs8()).unwrap();
        assert!(missing_from.validate_shape().is_err());

        let mut missing_to = Transaction::new("alice", "", 10.0);
        missing_to.sign(wallet.pkcs8()).unwrap();
        assert!(missing_to.validate_shape().is_err());

        let mut zero_amount = Transaction::new("alice", "bob", 0.0);
        zero_amount.sign(wallet.pkcs8()).unwrap();
        assert!(zero_amount.validate_shape().is_err());

        let mut negative_amount = Transaction::new("alice", "bob", -5.0);
        negative_amount.sign(wallet.pkcs8()).unwrap();
        assert!(negative_amount.validate_shape().is_err());

        let unsigned = Transaction::new("alice", "bob", 10.0);
        assert!(unsigned.validate_shape().is_err());

        let mut missing_id = Transaction::new("alice", "bob", 10.0);
        missing_id.signature = vec![0u8; SIGNATURE_LEN];
        assert!(missing_id.validate_shape().is_err());
    }

    #[test]
    fn test_coinbase_shape_skips_signature() {
        let coinbase = Transaction::coinbase("miner", 50.0);

        assert!(coinbase.is_coinbase());
        assert!(coinbase.signature.is_empty());
        assert!(!coinbase.id.is_empty());
        assert!(coinbase.validate_shape().is_ok());

        let regular = Transaction::new("alice", "bob", 10.0);
        assert!(!regular.is_coinbase());
    }

    #[test]
    fn test_json_round_trip_preserves_hash() {
        let wallet = Wallet::new().unwrap();
        let mut tx = Transaction::new("alice", "bob", 12.5);
        tx.sign(wallet.pkcs8()).unwrap();

        let encoded = serde_json::to_string(&tx).unwrap();
        let decoded: Transaction = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, tx);
        assert_eq!(decoded.hash(), tx.hash());
        assert!(decoded.verify(wallet.public_key()));
    }
}
