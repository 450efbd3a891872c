use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use log::{info, warn};

use crate::core::{Block, Chain, Transaction};
use crate::error::{NodeError, Result};
use crate::storage::Mempool;
use crate::wallet::Wallet;

/// Header carrying the sender's node address on gossip requests; receivers
/// add the value as a peer.
pub const NODE_ADDRESS_HEADER: &str = "X-Node-Address";

/// Timeout applied to every outbound peer request.
const PEER_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// A node owns one chain, one mempool, and one wallet, and gossips with a
/// set of peers over HTTP.
///
/// The chain is shared as an immutable snapshot behind an `Arc`: readers
/// clone the pointer, writers build a replacement off-line and swap it in
/// one step, so a reader never observes a half-applied block or a chain
/// mid-replacement.
pub struct Node {
    chain: RwLock<Arc<Chain>>,
    mempool: Mempool,
    wallet: Wallet,
    address: String,
    peers: RwLock<Vec<String>>,
    is_mining: Mutex<bool>,
    client: reqwest::Client,
}

/// Clears the mining flag when a mine attempt ends, on every exit path.
#[derive(Debug)]
struct MiningGuard<'a> {
    flag: &'a Mutex<bool>,
}

impl Drop for MiningGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut mining) = self.flag.lock() {
            *mining = false;
        }
    }
}

impl Node {
    pub fn new(address: &str, difficulty: u32, mining_reward: f64) -> Result<Node> {
        let wallet = Wallet::new()?;
        let mut chain = Chain::new(difficulty, mining_reward)?;
        chain.register_public_key(wallet.address(), wallet.public_key().to_vec());

        let client = reqwest::Client::builder()
            .timeout(PEER_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NodeError::Network(format!("Failed to build HTTP client: {e}")))?;

        Ok(Node {
            chain: RwLock::new(Arc::new(chain)),
            mempool: Mempool::new(),
            wallet,
            address: address.to_string(),
            peers: RwLock::new(Vec::new()),
            is_mining: Mutex::new(false),
            client,
        })
    }

    pub fn address(&self) -> &str {
        self.address.as_str()
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    /// Consistent point-in-time view of the chain.
    pub fn chain_snapshot(&self) -> Arc<Chain> {
        Arc::clone(
            &self
                .chain
                .read()
                .expect("Failed to acquire read lock on chain - this should never happen"),
        )
    }

    fn replace_chain(&self, chain: Chain) {
        let mut current = self
            .chain
            .write()
            .expect("Failed to acquire write lock on chain - this should never happen");
        *current = Arc::new(chain);
    }

    pub fn add_peer(&self, peer_address: &str) {
        if peer_address == self.address {
            return;
        }

        let mut peers = self
            .peers
            .write()
            .expect("Failed to acquire write lock on peers - this should never happen");
        if !peers.iter().any(|p| p == peer_address) {
            peers.push(peer_address.to_string());
            info!("[{}] Added peer: {peer_address}", self.address);
        }
    }

    pub fn get_peers(&self) -> Vec<String> {
        self.peers
            .read()
            .expect("Failed to acquire read lock on peers - this should never happen")
            .clone()
    }

    /// Accept a transaction into the mempool and relay it to every peer.
    /// Relays are fire-and-forget; mempool duplicate rejection is what stops
    /// a transaction from circling the mesh forever.
    pub fn receive_transaction(&self, tx: Transaction) -> Result<()> {
        self.mempool.add(tx.clone())?;

        info!(
            "[{}] Received transaction: {} -> {} ({:.2} coins)",
            self.address,
            short(&tx.from),
            short(&tx.to),
            tx.amount
        );

        self.broadcast_transaction(&tx);
        Ok(())
    }

    /// React to a block announcement. The payload is only a hint that some
    /// peer extended its chain; the authoritative state is whatever the
    /// longest valid peer chain turns out to be, so run a full sync.
    pub async fn receive_block(&self, block: Block) -> Result<()> {
        info!(
            "[{}] Received block {} at height {}, syncing chain",
            self.address,
            short(&block.hash),
            block.index
        );
        self.sync_with_peers().await
    }

    /// Mine the current mempool contents into a new block.
    ///
    /// Only one mine may run at a time; re-entry fails immediately. The
    /// proof-of-work runs on a blocking thread against a cloned chain, and
    /// the result is swapped in atomically, so request handlers keep
    /// serving consistent snapshots throughout.
    pub async fn mine(&self) -> Result<()> {
        let _guard = self.begin_mining()?;

        let transactions = self.mempool.get_all();
        info!(
            "[{}] Mining block with {} transactions...",
            self.address,
            transactions.len()
        );

        let mut candidate = (*self.chain_snapshot()).clone();
        let miner_address = self.wallet.address().to_string();
        let mined = transactions.clone();
        let candidate = tokio::task::spawn_blocking(move || -> Result<Chain> {
            candidate.add_block(&mined, &miner_address)?;
            Ok(candidate)
        })
        .await
        .map_err(|e| NodeError::Mining(format!("mining task failed: {e}")))??;

        self.replace_chain(candidate);
        self.mempool.remove_many(&transactions);
        self.broadcast_block();

        info!(
            "[{}] Mined block {}!",
            self.address,
            self.chain_snapshot().latest_block().index
        );
        Ok(())
    }

    fn begin_mining(&self) -> Result<MiningGuard<'_>> {
        let mut mining = self
            .is_mining
            .lock()
            .map_err(|_| NodeError::Mining("mining flag unavailable".to_string()))?;
        if *mining {
            return Err(NodeError::Mining("already mining".to_string()));
        }
        *mining = true;
        Ok(MiningGuard {
            flag: &self.is_mining,
        })
    }

    /// Pull every peer's chain and adopt the longest valid one if it is
    /// strictly longer than ours. Failures on individual peers are logged
    /// and skipped; the node keeps its current chain unless a winner exists.
    pub async fn sync_with_peers(&self) -> Result<()> {
        let peers = self.get_peers();
        if peers.is_empty() {
            return Ok(());
        }

        // Announce ourselves so peers gossip back to us.
        for peer in &peers {
            let client = self.client.clone();
            let body = serde_json::json!({ "peer": self.address });
            let peer = peer.clone();
            tokio::spawn(async move {
                let url = format!("http://{peer}/peers");
                let _ = client.post(&url).json(&body).send().await;
            });
        }

        let mut max_length = self.chain_snapshot().length();
        let mut longest: Option<Chain> = None;

        for peer in &peers {
            let url = format!("http://{peer}/chain");
            let response = match self.client.get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!("[{}] Failed to fetch chain from {peer}: {e}", self.address);
                    continue;
                }
            };

            let mut candidate: Chain = match response.json().await {
                Ok(chain) => chain,
                Err(e) => {
                    warn!("[{}] Failed to decode chain from {peer}: {e}", self.address);
                    continue;
                }
            };

            // Only the blocks travel; balances are replayed locally.
            candidate.rebuild_state();

            if candidate.length() > max_length && candidate.is_valid() {
                max_length = candidate.length();
                longest = Some(candidate);
            }
        }

        if let Some(mut winner) = longest {
            info!(
                "[{}] Replacing chain with longer chain (length: {max_length})",
                self.address
            );
            winner.register_public_key(self.wallet.address(), self.wallet.public_key().to_vec());
            self.replace_chain(winner);
        }

        Ok(())
    }

    /// Mine on a timer whenever the mempool is non-empty. Errors (including
    /// an overlapping manual mine) are logged and do not stop the loop.
    pub fn start_mining(self: Arc<Self>, interval: Duration) {
        let node = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; wait a full interval.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if node.mempool.size() > 0 {
                    if let Err(e) = node.mine().await {
                        warn!("[{}] Mining failed: {e}", node.address);
                    }
                }
            }
        });
    }

    fn broadcast_transaction(&self, tx: &Transaction) {
        for peer in self.get_peers() {
            let client = self.client.clone();
            let tx = tx.clone();
            let from = self.address.clone();
            tokio::spawn(async move {
                let url = format!("http://{peer}/transaction");
                if let Err(e) = client
                    .post(&url)
                    .header(NODE_ADDRESS_HEADER, &from)
                    .json(&tx)
                    .send()
                    .await
                {
                    warn!("[{from}] Failed to send transaction to {peer}: {e}");
                }
            });
        }
    }

    fn broadcast_block(&self) {
        let latest = self.chain_snapshot().latest_block().clone();
        for peer in self.get_peers() {
            let client = self.client.clone();
            let block = latest.clone();
            let from = self.address.clone();
            tokio::spawn(async move {
                let url = format!("http://{peer}/block");
                if let Err(e) = client
                    .post(&url)
                    .header(NODE_ADDRESS_HEADER, &from)
                    .json(&block)
                    .send()
                    .await
                {
                    warn!("[{from}] Failed to send block to {peer}: {e}");
                }
            });
        }
    }
}

/// Truncate an address for log lines. Addresses are ASCII hex.
fn short(value: &str) -> &str {
    &value[..value.len().min(8)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_registers_own_public_key() {
        let node = Node::new("127.0.0.1:18000", 1, 10.0).unwrap();
        let chain = node.chain_snapshot();

        assert_eq!(
            chain.public_key(node.wallet().address()),
            Some(node.wallet().public_key())
        );
        assert_eq!(chain.length(), 1);
    }

    #[test]
    fn test_add_peer_skips_self_and_duplicates() {
        let node = Node::new("127.0.0.1:18001", 1, 10.0).unwrap();

        node.add_peer("127.0.0.1:18001");
        assert!(node.get_peers().is_empty());

        node.add_peer("127.0.0.1:18002");
        node.add_peer("127.0.0.1:18002");
        assert_eq!(node.get_peers(), vec!["127.0.0.1:18002".to_string()]);
    }

    #[test]
    fn test_receive_transaction_rejects_duplicates() {
        let node = Node::new("127.0.0.1:18004", 1, 10.0).unwrap();
        let sender = Wallet::new().unwrap();

        let mut tx = Transaction::new(sender.address(), "recipient", 2.0);
        tx.sign(sender.pkcs8()).unwrap();

        node.receive_transaction(tx.clone()).unwrap();
        assert_eq!(node.mempool().size(), 1);

        let err = node.receive_transaction(tx).unwrap_err();
        assert!(matches!(err, NodeError::DuplicateTransaction(_)));
        assert_eq!(node.mempool().size(), 1);
    }

    #[test]
    fn test_mining_flag_refuses_reentry() {
        let node = Node::new("127.0.0.1:18003", 1, 10.0).unwrap();

        let guard = node.begin_mining().unwrap();
        let err = node.begin_mining().unwrap_err();
        assert!(matches!(err, NodeError::Mining(_)));

        drop(guard);
        assert!(node.begin_mining().is_ok());
    }

    #[test]
    fn test_short_truncates_safely() {
        assert_eq!(short("abcdefghij"), "abcdefgh");
        assert_eq!(short("abc"), "abc");
        assert_eq!(short(""), "");
    }
}
