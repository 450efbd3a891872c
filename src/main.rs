use std::process;
use std::sync::Arc;

use account_chain::{server, Node, Opt, Result};
use clap::Parser;
use log::{error, info, warn, LevelFilter};

#[tokio::main]
async fn main() {
    env_logger::builder().filter_level(LevelFilter::Info).init();

    let opt = Opt::parse();

    if let Err(e) = run(opt).await {
        error!("Error: {e}");
        process::exit(1);
    }
}

async fn run(opt: Opt) -> Result<()> {
    let address = format!("localhost:{}", opt.port);
    let node = Arc::new(Node::new(&address, opt.difficulty, opt.reward)?);

    for peer in opt.peers.split(',') {
        let peer = peer.trim();
        if !peer.is_empty() {
            node.add_peer(peer);
        }
    }

    // Catch up with the mesh before serving so a late joiner starts from
    // the longest chain instead of its own genesis.
    if !node.get_peers().is_empty() {
        info!("[{address}] Syncing with peers...");
        if let Err(e) = node.sync_with_peers().await {
            warn!("[{address}] Sync warning: {e}");
        }
    }

    let chain = node.chain_snapshot();
    info!("Address: {address}");
    info!("Wallet address: {}", node.wallet().address());
    info!("Chain length: {} blocks", chain.length());
    info!(
        "Balance: {:.2} coins",
        chain.get_balance(node.wallet().address())
    );
    info!("Peers: {:?}", node.get_peers());
    drop(chain);

    server::serve(node).await
}
