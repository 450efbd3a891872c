// Scripted walkthrough of the ledger library: wallets, signed transfers,
// and the validation failures the chain is built to reject. Runs entirely
// in-process, no networking.

use account_chain::{Chain, Mempool, Result, Transaction, Wallet};
use log::{error, LevelFilter};
use std::process;

fn main() {
    env_logger::builder().filter_level(LevelFilter::Warn).init();

    if let Err(e) = run() {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    println!("=== BLOCKCHAIN WITH TRANSACTIONS ===");

    let difficulty = 3;
    let mining_reward = 50.0;
    let mut chain = Chain::new(difficulty, mining_reward)?;
    let mempool = Mempool::new();

    println!("Creating wallets...");
    let alice = Wallet::new()?;
    let bob = Wallet::new()?;
    let charlie = Wallet::new()?;
    let miner = Wallet::new()?;

    println!("Alice:   {}...", &alice.address()[..16]);
    println!("Bob:     {}...", &bob.address()[..16]);
    println!("Charlie: {}...", &charlie.address()[..16]);
    println!("Miner:   {}...\n", &miner.address()[..16]);

    for wallet in [&alice, &bob, &charlie, &miner] {
        chain.register_public_key(wallet.address(), wallet.public_key().to_vec());
    }

    println!("Block 1: Mining reward to Alice...");
    chain.add_block(&[], alice.address())?;
    print_balances(&chain, &[&alice, &bob, &charlie, &miner]);

    println!("\nBlock 2: Alice sends 15 coins to Bob...");
    let mut tx1 = Transaction::new(alice.address(), bob.address(), 15.0);
    tx1.sign(alice.pkcs8())?;
    mempool.add(tx1)?;

    chain.add_block(&mempool.get_all(), miner.address())?;
    mempool.clear();
    print_balances(&chain, &[&alice, &bob, &charlie, &miner]);

    println!("\nBlock 3: Multiple transactions...");
    let mut tx2 = Transaction::new(bob.address(), charlie.address(), 5.0);
    tx2.sign(bob.pkcs8())?;
    let mut tx3 = Transaction::new(alice.address(), charlie.address(), 10.0);
    tx3.sign(alice.pkcs8())?;
    mempool.add(tx2)?;
    mempool.add(tx3)?;

    chain.add_block(&mempool.get_all(), miner.address())?;
    mempool.clear();
    print_balances(&chain, &[&alice, &bob, &charlie, &miner]);

    println!("\n=== BLOCKCHAIN SUMMARY ===");
    for block in &chain.blocks {
        println!("\nBlock #{} (Hash: {}...)", block.index, &block.hash[..16]);
        println!("  Transactions: {}", block.transactions.len());
        for (i, tx) in block.transactions.iter().enumerate() {
            if tx.is_coinbase() {
                println!(
                    "    {}. COINBASE -> {}...: {:.2} coins",
                    i + 1,
                    &tx.to[..16],
                    tx.amount
                );
            } else {
                println!(
                    "    {}. {}... -> {}...: {:.2} coins",
                    i + 1,
                    &tx.from[..16],
                    &tx.to[..16],
                    tx.amount
                );
            }
        }
    }

    println!("\nBlockchain valid? {}", chain.is_valid());

    println!("\n=== TESTING INSUFFICIENT FUNDS ===");
    let mut invalid_tx = Transaction::new(charlie.address(), bob.address(), 1000.0);
    invalid_tx.sign(charlie.pkcs8())?;
    mempool.add(invalid_tx)?;

    println!(
        "Attempting to send 1000 coins (Charlie only has {:.2})...",
        chain.get_balance(charlie.address())
    );
    match chain.add_block(&mempool.get_all(), miner.address()) {
        Err(e) => println!("Transaction rejected: {e}"),
        Ok(()) => println!("ERROR: Invalid transaction was accepted!"),
    }
    mempool.clear();
    print_balances(&chain, &[&alice, &bob, &charlie, &miner]);

    println!("\n=== TESTING UNSIGNED TRANSACTION ===");
    let unsigned_tx = Transaction::new(alice.address(), bob.address(), 5.0);
    match mempool.add(unsigned_tx) {
        Err(e) => println!("Mempool rejected: {e}"),
        Ok(()) => println!("ERROR: Unsigned transaction was accepted!"),
    }
    mempool.clear();

    println!("\n=== TESTING DOUBLE SPENDING ===");
    let mut double_spend_tx1 = Transaction::new(alice.address(), bob.address(), 20.0);
    double_spend_tx1.sign(alice.pkcs8())?;
    let mut double_spend_tx2 = Transaction::new(alice.address(), charlie.address(), 20.0);
    double_spend_tx2.sign(alice.pkcs8())?;
    mempool.add(double_spend_tx1)?;
    mempool.add(double_spend_tx2)?;

    println!(
        "Attempting double spend (Alice has {:.2}, trying to spend 40.0)...",
        chain.get_balance(alice.address())
    );
    match chain.add_block(&mempool.get_all(), miner.address()) {
        Err(e) => println!("Double spending rejected: {e}"),
        Ok(()) => println!("ERROR: Double spending was accepted!"),
    }
    mempool.clear();

    Ok(())
}

fn print_balances(chain: &Chain, wallets: &[&Wallet]) {
    println!("Balances:");
    let names = ["Alice", "Bob", "Charlie", "Miner"];
    for (name, wallet) in names.iter().zip(wallets) {
        println!("  {}: {:.2} coins", name, chain.get_balance(wallet.address()));
    }
}
