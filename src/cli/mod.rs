//! Command-line interface
//!
//! Argument parsing for the node binary.

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "account-chain", about = "Run an account-model blockchain node")]
pub struct Opt {
    /// Port to run the node on
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Comma-separated list of peer addresses (e.g. localhost:8081,localhost:8082)
    #[arg(long, default_value = "")]
    pub peers: String,

    /// Mining difficulty: leading zero hex digits required of block hashes
    #[arg(long, default_value_t = 3)]
    pub difficulty: u32,

    /// Mining reward paid to the miner of each block
    #[arg(long, default_value_t = 50.0)]
    pub reward: f64,
}
