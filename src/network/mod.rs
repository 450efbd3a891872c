//! Peer-to-peer networking
//!
//! This module implements the node itself and the HTTP surface it exposes:
//! transaction and block gossip, peer management, and chain synchronization.

pub mod node;
pub mod server;

pub use node::{Node, NODE_ADDRESS_HEADER};
