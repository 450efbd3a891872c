//! In-memory storage for pending state
//!
//! This module holds the mempool of validated transactions waiting to be
//! mined. Chain persistence lives with the chain itself.

pub mod mempool;

pub use mempool::Mempool;
