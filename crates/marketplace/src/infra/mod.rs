//! Adapters connecting the boundary traits to a node, a wallet and the disk.

pub mod blockchain;
pub mod store;
pub mod wallet;
