//! Contains the models exchanged between makers, takers and the exchange
//! contract.

pub mod eip712;
pub mod interaction;
pub mod order;
pub mod signature;
pub mod trade;

pub use eip712::{Domain, DomainSeparator};

/// The EIP-712 domain name of the exchange contract.
pub const EXCHANGE_NAME: &str = "Wyvern Exchange";

/// The EIP-712 domain version of the exchange contract.
pub const EXCHANGE_VERSION: &str = "3.1";
