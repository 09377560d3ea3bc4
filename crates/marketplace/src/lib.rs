pub mod arguments;
pub mod boundary;
pub mod deployment;
pub mod error;
pub mod infra;
pub mod listing;
pub mod market;
pub mod matcher;
pub mod open_orders;
pub mod order_book;
pub mod preconditions;
pub mod run;
pub mod session;
pub mod settlement;
pub mod signer;
pub mod validator;

pub use error::{Error, Side};
