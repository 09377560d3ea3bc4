//! This crate is intended to contain code that is required to provide or
//! improve the observability of the marketplace. For now that is the logging
//! initialization shared by the binary and the tests.
pub mod config;
pub mod tracing;

pub use config::Config;
