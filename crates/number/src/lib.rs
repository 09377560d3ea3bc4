//! Number types and helpers shared between the order model and the
//! marketplace flows.

pub mod serialization;
pub mod units;
