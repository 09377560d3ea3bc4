//! Contract bindings for the Wyvern v3.1 exchange, its proxy registry and
//! static validator, and the token standards traded through them.

pub mod alloy;
