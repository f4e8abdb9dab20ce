// src/blockchain/mod.rs
pub mod ledger;
