// src/contracts/mod.rs
//! On-ledger registry state.
//!
//! Each component is a plain owned data structure; [`credential_registry`]
//! composes them into the single state object that the ledger mutates
//! atomically.

pub mod asset_ledger;
pub mod authorization_registry;
pub mod credential_registry;
pub mod ownership_index;
pub mod profile_store;
pub mod record_store;
