// src/services/mod.rs
pub mod api_server;
pub mod auth;
pub mod credential_issuer;
pub mod verifier;
