// src/storage/mod.rs
pub mod state_file;
