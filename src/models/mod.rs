// src/models/mod.rs
//! Data structures shared by the registry state, services and API.

pub mod event;
pub mod identity;
pub mod profile;
pub mod record;
