// src/main.rs

//! # Credential Registry - Main Entry Point
//!
//! Permissioned registry in which authorized universities and employers
//! issue non-transferable degree and work-experience records to subjects,
//! and subjects maintain a self-authored profile.
//!
//! ## Architecture Overview
//! 1. **Contracts Layer**: `CredentialRegistry` state machine (authorization,
//!    records, asset ledger, ownership index, profiles, event log)
//! 2. **Ledger Layer**: `Ledger` for atomic transitions, snapshots and event broadcast
//! 3. **Services Layer**: Issuance, verification, authentication and API endpoints
//! 4. **Storage Layer**: JSON snapshot file for durability across restarts
//!
//! ## Usage
//! - `credential-registry` starts the API server
//! - `credential-registry keygen` prints a fresh identity and its private key
//! - `credential-registry login-payload <private-key-hex>` prints a signed
//!   `/login` request body for that key
//!
//! ## Environment Variables
//! - `REGISTRY_ADMIN`: Administrator identity (required)
//! - `REGISTRY_JWT_SECRET`: Bearer token signing secret (required)
//! - `REGISTRY_STATE_PATH`: (Optional) Snapshot file; in-memory if unset
//! - `REGISTRY_BIND_ADDR`: (Optional) Listen address (default: 127.0.0.1:3000)
//! - `RUST_LOG`: (Optional) Log filter (default: info)

use crate::blockchain::ledger::Ledger;
use crate::contracts::credential_registry::CredentialRegistry;
use crate::services::api_server::{ApiServer, LoginRequest};
use crate::services::auth::{login_message, Authenticator};
use crate::services::credential_issuer::CredentialIssuer;
use crate::services::verifier::Verifier;
use crate::settings::Settings;
use crate::storage::state_file::StateFile;
use crate::wallet::key_management::KeyManager;
use anyhow::Context;
use dotenv::dotenv;
use log::{debug, info, warn};
use tokio::sync::broadcast::error::RecvError;

// Module declarations (organized by functional domain)
mod blockchain;    // Ledger substrate
mod contracts;     // Registry state machine
mod error;         // Shared error type
mod models;        // Data structures
mod services;      // Business logic and API
mod settings;      // Runtime configuration
mod storage;       // Snapshot persistence
mod utils;         // Helper functions
mod wallet;        // Cryptographic key operations

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("serve") => serve().await,
        Some("keygen") => {
            let keys = KeyManager::new();
            println!("identity:    {}", keys.identity());
            println!("private key: {}", keys.secret_hex());
            Ok(())
        }
        Some("login-payload") => {
            let secret = args
                .get(1)
                .context("usage: credential-registry login-payload <private-key-hex>")?;
            let keys = KeyManager::from_hex(secret)?;
            let issued_at = chrono::Utc::now().timestamp();
            let signature = keys.sign_message(login_message(&keys.identity(), issued_at).as_bytes())?;
            let payload = LoginRequest {
                identity: keys.identity(),
                issued_at,
                signature: signature.to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Some(other) => anyhow::bail!("unknown command: {}", other),
    }
}

/// Loads settings and state, then runs the API server.
///
/// # Initialization Sequence
/// 1. Load configuration
/// 2. Restore the registry snapshot, or start a fresh registry
/// 3. Initialize service components
/// 4. Start API server
async fn serve() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;

    let state_file = settings.state_path.clone().map(StateFile::new);
    let state = match &state_file {
        Some(file) => file
            .load()
            .await
            .with_context(|| format!("failed to load state from {}", file.path().display()))?,
        None => None,
    };
    let state = match state {
        Some(state) => {
            if state.administrator() != settings.admin {
                warn!(
                    "configured administrator {} ignored; snapshot is administered by {}",
                    settings.admin,
                    state.administrator()
                );
            }
            info!("restored registry with {} records", state.total_supply());
            state
        }
        None => {
            info!("starting fresh registry administered by {}", settings.admin);
            CredentialRegistry::new(settings.admin)
        }
    };

    let ledger = Ledger::new(state, state_file, settings.event_buffer);
    let authenticator = Authenticator::new(
        &settings.jwt_secret,
        settings.token_ttl_secs,
        settings.login_max_age_secs,
    );
    let verifier = Verifier::new(ledger.clone());
    let api_server = ApiServer::new(CredentialIssuer::new(ledger), verifier.clone(), authenticator);

    // Audit trail of committed events
    let mut events = verifier.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(record) => debug!("event #{}: {:?}", record.sequence, record.event),
                Err(RecvError::Lagged(skipped)) => warn!("event audit skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!("API server running at http://{}", settings.bind_addr);
    api_server
        .run(settings.bind_addr)
        .await
        .context("API server failed")
}
