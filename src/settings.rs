// src/settings.rs
//! Runtime configuration.
//!
//! Settings are layered, later sources winning:
//! 1. Built-in defaults
//! 2. Optional `registry.{toml,yaml,json}` in the working directory
//! 3. `REGISTRY_*` environment variables (a `.env` file is loaded first)
//!
//! ## Keys
//! - `bind_addr`: HTTP listen address (default `127.0.0.1:3000`)
//! - `admin`: administrator identity, fixed for the life of the registry (required)
//! - `state_path`: snapshot file; unset keeps state in memory only
//! - `jwt_secret`: HMAC secret for bearer tokens (required)
//! - `token_ttl_secs`: bearer token lifetime (default 3600)
//! - `login_max_age_secs`: accepted age of a signed login challenge (default 300)
//! - `event_buffer`: live event channel capacity (default 256)

use crate::error::Result;
use crate::models::identity::Identity;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub admin: Identity,
    pub state_path: Option<PathBuf>,
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    pub login_max_age_secs: i64,
    pub event_buffer: usize,
}

impl Settings {
    /// Loads settings from `registry.*` and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Config::builder().add_source(File::with_name("registry").required(false)))
    }

    fn load_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let settings = builder
            .set_default("bind_addr", "127.0.0.1:3000")?
            .set_default("token_ttl_secs", 3600)?
            .set_default("login_max_age_secs", 300)?
            .set_default("event_buffer", 256)?
            .add_source(Environment::with_prefix("REGISTRY").try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults_fill_optional_keys() {
        let builder = Config::builder().add_source(File::from_str(
            r#"{
                "admin": "0x0000000000000000000000000000000000000001",
                "jwt_secret": "test-secret"
            }"#,
            FileFormat::Json,
        ));

        let settings = Settings::load_from(builder).unwrap();

        assert_eq!(settings.admin, Identity::from_low_u64(1));
        assert_eq!(settings.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(settings.token_ttl_secs, 3600);
        assert_eq!(settings.login_max_age_secs, 300);
        assert_eq!(settings.event_buffer, 256);
        assert!(settings.state_path.is_none());
    }

    #[test]
    fn test_missing_admin_is_an_error() {
        let builder = Config::builder().add_source(File::from_str(
            r#"{ "jwt_secret": "test-secret" }"#,
            FileFormat::Json,
        ));

        assert!(Settings::load_from(builder).is_err());
    }
}
