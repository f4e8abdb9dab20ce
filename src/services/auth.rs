// src/services/auth.rs
//! Caller authentication for the HTTP transport.
//!
//! The registry core takes the acting identity as an explicit parameter. This
//! module is how the API server establishes that identity:
//! 1. The client signs `login_message(identity, issued_at)` with the key that
//!    controls `identity` (EIP-191 personal message).
//! 2. `POST /login` recovers the signer, checks it matches and that the
//!    challenge is fresh, and returns an HS256 bearer token.
//! 3. Every gated request presents `Authorization: Bearer <token>`; the token
//!    subject is the caller.

use crate::error::{RegistryError, Result};
use crate::models::identity::Identity;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use chrono::Utc;
use ethers_core::types::Signature;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const LOGIN_DOMAIN: &str = "credential-registry login";

/// Text a client signs to log in as `identity`.
pub fn login_message(identity: &Identity, issued_at: i64) -> String {
    format!("{} {} {}", LOGIN_DOMAIN, identity, issued_at)
}

/// Bearer token claims.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: u64,
    exp: u64,
}

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: u64,
    login_max_age_secs: i64,
}

impl Authenticator {
    /// # Arguments
    /// * `secret` - HMAC secret shared by every server instance
    /// * `token_ttl_secs` - Lifetime of issued tokens
    /// * `login_max_age_secs` - Maximum clock distance of a login challenge
    pub fn new(secret: &str, token_ttl_secs: u64, login_max_age_secs: i64) -> Self {
        Authenticator {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_secs,
            login_max_age_secs,
        }
    }

    /// Verifies a signed login challenge and issues a token for `identity`.
    ///
    /// # Errors
    /// - `Unauthenticated` if the challenge is stale or signed by another key
    /// - `Signature` if `signature` is not a valid hex signature
    pub fn login(&self, identity: Identity, issued_at: i64, signature: &str) -> Result<String> {
        let fresh = Utc::now()
            .timestamp()
            .checked_sub(issued_at)
            .is_some_and(|age| age.unsigned_abs() <= self.login_max_age_secs.unsigned_abs());
        if !fresh {
            return Err(RegistryError::Unauthenticated(format!(
                "login challenge issued at {} is outside the accepted window",
                issued_at
            )));
        }

        let signature = Signature::from_str(signature.trim())
            .map_err(|e| RegistryError::Signature(e.to_string()))?;
        let signer = signature
            .recover(login_message(&identity, issued_at))
            .map_err(|e| RegistryError::Signature(e.to_string()))?;
        if Identity::from(signer) != identity {
            return Err(RegistryError::Unauthenticated(
                "signature does not match identity".into(),
            ));
        }

        self.issue_token(identity)
    }

    /// Issues a token whose subject is `identity`.
    pub fn issue_token(&self, identity: Identity) -> Result<String> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            sub: identity.to_string(),
            iat: now,
            exp: now.saturating_add(self.token_ttl_secs),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Returns the identity a valid token was issued to.
    pub fn verify_token(&self, token: &str) -> Result<Identity> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        data.claims
            .sub
            .parse()
            .map_err(|_| RegistryError::Unauthenticated("malformed token subject".into()))
    }

    /// Authenticates the caller of an HTTP request from its bearer token.
    pub fn caller(&self, headers: &HeaderMap) -> Result<Identity> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| RegistryError::Unauthenticated("missing bearer token".into()))?
            .to_str()
            .map_err(|_| RegistryError::Unauthenticated("malformed authorization header".into()))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| RegistryError::Unauthenticated("expected a bearer token".into()))?;
        self.verify_token(token.trim())
    }
}
