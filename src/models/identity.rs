// src/models/identity.rs
//! Caller and subject identity.
//!
//! Every actor in the registry (administrator, issuer, subject) is an
//! Ethereum-style 20-byte address. The zero address is the null identity and
//! is never a valid issuance subject.

use crate::error::RegistryError;
use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque, equality-comparable identity of a registry participant.
///
/// Serialized as a `0x`-prefixed lowercase hex string.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(transparent)]
pub struct Identity(Address);

impl Identity {
    /// The null identity (all-zero address).
    pub fn zero() -> Self {
        Identity(Address::zero())
    }

    /// Returns `true` for the null identity.
    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Deterministic identity for fixtures: the low 8 bytes hold `n`.
    #[cfg(test)]
    pub fn from_low_u64(n: u64) -> Self {
        Identity(Address::from_low_u64_be(n))
    }
}

impl From<Address> for Identity {
    fn from(address: Address) -> Self {
        Identity(address)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl FromStr for Identity {
    type Err = RegistryError;

    /// Parses a hex address, with or without the `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_str(s.trim())
            .map(Identity)
            .map_err(|e| RegistryError::InvalidIdentity(format!("{}: {}", s, e)))
    }
}
