//! Soulreg Types - the shared vocabulary of the registry.
//!
//! Every registry component speaks in terms of wallet [`Address`]es, minted
//! [`TokenId`]s and generated [`IdentityKey`]s, reports success through a
//! [`RegistryEvent`] and failure through a [`RegistryError`]. Nothing in this
//! crate holds state.

#![deny(unsafe_code)]

mod address;
mod error;
mod event;

pub use address::Address;
pub use error::{RegistryError, RegistryResult};
pub use event::{Component, RegistryEvent};

use serde::{Deserialize, Serialize};

/// Identifier of a minted token. Assigned by a ledger's monotonic counter,
/// starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub u64);

impl TokenId {
    /// The first id a fresh ledger hands out.
    pub const FIRST: TokenId = TokenId(1);

    pub fn next(self) -> TokenId {
        TokenId(self.0 + 1)
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque 32-byte key bound to a wallet by the key registry.
///
/// The all-zero value is reserved as the "no key" sentinel returned for
/// addresses that were never registered.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey([u8; 32]);

impl IdentityKey {
    pub const ZERO: IdentityKey = IdentityKey([0u8; 32]);

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IdentityKey({})", self)
    }
}

impl Serialize for IdentityKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IdentityKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let digits = text.strip_prefix("0x").unwrap_or(&text);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_ids_start_at_one() {
        assert_eq!(TokenId::FIRST, TokenId(1));
        assert_eq!(TokenId::FIRST.next(), TokenId(2));
    }

    #[test]
    fn zero_key_is_the_sentinel() {
        assert!(IdentityKey::ZERO.is_zero());
        assert!(!IdentityKey::from_bytes([7u8; 32]).is_zero());
    }

    #[test]
    fn identity_key_serializes_as_prefixed_hex() {
        let key = IdentityKey::from_bytes([0xab; 32]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(32)));

        let back: IdentityKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
