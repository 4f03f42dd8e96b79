//! Soulreg Keys - one generated key per wallet.
//!
//! Only the registry owner can register a wallet. Registration derives a
//! fresh Ed25519 key pair and stores the public half; the secret seed is
//! wiped as soon as the public key is computed. Anyone can fetch a wallet's
//! key, and wallets that were never registered read back as
//! [`IdentityKey::ZERO`].

#![deny(unsafe_code)]

mod entropy;

pub use entropy::{EntropySource, OsEntropy, SeededEntropy};

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use soulreg_access::AccessControl;
use soulreg_types::{Address, IdentityKey, RegistryError, RegistryEvent, RegistryResult};
use tracing::{debug, info};
use zeroize::Zeroize;

/// BLAKE3 derive-key context for key seeds.
const KEY_SEED_CONTEXT: &str = "soulreg key registry 2024-06-01 identity key seed";

/// A registered wallet key with its registration metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    pub key: IdentityKey,
    pub nonce: u64,
    pub registered_at: DateTime<Utc>,
}

pub struct KeyRegistry {
    access: AccessControl,
    keys: HashMap<Address, KeyRecord>,
    /// Bumped on every derivation attempt
    nonce: u64,
    entropy: Box<dyn EntropySource>,
}

impl KeyRegistry {
    /// Create a registry owned by `owner`, drawing entropy from the OS.
    pub fn new(owner: Address) -> RegistryResult<Self> {
        Self::with_entropy(owner, Box::new(OsEntropy))
    }

    pub fn with_entropy(owner: Address, entropy: Box<dyn EntropySource>) -> RegistryResult<Self> {
        Ok(Self {
            access: AccessControl::new(owner)?,
            keys: HashMap::new(),
            nonce: 0,
            entropy,
        })
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Generate and store a key for `subject`. Owner only.
    ///
    /// A wallet is registered at most once: a second registration fails with
    /// `AlreadyRegistered` and the first key stays in place. Returns the new
    /// key with its `KeyCreated` event.
    pub fn register_user(
        &mut self,
        caller: &Address,
        subject: Address,
    ) -> RegistryResult<(IdentityKey, RegistryEvent)> {
        self.access.require_owner(caller)?;
        if self.keys.contains_key(&subject) {
            return Err(RegistryError::AlreadyRegistered(subject));
        }

        let registered_at = Utc::now();
        let key = loop {
            self.nonce += 1;
            let candidate = self.derive_key(&subject, registered_at);
            if !candidate.is_zero() {
                break candidate;
            }
        };

        self.keys.insert(
            subject,
            KeyRecord {
                key,
                nonce: self.nonce,
                registered_at,
            },
        );
        info!(subject = %subject, key = %key, "Key created");

        Ok((key, RegistryEvent::KeyCreated { subject, key }))
    }

    /// The key registered for `subject`, or the zero sentinel.
    pub fn fetch_key(&self, subject: &Address) -> IdentityKey {
        let key = self
            .keys
            .get(subject)
            .map(|record| record.key)
            .unwrap_or(IdentityKey::ZERO);
        debug!(subject = %subject, registered = !key.is_zero(), "Key fetched");
        key
    }

    pub fn record(&self, subject: &Address) -> Option<&KeyRecord> {
        self.keys.get(subject)
    }

    pub fn is_registered(&self, subject: &Address) -> bool {
        self.keys.contains_key(subject)
    }

    pub fn registered_count(&self) -> usize {
        self.keys.len()
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> RegistryResult<RegistryEvent> {
        self.access.transfer_ownership(caller, new_owner)
    }

    pub fn accept_ownership(&mut self, caller: &Address) -> RegistryResult<RegistryEvent> {
        self.access.accept_ownership(caller)
    }

    fn derive_key(&mut self, subject: &Address, at: DateTime<Utc>) -> IdentityKey {
        let mut entropy = [0u8; 32];
        self.entropy.fill(&mut entropy);

        let mut hasher = blake3::Hasher::new_derive_key(KEY_SEED_CONTEXT);
        hasher.update(&entropy);
        hasher.update(subject.as_bytes());
        hasher.update(&self.nonce.to_le_bytes());
        hasher.update(&at.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());

        let mut seed = *hasher.finalize().as_bytes();
        let signing_key = SigningKey::from_bytes(&seed);
        seed.zeroize();
        entropy.zeroize();

        IdentityKey::from_bytes(signing_key.verifying_key().to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    fn registry() -> KeyRegistry {
        KeyRegistry::with_entropy(addr(1), Box::new(SeededEntropy::new(7))).unwrap()
    }

    #[test]
    fn owner_registers_a_user() {
        let mut keys = registry();
        let (key, event) = keys.register_user(&addr(1), addr(2)).unwrap();

        assert!(!key.is_zero());
        assert_eq!(keys.fetch_key(&addr(2)), key);
        assert_eq!(
            event,
            RegistryEvent::KeyCreated {
                subject: addr(2),
                key,
            }
        );
        assert!(keys.is_registered(&addr(2)));
    }

    #[test]
    fn non_owner_cannot_register() {
        let mut keys = registry();
        assert_eq!(
            keys.register_user(&addr(2), addr(2)),
            Err(RegistryError::Unauthorized(addr(2)))
        );
        assert!(keys.fetch_key(&addr(2)).is_zero());
        assert_eq!(keys.registered_count(), 0);
    }

    #[test]
    fn re_registration_keeps_the_first_key() {
        let mut keys = registry();
        keys.register_user(&addr(1), addr(2)).unwrap();
        let first = keys.fetch_key(&addr(2));

        assert_eq!(
            keys.register_user(&addr(1), addr(2)),
            Err(RegistryError::AlreadyRegistered(addr(2)))
        );
        assert_eq!(keys.fetch_key(&addr(2)), first);
    }

    #[test]
    fn unregistered_wallet_reads_zero() {
        let keys = registry();
        assert_eq!(keys.fetch_key(&addr(99)), IdentityKey::ZERO);
        assert!(keys.record(&addr(99)).is_none());
    }

    #[test]
    fn fetch_is_stable() {
        let mut keys = KeyRegistry::new(addr(1)).unwrap();
        keys.register_user(&addr(1), addr(5)).unwrap();
        assert_eq!(keys.fetch_key(&addr(5)), keys.fetch_key(&addr(5)));
    }

    #[test]
    fn new_owner_registers_after_hand_off() {
        let mut keys = registry();
        keys.transfer_ownership(&addr(1), addr(3)).unwrap();
        keys.accept_ownership(&addr(3)).unwrap();

        assert!(keys.register_user(&addr(1), addr(4)).is_err());
        keys.register_user(&addr(3), addr(4)).unwrap();
        assert_eq!(keys.access().owner(), addr(3));
    }

    proptest! {
        #[test]
        fn keys_are_distinct_and_never_zero(
            subjects in proptest::collection::hash_set(2u64..10_000, 1..24),
            seed in any::<u64>(),
        ) {
            let mut keys =
                KeyRegistry::with_entropy(addr(1), Box::new(SeededEntropy::new(seed))).unwrap();
            let mut seen = HashSet::new();
            for subject in &subjects {
                keys.register_user(&addr(1), addr(*subject)).unwrap();
                let key = keys.fetch_key(&addr(*subject));
                prop_assert!(!key.is_zero());
                prop_assert!(seen.insert(key));
            }
            prop_assert_eq!(keys.registered_count(), subjects.len());
        }
    }
}
