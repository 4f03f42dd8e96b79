//! Soulreg Identity - soulbound identity tokens.
//!
//! The registry owner issues each wallet at most one identity token carrying
//! an [`IdentityRecord`]. The token is bound to the wallet for good: there is
//! no burn, no re-issue, and every transfer attempt fails with
//! `SoulboundViolation` before any other check runs.

#![deny(unsafe_code)]

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soulreg_access::AccessControl;
use soulreg_token::TokenLedger;
use soulreg_types::{Address, RegistryError, RegistryEvent, RegistryResult, TokenId};
use tracing::info;

/// Message carried by every rejected identity transfer.
pub const IDENTITY_TRANSFER_REJECTION: &str = "SBT: non-transferable token";

/// The identity attributes bound to a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub identifier: String,
    pub birthdate: String,
    pub fullname: String,
}

impl IdentityRecord {
    pub fn new(
        identifier: impl Into<String>,
        birthdate: impl Into<String>,
        fullname: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            birthdate: birthdate.into(),
            fullname: fullname.into(),
        }
    }
}

/// An issued identity token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedIdentity {
    pub token_id: TokenId,
    pub holder: Address,
    pub record: IdentityRecord,
    pub issued_at: DateTime<Utc>,
}

pub struct SoulboundIdentity {
    access: AccessControl,
    tokens: TokenLedger,
    wallet_to_token: HashMap<Address, TokenId>,
    identities: HashMap<TokenId, IssuedIdentity>,
}

impl SoulboundIdentity {
    pub fn new(owner: Address) -> RegistryResult<Self> {
        Ok(Self {
            access: AccessControl::new(owner)?,
            tokens: TokenLedger::soulbound(IDENTITY_TRANSFER_REJECTION),
            wallet_to_token: HashMap::new(),
            identities: HashMap::new(),
        })
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Mint an identity token to `subject`. Owner only, once per wallet.
    pub fn issue_identity(
        &mut self,
        caller: &Address,
        subject: Address,
        record: IdentityRecord,
    ) -> RegistryResult<(TokenId, RegistryEvent)> {
        self.access.require_owner(caller)?;
        if self.wallet_to_token.contains_key(&subject) {
            return Err(RegistryError::AlreadyIssued(subject));
        }

        let token_id = self.tokens.mint(subject)?;
        self.wallet_to_token.insert(subject, token_id);
        self.identities.insert(
            token_id,
            IssuedIdentity {
                token_id,
                holder: subject,
                record,
                issued_at: Utc::now(),
            },
        );
        info!(subject = %subject, token_id = %token_id, "Identity issued");

        Ok((token_id, RegistryEvent::IdentityIssued { subject, token_id }))
    }

    pub fn get_identity(&self, subject: &Address) -> RegistryResult<&IdentityRecord> {
        self.issued(subject)
            .map(|issued| &issued.record)
            .ok_or_else(|| RegistryError::NotFound(format!("identity for {}", subject)))
    }

    /// Full issuance details for `subject`, if any.
    pub fn issued(&self, subject: &Address) -> Option<&IssuedIdentity> {
        self.wallet_to_token
            .get(subject)
            .and_then(|token_id| self.identities.get(token_id))
    }

    pub fn wallet_to_token(&self, subject: &Address) -> Option<TokenId> {
        self.wallet_to_token.get(subject).copied()
    }

    pub fn identity_of(&self, token_id: TokenId) -> RegistryResult<&IssuedIdentity> {
        self.identities
            .get(&token_id)
            .ok_or_else(|| RegistryError::NotFound(format!("identity token {}", token_id)))
    }

    pub fn owner_of(&self, token_id: TokenId) -> RegistryResult<Address> {
        self.tokens.owner_of(token_id)
    }

    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.tokens.balance_of(holder)
    }

    pub fn total_supply(&self) -> u64 {
        self.tokens.total_supply()
    }

    /// Always fails with `SoulboundViolation`.
    pub fn transfer(&mut self, caller: &Address, to: Address, token_id: TokenId) -> RegistryResult<()> {
        self.tokens.transfer(caller, to, token_id)
    }

    /// Always fails with `SoulboundViolation`.
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: Address,
        to: Address,
        token_id: TokenId,
    ) -> RegistryResult<()> {
        self.tokens.transfer_from(caller, from, to, token_id)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    fn alice() -> IdentityRecord {
        IdentityRecord::new("uid123", "01/01/1990", "Alice")
    }

    #[test]
    fn owner_issues_identity() {
        let owner = addr(1);
        let mut sbt = SoulboundIdentity::new(owner).unwrap();

        let (token_id, event) = sbt.issue_identity(&owner, owner, alice()).unwrap();
        assert_eq!(token_id, TokenId(1));
        assert_eq!(
            event,
            RegistryEvent::IdentityIssued {
                subject: owner,
                token_id: TokenId(1),
            }
        );

        let identity = sbt.get_identity(&owner).unwrap();
        assert_eq!(identity.identifier, "uid123");
        assert_eq!(identity.birthdate, "01/01/1990");
        assert_eq!(identity.fullname, "Alice");
        assert_eq!(sbt.wallet_to_token(&owner), Some(TokenId(1)));
        assert_eq!(sbt.owner_of(TokenId(1)).unwrap(), owner);
        assert_eq!(sbt.balance_of(&owner), 1);
    }

    #[test]
    fn non_owner_cannot_issue() {
        let mut sbt = SoulboundIdentity::new(addr(1)).unwrap();
        assert_eq!(
            sbt.issue_identity(&addr(2), addr(2), alice()),
            Err(RegistryError::Unauthorized(addr(2)))
        );
        assert_eq!(sbt.total_supply(), 0);
        assert!(matches!(
            sbt.get_identity(&addr(2)),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn second_issue_is_rejected_and_first_record_kept() {
        let mut sbt = SoulboundIdentity::new(addr(1)).unwrap();
        sbt.issue_identity(&addr(1), addr(2), alice()).unwrap();

        let result = sbt.issue_identity(
            &addr(1),
            addr(2),
            IdentityRecord::new("uid999", "02/02/2000", "Mallory"),
        );
        assert_eq!(result, Err(RegistryError::AlreadyIssued(addr(2))));
        assert_eq!(sbt.get_identity(&addr(2)).unwrap(), &alice());
        assert_eq!(sbt.total_supply(), 1);
    }

    #[test]
    fn issuing_to_zero_address_is_rejected() {
        let mut sbt = SoulboundIdentity::new(addr(1)).unwrap();
        assert_eq!(
            sbt.issue_identity(&addr(1), Address::ZERO, alice()),
            Err(RegistryError::InvalidRecipient(Address::ZERO))
        );
        assert_eq!(sbt.wallet_to_token(&Address::ZERO), None);
    }

    #[test]
    fn transfers_are_rejected_with_stable_message() {
        let owner = addr(1);
        let mut sbt = SoulboundIdentity::new(owner).unwrap();
        sbt.issue_identity(&owner, owner, alice()).unwrap();
        let token_id = sbt.wallet_to_token(&owner).unwrap();

        let err = sbt
            .transfer_from(&owner, owner, addr(2), token_id)
            .unwrap_err();
        assert_eq!(err, RegistryError::SoulboundViolation(IDENTITY_TRANSFER_REJECTION));
        assert_eq!(err.to_string(), "SBT: non-transferable token");

        assert!(sbt.transfer(&owner, addr(2), token_id).is_err());
        assert_eq!(sbt.owner_of(token_id).unwrap(), owner);
    }

    #[test]
    fn issued_details_are_reachable_by_token() {
        let mut sbt = SoulboundIdentity::new(addr(1)).unwrap();
        sbt.issue_identity(&addr(1), addr(2), alice()).unwrap();
        sbt.issue_identity(&addr(1), addr(3), IdentityRecord::new("uid2", "x", "Bob"))
            .unwrap();

        let issued = sbt.identity_of(TokenId(2)).unwrap();
        assert_eq!(issued.holder, addr(3));
        assert_eq!(issued.record.fullname, "Bob");
        assert!(sbt.identity_of(TokenId(3)).is_err());
    }

    proptest! {
        #[test]
        fn one_identity_per_wallet(wallets in proptest::collection::vec(2u64..6, 1..20)) {
            let mut sbt = SoulboundIdentity::new(addr(1)).unwrap();
            let mut first_ids = HashMap::new();

            for (i, wallet) in wallets.iter().enumerate() {
                let record = IdentityRecord::new(format!("uid{i}"), "01/01/1990", "Holder");
                let result = sbt.issue_identity(&addr(1), addr(*wallet), record);
                if first_ids.contains_key(wallet) {
                    prop_assert_eq!(result, Err(RegistryError::AlreadyIssued(addr(*wallet))));
                } else {
                    prop_assert!(result.is_ok());
                    first_ids.insert(*wallet, format!("uid{i}"));
                }
            }

            for (wallet, identifier) in &first_ids {
                prop_assert_eq!(&sbt.get_identity(&addr(*wallet)).unwrap().identifier, identifier);
                prop_assert_eq!(sbt.balance_of(&addr(*wallet)), 1);
            }
            prop_assert_eq!(sbt.total_supply(), first_ids.len() as u64);
        }
    }
}
