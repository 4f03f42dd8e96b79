//! Soulreg Token - the token ledger shared by the identity and report
//! registries.
//!
//! A [`TokenLedger`] hands out token ids from a monotonic counter and tracks
//! who holds each one. Whether a token may ever change hands is decided by
//! the ledger's [`TransferPolicy`], which the transfer path checks before
//! anything else: a soulbound ledger rejects every transfer without looking
//! at the token, the caller or the recipient.

#![deny(unsafe_code)]

use std::collections::{BTreeMap, HashMap};

use soulreg_types::{Address, RegistryError, RegistryResult, TokenId};
use tracing::{debug, warn};

/// Whether tokens on a ledger can move after mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferPolicy {
    /// The holder may hand the token to another address.
    Transferable,
    /// Tokens stay with the address they were minted to. `reason` is the
    /// fixed message every rejected transfer carries.
    Soulbound { reason: &'static str },
}

#[derive(Clone, Debug)]
pub struct TokenLedger {
    policy: TransferPolicy,
    next_id: TokenId,
    holders: BTreeMap<TokenId, Address>,
    balances: HashMap<Address, u64>,
}

impl TokenLedger {
    pub fn new(policy: TransferPolicy) -> Self {
        Self {
            policy,
            next_id: TokenId::FIRST,
            holders: BTreeMap::new(),
            balances: HashMap::new(),
        }
    }

    /// A ledger whose tokens can never be transferred.
    pub fn soulbound(reason: &'static str) -> Self {
        Self::new(TransferPolicy::Soulbound { reason })
    }

    /// Mint the next token id to `to`.
    ///
    /// Fails before touching the counter when `to` is the zero address.
    pub fn mint(&mut self, to: Address) -> RegistryResult<TokenId> {
        if to.is_zero() {
            return Err(RegistryError::InvalidRecipient(to));
        }

        let token_id = self.next_id;
        self.next_id = token_id.next();
        self.holders.insert(token_id, to);
        *self.balances.entry(to).or_insert(0) += 1;

        debug!(token_id = %token_id, holder = %to, "Token minted");
        Ok(token_id)
    }

    pub fn owner_of(&self, token_id: TokenId) -> RegistryResult<Address> {
        self.holders
            .get(&token_id)
            .copied()
            .ok_or_else(|| RegistryError::NotFound(format!("token {}", token_id)))
    }

    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> u64 {
        self.holders.len() as u64
    }

    /// Tokens held by `holder`, in mint order.
    pub fn tokens_of(&self, holder: &Address) -> Vec<TokenId> {
        self.holders
            .iter()
            .filter(|(_, h)| *h == holder)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Move `token_id` from the caller to `to`.
    pub fn transfer(
        &mut self,
        caller: &Address,
        to: Address,
        token_id: TokenId,
    ) -> RegistryResult<()> {
        self.transfer_from(caller, *caller, to, token_id)
    }

    /// Move `token_id` from `from` to `to` on behalf of `caller`.
    ///
    /// The transfer policy is evaluated first. On a soulbound ledger this
    /// always fails with `SoulboundViolation`, whatever the token's state.
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: Address,
        to: Address,
        token_id: TokenId,
    ) -> RegistryResult<()> {
        if let TransferPolicy::Soulbound { reason } = self.policy {
            warn!(
                caller = %caller,
                from = %from,
                to = %to,
                token_id = %token_id,
                "Transfer of soulbound token rejected"
            );
            return Err(RegistryError::SoulboundViolation(reason));
        }

        let holder = self.owner_of(token_id)?;
        if holder != from || holder != *caller {
            return Err(RegistryError::NotTokenOwner {
                caller: *caller,
                token_id,
            });
        }
        if to.is_zero() {
            return Err(RegistryError::InvalidRecipient(to));
        }

        self.holders.insert(token_id, to);
        if let Some(balance) = self.balances.get_mut(&from) {
            *balance -= 1;
        }
        *self.balances.entry(to).or_insert(0) += 1;

        debug!(token_id = %token_id, from = %from, to = %to, "Token transferred");
        Ok(())
    }
}
