//! Soulreg Access - the single-owner authorization primitive.
//!
//! Each registry component embeds one [`AccessControl`]. Owner-gated
//! operations call [`AccessControl::require_owner`] before touching any
//! state, so a rejected caller never causes a write.
//!
//! Ownership moves only through a two-step hand-off: the current owner
//! proposes a successor with [`AccessControl::transfer_ownership`], and the
//! successor takes over by calling [`AccessControl::accept_ownership`]
//! themselves. A mistyped successor address therefore never locks the
//! component.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};
use soulreg_types::{Address, RegistryError, RegistryEvent, RegistryResult};
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    owner: Address,
    pending_owner: Option<Address>,
}

impl AccessControl {
    /// Create an access gate owned by `owner`. The zero address is refused.
    pub fn new(owner: Address) -> RegistryResult<Self> {
        if owner.is_zero() {
            return Err(RegistryError::InvalidOwner(owner));
        }
        Ok(Self {
            owner,
            pending_owner: None,
        })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn pending_owner(&self) -> Option<Address> {
        self.pending_owner
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        *caller == self.owner
    }

    /// Fail with `Unauthorized` unless `caller` is the owner.
    pub fn require_owner(&self, caller: &Address) -> RegistryResult<()> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            warn!(caller = %caller, owner = %self.owner, "Owner check rejected caller");
            Err(RegistryError::Unauthorized(*caller))
        }
    }

    /// Propose `new_owner` as successor. Replaces any earlier proposal; the
    /// owner stays in charge until the successor accepts.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> RegistryResult<RegistryEvent> {
        self.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(RegistryError::InvalidOwner(new_owner));
        }

        self.pending_owner = Some(new_owner);
        info!(owner = %self.owner, pending = %new_owner, "Ownership transfer started");

        Ok(RegistryEvent::OwnershipTransferStarted {
            previous_owner: self.owner,
            new_owner,
        })
    }

    /// Complete a hand-off. Only the proposed successor may call this.
    pub fn accept_ownership(&mut self, caller: &Address) -> RegistryResult<RegistryEvent> {
        if self.pending_owner != Some(*caller) {
            warn!(caller = %caller, "Ownership acceptance by non-pending account");
            return Err(RegistryError::Unauthorized(*caller));
        }

        let previous_owner = self.owner;
        self.owner = *caller;
        self.pending_owner = None;
        info!(previous = %previous_owner, owner = %self.owner, "Ownership transferred");

        Ok(RegistryEvent::OwnershipTransferred {
            previous_owner,
            new_owner: self.owner,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn owner_passes_and_others_fail() {
        let access = AccessControl::new(addr(1)).unwrap();
        assert!(access.require_owner(&addr(1)).is_ok());
        assert_eq!(
            access.require_owner(&addr(2)),
            Err(RegistryError::Unauthorized(addr(2)))
        );
    }

    #[test]
    fn zero_owner_is_refused() {
        assert_eq!(
            AccessControl::new(Address::ZERO),
            Err(RegistryError::InvalidOwner(Address::ZERO))
        );
    }

    #[test]
    fn two_step_hand_off() {
        let mut access = AccessControl::new(addr(1)).unwrap();

        let started = access.transfer_ownership(&addr(1), addr(2)).unwrap();
        assert_eq!(
            started,
            RegistryEvent::OwnershipTransferStarted {
                previous_owner: addr(1),
                new_owner: addr(2),
            }
        );
        // Proposal alone changes nothing.
        assert_eq!(access.owner(), addr(1));
        assert_eq!(access.pending_owner(), Some(addr(2)));

        let done = access.accept_ownership(&addr(2)).unwrap();
        assert_eq!(
            done,
            RegistryEvent::OwnershipTransferred {
                previous_owner: addr(1),
                new_owner: addr(2),
            }
        );
        assert_eq!(access.owner(), addr(2));
        assert_eq!(access.pending_owner(), None);
        assert!(access.require_owner(&addr(1)).is_err());
    }

    #[test]
    fn only_owner_may_propose() {
        let mut access = AccessControl::new(addr(1)).unwrap();
        assert_eq!(
            access.transfer_ownership(&addr(3), addr(3)),
            Err(RegistryError::Unauthorized(addr(3)))
        );
        assert_eq!(access.pending_owner(), None);
    }

    #[test]
    fn only_pending_owner_may_accept() {
        let mut access = AccessControl::new(addr(1)).unwrap();
        assert!(access.accept_ownership(&addr(2)).is_err());

        access.transfer_ownership(&addr(1), addr(2)).unwrap();
        assert_eq!(
            access.accept_ownership(&addr(3)),
            Err(RegistryError::Unauthorized(addr(3)))
        );
        assert_eq!(access.owner(), addr(1));
    }

    #[test]
    fn later_proposal_replaces_earlier_one() {
        let mut access = AccessControl::new(addr(1)).unwrap();
        access.transfer_ownership(&addr(1), addr(2)).unwrap();
        access.transfer_ownership(&addr(1), addr(3)).unwrap();

        assert!(access.accept_ownership(&addr(2)).is_err());
        access.accept_ownership(&addr(3)).unwrap();
        assert_eq!(access.owner(), addr(3));
    }
}
