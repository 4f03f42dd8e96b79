//! Soulreg Service - hosts the registry components for concurrent callers.
//!
//! Each component lives behind its own lock. An operation takes exactly one
//! lock, runs the component's check-and-mutate inside it, and publishes the
//! resulting event before releasing it. Concurrent calls on one component
//! are therefore applied in a single total order, and the event log shows
//! them in that order. Components share no state, so no operation ever
//! holds two component locks.

#![deny(unsafe_code)]

pub mod event_bus;

pub use event_bus::{EventBus, EventEnvelope, DEFAULT_EVENT_CAPACITY};

use serde::{Deserialize, Serialize};
use soulreg_identity::{IdentityRecord, IssuedIdentity, SoulboundIdentity};
use soulreg_keys::{EntropySource, KeyRegistry, OsEntropy};
use soulreg_reports::{NegativeReport, ReportEntry, ReportLedger};
use soulreg_types::{Address, Component, IdentityKey, RegistryResult, TokenId};
use soulreg_voting::{PollTally, VotingPoll};
use tokio::sync::RwLock;
use tracing::info;

/// Construction-time settings for a [`RegistryService`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Owner of the key, identity and report registries
    pub owner: Address,
    /// Poll admin; the owner when unset
    #[serde(default)]
    pub poll_admin: Option<Address>,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl ServiceConfig {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            poll_admin: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn with_poll_admin(mut self, admin: Address) -> Self {
        self.poll_admin = Some(admin);
        self
    }
}

/// The two token ledgers hosted by the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ledger {
    Identity,
    Reports,
}

pub struct RegistryService {
    keys: RwLock<KeyRegistry>,
    identity: RwLock<SoulboundIdentity>,
    reports: RwLock<ReportLedger>,
    voting: RwLock<VotingPoll>,
    bus: EventBus,
}

impl RegistryService {
    pub fn new(config: &ServiceConfig) -> RegistryResult<Self> {
        Self::with_entropy(config, Box::new(OsEntropy))
    }

    /// Build the service with an explicit entropy source for key generation.
    pub fn with_entropy(
        config: &ServiceConfig,
        entropy: Box<dyn EntropySource>,
    ) -> RegistryResult<Self> {
        let admin = config.poll_admin.unwrap_or(config.owner);
        let service = Self {
            keys: RwLock::new(KeyRegistry::with_entropy(config.owner, entropy)?),
            identity: RwLock::new(SoulboundIdentity::new(config.owner)?),
            reports: RwLock::new(ReportLedger::new(config.owner)?),
            voting: RwLock::new(VotingPoll::new(admin)?),
            bus: EventBus::new(config.event_capacity),
        };
        info!(owner = %config.owner, poll_admin = %admin, "Registry service started");
        Ok(service)
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    // =========================================================================
    // KEYS
    // =========================================================================

    pub async fn register_user(
        &self,
        caller: &Address,
        subject: Address,
    ) -> RegistryResult<IdentityKey> {
        let mut keys = self.keys.write().await;
        let (key, event) = keys.register_user(caller, subject)?;
        self.bus.publish(Component::Keys, event).await;
        Ok(key)
    }

    pub async fn fetch_key(&self, subject: &Address) -> IdentityKey {
        self.keys.read().await.fetch_key(subject)
    }

    // =========================================================================
    // IDENTITY
    // =========================================================================

    pub async fn issue_identity(
        &self,
        caller: &Address,
        subject: Address,
        record: IdentityRecord,
    ) -> RegistryResult<TokenId> {
        let mut identity = self.identity.write().await;
        let (token_id, event) = identity.issue_identity(caller, subject, record)?;
        self.bus.publish(Component::Identity, event).await;
        Ok(token_id)
    }

    pub async fn get_identity(&self, subject: &Address) -> RegistryResult<IdentityRecord> {
        self.identity.read().await.get_identity(subject).cloned()
    }

    pub async fn wallet_to_token(&self, subject: &Address) -> Option<TokenId> {
        self.identity.read().await.wallet_to_token(subject)
    }

    pub async fn identity_of(&self, token_id: TokenId) -> RegistryResult<IssuedIdentity> {
        self.identity.read().await.identity_of(token_id).cloned()
    }

    // =========================================================================
    // REPORTS
    // =========================================================================

    pub async fn issue_negative_report(
        &self,
        caller: &Address,
        subject: Address,
        report: NegativeReport,
    ) -> RegistryResult<TokenId> {
        let mut reports = self.reports.write().await;
        let (token_id, event) = reports.issue_negative_report(caller, subject, report)?;
        self.bus.publish(Component::Reports, event).await;
        Ok(token_id)
    }

    pub async fn get_reports(&self, subject: &Address) -> Vec<ReportEntry> {
        self.reports.read().await.get_reports(subject).to_vec()
    }

    pub async fn report_count(&self, subject: &Address) -> usize {
        self.reports.read().await.report_count(subject)
    }

    pub async fn report_by_token(&self, token_id: TokenId) -> RegistryResult<ReportEntry> {
        self.reports.read().await.report_by_token(token_id).cloned()
    }

    // =========================================================================
    // TOKENS
    // =========================================================================

    pub async fn owner_of(&self, ledger: Ledger, token_id: TokenId) -> RegistryResult<Address> {
        match ledger {
            Ledger::Identity => self.identity.read().await.owner_of(token_id),
            Ledger::Reports => self.reports.read().await.owner_of(token_id),
        }
    }

    pub async fn balance_of(&self, ledger: Ledger, holder: &Address) -> u64 {
        match ledger {
            Ledger::Identity => self.identity.read().await.balance_of(holder),
            Ledger::Reports => self.reports.read().await.balance_of(holder),
        }
    }

    pub async fn total_supply(&self, ledger: Ledger) -> u64 {
        match ledger {
            Ledger::Identity => self.identity.read().await.total_supply(),
            Ledger::Reports => self.reports.read().await.total_supply(),
        }
    }

    /// Both ledgers are soulbound, so this always fails.
    pub async fn transfer(
        &self,
        ledger: Ledger,
        caller: &Address,
        to: Address,
        token_id: TokenId,
    ) -> RegistryResult<()> {
        match ledger {
            Ledger::Identity => self.identity.write().await.transfer(caller, to, token_id),
            Ledger::Reports => self.reports.write().await.transfer(caller, to, token_id),
        }
    }

    /// Both ledgers are soulbound, so this always fails.
    pub async fn transfer_from(
        &self,
        ledger: Ledger,
        caller: &Address,
        from: Address,
        to: Address,
        token_id: TokenId,
    ) -> RegistryResult<()> {
        match ledger {
            Ledger::Identity => self
                .identity
                .write()
                .await
                .transfer_from(caller, from, to, token_id),
            Ledger::Reports => self
                .reports
                .write()
                .await
                .transfer_from(caller, from, to, token_id),
        }
    }

    // =========================================================================
    // VOTING
    // =========================================================================

    pub async fn open_poll(&self, caller: &Address) -> RegistryResult<()> {
        let mut voting = self.voting.write().await;
        let event = voting.open_poll(caller)?;
        self.bus.publish(Component::Voting, event).await;
        Ok(())
    }

    pub async fn close_poll(&self, caller: &Address) -> RegistryResult<()> {
        let mut voting = self.voting.write().await;
        let event = voting.close_poll(caller)?;
        self.bus.publish(Component::Voting, event).await;
        Ok(())
    }

    /// Returns `true` when the voter was newly permitted.
    pub async fn grant_permission(&self, caller: &Address, voter: Address) -> RegistryResult<bool> {
        let mut voting = self.voting.write().await;
        match voting.grant_permission(caller, voter)? {
            Some(event) => {
                self.bus.publish(Component::Voting, event).await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn submit_vote(&self, caller: &Address, choice: bool) -> RegistryResult<()> {
        let mut voting = self.voting.write().await;
        let event = voting.submit_vote(caller, choice)?;
        self.bus.publish(Component::Voting, event).await;
        Ok(())
    }

    pub async fn fetch_results(&self) -> PollTally {
        self.voting.read().await.fetch_results()
    }

    pub async fn is_poll_open(&self) -> bool {
        self.voting.read().await.is_open()
    }

    pub async fn is_permitted(&self, voter: &Address) -> bool {
        self.voting.read().await.is_permitted(voter)
    }

    pub async fn has_voted(&self, voter: &Address) -> bool {
        self.voting.read().await.has_voted(voter)
    }

    pub async fn vote_of(&self, voter: &Address) -> Option<bool> {
        self.voting.read().await.vote_of(voter)
    }

    // =========================================================================
    // OWNERSHIP
    // =========================================================================

    pub async fn owner(&self, component: Component) -> Address {
        match component {
            Component::Keys => self.keys.read().await.access().owner(),
            Component::Identity => self.identity.read().await.access().owner(),
            Component::Reports => self.reports.read().await.access().owner(),
            Component::Voting => self.voting.read().await.access().owner(),
        }
    }

    /// The proposed successor awaiting acceptance, if any.
    pub async fn pending_owner(&self, component: Component) -> Option<Address> {
        match component {
            Component::Keys => self.keys.read().await.access().pending_owner(),
            Component::Identity => self.identity.read().await.access().pending_owner(),
            Component::Reports => self.reports.read().await.access().pending_owner(),
            Component::Voting => self.voting.read().await.access().pending_owner(),
        }
    }

    pub async fn transfer_ownership(
        &self,
        component: Component,
        caller: &Address,
        new_owner: Address,
    ) -> RegistryResult<()> {
        match component {
            Component::Keys => {
                let mut keys = self.keys.write().await;
                let event = keys.transfer_ownership(caller, new_owner)?;
                self.bus.publish(component, event).await;
            }
            Component::Identity => {
                let mut identity = self.identity.write().await;
                let event = identity.transfer_ownership(caller, new_owner)?;
                self.bus.publish(component, event).await;
            }
            Component::Reports => {
                let mut reports = self.reports.write().await;
                let event = reports.transfer_ownership(caller, new_owner)?;
                self.bus.publish(component, event).await;
            }
            Component::Voting => {
                let mut voting = self.voting.write().await;
                let event = voting.transfer_ownership(caller, new_owner)?;
                self.bus.publish(component, event).await;
            }
        }
        Ok(())
    }

    pub async fn accept_ownership(
        &self,
        component: Component,
        caller: &Address,
    ) -> RegistryResult<()> {
        match component {
            Component::Keys => {
                let mut keys = self.keys.write().await;
                let event = keys.accept_ownership(caller)?;
                self.bus.publish(component, event).await;
            }
            Component::Identity => {
                let mut identity = self.identity.write().await;
                let event = identity.accept_ownership(caller)?;
                self.bus.publish(component, event).await;
            }
            Component::Reports => {
                let mut reports = self.reports.write().await;
                let event = reports.accept_ownership(caller)?;
                self.bus.publish(component, event).await;
            }
            Component::Voting => {
                let mut voting = self.voting.write().await;
                let event = voting.accept_ownership(caller)?;
                self.bus.publish(component, event).await;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soulreg_types::RegistryError;

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[tokio::test]
    async fn poll_admin_defaults_to_owner() {
        let service = RegistryService::new(&ServiceConfig::new(addr(1))).unwrap();
        assert_eq!(service.owner(Component::Voting).await, addr(1));

        let config = ServiceConfig::new(addr(1)).with_poll_admin(addr(9));
        let service = RegistryService::new(&config).unwrap();
        assert_eq!(service.owner(Component::Voting).await, addr(9));
        assert_eq!(
            service.open_poll(&addr(1)).await,
            Err(RegistryError::Unauthorized(addr(1)))
        );
        service.open_poll(&addr(9)).await.unwrap();
    }

    #[tokio::test]
    async fn zero_owner_is_rejected() {
        assert!(matches!(
            RegistryService::new(&ServiceConfig::new(Address::ZERO)),
            Err(RegistryError::InvalidOwner(_))
        ));
    }

    #[tokio::test]
    async fn failed_calls_publish_nothing() {
        let service = RegistryService::new(&ServiceConfig::new(addr(1))).unwrap();
        assert!(service.register_user(&addr(2), addr(2)).await.is_err());
        assert!(service.submit_vote(&addr(2), true).await.is_err());
        assert!(service
            .issue_negative_report(&addr(2), addr(3), NegativeReport::new("t", "d", "o"))
            .await
            .is_err());
        assert!(service.events().is_empty().await);
    }

    #[tokio::test]
    async fn regrant_publishes_once() {
        let service = RegistryService::new(&ServiceConfig::new(addr(1))).unwrap();
        assert!(service.grant_permission(&addr(1), addr(2)).await.unwrap());
        assert!(!service.grant_permission(&addr(1), addr(2)).await.unwrap());
        assert_eq!(service.events().len().await, 1);
    }

    #[tokio::test]
    async fn ownership_hand_off_per_component() {
        let service = RegistryService::new(&ServiceConfig::new(addr(1))).unwrap();
        service
            .transfer_ownership(Component::Reports, &addr(1), addr(5))
            .await
            .unwrap();
        service
            .accept_ownership(Component::Reports, &addr(5))
            .await
            .unwrap();

        assert_eq!(service.owner(Component::Reports).await, addr(5));
        // Other components keep their owner.
        assert_eq!(service.owner(Component::Identity).await, addr(1));

        service
            .issue_negative_report(&addr(5), addr(2), NegativeReport::new("t", "d", "o"))
            .await
            .unwrap();
        assert_eq!(service.events().events_for(Component::Reports).await.len(), 3);
    }

    #[tokio::test]
    async fn token_queries_are_scoped_per_ledger() {
        let service = RegistryService::new(&ServiceConfig::new(addr(1))).unwrap();
        let identity_token = service
            .issue_identity(&addr(1), addr(2), IdentityRecord::new("uid", "b", "c"))
            .await
            .unwrap();
        service
            .issue_negative_report(&addr(1), addr(2), NegativeReport::new("t", "d", "o"))
            .await
            .unwrap();
        service
            .issue_negative_report(&addr(1), addr(3), NegativeReport::new("t", "d", "o"))
            .await
            .unwrap();

        assert_eq!(service.total_supply(Ledger::Identity).await, 1);
        assert_eq!(service.total_supply(Ledger::Reports).await, 2);
        assert_eq!(service.balance_of(Ledger::Reports, &addr(2)).await, 1);
        assert_eq!(service.owner_of(Ledger::Reports, TokenId(2)).await.unwrap(), addr(3));
        assert!(service.owner_of(Ledger::Identity, TokenId(2)).await.is_err());
        assert_eq!(service.identity_of(identity_token).await.unwrap().holder, addr(2));
        assert_eq!(service.report_count(&addr(2)).await, 1);
        assert_eq!(service.report_by_token(TokenId(2)).await.unwrap().report.topic, "t");

        assert!(matches!(
            service.transfer(Ledger::Identity, &addr(2), addr(3), identity_token).await,
            Err(RegistryError::SoulboundViolation(_))
        ));
    }

    #[tokio::test]
    async fn poll_and_owner_queries() {
        let service = RegistryService::new(&ServiceConfig::new(addr(1))).unwrap();
        service.grant_permission(&addr(1), addr(2)).await.unwrap();
        service.open_poll(&addr(1)).await.unwrap();
        service.submit_vote(&addr(2), false).await.unwrap();

        assert!(service.is_permitted(&addr(2)).await);
        assert!(!service.is_permitted(&addr(3)).await);
        assert!(service.has_voted(&addr(2)).await);
        assert_eq!(service.vote_of(&addr(2)).await, Some(false));
        assert_eq!(service.vote_of(&addr(3)).await, None);

        assert_eq!(service.pending_owner(Component::Keys).await, None);
        service
            .transfer_ownership(Component::Keys, &addr(1), addr(4))
            .await
            .unwrap();
        assert_eq!(service.pending_owner(Component::Keys).await, Some(addr(4)));
        assert_eq!(service.owner(Component::Keys).await, addr(1));
    }
}
