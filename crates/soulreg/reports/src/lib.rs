//! Soulreg Reports - negative reports against a wallet.
//!
//! Each report the owner issues is appended to the subject's list and minted
//! as its own soulbound token. A wallet can collect any number of reports;
//! none can be edited, removed or transferred away.

#![deny(unsafe_code)]

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soulreg_access::AccessControl;
use soulreg_token::TokenLedger;
use soulreg_types::{Address, RegistryError, RegistryEvent, RegistryResult, TokenId};
use tracing::{debug, info};

/// Message carried by every rejected report transfer.
pub const REPORT_TRANSFER_REJECTION: &str = "Soulbound: token cannot be transferred";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegativeReport {
    pub topic: String,
    pub details: String,
    pub organization: String,
}

impl NegativeReport {
    pub fn new(
        topic: impl Into<String>,
        details: impl Into<String>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            details: details.into(),
            organization: organization.into(),
        }
    }
}

/// A report as stored on the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub token_id: TokenId,
    #[serde(flatten)]
    pub report: NegativeReport,
    pub issued_at: DateTime<Utc>,
}

pub struct ReportLedger {
    access: AccessControl,
    tokens: TokenLedger,
    reports: HashMap<Address, Vec<ReportEntry>>,
    /// token id -> (subject, position in the subject's list)
    by_token: HashMap<TokenId, (Address, usize)>,
}

impl ReportLedger {
    pub fn new(owner: Address) -> RegistryResult<Self> {
        Ok(Self {
            access: AccessControl::new(owner)?,
            tokens: TokenLedger::soulbound(REPORT_TRANSFER_REJECTION),
            reports: HashMap::new(),
            by_token: HashMap::new(),
        })
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Append a report to `subject` and mint its token. Owner only.
    pub fn issue_negative_report(
        &mut self,
        caller: &Address,
        subject: Address,
        report: NegativeReport,
    ) -> RegistryResult<(TokenId, RegistryEvent)> {
        self.access.require_owner(caller)?;

        let token_id = self.tokens.mint(subject)?;
        let topic = report.topic.clone();
        let list = self.reports.entry(subject).or_default();
        self.by_token.insert(token_id, (subject, list.len()));
        list.push(ReportEntry {
            token_id,
            report,
            issued_at: Utc::now(),
        });

        info!(
            subject = %subject,
            token_id = %token_id,
            topic = %topic,
            total = list.len(),
            "Negative report issued"
        );

        Ok((
            token_id,
            RegistryEvent::ReportIssued {
                subject,
                token_id,
                topic,
            },
        ))
    }

    /// All reports against `subject`, oldest first. Empty when there are none.
    pub fn get_reports(&self, subject: &Address) -> &[ReportEntry] {
        let reports = self.reports.get(subject).map(Vec::as_slice).unwrap_or(&[]);
        debug!(subject = %subject, count = reports.len(), "Reports fetched");
        reports
    }

    pub fn report_count(&self, subject: &Address) -> usize {
        self.reports.get(subject).map_or(0, Vec::len)
    }

    pub fn report_by_token(&self, token_id: TokenId) -> RegistryResult<&ReportEntry> {
        self.by_token
            .get(&token_id)
            .and_then(|(subject, index)| self.reports.get(subject)?.get(*index))
            .ok_or_else(|| RegistryError::NotFound(format!("report token {}", token_id)))
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
