//! Reference walkthrough: register a key, issue an identity and two reports,
//! run a one-vote poll and show that the identity token cannot move.

use serde::Serialize;
use soulreg_identity::IdentityRecord;
use soulreg_reports::NegativeReport;
use soulreg_service::{EventEnvelope, Ledger, RegistryService};
use soulreg_types::{Address, TokenId};
use tracing::info;

use crate::script::{run_script, Call, CallOutcome};
use crate::{CliResult, RegistryConfig};

/// Second account of the local development chain.
pub const DEMO_USER: Address = Address::from_bytes([
    0x70, 0x99, 0x79, 0x70, 0xc5, 0x18, 0x12, 0xdc, 0x3a, 0x01, 0x0c, 0x7d, 0x01, 0xb5, 0x0e, 0x0d,
    0x17, 0xdc, 0x79, 0xc8,
]);

/// Third account of the local development chain.
pub const DEMO_VOTER: Address = Address::from_bytes([
    0x3c, 0x44, 0xcd, 0xdd, 0xb6, 0xa9, 0x00, 0xfa, 0x2b, 0x58, 0x5d, 0xd2, 0x99, 0xe0, 0x3d, 0x12,
    0xfa, 0x42, 0x93, 0xbc,
]);

#[derive(Clone, Debug, Serialize)]
pub struct DemoReport {
    pub outcomes: Vec<CallOutcome>,
    pub events: Vec<EventEnvelope>,
}

pub fn demo_calls(owner: Address, poll_admin: Address) -> Vec<Call> {
    vec![
        Call::RegisterUser {
            caller: owner,
            subject: DEMO_USER,
        },
        Call::FetchKey { subject: DEMO_USER },
        Call::IssueIdentity {
            caller: owner,
            subject: DEMO_USER,
            record: IdentityRecord::new("uid123", "01/01/1990", "Alice"),
        },
        Call::GetIdentity { subject: DEMO_USER },
        Call::IssueNegativeReport {
            caller: owner,
            subject: DEMO_USER,
            report: NegativeReport::new("Fraud", "Identity verification failed", "Financial Authority"),
        },
        Call::IssueNegativeReport {
            caller: owner,
            subject: DEMO_USER,
            report: NegativeReport::new("Theft", "Reported stolen goods", "City Police"),
        },
        Call::GetReports { subject: DEMO_USER },
        Call::OpenPoll { caller: poll_admin },
        Call::GrantPermission {
            caller: poll_admin,
            voter: DEMO_VOTER,
        },
        Call::SubmitVote {
            caller: DEMO_VOTER,
            choice: true,
        },
        Call::FetchResults,
        // Rejected: identity tokens are soulbound.
        Call::TransferFrom {
            ledger: Ledger::Identity,
            caller: DEMO_USER,
            from: DEMO_USER,
            to: owner,
            token_id: TokenId::FIRST,
        },
    ]
}

pub async fn run_demo(config: &RegistryConfig) -> CliResult<DemoReport> {
    let service_config = config.service_config();
    let admin = service_config.poll_admin.unwrap_or(service_config.owner);
    let service = RegistryService::new(&service_config)?;

    let outcomes = run_script(&service, &demo_calls(service_config.owner, admin)).await;
    let events = service.events().events().await;
    info!(
        calls = outcomes.len(),
        events = events.len(),
        "Demo walkthrough finished"
    );
    Ok(DemoReport { outcomes, events })
}
