//! Registry scripts: a JSON array of calls executed in order against one
//! service. A rejected call is reported in its outcome and the script
//! carries on.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use soulreg_identity::IdentityRecord;
use soulreg_reports::NegativeReport;
use soulreg_service::{Ledger, RegistryService};
use soulreg_types::{Address, Component, RegistryError, RegistryResult, TokenId};
use tracing::{debug, warn};

use crate::CliResult;

/// One public registry operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    // Keys
    RegisterUser {
        caller: Address,
        subject: Address,
    },
    FetchKey {
        subject: Address,
    },

    // Identity
    IssueIdentity {
        caller: Address,
        subject: Address,
        #[serde(flatten)]
        record: IdentityRecord,
    },
    GetIdentity {
        subject: Address,
    },
    WalletToToken {
        subject: Address,
    },
    IdentityOf {
        token_id: TokenId,
    },

    // Reports
    IssueNegativeReport {
        caller: Address,
        subject: Address,
        #[serde(flatten)]
        report: NegativeReport,
    },
    GetReports {
        subject: Address,
    },
    ReportCount {
        subject: Address,
    },
    ReportByToken {
        token_id: TokenId,
    },

    // Tokens
    OwnerOf {
        ledger: Ledger,
        token_id: TokenId,
    },
    BalanceOf {
        ledger: Ledger,
        holder: Address,
    },
    TotalSupply {
        ledger: Ledger,
    },
    Transfer {
        ledger: Ledger,
        caller: Address,
        to: Address,
        token_id: TokenId,
    },
    TransferFrom {
        ledger: Ledger,
        caller: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
    },

    // Voting
    OpenPoll {
        caller: Address,
    },
    ClosePoll {
        caller: Address,
    },
    GrantPermission {
        caller: Address,
        voter: Address,
    },
    SubmitVote {
        caller: Address,
        choice: bool,
    },
    FetchResults,
    IsOpen,
    IsPermitted {
        voter: Address,
    },
    HasVoted {
        voter: Address,
    },
    VoteOf {
        voter: Address,
    },

    // Ownership
    Owner {
        component: Component,
    },
    PendingOwner {
        component: Component,
    },
    TransferOwnership {
        component: Component,
        caller: Address,
        new_owner: Address,
    },
    AcceptOwnership {
        component: Component,
        caller: Address,
    },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::RegisterUser { .. } => "register_user",
            Call::FetchKey { .. } => "fetch_key",
            Call::IssueIdentity { .. } => "issue_identity",
            Call::GetIdentity { .. } => "get_identity",
            Call::WalletToToken { .. } => "wallet_to_token",
            Call::IdentityOf { .. } => "identity_of",
            Call::IssueNegativeReport { .. } => "issue_negative_report",
            Call::GetReports { .. } => "get_reports",
            Call::ReportCount { .. } => "report_count",
            Call::ReportByToken { .. } => "report_by_token",
            Call::OwnerOf { .. } => "owner_of",
            Call::BalanceOf { .. } => "balance_of",
            Call::TotalSupply { .. } => "total_supply",
            Call::Transfer { .. } => "transfer",
            Call::TransferFrom { .. } => "transfer_from",
            Call::OpenPoll { .. } => "open_poll",
            Call::ClosePoll { .. } => "close_poll",
            Call::GrantPermission { .. } => "grant_permission",
            Call::SubmitVote { .. } => "submit_vote",
            Call::FetchResults => "fetch_results",
            Call::IsOpen => "is_open",
            Call::IsPermitted { .. } => "is_permitted",
            Call::HasVoted { .. } => "has_voted",
            Call::VoteOf { .. } => "vote_of",
            Call::Owner { .. } => "owner",
            Call::PendingOwner { .. } => "pending_owner",
            Call::TransferOwnership { .. } => "transfer_ownership",
            Call::AcceptOwnership { .. } => "accept_ownership",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallError {
    pub code: String,
    pub message: String,
}

impl From<&RegistryError> for CallError {
    fn from(err: &RegistryError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result line for one executed call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallOutcome {
    pub index: usize,
    pub op: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CallError>,
}

pub fn parse_script(text: &str) -> CliResult<Vec<Call>> {
    Ok(serde_json::from_str(text)?)
}

/// Read and parse a script file.
pub fn load_script(path: &Path) -> CliResult<Vec<Call>> {
    let text = std::fs::read_to_string(path)?;
    parse_script(&text)
}

pub async fn run_script(service: &RegistryService, calls: &[Call]) -> Vec<CallOutcome> {
    let mut outcomes = Vec::with_capacity(calls.len());
    for (index, call) in calls.iter().enumerate() {
        let outcome = match execute(service, call).await {
            Ok(result) => {
                debug!(index, op = call.name(), "Call succeeded");
                CallOutcome {
                    index,
                    op: call.name().to_string(),
                    ok: true,
                    result: Some(result),
                    error: None,
                }
            }
            Err(err) => {
                warn!(index, op = call.name(), code = err.code(), "Call rejected: {}", err);
                CallOutcome {
                    index,
                    op: call.name().to_string(),
                    ok: false,
                    result: None,
                    error: Some(CallError::from(&err)),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

/// Run a single call and render its result.
pub async fn execute(service: &RegistryService, call: &Call) -> RegistryResult<Value> {
    let value = match call {
        Call::RegisterUser { caller, subject } => {
            let key = service.register_user(caller, *subject).await?;
            json!({ "key": key })
        }
        Call::FetchKey { subject } => json!({ "key": service.fetch_key(subject).await }),

        Call::IssueIdentity {
            caller,
            subject,
            record,
        } => {
            let token_id = service
                .issue_identity(caller, *subject, record.clone())
                .await?;
            json!({ "token_id": token_id })
        }
        Call::GetIdentity { subject } => json!(service.get_identity(subject).await?),
        Call::WalletToToken { subject } => {
            json!({ "token_id": service.wallet_to_token(subject).await })
        }
        Call::IdentityOf { token_id } => json!(service.identity_of(*token_id).await?),

        Call::IssueNegativeReport {
            caller,
            subject,
            report,
        } => {
            let token_id = service
                .issue_negative_report(caller, *subject, report.clone())
                .await?;
            json!({ "token_id": token_id })
        }
        Call::GetReports { subject } => json!(service.get_reports(subject).await),
        Call::ReportCount { subject } => json!({ "count": service.report_count(subject).await }),
        Call::ReportByToken { token_id } => json!(service.report_by_token(*token_id).await?),

        Call::OwnerOf { ledger, token_id } => {
            json!({ "owner": service.owner_of(*ledger, *token_id).await? })
        }
        Call::BalanceOf { ledger, holder } => {
            json!({ "balance": service.balance_of(*ledger, holder).await })
        }
        Call::TotalSupply { ledger } => {
            json!({ "total_supply": service.total_supply(*ledger).await })
        }
        Call::Transfer {
            ledger,
            caller,
            to,
            token_id,
        } => {
            service.transfer(*ledger, caller, *to, *token_id).await?;
            Value::Null
        }
        Call::TransferFrom {
            ledger,
            caller,
            from,
            to,
            token_id,
        } => {
            service
                .transfer_from(*ledger, caller, *from, *to, *token_id)
                .await?;
            Value::Null
        }

        Call::OpenPoll { caller } => {
            service.open_poll(caller).await?;
            Value::Null
        }
        Call::ClosePoll { caller } => {
            service.close_poll(caller).await?;
            Value::Null
        }
        Call::GrantPermission { caller, voter } => {
            let granted = service.grant_permission(caller, *voter).await?;
            json!({ "newly_granted": granted })
        }
        Call::SubmitVote { caller, choice } => {
            service.submit_vote(caller, *choice).await?;
            Value::Null
        }
        Call::FetchResults => json!(service.fetch_results().await),
        Call::IsOpen => json!({ "open": service.is_poll_open().await }),
        Call::IsPermitted { voter } => {
            json!({ "permitted": service.is_permitted(voter).await })
        }
        Call::HasVoted { voter } => json!({ "voted": service.has_voted(voter).await }),
        Call::VoteOf { voter } => json!({ "choice": service.vote_of(voter).await }),

        Call::Owner { component } => json!({ "owner": service.owner(*component).await }),
        Call::PendingOwner { component } => {
            json!({ "pending_owner": service.pending_owner(*component).await })
        }
        Call::TransferOwnership {
            component,
            caller,
            new_owner,
        } => {
            service
                .transfer_ownership(*component, caller, *new_owner)
                .await?;
            Value::Null
        }
        Call::AcceptOwnership { component, caller } => {
            service.accept_ownership(*component, caller).await?;
            Value::Null
        }
    };
    Ok(value)
}
