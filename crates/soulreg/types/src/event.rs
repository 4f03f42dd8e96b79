use serde::{Deserialize, Serialize};

use crate::{Address, IdentityKey, TokenId};

/// The registry component an event originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Keys,
    Identity,
    Reports,
    Voting,
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Component::Keys => "keys",
            Component::Identity => "identity",
            Component::Reports => "reports",
            Component::Voting => "voting",
        };
        f.write_str(name)
    }
}

/// One event per successful mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RegistryEvent {
    KeyCreated {
        subject: Address,
        key: IdentityKey,
    },
    IdentityIssued {
        subject: Address,
        token_id: TokenId,
    },
    ReportIssued {
        subject: Address,
        token_id: TokenId,
        topic: String,
    },
    PollOpened,
    PollClosed,
    PermissionGranted {
        voter: Address,
    },
    VoteCast {
        voter: Address,
        choice: bool,
    },
    OwnershipTransferStarted {
        previous_owner: Address,
        new_owner: Address,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
}

impl RegistryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::KeyCreated { .. } => "KeyCreated",
            Self::IdentityIssued { .. } => "IdentityIssued",
            Self::ReportIssued { .. } => "ReportIssued",
            Self::PollOpened => "PollOpened",
            Self::PollClosed => "PollClosed",
            Self::PermissionGranted { .. } => "PermissionGranted",
            Self::VoteCast { .. } => "VoteCast",
            Self::OwnershipTransferStarted { .. } => "OwnershipTransferStarted",
            Self::OwnershipTransferred { .. } => "OwnershipTransferred",
        }
    }
}
