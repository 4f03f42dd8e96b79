use thiserror::Error;

use crate::{Address, TokenId};

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Every way a registry operation can be rejected.
///
/// A rejected operation never leaves a partial write behind, and none of
/// these are worth retrying: the same call against the same state fails the
/// same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unauthorized account: {0}")]
    Unauthorized(Address),

    /// Transfer attempted on a non-transferable token. The message is fixed
    /// per ledger so callers can match on it.
    #[error("{0}")]
    SoulboundViolation(&'static str),

    #[error("identity already issued to {0}")]
    AlreadyIssued(Address),

    #[error("key already registered for {0}")]
    AlreadyRegistered(Address),

    #[error("{0} has already voted")]
    AlreadyVoted(Address),

    #[error("poll is already open")]
    AlreadyOpen,

    #[error("poll is already closed")]
    AlreadyClosed,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("poll is closed")]
    PollClosed,

    #[error("{0} is not permitted to vote")]
    NotPermitted(Address),

    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("invalid owner: {0}")]
    InvalidOwner(Address),

    #[error("invalid recipient: {0}")]
    InvalidRecipient(Address),

    #[error("{caller} does not hold token {token_id}")]
    NotTokenOwner { caller: Address, token_id: TokenId },
}

impl RegistryError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::SoulboundViolation(_) => "soulbound_violation",
            Self::AlreadyIssued(_) => "already_issued",
            Self::AlreadyRegistered(_) => "already_registered",
            Self::AlreadyVoted(_) => "already_voted",
            Self::AlreadyOpen => "already_open",
            Self::AlreadyClosed => "already_closed",
            Self::NotFound(_) => "not_found",
            Self::PollClosed => "poll_closed",
            Self::NotPermitted(_) => "not_permitted",
            Self::InvalidAddress(_) => "invalid_address",
            Self::InvalidOwner(_) => "invalid_owner",
            Self::InvalidRecipient(_) => "invalid_recipient",
            Self::NotTokenOwner { .. } => "not_token_owner",
        }
    }
}
