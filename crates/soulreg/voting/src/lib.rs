//! Soulreg Voting - a permissioned yes/no poll.
//!
//! The poll admin opens and closes the poll and decides who may vote. A
//! permitted voter casts exactly one boolean vote while the poll is open;
//! the vote can never be changed or withdrawn. The tally is recomputed from
//! the recorded votes on every read, so it cannot drift from them.

#![deny(unsafe_code)]

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use soulreg_access::AccessControl;
use soulreg_types::{Address, RegistryError, RegistryEvent, RegistryResult};
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PollState {
    Closed,
    Open,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollTally {
    pub approvals: u64,
    pub rejections: u64,
}

impl PollTally {
    pub fn total(&self) -> u64 {
        self.approvals + self.rejections
    }
}

pub struct VotingPoll {
    access: AccessControl,
    state: PollState,
    opened_at: Option<DateTime<Utc>>,
    permitted: HashSet<Address>,
    votes: BTreeMap<Address, bool>,
}

impl VotingPoll {
    /// A closed poll with no voters, administered by `admin`.
    pub fn new(admin: Address) -> RegistryResult<Self> {
        Ok(Self {
            access: AccessControl::new(admin)?,
            state: PollState::Closed,
            opened_at: None,
            permitted: HashSet::new(),
            votes: BTreeMap::new(),
        })
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn open_poll(&mut self, caller: &Address) -> RegistryResult<RegistryEvent> {
        self.access.require_owner(caller)?;
        if self.state == PollState::Open {
            return Err(RegistryError::AlreadyOpen);
        }

        self.state = PollState::Open;
        self.opened_at = Some(Utc::now());
        info!(admin = %caller, "Poll opened");
        Ok(RegistryEvent::PollOpened)
    }

    pub fn close_poll(&mut self, caller: &Address) -> RegistryResult<RegistryEvent> {
        self.access.require_owner(caller)?;
        if self.state == PollState::Closed {
            return Err(RegistryError::AlreadyClosed);
        }

        self.state = PollState::Closed;
        let tally = self.fetch_results();
        info!(
            admin = %caller,
            approvals = tally.approvals,
            rejections = tally.rejections,
            "Poll closed"
        );
        Ok(RegistryEvent::PollClosed)
    }

    /// Allow `voter` to vote. Granting an already-permitted voter succeeds
    /// without an event.
    pub fn grant_permission(
        &mut self,
        caller: &Address,
        voter: Address,
    ) -> RegistryResult<Option<RegistryEvent>> {
        self.access.require_owner(caller)?;
        if !self.permitted.insert(voter) {
            debug!(voter = %voter, "Voter already permitted");
            return Ok(None);
        }

        info!(voter = %voter, "Voting permission granted");
        Ok(Some(RegistryEvent::PermissionGranted { voter }))
    }

    /// Record the caller's vote.
    pub fn submit_vote(&mut self, caller: &Address, choice: bool) -> RegistryResult<RegistryEvent> {
        if self.state != PollState::Open {
            return Err(RegistryError::PollClosed);
        }
        if !self.permitted.contains(caller) {
            return Err(RegistryError::NotPermitted(*caller));
        }
        if self.votes.contains_key(caller) {
            return Err(RegistryError::AlreadyVoted(*caller));
        }

        self.votes.insert(*caller, choice);
        info!(voter = %caller, choice, "Vote cast");
        Ok(RegistryEvent::VoteCast {
            voter: *caller,
            choice,
        })
    }

    /// Count approvals and rejections. Valid in any poll state.
    pub fn fetch_results(&self) -> PollTally {
        self.votes
            .values()
            .fold(PollTally::default(), |mut tally, choice| {
                if *choice {
                    tally.approvals += 1;
                } else {
                    tally.rejections += 1;
                }
                tally
            })
    }

    pub fn is_open(&self) -> bool {
        self.state == PollState::Open
    }

    /// When the poll was last opened.
    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }

    pub fn is_permitted(&self, voter: &Address) -> bool {
        self.permitted.contains(voter)
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.votes.contains_key(voter)
    }

    pub fn vote_of(&self, voter: &Address) -> Option<bool> {
        self.votes.get(voter).copied()
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
