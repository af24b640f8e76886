//! Governance state on top of a [`KvStore`].
//!
//! Key layout (all values JSON):
//!
//! | Key | Value |
//! |---|---|
//! | `params` | [`Params`] |
//! | `constitution` | free text |
//! | `proposal_id_first` / `proposal_id_last` | lowest / highest assigned id |
//! | `proposal_count` | number of stored proposals |
//! | `proposal.{id}` | [`Proposal`] |
//! | `proposal_active_deposit` / `proposal_active_voting` | ascending id arrays |
//! | `proposal_deposit_count.{id}` | deposit records for `id` |
//! | `proposal_deposit.{id}.{n}` | [`Deposit`], `n` from 1 |
//! | `proposal_voters.{id}` | voters of `id` in first-vote order |
//! | `proposal_vote.{id}.{voter}` | [`VoteRecord`] |
//!
//! Writes go to an overlay. [`GovStore::commit`] applies them to the backing
//! store and hands back the events emitted in the same call;
//! [`GovStore::discard`] drops both.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::error::{GovError, GovResult};
use super::params::Params;
use super::types::{Deposit, Proposal, TallyResult, Vote};
use crate::host::{Event, KvStore};
use crate::serialization::{from_json, to_json};

const KEY_PARAMS: &str = "params";
const KEY_CONSTITUTION: &str = "constitution";
const KEY_PROPOSAL_ID_FIRST: &str = "proposal_id_first";
const KEY_PROPOSAL_ID_LAST: &str = "proposal_id_last";
const KEY_PROPOSAL_COUNT: &str = "proposal_count";
const KEY_ACTIVE_DEPOSIT: &str = "proposal_active_deposit";
const KEY_ACTIVE_VOTING: &str = "proposal_active_voting";

fn proposal_key(id: u64) -> String {
    format!("proposal.{}", id)
}

fn deposit_count_key(id: u64) -> String {
    format!("proposal_deposit_count.{}", id)
}

fn deposit_key(id: u64, n: u64) -> String {
    format!("proposal_deposit.{}.{}", id, n)
}

fn voters_key(id: u64) -> String {
    format!("proposal_voters.{}", id)
}

fn vote_key(id: u64, voter: &str) -> String {
    format!("proposal_vote.{}.{}", id, voter)
}

/// A stored vote together with the stake it added to the tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub vote: Vote,
    pub contribution: TallyResult,
}

/// Typed, transactional access to governance state.
pub struct GovStore<S: KvStore> {
    inner: S,
    /// Pending writes; `None` is a pending delete.
    overlay: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    events: Vec<Event>,
}

impl<S: KvStore> GovStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            overlay: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// The backing store, without pending writes.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Whether writes or events are waiting for commit.
    pub fn is_dirty(&self) -> bool {
        !self.overlay.is_empty() || !self.events.is_empty()
    }

    /// Apply pending writes; return pending events in emission order.
    pub fn commit(&mut self) -> Vec<Event> {
        for (key, value) in std::mem::take(&mut self.overlay) {
            match value {
                Some(value) => self.inner.set(&key, value),
                None => self.inner.delete(&key),
            }
        }
        std::mem::take(&mut self.events)
    }

    /// Drop pending writes and events.
    pub fn discard(&mut self) {
        self.overlay.clear();
        self.events.clear();
    }

    /// Queue an event for emission on commit.
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        match self.overlay.get(key.as_bytes()) {
            Some(pending) => pending.clone(),
            None => self.inner.get(key.as_bytes()),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> GovResult<Option<T>> {
        match self.get_raw(key) {
            Some(bytes) => Ok(Some(from_json(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> GovResult<()> {
        let bytes = to_json(value)?;
        self.overlay.insert(key.as_bytes().to_vec(), Some(bytes));
        Ok(())
    }

    fn delete(&mut self, key: &str) {
        self.overlay.insert(key.as_bytes().to_vec(), None);
    }

    fn get_u64(&self, key: &str) -> GovResult<u64> {
        Ok(self.get_json(key)?.unwrap_or(0))
    }

    // Params

    pub fn params(&self) -> GovResult<Params> {
        self.get_json(KEY_PARAMS)?
            .ok_or_else(|| GovError::InvalidParams("params not initialized".into()))
    }

    pub fn set_params(&mut self, params: &Params) -> GovResult<()> {
        self.set_json(KEY_PARAMS, params)
    }

    pub fn constitution(&self) -> GovResult<String> {
        Ok(self.get_json(KEY_CONSTITUTION)?.unwrap_or_default())
    }

    pub fn set_constitution(&mut self, constitution: &str) -> GovResult<()> {
        self.set_json(KEY_CONSTITUTION, &constitution)
    }

    // Counters

    pub fn proposal_id_first(&self) -> GovResult<u64> {
        self.get_u64(KEY_PROPOSAL_ID_FIRST)
    }

    pub fn set_proposal_id_first(&mut self, id: u64) -> GovResult<()> {
        self.set_json(KEY_PROPOSAL_ID_FIRST, &id)
    }

    pub fn proposal_id_last(&self) -> GovResult<u64> {
        self.get_u64(KEY_PROPOSAL_ID_LAST)
    }

    pub fn set_proposal_id_last(&mut self, id: u64) -> GovResult<()> {
        self.set_json(KEY_PROPOSAL_ID_LAST, &id)
    }

    pub fn proposal_count(&self) -> GovResult<u64> {
        self.get_u64(KEY_PROPOSAL_COUNT)
    }

    pub fn set_proposal_count(&mut self, count: u64) -> GovResult<()> {
        self.set_json(KEY_PROPOSAL_COUNT, &count)
    }

    // Proposals

    pub fn proposal(&self, id: u64) -> GovResult<Option<Proposal>> {
        self.get_json(&proposal_key(id))
    }

    /// Like [`proposal`](Self::proposal) but absent is an error.
    pub fn require_proposal(&self, id: u64) -> GovResult<Proposal> {
        self.proposal(id)?.ok_or(GovError::ProposalNotFound(id))
    }

    pub fn set_proposal(&mut self, proposal: &Proposal) -> GovResult<()> {
        self.set_json(&proposal_key(proposal.id), proposal)
    }

    /// Assign the next id to `proposal`, store it and return the id.
    pub fn add_proposal(&mut self, proposal: &mut Proposal) -> GovResult<u64> {
        let id = self
            .proposal_id_last()?
            .checked_add(1)
            .ok_or_else(|| GovError::InvalidRequest("proposal ids exhausted".into()))?;
        proposal.id = id;
        self.set_proposal(proposal)?;
        self.set_proposal_id_last(id)?;
        self.set_proposal_count(self.proposal_count()? + 1)?;
        Ok(id)
    }

    /// Delete a proposal with its deposit and vote records.
    pub fn remove_proposal(&mut self, id: u64) -> GovResult<()> {
        if self.proposal(id)?.is_none() {
            return Ok(());
        }
        self.delete(&proposal_key(id));
        self.remove_deposits(id)?;
        self.remove_votes(id)?;
        self.set_proposal_count(self.proposal_count()?.saturating_sub(1))
    }

    // Active sets

    pub fn active_deposit_proposals(&self) -> GovResult<BTreeSet<u64>> {
        Ok(self.get_json(KEY_ACTIVE_DEPOSIT)?.unwrap_or_default())
    }

    pub fn active_voting_proposals(&self) -> GovResult<BTreeSet<u64>> {
        Ok(self.get_json(KEY_ACTIVE_VOTING)?.unwrap_or_default())
    }

    pub fn add_active_deposit_proposal(&mut self, id: u64) -> GovResult<()> {
        self.update_set(KEY_ACTIVE_DEPOSIT, |set| set.insert(id))
    }

    pub fn remove_active_deposit_proposal(&mut self, id: u64) -> GovResult<()> {
        self.update_set(KEY_ACTIVE_DEPOSIT, |set| set.remove(&id))
    }

    pub fn add_active_voting_proposal(&mut self, id: u64) -> GovResult<()> {
        self.update_set(KEY_ACTIVE_VOTING, |set| set.insert(id))
    }

    pub fn remove_active_voting_proposal(&mut self, id: u64) -> GovResult<()> {
        self.update_set(KEY_ACTIVE_VOTING, |set| set.remove(&id))
    }

    fn update_set(&mut self, key: &str, f: impl FnOnce(&mut BTreeSet<u64>) -> bool) -> GovResult<()> {
        let mut set: BTreeSet<u64> = self.get_json(key)?.unwrap_or_default();
        if f(&mut set) {
            self.set_json(key, &set)?;
        }
        Ok(())
    }

    // Deposits

    pub fn deposit_count(&self, proposal_id: u64) -> GovResult<u64> {
        self.get_u64(&deposit_count_key(proposal_id))
    }

    pub fn add_deposit(&mut self, deposit: &Deposit) -> GovResult<()> {
        let n = self.deposit_count(deposit.proposal_id)? + 1;
        self.set_json(&deposit_key(deposit.proposal_id, n), deposit)?;
        self.set_json(&deposit_count_key(deposit.proposal_id), &n)
    }

    /// Deposit records in append order.
    pub fn deposits(&self, proposal_id: u64) -> GovResult<Vec<Deposit>> {
        let count = self.deposit_count(proposal_id)?;
        let mut deposits = Vec::with_capacity(count as usize);
        for n in 1..=count {
            if let Some(deposit) = self.get_json(&deposit_key(proposal_id, n))? {
                deposits.push(deposit);
            }
        }
        Ok(deposits)
    }

    fn remove_deposits(&mut self, proposal_id: u64) -> GovResult<()> {
        for n in 1..=self.deposit_count(proposal_id)? {
            self.delete(&deposit_key(proposal_id, n));
        }
        self.delete(&deposit_count_key(proposal_id));
        Ok(())
    }

    // Votes

    pub fn vote_record(&self, proposal_id: u64, voter: &str) -> GovResult<Option<VoteRecord>> {
        self.get_json(&vote_key(proposal_id, voter))
    }

    /// Store `record`, replacing any earlier vote by the same voter.
    pub fn set_vote_record(&mut self, record: &VoteRecord) -> GovResult<()> {
        let proposal_id = record.vote.proposal_id;
        let mut voters = self.voters(proposal_id)?;
        if !voters.iter().any(|v| v == &record.vote.voter) {
            voters.push(record.vote.voter.clone());
            self.set_json(&voters_key(proposal_id), &voters)?;
        }
        self.set_json(&vote_key(proposal_id, &record.vote.voter), record)
    }

    /// Voters in first-vote order.
    pub fn voters(&self, proposal_id: u64) -> GovResult<Vec<String>> {
        Ok(self.get_json(&voters_key(proposal_id))?.unwrap_or_default())
    }

    /// Current vote records in first-vote order.
    pub fn vote_records(&self, proposal_id: u64) -> GovResult<Vec<VoteRecord>> {
        let mut records = Vec::new();
        for voter in self.voters(proposal_id)? {
            if let Some(record) = self.vote_record(proposal_id, &voter)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Current votes in first-vote order.
    pub fn votes(&self, proposal_id: u64) -> GovResult<Vec<Vote>> {
        Ok(self
            .vote_records(proposal_id)?
            .into_iter()
            .map(|record| record.vote)
            .collect())
    }

    fn remove_votes(&mut self, proposal_id: u64) -> GovResult<()> {
        for voter in self.voters(proposal_id)? {
            self.delete(&vote_key(proposal_id, &voter));
        }
        self.delete(&voters_key(proposal_id));
        Ok(())
    }
}
