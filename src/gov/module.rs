//! The governance module: one owner for state and collaborators.
//!
//! Every state-changing call runs as a unit. Its writes and events are
//! staged in the [`GovStore`] overlay and reach the backing store and the
//! event sink only if the call returns `Ok`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::{GovError, GovResult};
use super::genesis::{self, GenesisState};
use super::lifecycle;
use super::msg::*;
use super::queries;
use super::store::GovStore;
use super::tally::{self, EndBlockSummary};
use crate::host::{EventSink, Host, KvStore};
use crate::serialization::to_json;

/// Governance engine bound to a store and a host chain.
pub struct GovModule<S: KvStore, H: Host> {
    store: GovStore<S>,
    host: H,
}

impl<S: KvStore, H: Host> GovModule<S, H> {
    pub fn new(store: S, host: H) -> Self {
        Self {
            store: GovStore::new(store),
            host,
        }
    }

    pub fn store(&self) -> &GovStore<S> {
        &self.store
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_parts(self) -> (S, H) {
        (self.store.into_inner(), self.host)
    }

    /// Run `f`, then commit and flush events on success or discard on error.
    fn transact<T>(
        &mut self,
        f: impl FnOnce(&mut GovStore<S>, &mut H) -> GovResult<T>,
    ) -> GovResult<T> {
        match f(&mut self.store, &mut self.host) {
            Ok(value) => {
                for event in self.store.commit() {
                    self.host.emit(event);
                }
                Ok(value)
            }
            Err(e) => {
                self.store.discard();
                tracing::debug!(error = %e, "call aborted, state discarded");
                Err(e)
            }
        }
    }

    pub fn init_genesis(&mut self, genesis: GenesisState) -> GovResult<()> {
        self.transact(|store, _| genesis::init_genesis(store, genesis))
    }

    pub fn export_genesis(&self) -> GovResult<GenesisState> {
        genesis::export_genesis(&self.store)
    }

    pub fn submit_proposal(&mut self, msg: MsgSubmitProposal) -> GovResult<u64> {
        self.transact(|store, host| lifecycle::submit_proposal(store, host, msg))
    }

    pub fn deposit(&mut self, msg: MsgDeposit) -> GovResult<()> {
        self.transact(|store, host| lifecycle::deposit(store, host, msg))
    }

    pub fn vote(&mut self, msg: MsgVote) -> GovResult<()> {
        self.transact(|store, host| lifecycle::vote(store, host, msg))
    }

    pub fn vote_weighted(&mut self, msg: MsgVoteWeighted) -> GovResult<()> {
        self.transact(|store, host| lifecycle::vote_weighted(store, host, msg))
    }

    pub fn update_params(&mut self, msg: MsgUpdateParams) -> GovResult<()> {
        self.transact(|store, _| {
            msg.params.validate()?;
            store.set_params(&msg.params)
        })
    }

    /// Run the end-of-block sweep for a block finalized at `block_time`.
    pub fn end_block(&mut self, block_time: DateTime<Utc>) -> GovResult<EndBlockSummary> {
        self.transact(|store, host| tally::end_block(store, host, block_time))
    }

    /// Decode and handle one request envelope, returning the JSON response.
    ///
    /// `EndBlock`, `InitGenesis` and `UpdateParams` require
    /// [`Origin::Internal`].
    pub fn dispatch(&mut self, origin: Origin, request: &[u8]) -> GovResult<Vec<u8>> {
        let request: GovRequest = serde_json::from_slice(request)
            .map_err(|e| GovError::InvalidRequest(e.to_string()))?;

        if request.is_internal_only() && origin != Origin::Internal {
            return Err(GovError::Unauthorized(request.name().to_string()));
        }
        tracing::trace!(operation = request.name(), "dispatch");

        match request {
            GovRequest::SubmitProposal(msg) => {
                let proposal_id = self.submit_proposal(msg)?;
                respond(&MsgSubmitProposalResponse { proposal_id })
            }
            GovRequest::Vote(msg) => {
                self.vote(msg)?;
                Ok(b"{}".to_vec())
            }
            GovRequest::VoteWeighted(msg) => {
                self.vote_weighted(msg)?;
                Ok(b"{}".to_vec())
            }
            GovRequest::Deposit(msg) => {
                self.deposit(msg)?;
                Ok(Vec::new())
            }
            GovRequest::EndBlock(msg) => {
                self.end_block(msg.block_time()?)?;
                Ok(Vec::new())
            }
            GovRequest::InitGenesis(genesis) => {
                self.init_genesis(genesis)?;
                Ok(Vec::new())
            }
            GovRequest::UpdateParams(msg) => {
                self.update_params(msg)?;
                Ok(Vec::new())
            }
            GovRequest::GetProposal(req) => respond(&queries::get_proposal(&self.store, &req)?),
            GovRequest::GetProposals(req) => respond(&queries::get_proposals(&self.store, &req)?),
            GovRequest::GetTallyResult(req) => {
                respond(&queries::get_tally_result(&self.store, &req)?)
            }
            GovRequest::GetParams(req) => respond(&queries::get_params(&self.store, &req)?),
            GovRequest::GetVote(req) => respond(&queries::get_vote(&self.store, &req)?),
            GovRequest::GetVotes(req) => respond(&queries::get_votes(&self.store, &req)?),
            GovRequest::GetDeposit(req) => respond(&queries::get_deposit(&self.store, &req)?),
            GovRequest::GetDeposits(req) => respond(&queries::get_deposits(&self.store, &req)?),
        }
    }
}

fn respond<T: Serialize>(value: &T) -> GovResult<Vec<u8>> {
    Ok(to_json(value)?)
}
