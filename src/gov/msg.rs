//! Request envelope and message types at the module boundary.
//!
//! A call is a single-key JSON object naming the operation, for example
//! `{"Vote":{"proposal_id":"1","voter":"alice","option":"yes"}}`. It is
//! decoded once into [`GovRequest`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{GovError, GovResult};
use super::genesis::GenesisState;
use super::params::Params;
use super::types::{string_u64, timestamp, Coin, Deposit, Proposal, TallyResult, Vote, WeightedVoteOption};

/// Who is calling the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The chain itself (block hooks, genesis, other modules).
    Internal,
    /// A transaction or query from outside.
    External,
}

/// Every operation the module accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovRequest {
    SubmitProposal(MsgSubmitProposal),
    Vote(MsgVote),
    VoteWeighted(MsgVoteWeighted),
    Deposit(MsgDeposit),
    EndBlock(MsgEndBlock),
    InitGenesis(GenesisState),
    UpdateParams(MsgUpdateParams),
    GetProposal(QueryProposalRequest),
    GetProposals(QueryProposalsRequest),
    GetTallyResult(QueryTallyResultRequest),
    GetParams(QueryParamsRequest),
    GetVote(QueryVoteRequest),
    GetVotes(QueryVotesRequest),
    GetDeposit(QueryDepositRequest),
    GetDeposits(QueryDepositsRequest),
}

impl GovRequest {
    pub fn name(&self) -> &'static str {
        match self {
            GovRequest::SubmitProposal(_) => "SubmitProposal",
            GovRequest::Vote(_) => "Vote",
            GovRequest::VoteWeighted(_) => "VoteWeighted",
            GovRequest::Deposit(_) => "Deposit",
            GovRequest::EndBlock(_) => "EndBlock",
            GovRequest::InitGenesis(_) => "InitGenesis",
            GovRequest::UpdateParams(_) => "UpdateParams",
            GovRequest::GetProposal(_) => "GetProposal",
            GovRequest::GetProposals(_) => "GetProposals",
            GovRequest::GetTallyResult(_) => "GetTallyResult",
            GovRequest::GetParams(_) => "GetParams",
            GovRequest::GetVote(_) => "GetVote",
            GovRequest::GetVotes(_) => "GetVotes",
            GovRequest::GetDeposit(_) => "GetDeposit",
            GovRequest::GetDeposits(_) => "GetDeposits",
        }
    }

    /// Operations only the chain itself may invoke.
    pub fn is_internal_only(&self) -> bool {
        matches!(
            self,
            GovRequest::EndBlock(_) | GovRequest::InitGenesis(_) | GovRequest::UpdateParams(_)
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsgSubmitProposal {
    pub messages: Vec<String>,
    pub initial_deposit: Vec<Coin>,
    pub proposer: String,
    pub metadata: String,
    pub title: String,
    pub summary: String,
    pub expedited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSubmitProposalResponse {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
}

/// A single-option vote. `option` is `yes|no|abstain|no_with_veto`, with or
/// without the `VOTE_OPTION_` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVote {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
    pub voter: String,
    pub option: String,
    #[serde(default)]
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteWeighted {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
    pub voter: String,
    pub option: Vec<WeightedVoteOption>,
    #[serde(default)]
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgDeposit {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
    pub depositor: String,
    pub amount: Vec<Coin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateParams {
    pub params: Params,
}

/// End-of-block hook. `data` is base64 of a JSON block entry whose `header`
/// field is base64 of a JSON header carrying the RFC3339 block `time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgEndBlock {
    pub data: String,
}

#[derive(Serialize, Deserialize)]
struct BlockEntry {
    header: String,
}

#[derive(Serialize, Deserialize)]
struct BlockHeader {
    #[serde(with = "timestamp")]
    time: DateTime<Utc>,
}

impl MsgEndBlock {
    /// Build the envelope for a block finalized at `time`.
    pub fn for_time(time: DateTime<Utc>) -> GovResult<Self> {
        let header = serde_json::to_vec(&BlockHeader { time })
            .map_err(|e| GovError::InvalidRequest(e.to_string()))?;
        let entry = serde_json::to_vec(&BlockEntry {
            header: STANDARD.encode(header),
        })
        .map_err(|e| GovError::InvalidRequest(e.to_string()))?;
        Ok(Self {
            data: STANDARD.encode(entry),
        })
    }

    /// Finalized block time carried by the envelope.
    pub fn block_time(&self) -> GovResult<DateTime<Utc>> {
        let invalid = |what: &str, e: &dyn std::fmt::Display| {
            GovError::InvalidRequest(format!("end block {}: {}", what, e))
        };

        let entry_bytes = STANDARD.decode(&self.data).map_err(|e| invalid("data", &e))?;
        let entry: BlockEntry =
            serde_json::from_slice(&entry_bytes).map_err(|e| invalid("block entry", &e))?;
        let header_bytes = STANDARD
            .decode(&entry.header)
            .map_err(|e| invalid("header", &e))?;
        let header: BlockHeader =
            serde_json::from_slice(&header_bytes).map_err(|e| invalid("header", &e))?;
        Ok(header.time)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRequest {
    #[serde(with = "string_u64")]
    pub offset: u64,
    /// Zero means unlimited.
    #[serde(with = "string_u64")]
    pub limit: u64,
    pub count_total: bool,
    pub reverse: bool,
}

impl PageRequest {
    /// Apply offset and limit to `items`.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let iter = items.into_iter().skip(offset);
        match usize::try_from(self.limit) {
            Ok(0) | Err(_) => iter.collect(),
            Ok(limit) => iter.take(limit).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    #[serde(with = "string_u64")]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryProposalRequest {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryProposalResponse {
    pub proposal: Option<Proposal>,
}

/// Empty filters match everything. `proposal_status` takes the enum name or
/// number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryProposalsRequest {
    pub proposal_status: String,
    pub voter: String,
    pub depositor: String,
    pub pagination: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryProposalsResponse {
    pub proposals: Vec<Proposal>,
    pub pagination: PageResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTallyResultRequest {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTallyResultResponse {
    pub tally: Option<TallyResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParamsRequest {
    pub params_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParamsResponse {
    pub params: Params,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryVoteRequest {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
    pub voter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryVoteResponse {
    pub vote: Option<Vote>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryVotesRequest {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
    #[serde(default)]
    pub pagination: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryVotesResponse {
    pub votes: Vec<Vote>,
    pub pagination: PageResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDepositRequest {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
    pub depositor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDepositResponse {
    pub deposit: Option<Deposit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDepositsRequest {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
    #[serde(default)]
    pub pagination: PageRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDepositsResponse {
    pub deposits: Vec<Deposit>,
    pub pagination: PageResponse,
}
