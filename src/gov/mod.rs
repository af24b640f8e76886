//! Governance: proposals, deposits, weighted votes and block-boundary tallying.
//!
//! This module provides:
//! - Proposal lifecycle operations (submit, deposit, vote, weighted vote)
//! - End-of-block resolution (deposit expiry, quorum/veto/threshold tally)
//! - Execution of messages carried by passed proposals
//! - Queries and genesis import/export
//! - A JSON request envelope for the module boundary
//!
//! All state lives behind a [`KvStore`](crate::host::KvStore) and all chain
//! interaction goes through [`Host`](crate::host::Host).

pub mod error;
pub mod events;
pub mod executor;
pub mod genesis;
pub mod lifecycle;
pub mod module;
pub mod msg;
pub mod params;
pub mod queries;
pub mod store;
pub mod tally;
pub mod types;

/// Module account that holds proposal deposits.
pub const MODULE_NAME: &str = "gov";

pub use error::{GovError, GovResult};
pub use genesis::{GenesisState, GenesisVote};
pub use module::GovModule;
pub use msg::{GovRequest, Origin};
pub use params::Params;
pub use tally::{EndBlockSummary, TallyOutcome};
pub use types::{
    Coin, Deposit, Proposal, ProposalStatus, TallyResult, Vote, VoteOption, WeightedVoteOption,
};
