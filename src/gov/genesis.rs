//! Genesis import and export.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::error::{GovError, GovResult};
use super::params::Params;
use super::store::{GovStore, VoteRecord};
use super::types::{string_u64, Deposit, Proposal, ProposalStatus, TallyResult, Vote};
use crate::host::KvStore;

pub const DEFAULT_STARTING_PROPOSAL_ID: u64 = 1;

fn default_starting_proposal_id() -> u64 {
    DEFAULT_STARTING_PROPOSAL_ID
}

/// A vote as carried in genesis, with the stake it added to its proposal's
/// tally. The contribution is what a later re-vote by the same voter subtracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisVote {
    #[serde(flatten)]
    pub vote: Vote,
    pub contribution: TallyResult,
}

impl From<VoteRecord> for GenesisVote {
    fn from(record: VoteRecord) -> Self {
        Self {
            vote: record.vote,
            contribution: record.contribution,
        }
    }
}

impl From<GenesisVote> for VoteRecord {
    fn from(vote: GenesisVote) -> Self {
        Self {
            vote: vote.vote,
            contribution: vote.contribution,
        }
    }
}

/// Governance state at chain start, or exported from a running chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    #[serde(with = "string_u64", default = "default_starting_proposal_id")]
    pub starting_proposal_id: u64,
    #[serde(default)]
    pub deposits: Vec<Deposit>,
    #[serde(default)]
    pub votes: Vec<GenesisVote>,
    #[serde(default)]
    pub proposals: Vec<Proposal>,
    pub params: Params,
    #[serde(default)]
    pub constitution: String,
}

impl GenesisState {
    /// Empty genesis with default params for `bond_denom`.
    pub fn default_for(bond_denom: &str) -> Self {
        Self {
            starting_proposal_id: DEFAULT_STARTING_PROPOSAL_ID,
            deposits: Vec::new(),
            votes: Vec::new(),
            proposals: Vec::new(),
            params: Params::default_for(bond_denom),
            constitution: String::new(),
        }
    }
}

/// Load `genesis` into `store`.
///
/// Proposals keep their ids; active sets are rebuilt from their status. The
/// next submitted proposal gets `max(starting_proposal_id, highest imported id + 1)`.
/// Imported votes keep their recorded contribution, so a re-vote after import
/// replaces it instead of counting the voter twice.
pub fn init_genesis<S: KvStore>(store: &mut GovStore<S>, genesis: GenesisState) -> GovResult<()> {
    tracing::info!("initiating genesis");
    genesis.params.validate()?;

    let start = genesis.starting_proposal_id.max(1);
    let mut ids = BTreeSet::new();
    for proposal in &genesis.proposals {
        if proposal.id == 0 || !ids.insert(proposal.id) {
            return Err(GovError::InvalidRequest(format!(
                "invalid or duplicate proposal id {} in genesis",
                proposal.id
            )));
        }
    }
    let known = |id: u64, what: &str| {
        if ids.contains(&id) {
            Ok(())
        } else {
            Err(GovError::InvalidRequest(format!(
                "genesis {} references unknown proposal {}",
                what, id
            )))
        }
    };
    for deposit in &genesis.deposits {
        known(deposit.proposal_id, "deposit")?;
    }
    for vote in &genesis.votes {
        known(vote.vote.proposal_id, "vote")?;
    }

    store.set_params(&genesis.params)?;
    store.set_constitution(&genesis.constitution)?;

    let first = ids.first().map_or(start, |&min| min.min(start));
    let last = ids.last().map_or(start - 1, |&max| max.max(start - 1));
    store.set_proposal_id_first(first)?;
    store.set_proposal_id_last(last)?;
    store.set_proposal_count(ids.len() as u64)?;

    for proposal in &genesis.proposals {
        store.set_proposal(proposal)?;
        match proposal.status {
            ProposalStatus::DepositPeriod => store.add_active_deposit_proposal(proposal.id)?,
            ProposalStatus::VotingPeriod => store.add_active_voting_proposal(proposal.id)?,
            _ => {}
        }
    }
    for deposit in &genesis.deposits {
        store.add_deposit(deposit)?;
    }
    for vote in genesis.votes {
        store.set_vote_record(&vote.into())?;
    }

    tracing::info!(
        proposals = genesis.proposals.len(),
        deposits = genesis.deposits.len(),
        last_proposal_id = last,
        "initiated genesis"
    );
    Ok(())
}

/// Snapshot the module state as a genesis document.
pub fn export_genesis<S: KvStore>(store: &GovStore<S>) -> GovResult<GenesisState> {
    let first = store.proposal_id_first()?.max(1);
    let last = store.proposal_id_last()?;
    let starting_proposal_id = last
        .checked_add(1)
        .ok_or_else(|| GovError::InvalidRequest("proposal id overflow".into()))?;

    let mut proposals = Vec::new();
    let mut deposits = Vec::new();
    let mut votes = Vec::new();
    for id in first..=last {
        if let Some(proposal) = store.proposal(id)? {
            proposals.push(proposal);
            deposits.extend(store.deposits(id)?);
            votes.extend(store.vote_records(id)?.into_iter().map(GenesisVote::from));
        }
    }

    Ok(GenesisState {
        starting_proposal_id,
        deposits,
        votes,
        proposals,
        params: store.params()?,
        constitution: store.constitution()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gov::types::{zero_time, Coin, VoteOption, WeightedVoteOption};
    use crate::host::MemoryStore;
    use crate::math::Amount;

    fn proposal(id: u64, status: ProposalStatus) -> Proposal {
        Proposal {
            id,
            messages: vec![],
            status,
            final_tally_result: TallyResult::default(),
            submit_time: zero_time(),
            deposit_end_time: zero_time(),
            total_deposit: vec![Coin::new("stake", 10u64)],
            voting_start_time: zero_time(),
            voting_end_time: zero_time(),
            metadata: String::new(),
            title: format!("proposal {}", id),
            summary: String::new(),
            proposer: "alice".to_string(),
            expedited: false,
            failed_reason: String::new(),
        }
    }

    #[test]
    fn test_empty_genesis_starts_at_starting_id() {
        let mut store = GovStore::new(MemoryStore::new());
        let mut genesis = GenesisState::default_for("stake");
        genesis.starting_proposal_id = 5;
        init_genesis(&mut store, genesis).unwrap();

        assert_eq!(store.proposal_id_first().unwrap(), 5);
        assert_eq!(store.proposal_id_last().unwrap(), 4);
        assert_eq!(store.proposal_count().unwrap(), 0);
    }

    #[test]
    fn test_import_rebuilds_active_sets_and_counters() {
        let mut store = GovStore::new(MemoryStore::new());
        let mut genesis = GenesisState::default_for("stake");
        genesis.proposals = vec![
            proposal(1, ProposalStatus::Passed),
            proposal(2, ProposalStatus::VotingPeriod),
            proposal(3, ProposalStatus::DepositPeriod),
        ];
        genesis.deposits = vec![Deposit {
            proposal_id: 3,
            depositor: "bob".to_string(),
            amount: vec![Coin::new("stake", 10u64)],
        }];
        genesis.votes = vec![GenesisVote {
            vote: Vote {
                proposal_id: 2,
                voter: "carol".to_string(),
                options: vec![WeightedVoteOption {
                    option: VoteOption::Yes,
                    weight: "1.0".to_string(),
                }],
                metadata: String::new(),
            },
            contribution: TallyResult::default(),
        }];
        init_genesis(&mut store, genesis).unwrap();

        assert_eq!(store.active_voting_proposals().unwrap(), BTreeSet::from([2]));
        assert_eq!(store.active_deposit_proposals().unwrap(), BTreeSet::from([3]));
        assert_eq!(store.proposal_id_last().unwrap(), 3);
        assert_eq!(store.proposal_count().unwrap(), 3);
        assert_eq!(store.deposits(3).unwrap().len(), 1);
        assert_eq!(store.votes(2).unwrap()[0].voter, "carol");
    }

    #[test]
    fn test_export_then_import_is_stable() {
        let mut store = GovStore::new(MemoryStore::new());
        let mut genesis = GenesisState::default_for("stake");
        genesis.constitution = "be excellent".to_string();
        genesis.proposals = vec![proposal(4, ProposalStatus::Rejected)];
        init_genesis(&mut store, genesis).unwrap();

        let exported = export_genesis(&store).unwrap();
        assert_eq!(exported.starting_proposal_id, 5);
        assert_eq!(exported.proposals.len(), 1);

        let mut reimported = GovStore::new(MemoryStore::new());
        init_genesis(&mut reimported, exported.clone()).unwrap();
        assert_eq!(export_genesis(&reimported).unwrap(), exported);
    }

    #[test]
    fn test_rejects_inconsistent_genesis() {
        let mut genesis = GenesisState::default_for("stake");
        genesis.proposals = vec![
            proposal(1, ProposalStatus::Passed),
            proposal(1, ProposalStatus::Passed),
        ];
        let mut store = GovStore::new(MemoryStore::new());
        assert!(matches!(
            init_genesis(&mut store, genesis),
            Err(GovError::InvalidRequest(_))
        ));

        let mut genesis = GenesisState::default_for("stake");
        genesis.deposits = vec![Deposit {
            proposal_id: 9,
            depositor: "bob".to_string(),
            amount: vec![],
        }];
        assert!(init_genesis(&mut store, genesis).is_err());

        let mut genesis = GenesisState::default_for("stake");
        genesis.params.quorum = "2".to_string();
        assert!(matches!(
            init_genesis(&mut store, genesis),
            Err(GovError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_vote_contribution_survives_export() {
        let mut store = GovStore::new(MemoryStore::new());
        let mut genesis = GenesisState::default_for("stake");
        genesis.proposals = vec![proposal(1, ProposalStatus::VotingPeriod)];
        let mut contribution = TallyResult::default();
        contribution.add(VoteOption::No, &Amount::from(500u64));
        genesis.votes = vec![GenesisVote {
            vote: Vote {
                proposal_id: 1,
                voter: "dave".to_string(),
                options: vec![WeightedVoteOption {
                    option: VoteOption::No,
                    weight: "1.0".to_string(),
                }],
                metadata: String::new(),
            },
            contribution: contribution.clone(),
        }];
        init_genesis(&mut store, genesis).unwrap();

        let record = store.vote_record(1, "dave").unwrap().unwrap();
        assert_eq!(record.contribution, contribution);

        let json = serde_json::to_value(export_genesis(&store).unwrap()).unwrap();
        assert_eq!(json["votes"][0]["voter"], "dave");
        assert_eq!(json["votes"][0]["proposal_id"], "1");
        assert_eq!(json["votes"][0]["contribution"]["no_count"], "500");
    }

    #[test]
    fn test_vote_without_contribution_is_rejected() {
        let result: Result<GenesisState, _> = serde_json::from_value(serde_json::json!({
            "params": Params::default_for("stake"),
            "proposals": [proposal(1, ProposalStatus::VotingPeriod)],
            "votes": [{
                "proposal_id": "1",
                "voter": "dave",
                "options": [{"option": 1, "weight": "1.0"}],
                "metadata": ""
            }]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_export_at_max_proposal_id() {
        let mut store = GovStore::new(MemoryStore::new());
        let mut genesis = GenesisState::default_for("stake");
        genesis.starting_proposal_id = u64::MAX;
        genesis.proposals = vec![proposal(u64::MAX, ProposalStatus::Passed)];
        init_genesis(&mut store, genesis).unwrap();

        assert!(matches!(
            export_genesis(&store),
            Err(GovError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_genesis_json_defaults() {
        let genesis: GenesisState = serde_json::from_value(serde_json::json!({
            "params": Params::default_for("stake"),
        }))
        .unwrap();
        assert_eq!(genesis, GenesisState::default_for("stake"));
    }
}
