//! Proposal lifecycle: submit, deposit, vote.
//!
//! Each operation validates first, then performs its external calls
//! (transfers, stake lookups), then writes. All writes and events go through
//! the [`GovStore`] overlay, so a failure at any step leaves no trace once
//! the caller discards.

use chrono::{DateTime, Utc};

use super::error::{GovError, GovResult};
use super::events;
use super::executor::message_identifier;
use super::msg::{MsgDeposit, MsgSubmitProposal, MsgVote, MsgVoteWeighted};
use super::params::Params;
use super::store::{GovStore, VoteRecord};
use super::types::{
    coins_to_string, merge_coins, truncate_metadata, zero_time, Coin, Deposit, Proposal,
    ProposalStatus, TallyResult, Vote, VoteOption, WeightedVoteOption,
};
use super::MODULE_NAME;
use crate::host::{Bank, BlockClock, HostError, KvStore, StakeQuery};
use crate::math::{mul_ratio, Amount};

/// Weight recorded for a single-option vote.
const FULL_WEIGHT: &str = "1.0";

/// Create a proposal and return its id.
pub fn submit_proposal<S, H>(
    store: &mut GovStore<S>,
    host: &mut H,
    msg: MsgSubmitProposal,
) -> GovResult<u64>
where
    S: KvStore,
    H: Bank + BlockClock,
{
    tracing::debug!(title = %msg.title, "submit proposal");

    let params = store.params()?;
    let min_deposit = params.min_deposit_coin()?;

    if let Some(first) = msg.initial_deposit.first() {
        if first.denom != min_deposit.denom {
            return Err(GovError::InvalidDenom {
                expected: min_deposit.denom.clone(),
                got: first.denom.clone(),
            });
        }
    }
    let mut total_deposit = Vec::new();
    merge_coins(&mut total_deposit, &msg.initial_deposit);
    if total_deposit.is_empty() {
        total_deposit.push(Coin::zero(min_deposit.denom.clone()));
    }

    let now = host.current_block_timestamp();
    let mut proposal = Proposal {
        id: 0,
        messages: msg.messages,
        status: ProposalStatus::DepositPeriod,
        final_tally_result: TallyResult::default(),
        submit_time: now,
        deposit_end_time: params.deposit_end(now)?,
        total_deposit,
        voting_start_time: zero_time(),
        voting_end_time: zero_time(),
        metadata: truncate_metadata(&msg.metadata),
        title: msg.title,
        summary: msg.summary,
        proposer: msg.proposer,
        expedited: msg.expedited,
        failed_reason: String::new(),
    };

    // Strictly greater: a deposit equal to the minimum stays in deposit period.
    if proposal.deposit_of(&min_deposit.denom) > min_deposit.amount {
        start_voting(&mut proposal, &params, now)?;
    }

    if !msg.initial_deposit.is_empty() {
        transfer(host, &proposal.proposer, &msg.initial_deposit)?;
    }

    let id = store.add_proposal(&mut proposal)?;
    match proposal.status {
        ProposalStatus::VotingPeriod => store.add_active_voting_proposal(id)?,
        _ => store.add_active_deposit_proposal(id)?,
    }
    if !msg.initial_deposit.is_empty() {
        store.add_deposit(&Deposit {
            proposal_id: id,
            depositor: proposal.proposer.clone(),
            amount: msg.initial_deposit,
        })?;
    }

    let message_ids: Vec<String> = proposal
        .messages
        .iter()
        .map(|m| message_identifier(m))
        .collect();
    store.emit(events::submit_proposal(id, &message_ids));

    tracing::info!(
        proposal_id = id,
        status = %proposal.status,
        proposer = %proposal.proposer,
        "proposal submitted"
    );
    Ok(id)
}

/// Add coins to a proposal still in its deposit period.
pub fn deposit<S, H>(store: &mut GovStore<S>, host: &mut H, msg: MsgDeposit) -> GovResult<()>
where
    S: KvStore,
    H: Bank + BlockClock,
{
    let mut proposal = store.require_proposal(msg.proposal_id)?;
    if proposal.status != ProposalStatus::DepositPeriod {
        return Err(GovError::InvalidProposalStatus {
            id: proposal.id,
            status: proposal.status,
        });
    }
    if msg.amount.is_empty() {
        return Err(GovError::InvalidRequest("deposit amount is empty".into()));
    }

    let params = store.params()?;
    transfer(host, &msg.depositor, &msg.amount)?;

    merge_coins(&mut proposal.total_deposit, &msg.amount);
    store.add_deposit(&Deposit {
        proposal_id: proposal.id,
        depositor: msg.depositor.clone(),
        amount: msg.amount.clone(),
    })?;
    store.emit(events::proposal_deposit(
        proposal.id,
        &msg.depositor,
        coins_to_string(&msg.amount),
    ));

    let min_deposit = params.min_deposit_coin()?;
    if proposal.deposit_of(&min_deposit.denom) > min_deposit.amount {
        start_voting(&mut proposal, &params, host.current_block_timestamp())?;
        store.remove_active_deposit_proposal(proposal.id)?;
        store.add_active_voting_proposal(proposal.id)?;
        store.emit(events::voting_period_start(proposal.id));
        tracing::info!(proposal_id = proposal.id, "voting period started");
    }

    store.set_proposal(&proposal)
}

/// Cast a single-option vote with the voter's full stake.
///
/// No status check is made: a proposal in its deposit period accepts votes,
/// and they count if it later reaches voting.
pub fn vote<S, H>(store: &mut GovStore<S>, host: &H, msg: MsgVote) -> GovResult<()>
where
    S: KvStore,
    H: Bank + StakeQuery,
{
    tracing::debug!(proposal_id = msg.proposal_id, option = %msg.option, "vote");

    let proposal = store.require_proposal(msg.proposal_id)?;
    let option: VoteOption = msg
        .option
        .parse()
        .map_err(GovError::InvalidVoteOption)?;

    let params = store.params()?;
    let stake = voting_power(host, &params, &msg.voter)?;
    let mut contribution = TallyResult::default();
    contribution.add(option, &stake);

    let options = vec![WeightedVoteOption {
        option,
        weight: FULL_WEIGHT.to_string(),
    }];
    record_vote(store, proposal, msg.voter, options, &msg.metadata, contribution)
}

/// Cast a vote split across options by decimal weight.
pub fn vote_weighted<S, H>(store: &mut GovStore<S>, host: &H, msg: MsgVoteWeighted) -> GovResult<()>
where
    S: KvStore,
    H: Bank + StakeQuery,
{
    let proposal = store.require_proposal(msg.proposal_id)?;
    if proposal.status != ProposalStatus::VotingPeriod {
        return Err(GovError::InvalidProposalStatus {
            id: proposal.id,
            status: proposal.status,
        });
    }
    if msg.option.is_empty() {
        return Err(GovError::InvalidVoteOption("no options".into()));
    }
    if let Some(unspecified) = msg.option.iter().find(|o| o.option == VoteOption::Unspecified) {
        return Err(GovError::InvalidVoteOption(unspecified.option.to_string()));
    }

    let params = store.params()?;
    let stake = voting_power(host, &params, &msg.voter)?;
    let mut contribution = TallyResult::default();
    for weighted in &msg.option {
        contribution.add(weighted.option, &mul_ratio(&stake, &weighted.weight)?);
    }

    record_vote(store, proposal, msg.voter, msg.option, &msg.metadata, contribution)
}

/// Replace the voter's previous contribution with `contribution` and store
/// the vote.
fn record_vote<S: KvStore>(
    store: &mut GovStore<S>,
    mut proposal: Proposal,
    voter: String,
    options: Vec<WeightedVoteOption>,
    metadata: &str,
    contribution: TallyResult,
) -> GovResult<()> {
    if let Some(previous) = store.vote_record(proposal.id, &voter)? {
        proposal.final_tally_result.remove(&previous.contribution);
        tracing::debug!(proposal_id = proposal.id, voter = %voter, "replacing previous vote");
    }
    proposal.final_tally_result.merge(&contribution);

    let options_json = serde_json::to_string(&options)
        .map_err(|e| GovError::InvalidRequest(e.to_string()))?;
    store.set_vote_record(&VoteRecord {
        vote: Vote {
            proposal_id: proposal.id,
            voter: voter.clone(),
            options,
            metadata: truncate_metadata(metadata),
        },
        contribution,
    })?;
    store.set_proposal(&proposal)?;
    store.emit(events::proposal_vote(proposal.id, &voter, options_json));
    Ok(())
}

fn start_voting(proposal: &mut Proposal, params: &Params, now: DateTime<Utc>) -> GovResult<()> {
    proposal.status = ProposalStatus::VotingPeriod;
    proposal.voting_start_time = now;
    proposal.voting_end_time = params.voting_end(now)?;
    Ok(())
}

fn transfer<H: Bank>(host: &mut H, from: &str, coins: &[Coin]) -> GovResult<()> {
    host.transfer(from, MODULE_NAME, coins).map_err(|e| match e {
        HostError::Transfer(reason) => GovError::TransferFailed(reason),
        other => GovError::Host(other),
    })
}

/// Current stake of `voter` in the bond denom.
fn voting_power<H: Bank + StakeQuery>(host: &H, params: &Params, voter: &str) -> GovResult<Amount> {
    let token = host.token_address(params.bond_denom()?)?;
    Ok(host.balance_of(&token, voter)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryStore, MockChain};
    use chrono::TimeZone;

    fn setup() -> (GovStore<MemoryStore>, MockChain) {
        let mut store = GovStore::new(MemoryStore::new());
        let mut params = Params::default_for("stake");
        params.min_deposit = vec![Coin::new("stake", 100u64)];
        store.set_params(&params).unwrap();

        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut chain = MockChain::new(time, "stake");
        chain.set_balance("alice", "stake", 1_000u64);
        chain.set_balance("bob", "stake", 300u64);
        (store, chain)
    }

    fn submit(store: &mut GovStore<MemoryStore>, chain: &mut MockChain, amount: u64) -> GovResult<u64> {
        submit_proposal(
            store,
            chain,
            MsgSubmitProposal {
                proposer: "alice".to_string(),
                initial_deposit: vec![Coin::new("stake", amount)],
                title: "test".to_string(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_deposit_equal_to_minimum_does_not_promote() {
        let (mut store, mut chain) = setup();
        let id = submit(&mut store, &mut chain, 100).unwrap();

        let proposal = store.require_proposal(id).unwrap();
        assert_eq!(proposal.status, ProposalStatus::DepositPeriod);
        assert_eq!(proposal.voting_start_time, zero_time());
        assert!(store.active_deposit_proposals().unwrap().contains(&id));
        assert_eq!(chain.balance("gov", "stake"), Amount::from(100));
    }

    #[test]
    fn test_deposit_above_minimum_promotes_at_submit() {
        let (mut store, mut chain) = setup();
        let id = submit(&mut store, &mut chain, 101).unwrap();

        let proposal = store.require_proposal(id).unwrap();
        assert_eq!(proposal.status, ProposalStatus::VotingPeriod);
        assert_eq!(proposal.voting_start_time, proposal.submit_time);
        assert!(store.active_voting_proposals().unwrap().contains(&id));
        assert!(store.active_deposit_proposals().unwrap().is_empty());
    }

    #[test]
    fn test_submit_rejects_wrong_denom() {
        let (mut store, mut chain) = setup();
        let result = submit_proposal(
            &mut store,
            &mut chain,
            MsgSubmitProposal {
                proposer: "alice".to_string(),
                initial_deposit: vec![Coin::new("atom", 500u64)],
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(GovError::InvalidDenom { .. })));
    }

    #[test]
    fn test_submit_without_deposit_uses_zero_coin() {
        let (mut store, mut chain) = setup();
        let id = submit_proposal(
            &mut store,
            &mut chain,
            MsgSubmitProposal {
                proposer: "alice".to_string(),
                ..Default::default()
            },
        )
        .unwrap();

        let proposal = store.require_proposal(id).unwrap();
        assert_eq!(proposal.total_deposit, vec![Coin::zero("stake")]);
        assert!(store.deposits(id).unwrap().is_empty());
    }

    #[test]
    fn test_submit_merges_repeated_denoms() {
        let (mut store, mut chain) = setup();
        let id = submit_proposal(
            &mut store,
            &mut chain,
            MsgSubmitProposal {
                proposer: "alice".to_string(),
                initial_deposit: vec![Coin::new("stake", 60u64), Coin::new("stake", 60u64)],
                ..Default::default()
            },
        )
        .unwrap();

        let proposal = store.require_proposal(id).unwrap();
        assert_eq!(proposal.total_deposit, vec![Coin::new("stake", 120u64)]);
        assert_eq!(proposal.status, ProposalStatus::VotingPeriod);
        assert_eq!(chain.balance("gov", "stake"), Amount::from(120));
    }

    #[test]
    fn test_submit_transfer_failure() {
        let (mut store, mut chain) = setup();
        let result = submit(&mut store, &mut chain, 5_000);
        assert!(matches!(result, Err(GovError::TransferFailed(_))));
    }

    #[test]
    fn test_deposit_promotes_past_minimum() {
        let (mut store, mut chain) = setup();
        let id = submit(&mut store, &mut chain, 50).unwrap();

        let top_up = |amount: u64| MsgDeposit {
            proposal_id: id,
            depositor: "bob".to_string(),
            amount: vec![Coin::new("stake", amount)],
        };

        deposit(&mut store, &mut chain, top_up(50)).unwrap();
        assert_eq!(store.require_proposal(id).unwrap().status, ProposalStatus::DepositPeriod);

        deposit(&mut store, &mut chain, top_up(1)).unwrap();
        let proposal = store.require_proposal(id).unwrap();
        assert_eq!(proposal.status, ProposalStatus::VotingPeriod);
        assert_eq!(proposal.total_deposit, vec![Coin::new("stake", 101u64)]);
        assert_eq!(store.deposits(id).unwrap().len(), 3);

        let err = deposit(&mut store, &mut chain, top_up(1)).unwrap_err();
        assert!(matches!(err, GovError::InvalidProposalStatus { .. }));
    }

    #[test]
    fn test_vote_counts_full_stake_and_replaces() {
        let (mut store, mut chain) = setup();
        let id = submit(&mut store, &mut chain, 101).unwrap();
        // alice now holds 899 after the deposit

        let ballot = |option: &str| MsgVote {
            proposal_id: id,
            voter: "alice".to_string(),
            option: option.to_string(),
            metadata: String::new(),
        };

        vote(&mut store, &chain, ballot("yes")).unwrap();
        let tally = store.require_proposal(id).unwrap().final_tally_result;
        assert_eq!(tally.yes_count, Amount::from(899));

        vote(&mut store, &chain, ballot("no")).unwrap();
        let tally = store.require_proposal(id).unwrap().final_tally_result;
        assert_eq!(tally.yes_count, Amount::zero());
        assert_eq!(tally.no_count, Amount::from(899));
        assert_eq!(store.votes(id).unwrap().len(), 1);
    }

    #[test]
    fn test_vote_rejects_unknown_option() {
        let (mut store, mut chain) = setup();
        let id = submit(&mut store, &mut chain, 101).unwrap();
        let err = vote(
            &mut store,
            &chain,
            MsgVote {
                proposal_id: id,
                voter: "bob".to_string(),
                option: "maybe".to_string(),
                metadata: String::new(),
            },
        )
        .unwrap_err();
        assert_eq!(err, GovError::InvalidVoteOption("maybe".to_string()));
    }

    #[test]
    fn test_weighted_vote_splits_stake() {
        let (mut store, mut chain) = setup();
        let id = submit(&mut store, &mut chain, 101).unwrap();

        vote_weighted(
            &mut store,
            &chain,
            MsgVoteWeighted {
                proposal_id: id,
                voter: "bob".to_string(),
                option: vec![
                    WeightedVoteOption {
                        option: VoteOption::Yes,
                        weight: "0.7".to_string(),
                    },
                    WeightedVoteOption {
                        option: VoteOption::NoWithVeto,
                        weight: "0.3".to_string(),
                    },
                ],
                metadata: String::new(),
            },
        )
        .unwrap();

        let tally = store.require_proposal(id).unwrap().final_tally_result;
        assert_eq!(tally.yes_count, Amount::from(210));
        assert_eq!(tally.no_with_veto_count, Amount::from(90));
    }

    #[test]
    fn test_weighted_vote_requires_voting_period() {
        let (mut store, mut chain) = setup();
        let id = submit(&mut store, &mut chain, 10).unwrap();

        let err = vote_weighted(
            &mut store,
            &chain,
            MsgVoteWeighted {
                proposal_id: id,
                voter: "bob".to_string(),
                option: vec![WeightedVoteOption {
                    option: VoteOption::Yes,
                    weight: "1".to_string(),
                }],
                metadata: String::new(),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            GovError::InvalidProposalStatus {
                id,
                status: ProposalStatus::DepositPeriod
            }
        );
    }

    #[test]
    fn test_missing_proposal() {
        let (mut store, mut chain) = setup();
        let err = deposit(
            &mut store,
            &mut chain,
            MsgDeposit {
                proposal_id: 42,
                depositor: "bob".to_string(),
                amount: vec![Coin::new("stake", 1u64)],
            },
        )
        .unwrap_err();
        assert_eq!(err, GovError::ProposalNotFound(42));
    }
}
