//! End-of-block resolution.
//!
//! Once per block, with the finalized block time `t`:
//!
//! 1. Deposit-period proposals whose `deposit_end_time <= t` are deleted
//!    together with their deposit and vote records. Deposits are not refunded.
//! 2. Voting-period proposals whose `voting_end_time <= t` leave the active set
//!    and are tallied: quorum, then veto, then threshold. A proposal that
//!    clears all three has its messages executed and ends PASSED or FAILED.
//!
//! Active sets are walked in ascending id order. The sweep never fails
//! because of a proposal's content; a failing message becomes a FAILED status.

use chrono::{DateTime, Utc};

use super::error::GovResult;
use super::events;
use super::executor::execute_proposal;
use super::params::Params;
use super::store::GovStore;
use super::types::{Proposal, ProposalStatus, TallyResult};
use crate::host::{Bank, KvStore, MessageExecutor, StakeQuery};
use crate::math::{mul_ratio, Amount};

pub const REASON_LACK_OF_QUORUM: &str = "lack of quorum";
pub const REASON_VETOED: &str = "vetoed";
pub const REASON_NOT_ENOUGH_YES: &str = "not enough yes votes";

/// Result of tallying a proposal whose voting period ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyOutcome {
    LackOfQuorum,
    Vetoed,
    NotEnoughYes,
    Passed,
}

impl TallyOutcome {
    /// Rejection reason, `None` when the proposal passed.
    pub fn failed_reason(&self) -> Option<&'static str> {
        match self {
            TallyOutcome::LackOfQuorum => Some(REASON_LACK_OF_QUORUM),
            TallyOutcome::Vetoed => Some(REASON_VETOED),
            TallyOutcome::NotEnoughYes => Some(REASON_NOT_ENOUGH_YES),
            TallyOutcome::Passed => None,
        }
    }
}

/// Proposals touched by one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndBlockSummary {
    /// Deleted for not reaching the minimum deposit in time.
    pub expired: Vec<u64>,
    /// Tallied, with their final status.
    pub resolved: Vec<(u64, ProposalStatus)>,
}

/// Decide a tally against `total_stake`.
///
/// - `voted < total_stake * quorum` rejects for lack of quorum
/// - `no_with_veto >= voted * veto_threshold` rejects as vetoed
/// - `yes < voted * threshold` rejects for not enough yes votes
pub fn evaluate_tally(
    tally: &TallyResult,
    total_stake: &Amount,
    params: &Params,
) -> GovResult<TallyOutcome> {
    let voted = tally.total();

    let quorum_amount = mul_ratio(total_stake, &params.quorum)?;
    tracing::debug!(%total_stake, %quorum_amount, %voted, "proposal quorum");
    if voted < quorum_amount {
        return Ok(TallyOutcome::LackOfQuorum);
    }

    let veto_amount = mul_ratio(&voted, &params.veto_threshold)?;
    tracing::debug!(
        veto_count = %tally.no_with_veto_count,
        threshold = %veto_amount,
        "proposal veto threshold"
    );
    if tally.no_with_veto_count >= veto_amount {
        return Ok(TallyOutcome::Vetoed);
    }

    let yes_needed = mul_ratio(&voted, &params.threshold)?;
    tracing::debug!(
        yes_count = %tally.yes_count,
        threshold = %yes_needed,
        "proposal yes threshold"
    );
    if tally.yes_count < yes_needed {
        return Ok(TallyOutcome::NotEnoughYes);
    }

    Ok(TallyOutcome::Passed)
}

/// Run the end-of-block sweep at `block_time`.
pub fn end_block<S, H>(
    store: &mut GovStore<S>,
    host: &mut H,
    block_time: DateTime<Utc>,
) -> GovResult<EndBlockSummary>
where
    S: KvStore,
    H: Bank + StakeQuery + MessageExecutor,
{
    let mut summary = EndBlockSummary {
        expired: expire_deposits(store, block_time)?,
        resolved: Vec::new(),
    };

    let ending = ending_voting_proposals(store, block_time)?;
    if ending.is_empty() {
        return Ok(summary);
    }
    tracing::debug!(count = ending.len(), "proposals ending voting period");

    let params = store.params()?;
    let total_stake = match query_total_stake(host, &params) {
        Ok(stake) => stake,
        Err(e) => {
            // Leave the proposals active; the next block retries.
            tracing::error!(error = %e, "total stake query failed, deferring tally");
            return Ok(summary);
        }
    };

    for mut proposal in ending {
        store.remove_active_voting_proposal(proposal.id)?;

        let outcome = evaluate_tally(&proposal.final_tally_result, &total_stake, &params)?;
        let result = match outcome.failed_reason() {
            Some(reason) => {
                proposal.status = ProposalStatus::Rejected;
                proposal.failed_reason = reason.to_string();
                tracing::info!(proposal_id = proposal.id, reason, "proposal rejected");
                events::ATTRIBUTE_VALUE_PROPOSAL_REJECTED
            }
            None => match execute_proposal(store, host, &proposal) {
                Ok(()) => {
                    proposal.status = ProposalStatus::Passed;
                    tracing::info!(
                        proposal_id = proposal.id,
                        "proposal passed and execution succeeded"
                    );
                    events::ATTRIBUTE_VALUE_PROPOSAL_PASSED
                }
                Err(reason) => {
                    tracing::info!(
                        proposal_id = proposal.id,
                        error = %reason,
                        "proposal passed and execution failed"
                    );
                    proposal.status = ProposalStatus::Failed;
                    proposal.failed_reason = reason;
                    events::ATTRIBUTE_VALUE_PROPOSAL_FAILED
                }
            },
        };

        store.set_proposal(&proposal)?;
        store.emit(events::proposal_resolved(proposal.id, result));
        summary.resolved.push((proposal.id, proposal.status));
    }

    Ok(summary)
}

fn expire_deposits<S: KvStore>(
    store: &mut GovStore<S>,
    block_time: DateTime<Utc>,
) -> GovResult<Vec<u64>> {
    let mut expired = Vec::new();
    for id in store.active_deposit_proposals()? {
        match store.proposal(id)? {
            Some(p) if p.status == ProposalStatus::DepositPeriod => {
                if p.deposit_end_time > block_time {
                    continue;
                }
                tracing::info!(
                    proposal_id = id,
                    reason = "deposit period expired",
                    "deleting proposal"
                );
                store.remove_proposal(id)?;
                store.emit(events::proposal_dropped(id));
                expired.push(id);
            }
            _ => {}
        }
        store.remove_active_deposit_proposal(id)?;
    }
    Ok(expired)
}

fn ending_voting_proposals<S: KvStore>(
    store: &mut GovStore<S>,
    block_time: DateTime<Utc>,
) -> GovResult<Vec<Proposal>> {
    let mut ending = Vec::new();
    for id in store.active_voting_proposals()? {
        match store.proposal(id)? {
            Some(p) if p.status == ProposalStatus::VotingPeriod => {
                if p.voting_end_time <= block_time {
                    ending.push(p);
                }
            }
            _ => store.remove_active_voting_proposal(id)?,
        }
    }
    Ok(ending)
}

fn query_total_stake<H: Bank + StakeQuery>(host: &H, params: &Params) -> GovResult<Amount> {
    let token = host.token_address(params.bond_denom()?)?;
    Ok(host.total_supply(&token)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(quorum: &str, threshold: &str, veto: &str) -> Params {
        let mut p = Params::default_for("stake");
        p.quorum = quorum.to_string();
        p.threshold = threshold.to_string();
        p.veto_threshold = veto.to_string();
        p
    }

    fn tally(yes: u64, abstain: u64, no: u64, veto: u64) -> TallyResult {
        TallyResult {
            yes_count: yes.into(),
            abstain_count: abstain.into(),
            no_count: no.into(),
            no_with_veto_count: veto.into(),
        }
    }

    #[test]
    fn test_quorum_boundary_is_strict() {
        let p = params("0.25", "0.5", "0.334");
        let total = Amount::from(1000);

        // voted == quorum_amount is enough
        assert_eq!(
            evaluate_tally(&tally(250, 0, 0, 0), &total, &p).unwrap(),
            TallyOutcome::Passed
        );
        // one short is not
        assert_eq!(
            evaluate_tally(&tally(249, 0, 0, 0), &total, &p).unwrap(),
            TallyOutcome::LackOfQuorum
        );
    }

    #[test]
    fn test_veto_boundary_is_inclusive() {
        let p = params("0", "0.5", "0.25");
        let total = Amount::from(1000);

        // veto_amount = 100 * 0.25 = 25
        assert_eq!(
            evaluate_tally(&tally(75, 0, 0, 25), &total, &p).unwrap(),
            TallyOutcome::Vetoed
        );
        assert_eq!(
            evaluate_tally(&tally(76, 0, 0, 24), &total, &p).unwrap(),
            TallyOutcome::Passed
        );
    }

    #[test]
    fn test_threshold() {
        let p = params("0", "0.5", "0.334");
        let total = Amount::from(1000);

        // yes_needed = 50
        assert_eq!(
            evaluate_tally(&tally(49, 0, 51, 0), &total, &p).unwrap(),
            TallyOutcome::NotEnoughYes
        );
        assert_eq!(
            evaluate_tally(&tally(50, 0, 50, 0), &total, &p).unwrap(),
            TallyOutcome::Passed
        );
    }

    #[test]
    fn test_abstain_counts_toward_quorum_and_threshold_base() {
        let p = params("0.5", "0.5", "0.334");
        let total = Amount::from(100);

        // voted = 60 meets quorum 50; yes_needed = 30
        assert_eq!(
            evaluate_tally(&tally(30, 30, 0, 0), &total, &p).unwrap(),
            TallyOutcome::Passed
        );
        assert_eq!(
            evaluate_tally(&tally(29, 31, 0, 0), &total, &p).unwrap(),
            TallyOutcome::NotEnoughYes
        );
    }

    #[test]
    fn test_no_votes_at_all() {
        // zero stake, zero votes: quorum passes (0 < 0 is false), veto triggers (0 >= 0)
        let p = Params::default_for("stake");
        assert_eq!(
            evaluate_tally(&TallyResult::default(), &Amount::zero(), &p).unwrap(),
            TallyOutcome::Vetoed
        );
        // nonzero stake, zero votes: lack of quorum
        assert_eq!(
            evaluate_tally(&TallyResult::default(), &Amount::from(10), &p).unwrap(),
            TallyOutcome::LackOfQuorum
        );
    }

    #[test]
    fn test_failed_reasons() {
        assert_eq!(TallyOutcome::LackOfQuorum.failed_reason(), Some("lack of quorum"));
        assert_eq!(TallyOutcome::Vetoed.failed_reason(), Some("vetoed"));
        assert_eq!(
            TallyOutcome::NotEnoughYes.failed_reason(),
            Some("not enough yes votes")
        );
        assert_eq!(TallyOutcome::Passed.failed_reason(), None);
    }
}
