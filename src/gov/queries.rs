//! Read-only queries.

use super::error::{GovError, GovResult};
use super::msg::*;
use super::store::GovStore;
use super::types::{merge_coins, Deposit, Proposal, ProposalStatus};
use crate::host::KvStore;

pub fn get_proposal<S: KvStore>(
    store: &GovStore<S>,
    req: &QueryProposalRequest,
) -> GovResult<QueryProposalResponse> {
    Ok(QueryProposalResponse {
        proposal: store.proposal(req.proposal_id)?,
    })
}

/// Proposals in id order (descending with `reverse`), filtered, then paged.
/// `pagination.total` counts every match.
pub fn get_proposals<S: KvStore>(
    store: &GovStore<S>,
    req: &QueryProposalsRequest,
) -> GovResult<QueryProposalsResponse> {
    let status = match req.proposal_status.as_str() {
        "" => None,
        s => Some(s.parse::<ProposalStatus>().map_err(GovError::InvalidRequest)?),
    }
    .filter(|s| *s != ProposalStatus::Unspecified);

    let first = store.proposal_id_first()?.max(1);
    let last = store.proposal_id_last()?;

    let mut proposals: Vec<Proposal> = Vec::new();
    for id in first..=last {
        let Some(proposal) = store.proposal(id)? else {
            continue;
        };
        if status.is_some_and(|s| s != proposal.status) {
            continue;
        }
        if !req.voter.is_empty() && store.vote_record(id, &req.voter)?.is_none() {
            continue;
        }
        if !req.depositor.is_empty()
            && !store
                .deposits(id)?
                .iter()
                .any(|d| d.depositor == req.depositor)
        {
            continue;
        }
        proposals.push(proposal);
    }

    if req.pagination.reverse {
        proposals.reverse();
    }
    let total = proposals.len() as u64;
    Ok(QueryProposalsResponse {
        proposals: req.pagination.apply(proposals),
        pagination: PageResponse { total },
    })
}

pub fn get_tally_result<S: KvStore>(
    store: &GovStore<S>,
    req: &QueryTallyResultRequest,
) -> GovResult<QueryTallyResultResponse> {
    Ok(QueryTallyResultResponse {
        tally: store
            .proposal(req.proposal_id)?
            .map(|p| p.final_tally_result),
    })
}

pub fn get_params<S: KvStore>(
    store: &GovStore<S>,
    _req: &QueryParamsRequest,
) -> GovResult<QueryParamsResponse> {
    Ok(QueryParamsResponse {
        params: store.params()?,
    })
}

pub fn get_vote<S: KvStore>(
    store: &GovStore<S>,
    req: &QueryVoteRequest,
) -> GovResult<QueryVoteResponse> {
    Ok(QueryVoteResponse {
        vote: store
            .vote_record(req.proposal_id, &req.voter)?
            .map(|r| r.vote),
    })
}

pub fn get_votes<S: KvStore>(
    store: &GovStore<S>,
    req: &QueryVotesRequest,
) -> GovResult<QueryVotesResponse> {
    let votes = store.votes(req.proposal_id)?;
    let total = votes.len() as u64;
    Ok(QueryVotesResponse {
        votes: req.pagination.apply(votes),
        pagination: PageResponse { total },
    })
}

/// Everything `depositor` put on the proposal, summed by denom.
pub fn get_deposit<S: KvStore>(
    store: &GovStore<S>,
    req: &QueryDepositRequest,
) -> GovResult<QueryDepositResponse> {
    let mut found = false;
    let mut amount = Vec::new();
    for deposit in store.deposits(req.proposal_id)? {
        if deposit.depositor == req.depositor {
            found = true;
            merge_coins(&mut amount, &deposit.amount);
        }
    }

    Ok(QueryDepositResponse {
        deposit: found.then(|| Deposit {
            proposal_id: req.proposal_id,
            depositor: req.depositor.clone(),
            amount,
        }),
    })
}

pub fn get_deposits<S: KvStore>(
    store: &GovStore<S>,
    req: &QueryDepositsRequest,
) -> GovResult<QueryDepositsResponse> {
    let deposits = store.deposits(req.proposal_id)?;
    let total = deposits.len() as u64;
    Ok(QueryDepositsResponse {
        deposits: req.pagination.apply(deposits),
        pagination: PageResponse { total },
    })
}
