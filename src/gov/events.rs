//! Event vocabulary emitted by the governance module.

use crate::host::Event;

pub const EVENT_TYPE_SUBMIT_PROPOSAL: &str = "submit_proposal";
pub const EVENT_TYPE_PROPOSAL_VOTE: &str = "proposal_vote";
pub const EVENT_TYPE_PROPOSAL_DEPOSIT: &str = "proposal_deposit";
pub const EVENT_TYPE_INACTIVE_PROPOSAL: &str = "inactive_proposal";
pub const EVENT_TYPE_ACTIVE_PROPOSAL: &str = "active_proposal";

pub const ATTRIBUTE_KEY_PROPOSAL_ID: &str = "proposal_id";
pub const ATTRIBUTE_KEY_PROPOSAL_MESSAGES: &str = "proposal_messages";
pub const ATTRIBUTE_KEY_VOTER: &str = "voter";
pub const ATTRIBUTE_KEY_OPTION: &str = "option";
pub const ATTRIBUTE_KEY_DEPOSITOR: &str = "depositor";
pub const ATTRIBUTE_KEY_AMOUNT: &str = "amount";
pub const ATTRIBUTE_KEY_VOTING_PERIOD_START: &str = "voting_period_start";
pub const ATTRIBUTE_KEY_PROPOSAL_RESULT: &str = "proposal_result";

pub const ATTRIBUTE_VALUE_PROPOSAL_DROPPED: &str = "proposal_dropped";
pub const ATTRIBUTE_VALUE_PROPOSAL_PASSED: &str = "proposal_passed";
pub const ATTRIBUTE_VALUE_PROPOSAL_REJECTED: &str = "proposal_rejected";
pub const ATTRIBUTE_VALUE_PROPOSAL_FAILED: &str = "proposal_failed";

/// `message_ids` are comma-joined.
pub fn submit_proposal(proposal_id: u64, message_ids: &[String]) -> Event {
    Event::new(EVENT_TYPE_SUBMIT_PROPOSAL)
        .attr(ATTRIBUTE_KEY_PROPOSAL_ID, proposal_id.to_string())
        .attr(ATTRIBUTE_KEY_PROPOSAL_MESSAGES, message_ids.join(","))
}

/// `options_json` is the JSON array of weighted options cast.
pub fn proposal_vote(proposal_id: u64, voter: &str, options_json: String) -> Event {
    Event::new(EVENT_TYPE_PROPOSAL_VOTE)
        .attr(ATTRIBUTE_KEY_VOTER, voter)
        .attr(ATTRIBUTE_KEY_OPTION, options_json)
        .attr(ATTRIBUTE_KEY_PROPOSAL_ID, proposal_id.to_string())
}

pub fn proposal_deposit(proposal_id: u64, depositor: &str, amount: String) -> Event {
    Event::new(EVENT_TYPE_PROPOSAL_DEPOSIT)
        .attr(ATTRIBUTE_KEY_PROPOSAL_ID, proposal_id.to_string())
        .attr(ATTRIBUTE_KEY_DEPOSITOR, depositor)
        .attr(ATTRIBUTE_KEY_AMOUNT, amount)
}

pub fn voting_period_start(proposal_id: u64) -> Event {
    Event::new(EVENT_TYPE_PROPOSAL_DEPOSIT)
        .attr(ATTRIBUTE_KEY_VOTING_PERIOD_START, proposal_id.to_string())
}

pub fn proposal_dropped(proposal_id: u64) -> Event {
    Event::new(EVENT_TYPE_INACTIVE_PROPOSAL)
        .attr(ATTRIBUTE_KEY_PROPOSAL_ID, proposal_id.to_string())
        .attr(ATTRIBUTE_KEY_PROPOSAL_RESULT, ATTRIBUTE_VALUE_PROPOSAL_DROPPED)
}

/// `result` is one of the `ATTRIBUTE_VALUE_PROPOSAL_*` outcomes.
pub fn proposal_resolved(proposal_id: u64, result: &str) -> Event {
    Event::new(EVENT_TYPE_ACTIVE_PROPOSAL)
        .attr(ATTRIBUTE_KEY_PROPOSAL_ID, proposal_id.to_string())
        .attr(ATTRIBUTE_KEY_PROPOSAL_RESULT, result)
}
