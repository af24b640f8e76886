//! `quorum replay`: run a scripted block sequence against [`MockChain`].
//!
//! A script is JSON:
//!
//! ```json
//! {
//!   "start_time": "2024-01-01T00:00:00Z",
//!   "balances": [{"owner": "alice", "denom": "stake", "amount": "1000"}],
//!   "steps": [
//!     {"tx": {"SubmitProposal": {"proposer": "alice", "initial_deposit": [{"denom": "stake", "amount": "200"}]}}},
//!     {"tx": {"Vote": {"proposal_id": "1", "voter": "alice", "option": "yes"}}},
//!     {"advance": "2days"},
//!     "end_block"
//!   ]
//! }
//! ```
//!
//! `genesis` is optional and defaults to the config template. `tx` steps are
//! dispatched with an external origin; a failed step is reported and the
//! replay continues, as a chain would after a failed transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;

use quorum::gov::msg::MsgEndBlock;
use quorum::gov::types::timestamp;
use quorum::gov::{GenesisState, GovModule, GovRequest, Origin, Proposal};
use quorum::host::{BlockClock, MemoryStore, MockChain};
use quorum::math::Amount;

use super::config::QuorumConfig;

#[derive(Debug, Deserialize)]
pub struct ReplayScript {
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub balances: Vec<Balance>,
    #[serde(default)]
    pub genesis: Option<GenesisState>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
pub struct Balance {
    pub owner: String,
    pub denom: String,
    pub amount: Amount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// A request envelope from outside the chain
    Tx(serde_json::Value),
    /// Move the block clock forward by a human-readable duration
    Advance(String),
    /// Run the end-of-block sweep at the current block time
    EndBlock,
}

#[derive(Debug, Serialize)]
pub struct StepOutcome {
    pub index: usize,
    pub action: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub steps: Vec<StepOutcome>,
    pub proposals: Vec<Proposal>,
    pub events: usize,
    pub state_root: String,
}

/// Replay `script`, falling back to `default_genesis` when it carries none.
pub fn run(
    script: ReplayScript,
    default_genesis: GenesisState,
) -> Result<ReplayReport, Box<dyn std::error::Error>> {
    let genesis = script.genesis.unwrap_or(default_genesis);
    let bond_denom = genesis.params.bond_denom()?.to_string();

    let mut chain = MockChain::new(script.start_time, &bond_denom);
    for balance in script.balances {
        chain.register_token(&balance.denom);
        chain.set_balance(&balance.owner, &balance.denom, balance.amount);
    }

    let mut module = GovModule::new(MemoryStore::new(), chain);
    module
        .init_genesis(genesis)
        .map_err(|e| format!("Failed to load genesis: {}", e))?;

    let mut outcomes = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.into_iter().enumerate() {
        let outcome = match step {
            Step::Tx(value) => {
                let action = serde_json::from_value::<GovRequest>(value.clone())
                    .map(|request| request.name().to_string())
                    .unwrap_or_else(|_| "invalid".to_string());
                let request = serde_json::to_vec(&value)?;
                settle(index, action, module.dispatch(Origin::External, &request))
            }
            Step::Advance(by) => {
                let by = humantime::parse_duration(&by)
                    .map_err(|e| format!("Step {}: invalid duration '{}': {}", index, by, e))?;
                let by = chrono::Duration::from_std(by)
                    .map_err(|e| format!("Step {}: duration out of range: {}", index, e))?;
                module.host_mut().advance(by);
                StepOutcome {
                    index,
                    action: "advance".to_string(),
                    ok: true,
                    response: None,
                    error: None,
                }
            }
            Step::EndBlock => {
                let now = module.host().current_block_timestamp();
                let request = serde_json::to_vec(&GovRequest::EndBlock(MsgEndBlock::for_time(now)?))?;
                settle(
                    index,
                    "EndBlock".to_string(),
                    module.dispatch(Origin::Internal, &request),
                )
            }
        };
        if let Some(error) = &outcome.error {
            tracing::warn!(step = index, action = %outcome.action, %error, "step failed");
        }
        outcomes.push(outcome);
    }

    let proposals = module.export_genesis()?.proposals;
    let (store, chain) = module.into_parts();
    Ok(ReplayReport {
        steps: outcomes,
        proposals,
        events: chain.events().len(),
        state_root: store.state_root(),
    })
}

fn settle(
    index: usize,
    action: String,
    result: quorum::gov::GovResult<Vec<u8>>,
) -> StepOutcome {
    match result {
        Ok(bytes) => StepOutcome {
            index,
            action,
            ok: true,
            response: serde_json::from_slice(&bytes).ok(),
            error: None,
        },
        Err(e) => StepOutcome {
            index,
            action,
            ok: false,
            response: None,
            error: Some(e.to_string()),
        },
    }
}

pub fn execute(config: &QuorumConfig, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read replay script '{}': {}", path, e))?;
    let script: ReplayScript = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse replay script '{}': {}", path, e))?;

    tracing::info!(script = path, steps = script.steps.len(), "replaying");
    let report = run(script, config.genesis.to_genesis()?)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
