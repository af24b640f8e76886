//! Execution of the messages embedded in a passed proposal.
//!
//! Messages are base64-encoded JSON. A message of the form
//! `{"UpdateParams":{"params":{...}}}` targets this module and is applied
//! directly; everything else goes to the chain's [`MessageExecutor`].

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;

use super::params::Params;
use super::store::GovStore;
use super::types::Proposal;
use crate::host::{KvStore, MessageExecutor};

/// Failure text for a message that is not valid base64.
pub const INVALID_MESSAGE_ENCODING: &str = "invalid message encoding";

#[derive(Deserialize)]
enum GovMessage {
    UpdateParams { params: Params },
}

/// Identifier of an encoded message for events: its `@type` when the decoded
/// JSON carries one, else the encoded string itself.
pub fn message_identifier(encoded: &str) -> String {
    STANDARD
        .decode(encoded)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(&bytes).ok())
        .and_then(|value| value.get("@type")?.as_str().map(str::to_string))
        .unwrap_or_else(|| encoded.to_string())
}

/// Execute every message of `proposal` in order.
///
/// Stops at the first failure and returns its text. Messages executed before
/// the failure keep their effects.
pub fn execute_proposal<S, E>(
    store: &mut GovStore<S>,
    executor: &mut E,
    proposal: &Proposal,
) -> Result<(), String>
where
    S: KvStore,
    E: MessageExecutor,
{
    for encoded in &proposal.messages {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|_| INVALID_MESSAGE_ENCODING.to_string())?;

        match serde_json::from_slice::<GovMessage>(&bytes) {
            Ok(GovMessage::UpdateParams { params }) => {
                params.validate().map_err(|e| e.to_string())?;
                store.set_params(&params).map_err(|e| e.to_string())?;
                tracing::info!(proposal_id = proposal.id, "governance params updated");
            }
            Err(_) => executor.execute(&bytes)?,
        }
    }
    Ok(())
}
