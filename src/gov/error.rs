//! Governance engine errors.

use thiserror::Error;

use super::types::ProposalStatus;
use crate::host::HostError;
use crate::math::DecimalError;
use crate::serialization::SerializationError;

/// Result type for governance operations.
pub type GovResult<T> = Result<T, GovError>;

/// Governance errors.
///
/// Any of these aborts the enclosing call; nothing it wrote is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovError {
    #[error("invalid proposal id: {0}")]
    ProposalNotFound(u64),

    /// Operation attempted outside its required lifecycle state.
    #[error("proposal {id} is in status {status}")]
    InvalidProposalStatus { id: u64, status: ProposalStatus },

    /// Deposit denom differs from the configured min-deposit denom.
    #[error("invalid denom; expected {expected}, got {got}")]
    InvalidDenom { expected: String, got: String },

    #[error("invalid vote option: {0}")]
    InvalidVoteOption(String),

    #[error("could not transfer coins by bank: {0}")]
    TransferFailed(String),

    #[error("message execution failed: {0}")]
    MessageExecutionFailed(String),

    #[error(transparent)]
    InvalidDecimal(#[from] DecimalError),

    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Malformed request envelope or payload.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal-only operation called from outside the chain.
    #[error("unauthorized: {0} is internal-only")]
    Unauthorized(String),

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),
}
