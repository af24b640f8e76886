//! Trait abstractions for the chain collaborators the governance engine calls.
//!
//! The engine owns no I/O. Persistence, funds movement, stake lookups, message
//! execution, events and block time all come through these traits, which
//! enables in-memory implementations for testing and replay.
//!
//! Every call is synchronous and happens inside the chain's single-writer,
//! per-block execution context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gov::types::Coin;
use crate::math::Amount;

/// Result type for collaborator calls.
pub type HostResult<T> = Result<T, HostError>;

/// Collaborator errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// Funds could not be moved.
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// No token contract is registered for a denom.
    #[error("no token registered for denom {0}")]
    UnknownDenom(String),

    /// A read query against another module failed.
    #[error("query failed: {0}")]
    Query(String),
}

/// Byte-oriented key-value storage.
///
/// Implementations must be deterministic; iteration order is never relied on
/// by the engine.
pub trait KvStore {
    /// Read a value, `None` if absent.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Write a value.
    fn set(&mut self, key: &[u8], value: Vec<u8>);

    /// Remove a value. Removing an absent key is a no-op.
    fn delete(&mut self, key: &[u8]);
}

/// Funds transfer between accounts and module accounts.
pub trait Bank {
    /// Move `coins` from `from` to the module account named `to_module`.
    fn transfer(&mut self, from: &str, to_module: &str, coins: &[Coin]) -> HostResult<()>;

    /// Resolve the token contract address backing `denom`.
    fn token_address(&self, denom: &str) -> HostResult<String>;
}

/// Token balance queries used for voting power.
pub trait StakeQuery {
    /// Balance of `owner` on the token at `token`.
    fn balance_of(&self, token: &str, owner: &str) -> HostResult<Amount>;

    /// Total supply of the token at `token`.
    fn total_supply(&self, token: &str) -> HostResult<Amount>;
}

/// Generic executor for serialized chain messages.
pub trait MessageExecutor {
    /// Execute one message. The error is the executor's failure text.
    fn execute(&mut self, message: &[u8]) -> Result<(), String>;
}

/// Sink for domain events. Fire-and-forget, order-preserving.
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

/// Source of the finalized block timestamp.
pub trait BlockClock {
    fn current_block_timestamp(&self) -> DateTime<Utc>;
}

/// Everything the engine needs from the surrounding chain.
pub trait Host: Bank + StakeQuery + MessageExecutor + EventSink + BlockClock {}

impl<T: Bank + StakeQuery + MessageExecutor + EventSink + BlockClock> Host for T {}

/// A typed event with ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    pub attributes: Vec<EventAttribute>,
}

/// One event attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
    pub index: bool,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    /// Append an indexed attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.into(),
            index: true,
        });
        self
    }

    /// Value of the first attribute named `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}
