//! Chain collaborators consumed by the governance engine.
//!
//! This module provides:
//! - Trait contracts for storage, bank, stake, message execution, events, clock
//! - An ordered in-memory key-value store with a state root
//! - A mock chain implementing every collaborator for tests and replay

pub mod memory;
pub mod mock;
pub mod traits;

pub use memory::MemoryStore;
pub use mock::MockChain;
pub use traits::{
    Bank, BlockClock, Event, EventAttribute, EventSink, Host, HostError, HostResult, KvStore,
    MessageExecutor, StakeQuery,
};
