//! Quorum - Governance Engine for Sovereign-Chain Modules
//!
//! Proposals carry opaque messages, collect deposits during a deposit
//! period, gather stake-weighted votes during a voting period, and are
//! resolved at block boundaries by a quorum / veto / threshold tally.
//! Passed proposals have their messages executed.
//!
//! Key principles:
//! - Deterministic: no wall clock, no randomness, ordered state
//! - All-or-nothing: a failed call leaves state and events untouched
//! - Host-agnostic: storage, funds and stake come through [`host`] traits
//! - Exact arithmetic: 18-decimal fixed-point fractions over big integers

pub mod gov;
pub mod host;
pub mod math;
pub mod serialization;
