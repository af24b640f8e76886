//! Chain-level governance parameters.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::{GovError, GovResult};
use super::types::{string_u64, Coin};
use crate::math::{validate_fraction, Amount};

pub const DEFAULT_MIN_DEPOSIT_TOKENS: u64 = 10_000_000;
/// 48h in milliseconds.
pub const DEFAULT_DEPOSIT_PERIOD_MS: u64 = 172_800_000;
/// 48h in milliseconds.
pub const DEFAULT_VOTING_PERIOD_MS: u64 = 172_800_000;
pub const DEFAULT_QUORUM: &str = "0.334000000000000000";
pub const DEFAULT_THRESHOLD: &str = "0.500000000000000000";
pub const DEFAULT_VETO_THRESHOLD: &str = "0.334000000000000000";

/// Governance parameters, stored under the `params` key.
///
/// Unknown fields in incoming JSON are ignored, so full cosmos-style params
/// documents are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Exactly one coin; its denom is the only accepted deposit denom and the
    /// voting-power token.
    pub min_deposit: Vec<Coin>,
    /// Milliseconds.
    #[serde(with = "string_u64")]
    pub max_deposit_period: u64,
    /// Milliseconds.
    #[serde(with = "string_u64")]
    pub voting_period: u64,
    pub quorum: String,
    pub threshold: String,
    pub veto_threshold: String,
}

impl Params {
    pub fn default_for(bond_denom: &str) -> Self {
        Self {
            min_deposit: vec![Coin::new(bond_denom, DEFAULT_MIN_DEPOSIT_TOKENS)],
            max_deposit_period: DEFAULT_DEPOSIT_PERIOD_MS,
            voting_period: DEFAULT_VOTING_PERIOD_MS,
            quorum: DEFAULT_QUORUM.to_string(),
            threshold: DEFAULT_THRESHOLD.to_string(),
            veto_threshold: DEFAULT_VETO_THRESHOLD.to_string(),
        }
    }

    pub fn validate(&self) -> GovResult<()> {
        match self.min_deposit.as_slice() {
            [coin] if !coin.denom.is_empty() => {}
            [_] => return Err(GovError::InvalidParams("min_deposit denom is empty".into())),
            other => {
                return Err(GovError::InvalidParams(format!(
                    "min_deposit must hold exactly one coin, got {}",
                    other.len()
                )))
            }
        }

        for (name, value) in [
            ("quorum", &self.quorum),
            ("threshold", &self.threshold),
            ("veto_threshold", &self.veto_threshold),
        ] {
            validate_fraction(value)
                .map_err(|e| GovError::InvalidParams(format!("{}: {}", name, e)))?;
        }

        period(self.max_deposit_period)?;
        period(self.voting_period)?;
        Ok(())
    }

    /// The single min-deposit coin.
    pub fn min_deposit_coin(&self) -> GovResult<&Coin> {
        self.min_deposit
            .first()
            .ok_or_else(|| GovError::InvalidParams("min_deposit is empty".into()))
    }

    /// Denom of deposits and of the voting-power token.
    pub fn bond_denom(&self) -> GovResult<&str> {
        Ok(self.min_deposit_coin()?.denom.as_str())
    }

    pub fn min_deposit_amount(&self) -> GovResult<&Amount> {
        Ok(&self.min_deposit_coin()?.amount)
    }

    pub fn deposit_end(&self, start: DateTime<Utc>) -> GovResult<DateTime<Utc>> {
        add_period(start, self.max_deposit_period)
    }

    pub fn voting_end(&self, start: DateTime<Utc>) -> GovResult<DateTime<Utc>> {
        add_period(start, self.voting_period)
    }
}

fn period(ms: u64) -> GovResult<Duration> {
    i64::try_from(ms)
        .ok()
        .and_then(Duration::try_milliseconds)
        .ok_or_else(|| GovError::InvalidParams(format!("period out of range: {}ms", ms)))
}

fn add_period(start: DateTime<Utc>, ms: u64) -> GovResult<DateTime<Utc>> {
    start
        .checked_add_signed(period(ms)?)
        .ok_or_else(|| GovError::InvalidParams(format!("{} + {}ms overflows", start, ms)))
}
