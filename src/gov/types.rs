//! Governance records: proposals, votes, deposits and their building blocks.
//!
//! Wire format follows the chain's JSON conventions:
//! - Integer amounts and ids are decimal strings
//! - Statuses and vote options are their protobuf enum numbers
//! - Timestamps are RFC3339 in UTC, with `0001-01-01T00:00:00Z` as "unset"

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::math::Amount;

/// Maximum stored length of proposal and vote metadata, in bytes.
pub const MAX_METADATA_LEN: usize = 255;

/// A single-denom amount.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Amount,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<Amount>) -> Self {
        Self {
            denom: denom.into(),
            amount: amount.into(),
        }
    }

    pub fn zero(denom: impl Into<String>) -> Self {
        Self::new(denom, Amount::zero())
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Add `coins` into `total`, merging by denom and appending unseen denoms.
pub fn merge_coins(total: &mut Vec<Coin>, coins: &[Coin]) {
    for coin in coins {
        match total.iter_mut().find(|c| c.denom == coin.denom) {
            Some(existing) => existing.amount += &coin.amount,
            None => total.push(coin.clone()),
        }
    }
}

/// `"10stake,5atom"`.
pub fn coins_to_string(coins: &[Coin]) -> String {
    coins
        .iter()
        .map(Coin::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Truncate `metadata` to at most [`MAX_METADATA_LEN`] bytes on a char boundary.
pub fn truncate_metadata(metadata: &str) -> String {
    if metadata.len() <= MAX_METADATA_LEN {
        return metadata.to_string();
    }
    let mut end = MAX_METADATA_LEN;
    while !metadata.is_char_boundary(end) {
        end -= 1;
    }
    metadata[..end].to_string()
}

/// Proposal lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum ProposalStatus {
    Unspecified,
    DepositPeriod,
    VotingPeriod,
    Passed,
    Rejected,
    Failed,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Unspecified => "PROPOSAL_STATUS_UNSPECIFIED",
            ProposalStatus::DepositPeriod => "PROPOSAL_STATUS_DEPOSIT_PERIOD",
            ProposalStatus::VotingPeriod => "PROPOSAL_STATUS_VOTING_PERIOD",
            ProposalStatus::Passed => "PROPOSAL_STATUS_PASSED",
            ProposalStatus::Rejected => "PROPOSAL_STATUS_REJECTED",
            ProposalStatus::Failed => "PROPOSAL_STATUS_FAILED",
        }
    }

    /// Whether the proposal can no longer change.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            ProposalStatus::Passed | ProposalStatus::Rejected | ProposalStatus::Failed
        )
    }
}

impl From<ProposalStatus> for i32 {
    fn from(status: ProposalStatus) -> i32 {
        match status {
            ProposalStatus::Unspecified => 0,
            ProposalStatus::DepositPeriod => 1,
            ProposalStatus::VotingPeriod => 2,
            ProposalStatus::Passed => 3,
            ProposalStatus::Rejected => 4,
            ProposalStatus::Failed => 5,
        }
    }
}

impl TryFrom<i32> for ProposalStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ProposalStatus::Unspecified),
            1 => Ok(ProposalStatus::DepositPeriod),
            2 => Ok(ProposalStatus::VotingPeriod),
            3 => Ok(ProposalStatus::Passed),
            4 => Ok(ProposalStatus::Rejected),
            5 => Ok(ProposalStatus::Failed),
            other => Err(format!("unknown proposal status {}", other)),
        }
    }
}

impl FromStr for ProposalStatus {
    type Err = String;

    /// Accepts the enum name (`PROPOSAL_STATUS_PASSED`) or its number (`"3"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.parse::<i32>() {
            return ProposalStatus::try_from(n);
        }
        [
            ProposalStatus::Unspecified,
            ProposalStatus::DepositPeriod,
            ProposalStatus::VotingPeriod,
            ProposalStatus::Passed,
            ProposalStatus::Rejected,
            ProposalStatus::Failed,
        ]
        .into_iter()
        .find(|status| status.as_str() == s)
        .ok_or_else(|| format!("unknown proposal status {}", s))
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vote choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum VoteOption {
    Unspecified,
    Yes,
    Abstain,
    No,
    NoWithVeto,
}

impl VoteOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteOption::Unspecified => "VOTE_OPTION_UNSPECIFIED",
            VoteOption::Yes => "VOTE_OPTION_YES",
            VoteOption::Abstain => "VOTE_OPTION_ABSTAIN",
            VoteOption::No => "VOTE_OPTION_NO",
            VoteOption::NoWithVeto => "VOTE_OPTION_NO_WITH_VETO",
        }
    }
}

impl From<VoteOption> for i32 {
    fn from(option: VoteOption) -> i32 {
        match option {
            VoteOption::Unspecified => 0,
            VoteOption::Yes => 1,
            VoteOption::Abstain => 2,
            VoteOption::No => 3,
            VoteOption::NoWithVeto => 4,
        }
    }
}

impl TryFrom<i32> for VoteOption {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VoteOption::Unspecified),
            1 => Ok(VoteOption::Yes),
            2 => Ok(VoteOption::Abstain),
            3 => Ok(VoteOption::No),
            4 => Ok(VoteOption::NoWithVeto),
            other => Err(format!("unknown vote option {}", other)),
        }
    }
}

impl FromStr for VoteOption {
    type Err = String;

    /// Accepts `yes|no|abstain|no_with_veto` in any case, with or without the
    /// `VOTE_OPTION_` prefix. `UNSPECIFIED` is not a castable option.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        match upper.strip_prefix("VOTE_OPTION_").unwrap_or(upper.as_str()) {
            "YES" => Ok(VoteOption::Yes),
            "ABSTAIN" => Ok(VoteOption::Abstain),
            "NO" => Ok(VoteOption::No),
            "NO_WITH_VETO" => Ok(VoteOption::NoWithVeto),
            _ => Err(s.to_string()),
        }
    }
}

impl fmt::Display for VoteOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(option, weight)` pair of a vote. `weight` is a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedVoteOption {
    pub option: VoteOption,
    pub weight: String,
}

/// Stake counted per option.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub yes_count: Amount,
    pub abstain_count: Amount,
    pub no_count: Amount,
    pub no_with_veto_count: Amount,
}

impl TallyResult {
    /// Add `amount` to the bucket for `option`. Unspecified counts nowhere.
    pub fn add(&mut self, option: VoteOption, amount: &Amount) {
        match option {
            VoteOption::Yes => self.yes_count += amount,
            VoteOption::Abstain => self.abstain_count += amount,
            VoteOption::No => self.no_count += amount,
            VoteOption::NoWithVeto => self.no_with_veto_count += amount,
            VoteOption::Unspecified => {}
        }
    }

    /// Add every bucket of `other`.
    pub fn merge(&mut self, other: &TallyResult) {
        self.yes_count += &other.yes_count;
        self.abstain_count += &other.abstain_count;
        self.no_count += &other.no_count;
        self.no_with_veto_count += &other.no_with_veto_count;
    }

    /// Subtract every bucket of `other`, flooring at zero.
    pub fn remove(&mut self, other: &TallyResult) {
        self.yes_count = self.yes_count.saturating_sub(&other.yes_count);
        self.abstain_count = self.abstain_count.saturating_sub(&other.abstain_count);
        self.no_count = self.no_count.saturating_sub(&other.no_count);
        self.no_with_veto_count = self
            .no_with_veto_count
            .saturating_sub(&other.no_with_veto_count);
    }

    /// Sum of all four buckets.
    pub fn total(&self) -> Amount {
        &(&(&self.yes_count + &self.no_count) + &self.abstain_count) + &self.no_with_veto_count
    }
}

/// A governance proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    #[serde(with = "string_u64")]
    pub id: u64,
    /// Base64-encoded serialized messages, executed in order if the proposal passes.
    pub messages: Vec<String>,
    pub status: ProposalStatus,
    pub final_tally_result: TallyResult,
    #[serde(with = "timestamp")]
    pub submit_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub deposit_end_time: DateTime<Utc>,
    pub total_deposit: Vec<Coin>,
    #[serde(with = "timestamp")]
    pub voting_start_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub voting_end_time: DateTime<Utc>,
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
    pub proposer: String,
    #[serde(default)]
    pub expedited: bool,
    #[serde(default)]
    pub failed_reason: String,
}

impl Proposal {
    /// Total deposited in `denom`, zero if none.
    pub fn deposit_of(&self, denom: &str) -> Amount {
        self.total_deposit
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount.clone())
            .unwrap_or_default()
    }
}

/// A voter's current vote on a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
    pub voter: String,
    pub options: Vec<WeightedVoteOption>,
    #[serde(default)]
    pub metadata: String,
}

/// Coins deposited on a proposal by one depositor in one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    #[serde(with = "string_u64")]
    pub proposal_id: u64,
    pub depositor: String,
    pub amount: Vec<Coin>,
}

/// The "unset" timestamp, `0001-01-01T00:00:00Z`.
pub fn zero_time() -> DateTime<Utc> {
    DateTime::from_timestamp(-62_135_596_800, 0).unwrap_or_default()
}

/// `u64` as a JSON string; accepts a string or a number on input.
pub mod string_u64 {
    use serde::{de, Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        struct U64Visitor;

        impl de::Visitor<'_> for U64Visitor {
            type Value = u64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an unsigned integer or a decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
                Ok(v)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
                if v.is_empty() {
                    return Ok(0);
                }
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(U64Visitor)
    }
}

/// RFC3339 timestamps in UTC with trailing-zero-trimmed fractional seconds.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn format(time: &DateTime<Utc>) -> String {
        time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn parse(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Ok(super::zero_time());
        }
        parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_proposal() -> Proposal {
        let submit = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Proposal {
            id: 7,
            messages: vec![],
            status: ProposalStatus::DepositPeriod,
            final_tally_result: TallyResult::default(),
            submit_time: submit,
            deposit_end_time: submit,
            total_deposit: vec![Coin::new("stake", 100u64)],
            voting_start_time: zero_time(),
            voting_end_time: zero_time(),
            metadata: String::new(),
            title: "t".to_string(),
            summary: "s".to_string(),
            proposer: "alice".to_string(),
            expedited: false,
            failed_reason: String::new(),
        }
    }

    #[test]
    fn test_zero_time_formats_as_year_one() {
        assert_eq!(timestamp::format(&zero_time()), "0001-01-01T00:00:00Z");
        assert_eq!(timestamp::parse("0001-01-01T00:00:00Z").unwrap(), zero_time());
    }

    #[test]
    fn test_proposal_wire_format() {
        let json = serde_json::to_value(sample_proposal()).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["status"], 1);
        assert_eq!(json["submit_time"], "2024-03-01T12:00:00Z");
        assert_eq!(json["voting_start_time"], "0001-01-01T00:00:00Z");
        assert_eq!(json["total_deposit"][0]["amount"], "100");
        assert_eq!(json["final_tally_result"]["yes_count"], "0");
    }

    #[test]
    fn test_proposal_accepts_numeric_id_and_nanos() {
        let mut json = serde_json::to_value(sample_proposal()).unwrap();
        json["id"] = serde_json::json!(9);
        json["submit_time"] = serde_json::json!("2024-03-01T12:00:00.123456789Z");
        let proposal: Proposal = serde_json::from_value(json).unwrap();
        assert_eq!(proposal.id, 9);
        assert_eq!(
            timestamp::format(&proposal.submit_time),
            "2024-03-01T12:00:00.123456789Z"
        );
    }

    #[test]
    fn test_vote_option_parsing() {
        assert_eq!("yes".parse::<VoteOption>(), Ok(VoteOption::Yes));
        assert_eq!("VOTE_OPTION_NO_WITH_VETO".parse::<VoteOption>(), Ok(VoteOption::NoWithVeto));
        assert_eq!("Abstain".parse::<VoteOption>(), Ok(VoteOption::Abstain));
        assert!("VOTE_OPTION_UNSPECIFIED".parse::<VoteOption>().is_err());
        assert!("maybe".parse::<VoteOption>().is_err());
        assert_eq!(serde_json::to_string(&VoteOption::No).unwrap(), "3");
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("PROPOSAL_STATUS_PASSED".parse::<ProposalStatus>(), Ok(ProposalStatus::Passed));
        assert_eq!("2".parse::<ProposalStatus>(), Ok(ProposalStatus::VotingPeriod));
        assert!("9".parse::<ProposalStatus>().is_err());
        assert!(serde_json::from_str::<ProposalStatus>("6").is_err());
    }

    #[test]
    fn test_merge_coins() {
        let mut total = vec![Coin::new("stake", 10u64)];
        merge_coins(&mut total, &[Coin::new("stake", 5u64), Coin::new("atom", 1u64)]);
        assert_eq!(total, vec![Coin::new("stake", 15u64), Coin::new("atom", 1u64)]);
        assert_eq!(coins_to_string(&total), "15stake,1atom");
    }

    #[test]
    fn test_truncate_metadata_respects_char_boundaries() {
        let ascii = "a".repeat(300);
        assert_eq!(truncate_metadata(&ascii).len(), MAX_METADATA_LEN);

        // 254 ASCII bytes then a 2-byte char straddling the limit
        let straddling = format!("{}é", "a".repeat(254));
        assert_eq!(truncate_metadata(&straddling), "a".repeat(254));

        assert_eq!(truncate_metadata("short"), "short");
    }

    #[test]
    fn test_tally_arithmetic() {
        let mut tally = TallyResult::default();
        tally.add(VoteOption::Yes, &Amount::from(10));
        tally.add(VoteOption::NoWithVeto, &Amount::from(3));
        tally.add(VoteOption::Unspecified, &Amount::from(100));
        assert_eq!(tally.total(), Amount::from(13));

        let mut prior = TallyResult::default();
        prior.add(VoteOption::Yes, &Amount::from(4));
        tally.remove(&prior);
        assert_eq!(tally.yes_count, Amount::from(6));
    }
}
