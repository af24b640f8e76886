//! In-memory chain for tests and offline replay.
//!
//! Provides every collaborator the governance engine needs:
//! - A multi-denom balance ledger with module accounts
//! - One token contract per denom (`balanceOf` / `totalSupply`)
//! - A message executor understanding a small JSON vocabulary
//! - A recorded event log and a settable block clock

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::traits::*;
use crate::gov::types::Coin;
use crate::math::Amount;

/// Mock chain implementing [`Host`].
///
/// Messages passed to [`MessageExecutor::execute`] are JSON objects:
/// - `{"SendCoins": {"from_address", "to_address", "amount": [Coin]}}` moves funds
/// - `{"Fail": {"reason": "..."}}` fails with `reason`
/// - anything else that is valid JSON succeeds and is only recorded
#[derive(Debug, Clone)]
pub struct MockChain {
    time: DateTime<Utc>,
    /// (owner, denom) -> balance
    balances: BTreeMap<(String, String), Amount>,
    /// denom -> token contract address
    tokens: BTreeMap<String, String>,
    events: Vec<Event>,
    executed: Vec<Vec<u8>>,
    transfers_disabled: bool,
}

#[derive(Deserialize)]
enum MockMessage {
    SendCoins {
        from_address: String,
        to_address: String,
        amount: Vec<Coin>,
    },
    Fail {
        reason: String,
    },
}

impl MockChain {
    /// Create a mock chain at block time `time` with a token for `bond_denom`.
    pub fn new(time: DateTime<Utc>, bond_denom: &str) -> Self {
        let mut chain = Self {
            time,
            balances: BTreeMap::new(),
            tokens: BTreeMap::new(),
            events: Vec::new(),
            executed: Vec::new(),
            transfers_disabled: false,
        };
        chain.register_token(bond_denom);
        chain
    }

    /// Register a token contract for `denom` at a deterministic address.
    pub fn register_token(&mut self, denom: &str) {
        self.tokens
            .insert(denom.to_string(), format!("token.{}", denom));
    }

    pub fn set_balance(&mut self, owner: &str, denom: &str, amount: impl Into<Amount>) {
        self.balances
            .insert((owner.to_string(), denom.to_string()), amount.into());
    }

    pub fn balance(&self, owner: &str, denom: &str) -> Amount {
        self.balances
            .get(&(owner.to_string(), denom.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_time(&mut self, time: DateTime<Utc>) {
        self.time = time;
    }

    pub fn advance(&mut self, by: Duration) {
        self.time += by;
    }

    /// Make every subsequent transfer fail (for atomicity tests).
    pub fn disable_transfers(&mut self, disabled: bool) {
        self.transfers_disabled = disabled;
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drain the recorded events.
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Messages successfully executed, in order.
    pub fn executed_messages(&self) -> &[Vec<u8>] {
        &self.executed
    }

    fn denom_of_token(&self, token: &str) -> HostResult<&str> {
        self.tokens
            .iter()
            .find(|(_, addr)| addr.as_str() == token)
            .map(|(denom, _)| denom.as_str())
            .ok_or_else(|| HostError::Query(format!("unknown token contract {}", token)))
    }

    fn move_coins(&mut self, from: &str, to: &str, coins: &[Coin]) -> HostResult<()> {
        // Check every denom's total before moving any.
        let mut needed: BTreeMap<&str, Amount> = BTreeMap::new();
        for coin in coins {
            *needed.entry(coin.denom.as_str()).or_default() += &coin.amount;
        }
        for (denom, amount) in &needed {
            let available = self.balance(from, denom);
            if &available < amount {
                return Err(HostError::Transfer(format!(
                    "insufficient funds: {} has {}{}, needs {}{}",
                    from, available, denom, amount, denom
                )));
            }
        }
        for coin in coins {
            let from_balance = self.balance(from, &coin.denom).saturating_sub(&coin.amount);
            self.set_balance(from, &coin.denom, from_balance);
            let to_balance = &self.balance(to, &coin.denom) + &coin.amount;
            self.set_balance(to, &coin.denom, to_balance);
        }
        Ok(())
    }
}

impl Bank for MockChain {
    fn transfer(&mut self, from: &str, to_module: &str, coins: &[Coin]) -> HostResult<()> {
        if self.transfers_disabled {
            return Err(HostError::Transfer("transfers disabled".to_string()));
        }
        self.move_coins(from, to_module, coins)
    }

    fn token_address(&self, denom: &str) -> HostResult<String> {
        self.tokens
            .get(denom)
            .cloned()
            .ok_or_else(|| HostError::UnknownDenom(denom.to_string()))
    }
}

impl StakeQuery for MockChain {
    fn balance_of(&self, token: &str, owner: &str) -> HostResult<Amount> {
        let denom = self.denom_of_token(token)?;
        Ok(self.balance(owner, denom))
    }

    fn total_supply(&self, token: &str) -> HostResult<Amount> {
        let denom = self.denom_of_token(token)?;
        Ok(self
            .balances
            .iter()
            .filter(|((_, d), _)| d == denom)
            .fold(Amount::zero(), |acc, (_, amount)| &acc + amount))
    }
}

impl MessageExecutor for MockChain {
    fn execute(&mut self, message: &[u8]) -> Result<(), String> {
        let value: serde_json::Value =
            serde_json::from_slice(message).map_err(|e| format!("invalid message: {}", e))?;

        match serde_json::from_value::<MockMessage>(value) {
            Ok(MockMessage::SendCoins {
                from_address,
                to_address,
                amount,
            }) => {
                self.move_coins(&from_address, &to_address, &amount)
                    .map_err(|e| e.to_string())?;
            }
            Ok(MockMessage::Fail { reason }) => return Err(reason),
            Err(_) => {}
        }

        self.executed.push(message.to_vec());
        Ok(())
    }
}

impl EventSink for MockChain {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

impl BlockClock for MockChain {
    fn current_block_timestamp(&self) -> DateTime<Utc> {
        self.time
    }
}
