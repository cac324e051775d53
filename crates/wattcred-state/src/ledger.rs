//! Reference `sled`-tree-backed implementations of the `StakeLedger` and
//! `CreditLedger` traits (§6b), for tests and for any embedder that does not
//! have a real token contract on hand. Production embedders supply their own
//! implementation and inject it at `ProtocolEngine::new`.

use std::sync::Arc;

use tracing::debug;

use wattcred_core::error::ProtocolError;
use wattcred_core::ledger::{CreditLedger, StakeLedger};
use wattcred_core::types::{AccountId, Balance, ClaimKey, HourId, Wh};

use crate::db::StateDb;

/// A single flat `AccountId -> Balance` map backed by `StateDb::token_balances`.
/// `transfer_in`/`transfer_out` move value between an external balance and
/// protocol custody; this reference implementation treats "protocol custody"
/// as an opaque sink rather than crediting it anywhere, since no real token
/// supply is being modeled.
pub struct InMemoryStakeLedger {
    db: Arc<StateDb>,
}

impl InMemoryStakeLedger {
    pub fn new(db: Arc<StateDb>) -> Self {
        Self { db }
    }

    /// Test/seed helper: credit `account`'s external balance directly,
    /// bypassing `transfer_in`, the way a real token's `mint` would precede
    /// any `stake` call.
    pub fn credit(&self, account: AccountId, amount: Balance) -> Result<(), ProtocolError> {
        let bal = self.db.get_token_balance(&account)?;
        self.db.put_token_balance(&account, bal + amount)
    }
}

impl StakeLedger for InMemoryStakeLedger {
    fn transfer_in(&mut self, from: AccountId, amount: Balance) -> Result<(), ProtocolError> {
        let bal = self.db.get_token_balance(&from)?;
        if bal < amount {
            return Err(ProtocolError::InsufficientStakeBalance { need: amount, have: bal });
        }
        self.db.put_token_balance(&from, bal - amount)?;
        debug!(account = %from, amount, "stake-token transferred into custody");
        Ok(())
    }

    fn transfer_out(&mut self, to: AccountId, amount: Balance) -> Result<(), ProtocolError> {
        let bal = self.db.get_token_balance(&to)?;
        self.db.put_token_balance(&to, bal + amount)?;
        debug!(account = %to, amount, "stake-token transferred out of custody");
        Ok(())
    }

    fn balance_of(&self, account: AccountId) -> Balance {
        self.db.get_token_balance(&account).unwrap_or(0)
    }
}

/// Per-hour credit token, keyed `AccountId ‖ hour_id -> Wh`. The core is the
/// sole minter (§6); this reference implementation enforces nothing beyond
/// that callers only reach it through `Oracle::finalize`/`force_finalize`.
pub struct InMemoryCreditLedger {
    db: Arc<StateDb>,
}

impl InMemoryCreditLedger {
    pub fn new(db: Arc<StateDb>) -> Self {
        Self { db }
    }
}

impl CreditLedger for InMemoryCreditLedger {
    fn mint(&mut self, to: AccountId, hour_id: HourId, wh: Wh, claim_key: ClaimKey) -> Result<(), ProtocolError> {
        let bal = self.db.get_credit_balance(&to, hour_id)?;
        self.db.put_credit_balance(&to, hour_id, bal + wh)?;
        debug!(account = %to, hour_id, wh, claim_key = %claim_key, "minted credit units");
        Ok(())
    }

    fn burn(&mut self, from: AccountId, hour_id: HourId, wh: Wh) -> Result<(), ProtocolError> {
        let bal = self.db.get_credit_balance(&from, hour_id)?;
        if bal < wh {
            return Err(ProtocolError::InsufficientStakeBalance { need: wh as Balance, have: bal as Balance });
        }
        self.db.put_credit_balance(&from, hour_id, bal - wh)?;
        Ok(())
    }

    fn balance_of(&self, account: AccountId, hour_id: HourId) -> Wh {
        self.db.get_credit_balance(&account, hour_id).unwrap_or(0)
    }
}
