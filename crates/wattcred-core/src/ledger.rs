//! Narrow traits through which this core consumes the out-of-scope
//! stake-token and credit-token contracts named in §6, following the
//! injected-handle pattern §9 prescribes for cross-component wiring.
//!
//! Production embedders supply their own implementation and inject it at
//! `ProtocolEngine::new`; `wattcred-state::ledger` ships one reference
//! `sled`-tree-backed implementation of each for tests and for any embedder
//! that does not have a real token contract on hand.

use crate::error::ProtocolError;
use crate::types::{AccountId, Balance, ClaimKey, HourId, Wh};

/// The fungible stake token the Registry escrows and the Treasury pays
/// rewards from.
pub trait StakeLedger {
    /// Move `amount` from `from`'s external balance into protocol custody.
    fn transfer_in(&mut self, from: AccountId, amount: Balance) -> Result<(), ProtocolError>;

    /// Move `amount` out of protocol custody to `to`'s external balance.
    fn transfer_out(&mut self, to: AccountId, amount: Balance) -> Result<(), ProtocolError>;

    /// `account`'s external (non-custodied) balance.
    fn balance_of(&self, account: AccountId) -> Balance;
}

/// The per-hour credit token minted to producers on finalized production
/// claims. The core must be the sole minter.
pub trait CreditLedger {
    fn mint(
        &mut self,
        to: AccountId,
        hour_id: HourId,
        wh: Wh,
        claim_key: ClaimKey,
    ) -> Result<(), ProtocolError>;

    fn burn(&mut self, from: AccountId, hour_id: HourId, wh: Wh) -> Result<(), ProtocolError>;

    fn balance_of(&self, account: AccountId, hour_id: HourId) -> Wh;
}
