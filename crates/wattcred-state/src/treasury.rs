use std::sync::Arc;

use tracing::{info, warn};
use wattcred_core::config::{FaultKind, ProtocolConfig};
use wattcred_core::constants::BPS_DENOMINATOR;
use wattcred_core::error::ProtocolError;
use wattcred_core::events::Event;
use wattcred_core::ledger::StakeLedger;
use wattcred_core::types::{AccountId, Balance, Bitmap16, SnapshotId, Wh};

use crate::db::StateDb;
use crate::registry::Registry;

/// Reward pool, pending-reward ledger, fault counter, and slashed-set.
/// Receives bitmap-encoded winner/loser lists keyed to a snapshot and
/// performs arithmetic against the pool, mirroring the stake-adjustment
/// arithmetic in `chronx_core::account` generalised to a shared pool instead
/// of per-account balances.
pub struct Treasury {
    db: Arc<StateDb>,
    registry: Arc<Registry>,
    /// This component's own identity, wired into `Registry` once at
    /// construction so `Registry::reduce_stake`/`increment_faults` can tell
    /// a Treasury-originated call from any other caller (§9, Open Question #2).
    authority_id: AccountId,
}

impl Treasury {
    pub fn new(db: Arc<StateDb>, registry: Arc<Registry>) -> Self {
        let authority_id = AccountId::from_bytes(wattcred_crypto::keccak256(b"wattcred:treasury-authority:v1"));
        Self { db, registry, authority_id }
    }

    pub fn authority_id(&self) -> AccountId {
        self.authority_id
    }

    /// Non-mutating check that `distribute_rewards(winner_bitmap, _, wh)`
    /// would not fail `InsufficientRewardPool`. Called by the Oracle *before*
    /// it persists a finalized bucket or runs the mint/store side-effect, so
    /// a pool shortfall is caught ahead of any write instead of after — this
    /// crate has no multi-tree transaction wrapper around `apply` (§5), so
    /// the only way to keep finalize atomic against this particular failure
    /// is to validate before mutating rather than roll back after.
    pub fn ensure_reward_pool_sufficient(&self, winner_bitmap: Bitmap16, wh: Wh) -> Result<(), ProtocolError> {
        let winners = winner_bitmap.count_ones() as u64;
        let config = self.registry.config()?;
        if winners == 0 || wh == 0 || config.reward_per_wh == 0 {
            return Ok(());
        }
        let total = wh as Balance * config.reward_per_wh;
        let pool = self.db.get_reward_pool()?;
        if total > pool {
            return Err(ProtocolError::InsufficientRewardPool { need: total, have: pool });
        }
        Ok(())
    }

    /// `winners = popcount(winnerBitmap)`; zero winners, zero energy, or a
    /// zero reward rate all short-circuit to a zero-reward event rather than
    /// a division by zero.
    pub fn distribute_rewards(
        &self,
        winner_bitmap: Bitmap16,
        snapshot_id: SnapshotId,
        wh: Wh,
    ) -> Result<Vec<Event>, ProtocolError> {
        let winners = winner_bitmap.count_ones() as u64;
        let config = self.registry.config()?;

        if winners == 0 || wh == 0 || config.reward_per_wh == 0 {
            info!(snapshot_id, "zero-reward distribution");
            return Ok(vec![Event::RewardsDistributed {
                winner_bitmap,
                snapshot_id,
                total_distributed: 0,
            }]);
        }

        let total = wh as Balance * config.reward_per_wh;
        let pool = self.db.get_reward_pool()?;
        if total > pool {
            return Err(ProtocolError::InsufficientRewardPool { need: total, have: pool });
        }
        let per_winner = total / winners as Balance;
        let total_distributed = per_winner * winners as Balance;

        let snapshot = self
            .registry
            .get_snapshot(snapshot_id)?
            .ok_or(ProtocolError::SnapshotNotFound(snapshot_id))?;
        for (i, verifier) in snapshot.verifiers.iter().enumerate() {
            if winner_bitmap & (1u16 << i) != 0 {
                let pending = self.db.get_pending_rewards(verifier)?;
                self.db.put_pending_rewards(verifier, pending + per_winner)?;
            }
        }
        self.db.put_reward_pool(pool - total_distributed)?;

        info!(snapshot_id, total_distributed, "distributed rewards");
        Ok(vec![Event::RewardsDistributed { winner_bitmap, snapshot_id, total_distributed }])
    }

    /// Increment the fault counter for every verifier set in `loser_bitmap`
    /// against `snapshot_id`, auto-slashing any that cross the threshold.
    pub fn record_faults(
        &self,
        loser_bitmap: Bitmap16,
        snapshot_id: SnapshotId,
        kind: FaultKind,
    ) -> Result<Vec<Event>, ProtocolError> {
        let snapshot = self
            .registry
            .get_snapshot(snapshot_id)?
            .ok_or(ProtocolError::SnapshotNotFound(snapshot_id))?;
        let mut events = Vec::new();
        for (i, verifier) in snapshot.verifiers.iter().enumerate() {
            if loser_bitmap & (1u16 << i) != 0 {
                events.extend(self.record_fault_internal(*verifier, kind)?);
            }
        }
        Ok(events)
    }

    /// Record a single fault outside of a bitmap pass — used for the
    /// pre-abort `LateSubmission`/`DuplicateSubmission` writes (§7) that must
    /// persist even though the submission that triggered them is rejected.
    pub fn record_fault(&self, verifier: AccountId, kind: FaultKind) -> Result<Vec<Event>, ProtocolError> {
        self.record_fault_internal(verifier, kind)
    }

    fn record_fault_internal(&self, verifier: AccountId, kind: FaultKind) -> Result<Vec<Event>, ProtocolError> {
        let total_faults = self.registry.increment_faults(self.authority_id, verifier)?;
        warn!(verifier = %verifier, %kind, total_faults, "fault recorded");
        let mut events = vec![Event::FaultRecorded { verifier, kind, total_faults }];

        let config = self.registry.config()?;
        if config.slashing_disabled {
            return Ok(events);
        }
        if total_faults >= config.fault_threshold && !self.db.is_slashed(&verifier)? {
            events.extend(self.slash_internal(verifier, &config)?);
        }
        Ok(events)
    }

    /// Admin-invoked manual slash. A silent no-op when `slashingDisabled`
    /// (§4.3's "baseline switch"), idempotent otherwise via the `isSlashed`
    /// flag. Unlike the auto-slash path in `record_fault_internal` (which
    /// only ever fires once `faults >= fault_threshold` is already true),
    /// this entry point is reachable with any verifier, so it re-checks the
    /// threshold itself and fails `FaultThresholdNotReached` rather than
    /// letting an admin slash a verifier who hasn't actually crossed it.
    pub fn slash(&self, caller: AccountId, verifier: AccountId) -> Result<Vec<Event>, ProtocolError> {
        let config = self.registry.config()?;
        if config.admin != caller {
            return Err(ProtocolError::NotOwner);
        }
        if config.slashing_disabled {
            return Ok(Vec::new());
        }
        if self.db.is_slashed(&verifier)? {
            return Err(ProtocolError::AlreadySlashed(verifier));
        }
        let record = self
            .registry
            .get_verifier(verifier)?
            .ok_or(ProtocolError::VerifierNotActive(verifier))?;
        if record.faults < config.fault_threshold {
            return Err(ProtocolError::FaultThresholdNotReached {
                verifier,
                faults: record.faults,
                threshold: config.fault_threshold,
            });
        }
        self.slash_internal(verifier, &config)
    }

    fn slash_internal(&self, verifier: AccountId, config: &ProtocolConfig) -> Result<Vec<Event>, ProtocolError> {
        let record = self
            .registry
            .get_verifier(verifier)?
            .ok_or(ProtocolError::VerifierNotActive(verifier))?;
        let slash_amount = record.stake * config.slash_bps as Balance / BPS_DENOMINATOR as Balance;

        self.registry.reduce_stake(self.authority_id, verifier, slash_amount)?;
        let pool = self.db.get_reward_pool()?;
        self.db.put_reward_pool(pool + slash_amount)?;
        self.db.mark_slashed(&verifier)?;

        warn!(verifier = %verifier, amount = slash_amount, "slashed");
        Ok(vec![Event::Slashed { verifier, amount: slash_amount }])
    }

    /// Transfer `pendingRewards[caller]` out and zero the entry.
    pub fn claim_rewards(&self, caller: AccountId, ledger: &mut dyn StakeLedger) -> Result<Balance, ProtocolError> {
        let amount = self.db.get_pending_rewards(&caller)?;
        if amount == 0 {
            return Ok(0);
        }
        self.db.put_pending_rewards(&caller, 0)?;
        ledger.transfer_out(caller, amount)?;
        info!(caller = %caller, amount, "claimed rewards");
        Ok(amount)
    }

    /// Permissionless top-up of the reward pool (§4.3, added). The source's
    /// token wiring handles this off-core; here it is a narrow entry point
    /// against the same `StakeLedger` the rest of this component uses.
    pub fn fund_reward_pool(
        &self,
        caller: AccountId,
        amount: Balance,
        ledger: &mut dyn StakeLedger,
    ) -> Result<(), ProtocolError> {
        if amount == 0 {
            return Err(ProtocolError::ZeroAmount);
        }
        ledger.transfer_in(caller, amount)?;
        let pool = self.db.get_reward_pool()?;
        self.db.put_reward_pool(pool + amount)?;
        info!(caller = %caller, amount, "funded reward pool");
        Ok(())
    }

    pub fn reward_pool(&self) -> Result<Balance, ProtocolError> {
        self.db.get_reward_pool()
    }

    pub fn pending_rewards(&self, account: AccountId) -> Result<Balance, ProtocolError> {
        self.db.get_pending_rewards(&account)
    }
}
