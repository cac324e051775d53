//! `ProtocolEngine` — the single linearizable entry point that dispatches a
//! closed `Action` enum to Registry, Oracle, and Treasury, mirroring
//! `chronx_state::StateEngine::apply`'s one-transaction-at-a-time model (§2,
//! §5).

use std::path::Path;
use std::sync::{Arc, Mutex};

use tracing::info;

use wattcred_core::action::Action;
use wattcred_core::error::ProtocolError;
use wattcred_core::events::Event;
use wattcred_core::ledger::{CreditLedger, StakeLedger};
use wattcred_core::oracle_types::ClaimBucket;
use wattcred_core::registry_types::{ConsumerRecord, ProducerRecord, Verifier};
use wattcred_core::types::{AccountId, HourId, SubjectId, Timestamp};

use crate::db::StateDb;
use crate::ledger::{InMemoryCreditLedger, InMemoryStakeLedger};
use crate::oracle::{ConsumptionEffect, Oracle, ProductionEffect};
use crate::registry::Registry;
use crate::treasury::Treasury;

/// Domain-separation strings the two built-in oracle identities are derived
/// from. An embedder wiring a different oracle topology supplies its own
/// `AccountId`s instead of using `ProtocolEngine::new`/`open`.
const PRODUCTION_ORACLE_DOMAIN: &[u8] = b"wattcred:oracle:production:v1";
const CONSUMPTION_ORACLE_DOMAIN: &[u8] = b"wattcred:oracle:consumption:v1";

/// Wires Registry -> Treasury -> Oracle (production, consumption) over one
/// shared `StateDb`, per §9's construction order, and exposes one `apply`
/// entry point per §2/§5.
pub struct ProtocolEngine {
    db: Arc<StateDb>,
    registry: Arc<Registry>,
    treasury: Arc<Treasury>,
    production: Oracle<ProductionEffect>,
    consumption: Oracle<ConsumptionEffect>,
    stake_ledger: Mutex<Box<dyn StakeLedger + Send>>,
    credit_ledger: Mutex<Box<dyn CreditLedger + Send>>,
    /// Coarse single-writer lock over one whole `apply` call, since an
    /// `apply` may touch Registry, Oracle, and Treasury trees in sequence and
    /// the underlying `sled` trees only serialize per-tree operations, not
    /// a multi-tree call (§5 "This implementation's substrate").
    apply_lock: Mutex<()>,
}

impl ProtocolEngine {
    /// Construct an engine with the reference `sled`-backed ledgers (§6b),
    /// suitable for tests and for embedders with no real token contract.
    pub fn open<P: AsRef<Path>>(path: P, admin: AccountId, chain_id: u64) -> Result<Self, ProtocolError> {
        let db = Arc::new(StateDb::open(path)?);
        let stake_ledger = Box::new(InMemoryStakeLedger::new(db.clone()));
        let credit_ledger = Box::new(InMemoryCreditLedger::new(db.clone()));
        Self::new(db, admin, chain_id, stake_ledger, credit_ledger)
    }

    /// As [`Self::open`] but against a temporary, process-local database.
    #[cfg(any(test, feature = "test-util"))]
    pub fn open_temp(admin: AccountId, chain_id: u64) -> Result<Self, ProtocolError> {
        let db = Arc::new(StateDb::open_temp()?);
        let stake_ledger = Box::new(InMemoryStakeLedger::new(db.clone()));
        let credit_ledger = Box::new(InMemoryCreditLedger::new(db.clone()));
        Self::new(db, admin, chain_id, stake_ledger, credit_ledger)
    }

    /// Construct an engine over caller-supplied ledger implementations —
    /// the injection point a production embedder uses to wire in a real
    /// stake-token / credit-token contract (§6b).
    pub fn new(
        db: Arc<StateDb>,
        admin: AccountId,
        chain_id: u64,
        stake_ledger: Box<dyn StakeLedger + Send>,
        credit_ledger: Box<dyn CreditLedger + Send>,
    ) -> Result<Self, ProtocolError> {
        let registry = Arc::new(Registry::new(db.clone(), admin)?);
        let treasury = Arc::new(Treasury::new(db.clone(), registry.clone()));
        registry.set_treasury_authority(treasury.authority_id());

        let production_id = AccountId::from_bytes(wattcred_crypto::keccak256(PRODUCTION_ORACLE_DOMAIN));
        let consumption_id = AccountId::from_bytes(wattcred_crypto::keccak256(CONSUMPTION_ORACLE_DOMAIN));
        registry.set_oracle_authorities(vec![production_id, consumption_id]);

        let production = Oracle::new(db.clone(), registry.clone(), treasury.clone(), production_id, chain_id, ProductionEffect);
        let consumption = Oracle::new(db.clone(), registry.clone(), treasury.clone(), consumption_id, chain_id, ConsumptionEffect);

        Ok(Self {
            db,
            registry,
            treasury,
            production,
            consumption,
            stake_ledger: Mutex::new(stake_ledger),
            credit_ledger: Mutex::new(credit_ledger),
            apply_lock: Mutex::new(()),
        })
    }

    /// Validate and apply one action atomically, per the substrate model of
    /// §5. Returns the events emitted, in order.
    pub fn apply(&self, action: Action, now: Timestamp) -> Result<Vec<Event>, ProtocolError> {
        let _guard = self.apply_lock.lock().expect("apply lock poisoned");
        let events = self.dispatch(action, now)?;
        info!(count = events.len(), "apply produced events");
        Ok(events)
    }

    fn dispatch(&self, action: Action, now: Timestamp) -> Result<Vec<Event>, ProtocolError> {
        let mut stake_ledger = self.stake_ledger.lock().expect("stake ledger lock poisoned");
        let mut credit_ledger = self.credit_ledger.lock().expect("credit ledger lock poisoned");

        match action {
            // ── Registration ──────────────────────────────────────────────────
            Action::RegisterProducer { caller, identity_hash, meta_hash, payout_address } => {
                self.registry.register_producer(caller, identity_hash, meta_hash, payout_address, now)?;
                Ok(Vec::new())
            }
            Action::RegisterConsumer { caller, identity_hash, meta_hash, payout_address } => {
                self.registry.register_consumer(caller, identity_hash, meta_hash, payout_address, now)?;
                Ok(Vec::new())
            }

            // ── Stake lifecycle ───────────────────────────────────────────────
            Action::Stake { verifier, amount } => {
                self.registry.stake(verifier, amount, &mut **stake_ledger)?;
                Ok(Vec::new())
            }
            Action::Unstake { verifier, amount } => {
                self.registry.unstake(verifier, amount, &mut **stake_ledger)?;
                Ok(Vec::new())
            }
            Action::ActivateVerifier { verifier } => {
                self.registry.activate_verifier(verifier)?;
                Ok(Vec::new())
            }
            Action::DeactivateVerifier { verifier } => {
                self.registry.deactivate_verifier(verifier)?;
                Ok(Vec::new())
            }

            // ── Production oracle ─────────────────────────────────────────────
            Action::SubmitProductionClaim { subject_id, hour_id, wh, evidence_root, signature } => {
                self.production.submit(subject_id, hour_id, wh, evidence_root, signature, &mut **credit_ledger, now)
            }
            Action::FinalizeProductionClaim { subject_id, hour_id } => {
                self.production.finalize(subject_id, hour_id, &mut **credit_ledger, now)
            }
            Action::ForceFinalizeProductionClaim { caller, subject_id, hour_id, wh, evidence_root } => {
                self.production.force_finalize(caller, subject_id, hour_id, wh, evidence_root, &mut **credit_ledger, now)
            }

            // ── Consumption oracle ────────────────────────────────────────────
            Action::SubmitConsumptionClaim { subject_id, hour_id, wh, evidence_root, signature } => {
                self.consumption.submit(subject_id, hour_id, wh, evidence_root, signature, &mut **credit_ledger, now)
            }
            Action::FinalizeConsumptionClaim { subject_id, hour_id } => {
                self.consumption.finalize(subject_id, hour_id, &mut **credit_ledger, now)
            }
            Action::ForceFinalizeConsumptionClaim { caller, subject_id, hour_id, wh, evidence_root } => {
                self.consumption.force_finalize(caller, subject_id, hour_id, wh, evidence_root, &mut **credit_ledger, now)
            }

            // ── Treasury ───────────────────────────────────────────────────────
            Action::ClaimRewards { caller } => {
                self.treasury.claim_rewards(caller, &mut **stake_ledger)?;
                Ok(Vec::new())
            }
            Action::FundRewardPool { caller, amount } => {
                self.treasury.fund_reward_pool(caller, amount, &mut **stake_ledger)?;
                Ok(Vec::new())
            }
            Action::Slash { caller, verifier } => self.treasury.slash(caller, verifier),

            // ── Admin setters ──────────────────────────────────────────────────
            Action::SetQuorumBps { caller, quorum_bps } => {
                self.registry.set_quorum_bps(caller, quorum_bps)?;
                Ok(Vec::new())
            }
            Action::SetClaimWindow { caller, claim_window_secs } => {
                self.registry.set_claim_window(caller, claim_window_secs)?;
                Ok(Vec::new())
            }
            Action::SetRewardPerWh { caller, reward_per_wh } => {
                self.registry.set_reward_per_wh(caller, reward_per_wh)?;
                Ok(Vec::new())
            }
            Action::SetSlashBps { caller, slash_bps } => {
                self.registry.set_slash_bps(caller, slash_bps)?;
                Ok(Vec::new())
            }
            Action::SetFaultThreshold { caller, fault_threshold } => {
                self.registry.set_fault_threshold(caller, fault_threshold)?;
                Ok(Vec::new())
            }
            Action::SetMinStake { caller, min_stake } => {
                self.registry.set_min_stake(caller, min_stake)?;
                Ok(Vec::new())
            }
            Action::SetPermissionedMode { caller, permissioned_mode } => {
                self.registry.set_permissioned_mode(caller, permissioned_mode)?;
                Ok(Vec::new())
            }
            Action::SetAllowlisted { caller, verifier, allowlisted } => {
                self.registry.set_allowlisted(caller, verifier, allowlisted)?;
                Ok(Vec::new())
            }
            Action::SetBaselineMode { caller, baseline_mode, single_verifier_override } => {
                self.registry.set_baseline_mode(caller, baseline_mode, single_verifier_override)?;
                Ok(Vec::new())
            }
            Action::SetSlashingDisabled { caller, slashing_disabled } => {
                self.registry.set_slashing_disabled(caller, slashing_disabled)?;
                Ok(Vec::new())
            }
        }
    }

    // ── Read-only accessors (no staging needed) ────────────────────────────────

    pub fn get_verifier(&self, account: AccountId) -> Result<Option<Verifier>, ProtocolError> {
        self.registry.get_verifier(account)
    }

    pub fn get_producer(&self, id: SubjectId) -> Result<Option<ProducerRecord>, ProtocolError> {
        self.registry.get_producer(id)
    }

    pub fn get_consumer(&self, id: SubjectId) -> Result<Option<ConsumerRecord>, ProtocolError> {
        self.registry.get_consumer(id)
    }

    pub fn production_bucket(&self, subject_id: SubjectId, hour_id: HourId) -> Result<Option<ClaimBucket>, ProtocolError> {
        self.production.get_bucket(subject_id, hour_id)
    }

    pub fn consumption_bucket(&self, subject_id: SubjectId, hour_id: HourId) -> Result<Option<ClaimBucket>, ProtocolError> {
        self.consumption.get_bucket(subject_id, hour_id)
    }

    pub fn pending_rewards(&self, account: AccountId) -> Result<wattcred_core::types::Balance, ProtocolError> {
        self.treasury.pending_rewards(account)
    }

    pub fn reward_pool(&self) -> Result<wattcred_core::types::Balance, ProtocolError> {
        self.treasury.reward_pool()
    }

    pub fn db(&self) -> &Arc<StateDb> {
        &self.db
    }
}
