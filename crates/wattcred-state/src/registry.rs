use std::sync::{Arc, OnceLock};

use tracing::info;
use wattcred_core::config::ProtocolConfig;
use wattcred_core::error::ProtocolError;
use wattcred_core::ledger::StakeLedger;
use wattcred_core::registry_types::{ConsumerRecord, ProducerRecord, Snapshot, Verifier};
use wattcred_core::types::{AccountId, Balance, ClaimKey, SnapshotId, SubjectId, Timestamp, MAX_ACTIVE_VERIFIERS};

use crate::db::StateDb;

/// Verifier stake/activation lifecycle, producer/consumer registration, and
/// the immutable per-claim verifier snapshots every other component reads
/// indices against. Mirrors `chronx_core::account`'s "singleton-per-key
/// record, mutated through narrow operations" shape, generalised to four
/// entity kinds instead of one.
pub struct Registry {
    db: Arc<StateDb>,
    treasury_authority: OnceLock<AccountId>,
    oracle_authorities: OnceLock<Vec<AccountId>>,
}

impl Registry {
    /// Open (or initialize, on first use) the Registry against `db`, owned
    /// by `admin`. Config is created once and never reset on reopen.
    pub fn new(db: Arc<StateDb>, admin: AccountId) -> Result<Self, ProtocolError> {
        if db.get_config()?.is_none() {
            db.put_config(&ProtocolConfig::new(admin))?;
        }
        Ok(Self {
            db,
            treasury_authority: OnceLock::new(),
            oracle_authorities: OnceLock::new(),
        })
    }

    /// Wire the Treasury's identity in once, per §9's construction order
    /// (Registry → Treasury → Oracle, cross-wired via authority setters).
    pub fn set_treasury_authority(&self, treasury_id: AccountId) {
        let _ = self.treasury_authority.set(treasury_id);
    }

    /// Wire the production/consumption Oracle identities in once
    /// `create_snapshot` is restricted to.
    pub fn set_oracle_authorities(&self, oracle_ids: Vec<AccountId>) {
        let _ = self.oracle_authorities.set(oracle_ids);
    }

    fn require_treasury(&self, caller: AccountId) -> Result<(), ProtocolError> {
        match self.treasury_authority.get() {
            Some(id) if *id == caller => Ok(()),
            _ => Err(ProtocolError::OnlyTreasury),
        }
    }

    fn require_oracle(&self, caller: AccountId) -> Result<(), ProtocolError> {
        match self.oracle_authorities.get() {
            Some(ids) if ids.contains(&caller) => Ok(()),
            _ => Err(ProtocolError::OnlyAuthorizedOracle),
        }
    }

    fn require_admin(&self, caller: AccountId) -> Result<ProtocolConfig, ProtocolError> {
        let config = self.config()?;
        if config.admin != caller {
            return Err(ProtocolError::NotOwner);
        }
        Ok(config)
    }

    pub fn config(&self) -> Result<ProtocolConfig, ProtocolError> {
        self.db
            .get_config()?
            .ok_or_else(|| ProtocolError::Other("protocol config missing".into()))
    }

    // ── Registration ──────────────────────────────────────────────────────────

    pub fn register_producer(
        &self,
        caller: AccountId,
        identity_hash: [u8; 32],
        meta_hash: [u8; 32],
        payout_address: AccountId,
        now: Timestamp,
    ) -> Result<SubjectId, ProtocolError> {
        if payout_address.is_zero() {
            return Err(ProtocolError::ZeroAddress);
        }
        if self.db.producer_identity_exists(&identity_hash)? {
            return Err(ProtocolError::SystemAlreadyRegistered);
        }
        let nonce = self.db.next_producer_nonce()?;
        let id = wattcred_crypto::subject_id(caller, identity_hash, nonce);
        let record = ProducerRecord {
            id,
            owner: caller,
            identity_hash,
            meta_hash,
            payout_address,
            active: true,
            registered_at: now,
        };
        self.db.put_producer(&record)?;
        self.db.mark_producer_identity(&identity_hash, id)?;
        info!(producer_id = %id, owner = %caller, "registered producer");
        Ok(id)
    }

    pub fn register_consumer(
        &self,
        caller: AccountId,
        identity_hash: [u8; 32],
        meta_hash: [u8; 32],
        payout_address: AccountId,
        now: Timestamp,
    ) -> Result<SubjectId, ProtocolError> {
        if payout_address.is_zero() {
            return Err(ProtocolError::ZeroAddress);
        }
        let nonce = self.db.next_consumer_nonce()?;
        let id = wattcred_crypto::subject_id(caller, identity_hash, nonce);
        let record = ConsumerRecord {
            id,
            owner: caller,
            identity_hash,
            meta_hash,
            payout_address,
            active: true,
            registered_at: now,
        };
        self.db.put_consumer(&record)?;
        info!(consumer_id = %id, owner = %caller, "registered consumer");
        Ok(id)
    }

    pub fn get_producer(&self, id: SubjectId) -> Result<Option<ProducerRecord>, ProtocolError> {
        self.db.get_producer(&id)
    }

    pub fn get_consumer(&self, id: SubjectId) -> Result<Option<ConsumerRecord>, ProtocolError> {
        self.db.get_consumer(&id)
    }

    pub fn is_producer_registered(&self, id: SubjectId) -> Result<bool, ProtocolError> {
        Ok(self.db.get_producer(&id)?.map(|p| p.active).unwrap_or(false))
    }

    pub fn is_consumer_registered(&self, id: SubjectId) -> Result<bool, ProtocolError> {
        Ok(self.db.get_consumer(&id)?.map(|c| c.active).unwrap_or(false))
    }

    // ── Stake lifecycle ───────────────────────────────────────────────────────

    pub fn stake(
        &self,
        verifier: AccountId,
        amount: Balance,
        ledger: &mut dyn StakeLedger,
    ) -> Result<(), ProtocolError> {
        if amount == 0 {
            return Err(ProtocolError::ZeroAmount);
        }
        ledger.transfer_in(verifier, amount)?;
        let mut record = self.db.get_verifier(&verifier)?.unwrap_or_else(|| Verifier::new(verifier));
        record.stake += amount;
        self.db.put_verifier(&record)?;
        info!(verifier = %verifier, amount, "staked");
        Ok(())
    }

    pub fn unstake(
        &self,
        verifier: AccountId,
        amount: Balance,
        ledger: &mut dyn StakeLedger,
    ) -> Result<(), ProtocolError> {
        if amount == 0 {
            return Err(ProtocolError::ZeroAmount);
        }
        let mut record = self
            .db
            .get_verifier(&verifier)?
            .ok_or(ProtocolError::InsufficientStakeBalance { need: amount, have: 0 })?;
        if record.active {
            return Err(ProtocolError::VerifierAlreadyActive(verifier));
        }
        if amount > record.stake {
            return Err(ProtocolError::InsufficientStakeBalance { need: amount, have: record.stake });
        }
        record.stake -= amount;
        self.db.put_verifier(&record)?;
        ledger.transfer_out(verifier, amount)?;
        info!(verifier = %verifier, amount, "unstaked");
        Ok(())
    }

    pub fn activate_verifier(&self, verifier: AccountId) -> Result<(), ProtocolError> {
        let config = self.config()?;
        let mut record = self
            .db
            .get_verifier(&verifier)?
            .ok_or(ProtocolError::InsufficientStake { min: config.min_stake, have: 0 })?;

        if record.active {
            return Err(ProtocolError::VerifierAlreadyActive(verifier));
        }
        if config.permissioned_mode && !record.allowlisted {
            return Err(ProtocolError::VerifierNotAllowlisted(verifier));
        }
        if record.stake < config.min_stake {
            return Err(ProtocolError::InsufficientStake { min: config.min_stake, have: record.stake });
        }

        let mut active_set = self.db.get_active_set()?;
        if active_set.len() >= MAX_ACTIVE_VERIFIERS {
            return Err(ProtocolError::ActiveSetFull { max: MAX_ACTIVE_VERIFIERS });
        }

        record.active = true;
        record.active_slot = Some(active_set.len() as u16);
        active_set.push(verifier);

        self.db.put_verifier(&record)?;
        self.db.put_active_set(&active_set)?;
        info!(verifier = %verifier, "activated verifier");
        Ok(())
    }

    pub fn deactivate_verifier(&self, verifier: AccountId) -> Result<(), ProtocolError> {
        let mut record = self
            .db
            .get_verifier(&verifier)?
            .ok_or(ProtocolError::VerifierNotActive(verifier))?;
        if !record.active {
            return Err(ProtocolError::VerifierNotActive(verifier));
        }
        let idx = record.active_slot.ok_or(ProtocolError::VerifierNotActive(verifier))? as usize;

        let mut active_set = self.db.get_active_set()?;
        let last = active_set.len() - 1;
        if idx != last {
            active_set.swap(idx, last);
            let moved = active_set[idx];
            if let Some(mut moved_record) = self.db.get_verifier(&moved)? {
                moved_record.active_slot = Some(idx as u16);
                self.db.put_verifier(&moved_record)?;
            }
        }
        active_set.pop();

        record.active = false;
        record.active_slot = None;
        self.db.put_verifier(&record)?;
        self.db.put_active_set(&active_set)?;
        info!(verifier = %verifier, "deactivated verifier");
        Ok(())
    }

    pub fn get_verifier(&self, verifier: AccountId) -> Result<Option<Verifier>, ProtocolError> {
        self.db.get_verifier(&verifier)
    }

    // ── Snapshots ─────────────────────────────────────────────────────────────

    pub fn create_snapshot(
        &self,
        caller: AccountId,
        claim_key: ClaimKey,
        now: Timestamp,
    ) -> Result<(SnapshotId, usize), ProtocolError> {
        self.require_oracle(caller)?;
        if self.db.get_claim_snapshot_id(&claim_key)?.is_some() {
            return Err(ProtocolError::SnapshotAlreadyExists(claim_key));
        }
        let mut verifiers = self.db.get_active_set()?;
        if verifiers.is_empty() {
            return Err(ProtocolError::NoActiveVerifiers);
        }
        verifiers.sort();

        let id = self.db.next_snapshot_id()?;
        let count = verifiers.len();
        let snapshot = Snapshot { id, verifiers, timestamp: now };
        self.db.put_snapshot(&snapshot)?;
        self.db.put_claim_snapshot_id(&claim_key, id)?;
        info!(claim_key = %claim_key, snapshot_id = id, count, "created snapshot");
        Ok((id, count))
    }

    pub fn get_snapshot(&self, id: SnapshotId) -> Result<Option<Snapshot>, ProtocolError> {
        self.db.get_snapshot(id)
    }

    pub fn get_verifier_index(&self, snapshot_id: SnapshotId, verifier: AccountId) -> Result<u8, ProtocolError> {
        let snapshot = self
            .db
            .get_snapshot(snapshot_id)?
            .ok_or(ProtocolError::SnapshotNotFound(snapshot_id))?;
        snapshot
            .index_of(&verifier)
            .ok_or(ProtocolError::VerifierNotInSnapshot { snapshot_id, verifier })
    }

    // ── Treasury-only operations ──────────────────────────────────────────────

    pub fn reduce_stake(&self, caller: AccountId, verifier: AccountId, amount: Balance) -> Result<(), ProtocolError> {
        self.require_treasury(caller)?;
        let mut record = self.db.get_verifier(&verifier)?.unwrap_or_else(|| Verifier::new(verifier));
        record.stake = record.stake.saturating_sub(amount);
        self.db.put_verifier(&record)?;
        Ok(())
    }

    pub fn increment_faults(&self, caller: AccountId, verifier: AccountId) -> Result<u32, ProtocolError> {
        self.require_treasury(caller)?;
        let mut record = self.db.get_verifier(&verifier)?.unwrap_or_else(|| Verifier::new(verifier));
        record.faults += 1;
        let faults = record.faults;
        self.db.put_verifier(&record)?;
        Ok(faults)
    }

    // ── Admin setters ─────────────────────────────────────────────────────────

    pub fn set_quorum_bps(&self, caller: AccountId, quorum_bps: u16) -> Result<(), ProtocolError> {
        let mut config = self.require_admin(caller)?;
        if quorum_bps == 0 || quorum_bps > wattcred_core::constants::MAX_QUORUM_BPS {
            return Err(ProtocolError::InvalidQuorumBps(quorum_bps));
        }
        config.quorum_bps = quorum_bps;
        self.db.put_config(&config)
    }

    pub fn set_claim_window(&self, caller: AccountId, claim_window_secs: i64) -> Result<(), ProtocolError> {
        let mut config = self.require_admin(caller)?;
        config.claim_window_secs = claim_window_secs;
        self.db.put_config(&config)
    }

    pub fn set_reward_per_wh(&self, caller: AccountId, reward_per_wh: Balance) -> Result<(), ProtocolError> {
        let mut config = self.require_admin(caller)?;
        config.reward_per_wh = reward_per_wh;
        self.db.put_config(&config)
    }

    pub fn set_slash_bps(&self, caller: AccountId, slash_bps: u16) -> Result<(), ProtocolError> {
        let mut config = self.require_admin(caller)?;
        config.slash_bps = slash_bps;
        self.db.put_config(&config)
    }

    pub fn set_fault_threshold(&self, caller: AccountId, fault_threshold: u32) -> Result<(), ProtocolError> {
        let mut config = self.require_admin(caller)?;
        config.fault_threshold = fault_threshold;
        self.db.put_config(&config)
    }

    pub fn set_min_stake(&self, caller: AccountId, min_stake: Balance) -> Result<(), ProtocolError> {
        let mut config = self.require_admin(caller)?;
        config.min_stake = min_stake;
        self.db.put_config(&config)
    }

    pub fn set_permissioned_mode(&self, caller: AccountId, permissioned_mode: bool) -> Result<(), ProtocolError> {
        let mut config = self.require_admin(caller)?;
        config.permissioned_mode = permissioned_mode;
        self.db.put_config(&config)
    }

    pub fn set_allowlisted(&self, caller: AccountId, verifier: AccountId, allowlisted: bool) -> Result<(), ProtocolError> {
        self.require_admin(caller)?;
        let mut record = self.db.get_verifier(&verifier)?.unwrap_or_else(|| Verifier::new(verifier));
        record.allowlisted = allowlisted;
        self.db.put_verifier(&record)
    }

    pub fn set_baseline_mode(
        &self,
        caller: AccountId,
        baseline_mode: bool,
        single_verifier_override: Option<AccountId>,
    ) -> Result<(), ProtocolError> {
        let mut config = self.require_admin(caller)?;
        config.baseline_mode = baseline_mode;
        config.single_verifier_override = single_verifier_override;
        self.db.put_config(&config)
    }

    pub fn set_slashing_disabled(&self, caller: AccountId, slashing_disabled: bool) -> Result<(), ProtocolError> {
        let mut config = self.require_admin(caller)?;
        config.slashing_disabled = slashing_disabled;
        self.db.put_config(&config)
    }
}
