//! Signed-claim aggregation and quorum finalization, generic over the two
//! concrete oracle kinds (production, consumption) that share every mechanic
//! except the post-finalization side-effect (§4.2, §9 "Dynamic dispatch").

use std::sync::Arc;

use tracing::{debug, info, warn};

use wattcred_core::config::FaultKind;
use wattcred_core::error::ProtocolError;
use wattcred_core::events::Event;
use wattcred_core::ledger::CreditLedger;
use wattcred_core::oracle_types::{ClaimBucket, ValueTally};
use wattcred_core::types::{
    AccountId, Bitmap16, ClaimKey, EvidenceRoot, HourId, RecoverableSignature, SubjectId,
    Timestamp, Wh,
};

use crate::db::StateDb;
use crate::registry::Registry;
use crate::treasury::Treasury;

/// The subject-validator callback and post-finalize effect that distinguish
/// a production oracle from a consumption oracle (§9). Modelled as a trait
/// with two implementations rather than inheritance.
pub trait OracleEffect {
    /// Claim-key domain-separation tag for this oracle kind (§6).
    fn tag(&self) -> u8;

    /// Whether `subject_id` is a registered, active subject of this kind.
    fn subject_active(&self, registry: &Registry, subject_id: SubjectId) -> Result<bool, ProtocolError>;

    /// The error to raise when `subject_active` returns `false`.
    fn not_registered_error(&self, subject_id: SubjectId) -> ProtocolError;

    /// Mint credit units (production) or store the verified value
    /// (consumption). Called once per finalized (or force-finalized) bucket.
    fn on_finalized(
        &self,
        registry: &Registry,
        db: &StateDb,
        ledger: &mut dyn CreditLedger,
        subject_id: SubjectId,
        hour_id: HourId,
        wh: Wh,
        claim_key: ClaimKey,
    ) -> Result<(), ProtocolError>;
}

/// Mints per-hour credit units to the producer's payout address.
pub struct ProductionEffect;

impl OracleEffect for ProductionEffect {
    fn tag(&self) -> u8 {
        wattcred_core::constants::CLAIM_TAG_PRODUCTION
    }

    fn subject_active(&self, registry: &Registry, subject_id: SubjectId) -> Result<bool, ProtocolError> {
        registry.is_producer_registered(subject_id)
    }

    fn not_registered_error(&self, subject_id: SubjectId) -> ProtocolError {
        ProtocolError::ProducerNotRegistered(subject_id)
    }

    fn on_finalized(
        &self,
        registry: &Registry,
        _db: &StateDb,
        ledger: &mut dyn CreditLedger,
        subject_id: SubjectId,
        hour_id: HourId,
        wh: Wh,
        claim_key: ClaimKey,
    ) -> Result<(), ProtocolError> {
        let producer = registry
            .get_producer(subject_id)?
            .ok_or(ProtocolError::ProducerNotFound(subject_id))?;
        ledger.mint(producer.payout_address, hour_id, wh, claim_key)
    }
}

/// Stores the verified value without minting anything — a consumption claim
/// is a record, not a credit-bearing event.
pub struct ConsumptionEffect;

impl OracleEffect for ConsumptionEffect {
    fn tag(&self) -> u8 {
        wattcred_core::constants::CLAIM_TAG_CONSUMPTION
    }

    fn subject_active(&self, registry: &Registry, subject_id: SubjectId) -> Result<bool, ProtocolError> {
        registry.is_consumer_registered(subject_id)
    }

    fn not_registered_error(&self, subject_id: SubjectId) -> ProtocolError {
        ProtocolError::ConsumerNotRegistered(subject_id)
    }

    fn on_finalized(
        &self,
        registry: &Registry,
        db: &StateDb,
        _ledger: &mut dyn CreditLedger,
        subject_id: SubjectId,
        hour_id: HourId,
        wh: Wh,
        _claim_key: ClaimKey,
    ) -> Result<(), ProtocolError> {
        registry
            .get_consumer(subject_id)?
            .ok_or(ProtocolError::ConsumerNotFound(subject_id))?;
        db.put_verified_consumption(&subject_id, hour_id, wh)
    }
}

/// One logical oracle (§2), realized twice: `Oracle<ProductionEffect>` and
/// `Oracle<ConsumptionEffect>` share every mechanic below and differ only in
/// `E`'s two methods.
pub struct Oracle<E: OracleEffect> {
    db: Arc<StateDb>,
    registry: Arc<Registry>,
    treasury: Arc<Treasury>,
    /// This instance's own identity — folded into every claim key for
    /// cross-oracle domain separation (§4.2) since this core is a library,
    /// not a deployed contract with its own address.
    identity: AccountId,
    chain_id: u64,
    effect: E,
}

impl<E: OracleEffect> Oracle<E> {
    pub fn new(db: Arc<StateDb>, registry: Arc<Registry>, treasury: Arc<Treasury>, identity: AccountId, chain_id: u64, effect: E) -> Self {
        Self { db, registry, treasury, identity, chain_id, effect }
    }

    pub fn identity(&self) -> AccountId {
        self.identity
    }

    fn claim_key(&self, subject_id: SubjectId, hour_id: HourId) -> ClaimKey {
        wattcred_crypto::claim_key(self.effect.tag(), self.identity, subject_id, hour_id)
    }

    /// `submit` (§4.2): steps 1-11 of the submission protocol plus the
    /// baseline-mode shortcut (step 12).
    pub fn submit(
        &self,
        subject_id: SubjectId,
        hour_id: HourId,
        wh: Wh,
        evidence_root: EvidenceRoot,
        signature: RecoverableSignature,
        ledger: &mut dyn CreditLedger,
        now: Timestamp,
    ) -> Result<Vec<Event>, ProtocolError> {
        let claim_key = self.claim_key(subject_id, hour_id);
        let mut events = Vec::new();

        // 1. Already finalized?
        let mut bucket = self.db.get_bucket(&claim_key)?;
        if let Some(b) = &bucket {
            if b.finalized {
                return Err(ProtocolError::ClaimAlreadyFinalized(claim_key));
            }
        }

        // 2. Subject registered?
        if !self.effect.subject_active(&self.registry, subject_id)? {
            return Err(self.effect.not_registered_error(subject_id));
        }

        // 3. Recover signer.
        let digest = wattcred_crypto::submission_digest(
            self.chain_id,
            self.identity,
            subject_id,
            hour_id,
            wh,
            evidence_root,
        );
        let signer = wattcred_crypto::recover_signer(&digest, &signature)?;

        // 4. Signer must be an active verifier.
        let verifier_record = self
            .registry
            .get_verifier(signer)?
            .filter(|v| v.active)
            .ok_or(ProtocolError::VerifierNotActive(signer))?;

        // 5. First submission opens the bucket: create the snapshot and set
        //    the deadline.
        let config = self.registry.config()?;
        if bucket.is_none() {
            let (snapshot_id, count) = self.registry.create_snapshot(self.identity, claim_key, now)?;
            events.push(Event::SnapshotCreated { claim_key, snapshot_id, count });
            let deadline = now + config.claim_window_secs;
            bucket = Some(ClaimBucket::new(subject_id, hour_id, snapshot_id, deadline));
        }
        let mut bucket = bucket.expect("bucket is Some after the snapshot-creation branch above");

        // 6. Late submission.
        if now > bucket.deadline {
            self.treasury.record_fault(signer, FaultKind::LateSubmission)?;
            return Err(ProtocolError::ClaimDeadlinePassed(claim_key));
        }

        // 7. Resolve this verifier's index into the snapshot.
        let verifier_index = self.registry.get_verifier_index(bucket.snapshot_id, signer)?;

        // 8. Duplicate submission.
        if self.db.has_submitted(&claim_key, &signer)? {
            self.treasury.record_fault(signer, FaultKind::DuplicateSubmission)?;
            return Err(ProtocolError::DuplicateSubmission { claim_key, verifier: signer });
        }

        // 9. Commit bitmap/tally bookkeeping.
        self.db.mark_submitted(&claim_key, &signer)?;
        let bit: Bitmap16 = 1u16 << verifier_index;
        bucket.all_submitters_bitmap |= bit;
        bucket.submission_count += 1;
        bucket.max_submitted_wh = bucket.max_submitted_wh.max(wh);
        self.db.mark_submitted_evidence(&claim_key, &evidence_root)?;

        // 10. Upsert the value tally this submission agrees with.
        let value_hash = wattcred_crypto::value_hash(wh, evidence_root);
        let mut tally = match self.db.get_tally(&claim_key, &value_hash)? {
            Some(t) => t,
            None => {
                bucket.value_order.push(value_hash);
                ValueTally::new(wh, evidence_root)
            }
        };
        tally.count += 1;
        tally.bitmap |= bit;
        self.db.put_tally(&claim_key, &value_hash, &tally)?;
        self.db.put_bucket(&claim_key, &bucket)?;

        debug!(claim_key = %claim_key, verifier = %signer, wh, "submission tallied");

        // 11. Emit Submitted.
        events.push(Event::Submitted { claim_key, verifier: signer, wh, value_hash });
        info!(claim_key = %claim_key, verifier = %signer, "submitted claim");
        let _ = verifier_record; // already validated active above

        // 12. Baseline shortcut: immediate finalization, no loser processing.
        if config.baseline_mode && config.single_verifier_override == Some(signer) {
            let finalize_events = self.finalize_with_tally(
                &claim_key,
                subject_id,
                hour_id,
                &mut bucket,
                &tally,
                value_hash,
                true,  // distribute rewards to the winner
                false, // no loser fault processing
                ledger,
            )?;
            events.extend(finalize_events);
        }

        Ok(events)
    }

    /// `finalize` (§4.2): callable by anyone once the deadline has passed.
    pub fn finalize(
        &self,
        subject_id: SubjectId,
        hour_id: HourId,
        ledger: &mut dyn CreditLedger,
        now: Timestamp,
    ) -> Result<Vec<Event>, ProtocolError> {
        let claim_key = self.claim_key(subject_id, hour_id);
        let mut bucket = self
            .db
            .get_bucket(&claim_key)?
            .ok_or(ProtocolError::ClaimDeadlineNotReached(claim_key))?;

        if bucket.finalized {
            return Err(ProtocolError::ClaimAlreadyFinalized(claim_key));
        }
        if now <= bucket.deadline {
            return Err(ProtocolError::ClaimDeadlineNotReached(claim_key));
        }

        let snapshot = self
            .registry
            .get_snapshot(bucket.snapshot_id)?
            .ok_or(ProtocolError::SnapshotNotFound(bucket.snapshot_id))?;
        let config = self.registry.config()?;
        let n = snapshot.verifiers.len() as u64;
        let quorum_required = ((n * config.quorum_bps as u64) + 9_999) / 10_000;

        // First-seen tiebreak: value_order preserves insertion order, so the
        // first `>` (never `>=`) replacement keeps the earliest-inserted
        // value on a count tie (§9, Open Question #4).
        let mut best: Option<(wattcred_core::types::ValueHash, ValueTally)> = None;
        for vh in &bucket.value_order {
            let tally = self
                .db
                .get_tally(&claim_key, vh)?
                .ok_or_else(|| ProtocolError::Other(format!("missing tally for recorded value hash {vh:?}")))?;
            let replace = match &best {
                None => true,
                Some((_, b)) => tally.count > b.count,
            };
            if replace {
                best = Some((*vh, tally));
            }
        }
        let (value_hash, tally) = best.ok_or(ProtocolError::NoActiveVerifiers)?;

        if (tally.count as u64) < quorum_required {
            bucket.disputed = true;
            self.db.put_bucket(&claim_key, &bucket)?;
            warn!(claim_key = %claim_key, count = tally.count, quorum_required, "claim disputed");
            return Ok(vec![Event::ClaimDisputed {
                claim_key,
                subject_id,
                hour_id,
                reason: format!("{} of {} required votes", tally.count, quorum_required),
            }]);
        }

        self.finalize_with_tally(&claim_key, subject_id, hour_id, &mut bucket, &tally, value_hash, true, true, ledger)
    }

    #[allow(clippy::too_many_arguments)]
    fn finalize_with_tally(
        &self,
        claim_key: &ClaimKey,
        subject_id: SubjectId,
        hour_id: HourId,
        bucket: &mut ClaimBucket,
        tally: &ValueTally,
        value_hash: wattcred_core::types::ValueHash,
        distribute_rewards: bool,
        record_losers: bool,
        ledger: &mut dyn CreditLedger,
    ) -> Result<Vec<Event>, ProtocolError> {
        // Validate the reward pool can cover this finalization *before*
        // committing the bucket or running the mint/store effect — neither
        // of those writes has a rollback path once persisted (§5, §7).
        if distribute_rewards {
            self.treasury.ensure_reward_pool_sufficient(tally.bitmap, tally.wh)?;
        }

        bucket.finalized = true;
        bucket.verified_wh = tally.wh;
        bucket.winning_value_hash = Some(value_hash);
        bucket.evidence_root = Some(tally.evidence_root);
        bucket.winning_verifier_bitmap = tally.bitmap;
        let loser_bitmap = bucket.all_submitters_bitmap & !tally.bitmap;
        self.db.put_bucket(claim_key, bucket)?;

        self.effect.on_finalized(
            &self.registry,
            &self.db,
            ledger,
            subject_id,
            hour_id,
            tally.wh,
            *claim_key,
        )?;

        let mut events = vec![Event::Finalized {
            claim_key: *claim_key,
            subject_id,
            hour_id,
            wh: tally.wh,
            evidence_root: tally.evidence_root,
        }];
        info!(claim_key = %claim_key, wh = tally.wh, "claim finalized");

        if distribute_rewards {
            events.extend(self.treasury.distribute_rewards(tally.bitmap, bucket.snapshot_id, tally.wh)?);
        }
        if record_losers {
            events.extend(self.treasury.record_faults(loser_bitmap, bucket.snapshot_id, FaultKind::WrongValue)?);
        }
        Ok(events)
    }

    /// `forceFinalize` (§4.2): admin-only escape hatch out of a disputed
    /// bucket. Mints/stores without touching rewards or faults.
    pub fn force_finalize(
        &self,
        caller: AccountId,
        subject_id: SubjectId,
        hour_id: HourId,
        wh: Wh,
        evidence_root: EvidenceRoot,
        ledger: &mut dyn CreditLedger,
        now: Timestamp,
    ) -> Result<Vec<Event>, ProtocolError> {
        let claim_key = self.claim_key(subject_id, hour_id);
        let config = self.registry.config()?;
        if config.admin != caller {
            return Err(ProtocolError::NotOwner);
        }

        let mut bucket = self
            .db
            .get_bucket(&claim_key)?
            .ok_or(ProtocolError::ClaimNotDisputed(claim_key))?;
        if !bucket.disputed {
            return Err(ProtocolError::ClaimNotDisputed(claim_key));
        }
        if now <= bucket.deadline {
            return Err(ProtocolError::ClaimDeadlineNotReached(claim_key));
        }
        if wh > bucket.max_submitted_wh {
            return Err(ProtocolError::EnergyExceedsMaxSubmitted { wh, max_submitted: bucket.max_submitted_wh });
        }
        if !self.db.has_submitted_evidence(&claim_key, &evidence_root)? {
            return Err(ProtocolError::EvidenceRootNotSubmitted(claim_key));
        }

        bucket.finalized = true;
        bucket.verified_wh = wh;
        bucket.evidence_root = Some(evidence_root);
        bucket.winning_value_hash = Some(wattcred_crypto::value_hash(wh, evidence_root));
        bucket.winning_verifier_bitmap = 0;
        self.db.put_bucket(&claim_key, &bucket)?;

        self.effect
            .on_finalized(&self.registry, &self.db, ledger, subject_id, hour_id, wh, claim_key)?;

        warn!(claim_key = %claim_key, admin = %caller, wh, "force-finalized disputed claim");
        Ok(vec![Event::ForceFinalized { claim_key, admin: caller, wh }])
    }

    pub fn get_bucket(&self, subject_id: SubjectId, hour_id: HourId) -> Result<Option<ClaimBucket>, ProtocolError> {
        self.db.get_bucket(&self.claim_key(subject_id, hour_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::SigningKey;
    use rand_core::OsRng;
    use wattcred_core::ledger::StakeLedger;
    use wattcred_core::types::Balance;

    struct NullStakeLedger;
    impl StakeLedger for NullStakeLedger {
        fn transfer_in(&mut self, _from: AccountId, _amount: Balance) -> Result<(), ProtocolError> {
            Ok(())
        }
        fn transfer_out(&mut self, _to: AccountId, _amount: Balance) -> Result<(), ProtocolError> {
            Ok(())
        }
        fn balance_of(&self, _account: AccountId) -> Balance {
            0
        }
    }

    #[derive(Default)]
    struct RecordingCreditLedger {
        minted: Vec<(AccountId, HourId, Wh, ClaimKey)>,
    }
    impl CreditLedger for RecordingCreditLedger {
        fn mint(&mut self, to: AccountId, hour_id: HourId, wh: Wh, claim_key: ClaimKey) -> Result<(), ProtocolError> {
            self.minted.push((to, hour_id, wh, claim_key));
            Ok(())
        }
        fn burn(&mut self, _from: AccountId, _hour_id: HourId, _wh: Wh) -> Result<(), ProtocolError> {
            Ok(())
        }
        fn balance_of(&self, _account: AccountId, _hour_id: HourId) -> Wh {
            0
        }
    }

    struct Harness {
        registry: Arc<Registry>,
        treasury: Arc<Treasury>,
        oracle: Oracle<ProductionEffect>,
        admin: AccountId,
    }

    fn harness() -> Harness {
        let db = Arc::new(StateDb::open_temp().unwrap());
        let admin = AccountId::from_bytes([0xAD; 32]);
        let registry = Arc::new(Registry::new(db.clone(), admin).unwrap());
        registry.set_permissioned_mode(admin, false).unwrap();
        let treasury = Arc::new(Treasury::new(db.clone(), registry.clone()));
        registry.set_treasury_authority(treasury.authority_id());

        let oracle_id = AccountId::from_bytes([0xF0; 32]);
        registry.set_oracle_authorities(vec![oracle_id]);
        let oracle = Oracle::new(db, registry.clone(), treasury.clone(), oracle_id, 1, ProductionEffect);
        Harness { registry, treasury, oracle, admin }
    }

    fn activated_verifier(h: &Harness, seed: u8, stake: Balance) -> SigningKey {
        let sk = SigningKey::random(&mut OsRng);
        let account = wattcred_crypto::account_id_from_pubkey(sk.verifying_key().to_encoded_point(false).as_bytes());
        let _ = seed;
        h.registry.stake(account, stake, &mut NullStakeLedger).unwrap();
        h.registry.activate_verifier(account).unwrap();
        sk
    }

    fn submit_signed(
        h: &Harness,
        sk: &SigningKey,
        subject_id: SubjectId,
        hour_id: HourId,
        wh: Wh,
        evidence_root: EvidenceRoot,
        ledger: &mut dyn CreditLedger,
        now: Timestamp,
    ) -> Result<Vec<Event>, ProtocolError> {
        let digest = wattcred_crypto::submission_digest(1, h.oracle.identity, subject_id, hour_id, wh, evidence_root);
        let sig = wattcred_crypto::sign_prehash(sk, &digest);
        h.oracle.submit(subject_id, hour_id, wh, evidence_root, sig, ledger, now)
    }

    fn register_producer(h: &Harness, seed: u8) -> SubjectId {
        h.registry
            .register_producer(h.admin, [seed; 32], [0u8; 32], AccountId::from_bytes([0x70 + seed; 32]), 0)
            .unwrap()
    }

    #[test]
    fn happy_path_three_of_three_agree() {
        let h = harness();
        let producer = register_producer(&h, 1);
        let v1 = activated_verifier(&h, 1, 100);
        let v2 = activated_verifier(&h, 2, 100);
        let v3 = activated_verifier(&h, 3, 100);
        h.treasury.fund_reward_pool(h.admin, 1_000_000_000_000_000, &mut NullStakeLedger).unwrap();

        let mut ledger = RecordingCreditLedger::default();
        let er = EvidenceRoot([0xAA; 32]);
        for sk in [&v1, &v2, &v3] {
            submit_signed(&h, sk, producer, 500_000, 5_000, er, &mut ledger, 0).unwrap();
        }

        let events = h.oracle.finalize(producer, 500_000, &mut ledger, 3_601).unwrap();
        assert!(events.iter().any(|e| matches!(e, Event::Finalized { wh: 5_000, .. })));
        assert_eq!(ledger.minted, vec![(AccountId::from_bytes([0x71; 32]), 500_000, 5_000, h.oracle.claim_key(producer, 500_000))]);
    }

    #[test]
    fn honest_majority_penalizes_the_outlier() {
        let h = harness();
        let producer = register_producer(&h, 1);
        let good = [activated_verifier(&h, 1, 100), activated_verifier(&h, 2, 100), activated_verifier(&h, 3, 100), activated_verifier(&h, 4, 100)];
        let bad = activated_verifier(&h, 5, 100);
        h.treasury.fund_reward_pool(h.admin, 1_000_000_000_000_000, &mut NullStakeLedger).unwrap();

        let mut ledger = RecordingCreditLedger::default();
        let er = EvidenceRoot([0xAA; 32]);
        for sk in &good {
            submit_signed(&h, sk, producer, 500_000, 5_000, er, &mut ledger, 0).unwrap();
        }
        submit_signed(&h, &bad, producer, 500_000, 9_999, EvidenceRoot([0xBB; 32]), &mut ledger, 0).unwrap();

        h.oracle.finalize(producer, 500_000, &mut ledger, 3_601).unwrap();
        let bad_account = wattcred_crypto::account_id_from_pubkey(bad.verifying_key().to_encoded_point(false).as_bytes());
        assert_eq!(h.registry.get_verifier(bad_account).unwrap().unwrap().faults, 1);
    }

    #[test]
    fn disputed_bucket_resolved_by_force_finalize() {
        let h = harness();
        let producer = register_producer(&h, 1);
        let v: Vec<SigningKey> = (1..=5u8).map(|i| activated_verifier(&h, i, 100)).collect();

        let mut ledger = RecordingCreditLedger::default();
        let er_a = EvidenceRoot([0xAA; 32]);
        submit_signed(&h, &v[0], producer, 500_000, 5_000, er_a, &mut ledger, 0).unwrap();
        submit_signed(&h, &v[1], producer, 500_000, 5_000, er_a, &mut ledger, 0).unwrap();
        submit_signed(&h, &v[2], producer, 500_000, 5_000, er_a, &mut ledger, 0).unwrap();
        submit_signed(&h, &v[3], producer, 500_000, 1_000, EvidenceRoot([0xCC; 32]), &mut ledger, 0).unwrap();
        submit_signed(&h, &v[4], producer, 500_000, 2_000, EvidenceRoot([0xDD; 32]), &mut ledger, 0).unwrap();

        let events = h.oracle.finalize(producer, 500_000, &mut ledger, 3_601).unwrap();
        assert!(events.iter().any(|e| matches!(e, Event::ClaimDisputed { .. })));

        assert!(matches!(
            h.oracle.force_finalize(h.admin, producer, 500_000, 5_000, EvidenceRoot([0xEE; 32]), &mut ledger, 3_601).unwrap_err(),
            ProtocolError::EvidenceRootNotSubmitted(_)
        ));
        assert!(matches!(
            h.oracle.force_finalize(h.admin, producer, 500_000, 10_000, er_a, &mut ledger, 3_601).unwrap_err(),
            ProtocolError::EnergyExceedsMaxSubmitted { .. }
        ));
        let events = h.oracle.force_finalize(h.admin, producer, 500_000, 5_000, er_a, &mut ledger, 3_601).unwrap();
        assert!(events.iter().any(|e| matches!(e, Event::ForceFinalized { wh: 5_000, .. })));
    }

    #[test]
    fn duplicate_submission_faults_and_fails() {
        let h = harness();
        let producer = register_producer(&h, 1);
        let v1 = activated_verifier(&h, 1, 100);
        let mut ledger = RecordingCreditLedger::default();
        let er = EvidenceRoot([0xAA; 32]);

        submit_signed(&h, &v1, producer, 500_000, 5_000, er, &mut ledger, 0).unwrap();
        let err = submit_signed(&h, &v1, producer, 500_000, 5_000, er, &mut ledger, 0).unwrap_err();
        assert!(matches!(err, ProtocolError::DuplicateSubmission { .. }));

        let account = wattcred_crypto::account_id_from_pubkey(v1.verifying_key().to_encoded_point(false).as_bytes());
        assert_eq!(h.registry.get_verifier(account).unwrap().unwrap().faults, 1);
    }

    #[test]
    fn late_submission_faults_and_fails() {
        let h = harness();
        let producer = register_producer(&h, 1);
        let v1 = activated_verifier(&h, 1, 100);
        let v2 = activated_verifier(&h, 2, 100);
        let mut ledger = RecordingCreditLedger::default();
        let er = EvidenceRoot([0xAA; 32]);

        submit_signed(&h, &v1, producer, 500_000, 5_000, er, &mut ledger, 0).unwrap();
        let err = submit_signed(&h, &v2, producer, 500_000, 5_000, er, &mut ledger, 5_000).unwrap_err();
        assert!(matches!(err, ProtocolError::ClaimDeadlinePassed(_)));

        let account = wattcred_crypto::account_id_from_pubkey(v2.verifying_key().to_encoded_point(false).as_bytes());
        assert_eq!(h.registry.get_verifier(account).unwrap().unwrap().faults, 1);
    }

    #[test]
    fn baseline_mode_finalizes_without_waiting_for_deadline() {
        let h = harness();
        let producer = register_producer(&h, 1);
        let v1 = activated_verifier(&h, 1, 100);
        let account = wattcred_crypto::account_id_from_pubkey(v1.verifying_key().to_encoded_point(false).as_bytes());
        h.registry.set_baseline_mode(h.admin, true, Some(account)).unwrap();
        h.treasury.fund_reward_pool(h.admin, 1_000_000_000_000_000, &mut NullStakeLedger).unwrap();

        let mut ledger = RecordingCreditLedger::default();
        let events = submit_signed(&h, &v1, producer, 500_000, 5_000, EvidenceRoot([0xAA; 32]), &mut ledger, 0).unwrap();
        assert!(events.iter().any(|e| matches!(e, Event::Finalized { .. })));
        assert_eq!(ledger.minted.len(), 1);
    }
}
