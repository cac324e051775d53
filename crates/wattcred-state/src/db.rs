use std::path::Path;

use wattcred_core::config::ProtocolConfig;
use wattcred_core::error::ProtocolError;
use wattcred_core::oracle_types::{ClaimBucket, ValueTally};
use wattcred_core::registry_types::{ConsumerRecord, ProducerRecord, Snapshot, Verifier};
use wattcred_core::types::{AccountId, Balance, ClaimKey, EvidenceRoot, HourId, SnapshotId, SubjectId, ValueHash, Wh};

fn storage_err(e: sled::Error) -> ProtocolError {
    ProtocolError::Storage(e.to_string())
}

fn ser_err(e: bincode::Error) -> ProtocolError {
    ProtocolError::Serialization(e.to_string())
}

fn submitted_key(claim_key: &ClaimKey, verifier: &AccountId) -> Vec<u8> {
    let mut k = claim_key.0.to_vec();
    k.extend_from_slice(verifier.as_bytes());
    k
}

fn evidence_key(claim_key: &ClaimKey, evidence_root: &EvidenceRoot) -> Vec<u8> {
    let mut k = claim_key.0.to_vec();
    k.extend_from_slice(&evidence_root.0);
    k
}

fn tally_key(claim_key: &ClaimKey, value_hash: &ValueHash) -> Vec<u8> {
    let mut k = claim_key.0.to_vec();
    k.extend_from_slice(&value_hash.0);
    k
}

fn credit_key(account: &AccountId, hour_id: HourId) -> Vec<u8> {
    let mut k = account.as_bytes().to_vec();
    k.extend_from_slice(&hour_id.to_be_bytes());
    k
}

const META_ACTIVE_SET: &str = "active_verifier_set";
const META_CONFIG: &str = "protocol_config";
const META_REWARD_POOL: &str = "reward_pool";
const META_NEXT_SNAPSHOT_ID: &str = "next_snapshot_id";

/// Persistent state database backed by sled (pure-Rust, no C dependencies),
/// following `chronx-state::StateDb`'s named-tree convention.
///
/// Named trees:
///   verifiers            — AccountId        → bincode(Verifier)
///   producers            — SubjectId        → bincode(ProducerRecord)
///   producer_identities   — identity_hash     → SubjectId (uniqueness index)
///   consumers             — SubjectId        → bincode(ConsumerRecord)
///   snapshots             — SnapshotId(be)   → bincode(Snapshot)
///   claim_snapshots        — ClaimKey         → SnapshotId(be)
///   buckets                — ClaimKey         → bincode(ClaimBucket)
///   tallies                — ClaimKey‖ValueHash → bincode(ValueTally)
///   submitted_verifiers    — ClaimKey‖AccountId → []  (membership set)
///   submitted_evidence     — ClaimKey‖EvidenceRoot → [] (membership set)
///   pending_rewards        — AccountId        → Balance (be bytes)
///   slashed                — AccountId        → []  (membership set)
///   verified_consumption   — SubjectId‖HourId  → Wh (be bytes)
///   token_balances         — AccountId        → Balance (reference StakeLedger)
///   credit_balances        — AccountId‖HourId  → Wh (reference CreditLedger)
///   meta                   — utf8 key          → raw bytes (config, counters)
pub struct StateDb {
    _db: sled::Db,
    verifiers: sled::Tree,
    producers: sled::Tree,
    producer_identities: sled::Tree,
    consumers: sled::Tree,
    snapshots: sled::Tree,
    claim_snapshots: sled::Tree,
    buckets: sled::Tree,
    tallies: sled::Tree,
    submitted_verifiers: sled::Tree,
    submitted_evidence: sled::Tree,
    pending_rewards: sled::Tree,
    slashed: sled::Tree,
    verified_consumption: sled::Tree,
    token_balances: sled::Tree,
    credit_balances: sled::Tree,
    meta: sled::Tree,
}

impl StateDb {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ProtocolError> {
        let db = sled::open(path).map_err(storage_err)?;
        Self::from_db(db)
    }

    /// Open a temporary, process-local database for tests.
    #[cfg(any(test, feature = "test-util"))]
    pub fn open_temp() -> Result<Self, ProtocolError> {
        let db = sled::Config::new().temporary(true).open().map_err(storage_err)?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> Result<Self, ProtocolError> {
        macro_rules! tree {
            ($name:expr) => {
                db.open_tree($name).map_err(storage_err)?
            };
        }
        Ok(Self {
            verifiers: tree!("verifiers"),
            producers: tree!("producers"),
            producer_identities: tree!("producer_identities"),
            consumers: tree!("consumers"),
            snapshots: tree!("snapshots"),
            claim_snapshots: tree!("claim_snapshots"),
            buckets: tree!("buckets"),
            tallies: tree!("tallies"),
            submitted_verifiers: tree!("submitted_verifiers"),
            submitted_evidence: tree!("submitted_evidence"),
            pending_rewards: tree!("pending_rewards"),
            slashed: tree!("slashed"),
            verified_consumption: tree!("verified_consumption"),
            token_balances: tree!("token_balances"),
            credit_balances: tree!("credit_balances"),
            meta: tree!("meta"),
            _db: db,
        })
    }

    pub fn flush(&self) -> Result<(), ProtocolError> {
        self._db.flush().map_err(storage_err)?;
        Ok(())
    }

    // ── Verifiers ────────────────────────────────────────────────────────────

    pub fn get_verifier(&self, account: &AccountId) -> Result<Option<Verifier>, ProtocolError> {
        match self.verifiers.get(account.as_bytes()).map_err(storage_err)? {
            Some(b) => Ok(Some(bincode::deserialize(&b).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_verifier(&self, v: &Verifier) -> Result<(), ProtocolError> {
        let b = bincode::serialize(v).map_err(ser_err)?;
        self.verifiers.insert(v.account.as_bytes(), b).map_err(storage_err)?;
        Ok(())
    }

    // ── Active verifier set (<=16 entries; single meta record) ───────────────

    pub fn get_active_set(&self) -> Result<Vec<AccountId>, ProtocolError> {
        match self.get_meta(META_ACTIVE_SET)? {
            Some(b) => bincode::deserialize(&b).map_err(ser_err),
            None => Ok(Vec::new()),
        }
    }

    pub fn put_active_set(&self, set: &[AccountId]) -> Result<(), ProtocolError> {
        let b = bincode::serialize(set).map_err(ser_err)?;
        self.put_meta(META_ACTIVE_SET, &b)
    }

    // ── Producers / Consumers ─────────────────────────────────────────────────

    pub fn get_producer(&self, id: &SubjectId) -> Result<Option<ProducerRecord>, ProtocolError> {
        match self.producers.get(id.as_bytes()).map_err(storage_err)? {
            Some(b) => Ok(Some(bincode::deserialize(&b).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_producer(&self, p: &ProducerRecord) -> Result<(), ProtocolError> {
        let b = bincode::serialize(p).map_err(ser_err)?;
        self.producers.insert(p.id.as_bytes(), b).map_err(storage_err)?;
        Ok(())
    }

    pub fn producer_identity_exists(&self, identity_hash: &[u8; 32]) -> Result<bool, ProtocolError> {
        Ok(self.producer_identities.contains_key(identity_hash).map_err(storage_err)?)
    }

    pub fn mark_producer_identity(&self, identity_hash: &[u8; 32], id: SubjectId) -> Result<(), ProtocolError> {
        self.producer_identities
            .insert(identity_hash, id.as_bytes().to_vec())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_consumer(&self, id: &SubjectId) -> Result<Option<ConsumerRecord>, ProtocolError> {
        match self.consumers.get(id.as_bytes()).map_err(storage_err)? {
            Some(b) => Ok(Some(bincode::deserialize(&b).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_consumer(&self, c: &ConsumerRecord) -> Result<(), ProtocolError> {
        let b = bincode::serialize(c).map_err(ser_err)?;
        self.consumers.insert(c.id.as_bytes(), b).map_err(storage_err)?;
        Ok(())
    }

    // ── Snapshots ─────────────────────────────────────────────────────────────

    pub fn next_snapshot_id(&self) -> Result<SnapshotId, ProtocolError> {
        self.next_counter(META_NEXT_SNAPSHOT_ID, 1)
    }

    pub fn next_producer_nonce(&self) -> Result<u64, ProtocolError> {
        self.next_counter("next_producer_nonce", 0)
    }

    pub fn next_consumer_nonce(&self) -> Result<u64, ProtocolError> {
        self.next_counter("next_consumer_nonce", 0)
    }

    /// Atomically read-then-increment a `u64` counter stored in `meta`,
    /// returning the pre-increment value. `start` seeds the counter the
    /// first time it is read.
    fn next_counter(&self, key: &str, start: u64) -> Result<u64, ProtocolError> {
        let current = match self.get_meta(key)? {
            Some(b) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&b[..8]);
                u64::from_be_bytes(arr)
            }
            None => start,
        };
        self.put_meta(key, &(current + 1).to_be_bytes())?;
        Ok(current)
    }

    pub fn get_snapshot(&self, id: SnapshotId) -> Result<Option<Snapshot>, ProtocolError> {
        match self.snapshots.get(id.to_be_bytes()).map_err(storage_err)? {
            Some(b) => Ok(Some(bincode::deserialize(&b).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_snapshot(&self, snap: &Snapshot) -> Result<(), ProtocolError> {
        let b = bincode::serialize(snap).map_err(ser_err)?;
        self.snapshots.insert(snap.id.to_be_bytes(), b).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_claim_snapshot_id(&self, claim_key: &ClaimKey) -> Result<Option<SnapshotId>, ProtocolError> {
        match self.claim_snapshots.get(claim_key.0).map_err(storage_err)? {
            Some(b) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&b);
                Ok(Some(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn put_claim_snapshot_id(&self, claim_key: &ClaimKey, id: SnapshotId) -> Result<(), ProtocolError> {
        self.claim_snapshots
            .insert(claim_key.0, &id.to_be_bytes())
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Claim buckets ─────────────────────────────────────────────────────────

    pub fn get_bucket(&self, claim_key: &ClaimKey) -> Result<Option<ClaimBucket>, ProtocolError> {
        match self.buckets.get(claim_key.0).map_err(storage_err)? {
            Some(b) => Ok(Some(bincode::deserialize(&b).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_bucket(&self, claim_key: &ClaimKey, bucket: &ClaimBucket) -> Result<(), ProtocolError> {
        let b = bincode::serialize(bucket).map_err(ser_err)?;
        self.buckets.insert(claim_key.0, b).map_err(storage_err)?;
        Ok(())
    }

    // ── Value tallies ─────────────────────────────────────────────────────────

    pub fn get_tally(&self, claim_key: &ClaimKey, value_hash: &ValueHash) -> Result<Option<ValueTally>, ProtocolError> {
        match self.tallies.get(tally_key(claim_key, value_hash)).map_err(storage_err)? {
            Some(b) => Ok(Some(bincode::deserialize(&b).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_tally(&self, claim_key: &ClaimKey, value_hash: &ValueHash, tally: &ValueTally) -> Result<(), ProtocolError> {
        let b = bincode::serialize(tally).map_err(ser_err)?;
        self.tallies.insert(tally_key(claim_key, value_hash), b).map_err(storage_err)?;
        Ok(())
    }

    // ── Submission de-duplication ─────────────────────────────────────────────

    pub fn has_submitted(&self, claim_key: &ClaimKey, verifier: &AccountId) -> Result<bool, ProtocolError> {
        Ok(self
            .submitted_verifiers
            .contains_key(submitted_key(claim_key, verifier))
            .map_err(storage_err)?)
    }

    pub fn mark_submitted(&self, claim_key: &ClaimKey, verifier: &AccountId) -> Result<(), ProtocolError> {
        self.submitted_verifiers
            .insert(submitted_key(claim_key, verifier), b"".as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn has_submitted_evidence(&self, claim_key: &ClaimKey, evidence_root: &EvidenceRoot) -> Result<bool, ProtocolError> {
        Ok(self
            .submitted_evidence
            .contains_key(evidence_key(claim_key, evidence_root))
            .map_err(storage_err)?)
    }

    pub fn mark_submitted_evidence(&self, claim_key: &ClaimKey, evidence_root: &EvidenceRoot) -> Result<(), ProtocolError> {
        self.submitted_evidence
            .insert(evidence_key(claim_key, evidence_root), b"".as_ref())
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Treasury ledgers ───────────────────────────────────────────────────────

    pub fn get_pending_rewards(&self, account: &AccountId) -> Result<Balance, ProtocolError> {
        match self.pending_rewards.get(account.as_bytes()).map_err(storage_err)? {
            Some(b) => Ok(balance_from_bytes(&b)),
            None => Ok(0),
        }
    }

    pub fn put_pending_rewards(&self, account: &AccountId, amount: Balance) -> Result<(), ProtocolError> {
        self.pending_rewards
            .insert(account.as_bytes(), &balance_to_bytes(amount))
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn is_slashed(&self, account: &AccountId) -> Result<bool, ProtocolError> {
        Ok(self.slashed.contains_key(account.as_bytes()).map_err(storage_err)?)
    }

    pub fn mark_slashed(&self, account: &AccountId) -> Result<(), ProtocolError> {
        self.slashed.insert(account.as_bytes(), b"".as_ref()).map_err(storage_err)?;
        Ok(())
    }

    pub fn get_reward_pool(&self) -> Result<Balance, ProtocolError> {
        match self.get_meta(META_REWARD_POOL)? {
            Some(b) => Ok(balance_from_bytes(&b)),
            None => Ok(0),
        }
    }

    pub fn put_reward_pool(&self, amount: Balance) -> Result<(), ProtocolError> {
        self.put_meta(META_REWARD_POOL, &balance_to_bytes(amount))
    }

    // ── Consumption oracle side-effect storage ───────────────────────────────

    pub fn get_verified_consumption(&self, subject_id: &SubjectId, hour_id: HourId) -> Result<Option<Wh>, ProtocolError> {
        let key = credit_key(&AccountId::from_bytes(*subject_id.as_bytes()), hour_id);
        match self.verified_consumption.get(key).map_err(storage_err)? {
            Some(b) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&b);
                Ok(Some(u64::from_be_bytes(arr)))
            }
            None => Ok(None),
        }
    }

    pub fn put_verified_consumption(&self, subject_id: &SubjectId, hour_id: HourId, wh: Wh) -> Result<(), ProtocolError> {
        let key = credit_key(&AccountId::from_bytes(*subject_id.as_bytes()), hour_id);
        self.verified_consumption.insert(key, &wh.to_be_bytes()).map_err(storage_err)?;
        Ok(())
    }

    // ── Reference StakeLedger / CreditLedger storage ─────────────────────────

    pub fn get_token_balance(&self, account: &AccountId) -> Result<Balance, ProtocolError> {
        match self.token_balances.get(account.as_bytes()).map_err(storage_err)? {
            Some(b) => Ok(balance_from_bytes(&b)),
            None => Ok(0),
        }
    }

    pub fn put_token_balance(&self, account: &AccountId, amount: Balance) -> Result<(), ProtocolError> {
        self.token_balances
            .insert(account.as_bytes(), &balance_to_bytes(amount))
            .map_err(storage_err)?;
        Ok(())
    }

    pub fn get_credit_balance(&self, account: &AccountId, hour_id: HourId) -> Result<Wh, ProtocolError> {
        match self.credit_balances.get(credit_key(account, hour_id)).map_err(storage_err)? {
            Some(b) => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&b);
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn put_credit_balance(&self, account: &AccountId, hour_id: HourId, wh: Wh) -> Result<(), ProtocolError> {
        self.credit_balances
            .insert(credit_key(account, hour_id), &wh.to_be_bytes())
            .map_err(storage_err)?;
        Ok(())
    }

    // ── Config (Registry-owned singleton) ────────────────────────────────────

    pub fn get_config(&self) -> Result<Option<ProtocolConfig>, ProtocolError> {
        match self.get_meta(META_CONFIG)? {
            Some(b) => Ok(Some(bincode::deserialize(&b).map_err(ser_err)?)),
            None => Ok(None),
        }
    }

    pub fn put_config(&self, config: &ProtocolConfig) -> Result<(), ProtocolError> {
        let b = bincode::serialize(config).map_err(ser_err)?;
        self.put_meta(META_CONFIG, &b)
    }

    // ── Meta (generic singleton / counter storage) ───────────────────────────

    pub fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, ProtocolError> {
        self.meta
            .get(key.as_bytes())
            .map(|v| v.map(|iv| iv.to_vec()))
            .map_err(storage_err)
    }

    pub fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), ProtocolError> {
        self.meta.insert(key.as_bytes(), value).map_err(storage_err)?;
        Ok(())
    }
}

fn balance_to_bytes(b: Balance) -> [u8; 16] {
    b.to_be_bytes()
}

fn balance_from_bytes(b: &[u8]) -> Balance {
    let mut arr = [0u8; 16];
    arr.copy_from_slice(&b[..16]);
    Balance::from_be_bytes(arr)
}
