//! Data model owned by the Registry: verifiers, producers, consumers, and
//! immutable per-claim snapshots.

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Balance, SnapshotId, SubjectId, Timestamp};

/// A staked verifier. Created implicitly on first stake, never destroyed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Verifier {
    pub account: AccountId,
    pub stake: Balance,
    pub faults: u32,
    pub active: bool,
    pub allowlisted: bool,
    /// Index into the `ActiveVerifierSet` while `active`, for O(1) swap-remove.
    /// `None` while inactive.
    pub active_slot: Option<u16>,
}

impl Verifier {
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            stake: 0,
            faults: 0,
            active: false,
            allowlisted: false,
            active_slot: None,
        }
    }
}

/// A registered energy producer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProducerRecord {
    pub id: SubjectId,
    pub owner: AccountId,
    pub identity_hash: [u8; 32],
    pub meta_hash: [u8; 32],
    pub payout_address: AccountId,
    pub active: bool,
    pub registered_at: Timestamp,
}

/// A registered energy consumer. Unlike producers, `identity_hash` is not
/// required to be globally unique.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsumerRecord {
    pub id: SubjectId,
    pub owner: AccountId,
    pub identity_hash: [u8; 32],
    pub meta_hash: [u8; 32],
    pub payout_address: AccountId,
    pub active: bool,
    pub registered_at: Timestamp,
}

/// The immutable, sorted verifier set captured at the moment a claim bucket
/// is first opened. Indices into `verifiers` are the meaning of every bitmap
/// bit computed against this snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    /// Ascending by address (unsigned big-endian byte comparison). Length <= 16.
    pub verifiers: Vec<AccountId>,
    pub timestamp: Timestamp,
}

impl Snapshot {
    /// Linear scan for `verifier`'s position (sets are <= 16 entries).
    pub fn index_of(&self, verifier: &AccountId) -> Option<u8> {
        self.verifiers
            .iter()
            .position(|v| v == verifier)
            .map(|i| i as u8)
    }
}
