//! Wire-observable events (§6).
//!
//! This crate is a library component, not a deployed contract with a log, so
//! events are a plain Rust enum instead of ABI log entries. Every
//! `ProtocolEngine::apply` call returns `Ok(Vec<Event>)` in emission order;
//! callers that need a durable log (the "database-backed evidence storage"
//! collaborator named in §1) drain this vector. Each event is additionally
//! logged via `tracing` at the call site (§1a), so operators get the same
//! signal without depending on the returned vector.

use serde::{Deserialize, Serialize};

use crate::config::FaultKind;
use crate::types::{
    AccountId, Balance, Bitmap16, ClaimKey, EvidenceRoot, HourId, SnapshotId, SubjectId, ValueHash,
    Wh,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Event {
    Submitted {
        claim_key: ClaimKey,
        verifier: AccountId,
        wh: Wh,
        value_hash: ValueHash,
    },
    Finalized {
        claim_key: ClaimKey,
        subject_id: SubjectId,
        hour_id: HourId,
        wh: Wh,
        evidence_root: EvidenceRoot,
    },
    ClaimDisputed {
        claim_key: ClaimKey,
        subject_id: SubjectId,
        hour_id: HourId,
        reason: String,
    },
    ForceFinalized {
        claim_key: ClaimKey,
        admin: AccountId,
        wh: Wh,
    },
    SnapshotCreated {
        claim_key: ClaimKey,
        snapshot_id: SnapshotId,
        count: usize,
    },
    RewardsDistributed {
        winner_bitmap: Bitmap16,
        snapshot_id: SnapshotId,
        total_distributed: Balance,
    },
    FaultRecorded {
        verifier: AccountId,
        kind: FaultKind,
        total_faults: u32,
    },
    Slashed {
        verifier: AccountId,
        amount: Balance,
    },
}
