//! Data model owned by the Oracle: per-claim buckets and per-value tallies.

use serde::{Deserialize, Serialize};

use crate::types::{Bitmap16, EvidenceRoot, HourId, SnapshotId, SubjectId, Timestamp, ValueHash, Wh};

/// Per-claim-key state. Created on first valid submission; transitions
/// finalized<->disputed exactly once, then terminal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClaimBucket {
    pub subject_id: SubjectId,
    pub hour_id: HourId,
    pub deadline: Timestamp,
    pub snapshot_id: SnapshotId,
    pub submission_count: u32,
    pub finalized: bool,
    pub disputed: bool,
    pub verified_wh: Wh,
    pub max_submitted_wh: Wh,
    pub winning_value_hash: Option<ValueHash>,
    pub evidence_root: Option<EvidenceRoot>,
    pub all_submitters_bitmap: Bitmap16,
    pub winning_verifier_bitmap: Bitmap16,
    /// Value hashes in first-seen order, so finalization ties resolve to the
    /// first-inserted value (§9, Open Question #4) rather than an incidental
    /// hash-map iteration order.
    pub value_order: Vec<ValueHash>,
}

impl ClaimBucket {
    pub fn new(subject_id: SubjectId, hour_id: HourId, snapshot_id: SnapshotId, deadline: Timestamp) -> Self {
        Self {
            subject_id,
            hour_id,
            deadline,
            snapshot_id,
            submission_count: 0,
            finalized: false,
            disputed: false,
            verified_wh: 0,
            max_submitted_wh: 0,
            winning_value_hash: None,
            evidence_root: None,
            all_submitters_bitmap: 0,
            winning_verifier_bitmap: 0,
            value_order: Vec::new(),
        }
    }

    /// Whether this bucket has already passed through finalization at least
    /// once (finalized XOR disputed both false beforehand, per the invariant).
    pub fn is_terminal(&self) -> bool {
        self.finalized || self.disputed
    }
}

/// Aggregation of submissions that agree on one `(wh, evidence_root)` pair
/// within a single claim bucket.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValueTally {
    pub wh: Wh,
    pub evidence_root: EvidenceRoot,
    pub count: u32,
    pub bitmap: Bitmap16,
}

impl ValueTally {
    pub fn new(wh: Wh, evidence_root: EvidenceRoot) -> Self {
        Self {
            wh,
            evidence_root,
            count: 0,
            bitmap: 0,
        }
    }
}
