use thiserror::Error;

use crate::types::{AccountId, Balance, ClaimKey, SnapshotId};

/// Every fallible outcome across Registry, Oracle, and Treasury. Mirrors
/// `ChronxError` in spirit: one variant per error kind, structured fields
/// instead of bare strings, never a silently-recovered condition.
#[derive(Debug, Error)]
pub enum ProtocolError {
    // ── Authorization ────────────────────────────────────────────────────────
    #[error("caller is not an authorized oracle for this registry")]
    OnlyAuthorizedOracle,

    #[error("operation restricted to the production oracle")]
    OnlyProductionOracle,

    #[error("operation restricted to retirement logic, which this crate does not implement")]
    OnlyRetirement,

    #[error("operation restricted to the wired Treasury authority")]
    OnlyTreasury,

    #[error("caller is not the protocol admin")]
    NotOwner,

    // ── Registration ─────────────────────────────────────────────────────────
    #[error("identity hash already registered")]
    SystemAlreadyRegistered,

    #[error("producer not found: {0:?}")]
    ProducerNotFound(crate::types::SubjectId),

    #[error("consumer not found: {0:?}")]
    ConsumerNotFound(crate::types::SubjectId),

    #[error("zero address is not a valid account")]
    ZeroAddress,

    // ── Stake / activation ───────────────────────────────────────────────────
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("insufficient stake-token balance: need {need}, have {have}")]
    InsufficientStakeBalance { need: Balance, have: Balance },

    #[error("insufficient stake to activate: need {min}, have {have}")]
    InsufficientStake { min: Balance, have: Balance },

    #[error("verifier already active: {0:?}")]
    VerifierAlreadyActive(AccountId),

    #[error("verifier not active: {0:?}")]
    VerifierNotActive(AccountId),

    #[error("verifier not allowlisted: {0:?}")]
    VerifierNotAllowlisted(AccountId),

    #[error("no active verifiers; cannot create a snapshot")]
    NoActiveVerifiers,

    #[error("active verifier set is full ({max} max); refusing activation")]
    ActiveSetFull { max: usize },

    // ── Snapshot ──────────────────────────────────────────────────────────────
    #[error("snapshot already exists for claim key {0:?}")]
    SnapshotAlreadyExists(ClaimKey),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(SnapshotId),

    #[error("verifier {verifier:?} is not a member of snapshot {snapshot_id}")]
    VerifierNotInSnapshot {
        snapshot_id: SnapshotId,
        verifier: AccountId,
    },

    // ── Submission ────────────────────────────────────────────────────────────
    #[error("claim {0:?} already finalized")]
    ClaimAlreadyFinalized(ClaimKey),

    #[error("claim {0:?} deadline has passed")]
    ClaimDeadlinePassed(ClaimKey),

    #[error("verifier {verifier:?} already submitted to claim {claim_key:?}")]
    DuplicateSubmission {
        claim_key: ClaimKey,
        verifier: AccountId,
    },

    #[error("signature does not recover to a valid public key")]
    InvalidSignature,

    #[error("producer not registered: {0:?}")]
    ProducerNotRegistered(crate::types::SubjectId),

    #[error("consumer not registered: {0:?}")]
    ConsumerNotRegistered(crate::types::SubjectId),

    // ── Finalization ──────────────────────────────────────────────────────────
    #[error("claim {0:?} deadline has not yet been reached")]
    ClaimDeadlineNotReached(ClaimKey),

    #[error("claim {0:?} is not in a disputed state")]
    ClaimNotDisputed(ClaimKey),

    #[error("energy {wh} exceeds the maximum submitted value {max_submitted} for this claim")]
    EnergyExceedsMaxSubmitted {
        wh: crate::types::Wh,
        max_submitted: crate::types::Wh,
    },

    #[error("evidence root was never submitted for claim {0:?}")]
    EvidenceRootNotSubmitted(ClaimKey),

    // ── Treasury ──────────────────────────────────────────────────────────────
    #[error("insufficient reward pool: need {need}, have {have}")]
    InsufficientRewardPool { need: Balance, have: Balance },

    #[error("verifier {verifier:?} has only {faults} faults; threshold is {threshold}")]
    FaultThresholdNotReached {
        verifier: AccountId,
        faults: u32,
        threshold: u32,
    },

    #[error("verifier {0:?} is already slashed")]
    AlreadySlashed(AccountId),

    #[error("insufficient pool balance: need {need}, have {have}")]
    InsufficientPoolBalance { need: Balance, have: Balance },

    // ── Config ────────────────────────────────────────────────────────────────
    #[error("quorum_bps must be in (0, 10000], got {0}")]
    InvalidQuorumBps(u16),

    // ── Storage / serialization (ambient) ────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Other(String),
}
