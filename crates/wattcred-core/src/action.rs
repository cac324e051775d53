//! The closed set of state-changing operations `ProtocolEngine::apply`
//! dispatches to Registry, Oracle, and Treasury — the Rust analogue of
//! `chronx_core::transaction::Action`.

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Balance, EvidenceRoot, HourId, RecoverableSignature, SubjectId, Wh};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Action {
    // ── Registry: registration ───────────────────────────────────────────────
    RegisterProducer {
        caller: AccountId,
        identity_hash: [u8; 32],
        meta_hash: [u8; 32],
        payout_address: AccountId,
    },
    RegisterConsumer {
        caller: AccountId,
        identity_hash: [u8; 32],
        meta_hash: [u8; 32],
        payout_address: AccountId,
    },

    // ── Registry: stake lifecycle ────────────────────────────────────────────
    Stake {
        verifier: AccountId,
        amount: Balance,
    },
    Unstake {
        verifier: AccountId,
        amount: Balance,
    },
    ActivateVerifier {
        verifier: AccountId,
    },
    DeactivateVerifier {
        verifier: AccountId,
    },

    // ── Oracle: production ───────────────────────────────────────────────────
    SubmitProductionClaim {
        subject_id: SubjectId,
        hour_id: HourId,
        wh: Wh,
        evidence_root: EvidenceRoot,
        signature: RecoverableSignature,
    },
    FinalizeProductionClaim {
        subject_id: SubjectId,
        hour_id: HourId,
    },
    ForceFinalizeProductionClaim {
        caller: AccountId,
        subject_id: SubjectId,
        hour_id: HourId,
        wh: Wh,
        evidence_root: EvidenceRoot,
    },

    // ── Oracle: consumption ───────────────────────────────────────────────────
    SubmitConsumptionClaim {
        subject_id: SubjectId,
        hour_id: HourId,
        wh: Wh,
        evidence_root: EvidenceRoot,
        signature: RecoverableSignature,
    },
    FinalizeConsumptionClaim {
        subject_id: SubjectId,
        hour_id: HourId,
    },
    ForceFinalizeConsumptionClaim {
        caller: AccountId,
        subject_id: SubjectId,
        hour_id: HourId,
        wh: Wh,
        evidence_root: EvidenceRoot,
    },

    // ── Treasury ──────────────────────────────────────────────────────────────
    ClaimRewards {
        caller: AccountId,
    },
    FundRewardPool {
        caller: AccountId,
        amount: Balance,
    },
    Slash {
        caller: AccountId,
        verifier: AccountId,
    },

    // ── Admin setters ─────────────────────────────────────────────────────────
    SetQuorumBps {
        caller: AccountId,
        quorum_bps: u16,
    },
    SetClaimWindow {
        caller: AccountId,
        claim_window_secs: i64,
    },
    SetRewardPerWh {
        caller: AccountId,
        reward_per_wh: Balance,
    },
    SetSlashBps {
        caller: AccountId,
        slash_bps: u16,
    },
    SetFaultThreshold {
        caller: AccountId,
        fault_threshold: u32,
    },
    SetMinStake {
        caller: AccountId,
        min_stake: Balance,
    },
    SetPermissionedMode {
        caller: AccountId,
        permissioned_mode: bool,
    },
    SetAllowlisted {
        caller: AccountId,
        verifier: AccountId,
        allowlisted: bool,
    },
    SetBaselineMode {
        caller: AccountId,
        baseline_mode: bool,
        single_verifier_override: Option<AccountId>,
    },
    SetSlashingDisabled {
        caller: AccountId,
        slashing_disabled: bool,
    },
}
