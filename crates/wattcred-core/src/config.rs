//! Governance-tunable protocol configuration.
//!
//! `ProtocolConfig` is the Registry's singleton record (mirroring
//! `chronx_core::account::Account` being a singleton-per-key record): it is
//! constructed once via [`ProtocolConfig::new`] and thereafter mutated only
//! through the Registry's admin setters, never passed around as a loose
//! parameter bag.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASELINE_MODE, DEFAULT_CLAIM_WINDOW_SECS, DEFAULT_FAULT_THRESHOLD,
    DEFAULT_MIN_STAKE, DEFAULT_PERMISSIONED_MODE, DEFAULT_QUORUM_BPS, DEFAULT_REWARD_PER_WH,
    DEFAULT_SLASHING_DISABLED, DEFAULT_SLASH_BPS,
};
use crate::types::{AccountId, Balance};

/// Governance-tunable knobs shared by Registry, Oracle, and Treasury.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Account authorized to call admin setters and `force_finalize`.
    pub admin: AccountId,
    /// Basis points of the active snapshot that must agree for finalization.
    pub quorum_bps: u16,
    /// Seconds after the first submission before a claim bucket can finalize.
    pub claim_window_secs: i64,
    /// Stake-token wei minted/paid per verified watt-hour.
    pub reward_per_wh: Balance,
    /// Basis points of stake removed per auto-slash event.
    pub slash_bps: u16,
    /// Fault count at which a verifier is auto-slashed.
    pub fault_threshold: u32,
    /// Minimum stake required to activate.
    pub min_stake: Balance,
    /// When true, `activate_verifier` also requires `allowlisted == true`.
    pub permissioned_mode: bool,
    /// When true, `single_verifier_override`'s submissions finalize immediately.
    pub baseline_mode: bool,
    /// When true, faults are still counted but never trigger a slash.
    pub slashing_disabled: bool,
    /// The trusted single verifier baseline mode shortcuts for.
    pub single_verifier_override: Option<AccountId>,
}

impl ProtocolConfig {
    /// Construct the default configuration (§6), owned by `admin`.
    pub fn new(admin: AccountId) -> Self {
        Self {
            admin,
            quorum_bps: DEFAULT_QUORUM_BPS,
            claim_window_secs: DEFAULT_CLAIM_WINDOW_SECS,
            reward_per_wh: DEFAULT_REWARD_PER_WH,
            slash_bps: DEFAULT_SLASH_BPS,
            fault_threshold: DEFAULT_FAULT_THRESHOLD,
            min_stake: DEFAULT_MIN_STAKE,
            permissioned_mode: DEFAULT_PERMISSIONED_MODE,
            baseline_mode: DEFAULT_BASELINE_MODE,
            slashing_disabled: DEFAULT_SLASHING_DISABLED,
            single_verifier_override: None,
        }
    }
}

/// Why a fault was recorded against a verifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// Submitted a value that did not win quorum.
    WrongValue,
    /// Submitted after the claim's deadline had passed.
    LateSubmission,
    /// Submitted a second time for the same claim.
    DuplicateSubmission,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FaultKind::WrongValue => "wrong_value",
            FaultKind::LateSubmission => "late_submission",
            FaultKind::DuplicateSubmission => "duplicate_submission",
        };
        write!(f, "{s}")
    }
}
