//! Protocol-wide constants that are NOT governance-tunable.
//!
//! Governance-tunable knobs (quorum, claim window, reward rate, ...) live in
//! [`crate::config::ProtocolConfig`] instead, since they are mutated through
//! admin setters rather than compiled in.

use crate::types::Balance;

// ── Claim-key domain separation ──────────────────────────────────────────────

/// Tag byte for a production claim key.
pub const CLAIM_TAG_PRODUCTION: u8 = 0x01;
/// Tag byte for a consumption claim key.
pub const CLAIM_TAG_CONSUMPTION: u8 = 0x02;
/// Tag byte reserved for retirement-derived keys. No retirement logic lives
/// in this crate (see DESIGN.md, Open Question #3) — the constant exists so
/// a future retirement module cannot collide with production/consumption keys.
pub const CLAIM_TAG_RETIREMENT: u8 = 0x03;

/// Domain-separation prefix prepended before hashing a submission digest,
/// the Rust stand-in for the source's "personal-message prefix convention".
pub const SUBMISSION_DOMAIN_PREFIX: &[u8] = b"wattcred-energy-oracle:v1\n";

// ── Basis points ──────────────────────────────────────────────────────────────

/// Denominator for every basis-point quantity in this crate (quorum, slash).
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Minimum legal value for `quorum_bps` (exclusive of zero).
pub const MIN_QUORUM_BPS: u16 = 1;
/// Maximum legal value for `quorum_bps` (100%).
pub const MAX_QUORUM_BPS: u16 = 10_000;

// ── Time ──────────────────────────────────────────────────────────────────────

/// Seconds in one hour — `hourId = floor(unixSeconds / SECS_PER_HOUR)`.
pub const SECS_PER_HOUR: i64 = 3_600;

// ── Governance defaults (§6) ──────────────────────────────────────────────────

pub const DEFAULT_QUORUM_BPS: u16 = 6_667;
pub const DEFAULT_CLAIM_WINDOW_SECS: i64 = 3_600;
pub const DEFAULT_REWARD_PER_WH: Balance = 1_000_000_000_000; // 1e12
pub const DEFAULT_SLASH_BPS: u16 = 1_000;
pub const DEFAULT_FAULT_THRESHOLD: u32 = 3;
/// `100 * 10^18`, carried over verbatim from the source's "100 Chronos-equivalent"
/// default despite this crate's `Balance` not being a token with 18 decimals of
/// its own — embedders are expected to set `min_stake` to whatever their
/// `StakeLedger`'s denomination actually uses.
pub const DEFAULT_MIN_STAKE: Balance = 100 * 1_000_000_000_000_000_000;
pub const DEFAULT_PERMISSIONED_MODE: bool = true;
pub const DEFAULT_BASELINE_MODE: bool = false;
pub const DEFAULT_SLASHING_DISABLED: bool = false;
