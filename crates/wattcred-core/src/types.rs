//! Core identifier and scalar types shared by the Registry, Oracle, and
//! Treasury components.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stake/credit balance. u128 covers any realistic total supply with room
/// to spare; the source's "unsigned 256-bit" is a Solidity artifact, not a
/// range this protocol actually needs.
pub type Balance = u128;

/// Watt-hour quantity carried by a single claim.
pub type Wh = u64;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// `floor(unixSeconds / 3600)` — the hour a claim covers.
pub type HourId = u64;

/// 1-indexed position of a verifier inside a `Snapshot`. 0 is never valid.
pub type VerifierIndex = u8;

/// 16-bit verifier-index bitmap. Bit `i` (0-indexed) corresponds to
/// `snapshot.verifiers[i]`.
pub type Bitmap16 = u16;

/// Maximum number of verifiers a single snapshot (and therefore a single
/// `Bitmap16`) can address.
pub const MAX_ACTIVE_VERIFIERS: usize = 16;

// ── AccountId ────────────────────────────────────────────────────────────────

/// 32-byte account identifier. For verifiers this is derived from the
/// recovered ECDSA public key (see `wattcred-crypto::hash::account_id_from_pubkey`);
/// for producers/consumers/payout addresses it is any opaque 32-byte value
/// the caller supplies.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub const ZERO: AccountId = AccountId([0u8; 32]);

    pub fn from_bytes(b: [u8; 32]) -> Self {
        Self(b)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut arr = [0u8; 32];
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({}…)", &self.to_hex()[..8])
    }
}

// ── ClaimKey ─────────────────────────────────────────────────────────────────

/// Domain-separated identifier of a claim bucket:
/// `hash(tag ‖ oracle_address ‖ subject_id ‖ hour_id)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimKey(pub [u8; 32]);

impl ClaimKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClaimKey({}…)", &self.to_hex()[..12])
    }
}

// ── ValueHash ────────────────────────────────────────────────────────────────

/// `hash(wh ‖ evidence_root)` — identifies one distinct claimed value within
/// a bucket.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueHash(pub [u8; 32]);

impl ValueHash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for ValueHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueHash({}…)", &self.to_hex()[..12])
    }
}

// ── EvidenceRoot ─────────────────────────────────────────────────────────────

/// Opaque 32-byte commitment to off-chain evidence backing a claimed value.
/// The protocol never interprets this data — it is a commitment only.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvidenceRoot(pub [u8; 32]);

impl EvidenceRoot {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for EvidenceRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvidenceRoot({}…)", &self.to_hex()[..12])
    }
}

// ── SnapshotId ───────────────────────────────────────────────────────────────

/// Strictly-positive monotonic snapshot identifier. `0` means "no snapshot".
pub type SnapshotId = u64;

/// Reserved value meaning "no snapshot created yet".
pub const NO_SNAPSHOT: SnapshotId = 0;

// ── SubjectId ────────────────────────────────────────────────────────────────

/// Opaque 32-byte producer/consumer identifier, derived as
/// `hash(owner ‖ identity_hash ‖ nonce)` at registration time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub [u8; 32]);

impl SubjectId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubjectId({}…)", &self.to_hex()[..8])
    }
}

// ── Recoverable ECDSA signature ──────────────────────────────────────────────

/// A 65-byte recoverable ECDSA (secp256k1) signature: 64 bytes of (r, s)
/// plus a 1-byte recovery id.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoverableSignature(pub [u8; 65]);

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature({}b)", self.0.len())
    }
}

/// A secp256k1 public key in SEC1 uncompressed encoding (65 bytes).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey(pub Vec<u8>);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}b)", self.0.len())
    }
}
