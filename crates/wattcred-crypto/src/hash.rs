use sha3::{Digest, Keccak256};

use wattcred_core::constants::SUBMISSION_DOMAIN_PREFIX;
use wattcred_core::types::{AccountId, ClaimKey, EvidenceRoot, HourId, SubjectId, ValueHash, Wh};

/// `subjectId = hash(owner ‖ identity_hash ‖ nonce)` (§4.1), the opaque
/// producer/consumer identifier minted at registration time.
pub fn subject_id(owner: AccountId, identity_hash: [u8; 32], nonce: u64) -> SubjectId {
    let mut buf = Vec::with_capacity(32 + 32 + 8);
    buf.extend_from_slice(owner.as_bytes());
    buf.extend_from_slice(&identity_hash);
    buf.extend_from_slice(&nonce.to_be_bytes());
    SubjectId(keccak256(&buf))
}

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Derive an `AccountId` from an uncompressed SEC1 public key: `keccak256(pubkey)`.
/// The protocol's "address" generalises to the full 32-byte hash rather than
/// an Ethereum-style 20-byte suffix, matching this crate's `AccountId` width.
pub fn account_id_from_pubkey(pubkey_bytes: &[u8]) -> AccountId {
    AccountId::from_bytes(keccak256(pubkey_bytes))
}

/// `claimKey = hash(tag ‖ oracle ‖ subject_id ‖ hour_id)` (§6).
pub fn claim_key(tag: u8, oracle: AccountId, subject_id: SubjectId, hour_id: HourId) -> ClaimKey {
    let mut buf = Vec::with_capacity(1 + 32 + 32 + 8);
    buf.push(tag);
    buf.extend_from_slice(oracle.as_bytes());
    buf.extend_from_slice(subject_id.as_bytes());
    buf.extend_from_slice(&hour_id.to_be_bytes());
    ClaimKey(keccak256(&buf))
}

/// `valueHash = hash(wh ‖ evidence_root)` (§6).
pub fn value_hash(wh: Wh, evidence_root: EvidenceRoot) -> ValueHash {
    let mut buf = Vec::with_capacity(8 + 32);
    buf.extend_from_slice(&wh.to_be_bytes());
    buf.extend_from_slice(&evidence_root.0);
    ValueHash(keccak256(&buf))
}

/// The digest a verifier signs:
/// `hash(domain_prefix ‖ chain_id ‖ oracle ‖ subject_id ‖ hour_id ‖ wh ‖ evidence_root)`.
///
/// This is the Rust rendering of §6's `digest = hash(uint256 chainId ‖ address
/// oracle ‖ bytes32 subjectId ‖ uint256 hourId ‖ uint64 wh ‖ bytes32
/// evidenceRoot)` after the "personal-message prefix convention" is applied —
/// here the prefix is folded directly into the hashed preimage rather than
/// requiring a second hashing pass, since this core has no wallet-software
/// layer imposing its own framing.
pub fn submission_digest(
    chain_id: u64,
    oracle: AccountId,
    subject_id: SubjectId,
    hour_id: HourId,
    wh: Wh,
    evidence_root: EvidenceRoot,
) -> [u8; 32] {
    let mut buf = Vec::with_capacity(
        SUBMISSION_DOMAIN_PREFIX.len() + 8 + 32 + 32 + 8 + 8 + 32,
    );
    buf.extend_from_slice(SUBMISSION_DOMAIN_PREFIX);
    buf.extend_from_slice(&chain_id.to_be_bytes());
    buf.extend_from_slice(oracle.as_bytes());
    buf.extend_from_slice(subject_id.as_bytes());
    buf.extend_from_slice(&hour_id.to_be_bytes());
    buf.extend_from_slice(&wh.to_be_bytes());
    buf.extend_from_slice(&evidence_root.0);
    keccak256(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_key_is_domain_separated_by_tag() {
        let oracle = AccountId::from_bytes([1u8; 32]);
        let subject = SubjectId([2u8; 32]);
        let a = claim_key(0x01, oracle, subject, 500_000);
        let b = claim_key(0x02, oracle, subject, 500_000);
        assert_ne!(a.0, b.0);
    }

    #[test]
    fn claim_key_is_domain_separated_by_oracle() {
        let subject = SubjectId([2u8; 32]);
        let a = claim_key(0x01, AccountId::from_bytes([1u8; 32]), subject, 1);
        let b = claim_key(0x01, AccountId::from_bytes([9u8; 32]), subject, 1);
        assert_ne!(a.0, b.0);
    }

    #[test]
    fn value_hash_distinguishes_evidence_root() {
        let a = value_hash(5000, EvidenceRoot([0xAA; 32]));
        let b = value_hash(5000, EvidenceRoot([0xBB; 32]));
        assert_ne!(a.0, b.0);
    }

    #[test]
    fn subject_id_differs_per_nonce() {
        let owner = AccountId::from_bytes([3u8; 32]);
        let identity_hash = [4u8; 32];
        let a = subject_id(owner, identity_hash, 0);
        let b = subject_id(owner, identity_hash, 1);
        assert_ne!(a.0, b.0);
    }

    #[test]
    fn submission_digest_differs_per_field() {
        let oracle = AccountId::from_bytes([1u8; 32]);
        let subject = SubjectId([2u8; 32]);
        let base = submission_digest(1, oracle, subject, 500_000, 5000, EvidenceRoot([0xAA; 32]));
        let diff_chain = submission_digest(2, oracle, subject, 500_000, 5000, EvidenceRoot([0xAA; 32]));
        let diff_wh = submission_digest(1, oracle, subject, 500_000, 5001, EvidenceRoot([0xAA; 32]));
        assert_ne!(base, diff_chain);
        assert_ne!(base, diff_wh);
    }
}
