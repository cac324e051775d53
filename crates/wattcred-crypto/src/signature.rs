use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

use wattcred_core::error::ProtocolError;
use wattcred_core::types::{AccountId, RecoverableSignature};

use crate::hash::account_id_from_pubkey;

/// Sign a 32-byte prehashed digest, producing the 65-byte
/// `(r, s, recovery_id)` encoding the wire contract specifies.
pub fn sign_prehash(signing_key: &SigningKey, digest: &[u8; 32]) -> RecoverableSignature {
    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash_recoverable(digest)
        .expect("signing a well-formed 32-byte digest with a valid key is infallible");
    let mut bytes = [0u8; 65];
    bytes[..64].copy_from_slice(&signature.to_bytes());
    bytes[64] = recovery_id.to_byte();
    RecoverableSignature(bytes)
}

/// Recover the signer's `AccountId` from a digest and a 65-byte recoverable
/// signature. Fails `InvalidSignature` on a malformed signature or a
/// zero/invalid recovery id — the wire contract's "zero-recovery fails
/// InvalidSignature" clause (§4.2 step 3).
pub fn recover_signer(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<AccountId, ProtocolError> {
    let sig_bytes: [u8; 64] = signature.0[..64]
        .try_into()
        .map_err(|_| ProtocolError::InvalidSignature)?;
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| ProtocolError::InvalidSignature)?;
    let recovery_id =
        RecoveryId::from_byte(signature.0[64]).ok_or(ProtocolError::InvalidSignature)?;

    let verifying_key = VerifyingKey::recover_from_prehash(digest, &sig, recovery_id)
        .map_err(|_| ProtocolError::InvalidSignature)?;

    let encoded = verifying_key.to_encoded_point(false);
    Ok(account_id_from_pubkey(encoded.as_bytes()))
}

/// Verify a non-recoverable check of `signature` against `verifying_key` —
/// used in tests to sanity-check signing without going through recovery.
pub fn verify_prehash(
    verifying_key: &VerifyingKey,
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> bool {
    let Ok(sig_bytes) = <[u8; 64]>::try_from(&signature.0[..64]) else {
        return false;
    };
    let Ok(sig) = Signature::from_slice(&sig_bytes) else {
        return false;
    };
    verifying_key.verify_prehash(digest, &sig).is_ok()
}
