use k256::ecdsa::SigningKey;
use rand_core::OsRng;

use wattcred_core::types::{AccountId, PublicKey, RecoverableSignature};

use crate::hash::account_id_from_pubkey;
use crate::signature::sign_prehash;

/// A verifier keypair: secp256k1 signing key with a derived `AccountId`.
/// The secret key bytes are zeroized on drop.
pub struct KeyPair {
    pub account_id: AccountId,
    pub public_key: PublicKey,
    secret_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh secp256k1 keypair.
    pub fn generate() -> Self {
        let secret_key = SigningKey::random(&mut OsRng);
        Self::from_signing_key(secret_key)
    }

    /// Wrap an existing signing key (e.g. restored from a wallet file).
    pub fn from_signing_key(secret_key: SigningKey) -> Self {
        let encoded = secret_key.verifying_key().to_encoded_point(false);
        let public_key = PublicKey(encoded.as_bytes().to_vec());
        let account_id = account_id_from_pubkey(&public_key.0);
        Self {
            account_id,
            public_key,
            secret_key,
        }
    }

    /// Sign a 32-byte prehashed digest, e.g. the oracle submission digest
    /// from `wattcred_crypto::hash::submission_digest`.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> RecoverableSignature {
        sign_prehash(&self.secret_key, digest)
    }
}

// `SigningKey` zeroizes its own backing bytes on drop (elliptic-curve's
// `SecretKey` is `ZeroizeOnDrop`); no manual `Drop` impl needed here.

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyPair {{ account_id: {:?} }}", self.account_id)
    }
}
