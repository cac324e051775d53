pub mod hash;
pub mod keypair;
pub mod signature;

pub use hash::{account_id_from_pubkey, claim_key, keccak256, subject_id, submission_digest, value_hash};
pub use keypair::KeyPair;
pub use signature::{recover_signer, sign_prehash, verify_prehash};
