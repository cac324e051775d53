pub mod action;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod ledger;
pub mod oracle_types;
pub mod registry_types;
pub mod types;

pub use action::Action;
pub use config::{FaultKind, ProtocolConfig};
pub use error::ProtocolError;
pub use events::Event;
pub use ledger::{CreditLedger, StakeLedger};
pub use oracle_types::{ClaimBucket, ValueTally};
pub use registry_types::{ConsumerRecord, ProducerRecord, Snapshot, Verifier};
pub use types::*;
