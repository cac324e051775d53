//! `sled`-backed storage and the three core components (Registry, Oracle,
//! Treasury) plus the `ProtocolEngine` that dispatches actions to them.

pub mod db;
pub mod engine;
pub mod ledger;
pub mod oracle;
pub mod registry;
pub mod treasury;

pub use db::StateDb;
pub use engine::ProtocolEngine;
pub use ledger::{InMemoryCreditLedger, InMemoryStakeLedger};
pub use oracle::{ConsumptionEffect, Oracle, OracleEffect, ProductionEffect};
pub use registry::Registry;
pub use treasury::Treasury;
