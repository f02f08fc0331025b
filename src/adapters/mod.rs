//! Adapters Layer - External System Implementations
//!
//! - Contract: typed registry and token surfaces over the ledger port
//! - Paper: in-process ledger for dry runs and tests

pub mod contract;
pub mod paper;

pub use contract::{ContractError, ContractProxy, RegistryContract, TokenContract, TokenInfo};
pub use paper::PaperLedger;
