//! Contract Adapters
//!
//! Typed call surfaces over the ledger port:
//! - `ContractProxy`: address + optional authority, typed getters and mutators
//! - `TokenContract`: fee-bearing token
//! - `RegistryContract`: shared fee registry, pagination and verification

pub mod proxy;
pub mod token;
pub mod registry;

pub use proxy::{ContractError, ContractProxy};
pub use token::{TokenContract, TokenInfo};
pub use registry::RegistryContract;
