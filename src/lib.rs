//! Feeforge - Fee-bearing token deployment and registry analytics
//!
//! Deploys a shared fee registry and fee-bearing ERC-20 tokens against it,
//! then reads, aggregates and manages them through typed contract proxies.
//!
//! # Modules
//!
//! - `domain`: Pure types (unit conversion, fee settings, token configs, reports)
//! - `ports`: Ledger abstraction (`LedgerClient`)
//! - `adapters`: Contract proxies and the in-memory paper ledger
//! - `config`: Configuration loading and validation
//! - `application`: Deployment orchestrator, analytics aggregator, management dispatcher

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
