//! Ports Layer - Trait definitions for external dependencies
//!
//! The ledger is the only external system this crate talks to. Adapters in
//! `adapters::contract` build typed contract surfaces on top of it;
//! `adapters::paper` provides an in-process implementation.

pub mod ledger;

pub use ledger::{LedgerClient, LedgerError, TxReceipt};

#[cfg(test)]
pub use ledger::MockLedgerClient;
