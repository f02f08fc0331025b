//! Paper Ledger
//!
//! In-memory ledger used for dry runs and deterministic tests. Mirrors the
//! call surface of the registry and token contracts without touching a network.

mod state;
pub mod ledger;

pub use ledger::{CallKind, PaperLedger, RecordedCall};
