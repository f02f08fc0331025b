//! Domain Layer - Pure types and conversions
//!
//! No ledger access happens here. Everything that talks to contracts goes
//! through the ports layer.

pub mod units;
pub mod fees;
pub mod token;
pub mod registry;
pub mod analytics;

pub use units::{
    to_basis_points, from_basis_points, to_smallest_unit, from_smallest_unit,
    UnitError, TOKEN_DECIMALS, NATIVE_DECIMALS,
};
pub use fees::{FeeKind, FeeRate, FeeSettings, FeePercentages};
pub use token::{TokenConfig, TokenConfigError, DeployedToken, TokenPreset, default_presets, TOKEN_ARTIFACT};
pub use registry::{RegistryEntry, Verification, REGISTRY_ARTIFACT};
pub use analytics::{AnalyticsReport, RegistrySummary, TokenAnalytics, OwnerBalance, AverageFees, ReportSummary};
