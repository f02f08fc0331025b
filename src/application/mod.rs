//! Application Layer - Deployment, analytics and management flows

pub mod orchestrator;
pub mod analytics;
pub mod dispatcher;

pub use orchestrator::{DeploymentOrchestrator, OrchestratorError, OrchestratorState};
pub use analytics::build_report;
pub use dispatcher::{CommandOutcome, DispatchError, Dispatcher, RegistryCommand, TokenCommand};
