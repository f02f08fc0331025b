//! Analytics Aggregator
//!
//! Fans out reads across the registry and every deployed token, then reduces
//! them into an `AnalyticsReport`. Nothing is cached; each report reflects
//! the ledger at the time it was requested.

use tokio::task::JoinSet;

use super::orchestrator::{DeploymentOrchestrator, OrchestratorError};
use crate::adapters::contract::{ContractError, TokenContract};
use crate::domain::units::from_smallest_unit;
use crate::domain::{AnalyticsReport, TokenAnalytics};

/// Build a report for everything the orchestrator has deployed
///
/// Fails as a whole if any single read fails. A token read failure is
/// reported as `PartialAnalyticsFailure` naming that token.
pub async fn build_report(orchestrator: &DeploymentOrchestrator) -> Result<AnalyticsReport, OrchestratorError> {
    let registry = orchestrator
        .registry()
        .ok_or(OrchestratorError::NotInitialized)?;

    let tokens: Vec<TokenContract> = orchestrator
        .deployed_tokens()
        .iter()
        .map(|deployed| orchestrator.token(deployed.address))
        .collect();

    tracing::debug!("Building analytics for {} token(s)", tokens.len());
    let (summary, per_token) = tokio::try_join!(
        async { registry.summary().await.map_err(OrchestratorError::from) },
        read_all_tokens(tokens),
    )?;

    Ok(AnalyticsReport::new(summary, per_token))
}

/// One task per token; results are slotted back in deployment order
async fn read_all_tokens(tokens: Vec<TokenContract>) -> Result<Vec<TokenAnalytics>, OrchestratorError> {
    let mut slots: Vec<Option<TokenAnalytics>> = vec![None; tokens.len()];
    let mut tasks = JoinSet::new();

    for (index, token) in tokens.into_iter().enumerate() {
        tasks.spawn(async move {
            let result = read_token(&token).await;
            (index, token.address(), result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, address, result) = joined.map_err(|e| OrchestratorError::TaskFailed(e.to_string()))?;
        match result {
            Ok(analytics) => slots[index] = Some(analytics),
            Err(source) => {
                tracing::warn!("Analytics read failed for {:?}: {}", address, source);
                return Err(OrchestratorError::PartialAnalyticsFailure { token: address, source });
            }
        }
    }

    Ok(slots.into_iter().flatten().collect())
}

async fn read_token(token: &TokenContract) -> Result<TokenAnalytics, ContractError> {
    // balance lookup needs the owner first
    let owner_and_balance = async {
        let owner = token.owner().await?;
        let balance = token.owner_balance(owner).await?;
        Ok::<_, ContractError>((owner, balance))
    };

    let (name, symbol, total_supply, decimals, fees, (owner, owner_balance)) = tokio::try_join!(
        token.name(),
        token.symbol(),
        token.total_supply(),
        token.decimals(),
        token.fee_info(),
        owner_and_balance,
    )?;

    Ok(TokenAnalytics {
        address: token.address(),
        name,
        symbol,
        total_supply: from_smallest_unit(total_supply, u32::from(decimals))?,
        decimals,
        owner,
        fees,
        owner_balance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::PaperLedger;
    use crate::domain::{default_presets, FeeKind};
    use crate::ports::LedgerError;
    use ethers::types::Address;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn deployer() -> Address {
        Address::from_low_u64_be(0xD1)
    }

    #[tokio::test]
    async fn test_report_requires_registry() {
        let orchestrator = DeploymentOrchestrator::new(Arc::new(PaperLedger::new()), deployer());
        let err = build_report(&orchestrator).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NotInitialized));
    }

    #[tokio::test]
    async fn test_empty_registry_report() {
        let mut orchestrator = DeploymentOrchestrator::new(Arc::new(PaperLedger::new()), deployer());
        orchestrator.deploy_registry().await.unwrap();

        let report = build_report(&orchestrator).await.unwrap();
        assert_eq!(report.registry.total_tokens, 0);
        assert_eq!(report.registry.service_fee, dec!(0.2));
        assert_eq!(report.summary.total_value_collected, dec!(0));
        assert_eq!(report.summary.total_tokens_deployed, 0);
        assert_eq!(report.summary.average_fees.reflection, None);
    }

    #[tokio::test]
    async fn test_report_keeps_deployment_order() {
        let mut orchestrator = DeploymentOrchestrator::new(Arc::new(PaperLedger::new()), deployer());
        orchestrator.deploy_registry().await.unwrap();
        orchestrator
            .deploy_preset_batch(&default_presets(), Address::from_low_u64_be(0x7A), deployer())
            .await
            .unwrap();

        let report = build_report(&orchestrator).await.unwrap();
        let symbols: Vec<&str> = report.tokens.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["RFLX", "BURN", "LIQ"]);

        let first = &report.tokens[0];
        assert_eq!(first.total_supply, dec!(1000000));
        assert_eq!(first.owner, deployer());
        assert_eq!(first.owner_balance.balance, dec!(1000000));
        assert_eq!(first.fees.rate(FeeKind::Burn), dec!(0.5));

        // (2 + 1 + 0.5) / 3
        let expected = (dec!(3.5) / dec!(3)).normalize();
        assert_eq!(report.summary.average_fees.reflection, Some(expected));
    }

    #[tokio::test]
    async fn test_token_read_failure_names_the_token() {
        let ledger = Arc::new(PaperLedger::new());
        let mut orchestrator = DeploymentOrchestrator::new(ledger.clone(), deployer());
        orchestrator.deploy_registry().await.unwrap();
        let address = orchestrator
            .deploy_token(default_presets().remove(0).into_config(Address::from_low_u64_be(0x7A), deployer()))
            .await
            .unwrap();

        ledger
            .inject_failure("symbol", 1, LedgerError::Transport("connection reset".to_string()))
            .await;

        let err = build_report(&orchestrator).await.unwrap_err();
        match err {
            OrchestratorError::PartialAnalyticsFailure { token, source } => {
                assert_eq!(token, address);
                assert!(source.ledger_error().is_some());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
