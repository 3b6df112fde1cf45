//! The four core components wired together around one shared job store.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vedex_aggregator::{AggregatorConfig, ClaimableRewards, RewardAggregator};
use vedex_core::{Address, LockPosition, Pool};
use vedex_gateway::{BatchGateway, GatewayConfig, ReadTransport};
use vedex_lifecycle::TransactionStore;
use vedex_orchestrator::{
    Orchestrator, OrchestratorConfig, ReceiptWatcher, SubmissionReport, WalletSigner, WriteIntent,
};

use crate::AppError;

/// Persisted dashboard configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub gateway: GatewayConfig,
    pub aggregator: AggregatorConfig,
    pub orchestrator: OrchestratorConfig,
}

pub struct Dashboard {
    store: Arc<TransactionStore>,
    aggregator: RewardAggregator,
    orchestrator: Orchestrator,
}

impl Dashboard {
    pub fn new(
        config: &DashboardConfig,
        transport: Arc<dyn ReadTransport>,
        signer: Arc<dyn WalletSigner>,
        watcher: Arc<dyn ReceiptWatcher>,
    ) -> Self {
        let store = Arc::new(TransactionStore::new());
        let gateway = Arc::new(BatchGateway::new(transport, config.gateway.clone()));
        let aggregator = RewardAggregator::new(gateway, config.aggregator.clone());
        let orchestrator = Orchestrator::new(
            store.clone(),
            signer,
            watcher,
            config.orchestrator.clone(),
        );
        Self {
            store,
            aggregator,
            orchestrator,
        }
    }

    /// The job store every view subscribes to.
    pub fn store(&self) -> &Arc<TransactionStore> {
        &self.store
    }

    pub fn aggregator(&self) -> &RewardAggregator {
        &self.aggregator
    }

    pub async fn claimable(
        &self,
        account: Address,
        lock: Option<&LockPosition>,
        pools: Option<&[Pool]>,
        now: u64,
    ) -> Result<ClaimableRewards, AppError> {
        Ok(self.aggregator.aggregate(account, lock, pools, now).await?)
    }

    pub async fn submit(&self, intent: WriteIntent) -> Result<SubmissionReport, AppError> {
        Ok(self.orchestrator.submit(intent).await?)
    }

    /// Re-aggregate and claim everything currently claimable.
    pub async fn claim_all(
        &self,
        account: Address,
        lock: Option<&LockPosition>,
        pools: Option<&[Pool]>,
        now: u64,
    ) -> Result<SubmissionReport, AppError> {
        let claimable = self.claimable(account, lock, pools, now).await?;
        self.submit(WriteIntent::ClaimAll(claimable)).await
    }
}
