use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};
use subtrack_domain::{ReliabilityReason, ID};
use tracing::info;

/// Records batches of reminders for delivery reliability analysis
#[async_trait::async_trait]
pub trait IReliabilityLogger: Send + Sync {
    async fn log_reliability_batch(
        &self,
        subscription_ids: &[ID],
        reason: ReliabilityReason,
    ) -> anyhow::Result<()>;
}

pub struct TracingReliabilityLogger {}

#[async_trait::async_trait]
impl IReliabilityLogger for TracingReliabilityLogger {
    async fn log_reliability_batch(
        &self,
        subscription_ids: &[ID],
        reason: ReliabilityReason,
    ) -> anyhow::Result<()> {
        let ids = subscription_ids
            .iter()
            .map(|id| id.as_string())
            .collect::<Vec<_>>()
            .join(",");
        info!(
            target: "subtrack::reliability",
            reason = %reason,
            count = subscription_ids.len(),
            subscription_ids = %ids,
            "Reliability batch"
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryReliabilityLogger {
    batches: Mutex<Vec<(Vec<ID>, ReliabilityReason)>>,
    failing: AtomicBool,
}

impl InMemoryReliabilityLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batches(&self) -> Vec<(Vec<ID>, ReliabilityReason)> {
        self.batches.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl IReliabilityLogger for InMemoryReliabilityLogger {
    async fn log_reliability_batch(
        &self,
        subscription_ids: &[ID],
        reason: ReliabilityReason,
    ) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("Reliability log is unavailable");
        }
        self.batches
            .lock()
            .unwrap()
            .push((subscription_ids.to_vec(), reason));
        Ok(())
    }
}
