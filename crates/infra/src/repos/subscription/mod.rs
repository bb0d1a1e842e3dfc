mod kv;

pub use kv::KvSubscriptionRepo;
use subtrack_domain::{Subscription, ID};
use tokio::sync::watch;

#[async_trait::async_trait]
pub trait ISubscriptionRepo: Send + Sync {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()>;
    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()>;
    async fn delete(&self, subscription_id: &ID) -> anyhow::Result<Option<Subscription>>;
    async fn find(&self, subscription_id: &ID) -> Option<Subscription>;
    async fn find_all(&self) -> Vec<Subscription>;
    /// Revision counter that is bumped on every committed change
    fn subscribe(&self) -> watch::Receiver<u64>;
}
