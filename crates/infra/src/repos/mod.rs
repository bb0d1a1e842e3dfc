mod kv;
mod schedule;
mod settings;
mod shared;
mod subscription;

pub use kv::{FileKVRepo, IKVRepo, InMemoryKVRepo};
pub use schedule::{IScheduleRepo, KvScheduleRepo};
pub use settings::{ISettingsRepo, KvSettingsRepo};
use std::{path::Path, sync::Arc};
pub use subscription::{ISubscriptionRepo, KvSubscriptionRepo};
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub schedules: Arc<dyn IScheduleRepo>,
    pub settings: Arc<dyn ISettingsRepo>,
    pub subscriptions: Arc<dyn ISubscriptionRepo>,
}

impl Repos {
    /// Loads every store from the given storage
    pub async fn create(kv: Arc<dyn IKVRepo>) -> anyhow::Result<Self> {
        Ok(Self {
            schedules: Arc::new(KvScheduleRepo::load(kv.clone()).await?),
            settings: Arc::new(KvSettingsRepo::load(kv.clone()).await?),
            subscriptions: Arc::new(KvSubscriptionRepo::load(kv).await?),
        })
    }

    pub async fn create_file(state_dir: &Path) -> anyhow::Result<Self> {
        info!("Loading state from {}", state_dir.display());
        Self::create(Arc::new(FileKVRepo::new(state_dir))).await
    }

    pub fn create_inmemory() -> Self {
        let kv: Arc<dyn IKVRepo> = Arc::new(InMemoryKVRepo::new());
        Self {
            schedules: Arc::new(KvScheduleRepo::new(kv.clone())),
            settings: Arc::new(KvSettingsRepo::new(kv.clone())),
            subscriptions: Arc::new(KvSubscriptionRepo::new(kv)),
        }
    }
}
