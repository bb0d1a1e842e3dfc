mod kv;

use chrono::prelude::*;
pub use kv::KvSettingsRepo;
use subtrack_domain::{NotificationPermission, NotificationSettings};
use tokio::sync::watch;

#[async_trait::async_trait]
pub trait ISettingsRepo: Send + Sync {
    async fn get(&self) -> NotificationSettings;
    /// Invalid settings are refused and the `SettingsValidationError` is returned
    /// inside the error
    async fn save(&self, settings: &NotificationSettings) -> anyhow::Result<()>;
    async fn set_permission(&self, permission: NotificationPermission) -> anyhow::Result<()>;
    async fn set_last_checked_at(&self, checked_at: DateTime<Utc>) -> anyhow::Result<()>;
    /// Observes every committed change of the settings
    fn subscribe(&self) -> watch::Receiver<NotificationSettings>;
}
