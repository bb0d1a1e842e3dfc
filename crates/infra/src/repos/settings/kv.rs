use super::ISettingsRepo;
use crate::repos::{
    kv::IKVRepo,
    shared::persisted::{load_state, save_state, with_default, Migration},
};
use chrono::prelude::*;
use serde_json::{json, Value};
use std::sync::Arc;
use subtrack_domain::{NotificationPermission, NotificationSettings};
use tokio::sync::{watch, Mutex};
use tracing::warn;

const KEY: &str = "subtrack-settings";
const VERSION: u32 = 3;
const MIGRATIONS: [Migration; 2] = [v1_to_v2, v2_to_v3];

fn v1_to_v2(state: Value) -> Value {
    with_default(state, "time", json!("09:00"))
}

fn v2_to_v3(state: Value) -> Value {
    let state = with_default(state, "timezone", json!("UTC"));
    with_default(state, "lastCheckedAt", Value::Null)
}

pub struct KvSettingsRepo {
    kv: Arc<dyn IKVRepo>,
    /// Holds the current settings, writers are serialized by `write_lock`
    settings: watch::Sender<NotificationSettings>,
    write_lock: Mutex<()>,
}

impl KvSettingsRepo {
    pub fn new(kv: Arc<dyn IKVRepo>) -> Self {
        Self::with_settings(kv, NotificationSettings::default())
    }

    fn with_settings(kv: Arc<dyn IKVRepo>, settings: NotificationSettings) -> Self {
        let (settings, _) = watch::channel(settings);
        Self {
            kv,
            settings,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn load(kv: Arc<dyn IKVRepo>) -> anyhow::Result<Self> {
        let settings = load_state::<NotificationSettings>(kv.as_ref(), KEY, VERSION, &MIGRATIONS)
            .await?
            .and_then(|settings| match settings.validate() {
                Ok(()) => Some(settings),
                Err(e) => {
                    warn!("Ignoring invalid persisted settings: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        Ok(Self::with_settings(kv, settings))
    }

    async fn update<F>(&self, change: F) -> anyhow::Result<()>
    where
        F: FnOnce(&mut NotificationSettings) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut next = self.settings.borrow().clone();
        change(&mut next);
        if *self.settings.borrow() == next {
            return Ok(());
        }
        if let Err(e) = next.validate() {
            warn!("Refusing to save invalid settings: {}", e);
            return Err(e.into());
        }

        save_state(self.kv.as_ref(), KEY, VERSION, &next).await?;
        self.settings.send_replace(next);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ISettingsRepo for KvSettingsRepo {
    async fn get(&self) -> NotificationSettings {
        self.settings.borrow().clone()
    }

    async fn save(&self, settings: &NotificationSettings) -> anyhow::Result<()> {
        let settings = settings.clone();
        self.update(move |current| *current = settings).await
    }

    async fn set_permission(&self, permission: NotificationPermission) -> anyhow::Result<()> {
        self.update(move |current| current.permission = permission)
            .await
    }

    async fn set_last_checked_at(&self, checked_at: DateTime<Utc>) -> anyhow::Result<()> {
        self.update(move |current| current.last_checked_at = Some(checked_at))
            .await
    }

    fn subscribe(&self) -> watch::Receiver<NotificationSettings> {
        self.settings.subscribe()
    }
}
