use super::IScheduleRepo;
use crate::repos::{
    kv::IKVRepo,
    shared::persisted::{load_state, save_state, with_default, Migration},
};
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashSet, sync::Arc};
use subtrack_domain::{carry_over_notified, validate_schedule, ScheduleEntry, ID};
use tokio::sync::Mutex;
use tracing::warn;

const KEY: &str = "subtrack-notification-schedule";
const VERSION: u32 = 2;
const MIGRATIONS: [Migration; 1] = [v1_to_v2];

fn v1_to_v2(state: Value) -> Value {
    with_default(state, "lastCalculatedAt", Value::Null)
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleState {
    entries: Vec<ScheduleEntry>,
    last_calculated_at: Option<DateTime<Utc>>,
}

/// Entries are parsed one by one on load so that a single bad entry does not
/// cost the whole schedule
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedScheduleState {
    #[serde(default)]
    entries: Vec<Value>,
    #[serde(default)]
    last_calculated_at: Option<DateTime<Utc>>,
}

impl From<PersistedScheduleState> for ScheduleState {
    fn from(persisted: PersistedScheduleState) -> Self {
        let mut seen = HashSet::new();
        let entries = persisted
            .entries
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<ScheduleEntry>(raw) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Dropping unreadable persisted schedule entry: {:?}", e);
                    None
                }
            })
            .filter(|entry| match entry.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!("Dropping invalid persisted schedule entry: {}", e);
                    false
                }
            })
            .filter(|entry| {
                let first = seen.insert(entry.subscription_id);
                if !first {
                    warn!(
                        "Dropping duplicate persisted schedule entry for subscription {}",
                        entry.subscription_id
                    );
                }
                first
            })
            .collect();

        Self {
            entries,
            last_calculated_at: persisted.last_calculated_at,
        }
    }
}

pub struct KvScheduleRepo {
    kv: Arc<dyn IKVRepo>,
    state: Mutex<ScheduleState>,
}

impl KvScheduleRepo {
    /// An empty schedule that is written to `kv` on the first change
    pub fn new(kv: Arc<dyn IKVRepo>) -> Self {
        Self {
            kv,
            state: Mutex::new(ScheduleState::default()),
        }
    }

    pub async fn load(kv: Arc<dyn IKVRepo>) -> anyhow::Result<Self> {
        let state = load_state::<PersistedScheduleState>(kv.as_ref(), KEY, VERSION, &MIGRATIONS)
            .await?
            .map(ScheduleState::from)
            .unwrap_or_default();

        Ok(Self {
            kv,
            state: Mutex::new(state),
        })
    }

    /// Persists `next` and only then makes it the current state
    async fn commit(&self, current: &mut ScheduleState, next: ScheduleState) -> anyhow::Result<()> {
        save_state(self.kv.as_ref(), KEY, VERSION, &next).await?;
        *current = next;
        Ok(())
    }

    async fn mark(&self, subscription_ids: &[ID], notified_at: DateTime<Utc>) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        let ids = subscription_ids.iter().collect::<HashSet<_>>();
        if !state.entries.iter().any(|e| ids.contains(&e.subscription_id)) {
            return Ok(());
        }

        let mut next = state.clone();
        for entry in next.entries.iter_mut() {
            if ids.contains(&entry.subscription_id) {
                entry.notified_at = Some(notified_at);
            }
        }
        self.commit(&mut state, next).await
    }
}

#[async_trait::async_trait]
impl IScheduleRepo for KvScheduleRepo {
    async fn update_schedule(
        &self,
        entries: Vec<ScheduleEntry>,
        calculated_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        if let Err(e) = validate_schedule(&entries) {
            warn!("Refusing to update the schedule: {}", e);
            return Err(e.into());
        }

        let mut state = self.state.lock().await;
        let next = ScheduleState {
            entries,
            last_calculated_at: Some(calculated_at),
        };
        self.commit(&mut state, next).await
    }

    async fn replace_schedule(
        &self,
        mut entries: Vec<ScheduleEntry>,
        calculated_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        if let Err(e) = validate_schedule(&entries) {
            warn!("Refusing to replace the schedule: {}", e);
            return Err(e.into());
        }

        let mut state = self.state.lock().await;
        carry_over_notified(&mut entries, &state.entries);
        let next = ScheduleState {
            entries,
            last_calculated_at: Some(calculated_at),
        };
        self.commit(&mut state, next).await
    }

    async fn mark_as_notified(
        &self,
        subscription_id: &ID,
        notified_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.mark(std::slice::from_ref(subscription_id), notified_at)
            .await
    }

    async fn mark_many_as_notified(
        &self,
        subscription_ids: &[ID],
        notified_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        self.mark(subscription_ids, notified_at).await
    }

    async fn remove_entries(&self, subscription_ids: &[ID]) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        let ids = subscription_ids.iter().collect::<HashSet<_>>();
        if !state.entries.iter().any(|e| ids.contains(&e.subscription_id)) {
            return Ok(());
        }

        let next = ScheduleState {
            entries: state
                .entries
                .iter()
                .filter(|e| !ids.contains(&e.subscription_id))
                .cloned()
                .collect(),
            last_calculated_at: state.last_calculated_at,
        };
        self.commit(&mut state, next).await
    }

    async fn clear_schedule(&self, calculated_at: DateTime<Utc>) -> anyhow::Result<()> {
        let mut state = self.state.lock().await;
        let next = ScheduleState {
            entries: Vec::new(),
            last_calculated_at: Some(calculated_at),
        };
        self.commit(&mut state, next).await
    }

    async fn find_all(&self) -> Vec<ScheduleEntry> {
        self.state.lock().await.entries.clone()
    }

    async fn get_pending_notifications(&self) -> Vec<ScheduleEntry> {
        self.state
            .lock()
            .await
            .entries
            .iter()
            .filter(|e| e.is_pending())
            .cloned()
            .collect()
    }

    async fn find_by_subscription_id(&self, subscription_id: &ID) -> Option<ScheduleEntry> {
        self.state
            .lock()
            .await
            .entries
            .iter()
            .find(|e| e.subscription_id == *subscription_id)
            .cloned()
    }

    async fn last_calculated_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_calculated_at
    }
}
