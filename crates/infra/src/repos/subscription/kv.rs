use super::ISubscriptionRepo;
use crate::repos::{
    kv::IKVRepo,
    shared::persisted::{load_state, save_state},
};
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtrack_domain::{Entity, Subscription, ID};
use tokio::sync::{watch, Mutex};

const KEY: &str = "subtrack-subscriptions";
const VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SubscriptionsState {
    subscriptions: Vec<Subscription>,
}

pub struct KvSubscriptionRepo {
    kv: Arc<dyn IKVRepo>,
    state: Mutex<SubscriptionsState>,
    revision: watch::Sender<u64>,
}

impl KvSubscriptionRepo {
    pub fn new(kv: Arc<dyn IKVRepo>) -> Self {
        Self::with_state(kv, SubscriptionsState::default())
    }

    fn with_state(kv: Arc<dyn IKVRepo>, state: SubscriptionsState) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            kv,
            state: Mutex::new(state),
            revision,
        }
    }

    pub async fn load(kv: Arc<dyn IKVRepo>) -> anyhow::Result<Self> {
        let state = load_state::<SubscriptionsState>(kv.as_ref(), KEY, VERSION, &[])
            .await?
            .unwrap_or_default();
        Ok(Self::with_state(kv, state))
    }

    async fn commit(
        &self,
        current: &mut SubscriptionsState,
        next: SubscriptionsState,
    ) -> anyhow::Result<()> {
        save_state(self.kv.as_ref(), KEY, VERSION, &next).await?;
        *current = next;
        self.revision.send_modify(|revision| *revision += 1);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ISubscriptionRepo for KvSubscriptionRepo {
    async fn insert(&self, subscription: &Subscription) -> anyhow::Result<()> {
        if !subscription.is_valid() {
            bail!("Subscription {} must have a name", subscription.id);
        }
        let mut state = self.state.lock().await;
        if state.subscriptions.iter().any(|s| s.id() == subscription.id()) {
            bail!("Subscription {} already exists", subscription.id);
        }

        let mut next = state.clone();
        next.subscriptions.push(subscription.clone());
        self.commit(&mut state, next).await
    }

    async fn save(&self, subscription: &Subscription) -> anyhow::Result<()> {
        if !subscription.is_valid() {
            bail!("Subscription {} must have a name", subscription.id);
        }
        let mut state = self.state.lock().await;
        let index = match state.subscriptions.iter().position(|s| s.id() == subscription.id()) {
            Some(index) => index,
            None => bail!("Subscription {} was not found", subscription.id),
        };

        let mut next = state.clone();
        next.subscriptions[index] = subscription.clone();
        self.commit(&mut state, next).await
    }

    async fn delete(&self, subscription_id: &ID) -> anyhow::Result<Option<Subscription>> {
        let mut state = self.state.lock().await;
        let index = match state
            .subscriptions
            .iter()
            .position(|s| s.id() == subscription_id)
        {
            Some(index) => index,
            None => return Ok(None),
        };

        let mut next = state.clone();
        let deleted = next.subscriptions.remove(index);
        self.commit(&mut state, next).await?;
        Ok(Some(deleted))
    }

    async fn find(&self, subscription_id: &ID) -> Option<Subscription> {
        self.state
            .lock()
            .await
            .subscriptions
            .iter()
            .find(|s| s.id() == subscription_id)
            .cloned()
    }

    async fn find_all(&self) -> Vec<Subscription> {
        self.state.lock().await.subscriptions.clone()
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
