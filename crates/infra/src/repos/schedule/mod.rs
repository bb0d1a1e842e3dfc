mod kv;

use chrono::prelude::*;
pub use kv::KvScheduleRepo;
use subtrack_domain::{ScheduleEntry, ID};

/// Persistent collection of `ScheduleEntry`s with at most one entry per subscription
#[async_trait::async_trait]
pub trait IScheduleRepo: Send + Sync {
    /// Replaces the whole collection. The entries are validated first and if any
    /// of them is invalid nothing is changed and the `ScheduleValidationError` is
    /// returned inside the error.
    async fn update_schedule(
        &self,
        entries: Vec<ScheduleEntry>,
        calculated_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    /// Same as `update_schedule`, except that an entry with the same timing as a
    /// stored one keeps the stored `notified_at`. The stored entries are read
    /// under the same lock as the write, so a reminder marked as notified while
    /// the schedule was being recomputed stays notified.
    async fn replace_schedule(
        &self,
        entries: Vec<ScheduleEntry>,
        calculated_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    async fn mark_as_notified(
        &self,
        subscription_id: &ID,
        notified_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    async fn mark_many_as_notified(
        &self,
        subscription_ids: &[ID],
        notified_at: DateTime<Utc>,
    ) -> anyhow::Result<()>;
    async fn remove_entries(&self, subscription_ids: &[ID]) -> anyhow::Result<()>;
    async fn clear_schedule(&self, calculated_at: DateTime<Utc>) -> anyhow::Result<()>;
    async fn find_all(&self) -> Vec<ScheduleEntry>;
    async fn get_pending_notifications(&self) -> Vec<ScheduleEntry>;
    async fn find_by_subscription_id(&self, subscription_id: &ID) -> Option<ScheduleEntry>;
    async fn last_calculated_at(&self) -> Option<DateTime<Utc>>;
}
