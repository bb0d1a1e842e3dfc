use crate::shared::usecase::UseCase;
use subtrack_domain::{date::start_of_day, get_stale_entries};
use subtrack_infra::SubtrackContext;
use tracing::{error, info};

/// Removes the entries whose payment is already behind us
#[derive(Debug)]
pub struct CleanupStaleEntriesUseCase {}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for CleanupStaleEntriesUseCase {
    /// Number of removed entries
    type Response = usize;

    type Error = UseCaseError;

    const NAME: &'static str = "CleanupStaleEntries";

    async fn execute(&mut self, ctx: &SubtrackContext) -> Result<Self::Response, Self::Error> {
        let settings = ctx.repos.settings.get().await;
        let today = start_of_day(&ctx.sys.now(), &settings.timezone);

        let schedule = ctx.repos.schedules.find_all().await;
        let stale = get_stale_entries(&schedule, &today);
        if stale.is_empty() {
            return Ok(0);
        }

        let ids = stale.iter().map(|e| e.subscription_id).collect::<Vec<_>>();
        ctx.repos.schedules.remove_entries(&ids).await.map_err(|e| {
            error!("Unable to remove stale schedule entries. Err: {:?}", e);
            UseCaseError::StorageError
        })?;
        info!("Removed {} stale schedule entries", ids.len());

        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{setup, ts};
    use subtrack_domain::{ScheduleEntry, ID};

    #[tokio::test]
    async fn it_removes_only_stale_entries() {
        let (ctx, _, _) = setup("2025-01-16T08:00:00Z").await;
        let stale = ScheduleEntry::new(
            ID::new(),
            ts("2025-01-12T09:00:00Z"),
            ts("2025-01-15T00:00:00Z"),
        );
        let mut stale_notified = ScheduleEntry::new(
            ID::new(),
            ts("2025-01-11T09:00:00Z"),
            ts("2025-01-14T00:00:00Z"),
        );
        stale_notified.notified_at = Some(ts("2025-01-11T09:00:00Z"));
        let upcoming = ScheduleEntry::new(
            ID::new(),
            ts("2025-01-13T09:00:00Z"),
            ts("2025-01-16T00:00:00Z"),
        );
        ctx.repos
            .schedules
            .update_schedule(
                vec![stale, stale_notified, upcoming.clone()],
                ts("2025-01-10T00:00:00Z"),
            )
            .await
            .unwrap();

        let mut usecase = CleanupStaleEntriesUseCase {};
        assert_eq!(usecase.execute(&ctx).await.unwrap(), 2);
        assert_eq!(ctx.repos.schedules.find_all().await, vec![upcoming]);

        // Nothing left to do
        assert_eq!(usecase.execute(&ctx).await.unwrap(), 0);
    }
}
