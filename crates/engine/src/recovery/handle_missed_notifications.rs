use crate::shared::usecase::UseCase;
use chrono::{prelude::*, Duration};
use subtrack_domain::{
    date::start_of_day, get_missed_notifications, MissedRemindersNotice, ReliabilityReason,
};
use subtrack_infra::SubtrackContext;
use tracing::{error, info, warn};

/// Tells the user about the reminders that should have fired while the app was
/// not running and marks them as delivered, so they are reported exactly once.
#[derive(Debug)]
pub struct HandleMissedNotificationsUseCase {}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for HandleMissedNotificationsUseCase {
    /// Number of missed reminders that were reported
    type Response = usize;

    type Error = UseCaseError;

    const NAME: &'static str = "HandleMissedNotifications";

    async fn execute(&mut self, ctx: &SubtrackContext) -> Result<Self::Response, Self::Error> {
        let settings = ctx.repos.settings.get().await;
        let now = ctx.sys.now();
        let today = start_of_day(&now, &settings.timezone);
        // Reminders that just became due belong to the regular dispatch
        let grace = Duration::from_std(ctx.config.missed_grace).unwrap_or_else(|_| Duration::zero());
        let cutoff = now
            .checked_sub_signed(grace)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let schedule = ctx.repos.schedules.find_all().await;
        let missed = get_missed_notifications(&schedule, &cutoff, &today);

        if !missed.is_empty() {
            let ids = missed.iter().map(|e| e.subscription_id).collect::<Vec<_>>();
            info!("Found {} missed reminders", ids.len());

            if let Err(e) = ctx
                .services
                .reliability_logger
                .log_reliability_batch(&ids, ReliabilityReason::MissedRecovery)
                .await
            {
                warn!("Unable to log missed reminders. Err: {:?}", e);
            }

            let notice = MissedRemindersNotice::new(&missed, &settings.timezone);
            if let Err(e) = ctx.services.user_notifier.show_missed_reminders(&notice).await {
                warn!("Unable to show the missed reminders notice. Err: {:?}", e);
            }

            ctx.repos
                .schedules
                .mark_many_as_notified(&ids, now)
                .await
                .map_err(|e| {
                    error!("Unable to mark missed reminders as notified. Err: {:?}", e);
                    UseCaseError::StorageError
                })?;
        }

        ctx.repos
            .settings
            .set_last_checked_at(now)
            .await
            .map_err(|e| {
                error!("Unable to store when reminders were last checked. Err: {:?}", e);
                UseCaseError::StorageError
            })?;

        Ok(missed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{setup, ts};
    use subtrack_domain::{ScheduleEntry, ID};

    fn entry(scheduled_for: &str, payment_due_at: &str) -> ScheduleEntry {
        ScheduleEntry::new(ID::new(), ts(scheduled_for), ts(payment_due_at))
    }

    #[tokio::test]
    async fn it_reports_missed_reminders_once() {
        let (ctx, services, _) = setup("2025-01-13T08:00:00Z").await;
        let first = entry("2025-01-12T09:00:00Z", "2025-01-15T00:00:00Z");
        let second = entry("2025-01-12T18:00:00Z", "2025-01-20T00:00:00Z");
        let upcoming = entry("2025-01-14T09:00:00Z", "2025-01-17T00:00:00Z");
        ctx.repos
            .schedules
            .update_schedule(
                vec![first.clone(), second.clone(), upcoming.clone()],
                ts("2025-01-10T00:00:00Z"),
            )
            .await
            .unwrap();

        let mut usecase = HandleMissedNotificationsUseCase {};
        assert_eq!(usecase.execute(&ctx).await.unwrap(), 2);

        let notices = services.user_notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].missed_count, 2);
        assert_eq!(
            notices[0].action_path(),
            "/subscriptions?dueDates=2025-01-15,2025-01-20"
        );
        assert_eq!(
            services.reliability_logger.batches(),
            vec![(
                vec![first.subscription_id, second.subscription_id],
                ReliabilityReason::MissedRecovery
            )]
        );
        assert_eq!(
            ctx.repos.schedules.get_pending_notifications().await,
            vec![upcoming]
        );
        assert_eq!(
            ctx.repos.settings.get().await.last_checked_at,
            Some(ts("2025-01-13T08:00:00Z"))
        );

        // Second pass finds nothing new
        assert_eq!(usecase.execute(&ctx).await.unwrap(), 0);
        assert_eq!(services.user_notifier.notices().len(), 1);
        assert_eq!(services.reliability_logger.batches().len(), 1);
    }

    #[tokio::test]
    async fn it_stamps_last_checked_when_nothing_was_missed() {
        let (ctx, services, _) = setup("2025-01-13T08:00:00Z").await;

        let mut usecase = HandleMissedNotificationsUseCase {};
        assert_eq!(usecase.execute(&ctx).await.unwrap(), 0);
        assert!(services.user_notifier.notices().is_empty());
        assert!(services.reliability_logger.batches().is_empty());
        assert_eq!(
            ctx.repos.settings.get().await.last_checked_at,
            Some(ts("2025-01-13T08:00:00Z"))
        );
    }

    #[tokio::test]
    async fn it_leaves_reminders_within_the_grace_period_to_dispatch() {
        let (ctx, services, _) = setup("2025-01-12T09:01:00Z").await;
        let just_due = entry("2025-01-12T09:00:00Z", "2025-01-15T00:00:00Z");
        ctx.repos
            .schedules
            .update_schedule(vec![just_due.clone()], ts("2025-01-10T00:00:00Z"))
            .await
            .unwrap();

        let mut usecase = HandleMissedNotificationsUseCase {};
        assert_eq!(usecase.execute(&ctx).await.unwrap(), 0);
        assert!(services.user_notifier.notices().is_empty());
        assert_eq!(
            ctx.repos.schedules.get_pending_notifications().await,
            vec![just_due]
        );
    }

    #[tokio::test]
    async fn it_reports_nothing_when_the_grace_period_reaches_past_all_time() {
        let (mut ctx, services, _) = setup("2025-01-13T08:00:00Z").await;
        ctx.config.missed_grace = std::time::Duration::from_secs(1_000_000_000_000_000);
        let missed = entry("2025-01-12T09:00:00Z", "2025-01-15T00:00:00Z");
        ctx.repos
            .schedules
            .update_schedule(vec![missed.clone()], ts("2025-01-10T00:00:00Z"))
            .await
            .unwrap();

        let mut usecase = HandleMissedNotificationsUseCase {};
        assert_eq!(usecase.execute(&ctx).await.unwrap(), 0);
        assert!(services.user_notifier.notices().is_empty());
        assert_eq!(
            ctx.repos.schedules.get_pending_notifications().await,
            vec![missed]
        );
    }

    #[tokio::test]
    async fn collaborator_failures_do_not_block_recovery() {
        let (ctx, services, _) = setup("2025-01-13T08:00:00Z").await;
        services.reliability_logger.set_failing(true);
        services.user_notifier.set_failing(true);
        let missed = entry("2025-01-12T09:00:00Z", "2025-01-15T00:00:00Z");
        ctx.repos
            .schedules
            .update_schedule(vec![missed], ts("2025-01-10T00:00:00Z"))
            .await
            .unwrap();

        let mut usecase = HandleMissedNotificationsUseCase {};
        assert_eq!(usecase.execute(&ctx).await.unwrap(), 1);
        assert!(ctx
            .repos
            .schedules
            .get_pending_notifications()
            .await
            .is_empty());
    }
}
