use crate::shared::usecase::UseCase;
use subtrack_domain::{date::start_of_day, ReliabilityReason, ReminderNotification};
use subtrack_infra::SubtrackContext;
use tracing::{debug, error, warn};

/// Shows every reminder that is due and has not been shown yet
#[derive(Debug)]
pub struct DispatchDueNotificationsUseCase {}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for DispatchDueNotificationsUseCase {
    /// Number of reminders that were shown
    type Response = usize;

    type Error = UseCaseError;

    const NAME: &'static str = "DispatchDueNotifications";

    async fn execute(&mut self, ctx: &SubtrackContext) -> Result<Self::Response, Self::Error> {
        let settings = ctx.repos.settings.get().await;
        if !settings.schedule_settings().can_schedule() {
            return Ok(0);
        }
        let now = ctx.sys.now();
        let today = start_of_day(&now, &settings.timezone);

        let due = ctx
            .repos
            .schedules
            .get_pending_notifications()
            .await
            .into_iter()
            .filter(|e| e.scheduled_for <= now && !e.is_stale(&today))
            .collect::<Vec<_>>();

        let mut delivered = Vec::with_capacity(due.len());
        let mut unmarked = 0;
        for entry in due {
            let subscription = match ctx.repos.subscriptions.find(&entry.subscription_id).await {
                Some(subscription) => subscription,
                None => {
                    debug!(
                        "Skipping reminder for deleted subscription {}",
                        entry.subscription_id
                    );
                    continue;
                }
            };

            let notification =
                ReminderNotification::new(&entry, &subscription, &now, &settings.timezone);
            if let Err(e) = ctx.services.notification_sink.show(&notification).await {
                warn!(
                    "Unable to show reminder for subscription {}. Err: {:?}",
                    entry.subscription_id, e
                );
                continue;
            }

            // Shown either way, the remaining reminders still go out
            if let Err(e) = ctx
                .repos
                .schedules
                .mark_as_notified(&entry.subscription_id, now)
                .await
            {
                error!(
                    "Unable to mark reminder for subscription {} as notified. Err: {:?}",
                    entry.subscription_id, e
                );
                unmarked += 1;
            }
            delivered.push(entry.subscription_id);
        }

        if !delivered.is_empty() {
            if let Err(e) = ctx
                .services
                .reliability_logger
                .log_reliability_batch(&delivered, ReliabilityReason::Delivered)
                .await
            {
                warn!("Unable to log delivered reminders. Err: {:?}", e);
            }
        }

        if unmarked > 0 {
            return Err(UseCaseError::StorageError);
        }
        Ok(delivered.len())
    }
}
