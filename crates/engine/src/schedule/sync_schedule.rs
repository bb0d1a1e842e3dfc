use crate::shared::usecase::UseCase;
use subtrack_domain::{calculate_schedule, ScheduleValidationError};
use subtrack_infra::SubtrackContext;
use tracing::{debug, error};

/// Recomputes the reminder schedule from the current subscriptions and settings
#[derive(Debug)]
pub struct SyncScheduleUseCase {}

#[derive(Debug, PartialEq)]
pub enum SyncScheduleResponse {
    /// Reminders are disabled or not permitted, so the schedule was emptied
    Cleared,
    Updated { entries: usize },
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidSchedule(ScheduleValidationError),
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for SyncScheduleUseCase {
    type Response = SyncScheduleResponse;

    type Error = UseCaseError;

    const NAME: &'static str = "SyncSchedule";

    async fn execute(&mut self, ctx: &SubtrackContext) -> Result<Self::Response, Self::Error> {
        let settings = ctx.repos.settings.get().await.schedule_settings();
        let now = ctx.sys.now();

        if !settings.can_schedule() {
            ctx.repos
                .schedules
                .clear_schedule(now)
                .await
                .map_err(|e| {
                    error!("Unable to clear the schedule. Err: {:?}", e);
                    UseCaseError::StorageError
                })?;
            debug!("Reminders are not enabled and permitted, cleared the schedule");
            return Ok(SyncScheduleResponse::Cleared);
        }

        let subscriptions = ctx.repos.subscriptions.find_all().await;
        // Reminders already delivered keep their delivery status
        let entries = calculate_schedule(&subscriptions, &settings);
        let count = entries.len();
        ctx.repos
            .schedules
            .replace_schedule(entries, now)
            .await
            .map_err(|e| match e.downcast::<ScheduleValidationError>() {
                Ok(e) => UseCaseError::InvalidSchedule(e),
                Err(e) => {
                    error!("Unable to store the schedule. Err: {:?}", e);
                    UseCaseError::StorageError
                }
            })?;

        Ok(SyncScheduleResponse::Updated { entries: count })
    }
}
