use super::{
    cleanup_stale_entries::CleanupStaleEntriesUseCase,
    handle_missed_notifications::HandleMissedNotificationsUseCase,
};
use crate::shared::usecase::{execute, UseCase};
use std::convert::Infallible;
use subtrack_infra::SubtrackContext;

/// Purges stale entries and then reports missed ones. Each step is best effort.
#[derive(Debug)]
pub struct RunRecoveryUseCase {}

#[derive(Debug, Default, PartialEq)]
pub struct RecoveryReport {
    pub stale_removed: usize,
    pub missed: usize,
}

#[async_trait::async_trait]
impl UseCase for RunRecoveryUseCase {
    type Response = RecoveryReport;

    type Error = Infallible;

    const NAME: &'static str = "RunRecovery";

    async fn execute(&mut self, ctx: &SubtrackContext) -> Result<Self::Response, Self::Error> {
        // Cleanup first so a payment that is already behind us is never reported as missed
        let stale_removed = execute(CleanupStaleEntriesUseCase {}, ctx)
            .await
            .unwrap_or(0);
        let missed = execute(HandleMissedNotificationsUseCase {}, ctx)
            .await
            .unwrap_or(0);

        Ok(RecoveryReport {
            stale_removed,
            missed,
        })
    }
}
