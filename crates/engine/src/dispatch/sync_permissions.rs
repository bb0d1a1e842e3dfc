use crate::shared::usecase::UseCase;
use subtrack_domain::NotificationPermission;
use subtrack_infra::SubtrackContext;
use tracing::{error, info};

/// Copies the permission the platform reports into the settings
#[derive(Debug)]
pub struct SyncPermissionsUseCase {}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError,
}

#[async_trait::async_trait]
impl UseCase for SyncPermissionsUseCase {
    /// The new permission if it changed
    type Response = Option<NotificationPermission>;

    type Error = UseCaseError;

    const NAME: &'static str = "SyncPermissions";

    async fn execute(&mut self, ctx: &SubtrackContext) -> Result<Self::Response, Self::Error> {
        let current = ctx.services.permission_provider.current_permission().await;
        let settings = ctx.repos.settings.get().await;
        if settings.permission == current {
            return Ok(None);
        }

        ctx.repos
            .settings
            .set_permission(current)
            .await
            .map_err(|e| {
                error!("Unable to store notification permission. Err: {:?}", e);
                UseCaseError::StorageError
            })?;
        info!(
            "Notification permission changed from {} to {}",
            settings.permission, current
        );

        Ok(Some(current))
    }
}
