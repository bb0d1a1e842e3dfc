use super::sync_schedule::SyncScheduleUseCase;
use crate::shared::{debounce::DebounceSlot, job::JobHandle, usecase::execute};
use subtrack_infra::SubtrackContext;
use tracing::{debug, info};

/// Keeps the schedule in line with the subscriptions and the settings.
///
/// The schedule is synced right away and then again once changes have been
/// quiet for `config.sync_debounce`. Settings changes only count when they
/// change what the schedule is computed from.
pub fn start_schedule_synchronizer(ctx: SubtrackContext) -> JobHandle {
    let mut subscriptions = ctx.repos.subscriptions.subscribe();
    let mut settings = ctx.repos.settings.subscribe();

    JobHandle::spawn("schedule synchronizer", move |cancel| async move {
        let mut schedule_settings = settings.borrow_and_update().schedule_settings();
        subscriptions.borrow_and_update();

        let _ = execute(SyncScheduleUseCase {}, &ctx).await;

        let mut debounce = DebounceSlot::new();
        let mut subscriptions_open = true;
        let mut settings_open = true;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = subscriptions.changed(), if subscriptions_open => match changed {
                    Ok(()) => debounce.arm(ctx.config.sync_debounce),
                    Err(_) => subscriptions_open = false,
                },
                changed = settings.changed(), if settings_open => match changed {
                    Ok(()) => {
                        let next = settings.borrow_and_update().schedule_settings();
                        if next != schedule_settings {
                            schedule_settings = next;
                            debounce.arm(ctx.config.sync_debounce);
                        } else {
                            debug!("Settings change does not affect the schedule");
                        }
                    }
                    Err(_) => settings_open = false,
                },
                _ = debounce.fired() => {
                    let _ = execute(SyncScheduleUseCase {}, &ctx).await;
                }
            }
        }
        info!("Schedule synchronizer stopped");
    })
}
