use crate::{
    dispatch::{
        dispatch_due_notifications::DispatchDueNotificationsUseCase,
        sync_permissions::SyncPermissionsUseCase,
    },
    recovery::run_recovery::RunRecoveryUseCase,
    shared::{job::JobHandle, usecase::execute},
};
use subtrack_infra::SubtrackContext;
use tokio::{
    sync::mpsc,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info};

/// Whether the application is in front of the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Recovery, then dispatch, then permission sync
pub async fn run_dispatch_cycle(ctx: &SubtrackContext) {
    let _ = execute(RunRecoveryUseCase {}, ctx).await;
    let _ = execute(DispatchDueNotificationsUseCase {}, ctx).await;
    let _ = execute(SyncPermissionsUseCase {}, ctx).await;
}

/// Runs a dispatch cycle right away, every `config.dispatch_interval` and
/// whenever the application becomes visible.
///
/// A process that was suspended runs one cycle when it resumes instead of
/// catching up on every tick it slept through.
pub fn start_dispatch_loop(
    ctx: SubtrackContext,
    mut visibility: mpsc::Receiver<Visibility>,
) -> JobHandle {
    JobHandle::spawn("dispatch loop", move |cancel| async move {
        let mut ticks = interval(ctx.config.dispatch_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut visibility_open = true;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticks.tick() => run_dispatch_cycle(&ctx).await,
                event = visibility.recv(), if visibility_open => match event {
                    Some(Visibility::Visible) => {
                        debug!("Application became visible");
                        run_dispatch_cycle(&ctx).await;
                    }
                    Some(Visibility::Hidden) => {}
                    None => visibility_open = false,
                },
            }
        }
        info!("Dispatch loop stopped");
    })
}
