mod dispatch;
mod job_schedulers;
mod recovery;
mod schedule;
mod shared;

pub use dispatch::{
    dispatch_due_notifications::DispatchDueNotificationsUseCase,
    sync_permissions::SyncPermissionsUseCase,
};
pub use job_schedulers::{run_dispatch_cycle, start_dispatch_loop, Visibility};
pub use schedule::synchronizer::start_schedule_synchronizer;
pub use recovery::{
    cleanup_stale_entries::CleanupStaleEntriesUseCase,
    handle_missed_notifications::HandleMissedNotificationsUseCase,
    run_recovery::{RecoveryReport, RunRecoveryUseCase},
};
pub use schedule::sync_schedule::{SyncScheduleResponse, SyncScheduleUseCase};
pub use shared::{
    debounce::DebounceSlot,
    job::JobHandle,
    usecase::{execute, UseCase},
};
use subtrack_infra::SubtrackContext;
use tokio::sync::mpsc;
use tracing::info;

/// The mounted reminder engine: the schedule synchronizer and the dispatch loop
pub struct Application {
    synchronizer: JobHandle,
    dispatch_loop: JobHandle,
}

impl Application {
    /// Must be called from within a tokio runtime
    pub fn mount(context: SubtrackContext, visibility: mpsc::Receiver<Visibility>) -> Self {
        info!("Mounting the reminder engine");
        let synchronizer = start_schedule_synchronizer(context.clone());
        let dispatch_loop = start_dispatch_loop(context, visibility);

        Self {
            synchronizer,
            dispatch_loop,
        }
    }

    /// Stops the timers and the visibility listener. Work that already started
    /// runs to completion.
    pub fn unmount(&self) {
        self.synchronizer.stop();
        self.dispatch_loop.stop();
    }

    pub fn is_mounted(&self) -> bool {
        !self.synchronizer.is_stopped() && !self.dispatch_loop.is_stopped()
    }

    /// Unmounts and waits for running work to complete
    pub async fn stopped(self) {
        self.unmount();
        self.synchronizer.join().await;
        self.dispatch_loop.join().await;
        info!("Reminder engine unmounted");
    }
}

#[cfg(test)]
mod test_helpers {
    use chrono::prelude::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };
    use subtrack_domain::{NotificationPermission, NotificationSettings, ScheduleEntry, ID};
    use subtrack_infra::{IScheduleRepo, InMemoryServices, MockSys, SubtrackContext};

    pub fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    /// In-memory context at `now` with reminders enabled and permitted
    pub async fn setup(now: &str) -> (SubtrackContext, InMemoryServices, Arc<MockSys>) {
        let services = InMemoryServices::new();
        let sys = Arc::new(MockSys::new(ts(now)));
        let mut ctx = SubtrackContext::create_inmemory();
        ctx.services = services.services();
        ctx.sys = sys.clone();

        let settings = NotificationSettings {
            enabled: true,
            permission: NotificationPermission::Granted,
            ..Default::default()
        };
        ctx.repos.settings.save(&settings).await.unwrap();

        (ctx, services, sys)
    }

    /// Counts how often the schedule is recomputed
    pub struct CountingScheduleRepo {
        inner: Arc<dyn IScheduleRepo>,
        syncs: AtomicUsize,
        interleaved_marks: Mutex<Vec<(ID, DateTime<Utc>)>>,
    }

    impl CountingScheduleRepo {
        pub fn syncs(&self) -> usize {
            self.syncs.load(Ordering::SeqCst)
        }

        /// Marks `subscription_id` as notified right before the next replace
        /// is applied, the way a dispatch cycle finishing in between would
        pub fn mark_before_next_replace(&self, subscription_id: ID, notified_at: DateTime<Utc>) {
            self.interleaved_marks
                .lock()
                .unwrap()
                .push((subscription_id, notified_at));
        }
    }

    #[async_trait::async_trait]
    impl IScheduleRepo for CountingScheduleRepo {
        async fn update_schedule(
            &self,
            entries: Vec<ScheduleEntry>,
            calculated_at: DateTime<Utc>,
        ) -> anyhow::Result<()> {
            self.syncs.fetch_add(1, Ordering::SeqCst);
            self.inner.update_schedule(entries, calculated_at).await
        }

        async fn replace_schedule(
            &self,
            entries: Vec<ScheduleEntry>,
            calculated_at: DateTime<Utc>,
        ) -> anyhow::Result<()> {
            self.syncs.fetch_add(1, Ordering::SeqCst);
            let marks = std::mem::take(&mut *self.interleaved_marks.lock().unwrap());
            for (id, at) in marks {
                self.inner.mark_as_notified(&id, at).await?;
            }
            self.inner.replace_schedule(entries, calculated_at).await
        }

        async fn mark_as_notified(
            &self,
            subscription_id: &ID,
            notified_at: DateTime<Utc>,
        ) -> anyhow::Result<()> {
            self.inner.mark_as_notified(subscription_id, notified_at).await
        }

        async fn mark_many_as_notified(
            &self,
            subscription_ids: &[ID],
            notified_at: DateTime<Utc>,
        ) -> anyhow::Result<()> {
            self.inner
                .mark_many_as_notified(subscription_ids, notified_at)
                .await
        }

        async fn remove_entries(&self, subscription_ids: &[ID]) -> anyhow::Result<()> {
            self.inner.remove_entries(subscription_ids).await
        }

        async fn clear_schedule(&self, calculated_at: DateTime<Utc>) -> anyhow::Result<()> {
            self.syncs.fetch_add(1, Ordering::SeqCst);
            self.inner.clear_schedule(calculated_at).await
        }

        async fn find_all(&self) -> Vec<ScheduleEntry> {
            self.inner.find_all().await
        }

        async fn get_pending_notifications(&self) -> Vec<ScheduleEntry> {
            self.inner.get_pending_notifications().await
        }

        async fn find_by_subscription_id(&self, subscription_id: &ID) -> Option<ScheduleEntry> {
            self.inner.find_by_subscription_id(subscription_id).await
        }

        async fn last_calculated_at(&self) -> Option<DateTime<Utc>> {
            self.inner.last_calculated_at().await
        }
    }

    pub async fn setup_counting(
        permission: NotificationPermission,
    ) -> (SubtrackContext, Arc<CountingScheduleRepo>) {
        let (mut ctx, _, _) = setup("2025-01-10T10:00:00Z").await;
        ctx.repos.settings.set_permission(permission).await.unwrap();
        let counter = Arc::new(CountingScheduleRepo {
            inner: ctx.repos.schedules.clone(),
            syncs: AtomicUsize::new(0),
            interleaved_marks: Mutex::new(Vec::new()),
        });
        ctx.repos.schedules = counter.clone();
        (ctx, counter)
    }
}
