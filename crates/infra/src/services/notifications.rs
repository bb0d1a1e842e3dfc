use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};
use subtrack_domain::{MissedRemindersNotice, ReminderNotification};
use tracing::info;

/// Shows a single payment reminder as a system notification
#[async_trait::async_trait]
pub trait INotificationSink: Send + Sync {
    async fn show(&self, notification: &ReminderNotification) -> anyhow::Result<()>;
}

/// Shows in-app notices, like the aggregate missed reminders toast
#[async_trait::async_trait]
pub trait IUserNotifier: Send + Sync {
    async fn show_missed_reminders(&self, notice: &MissedRemindersNotice) -> anyhow::Result<()>;
}

pub struct TracingNotificationSink {}

#[async_trait::async_trait]
impl INotificationSink for TracingNotificationSink {
    async fn show(&self, notification: &ReminderNotification) -> anyhow::Result<()> {
        info!(
            target: "subtrack::notifications",
            subscription_id = %notification.subscription_id,
            body = %notification.body,
            "{}",
            notification.title
        );
        Ok(())
    }
}

pub struct TracingUserNotifier {}

#[async_trait::async_trait]
impl IUserNotifier for TracingUserNotifier {
    async fn show_missed_reminders(&self, notice: &MissedRemindersNotice) -> anyhow::Result<()> {
        info!(
            target: "subtrack::notifications",
            missed_count = notice.missed_count,
            action = notice.action_label(),
            action_path = %notice.action_path(),
            "{}",
            notice.message()
        );
        Ok(())
    }
}

/// Remembers everything it was asked to show
#[derive(Default)]
pub struct InMemoryNotificationSink {
    shown: Mutex<Vec<ReminderNotification>>,
    failing: AtomicBool,
}

impl InMemoryNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shown(&self) -> Vec<ReminderNotification> {
        self.shown.lock().unwrap().clone()
    }

    /// While failing every notification is refused
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl INotificationSink for InMemoryNotificationSink {
    async fn show(&self, notification: &ReminderNotification) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("Notification sink is unavailable");
        }
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUserNotifier {
    notices: Mutex<Vec<MissedRemindersNotice>>,
    failing: AtomicBool,
}

impl InMemoryUserNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<MissedRemindersNotice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl IUserNotifier for InMemoryUserNotifier {
    async fn show_missed_reminders(&self, notice: &MissedRemindersNotice) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("User notifier is unavailable");
        }
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}
