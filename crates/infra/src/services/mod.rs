mod notifications;
mod permission;
mod reliability;

pub use notifications::{
    INotificationSink, IUserNotifier, InMemoryNotificationSink, InMemoryUserNotifier,
    TracingNotificationSink, TracingUserNotifier,
};
pub use permission::{IPermissionProvider, StaticPermissionProvider};
pub use reliability::{IReliabilityLogger, InMemoryReliabilityLogger, TracingReliabilityLogger};
use std::sync::Arc;
use subtrack_domain::NotificationPermission;

/// The platform facing collaborators of the engine
#[derive(Clone)]
pub struct Services {
    pub notification_sink: Arc<dyn INotificationSink>,
    pub user_notifier: Arc<dyn IUserNotifier>,
    pub reliability_logger: Arc<dyn IReliabilityLogger>,
    pub permission_provider: Arc<dyn IPermissionProvider>,
}

impl Services {
    /// Collaborators that report everything through `tracing`
    pub fn create_tracing(permission: NotificationPermission) -> Self {
        Self {
            notification_sink: Arc::new(TracingNotificationSink {}),
            user_notifier: Arc::new(TracingUserNotifier {}),
            reliability_logger: Arc::new(TracingReliabilityLogger {}),
            permission_provider: Arc::new(StaticPermissionProvider::new(permission)),
        }
    }
}

/// In-memory collaborators that keep their concrete types, so that tests can
/// look at what was shown and make them fail
#[derive(Clone)]
pub struct InMemoryServices {
    pub notification_sink: Arc<InMemoryNotificationSink>,
    pub user_notifier: Arc<InMemoryUserNotifier>,
    pub reliability_logger: Arc<InMemoryReliabilityLogger>,
    pub permission_provider: Arc<StaticPermissionProvider>,
}

impl InMemoryServices {
    /// The permission provider starts out as granted
    pub fn new() -> Self {
        Self {
            notification_sink: Arc::new(InMemoryNotificationSink::new()),
            user_notifier: Arc::new(InMemoryUserNotifier::new()),
            reliability_logger: Arc::new(InMemoryReliabilityLogger::new()),
            permission_provider: Arc::new(StaticPermissionProvider::new(
                NotificationPermission::Granted,
            )),
        }
    }

    pub fn services(&self) -> Services {
        Services {
            notification_sink: self.notification_sink.clone(),
            user_notifier: self.user_notifier.clone(),
            reliability_logger: self.reliability_logger.clone(),
            permission_provider: self.permission_provider.clone(),
        }
    }
}

impl Default for InMemoryServices {
    fn default() -> Self {
        Self::new()
    }
}
