use std::sync::Mutex;
use subtrack_domain::NotificationPermission;

/// Reports what the platform currently allows
#[async_trait::async_trait]
pub trait IPermissionProvider: Send + Sync {
    async fn current_permission(&self) -> NotificationPermission;
}

/// Reports a fixed permission that can be changed at runtime
pub struct StaticPermissionProvider {
    permission: Mutex<NotificationPermission>,
}

impl StaticPermissionProvider {
    pub fn new(permission: NotificationPermission) -> Self {
        Self {
            permission: Mutex::new(permission),
        }
    }

    pub fn set(&self, permission: NotificationPermission) {
        *self.permission.lock().unwrap() = permission;
    }
}

#[async_trait::async_trait]
impl IPermissionProvider for StaticPermissionProvider {
    async fn current_permission(&self) -> NotificationPermission {
        *self.permission.lock().unwrap()
    }
}
