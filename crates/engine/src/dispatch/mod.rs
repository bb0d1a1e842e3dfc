pub mod dispatch_due_notifications;
pub mod sync_permissions;
