mod calculator;
pub mod date;
mod notice;
mod recovery;
mod schedule_entry;
mod settings;
mod shared;
mod subscription;

pub use calculator::calculate_schedule;
pub use notice::{
    MissedRemindersNotice, ReliabilityReason, ReminderNotification, SUBSCRIPTIONS_PATH,
};
pub use recovery::{get_missed_notifications, get_stale_entries};
pub use schedule_entry::{carry_over_notified, validate_schedule, ScheduleEntry, ScheduleValidationError};
pub use settings::{
    NotificationPermission, NotificationSettings, ReminderTime, ScheduleSettings,
    SettingsValidationError, MAX_DAYS_BEFORE, MIN_DAYS_BEFORE,
};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use subscription::Subscription;
