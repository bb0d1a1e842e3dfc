use crate::schedule_entry::ScheduleEntry;
use chrono::prelude::*;

/// Entries whose reminder should have fired before `before` but never did, and
/// whose payment is still ahead (not before `today_start`).
pub fn get_missed_notifications(
    schedule: &[ScheduleEntry],
    before: &DateTime<Utc>,
    today_start: &DateTime<Utc>,
) -> Vec<ScheduleEntry> {
    schedule
        .iter()
        .filter(|e| e.is_missed(before, today_start))
        .cloned()
        .collect()
}

/// Entries whose payment was due before `today_start`, delivered or not
pub fn get_stale_entries(
    schedule: &[ScheduleEntry],
    today_start: &DateTime<Utc>,
) -> Vec<ScheduleEntry> {
    schedule
        .iter()
        .filter(|e| e.is_stale(today_start))
        .cloned()
        .collect()
}
