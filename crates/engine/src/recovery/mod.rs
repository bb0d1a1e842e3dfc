pub mod cleanup_stale_entries;
pub mod handle_missed_notifications;
pub mod run_recovery;
