pub mod sync_schedule;
pub mod synchronizer;
