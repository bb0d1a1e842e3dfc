use std::{ops::RangeInclusive, path::PathBuf, str::FromStr, time::Duration};
use subtrack_domain::NotificationPermission;
use tracing::warn;

const STATE_DIR: &str = "SUBTRACK_STATE_DIR";
const DISPATCH_INTERVAL_SECS: &str = "SUBTRACK_DISPATCH_INTERVAL_SECS";
const SYNC_DEBOUNCE_MILLIS: &str = "SUBTRACK_SYNC_DEBOUNCE_MILLIS";
const MISSED_GRACE_SECS: &str = "SUBTRACK_MISSED_GRACE_SECS";
const NOTIFICATION_PERMISSION: &str = "SUBTRACK_NOTIFICATION_PERMISSION";

const DAY_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory where the persisted stores are kept
    pub state_dir: PathBuf,
    /// How often the dispatch loop looks for reminders to fire
    pub dispatch_interval: Duration,
    /// Quiet period after the last subscription or settings change before the
    /// schedule is recomputed
    pub sync_debounce: Duration,
    /// Reminders that became due less than this long ago are left to the
    /// regular dispatch instead of being reported as missed
    pub missed_grace: Duration,
    /// Permission the platform reports for showing notifications
    pub notification_permission: NotificationPermission,
}

impl Config {
    pub fn new() -> Self {
        let state_dir = std::env::var(STATE_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".subtrack"));

        Self {
            state_dir,
            // A zero period would make the dispatch loop spin
            dispatch_interval: Duration::from_secs(parse_env_in(
                DISPATCH_INTERVAL_SECS,
                60,
                1..=DAY_SECS,
            )),
            sync_debounce: Duration::from_millis(parse_env_in(
                SYNC_DEBOUNCE_MILLIS,
                300,
                0..=60 * 1000,
            )),
            missed_grace: Duration::from_secs(parse_env_in(MISSED_GRACE_SECS, 5 * 60, 0..=DAY_SECS)),
            notification_permission: parse_env(
                NOTIFICATION_PERMISSION,
                NotificationPermission::Default,
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    name, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_in(name: &str, default: u64, range: RangeInclusive<u64>) -> u64 {
    let value = parse_env(name, default);
    if range.contains(&value) {
        value
    } else {
        warn!(
            "The given {}: {} is outside of {:?}, falling back to the default: {}.",
            name, value, range, default
        );
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in &[
            STATE_DIR,
            DISPATCH_INTERVAL_SECS,
            SYNC_DEBOUNCE_MILLIS,
            MISSED_GRACE_SECS,
            NOTIFICATION_PERMISSION,
        ] {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn it_uses_defaults() {
        clear_env();
        let config = Config::new();
        assert_eq!(config.state_dir, PathBuf::from(".subtrack"));
        assert_eq!(config.dispatch_interval, Duration::from_secs(60));
        assert_eq!(config.sync_debounce, Duration::from_millis(300));
        assert_eq!(config.missed_grace, Duration::from_secs(300));
        assert_eq!(
            config.notification_permission,
            NotificationPermission::Default
        );
    }

    #[test]
    #[serial]
    fn it_reads_env() {
        clear_env();
        std::env::set_var(STATE_DIR, "/tmp/subtrack-state");
        std::env::set_var(DISPATCH_INTERVAL_SECS, "30");
        std::env::set_var(SYNC_DEBOUNCE_MILLIS, "50");
        std::env::set_var(NOTIFICATION_PERMISSION, "granted");
        let config = Config::new();
        clear_env();

        assert_eq!(config.state_dir, PathBuf::from("/tmp/subtrack-state"));
        assert_eq!(config.dispatch_interval, Duration::from_secs(30));
        assert_eq!(config.sync_debounce, Duration::from_millis(50));
        assert_eq!(
            config.notification_permission,
            NotificationPermission::Granted
        );
    }

    #[test]
    #[serial]
    fn it_falls_back_to_defaults_on_invalid_values() {
        clear_env();
        std::env::set_var(DISPATCH_INTERVAL_SECS, "every minute");
        std::env::set_var(NOTIFICATION_PERMISSION, "yes please");
        let config = Config::new();
        clear_env();

        assert_eq!(config.dispatch_interval, Duration::from_secs(60));
        assert_eq!(
            config.notification_permission,
            NotificationPermission::Default
        );
    }

    #[test]
    #[serial]
    fn it_falls_back_to_defaults_on_out_of_range_values() {
        clear_env();
        std::env::set_var(DISPATCH_INTERVAL_SECS, "0");
        std::env::set_var(SYNC_DEBOUNCE_MILLIS, "3600000");
        std::env::set_var(MISSED_GRACE_SECS, "1000000000000000");
        let config = Config::new();
        clear_env();

        assert_eq!(config.dispatch_interval, Duration::from_secs(60));
        assert_eq!(config.sync_debounce, Duration::from_millis(300));
        assert_eq!(config.missed_grace, Duration::from_secs(300));
    }
}
