use crate::date::is_valid_time_of_day;
use chrono::{prelude::*, NaiveTime};
use chrono_tz::{Tz, UTC};
use serde::{de::Visitor, Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

pub const MIN_DAYS_BEFORE: u32 = 1;
pub const MAX_DAYS_BEFORE: u32 = 30;

/// Platform level permission to show notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPermission {
    /// The user has not been asked yet
    Default,
    Granted,
    Denied,
}

impl Default for NotificationPermission {
    fn default() -> Self {
        Self::Default
    }
}

impl Display for NotificationPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Granted => "granted",
            Self::Denied => "denied",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for NotificationPermission {
    type Err = SettingsValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "granted" => Ok(Self::Granted),
            "denied" => Ok(Self::Denied),
            _ => Err(SettingsValidationError::InvalidPermission(s.to_string())),
        }
    }
}

/// Local wall-clock time of day at which reminders fire, `HH:MM` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderTime {
    hour: u32,
    minute: u32,
}

impl ReminderTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        // Range is checked on construction
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl Default for ReminderTime {
    fn default() -> Self {
        Self { hour: 9, minute: 0 }
    }
}

impl Display for ReminderTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ReminderTime {
    type Err = SettingsValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        is_valid_time_of_day(s)
            .map(|(hour, minute)| Self { hour, minute })
            .map_err(|_| SettingsValidationError::InvalidTime(s.to_string()))
    }
}

impl Serialize for ReminderTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ReminderTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ReminderTimeVisitor;

        impl<'de> Visitor<'de> for ReminderTimeVisitor {
            type Value = ReminderTime;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("A time of day formatted as HH:MM")
            }

            fn visit_str<E>(self, value: &str) -> Result<ReminderTime, E>
            where
                E: serde::de::Error,
            {
                value
                    .parse::<ReminderTime>()
                    .map_err(|_| E::custom(format!("Malformed time of day: {}", value)))
            }
        }

        deserializer.deserialize_str(ReminderTimeVisitor)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum SettingsValidationError {
    #[error("Days before payment must be between {min} and {max}, got {0}", min = MIN_DAYS_BEFORE, max = MAX_DAYS_BEFORE)]
    DaysBeforeOutOfRange(u32),
    #[error("Time of day: {0} is not formatted as HH:MM")]
    InvalidTime(String),
    #[error("Notification permission: {0} is not one of default, granted or denied")]
    InvalidPermission(String),
}

/// User controlled settings for payment reminders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub enabled: bool,
    pub permission: NotificationPermission,
    /// How many days before the payment the reminder should fire
    pub days_before: u32,
    pub time: ReminderTime,
    /// The timezone that defines what "local" time and "today" means
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    /// Last time the recovery pass looked for missed reminders
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
}

fn default_timezone() -> Tz {
    UTC
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            permission: NotificationPermission::Default,
            days_before: 3,
            time: ReminderTime::default(),
            timezone: UTC,
            last_checked_at: None,
        }
    }
}

impl NotificationSettings {
    pub fn validate(&self) -> Result<(), SettingsValidationError> {
        if !(MIN_DAYS_BEFORE..=MAX_DAYS_BEFORE).contains(&self.days_before) {
            return Err(SettingsValidationError::DaysBeforeOutOfRange(
                self.days_before,
            ));
        }
        Ok(())
    }

    pub fn set_timezone(&mut self, timezone: &str) -> bool {
        match timezone.parse::<Tz>() {
            Ok(tzid) => {
                self.timezone = tzid;
                true
            }
            Err(_) => false,
        }
    }

    pub fn schedule_settings(&self) -> ScheduleSettings {
        ScheduleSettings {
            enabled: self.enabled,
            permission: self.permission,
            days_before: self.days_before,
            time: self.time,
            timezone: self.timezone,
        }
    }
}

/// The part of the `NotificationSettings` that the reminder schedule is computed from.
///
/// Two settings snapshots with equal `ScheduleSettings` always produce the same
/// schedule, so this is also what decides whether a settings change needs a
/// recomputation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleSettings {
    pub enabled: bool,
    pub permission: NotificationPermission,
    pub days_before: u32,
    pub time: ReminderTime,
    pub timezone: Tz,
}

impl ScheduleSettings {
    /// Reminders are only scheduled when they can legally be shown
    pub fn can_schedule(&self) -> bool {
        self.enabled && self.permission == NotificationPermission::Granted
    }
}
