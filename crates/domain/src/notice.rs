use crate::{
    date::{format_date, local_date},
    schedule_entry::ScheduleEntry,
    shared::entity::ID,
    subscription::Subscription,
};
use chrono::prelude::*;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt::Display};

/// Route of the subscription list that accepts a `dueDates` filter
pub const SUBSCRIPTIONS_PATH: &str = "/subscriptions";

/// Why a batch of reminders is reported to the reliability log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityReason {
    /// Reminders were shown on time
    Delivered,
    /// Reminders were found overdue after the app was not running
    MissedRecovery,
}

impl Display for ReliabilityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Delivered => "delivered",
            Self::MissedRecovery => "missed_recovery",
        };
        write!(f, "{}", tag)
    }
}

/// A single payment reminder as shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderNotification {
    pub subscription_id: ID,
    pub title: String,
    pub body: String,
    pub payment_due_at: DateTime<Utc>,
}

impl ReminderNotification {
    pub fn new(
        entry: &ScheduleEntry,
        subscription: &Subscription,
        now: &DateTime<Utc>,
        tz: &Tz,
    ) -> Self {
        let due_date = local_date(&entry.payment_due_at, tz);
        let days_left = (due_date - local_date(now, tz)).num_days();
        let when = match days_left {
            d if d <= 0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            d => format!("in {} days", d),
        };
        Self {
            subscription_id: entry.subscription_id,
            title: format!("{} payment due {}", subscription.name, when),
            body: format!(
                "Your {} payment is due on {}.",
                subscription.name,
                format_date(&due_date)
            ),
            payment_due_at: entry.payment_due_at,
        }
    }
}

/// Aggregate notice about reminders that should have fired while the app was not running
#[derive(Debug, Clone, PartialEq)]
pub struct MissedRemindersNotice {
    pub missed_count: usize,
    /// Local due dates of the missed payments, sorted and without duplicates
    pub due_dates: Vec<NaiveDate>,
}

impl MissedRemindersNotice {
    pub fn new(missed: &[ScheduleEntry], tz: &Tz) -> Self {
        let due_dates = missed
            .iter()
            .map(|e| local_date(&e.payment_due_at, tz))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self {
            missed_count: missed.len(),
            due_dates,
        }
    }

    pub fn message(&self) -> String {
        if self.missed_count == 1 {
            "You missed 1 payment reminder while the app was closed".into()
        } else {
            format!(
                "You missed {} payment reminders while the app was closed",
                self.missed_count
            )
        }
    }

    pub fn action_label(&self) -> &'static str {
        "View payments"
    }

    /// Link to the subscription list filtered to the affected due dates
    pub fn action_path(&self) -> String {
        let dates = self
            .due_dates
            .iter()
            .map(format_date)
            .collect::<Vec<_>>()
            .join(",");
        format!("{}?dueDates={}", SUBSCRIPTIONS_PATH, dates)
    }
}
