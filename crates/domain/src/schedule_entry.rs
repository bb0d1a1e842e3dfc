use crate::{date::is_supported_timestamp, shared::entity::ID};
use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// A `ScheduleEntry` ties a `Subscription` to the moment the user should be
/// reminded about its next payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    /// There is at most one entry per `Subscription`
    pub subscription_id: ID,
    /// When the reminder should fire
    pub scheduled_for: DateTime<Utc>,
    /// When the payment the reminder is about is due
    pub payment_due_at: DateTime<Utc>,
    /// Set once the reminder has been shown to the user, either on its own or
    /// as part of a missed reminders notice. This is the only thing preventing
    /// the same reminder from being delivered twice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified_at: Option<DateTime<Utc>>,
}

#[derive(Error, Debug, PartialEq)]
pub enum ScheduleValidationError {
    #[error("Schedule entry for subscription {0} has a timestamp outside of the supported range")]
    TimestampOutOfRange(ID),
    #[error("Schedule entry for subscription {0} fires after the payment is due")]
    ScheduledAfterPayment(ID),
    #[error("Subscription {0} has more than one schedule entry")]
    DuplicateSubscription(ID),
}

impl ScheduleEntry {
    pub fn new(
        subscription_id: ID,
        scheduled_for: DateTime<Utc>,
        payment_due_at: DateTime<Utc>,
    ) -> Self {
        Self {
            subscription_id,
            scheduled_for,
            payment_due_at,
            notified_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.notified_at.is_none()
    }

    /// The payment already happened before `today_start`, so the reminder is moot
    /// no matter if it was delivered or not.
    pub fn is_stale(&self, today_start: &DateTime<Utc>) -> bool {
        self.payment_due_at < *today_start
    }

    /// Staleness is checked first so that reminders for payments that are long
    /// gone are never reported as missed.
    pub fn is_missed(&self, before: &DateTime<Utc>, today_start: &DateTime<Utc>) -> bool {
        !self.is_stale(today_start) && self.is_pending() && self.scheduled_for < *before
    }

    /// Same subscription, same fire time and same payment. A recomputed entry
    /// with the same timing as a stored one describes the same reminder.
    pub fn has_same_timing(&self, other: &ScheduleEntry) -> bool {
        self.subscription_id == other.subscription_id
            && self.scheduled_for == other.scheduled_for
            && self.payment_due_at == other.payment_due_at
    }

    pub fn validate(&self) -> Result<(), ScheduleValidationError> {
        let timestamps_supported = is_supported_timestamp(&self.scheduled_for)
            && is_supported_timestamp(&self.payment_due_at)
            && self
                .notified_at
                .as_ref()
                .map(is_supported_timestamp)
                .unwrap_or(true);
        if !timestamps_supported {
            return Err(ScheduleValidationError::TimestampOutOfRange(
                self.subscription_id,
            ));
        }
        if self.scheduled_for > self.payment_due_at {
            return Err(ScheduleValidationError::ScheduledAfterPayment(
                self.subscription_id,
            ));
        }
        Ok(())
    }
}

/// Entries that describe the same reminder as one in `previous` keep its
/// delivery status, otherwise a recomputation would deliver them again
pub fn carry_over_notified(entries: &mut [ScheduleEntry], previous: &[ScheduleEntry]) {
    for entry in entries.iter_mut() {
        if let Some(prev) = previous.iter().find(|p| p.has_same_timing(entry)) {
            entry.notified_at = prev.notified_at;
        }
    }
}

/// Validates a complete schedule, every entry and the one entry per subscription rule
pub fn validate_schedule(entries: &[ScheduleEntry]) -> Result<(), ScheduleValidationError> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        entry.validate()?;
        if !seen.insert(entry.subscription_id) {
            return Err(ScheduleValidationError::DuplicateSubscription(
                entry.subscription_id,
            ));
        }
    }
    Ok(())
}
