use crate::{
    date::{local_date, resolve_local},
    schedule_entry::ScheduleEntry,
    settings::ScheduleSettings,
    subscription::Subscription,
};
use chrono::Duration;

/// Computes when the reminder for every active `Subscription` should fire.
///
/// The reminder fires `days_before` local calendar days before the payment is
/// due, at the configured local time of day. Subscriptions without a next
/// payment date, or whose reminder could not be stored, are left out.
pub fn calculate_schedule(
    subscriptions: &[Subscription],
    settings: &ScheduleSettings,
) -> Vec<ScheduleEntry> {
    subscriptions
        .iter()
        .filter(|s| s.active)
        .filter_map(|s| schedule_entry_for(s, settings))
        .collect()
}

fn schedule_entry_for(
    subscription: &Subscription,
    settings: &ScheduleSettings,
) -> Option<ScheduleEntry> {
    let payment_due_at = subscription.next_payment_date?;
    let fire_date = local_date(&payment_due_at, &settings.timezone)
        .checked_sub_signed(Duration::days(i64::from(settings.days_before)))?;
    let scheduled_for = resolve_local(
        &fire_date.and_time(settings.time.as_naive_time()),
        &settings.timezone,
    )?;

    let entry = ScheduleEntry::new(subscription.id, scheduled_for, payment_due_at);
    entry.validate().ok().map(|_| entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{NotificationPermission, NotificationSettings, ReminderTime};
    use chrono::prelude::*;
    use chrono_tz::{America::New_York, Tz, UTC};

    fn settings(days_before: u32, time: &str, timezone: Tz) -> ScheduleSettings {
        NotificationSettings {
            enabled: true,
            permission: NotificationPermission::Granted,
            days_before,
            time: time.parse::<ReminderTime>().unwrap(),
            timezone,
            last_checked_at: None,
        }
        .schedule_settings()
    }

    fn due(ts: &str) -> Option<DateTime<Utc>> {
        Some(ts.parse::<DateTime<Utc>>().unwrap())
    }

    #[test]
    fn it_schedules_days_before_at_time_of_day() {
        let subscription = Subscription::new("Streaming", due("2025-01-15T00:00:00Z"));
        let schedule = calculate_schedule(&[subscription.clone()], &settings(3, "09:00", UTC));

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].subscription_id, subscription.id);
        assert_eq!(
            schedule[0].scheduled_for,
            Utc.with_ymd_and_hms(2025, 1, 12, 9, 0, 0).unwrap()
        );
        assert_eq!(
            schedule[0].payment_due_at,
            Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()
        );
        assert!(schedule[0].notified_at.is_none());
    }

    #[test]
    fn it_skips_inactive_subscriptions_and_subscriptions_without_due_date() {
        let mut inactive = Subscription::new("Gym", due("2025-01-15T00:00:00Z"));
        inactive.active = false;
        let no_due_date = Subscription::new("Lifetime license", None);
        let active = Subscription::new("Music", due("2025-02-01T00:00:00Z"));

        let schedule = calculate_schedule(
            &[inactive, no_due_date, active.clone()],
            &settings(1, "18:30", UTC),
        );

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].subscription_id, active.id);
        assert_eq!(
            schedule[0].scheduled_for,
            Utc.with_ymd_and_hms(2025, 1, 31, 18, 30, 0).unwrap()
        );
    }

    #[test]
    fn it_uses_local_calendar_days() {
        // 03:00 UTC on the 15th is still the 14th in New York
        let subscription = Subscription::new("News", due("2025-01-15T03:00:00Z"));
        let schedule = calculate_schedule(&[subscription], &settings(2, "09:00", New_York));

        assert_eq!(
            schedule[0].scheduled_for,
            // 09:00 EST on the 12th
            Utc.with_ymd_and_hms(2025, 1, 12, 14, 0, 0).unwrap()
        );
        assert!(schedule[0].scheduled_for <= schedule[0].payment_due_at);
    }

    #[test]
    fn it_is_deterministic() {
        let subscriptions = vec![
            Subscription::new("A", due("2025-03-01T00:00:00Z")),
            Subscription::new("B", due("2025-03-09T12:00:00Z")),
        ];
        let settings = settings(7, "02:30", New_York);
        assert_eq!(
            calculate_schedule(&subscriptions, &settings),
            calculate_schedule(&subscriptions, &settings)
        );
    }

    #[test]
    fn it_leaves_out_subscriptions_with_unsupported_due_dates() {
        let typo = Subscription::new("Typo", due("2101-01-15T00:00:00Z"));
        let ancient = Subscription::new("Ancient", due("1970-01-02T00:00:00Z"));
        let good = Subscription::new("Streaming", due("2025-01-15T00:00:00Z"));

        let schedule = calculate_schedule(&[typo, ancient, good.clone()], &settings(3, "09:00", UTC));

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].subscription_id, good.id);
    }

    #[test]
    fn it_schedules_nothing_for_no_subscriptions() {
        assert!(calculate_schedule(&[], &settings(3, "09:00", UTC)).is_empty());
    }
}
