use chrono::{prelude::*, Duration, LocalResult};
use chrono_tz::Tz;

/// Longest stretch of local wall-clock time a timezone transition has ever
/// skipped (Samoa, December 2011) plus some slack.
const MAX_GAP_MINUTES: i64 = 26 * 60;

pub fn is_valid_time_of_day(timestr: &str) -> anyhow::Result<(u32, u32)> {
    let parts = timestr.split(':').collect::<Vec<_>>();
    let well_formed = parts.len() == 2
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_digit()));
    if !well_formed {
        return Err(anyhow::Error::msg(timestr.to_string()));
    }

    let hour = parts[0].parse::<u32>();
    let minute = parts[1].parse::<u32>();
    match (hour, minute) {
        (Ok(hour), Ok(minute)) if hour < 24 && minute < 60 => Ok((hour, minute)),
        _ => Err(anyhow::Error::msg(timestr.to_string())),
    }
}

/// Timestamps outside of this range are treated as corrupt data
pub fn is_supported_timestamp(ts: &DateTime<Utc>) -> bool {
    (1970..=2100).contains(&ts.year())
}

/// Converts a local wall-clock time to an absolute timestamp.
///
/// Ambiguous times (clocks turned back) resolve to the earlier instant and
/// times that fall into a gap (clocks turned forward) resolve to the first
/// valid instant after the gap.
pub fn resolve_local(naive: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => (1..=MAX_GAP_MINUTES).find_map(|minutes| {
            let candidate = naive.checked_add_signed(Duration::minutes(minutes))?;
            tz.from_local_datetime(&candidate)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        }),
    }
}

/// The local calendar date of `ts`
pub fn local_date(ts: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    ts.with_timezone(tz).date_naive()
}

/// Start of the local day that contains `now`
pub fn start_of_day(now: &DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let midnight = local_date(now, tz).and_time(NaiveTime::MIN);
    resolve_local(&midnight, tz).unwrap_or(*now)
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
