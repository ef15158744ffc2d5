// media-store/src/schedule_time.rs
// ============================================================================
// Module: Schedule Time Math
// Description: IANA timezone-aware next-fire-time computation for report
//              schedules.
// Purpose: Advance a schedule's `next_run_at` by one period in its own local
//          wall clock, so daily/weekly fire times don't drift across DST
//          transitions.
// Dependencies: media-core, chrono, chrono-tz, time
// ============================================================================

use chrono::Datelike;
use chrono::TimeZone;
use media_core::StoreError;
use media_core::core::report::ReportSchedule;
use media_core::core::report::ReportScheduleFrequency;
use time::OffsetDateTime;

fn to_chrono_utc(value: OffsetDateTime) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
    chrono::DateTime::from_timestamp(value.unix_timestamp(), value.nanosecond())
        .ok_or_else(|| StoreError::Internal(format!("timestamp out of range: {value}")))
}

fn from_chrono_utc(value: chrono::DateTime<chrono::Utc>) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::from_unix_timestamp(value.timestamp())
        .map(|odt| odt + time::Duration::nanoseconds(i64::from(value.timestamp_subsec_nanos())))
        .map_err(|err| StoreError::Internal(err.to_string()))
}

fn parse_time_local(time_local: &str) -> Result<(u32, u32), StoreError> {
    let (hour, minute) = time_local
        .split_once(':')
        .ok_or_else(|| StoreError::Internal(format!("invalid time_local: {time_local}")))?;
    let hour: u32 = hour
        .parse()
        .map_err(|_err| StoreError::Internal(format!("invalid time_local: {time_local}")))?;
    let minute: u32 = minute
        .parse()
        .map_err(|_err| StoreError::Internal(format!("invalid time_local: {time_local}")))?;
    Ok((hour, minute))
}

fn day_of_week_to_weekday(day_of_week: Option<u8>) -> Result<chrono::Weekday, StoreError> {
    use chrono::Weekday::{Fri, Mon, Sat, Sun, Thu, Tue, Wed};
    let days = [Sun, Mon, Tue, Wed, Thu, Fri, Sat];
    let day_of_week = day_of_week
        .ok_or_else(|| StoreError::Internal("weekly schedule missing day_of_week".to_string()))?;
    days.get(usize::from(day_of_week))
        .copied()
        .ok_or_else(|| StoreError::Internal(format!("invalid day_of_week: {day_of_week}")))
}

/// Resolves a naive local datetime to UTC, preferring the earlier instant on
/// a fall-back overlap and stepping an hour forward out of a spring-forward
/// gap where the local time never occurs.
fn resolve_local(tz: chrono_tz::Tz, naive: chrono::NaiveDateTime) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
    match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => Ok(dt.with_timezone(&chrono::Utc)),
        chrono::LocalResult::Ambiguous(earliest, _latest) => Ok(earliest.with_timezone(&chrono::Utc)),
        chrono::LocalResult::None => match tz.from_local_datetime(&(naive + chrono::Duration::hours(1))) {
            chrono::LocalResult::Single(dt) => Ok(dt.with_timezone(&chrono::Utc)),
            chrono::LocalResult::Ambiguous(earliest, _latest) => Ok(earliest.with_timezone(&chrono::Utc)),
            chrono::LocalResult::None => Err(StoreError::Internal(format!("no resolvable local time for {naive} in {tz}"))),
        },
    }
}

/// Computes the next UTC fire time for a schedule, one period past its
/// current `next_run_at`, derived from `time_local`/`day_of_week` in the
/// schedule's own `timezone` rather than a fixed duration offset.
pub(crate) fn next_run_at(schedule: &ReportSchedule) -> Result<OffsetDateTime, StoreError> {
    let tz: chrono_tz::Tz = schedule
        .timezone
        .parse()
        .map_err(|_err| StoreError::Internal(format!("unknown timezone: {}", schedule.timezone)))?;
    let (hour, minute) = parse_time_local(&schedule.time_local)?;

    let prior_local = to_chrono_utc(schedule.next_run_at)?.with_timezone(&tz);
    let next_date = match schedule.frequency {
        ReportScheduleFrequency::Daily => prior_local.date_naive() + chrono::Duration::days(1),
        ReportScheduleFrequency::Weekly => {
            let target = day_of_week_to_weekday(schedule.day_of_week)?;
            let mut date = prior_local.date_naive() + chrono::Duration::days(1);
            while date.weekday() != target {
                date += chrono::Duration::days(1);
            }
            date
        }
    };

    let naive_time = chrono::NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| StoreError::Internal(format!("invalid time_local: {}:{}", hour, minute)))?;
    let naive_dt = chrono::NaiveDateTime::new(next_date, naive_time);
    from_chrono_utc(resolve_local(tz, naive_dt)?)
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, reason = "Test-only assertions.")]
#[cfg(test)]
mod tests {
    use media_core::core::identifiers::ReportScheduleId;
    use media_core::core::identifiers::ReportTemplateId;
    use media_core::core::report::ReportSchedule;
    use media_core::core::report::ReportScheduleFrequency;
    use time::format_description::well_known::Rfc3339;

    use super::next_run_at;

    fn parse(value: &str) -> time::OffsetDateTime {
        time::OffsetDateTime::parse(value, &Rfc3339).unwrap()
    }

    fn schedule(
        frequency: ReportScheduleFrequency,
        day_of_week: Option<u8>,
        time_local: &str,
        timezone: &str,
        current_next_run_at: time::OffsetDateTime,
    ) -> ReportSchedule {
        ReportSchedule {
            id: ReportScheduleId::new("99999999-9999-9999-9999-999999999999"),
            template_id: ReportTemplateId::new("11111111-1111-1111-1111-111111111111"),
            frequency,
            day_of_week,
            time_local: time_local.to_string(),
            timezone: timezone.to_string(),
            recipients: vec!["analyst@example.com".to_string()],
            next_run_at: current_next_run_at,
            last_run_at: None,
            enabled: true,
        }
    }

    #[test]
    fn daily_schedule_holds_local_fire_time_across_spring_forward() {
        // 2024-03-09 08:00 America/New_York == 13:00Z (EST, UTC-5).
        let current = parse("2024-03-09T13:00:00Z");
        let s = schedule(ReportScheduleFrequency::Daily, None, "08:00", "America/New_York", current);
        let next = next_run_at(&s).unwrap();
        // 2024-03-10 08:00 America/New_York is EDT (UTC-4) after the spring-forward
        // transition at 2am local; a fixed +1 day offset would have produced 13:00Z.
        assert_eq!(next, parse("2024-03-10T12:00:00Z"));
    }

    #[test]
    fn daily_schedule_holds_local_fire_time_across_fall_back() {
        // 2024-11-02 08:00 America/New_York == 12:00Z (EDT, UTC-4).
        let current = parse("2024-11-02T12:00:00Z");
        let s = schedule(ReportScheduleFrequency::Daily, None, "08:00", "America/New_York", current);
        let next = next_run_at(&s).unwrap();
        // 2024-11-03 08:00 America/New_York is EST (UTC-5) after the fall-back
        // transition at 2am local; a fixed +1 day offset would have produced 12:00Z.
        assert_eq!(next, parse("2024-11-03T13:00:00Z"));
    }

    #[test]
    fn weekly_schedule_advances_to_the_next_matching_weekday() {
        // 2024-06-03 is a Monday; day_of_week 3 means Wednesday.
        let current = parse("2024-06-03T09:00:00Z");
        let s = schedule(ReportScheduleFrequency::Weekly, Some(3), "09:00", "UTC", current);
        let next = next_run_at(&s).unwrap();
        assert_eq!(next, parse("2024-06-05T09:00:00Z"));
    }

    #[test]
    fn weekly_schedule_wraps_to_next_week_when_fired_on_target_day() {
        // 2024-06-05 is already a Wednesday; the next Wednesday is 7 days later.
        let current = parse("2024-06-05T09:00:00Z");
        let s = schedule(ReportScheduleFrequency::Weekly, Some(3), "09:00", "UTC", current);
        let next = next_run_at(&s).unwrap();
        assert_eq!(next, parse("2024-06-12T09:00:00Z"));
    }
}
