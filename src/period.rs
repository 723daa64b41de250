use crate::error::{Result, TallyError};
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Which end of the window a raw string is bound to. A bare calendar date
/// resolves to midnight as a start bound and to 23:59:59 as an end bound.
#[derive(Debug, Clone, Copy)]
enum Bound {
    Start,
    End,
}

/// Resolve optional raw `--since`/`--until` strings into concrete instants
/// anchored to `zone`. Defaults: 30 days back at local midnight, and now.
pub fn resolve<Tz: TimeZone>(
    since_raw: Option<&str>,
    until_raw: Option<&str>,
    zone: &Tz,
) -> Result<(DateTime<Tz>, DateTime<Tz>)> {
    resolve_at(since_raw, until_raw, zone, Utc::now().with_timezone(zone))
}

fn resolve_at<Tz: TimeZone>(
    since_raw: Option<&str>,
    until_raw: Option<&str>,
    zone: &Tz,
    now: DateTime<Tz>,
) -> Result<(DateTime<Tz>, DateTime<Tz>)> {
    let since = match nonempty(since_raw) {
        Some(raw) => parse_flexible(raw, zone, &now, Bound::Start).ok_or_else(|| {
            TallyError::DateParse { field: "since", value: raw.to_string() }
        })?,
        None => default_since(zone, &now)?,
    };

    let until = match nonempty(until_raw) {
        Some(raw) => parse_flexible(raw, zone, &now, Bound::End).ok_or_else(|| {
            TallyError::DateParse { field: "until", value: raw.to_string() }
        })?,
        None => now,
    };

    Ok((since, until))
}

fn nonempty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Local midnight of (now - 30 days).
fn default_since<Tz: TimeZone>(zone: &Tz, now: &DateTime<Tz>) -> Result<DateTime<Tz>> {
    let day = now
        .date_naive()
        .checked_sub_days(Days::new(30))
        .ok_or_else(|| TallyError::Parse("default window underflows the calendar".into()))?;
    attach(zone, day.and_time(NaiveTime::MIN))
        .ok_or_else(|| TallyError::Parse("default window start is not a valid local time".into()))
}

/// Ordered parser attempts, first match wins. Each attempt answers
/// parsed-or-no-match; only exhausting the whole list is a parse failure.
fn parse_flexible<Tz: TimeZone>(
    raw: &str,
    zone: &Tz,
    now: &DateTime<Tz>,
    bound: Bound,
) -> Option<DateTime<Tz>> {
    // Full timestamp with offset, e.g. 2024-01-15T10:30:00+03:00
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(zone));
    }

    // Calendar date; granularity of the end bound is a deliberate 23:59:59
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = match bound {
            Bound::Start => NaiveTime::MIN,
            Bound::End => NaiveTime::from_hms_opt(23, 59, 59)?,
        };
        return attach(zone, date.and_time(time));
    }

    // Date plus minute, exact instant
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M") {
        return attach(zone, dt);
    }

    // Legacy timestamp with named or numeric offset (RFC 2822)
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(zone));
    }

    // Relative duration, e.g. "2 weeks ago"
    if let Some(span) = raw.strip_suffix("ago") {
        let span: String = span.split_whitespace().collect();
        if let Ok(duration) = humantime::parse_duration(&span) {
            let duration = chrono::Duration::from_std(duration).ok()?;
            return now.clone().checked_sub_signed(duration);
        }
    }

    None
}

fn attach<Tz: TimeZone>(zone: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    zone.from_local_datetime(&local).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Timelike};
    use pretty_assertions::assert_eq;

    fn zone() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    fn fixed_now() -> DateTime<FixedOffset> {
        zone().with_ymd_and_hms(2024, 6, 15, 12, 30, 45).unwrap()
    }

    #[test]
    fn calendar_date_as_since_is_midnight() {
        let (since, _) =
            resolve_at(Some("2024-01-15"), None, &zone(), fixed_now()).unwrap();
        assert_eq!(
            since,
            zone().with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn calendar_date_as_until_is_end_of_day() {
        let (_, until) =
            resolve_at(None, Some("2024-01-15"), &zone(), fixed_now()).unwrap();
        assert_eq!(
            until,
            zone().with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap()
        );
    }

    #[test]
    fn date_with_minute_is_exact_for_both_bounds() {
        let (since, until) = resolve_at(
            Some("2024-03-01 08:15"),
            Some("2024-03-02 18:45"),
            &zone(),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(since, zone().with_ymd_and_hms(2024, 3, 1, 8, 15, 0).unwrap());
        assert_eq!(until, zone().with_ymd_and_hms(2024, 3, 2, 18, 45, 0).unwrap());
    }

    #[test]
    fn rfc3339_keeps_the_instant() {
        let (since, _) = resolve_at(
            Some("2024-01-15T10:00:00Z"),
            None,
            &zone(),
            fixed_now(),
        )
        .unwrap();
        // 10:00 UTC is 13:00 at +03:00
        assert_eq!(since.hour(), 13);
        assert_eq!(since.with_timezone(&Utc).hour(), 10);
    }

    #[test]
    fn rfc2822_legacy_format_parses() {
        let (since, _) = resolve_at(
            Some("Mon, 15 Jan 2024 10:00:00 +0300"),
            None,
            &zone(),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(since, zone().with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap());
    }

    #[test]
    fn relative_duration_subtracts_from_now() {
        let now = fixed_now();
        let (since, _) = resolve_at(Some("2 weeks ago"), None, &zone(), now).unwrap();
        assert_eq!(since, now - chrono::Duration::weeks(2));
    }

    #[test]
    fn defaults_are_midnight_thirty_days_back_and_now() {
        let now = fixed_now();
        let (since, until) = resolve_at(None, None, &zone(), now).unwrap();
        assert_eq!(until, now);
        assert_eq!(since, zone().with_ymd_and_hms(2024, 5, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn unparsable_since_names_the_field() {
        let err = resolve_at(Some("not a date"), None, &zone(), fixed_now()).unwrap_err();
        match err {
            TallyError::DateParse { field, value } => {
                assert_eq!(field, "since");
                assert_eq!(value, "not a date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparsable_until_names_the_field() {
        let err =
            resolve_at(None, Some("2024-13-99"), &zone(), fixed_now()).unwrap_err();
        match err {
            TallyError::DateParse { field, .. } => assert_eq!(field, "until"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
