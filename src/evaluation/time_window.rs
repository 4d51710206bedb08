//! Timezone conversion and local clock-window utilities.
//!
//! Rule tables are written in local clock time at the crew base while duty
//! instants are carried in UTC. The helpers here convert between the two
//! and test instants or intervals against local clock bands, including
//! bands that wrap past midnight.

use chrono::{
    DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use chrono_tz::Tz;

use crate::error::{EngineError, EngineResult};

/// Start of the window of circadian low, in minutes after local midnight (02:00).
pub const WOCL_START_MINUTE: u32 = 2 * 60;

/// Exclusive end of the window of circadian low (06:00, so 05:59 is the last minute inside).
pub const WOCL_END_MINUTE: u32 = 6 * 60;

/// Sampling step used when testing an interval against the WOCL.
pub const WOCL_SAMPLE_MINUTES: i64 = 15;

/// Parses a local clock time written as `HH:MM` (one- or two-digit parts).
///
/// # Errors
///
/// Returns `InvalidInput` for anything that is not a valid 24-hour clock
/// time. `24:00` is rejected here; see [`local_date_time`] for the
/// end-of-day form.
///
/// # Example
///
/// ```
/// use ftl_engine::evaluation::parse_hhmm;
/// use chrono::NaiveTime;
///
/// assert_eq!(parse_hhmm("07:05").unwrap(), NaiveTime::from_hms_opt(7, 5, 0).unwrap());
/// assert!(parse_hhmm("7h05").is_err());
/// ```
pub fn parse_hhmm(raw: &str) -> EngineResult<NaiveTime> {
    let invalid = || EngineError::invalid_input("time", format!("expected HH:MM, got '{raw}'"));

    let (hours, minutes) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let is_clock_part =
        |part: &str| (1..=2).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit());
    if !is_clock_part(hours) || !is_clock_part(minutes) {
        return Err(invalid());
    }

    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}

/// Combines a local date with an `HH:MM` clock time.
///
/// A clock time of `24:00` means midnight at the end of `date` and is
/// normalized to `00:00` on the following day.
pub fn local_date_time(date: NaiveDate, hhmm: &str) -> EngineResult<NaiveDateTime> {
    if hhmm.trim() == "24:00" {
        let next_day = date
            .succ_opt()
            .ok_or_else(|| EngineError::invalid_input("date", format!("no day after {date}")))?;
        return Ok(next_day.and_time(NaiveTime::MIN));
    }
    Ok(date.and_time(parse_hhmm(hhmm)?))
}

/// Returns true when `t` falls in `[start, end)`.
///
/// When `start > end` the band wraps past midnight and covers
/// `[start, 24:00) ∪ [00:00, end)`. A band with `start == end` is empty.
pub fn within_band<T: PartialOrd>(t: T, start: T, end: T) -> bool {
    if start <= end {
        start <= t && t < end
    } else {
        t >= start || t < end
    }
}

/// Minutes since local midnight.
pub fn minute_of_day(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Converts a UTC instant to local time in `tz`.
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

/// Converts a local wall-clock time in `tz` to UTC.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant.
/// Times inside a gap (clocks going forward) keep the offset in force before
/// the transition, so they land just after it.
pub fn local_to_utc(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&local).earliest() {
        Some(resolved) => resolved.with_timezone(&Utc),
        None => {
            let before = tz
                .offset_from_utc_datetime(&(local - Duration::days(1)))
                .fix();
            let utc = local - Duration::seconds(i64::from(before.local_minus_utc()));
            Utc.from_utc_datetime(&utc)
        }
    }
}

/// Whole minutes from `from` to `to`, rounded down.
pub fn elapsed_minutes(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().div_euclid(60)
}

/// Tests whether a local interval touches the WOCL (02:00–05:59).
///
/// The interval is sampled every [`WOCL_SAMPLE_MINUTES`] from its start up
/// to and including its end; the first sample inside the window wins.
///
/// # Example
///
/// ```
/// use ftl_engine::evaluation::overlaps_wocl;
/// use chrono::TimeZone;
/// use chrono_tz::Europe::London;
///
/// let start = London.with_ymd_and_hms(2026, 1, 15, 2, 0, 0).unwrap();
/// let end = London.with_ymd_and_hms(2026, 1, 15, 2, 1, 0).unwrap();
/// assert!(overlaps_wocl(start, end));
/// ```
pub fn overlaps_wocl(start_local: DateTime<Tz>, end_local: DateTime<Tz>) -> bool {
    let mut cursor = start_local;
    while cursor <= end_local {
        let minute = minute_of_day(cursor.time());
        if within_band(minute, WOCL_START_MINUTE, WOCL_END_MINUTE) {
            return true;
        }
        cursor += Duration::minutes(WOCL_SAMPLE_MINUTES);
    }
    false
}

/// Counts the minutes in `[start, until)` whose local clock time lies outside
/// the local band `[band_start_minute, band_end_minute)`.
///
/// Scans minute by minute, so the cost is linear in the interval length.
pub fn minutes_outside_local_band(
    start: DateTime<Utc>,
    until: DateTime<Utc>,
    tz: Tz,
    band_start_minute: u32,
    band_end_minute: u32,
) -> i64 {
    let mut counted = 0;
    let mut cursor = start;
    while cursor < until {
        let minute = minute_of_day(to_local(cursor, tz).time());
        if !within_band(minute, band_start_minute, band_end_minute) {
            counted += 1;
        }
        cursor += Duration::minutes(1);
    }
    counted
}

/// Formats signed minutes as `"{h}h {mm}m"`, e.g. `"-1h 05m"`.
pub fn format_hm(minutes: i64) -> String {
    let sign = if minutes < 0 { "-" } else { "" };
    let magnitude = minutes.abs();
    format!("{sign}{}h {:02}m", magnitude / 60, magnitude % 60)
}
