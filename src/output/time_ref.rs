use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};

/// Time reference selections offered by the original picker, in display order.
pub const TIME_REFERENCE_PRESETS: [&str; 8] = [
    "Local",
    "UTC",
    "UTC+8 (Beijing/Singapore)",
    "UTC+9 (Tokyo/Seoul)",
    "UTC-5 (New York/Toronto EST)",
    "UTC-8 (Los Angeles/Vancouver PST)",
    "UTC+0 (London/Greenwich)",
    "UTC+1 (Berlin/Paris CET)",
];

/// Default selection.
pub const DEFAULT_TIME_REFERENCE: &str = "Local";

/// Format used for the `{time}` placeholder.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Wall-clock time for `selection`, read now.
pub fn resolve_time(selection: &str) -> NaiveDateTime {
    resolve_time_at(selection, Utc::now())
}

/// Wall-clock time for `selection` at the instant `now`.
///
/// Anything mentioning "Local" uses the local zone, exactly "UTC" uses UTC, and "UTC±N ..." is
/// UTC shifted by N whole hours, with N directly after "UTC" and `|N| < 24`. Selections that
/// cannot be parsed fall back to local time.
pub fn resolve_time_at(selection: &str, now: DateTime<Utc>) -> NaiveDateTime {
    let local = || now.with_timezone(&Local).naive_local();

    if selection.contains("Local") {
        return local();
    }
    if selection == "UTC" {
        return now.naive_utc();
    }

    let shifted = selection
        .split(' ')
        .next()
        .map(|token| token.replace("UTC", ""))
        .and_then(|hours| hours.parse::<i32>().ok())
        .and_then(|hours| hours.checked_mul(3600))
        .and_then(FixedOffset::east_opt)
        .map(|offset| now.with_timezone(&offset).naive_local());

    match shifted {
        Some(t) => t,
        None => {
            tracing::debug!(selection, "unrecognized time reference, using local time");
            local()
        }
    }
}

/// `YYYYMMDD_HHMMSS` rendering of `t`.
pub fn format_timestamp(t: NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}
