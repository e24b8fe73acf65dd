use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use super::error::SimTimeError;

/// Parse an ISO-8601 time. Strings without an offset are taken to be UTC.
/// The result is always expressed in UTC.
pub fn parse_time(input: &str) -> Result<OffsetDateTime, SimTimeError> {
    let trimmed = input.trim();
    if let Ok(t) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(t.to_offset(UtcOffset::UTC));
    }
    let naive_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    ];
    for format in naive_formats {
        if let Ok(t) = PrimitiveDateTime::parse(trimmed, format) {
            return Ok(t.assume_utc());
        }
    }
    let date_only = format_description!("[year]-[month]-[day]");
    match time::Date::parse(trimmed, date_only) {
        Ok(d) => Ok(d.midnight().assume_utc()),
        Err(e) => Err(SimTimeError::BadTime(input.to_string(), e.to_string())),
    }
}

/// Expand the simulation time arguments: one time is used as is, a start/end pair is
/// expanded hourly, both ends included.
pub fn expand_sim_times(inputs: &[String]) -> Result<Vec<OffsetDateTime>, SimTimeError> {
    match inputs {
        [single] => Ok(vec![parse_time(single)?]),
        [start, end] => {
            let start_t = parse_time(start)?;
            let end_t = parse_time(end)?;
            if end_t < start_t {
                return Err(SimTimeError::Reversed(start.clone(), end.clone()));
            }
            let mut times = Vec::new();
            let mut t = start_t;
            while t <= end_t {
                times.push(t);
                t += Duration::HOUR;
            }
            Ok(times)
        }
        _ => Err(SimTimeError::BadCount(inputs.len())),
    }
}

/// Seconds since 1970-01-01T00:00:00Z
pub fn to_unix_seconds(t: &OffsetDateTime) -> f64 {
    t.unix_timestamp_nanos() as f64 / 1e9
}

pub fn from_unix_seconds(seconds: f64) -> Result<OffsetDateTime, SimTimeError> {
    if !seconds.is_finite() {
        return Err(SimTimeError::BadUnixTime(seconds));
    }
    OffsetDateTime::from_unix_timestamp_nanos((seconds * 1e9).round() as i128)
        .map_err(|_| SimTimeError::BadUnixTime(seconds))
}

/// RFC 3339 rendering for logs and plot titles
pub fn format_time(t: &OffsetDateTime) -> String {
    t.format(&Rfc3339).unwrap_or_else(|_| t.to_string())
}
