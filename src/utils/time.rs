use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde_json::json;

use crate::error::{AppError, AppResult};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Storage format for every timestamp column. Fixed precision and a `Z`
/// suffix keep lexical order equal to chronological order in SQLite.
pub fn to_storage(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn to_storage_opt(value: Option<&DateTime<Utc>>) -> Option<String> {
    value.map(to_storage)
}

pub fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| {
            AppError::validation_with_details(
                "invalid timestamp",
                json!({"value": value, "error": err.to_string()}),
            )
        })
}

pub fn parse_timestamp_opt(value: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    value.map(parse_timestamp).transpose()
}

/// Signed, fractional number of days from `from` to `to`.
pub fn days_between(from: &DateTime<Utc>, to: &DateTime<Utc>) -> f64 {
    let millis = to.signed_duration_since(*from).num_milliseconds() as f64;
    millis / 1000.0 / SECONDS_PER_DAY
}

/// Start of the server-local calendar day containing `moment`, in UTC.
pub fn local_day_start(moment: &DateTime<Local>) -> DateTime<Utc> {
    local_date_start(moment.date_naive())
}

/// Start of the given server-local calendar day, in UTC.
///
/// Falls back to the first valid local instant when midnight does not exist
/// (DST gaps).
pub fn local_date_start(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    let mut candidate = midnight;
    for _ in 0..4 {
        if let Some(local) = Local.from_local_datetime(&candidate).earliest() {
            return local.with_timezone(&Utc);
        }
        candidate += Duration::hours(1);
    }
    Utc.from_utc_datetime(&midnight)
}
