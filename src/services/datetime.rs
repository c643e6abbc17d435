use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::i18n;

pub fn to_local(millis: i64, tz: Tz) -> DateTime<Tz> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_default()
        .with_timezone(&tz)
}

/// False for "all-day" events stored at local midnight.
pub fn has_time_of_day(local: &DateTime<Tz>) -> bool {
    local.hour() != 0 || local.minute() != 0
}

/// Value for an `<input type="date">`.
pub fn input_date(millis: i64, tz: Tz) -> String {
    to_local(millis, tz).format("%Y-%m-%d").to_string()
}

/// Value for an `<input type="time">`, empty for all-day events.
pub fn input_time(millis: i64, tz: Tz) -> String {
    let local = to_local(millis, tz);
    if has_time_of_day(&local) {
        local.format("%H:%M").to_string()
    } else {
        String::new()
    }
}

/// Combine date and time inputs into epoch milliseconds in `tz`.
///
/// An empty time means midnight. Returns 0 when the date is missing or either
/// part does not parse, and for local times skipped by a DST transition.
pub fn parse_local(date: &str, time: &str, tz: Tz) -> i64 {
    let Ok(date) = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") else {
        return 0;
    };
    let time = time.trim();
    let time = if time.is_empty() {
        Some(NaiveTime::default())
    } else {
        NaiveTime::parse_from_str(time, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
            .ok()
    };

    time.and_then(|t| tz.from_local_datetime(&date.and_time(t)).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

fn weekday_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "weekday.mon",
        Weekday::Tue => "weekday.tue",
        Weekday::Wed => "weekday.wed",
        Weekday::Thu => "weekday.thu",
        Weekday::Fri => "weekday.fri",
        Weekday::Sat => "weekday.sat",
        Weekday::Sun => "weekday.sun",
    }
}

/// Short weekday plus two-digit year date, e.g. `Sa., 05.10.24` or `Sat, 10/05/24`.
pub fn format_date(millis: i64, tz: Tz, lang: &str) -> String {
    let local = to_local(millis, tz);
    let weekday = i18n::tr(Some(lang), weekday_key(local.weekday()), None);
    let date = match lang {
        "en" => local.format("%m/%d/%y"),
        _ => local.format("%d.%m.%y"),
    };
    format!("{}, {}", weekday, date)
}

/// Locale time of day, empty for all-day events.
pub fn format_time(millis: i64, tz: Tz, lang: &str) -> String {
    let local = to_local(millis, tz);
    if !has_time_of_day(&local) {
        return String::new();
    }
    match lang {
        "en" => local.format("%-I:%M %p").to_string(),
        _ => local.format("%H:%M").to_string(),
    }
}
