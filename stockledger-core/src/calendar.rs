//! Calendar bucketing helpers.
//!
//! All rollup grains share one convention: a bucket is identified by its
//! first calendar date. Weeks are ISO weeks (Monday start).

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(days_from_monday)
}

/// First day of the calendar month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .unwrap_or(date)
}

/// First day of the calendar year containing `date`.
pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// Last day of the calendar month containing `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    let (next_y, next_m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(next_y, next_m, 1)
        .map(|first_of_next| first_of_next - Duration::days(1))
        .unwrap_or(date)
}
