// SPDX-License-Identifier: MIT
// Copyright 2026 FitQuest contributors

//! Shared helpers for date/time formatting and calendar arithmetic.

use chrono::{DateTime, Datelike, Days, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format a date as an ISO `YYYY-MM-DD` string, the marker format used
/// throughout the user document.
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Today's date in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// The Monday starting the week containing `date`, as `YYYY-MM-DD`.
///
/// Weeks run Monday through Sunday: a Sunday rolls back six days.
pub fn week_start_iso(date: NaiveDate) -> String {
    let monday = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
    iso_date(monday)
}

/// The day before `date`, as `YYYY-MM-DD`.
pub fn yesterday_iso(date: NaiveDate) -> String {
    iso_date(date - Days::new(1))
}
