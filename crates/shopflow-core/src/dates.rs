use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::{PipelineError, Result};

/// Encode a calendar date as its integer `YYYYMMDD` warehouse key.
pub fn date_key(date: NaiveDate) -> i32 {
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

/// Decode a `YYYYMMDD` key back to the calendar date it names.
pub fn date_from_key(key: i32) -> Result<NaiveDate> {
    let year = key / 10_000;
    let month = (key / 100 % 100) as u32;
    let day = (key % 100) as u32;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        PipelineError::Validation(format!("date key {key} does not decode to a calendar date"))
    })
}

/// Every day in `[start, end]`, in order.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

/// One fully-derived `warehouse.dim_date` row. Shared by the bulk date load
/// and the fact loader's gap filling so the two can never drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimDateRow {
    pub date_key: i32,
    pub date: NaiveDate,
    /// Monday = 0 .. Sunday = 6.
    pub day_of_week: i16,
    pub day_name: &'static str,
    pub day_of_month: i16,
    pub day_of_year: i16,
    /// ISO 8601 week number; the first days of January can belong to the
    /// previous year's final week.
    pub week_of_year: i16,
    pub month: i16,
    pub month_name: &'static str,
    pub quarter: i16,
    pub year: i32,
    pub is_weekend: bool,
    /// No holiday calendar feed exists; always false.
    pub is_holiday: bool,
}

impl DimDateRow {
    pub fn for_date(date: NaiveDate) -> Self {
        let weekday = date.weekday();
        Self {
            date_key: date_key(date),
            date,
            day_of_week: weekday.num_days_from_monday() as i16,
            day_name: day_name(weekday),
            day_of_month: date.day() as i16,
            day_of_year: date.ordinal() as i16,
            week_of_year: date.iso_week().week() as i16,
            month: date.month() as i16,
            month_name: month_name(date.month()),
            quarter: (date.month0() / 3 + 1) as i16,
            year: date.year(),
            is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
            is_holiday: false,
        }
    }
}

fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}
