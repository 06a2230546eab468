use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::BTreeMap;

/// US federal holidays for `year`, keyed by date. Observed-day shifts are not applied.
pub fn us_holidays(year: i32) -> BTreeMap<NaiveDate, &'static str> {
    let mut holidays = BTreeMap::new();

    let fixed = [
        (1, 1, "New Year's Day"),
        (6, 19, "Juneteenth"),
        (7, 4, "Independence Day"),
        (11, 11, "Veterans Day"),
        (12, 25, "Christmas Day"),
    ];
    for (month, day, name) in fixed {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            holidays.insert(date, name);
        }
    }

    let floating = [
        (nth_weekday(year, 1, Weekday::Mon, 3), "MLK Day"),
        (nth_weekday(year, 2, Weekday::Mon, 3), "Presidents' Day"),
        (last_weekday(year, 5, Weekday::Mon), "Memorial Day"),
        (nth_weekday(year, 9, Weekday::Mon, 1), "Labor Day"),
        (nth_weekday(year, 10, Weekday::Mon, 2), "Columbus Day"),
        (nth_weekday(year, 11, Weekday::Thu, 4), "Thanksgiving"),
    ];
    for (date, name) in floating {
        if let Some(date) = date {
            holidays.insert(date, name);
        }
    }

    holidays
}

/// The `n`th (1-based) `weekday` of `month`, or `None` when the month has fewer.
pub fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    if n == 0 {
        return None;
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = (weekday.num_days_from_sunday() + 7 - first.weekday().num_days_from_sunday()) % 7;
    let date = first + Duration::days(i64::from(offset + (n - 1) * 7));
    (date.month() == month).then_some(date)
}

pub fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let last = last_day_of_month(year, month)?;
    let back = (last.weekday().num_days_from_sunday() + 7 - weekday.num_days_from_sunday()) % 7;
    Some(last - Duration::days(i64::from(back)))
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }?;
    next_first.pred_opt()
}
