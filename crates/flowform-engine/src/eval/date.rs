use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{Datelike, Days, Local, Months, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use serde_json::Value;

use flowform_spec::ConditionOperator;

use super::{OperatorFn, OperatorTable};

/// Granularity encoded in a date literal. Comparison granularity follows the
/// literal, not the current value: a full current date against a year-only
/// literal only compares years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateLiteral {
    /// `dd.`: day of month, month and year ignored.
    Day(u32),
    /// `dd.mm.`: day and month, year ignored.
    DayMonth(u32, u32),
    /// `mm.yyyy`
    MonthYear(u32, i32),
    /// `yyyy`
    Year(i32),
    /// `dd.mm.yyyy` or an ISO timestamp.
    Full(NaiveDate),
}

fn parse_literal(literal: &str) -> Option<DateLiteral> {
    let trimmed = literal.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%d.%m.%Y") {
        return Some(DateLiteral::Full(date));
    }
    if let Some(date) = parse_timestamp(trimmed) {
        return Some(DateLiteral::Full(date));
    }
    let parts: Vec<&str> = trimmed.split('.').collect();
    match parts.as_slice() {
        [year] if year.len() == 4 => year.parse().ok().map(DateLiteral::Year),
        [day, ""] => parse_day(day).map(DateLiteral::Day),
        [day, month, ""] => Some(DateLiteral::DayMonth(parse_day(day)?, parse_month(month)?)),
        [month, year] if year.len() == 4 => {
            Some(DateLiteral::MonthYear(parse_month(month)?, year.parse().ok()?))
        }
        _ => None,
    }
}

fn parse_day(text: &str) -> Option<u32> {
    text.parse().ok().filter(|day| (1..=31).contains(day))
}

fn parse_month(text: &str) -> Option<u32> {
    text.parse().ok().filter(|month| (1..=12).contains(month))
}

fn parse_timestamp(text: &str) -> Option<NaiveDate> {
    if let Ok(stamp) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(stamp.date_naive());
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(stamp.date());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

pub(crate) fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, "%d.%m.%Y")
        .ok()
        .or_else(|| parse_timestamp(trimmed))
}

fn parse_current(current: Option<&Value>) -> Option<NaiveDate> {
    current.and_then(Value::as_str).and_then(parse_date_text)
}

fn literal_eq(current: NaiveDate, literal: DateLiteral) -> bool {
    match literal {
        DateLiteral::Day(day) => current.day() == day,
        DateLiteral::DayMonth(day, month) => current.day() == day && current.month() == month,
        DateLiteral::MonthYear(month, year) => {
            current.month() == month && current.year() == year
        }
        DateLiteral::Year(year) => current.year() == year,
        DateLiteral::Full(date) => current == date,
    }
}

fn literal_cmp(current: NaiveDate, literal: DateLiteral) -> Ordering {
    match literal {
        DateLiteral::Day(day) => current.day().cmp(&day),
        DateLiteral::DayMonth(day, month) => {
            (current.month(), current.day()).cmp(&(month, day))
        }
        DateLiteral::MonthYear(month, year) => {
            (current.year(), current.month()).cmp(&(year, month))
        }
        DateLiteral::Year(year) => current.year().cmp(&year),
        DateLiteral::Full(date) => current.cmp(&date),
    }
}

fn compare(current: Option<&Value>, literal: &str, accept: fn(Ordering) -> bool) -> bool {
    let (Some(current), Some(literal)) = (parse_current(current), parse_literal(literal)) else {
        return false;
    };
    accept(literal_cmp(current, literal))
}

fn equals(current: Option<&Value>, literal: &str) -> bool {
    let (Some(current), Some(literal)) = (parse_current(current), parse_literal(literal)) else {
        return false;
    };
    literal_eq(current, literal)
}

fn not_equals(current: Option<&Value>, literal: &str) -> bool {
    let (Some(current), Some(literal)) = (parse_current(current), parse_literal(literal)) else {
        return false;
    };
    !literal_eq(current, literal)
}

fn less_than(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, Ordering::is_lt)
}

fn less_than_or_equal(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, Ordering::is_le)
}

fn greater_than(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, Ordering::is_gt)
}

fn greater_than_or_equal(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, Ordering::is_ge)
}

fn empty(current: Option<&Value>, _literal: &str) -> bool {
    match current {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

fn not_empty(current: Option<&Value>, literal: &str) -> bool {
    !empty(current, literal)
}

fn parse_count(literal: &str) -> Option<u32> {
    literal.trim().parse().ok()
}

/// Distance operators are inclusive: a date exactly N units from today
/// satisfies both the past and future variant for N.
fn in_past(
    current: Option<&Value>,
    literal: &str,
    shift: fn(NaiveDate, u32) -> Option<NaiveDate>,
) -> bool {
    let (Some(current), Some(count)) = (parse_current(current), parse_count(literal)) else {
        return false;
    };
    match shift(Local::now().date_naive(), count) {
        Some(boundary) => current <= boundary,
        None => false,
    }
}

fn in_future(
    current: Option<&Value>,
    literal: &str,
    shift: fn(NaiveDate, u32) -> Option<NaiveDate>,
) -> bool {
    let (Some(current), Some(count)) = (parse_current(current), parse_count(literal)) else {
        return false;
    };
    match shift(Local::now().date_naive(), count) {
        Some(boundary) => current >= boundary,
        None => false,
    }
}

fn minus_years(today: NaiveDate, count: u32) -> Option<NaiveDate> {
    today.checked_sub_months(Months::new(12u32.saturating_mul(count)))
}

fn minus_months(today: NaiveDate, count: u32) -> Option<NaiveDate> {
    today.checked_sub_months(Months::new(count))
}

fn minus_days(today: NaiveDate, count: u32) -> Option<NaiveDate> {
    today.checked_sub_days(Days::new(u64::from(count)))
}

fn plus_years(today: NaiveDate, count: u32) -> Option<NaiveDate> {
    today.checked_add_months(Months::new(12u32.saturating_mul(count)))
}

fn plus_months(today: NaiveDate, count: u32) -> Option<NaiveDate> {
    today.checked_add_months(Months::new(count))
}

fn plus_days(today: NaiveDate, count: u32) -> Option<NaiveDate> {
    today.checked_add_days(Days::new(u64::from(count)))
}

fn years_in_past(current: Option<&Value>, literal: &str) -> bool {
    in_past(current, literal, minus_years)
}

fn months_in_past(current: Option<&Value>, literal: &str) -> bool {
    in_past(current, literal, minus_months)
}

fn days_in_past(current: Option<&Value>, literal: &str) -> bool {
    in_past(current, literal, minus_days)
}

fn years_in_future(current: Option<&Value>, literal: &str) -> bool {
    in_future(current, literal, plus_years)
}

fn months_in_future(current: Option<&Value>, literal: &str) -> bool {
    in_future(current, literal, plus_months)
}

fn days_in_future(current: Option<&Value>, literal: &str) -> bool {
    in_future(current, literal, plus_days)
}

pub(super) fn operators() -> &'static OperatorTable {
    static TABLE: Lazy<OperatorTable> = Lazy::new(|| {
        BTreeMap::from([
            (ConditionOperator::Equals, equals as OperatorFn),
            (ConditionOperator::NotEquals, not_equals),
            (ConditionOperator::LessThan, less_than),
            (ConditionOperator::LessThanOrEqual, less_than_or_equal),
            (ConditionOperator::GreaterThan, greater_than),
            (ConditionOperator::GreaterThanOrEqual, greater_than_or_equal),
            (ConditionOperator::Empty, empty),
            (ConditionOperator::NotEmpty, not_empty),
            (ConditionOperator::YearsInPast, years_in_past),
            (ConditionOperator::MonthsInPast, months_in_past),
            (ConditionOperator::DaysInPast, days_in_past),
            (ConditionOperator::YearsInFuture, years_in_future),
            (ConditionOperator::MonthsInFuture, months_in_future),
            (ConditionOperator::DaysInFuture, days_in_future),
        ])
    });
    &TABLE
}
