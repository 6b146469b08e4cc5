use std::collections::BTreeMap;

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use serde_json::Value;

use flowform_spec::ConditionOperator;

use super::{OperatorFn, OperatorTable};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Accepts `HH:MM` or an ISO timestamp (the date part is ignored) and
/// normalizes to minutes since midnight.
pub(crate) fn parse_time_text(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    if let Ok(time) = NaiveTime::parse_from_str(trimmed, "%H:%M") {
        return Some(minutes(time));
    }
    if let Ok(stamp) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(minutes(stamp.time()));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|stamp| minutes(stamp.time()))
}

fn minutes(time: NaiveTime) -> u32 {
    (time.hour() * 60 + time.minute()) % MINUTES_PER_DAY
}

fn parse_current(current: Option<&Value>) -> Option<u32> {
    current.and_then(Value::as_str).and_then(parse_time_text)
}

fn compare(current: Option<&Value>, literal: &str, accept: fn(u32, u32) -> bool) -> bool {
    let (Some(current), Some(literal)) = (parse_current(current), parse_time_text(literal)) else {
        return false;
    };
    accept(current, literal)
}

fn equals(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a == b)
}

fn not_equals(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a != b)
}

fn less_than(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a < b)
}

fn less_than_or_equal(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a <= b)
}

fn greater_than(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a > b)
}

fn greater_than_or_equal(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a >= b)
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
        ])
    });
    &TABLE
}
