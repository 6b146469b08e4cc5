use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use flowform_spec::ConditionOperator;

use super::{OperatorFn, OperatorTable};

/// A replicating container's value is the list of its instance ids.
fn current_len(current: Option<&Value>) -> i64 {
    current
        .and_then(Value::as_array)
        .map(|items| items.len() as i64)
        .unwrap_or(0)
}

/// Literal coercion: an array counts its elements, a number is itself, a
/// numeric string parses, anything else is 0.
fn literal_len(literal: &str) -> i64 {
    match serde_json::from_str::<Value>(literal.trim()) {
        Ok(Value::Array(items)) => items.len() as i64,
        Ok(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64))
            .unwrap_or(0),
        Ok(Value::String(text)) => text.trim().parse().unwrap_or(0),
        _ => literal.trim().parse().unwrap_or(0),
    }
}

fn compare(current: Option<&Value>, literal: &str, accept: fn(i64, i64) -> bool) -> bool {
    accept(current_len(current), literal_len(literal))
}

fn length_equals(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a == b)
}

fn length_not_equals(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a != b)
}

fn length_less_than(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a < b)
}

fn length_less_than_or_equal(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a <= b)
}

fn length_greater_than(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a > b)
}

fn length_greater_than_or_equal(current: Option<&Value>, literal: &str) -> bool {
    compare(current, literal, |a, b| a >= b)
}

pub(super) fn operators() -> &'static OperatorTable {
    static TABLE: Lazy<OperatorTable> = Lazy::new(|| {
        BTreeMap::from([
            (
                ConditionOperator::ReplicatingListLengthEquals,
                length_equals as OperatorFn,
            ),
            (
                ConditionOperator::ReplicatingListLengthNotEquals,
                length_not_equals,
            ),
            (
                ConditionOperator::ReplicatingListLengthLessThan,
                length_less_than,
            ),
            (
                ConditionOperator::ReplicatingListLengthLessThanOrEqual,
                length_less_than_or_equal,
            ),
            (
                ConditionOperator::ReplicatingListLengthGreaterThan,
                length_greater_than,
            ),
            (
                ConditionOperator::ReplicatingListLengthGreaterThanOrEqual,
                length_greater_than_or_equal,
            ),
        ])
    });
    &TABLE
}
