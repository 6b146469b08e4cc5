use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use flowform_spec::ConditionOperator;

use super::{OperatorFn, OperatorTable};

/// Parses a numeric literal. Plain decimals (`3.5`, `-12`) pass through;
/// anything else is read with grouping dots and a decimal comma, so
/// `"1.234,56"` parses to `1234.56`.
pub(crate) fn parse_number_literal(literal: &str) -> Option<f64> {
    let trimmed = literal.trim();
    if trimmed.is_empty() {
        return None;
    }
    if is_plain_decimal(trimmed) {
        return trimmed.parse().ok();
    }
    let normalized = trimmed.replace('.', "").replace(',', ".");
    normalized.parse().ok().filter(|value: &f64| value.is_finite())
}

fn is_plain_decimal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();
    !int_part.is_empty()
        && int_part.chars().all(|c| c.is_ascii_digit())
        && frac_part.is_none_or(|frac| {
            !frac.is_empty() && frac.chars().all(|c| c.is_ascii_digit())
        })
}

fn parse_current(current: Option<&Value>) -> Option<f64> {
    current.and_then(Value::as_f64).filter(|value| value.is_finite())
}

fn compare(current: Option<&Value>, literal: &str, accept: fn(f64, f64) -> bool) -> bool {
    let (Some(current), Some(literal)) = (parse_current(current), parse_number_literal(literal))
    else {
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

/// `Empty` is "no usable number": absent, null, or not a finite number.
fn empty(current: Option<&Value>, _literal: &str) -> bool {
    parse_current(current).is_none()
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
