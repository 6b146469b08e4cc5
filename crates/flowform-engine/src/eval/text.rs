use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use flowform_spec::ConditionOperator;

use super::{OperatorFn, OperatorTable};

/// A missing or null current value counts as the empty string; any other
/// non-string value makes the condition false.
fn current_text(current: Option<&Value>) -> Option<&str> {
    match current {
        None | Some(Value::Null) => Some(""),
        Some(Value::String(text)) => Some(text),
        Some(_) => None,
    }
}

fn with_text(current: Option<&Value>, literal: &str, accept: fn(&str, &str) -> bool) -> bool {
    match current_text(current) {
        Some(text) => accept(text, literal),
        None => false,
    }
}

fn equals(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| text == literal)
}

fn not_equals(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| text != literal)
}

fn equals_ignore_case(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| {
        text.to_lowercase() == literal.to_lowercase()
    })
}

fn not_equals_ignore_case(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| {
        text.to_lowercase() != literal.to_lowercase()
    })
}

fn includes(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| text.contains(literal))
}

fn not_includes(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| !text.contains(literal))
}

fn starts_with(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| text.starts_with(literal))
}

fn not_starts_with(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| !text.starts_with(literal))
}

fn ends_with(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| text.ends_with(literal))
}

fn not_ends_with(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| !text.ends_with(literal))
}

/// `MatchesPattern` anchors the literal; an invalid pattern makes the
/// condition false rather than failing the derivation.
fn matches_pattern(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| {
        match Regex::new(&format!("^(?:{literal})$")) {
            Ok(regex) => regex.is_match(text),
            Err(_) => false,
        }
    })
}

fn not_matches_pattern(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| {
        match Regex::new(&format!("^(?:{literal})$")) {
            Ok(regex) => !regex.is_match(text),
            Err(_) => false,
        }
    })
}

fn includes_pattern(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| match Regex::new(literal) {
        Ok(regex) => regex.is_match(text),
        Err(_) => false,
    })
}

fn not_includes_pattern(current: Option<&Value>, literal: &str) -> bool {
    with_text(current, literal, |text, literal| match Regex::new(literal) {
        Ok(regex) => !regex.is_match(text),
        Err(_) => false,
    })
}

fn empty(current: Option<&Value>, _literal: &str) -> bool {
    matches!(current_text(current), Some(text) if text.is_empty())
}

fn not_empty(current: Option<&Value>, _literal: &str) -> bool {
    matches!(current_text(current), Some(text) if !text.is_empty())
}

pub(super) fn operators() -> &'static OperatorTable {
    static TABLE: Lazy<OperatorTable> = Lazy::new(|| {
        BTreeMap::from([
            (ConditionOperator::Equals, equals as OperatorFn),
            (ConditionOperator::NotEquals, not_equals),
            (ConditionOperator::EqualsIgnoreCase, equals_ignore_case),
            (ConditionOperator::NotEqualsIgnoreCase, not_equals_ignore_case),
            (ConditionOperator::Includes, includes),
            (ConditionOperator::NotIncludes, not_includes),
            (ConditionOperator::StartsWith, starts_with),
            (ConditionOperator::NotStartsWith, not_starts_with),
            (ConditionOperator::EndsWith, ends_with),
            (ConditionOperator::NotEndsWith, not_ends_with),
            (ConditionOperator::MatchesPattern, matches_pattern),
            (ConditionOperator::NotMatchesPattern, not_matches_pattern),
            (ConditionOperator::IncludesPattern, includes_pattern),
            (ConditionOperator::NotIncludesPattern, not_includes_pattern),
            (ConditionOperator::Empty, empty),
            (ConditionOperator::NotEmpty, not_empty),
        ])
    });
    &TABLE
}
