use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use flowform_spec::ConditionOperator;

use super::{OperatorFn, OperatorTable};

/// The two fixed display literals a checkbox condition may carry.
const CHECKED_LITERAL: &str = "Ja (True)";
const UNCHECKED_LITERAL: &str = "Nein (False)";

/// An absent checkbox value counts as unchecked.
fn current_flag(current: Option<&Value>) -> bool {
    current.and_then(Value::as_bool).unwrap_or(false)
}

fn literal_flag(literal: &str) -> Option<bool> {
    match literal.trim() {
        CHECKED_LITERAL => Some(true),
        UNCHECKED_LITERAL => Some(false),
        _ => None,
    }
}

fn checkbox_equals(current: Option<&Value>, literal: &str) -> bool {
    literal_flag(literal) == Some(current_flag(current))
}

fn checkbox_not_equals(current: Option<&Value>, literal: &str) -> bool {
    matches!(literal_flag(literal), Some(flag) if flag != current_flag(current))
}

pub(super) fn checkbox_operators() -> &'static OperatorTable {
    static TABLE: Lazy<OperatorTable> = Lazy::new(|| {
        BTreeMap::from([
            (ConditionOperator::Equals, checkbox_equals as OperatorFn),
            (ConditionOperator::NotEquals, checkbox_not_equals),
        ])
    });
    &TABLE
}

fn current_choice(current: Option<&Value>) -> Option<&str> {
    match current {
        None | Some(Value::Null) => Some(""),
        Some(Value::String(text)) => Some(text),
        Some(_) => None,
    }
}

/// Select and radio compare the stored option string verbatim.
fn choice_equals(current: Option<&Value>, literal: &str) -> bool {
    current_choice(current) == Some(literal)
}

fn choice_not_equals(current: Option<&Value>, literal: &str) -> bool {
    matches!(current_choice(current), Some(text) if text != literal)
}

fn choice_empty(current: Option<&Value>, _literal: &str) -> bool {
    matches!(current_choice(current), Some(text) if text.is_empty())
}

fn choice_not_empty(current: Option<&Value>, _literal: &str) -> bool {
    matches!(current_choice(current), Some(text) if !text.is_empty())
}

pub(super) fn single_choice_operators() -> &'static OperatorTable {
    static TABLE: Lazy<OperatorTable> = Lazy::new(|| {
        BTreeMap::from([
            (ConditionOperator::Equals, choice_equals as OperatorFn),
            (ConditionOperator::NotEquals, choice_not_equals),
            (ConditionOperator::Empty, choice_empty),
            (ConditionOperator::NotEmpty, choice_not_empty),
        ])
    });
    &TABLE
}

fn current_set(current: Option<&Value>) -> Vec<&str> {
    current
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// The literal may be a single option or a JSON array of options; the
/// condition holds when every literal member is selected.
fn literal_items(literal: &str) -> Vec<String> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(literal) {
        return items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
    }
    vec![literal.to_string()]
}

fn multi_includes(current: Option<&Value>, literal: &str) -> bool {
    let selected = current_set(current);
    let wanted = literal_items(literal);
    !wanted.is_empty() && wanted.iter().all(|item| selected.contains(&item.as_str()))
}

fn multi_not_includes(current: Option<&Value>, literal: &str) -> bool {
    !multi_includes(current, literal)
}

fn multi_empty(current: Option<&Value>, _literal: &str) -> bool {
    current_set(current).is_empty()
}

fn multi_not_empty(current: Option<&Value>, _literal: &str) -> bool {
    !current_set(current).is_empty()
}

pub(super) fn multi_choice_operators() -> &'static OperatorTable {
    static TABLE: Lazy<OperatorTable> = Lazy::new(|| {
        BTreeMap::from([
            (ConditionOperator::Includes, multi_includes as OperatorFn),
            (ConditionOperator::NotIncludes, multi_not_includes),
            (ConditionOperator::Empty, multi_empty),
            (ConditionOperator::NotEmpty, multi_not_empty),
        ])
    });
    &TABLE
}
