use regex::Regex;
use serde_json::Value;

use flowform_spec::{Element, ElementType};

use super::NUMERIC_LIMIT;
use crate::eval::{date, time};

pub(super) fn check(kind: ElementType, element: &Element, value: Option<&Value>) -> Option<String> {
    match kind {
        ElementType::Text => check_text(element, value),
        ElementType::Number => check_number(element, value),
        ElementType::Date => check_date(value),
        ElementType::Time => check_time(value),
        _ => None,
    }
}

fn check_text(element: &Element, value: Option<&Value>) -> Option<String> {
    let Some(text) = value.and_then(Value::as_str) else {
        return None;
    };
    let constraint = element.constraint.as_ref()?;
    if let Some(min) = constraint.min_len
        && text.chars().count() < min
    {
        return Some("input is shorter than the minimum length".into());
    }
    if let Some(max) = constraint.max_len
        && text.chars().count() > max
    {
        return Some("input is longer than the maximum length".into());
    }
    if let Some(pattern) = &constraint.pattern
        && let Ok(regex) = Regex::new(pattern)
        && !regex.is_match(text)
    {
        return Some("input does not match the expected pattern".into());
    }
    None
}

fn check_number(element: &Element, value: Option<&Value>) -> Option<String> {
    let value = value.filter(|value| !value.is_null())?;
    let Some(number) = value.as_f64() else {
        return Some("a number is required".into());
    };
    if !number.is_finite() || !(-NUMERIC_LIMIT..=NUMERIC_LIMIT).contains(&number) {
        return Some("number is outside the storable range".into());
    }
    if let Some(constraint) = &element.constraint {
        if let Some(min) = constraint.min
            && number < min
        {
            return Some("number is below the minimum".into());
        }
        if let Some(max) = constraint.max
            && number > max
        {
            return Some("number is above the maximum".into());
        }
    }
    None
}

fn check_date(value: Option<&Value>) -> Option<String> {
    let value = value.filter(|value| !value.is_null())?;
    match value.as_str() {
        Some(text) if text.trim().is_empty() => None,
        Some(text) if date::parse_date_text(text).is_some() => None,
        _ => Some("not a valid date".into()),
    }
}

fn check_time(value: Option<&Value>) -> Option<String> {
    let value = value.filter(|value| !value.is_null())?;
    match value.as_str() {
        Some(text) if text.trim().is_empty() => None,
        Some(text) if time::parse_time_text(text).is_some() => None,
        _ => Some("not a valid time".into()),
    }
}
