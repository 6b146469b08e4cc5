use serde_json::Value;

use flowform_spec::{Element, ElementType};

pub(super) fn check(kind: ElementType, element: &Element, value: Option<&Value>) -> Option<String> {
    match kind {
        ElementType::Radio | ElementType::Select => check_single(element, value),
        ElementType::MultiCheckbox => check_multi(element, value),
        // a checkbox has no structural constraints beyond required-ness
        _ => None,
    }
}

fn check_single(element: &Element, value: Option<&Value>) -> Option<String> {
    let text = value.and_then(Value::as_str).filter(|text| !text.is_empty())?;
    let options = element.options.as_ref()?;
    if !options.iter().any(|option| option == text) {
        return Some("selected option is not available".into());
    }
    None
}

fn check_multi(element: &Element, value: Option<&Value>) -> Option<String> {
    let Some(selected) = value.and_then(Value::as_array) else {
        return None;
    };
    if let Some(options) = &element.options {
        let unknown = selected.iter().filter_map(Value::as_str).any(|item| {
            !options.iter().any(|option| option == item)
        });
        if unknown {
            return Some("selected option is not available".into());
        }
    }
    if let Some(constraint) = &element.constraint {
        if let Some(min) = constraint.min_selected
            && selected.len() < min
        {
            return Some("not enough options selected".into());
        }
        if let Some(max) = constraint.max_selected
            && selected.len() > max
        {
            return Some("too many options selected".into());
        }
    }
    None
}
