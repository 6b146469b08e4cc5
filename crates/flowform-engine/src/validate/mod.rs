use serde_json::Value;

use flowform_spec::{Element, ElementType, FunctionBody, walk};

use crate::conditions::{ValueResolver, check_condition_set};
use crate::ports::NullCodeHost;
use crate::visibility::{VisibilityFallback, resolve_visibility};

mod choice;
mod composite;
mod scalar;

/// Hard bound protecting downstream numeric storage: values outside
/// `[-2^31, 2^31]` are rejected regardless of configured constraints.
pub(crate) const NUMERIC_LIMIT: f64 = 2_147_483_648.0;

/// Validates one element against the current input; `None` means valid (or
/// nothing to validate).
///
/// Invisible elements are never validated. Code-based validation functions
/// are not invoked here; the derivation pass routes those through the host.
pub fn validate(
    kind: ElementType,
    all_elements: &[Element],
    id_prefix: &str,
    id: &str,
    element: &Element,
    input: &Value,
) -> Option<String> {
    if !kind.is_input() {
        return None;
    }
    let effective_id = effective_id(id_prefix, id);
    let resolver = resolver_over(all_elements, id_prefix, input);
    if !resolve_visibility(
        element,
        &effective_id,
        input,
        &resolver,
        &NullCodeHost,
        VisibilityFallback::Visible,
    ) {
        return None;
    }

    let value = lookup(input, &effective_id);
    if element.required && is_empty_value(kind, value) {
        return Some(required_message(kind).to_string());
    }

    let structural = match kind {
        ElementType::Text | ElementType::Number | ElementType::Date | ElementType::Time => {
            scalar::check(kind, element, value)
        }
        ElementType::Checkbox
        | ElementType::Radio
        | ElementType::Select
        | ElementType::MultiCheckbox => choice::check(kind, element, value),
        ElementType::Table | ElementType::FileUpload | ElementType::Replicating => {
            composite::check(kind, element, value)
        }
        ElementType::Step | ElementType::Group | ElementType::Content => None,
    };
    if structural.is_some() {
        return structural;
    }

    attached_validation(element, &resolver)
}

/// Evaluates a declarative validation function; the first collected unmet
/// message becomes the error.
fn attached_validation(element: &Element, resolver: &dyn ValueResolver) -> Option<String> {
    let function = element.validation.as_ref()?;
    match &function.body {
        FunctionBody::Conditions(set) => {
            let outcome = check_condition_set(set, resolver);
            if outcome.satisfied {
                None
            } else {
                Some(
                    outcome
                        .first_message()
                        .unwrap_or("input does not meet the configured conditions")
                        .to_string(),
                )
            }
        }
        FunctionBody::Expression(expr) => {
            let truthy = expr
                .truthiness(&|id: &str| resolver.resolve(id).and_then(|(_, value)| value));
            match truthy {
                Some(false) => Some("input does not meet the configured conditions".to_string()),
                _ => None,
            }
        }
        FunctionBody::Code(_) => None,
    }
}

pub(crate) fn effective_id(prefix: &str, id: &str) -> String {
    format!("{prefix}{id}")
}

pub(crate) fn lookup<'a>(input: &'a Value, key: &str) -> Option<&'a Value> {
    input.as_object().and_then(|map| map.get(key))
}

/// Resolver over the design-time tree and the (possibly instance-prefixed)
/// input: prefixed keys win over plain ones.
pub(crate) fn resolver_over<'a>(
    all_elements: &'a [Element],
    id_prefix: &'a str,
    input: &'a Value,
) -> impl ValueResolver + 'a {
    move |reference: &str| {
        let element = walk::find(all_elements, reference)?;
        let prefixed = effective_id(id_prefix, reference);
        let current = lookup(input, &prefixed)
            .or_else(|| lookup(input, reference))
            .cloned();
        Some((element.kind, current))
    }
}

/// Whether the value counts as "not provided" for a required check.
pub(crate) fn is_empty_value(kind: ElementType, value: Option<&Value>) -> bool {
    let Some(value) = value else {
        return true;
    };
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        // an unchecked required checkbox counts as missing
        Value::Bool(flag) => kind == ElementType::Checkbox && !flag,
        Value::Number(_) | Value::Object(_) => false,
    }
}

fn required_message(kind: ElementType) -> &'static str {
    match kind {
        ElementType::Checkbox => "this box must be checked",
        ElementType::Radio | ElementType::Select | ElementType::MultiCheckbox => {
            "a selection is required"
        }
        ElementType::FileUpload => "a file is required",
        ElementType::Table | ElementType::Replicating => "at least one entry is required",
        _ => "this field is required",
    }
}
