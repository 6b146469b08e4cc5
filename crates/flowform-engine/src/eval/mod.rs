use std::collections::BTreeMap;

use serde_json::Value;

use flowform_spec::{ConditionOperator, ElementType};

pub(crate) mod choice;
pub(crate) mod date;
pub(crate) mod number;
pub(crate) mod replicating;
pub(crate) mod text;
pub(crate) mod time;

/// One operator implementation: the referenced element's current value (if
/// any) against the literal operand. Total: never panics, whatever the
/// inputs.
pub type OperatorFn = fn(Option<&Value>, &str) -> bool;

/// Operators available for one element kind.
pub type OperatorTable = BTreeMap<ConditionOperator, OperatorFn>;

/// Result of applying an operator through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalOutcome {
    Satisfied,
    Unsatisfied,
    /// The operator is not defined for the element kind. A configuration
    /// error, not a runtime one: callers treat it as "condition not met".
    Unsupported,
}

impl EvalOutcome {
    pub fn is_satisfied(self) -> bool {
        matches!(self, EvalOutcome::Satisfied)
    }
}

/// Looks up the operator table for an element kind, if the kind carries
/// comparable values at all.
pub fn operators(kind: ElementType) -> Option<&'static OperatorTable> {
    match kind {
        ElementType::Text => Some(text::operators()),
        ElementType::Number => Some(number::operators()),
        ElementType::Date => Some(date::operators()),
        ElementType::Time => Some(time::operators()),
        ElementType::Checkbox => Some(choice::checkbox_operators()),
        ElementType::Radio | ElementType::Select => Some(choice::single_choice_operators()),
        ElementType::MultiCheckbox => Some(choice::multi_choice_operators()),
        ElementType::Replicating => Some(replicating::operators()),
        ElementType::Table
        | ElementType::FileUpload
        | ElementType::Step
        | ElementType::Group
        | ElementType::Content => None,
    }
}

/// Applies `op` for `kind`, failing closed when the operator is not defined
/// for the kind.
pub fn apply_operator(
    kind: ElementType,
    op: ConditionOperator,
    current: Option<&Value>,
    literal: &str,
) -> EvalOutcome {
    let Some(table) = operators(kind) else {
        return EvalOutcome::Unsupported;
    };
    match table.get(&op) {
        Some(operator) => {
            if operator(current, literal) {
                EvalOutcome::Satisfied
            } else {
                EvalOutcome::Unsatisfied
            }
        }
        None => EvalOutcome::Unsupported,
    }
}
