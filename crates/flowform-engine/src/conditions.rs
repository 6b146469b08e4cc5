use serde_json::Value;

use flowform_spec::{Condition, ConditionSet, ElementType, SetOperator};

use crate::eval;

/// Resolves a condition reference to the referenced element's kind and
/// current value. A `None` result means the reference dangles; the condition
/// reading it is then not satisfied.
pub trait ValueResolver {
    fn resolve(&self, reference: &str) -> Option<(ElementType, Option<Value>)>;
}

impl<F> ValueResolver for F
where
    F: Fn(&str) -> Option<(ElementType, Option<Value>)>,
{
    fn resolve(&self, reference: &str) -> Option<(ElementType, Option<Value>)> {
        self(reference)
    }
}

/// Outcome of checking a condition set.
///
/// `unmet_messages` aggregates, in document order, the
/// `condition_unmet_message` of every failing leaf and the
/// `condition_set_unmet_message` of every failing nested set (falling back to
/// the nested set's own collected messages when it carries none). Empty when
/// the set is satisfied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetOutcome {
    pub satisfied: bool,
    pub unmet_messages: Vec<String>,
}

impl SetOutcome {
    /// The first collected message, for callers that surface a single one.
    pub fn first_message(&self) -> Option<&str> {
        self.unmet_messages.first().map(String::as_str)
    }
}

/// Evaluates a condition set to a plain boolean.
pub fn evaluate_condition_set(set: &ConditionSet, resolver: &dyn ValueResolver) -> bool {
    check_condition_set(set, resolver).satisfied
}

/// Recursively evaluates a condition set, collecting unmet messages.
///
/// An empty set is satisfied under both operators: vacuously for `All`, and
/// by explicit policy for `Any` (no conditions configured means no
/// restriction).
pub fn check_condition_set(set: &ConditionSet, resolver: &dyn ValueResolver) -> SetOutcome {
    let mut unmet = Vec::new();
    let mut results = Vec::new();

    for condition in &set.conditions {
        let satisfied = check_condition(condition, resolver);
        if !satisfied && !condition.condition_unmet_message.is_empty() {
            unmet.push(condition.condition_unmet_message.clone());
        }
        results.push(satisfied);
    }
    for nested in &set.condition_sets {
        let outcome = check_condition_set(nested, resolver);
        if !outcome.satisfied {
            if nested.condition_set_unmet_message.is_empty() {
                unmet.extend(outcome.unmet_messages.iter().cloned());
            } else {
                unmet.push(nested.condition_set_unmet_message.clone());
            }
        }
        results.push(outcome.satisfied);
    }

    let satisfied = match set.operator {
        SetOperator::All => results.iter().all(|satisfied| *satisfied),
        SetOperator::Any => results.is_empty() || results.iter().any(|satisfied| *satisfied),
    };

    SetOutcome {
        satisfied,
        unmet_messages: if satisfied { Vec::new() } else { unmet },
    }
}

fn check_condition(condition: &Condition, resolver: &dyn ValueResolver) -> bool {
    let Some((kind, current)) = resolver.resolve(&condition.reference) else {
        log::debug!(
            "condition references unknown element '{}'; treating as not satisfied",
            condition.reference
        );
        return false;
    };
    eval::apply_operator(kind, condition.operator, current.as_ref(), &condition.value)
        .is_satisfied()
}
