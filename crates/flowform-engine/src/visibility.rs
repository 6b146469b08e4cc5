use serde_json::Value;

use flowform_spec::{Element, FunctionBody, PredicateFunction};

use crate::conditions::{ValueResolver, evaluate_condition_set};
use crate::ports::{CodeHost, CodeResult};

/// Result used when a visibility function cannot be evaluated (a failed
/// expression, or a code body the host yields no result for).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityFallback {
    Visible,
    Hidden,
}

impl VisibilityFallback {
    fn as_bool(self) -> bool {
        matches!(self, VisibilityFallback::Visible)
    }
}

/// Resolves one element's own visibility. An element without a visibility
/// function is visible; pruning by hidden ancestors is the orchestrator's
/// concern.
pub fn resolve_visibility(
    element: &Element,
    effective_id: &str,
    input: &Value,
    resolver: &dyn ValueResolver,
    host: &dyn CodeHost,
    fallback: VisibilityFallback,
) -> bool {
    let Some(function) = &element.visibility else {
        return true;
    };
    evaluate_predicate(function, element, effective_id, input, resolver, host)
        .unwrap_or_else(|| fallback.as_bool())
}

/// Boolean evaluation shared by the visibility and validation aspects.
/// `None` means the function could not produce a verdict.
pub(crate) fn evaluate_predicate(
    function: &PredicateFunction,
    element: &Element,
    effective_id: &str,
    input: &Value,
    resolver: &dyn ValueResolver,
    host: &dyn CodeHost,
) -> Option<bool> {
    match &function.body {
        FunctionBody::Conditions(set) => Some(evaluate_condition_set(set, resolver)),
        FunctionBody::Expression(expr) => {
            expr.truthiness(&|id: &str| resolver.resolve(id).and_then(|(_, value)| value))
        }
        FunctionBody::Code(code) => {
            match host.invoke(&code.code, input, element, effective_id) {
                Ok(CodeResult::Bool(flag)) => Some(flag),
                Ok(_) => None,
                Err(error) => {
                    log::warn!("code function for '{effective_id}' failed: {error}");
                    None
                }
            }
        }
    }
}
