use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use flowform_spec::{
    Element, ElementPatch, ElementType, FunctionBody, FunctionKind, walk,
};

use crate::conditions::{ValueResolver, evaluate_condition_set};
use crate::ports::{CodeHost, CodeResult};
use crate::validate;

/// Derived snapshot of the whole tree for one input state. Keys are effective
/// (instance-qualified) element ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormState {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub visibilities: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<String, ElementPatch>,
}

impl FormState {
    /// Merges a newer derivation into this state: visibilities, values, and
    /// overrides are additive, the error map is replaced wholesale so stale
    /// errors never linger.
    pub fn merge(&mut self, newer: FormState) {
        self.visibilities.extend(newer.visibilities);
        self.values.extend(newer.values);
        self.overrides.extend(newer.overrides);
        self.errors = newer.errors;
    }
}

/// Non-fatal problems of one derivation pass, surfaced to the host for
/// logging. Everything else is recovered locally; one bad element never
/// aborts derivation of the rest of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// An opaque-code invocation failed; the aspect kept its prior result.
    CodeFunction {
        id: String,
        kind: FunctionKind,
        message: String,
    },
    /// Value functions did not settle within the visit budget; the listed
    /// elements kept their prior values.
    ValueCycle { ids: Vec<String> },
}

/// Result of one derivation pass.
#[derive(Debug, Clone, Default)]
pub struct Derivation {
    pub state: FormState,
    pub diagnostics: Vec<Diagnostic>,
}

/// One element scheduled for derivation, in its effective id space.
struct WorkItem<'a> {
    element: &'a Element,
    effective_id: String,
    prefix: String,
    parent_ids: Vec<String>,
}

/// Expands the tree into the instance-qualified work list, pre-order. Every
/// replicating container contributes its template subtree once per instance
/// id found in the input, each descendant addressed as
/// `instance_id + template_id`.
fn expand<'a>(
    elements: &'a [Element],
    prefix: &str,
    parents: &[String],
    input: &Value,
    out: &mut Vec<WorkItem<'a>>,
) {
    for element in elements {
        let effective_id = format!("{prefix}{}", element.id);
        out.push(WorkItem {
            element,
            effective_id: effective_id.clone(),
            prefix: prefix.to_string(),
            parent_ids: parents.to_vec(),
        });
        let mut child_parents = parents.to_vec();
        child_parents.push(effective_id.clone());
        if element.kind == ElementType::Replicating {
            for instance in instance_ids(input, &effective_id) {
                expand(&element.children, &instance, &child_parents, input, out);
            }
        } else {
            expand(&element.children, prefix, &child_parents, input, out);
        }
    }
}

fn instance_ids(input: &Value, container_id: &str) -> Vec<String> {
    input
        .as_object()
        .and_then(|map| map.get(container_id))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Resolver used during derivation: computed values win over raw input, and
/// instance-prefixed keys win over plain ones.
struct DeriveResolver<'a> {
    elements: &'a [Element],
    input: &'a Value,
    computed: &'a BTreeMap<String, Value>,
    prefix: &'a str,
}

impl DeriveResolver<'_> {
    fn current(&self, key: &str) -> Option<Value> {
        self.computed.get(key).cloned().or_else(|| {
            self.input
                .as_object()
                .and_then(|map| map.get(key))
                .cloned()
        })
    }
}

impl ValueResolver for DeriveResolver<'_> {
    fn resolve(&self, reference: &str) -> Option<(ElementType, Option<Value>)> {
        let element = walk::find(self.elements, reference)?;
        let prefixed = format!("{}{}", self.prefix, reference);
        let current = self.current(&prefixed).or_else(|| self.current(reference));
        Some((element.kind, current))
    }
}

/// Derives visibility, value, override, and error maps for the whole tree.
///
/// The pass is synchronous and deterministic over (tree, input, host). Code
/// invocation failures and unsettled value cycles are reported as
/// diagnostics; prior state fills the gaps they leave.
pub fn derive_form_state(
    tree: &[Element],
    input: &Value,
    prior: &FormState,
    host: &dyn CodeHost,
) -> Derivation {
    let mut diagnostics = Vec::new();
    let mut work = Vec::new();
    expand(tree, "", &[], input, &mut work);

    let mut state = FormState::default();

    // Visibility, parents first: a hidden container hides its whole subtree.
    for item in &work {
        let parent_hidden = item
            .parent_ids
            .iter()
            .any(|parent| state.visibilities.get(parent) == Some(&false));
        let visible = if parent_hidden {
            false
        } else {
            own_visibility(item, tree, input, prior, host, &mut diagnostics)
        };
        state.visibilities.insert(item.effective_id.clone(), visible);
    }

    state.values = derive_values(&work, tree, input, prior, host, &mut diagnostics);

    derive_overrides(&work, tree, input, &mut state, host, &mut diagnostics);

    let effective_input = overlay(input, &state.values);
    for item in &work {
        if !item.element.kind.is_input() {
            continue;
        }
        if state.visibilities.get(&item.effective_id) == Some(&false) {
            continue;
        }
        // an override patch takes effect before validation
        let patched;
        let element = match state.overrides.get(&item.effective_id) {
            Some(patch) => {
                patched = patch.apply_to(item.element);
                &patched
            }
            None => item.element,
        };
        let error = validate::validate(
            element.kind,
            tree,
            &item.prefix,
            &item.element.id,
            element,
            &effective_input,
        )
        .or_else(|| code_validation(item, element, &effective_input, host, &mut diagnostics));
        if let Some(message) = error {
            state.errors.insert(item.effective_id.clone(), message);
        }
    }

    Derivation { state, diagnostics }
}

fn own_visibility(
    item: &WorkItem<'_>,
    tree: &[Element],
    input: &Value,
    prior: &FormState,
    host: &dyn CodeHost,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let Some(function) = &item.element.visibility else {
        return true;
    };
    let resolver = DeriveResolver {
        elements: tree,
        input,
        computed: &prior.values,
        prefix: &item.prefix,
    };
    match &function.body {
        FunctionBody::Conditions(set) => evaluate_condition_set(set, &resolver),
        FunctionBody::Expression(expr) => expr
            .truthiness(&|id: &str| resolver.resolve(id).and_then(|(_, value)| value))
            .unwrap_or(true),
        FunctionBody::Code(code) => {
            match host.invoke(&code.code, input, item.element, &item.effective_id) {
                Ok(CodeResult::Bool(flag)) => flag,
                Ok(_) => prior_visibility(prior, &item.effective_id),
                Err(error) => {
                    log::warn!(
                        "visibility function for '{}' failed: {error}",
                        item.effective_id
                    );
                    diagnostics.push(Diagnostic::CodeFunction {
                        id: item.effective_id.clone(),
                        kind: FunctionKind::Visibility,
                        message: error.to_string(),
                    });
                    prior_visibility(prior, &item.effective_id)
                }
            }
        }
    }
}

/// Policy for an unanswerable code visibility: keep the prior verdict, else
/// stay visible.
fn prior_visibility(prior: &FormState, effective_id: &str) -> bool {
    prior
        .visibilities
        .get(effective_id)
        .copied()
        .unwrap_or(true)
}

/// Iterates the declarative value functions to a fixed point. Code-based
/// values are opaque to the iteration and computed once up front. The visit
/// budget caps re-evaluation: anything still changing when it runs out is
/// reported as a cycle and falls back to its prior value.
fn derive_values(
    work: &[WorkItem<'_>],
    tree: &[Element],
    input: &Value,
    prior: &FormState,
    host: &dyn CodeHost,
    diagnostics: &mut Vec<Diagnostic>,
) -> BTreeMap<String, Value> {
    let mut computed: BTreeMap<String, Value> = BTreeMap::new();

    let mut iterative: Vec<&WorkItem<'_>> = Vec::new();
    for item in work {
        let Some(function) = &item.element.value else {
            continue;
        };
        match &function.body {
            FunctionBody::Code(code) => {
                match host.invoke(&code.code, input, item.element, &item.effective_id) {
                    Ok(CodeResult::Value(value)) => {
                        computed.insert(item.effective_id.clone(), value);
                    }
                    Ok(CodeResult::Text(text)) => {
                        computed.insert(item.effective_id.clone(), Value::String(text));
                    }
                    Ok(CodeResult::Bool(flag)) => {
                        computed.insert(item.effective_id.clone(), Value::Bool(flag));
                    }
                    Ok(_) => {}
                    Err(error) => {
                        log::warn!(
                            "value function for '{}' failed: {error}",
                            item.effective_id
                        );
                        diagnostics.push(Diagnostic::CodeFunction {
                            id: item.effective_id.clone(),
                            kind: FunctionKind::Value,
                            message: error.to_string(),
                        });
                        if let Some(previous) = prior.values.get(&item.effective_id) {
                            computed.insert(item.effective_id.clone(), previous.clone());
                        }
                    }
                }
            }
            _ => iterative.push(item),
        }
    }

    let budget = iterative.len() + 1;
    let mut unsettled: BTreeSet<String> = BTreeSet::new();
    for _sweep in 0..budget {
        let mut changed: BTreeSet<String> = BTreeSet::new();
        let mut next = computed.clone();
        for item in &iterative {
            let resolver = DeriveResolver {
                elements: tree,
                input,
                computed: &computed,
                prefix: &item.prefix,
            };
            if let Some(value) = declarative_value(item, &resolver) {
                if computed.get(&item.effective_id) != Some(&value) {
                    changed.insert(item.effective_id.clone());
                }
                next.insert(item.effective_id.clone(), value);
            }
        }
        computed = next;
        unsettled = changed;
        if unsettled.is_empty() {
            break;
        }
    }

    if !unsettled.is_empty() {
        let ids: Vec<String> = unsettled.into_iter().collect();
        log::warn!(
            "value derivation did not settle for: {}",
            ids.join(", ")
        );
        for id in &ids {
            match prior.values.get(id) {
                Some(previous) => {
                    computed.insert(id.clone(), previous.clone());
                }
                None => {
                    computed.remove(id);
                }
            }
        }
        diagnostics.push(Diagnostic::ValueCycle { ids });
    }

    computed
}

fn declarative_value(item: &WorkItem<'_>, resolver: &DeriveResolver<'_>) -> Option<Value> {
    let function = item.element.value.as_ref()?;
    match &function.body {
        FunctionBody::Conditions(set) => {
            if evaluate_condition_set(set, resolver) {
                function.on_match.clone()
            } else {
                None
            }
        }
        FunctionBody::Expression(expr) => {
            expr.evaluate(&|id: &str| resolver.resolve(id).and_then(|(_, value)| value))
        }
        FunctionBody::Code(_) => None,
    }
}

fn derive_overrides(
    work: &[WorkItem<'_>],
    tree: &[Element],
    input: &Value,
    state: &mut FormState,
    host: &dyn CodeHost,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut forced_hidden: Vec<String> = Vec::new();

    for item in work {
        let Some(function) = &item.element.override_fn else {
            continue;
        };
        if state.visibilities.get(&item.effective_id) == Some(&false) {
            continue;
        }
        let resolver = DeriveResolver {
            elements: tree,
            input,
            computed: &state.values,
            prefix: &item.prefix,
        };
        let patch = match &function.body {
            FunctionBody::Conditions(set) => {
                if evaluate_condition_set(set, &resolver) {
                    function.on_match.clone()
                } else {
                    None
                }
            }
            FunctionBody::Expression(expr) => expr
                .evaluate(&|id: &str| resolver.resolve(id).and_then(|(_, value)| value))
                .and_then(|value| serde_json::from_value::<ElementPatch>(value).ok()),
            FunctionBody::Code(code) => {
                match host.invoke(&code.code, input, item.element, &item.effective_id) {
                    Ok(CodeResult::Patch(patch)) => Some(patch),
                    Ok(CodeResult::Value(value)) => serde_json::from_value(value).ok(),
                    Ok(_) => None,
                    Err(error) => {
                        log::warn!(
                            "override function for '{}' failed: {error}",
                            item.effective_id
                        );
                        diagnostics.push(Diagnostic::CodeFunction {
                            id: item.effective_id.clone(),
                            kind: FunctionKind::Override,
                            message: error.to_string(),
                        });
                        None
                    }
                }
            }
        };
        if let Some(patch) = patch
            && !patch.is_empty()
        {
            if patch.hidden == Some(true) {
                forced_hidden.push(item.effective_id.clone());
            }
            state.overrides.insert(item.effective_id.clone(), patch);
        }
    }

    // a hidden-override prunes the subtree just like a visibility function
    if !forced_hidden.is_empty() {
        for item in work {
            if forced_hidden.contains(&item.effective_id)
                || item
                    .parent_ids
                    .iter()
                    .any(|parent| forced_hidden.contains(parent))
            {
                state.visibilities.insert(item.effective_id.clone(), false);
            }
        }
    }
}

fn code_validation(
    item: &WorkItem<'_>,
    element: &Element,
    input: &Value,
    host: &dyn CodeHost,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let function = item.element.validation.as_ref()?;
    let FunctionBody::Code(code) = &function.body else {
        return None;
    };
    match host.invoke(&code.code, input, element, &item.effective_id) {
        Ok(CodeResult::Text(message)) if !message.is_empty() => Some(message),
        Ok(_) => None,
        Err(error) => {
            log::warn!(
                "validation function for '{}' failed: {error}",
                item.effective_id
            );
            diagnostics.push(Diagnostic::CodeFunction {
                id: item.effective_id.clone(),
                kind: FunctionKind::Validation,
                message: error.to_string(),
            });
            None
        }
    }
}

fn overlay(input: &Value, computed: &BTreeMap<String, Value>) -> Value {
    let mut map = input.as_object().cloned().unwrap_or_default();
    for (key, value) in computed {
        map.insert(key.clone(), value.clone());
    }
    Value::Object(map)
}
