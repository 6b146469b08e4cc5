use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementId};
use crate::function::FunctionKind;
use crate::walk::{Flattened, flatten_with_parents};

/// A recorded dependency edge: evaluating `source`'s `kind` function reads
/// `target`'s current value.
///
/// Both endpoints are annotated with their nearest enclosing step so that
/// dependencies can be grouped by page; a step referencing another element is
/// its own step (`source_is_step`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Reference {
    pub source: ElementId,
    pub target: ElementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_step: Option<ElementId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_step: Option<ElementId>,
    pub kind: FunctionKind,
    pub is_same_step: bool,
    pub source_is_step: bool,
}

/// Scans the tree for cross-element references attached to any aspect
/// function and materializes the dependency graph in the design-time
/// (unqualified) id space.
///
/// Edges whose target id does not resolve, or where neither endpoint lies
/// inside a step, are dropped with a logged warning. The result is
/// de-duplicated on `(source, target, kind)` and sorted for deterministic
/// display.
pub fn collect_references(elements: &[Element]) -> Vec<Reference> {
    let flattened = flatten_with_parents(elements);
    let mut seen: BTreeSet<(ElementId, ElementId, FunctionKind)> = BTreeSet::new();
    let mut out = Vec::new();

    for entry in &flattened {
        for (kind, references) in attached_references(entry.element) {
            for target_id in references {
                if seen.contains(&(entry.element.id.clone(), target_id.clone(), kind)) {
                    continue;
                }
                let Some(target) = flattened.iter().find(|f| f.element.id == *target_id) else {
                    log::warn!(
                        "dropping {} reference from '{}': no element '{}' in the tree",
                        kind.as_str(),
                        entry.element.id,
                        target_id
                    );
                    continue;
                };
                let source_step = enclosing_step(entry);
                let target_step = enclosing_step(target);
                if source_step.is_none() && target_step.is_none() {
                    log::warn!(
                        "dropping {} reference from '{}' to '{}': neither endpoint is inside a step",
                        kind.as_str(),
                        entry.element.id,
                        target_id
                    );
                    continue;
                }
                seen.insert((entry.element.id.clone(), target_id.clone(), kind));
                let is_same_step = source_step.is_some() && source_step == target_step;
                out.push(Reference {
                    source: entry.element.id.clone(),
                    target: target_id.clone(),
                    source_step,
                    target_step,
                    kind,
                    is_same_step,
                    source_is_step: entry.element.kind.is_step(),
                });
            }
        }
    }

    out.sort_by(|a, b| {
        (a.source.as_str(), a.target.as_str(), a.kind)
            .cmp(&(b.source.as_str(), b.target.as_str(), b.kind))
    });
    out
}

fn attached_references(element: &Element) -> Vec<(FunctionKind, &[ElementId])> {
    let mut out = Vec::new();
    if let Some(function) = &element.visibility {
        out.push((FunctionKind::Visibility, function.references.as_slice()));
    }
    if let Some(function) = &element.override_fn {
        out.push((FunctionKind::Override, function.references.as_slice()));
    }
    if let Some(function) = &element.validation {
        out.push((FunctionKind::Validation, function.references.as_slice()));
    }
    if let Some(function) = &element.value {
        out.push((FunctionKind::Value, function.references.as_slice()));
    }
    out
}

fn enclosing_step(entry: &Flattened<'_>) -> Option<ElementId> {
    if entry.element.kind.is_step() {
        return Some(entry.element.id.clone());
    }
    entry
        .parents
        .iter()
        .rev()
        .find(|parent| parent.kind.is_step())
        .map(|parent| parent.id.clone())
}
