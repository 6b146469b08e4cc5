use crate::element::{Element, ElementType};

/// Traversal options for [`flatten`].
///
/// `skip_replicating_children` keeps a replicating container in the output
/// but leaves its template subtree out, so that views listing "available
/// elements" do not leak per-instance duplicate ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenOptions {
    pub skip_replicating_children: bool,
}

/// Pre-order flattening of an element tree; every node appears exactly once,
/// parents before children.
pub fn flatten(elements: &[Element], options: FlattenOptions) -> Vec<&Element> {
    let mut out = Vec::new();
    for element in elements {
        push_subtree(element, options, &mut out);
    }
    out
}

fn push_subtree<'a>(element: &'a Element, options: FlattenOptions, out: &mut Vec<&'a Element>) {
    out.push(element);
    if options.skip_replicating_children && element.kind == ElementType::Replicating {
        return;
    }
    for child in &element.children {
        push_subtree(child, options, out);
    }
}

/// One entry of a parent-annotated flattening. `parents` runs from the root
/// down; the nearest ancestor is last.
#[derive(Debug, Clone)]
pub struct Flattened<'a> {
    pub element: &'a Element,
    pub parents: Vec<&'a Element>,
}

/// Pre-order flattening that records every node's ancestor chain.
pub fn flatten_with_parents(elements: &[Element]) -> Vec<Flattened<'_>> {
    let mut out = Vec::new();
    let mut trail = Vec::new();
    for element in elements {
        push_with_parents(element, &mut trail, &mut out);
    }
    out
}

fn push_with_parents<'a>(
    element: &'a Element,
    trail: &mut Vec<&'a Element>,
    out: &mut Vec<Flattened<'a>>,
) {
    out.push(Flattened {
        element,
        parents: trail.clone(),
    });
    trail.push(element);
    for child in &element.children {
        push_with_parents(child, trail, out);
    }
    trail.pop();
}

/// Finds an element anywhere in the tree by its (unqualified) id.
pub fn find<'a>(elements: &'a [Element], id: &str) -> Option<&'a Element> {
    for element in elements {
        if element.id == id {
            return Some(element);
        }
        if let Some(found) = find(&element.children, id) {
            return Some(found);
        }
    }
    None
}
