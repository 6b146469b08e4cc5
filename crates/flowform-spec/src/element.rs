use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::function::{OverrideFunction, PredicateFunction, ValueFunction};

/// Identifier of an element, unique within one form tree.
///
/// Inside a replicated instance the effective id becomes
/// `instance_id + template_id`; the tree itself always stores template ids.
pub type ElementId = String;

/// Closed set of element kinds understood by the engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum ElementType {
    Text,
    Number,
    Date,
    Time,
    Checkbox,
    Radio,
    Select,
    MultiCheckbox,
    Table,
    FileUpload,
    Replicating,
    Step,
    Group,
    Content,
}

impl ElementType {
    /// Container kinds carry `children`.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            ElementType::Step | ElementType::Group | ElementType::Replicating
        )
    }

    /// Input kinds carry a value and are subject to validation.
    ///
    /// `Replicating` is both: it contains a template subtree and its own
    /// value is the list of instance ids.
    pub fn is_input(self) -> bool {
        !matches!(
            self,
            ElementType::Step | ElementType::Group | ElementType::Content
        )
    }

    /// Steps mark page boundaries in a multi-page form.
    pub fn is_step(self) -> bool {
        matches!(self, ElementType::Step)
    }
}

/// A column of a table element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableColumn {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// Optional structural constraints; which fields apply depends on the element kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_selected: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_selected: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<TableColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_files: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_records: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_records: Option<usize>,
}

/// One node of the form-definition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Element {
    pub id: ElementId,
    #[serde(rename = "type")]
    pub kind: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<PredicateFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<PredicateFunction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueFunction>,
    #[serde(rename = "override", default, skip_serializing_if = "Option::is_none")]
    pub override_fn: Option<OverrideFunction>,
}

impl Element {
    /// An element with the given id and kind and everything else empty.
    pub fn new(id: impl Into<ElementId>, kind: ElementType) -> Self {
        Self {
            id: id.into(),
            kind,
            label: None,
            required: false,
            children: Vec::new(),
            options: None,
            constraint: None,
            visibility: None,
            validation: None,
            value: None,
            override_fn: None,
        }
    }

    pub fn with_children(mut self, children: Vec<Element>) -> Self {
        self.children = children;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Partial element overlay produced by override functions.
///
/// Never written back into the tree; renderers and validators consult it as
/// an overlay on top of the original element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ElementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

impl ElementPatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.required.is_none()
            && self.options.is_none()
            && self.constraint.is_none()
            && self.hidden.is_none()
    }

    /// A copy of `element` with every populated patch field applied.
    pub fn apply_to(&self, element: &Element) -> Element {
        let mut patched = element.clone();
        if let Some(label) = &self.label {
            patched.label = Some(label.clone());
        }
        if let Some(required) = self.required {
            patched.required = required;
        }
        if let Some(options) = &self.options {
            patched.options = Some(options.clone());
        }
        if let Some(constraint) = &self.constraint {
            patched.constraint = Some(constraint.clone());
        }
        patched
    }
}
