use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::condition::ConditionSet;
use crate::element::{ElementId, ElementPatch};
use crate::expr::Expr;

/// Aspect a function is attached for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    Visibility,
    Override,
    Validation,
    Value,
}

impl FunctionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FunctionKind::Visibility => "visibility",
            FunctionKind::Override => "override",
            FunctionKind::Validation => "validation",
            FunctionKind::Value => "value",
        }
    }
}

/// Opaque user-authored scripting body. The engine never interprets it; it is
/// handed verbatim to the host's code port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CodeRef {
    pub code: String,
}

/// Rejected function shapes at the deserialization boundary.
#[derive(Debug, Error)]
pub enum FunctionShapeError {
    #[error("function has no representation (expected conditions, expression, or code)")]
    Missing,
    #[error("function mixes more than one representation")]
    Ambiguous,
}

/// The one representation a function uses: declarative conditions, a typed
/// expression tree, or an opaque scripting body. The three are mutually
/// exclusive; deserialization rejects anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "RawFunctionBody", into = "RawFunctionBody")]
pub enum FunctionBody {
    Conditions(ConditionSet),
    Expression(Expr),
    Code(CodeRef),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawFunctionBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conditions: Option<ConditionSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expression: Option<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    code: Option<CodeRef>,
}

impl TryFrom<RawFunctionBody> for FunctionBody {
    type Error = FunctionShapeError;

    fn try_from(raw: RawFunctionBody) -> Result<Self, Self::Error> {
        match (raw.conditions, raw.expression, raw.code) {
            (Some(set), None, None) => Ok(FunctionBody::Conditions(set)),
            (None, Some(expr), None) => Ok(FunctionBody::Expression(expr)),
            (None, None, Some(code)) => Ok(FunctionBody::Code(code)),
            (None, None, None) => Err(FunctionShapeError::Missing),
            _ => Err(FunctionShapeError::Ambiguous),
        }
    }
}

impl From<FunctionBody> for RawFunctionBody {
    fn from(body: FunctionBody) -> Self {
        match body {
            FunctionBody::Conditions(set) => RawFunctionBody {
                conditions: Some(set),
                ..RawFunctionBody::default()
            },
            FunctionBody::Expression(expr) => RawFunctionBody {
                expression: Some(expr),
                ..RawFunctionBody::default()
            },
            FunctionBody::Code(code) => RawFunctionBody {
                code: Some(code),
                ..RawFunctionBody::default()
            },
        }
    }
}

/// Boolean-producing function, attached for the visibility and validation
/// aspects. `references` is the statically-recorded list of element ids the
/// body reads, maintained by the editors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PredicateFunction {
    #[serde(flatten)]
    pub body: FunctionBody,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ElementId>,
}

impl PredicateFunction {
    pub fn conditions(set: ConditionSet) -> Self {
        Self {
            body: FunctionBody::Conditions(set),
            references: Vec::new(),
        }
    }

    pub fn expression(expr: Expr) -> Self {
        Self {
            body: FunctionBody::Expression(expr),
            references: Vec::new(),
        }
    }

    pub fn code(code: impl Into<String>) -> Self {
        Self {
            body: FunctionBody::Code(CodeRef { code: code.into() }),
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<ElementId>) -> Self {
        self.references = references;
        self
    }
}

/// Value-computing function. Condition-based bodies yield `on_match` when the
/// set is satisfied; expression bodies yield the expression result; code
/// bodies yield whatever the host returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValueFunction {
    #[serde(flatten)]
    pub body: FunctionBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_match: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ElementId>,
}

impl ValueFunction {
    pub fn conditions(set: ConditionSet, on_match: Value) -> Self {
        Self {
            body: FunctionBody::Conditions(set),
            on_match: Some(on_match),
            references: Vec::new(),
        }
    }

    pub fn expression(expr: Expr) -> Self {
        Self {
            body: FunctionBody::Expression(expr),
            on_match: None,
            references: Vec::new(),
        }
    }

    pub fn code(code: impl Into<String>) -> Self {
        Self {
            body: FunctionBody::Code(CodeRef { code: code.into() }),
            on_match: None,
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<ElementId>) -> Self {
        self.references = references;
        self
    }
}

/// Structural-override function producing an [`ElementPatch`] overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OverrideFunction {
    #[serde(flatten)]
    pub body: FunctionBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_match: Option<ElementPatch>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<ElementId>,
}

impl OverrideFunction {
    pub fn conditions(set: ConditionSet, on_match: ElementPatch) -> Self {
        Self {
            body: FunctionBody::Conditions(set),
            on_match: Some(on_match),
            references: Vec::new(),
        }
    }

    pub fn code(code: impl Into<String>) -> Self {
        Self {
            body: FunctionBody::Code(CodeRef { code: code.into() }),
            on_match: None,
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<ElementId>) -> Self {
        self.references = references;
        self
    }
}
