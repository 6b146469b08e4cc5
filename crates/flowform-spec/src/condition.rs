use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::element::ElementId;

/// Boolean combinator applied to all children of a [`ConditionSet`].
///
/// Mixing `Any` and `All` within one set is not possible; nesting sets is the
/// way to combine them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SetOperator {
    Any,
    All,
}

/// Comparison between a referenced element's current value and a literal operand.
///
/// Which operators are meaningful depends on the referenced element's kind;
/// applying one outside its kind is a configuration error that evaluates to
/// "not satisfied".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    EqualsIgnoreCase,
    NotEqualsIgnoreCase,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Includes,
    NotIncludes,
    StartsWith,
    NotStartsWith,
    EndsWith,
    NotEndsWith,
    MatchesPattern,
    NotMatchesPattern,
    IncludesPattern,
    NotIncludesPattern,
    Empty,
    NotEmpty,
    YearsInPast,
    MonthsInPast,
    DaysInPast,
    YearsInFuture,
    MonthsInFuture,
    DaysInFuture,
    ReplicatingListLengthEquals,
    ReplicatingListLengthNotEquals,
    ReplicatingListLengthLessThan,
    ReplicatingListLengthLessThanOrEqual,
    ReplicatingListLengthGreaterThan,
    ReplicatingListLengthGreaterThanOrEqual,
}

/// Leaf comparison of the declarative condition language.
///
/// `value` is always carried as a string; the evaluator coerces it according
/// to the referenced element's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Condition {
    pub reference: ElementId,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition_unmet_message: String,
}

impl Condition {
    pub fn new(
        reference: impl Into<ElementId>,
        operator: ConditionOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            operator,
            value: value.into(),
            condition_unmet_message: String::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.condition_unmet_message = message.into();
        self
    }
}

/// Recursive boolean-combinator node: leaf conditions and nested sets reduced
/// with one operator.
///
/// A set with no conditions and no nested sets is satisfied under both
/// operators. For `All` this is vacuous truth; for `Any` it is the explicit
/// policy that an empty set means "no restriction configured".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionSet {
    pub operator: SetOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub condition_sets: Vec<ConditionSet>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub condition_set_unmet_message: String,
}

impl ConditionSet {
    pub fn new(operator: SetOperator) -> Self {
        Self {
            operator,
            conditions: Vec::new(),
            condition_sets: Vec::new(),
            condition_set_unmet_message: String::new(),
        }
    }

    pub fn any() -> Self {
        Self::new(SetOperator::Any)
    }

    pub fn all() -> Self {
        Self::new(SetOperator::All)
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_set(mut self, set: ConditionSet) -> Self {
        self.condition_sets.push(set);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.condition_set_unmet_message = message.into();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.condition_sets.is_empty()
    }
}
