#![allow(missing_docs)]

pub mod condition;
pub mod element;
pub mod expr;
pub mod function;
pub mod reference;
pub mod walk;

pub use condition::{Condition, ConditionOperator, ConditionSet, SetOperator};
pub use element::{Constraint, Element, ElementId, ElementPatch, ElementType, TableColumn};
pub use expr::{Expr, WhenCase};
pub use function::{
    CodeRef, FunctionBody, FunctionKind, FunctionShapeError, OverrideFunction, PredicateFunction,
    ValueFunction,
};
pub use reference::{Reference, collect_references};
pub use walk::{FlattenOptions, Flattened, find, flatten, flatten_with_parents};
