#![allow(missing_docs)]

pub mod conditions;
pub mod derive;
pub mod eval;
pub mod ports;
pub mod validate;
pub mod visibility;

pub use conditions::{SetOutcome, ValueResolver, check_condition_set, evaluate_condition_set};
pub use derive::{Derivation, Diagnostic, FormState, derive_form_state};
pub use eval::{EvalOutcome, OperatorFn, OperatorTable, apply_operator, operators};
pub use ports::{
    CodeHost, CodeHostError, CodeResult, NullCodeHost, PassId, PassSequence, RemoteDeriveError,
    RemoteDeriver, RemoteScope,
};
pub use validate::validate;
pub use visibility::{VisibilityFallback, resolve_visibility};
