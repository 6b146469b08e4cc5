use serde_json::Value;
use thiserror::Error;

use flowform_spec::{Element, ElementPatch};

use crate::derive::FormState;

/// Result of one opaque-code invocation. Which variants are meaningful
/// depends on the aspect: visibility expects `Bool`, validation `Text` or
/// `Null`, value any value, override `Patch`.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeResult {
    Bool(bool),
    Text(String),
    Value(Value),
    Patch(ElementPatch),
    Null,
}

/// Raised by a [`CodeHost`] when a scripting body cannot be run.
#[derive(Debug, Error)]
#[error("code function failed: {0}")]
pub struct CodeHostError(pub String);

/// Capability boundary for user-authored scripting bodies.
///
/// The engine hands `code` over verbatim and never interprets it; the host
/// chooses the execution strategy. A failure is caught at this boundary and
/// treated as "no result for this aspect".
pub trait CodeHost {
    fn invoke(
        &self,
        code: &str,
        data: &Value,
        element: &Element,
        id: &str,
    ) -> Result<CodeResult, CodeHostError>;
}

/// Host for forms without scripting: every invocation yields no result.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCodeHost;

impl CodeHost for NullCodeHost {
    fn invoke(
        &self,
        _code: &str,
        _data: &Value,
        _element: &Element,
        _id: &str,
    ) -> Result<CodeResult, CodeHostError> {
        Ok(CodeResult::Null)
    }
}

/// Step scope of one remote derivation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteScope {
    pub steps_to_validate: Vec<String>,
    pub steps_to_calculate_visibilities: Vec<String>,
    pub steps_to_calculate_values: Vec<String>,
    pub steps_to_calculate_overrides: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RemoteDeriveError {
    /// The remote call failed; the caller keeps its prior state and surfaces
    /// the message, derivation of the rest of the form is unaffected.
    #[error("remote derivation failed: {0}")]
    Failed(String),
}

/// Out-of-process derivation boundary: one logical "derive these aspects for
/// these steps" request per pass, applied atomically on success.
pub trait RemoteDeriver {
    fn derive(
        &self,
        form_id: &str,
        input: &Value,
        scope: &RemoteScope,
    ) -> Result<FormState, RemoteDeriveError>;
}

/// Id of one derivation pass handed out by [`PassSequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassId(u64);

/// Monotonic pass bookkeeping for last-request-wins merging: a result whose
/// pass has been superseded is discarded on arrival, never merged out of
/// order.
#[derive(Debug, Default)]
pub struct PassSequence {
    latest: u64,
}

impl PassSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> PassId {
        self.latest += 1;
        PassId(self.latest)
    }

    pub fn is_current(&self, pass: PassId) -> bool {
        pass.0 == self.latest
    }

    /// Merges `derived` into `state` only when `pass` is still the latest.
    /// Returns whether the result was applied.
    pub fn accept(&self, pass: PassId, state: &mut FormState, derived: FormState) -> bool {
        if !self.is_current(pass) {
            log::debug!("discarding derivation result of superseded pass {}", pass.0);
            return false;
        }
        state.merge(derived);
        true
    }
}
