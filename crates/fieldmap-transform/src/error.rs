//! Error taxonomy for step evaluation and pipeline runs.

use fieldmap_model::StepKind;
use thiserror::Error;

/// A step's parameter is missing or malformed.
///
/// Raised at evaluation time, but independent of the input value: the same
/// step fails the same way for every record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{kind} step requires a parameter")]
    MissingParameter { kind: StepKind },

    #[error("invalid {kind} parameter '{parameter}': {reason}")]
    InvalidParameter {
        kind: StepKind,
        parameter: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(
        kind: StepKind,
        parameter: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            kind,
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot apply {kind} to '{input}': {reason}")]
    InvalidInput {
        kind: StepKind,
        input: String,
        reason: String,
    },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("custom expression failed: {0}")]
    CustomEvalFailed(String),
}

impl StepError {
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidPattern { .. })
    }

    pub(crate) fn invalid_input(
        kind: StepKind,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInput {
            kind,
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// The first failing step of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("step {} ({kind}, id '{step_id}'): {source}", .step_index + 1)]
pub struct PipelineError {
    /// Zero-based index of the failing step.
    pub step_index: usize,
    pub step_id: String,
    pub kind: StepKind,
    #[source]
    pub source: StepError,
}

impl PipelineError {
    pub(crate) fn new(
        step_index: usize,
        step_id: impl Into<String>,
        kind: StepKind,
        source: StepError,
    ) -> Self {
        Self {
            step_index,
            step_id: step_id.into(),
            kind,
            source,
        }
    }
}
