//! Transformation step types.
//!
//! A step is one typed operation applied to a field value. The set of
//! operations is closed: every kind is a variant of [`StepKind`], and the
//! meaning of the optional string parameter depends on the kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a step kind treats its parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterUse {
    /// The parameter is ignored.
    Unused,
    /// The parameter may be omitted.
    Optional,
    /// A missing parameter is a configuration error.
    Required,
}

/// Closed set of transformation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Uppercase,
    Lowercase,
    Trim,
    Concat,
    Split,
    Substring,
    Replace,
    DateFormat,
    NumberFormat,
    Default,
    Custom,
}

impl StepKind {
    /// All kinds in display order.
    pub const ALL: [StepKind; 11] = [
        StepKind::Uppercase,
        StepKind::Lowercase,
        StepKind::Trim,
        StepKind::Concat,
        StepKind::Split,
        StepKind::Substring,
        StepKind::Replace,
        StepKind::DateFormat,
        StepKind::NumberFormat,
        StepKind::Default,
        StepKind::Custom,
    ];

    /// The serialized tag, e.g. `date_format`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uppercase => "uppercase",
            Self::Lowercase => "lowercase",
            Self::Trim => "trim",
            Self::Concat => "concat",
            Self::Split => "split",
            Self::Substring => "substring",
            Self::Replace => "replace",
            Self::DateFormat => "date_format",
            Self::NumberFormat => "number_format",
            Self::Default => "default",
            Self::Custom => "custom",
        }
    }

    /// Returns a human-readable display name for the step kind.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Uppercase => "Uppercase",
            Self::Lowercase => "Lowercase",
            Self::Trim => "Trim",
            Self::Concat => "Concatenate",
            Self::Split => "Split",
            Self::Substring => "Substring",
            Self::Replace => "Replace",
            Self::DateFormat => "Date Format",
            Self::NumberFormat => "Number Format",
            Self::Default => "Default Value",
            Self::Custom => "Custom Expression",
        }
    }

    /// What the parameter means for this kind, for editor hints.
    pub fn parameter_hint(self) -> &'static str {
        match self {
            Self::Uppercase | Self::Lowercase | Self::Trim => "-",
            Self::Concat => "suffix to append",
            Self::Split => "delimiter; keeps the first segment",
            Self::Substring => "start,end (character offsets)",
            Self::Replace => "pattern,replacement",
            Self::DateFormat => "output format, e.g. %d/%m/%Y or DD/MM/YYYY",
            Self::NumberFormat => "fraction digits (optional)",
            Self::Default => "fallback for empty values",
            Self::Custom => "expression over `value`",
        }
    }

    pub fn parameter_use(self) -> ParameterUse {
        match self {
            Self::Uppercase | Self::Lowercase | Self::Trim => ParameterUse::Unused,
            Self::Concat | Self::DateFormat | Self::NumberFormat => ParameterUse::Optional,
            Self::Split | Self::Substring | Self::Replace | Self::Default | Self::Custom => {
                ParameterUse::Required
            }
        }
    }

    /// Check if a missing parameter is a configuration error for this kind.
    pub fn requires_parameter(self) -> bool {
        self.parameter_use() == ParameterUse::Required
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown step kind tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown step kind '{0}'")]
pub struct UnknownStepKind(pub String);

impl FromStr for StepKind {
    type Err = UnknownStepKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        StepKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownStepKind(s.to_string()))
    }
}

/// A single transformation step within a field mapping.
///
/// Serialized as `{ "id": ..., "type": ..., "params": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationStep {
    /// Identifier, unique within the owning mapping.
    pub id: String,

    /// The operation to apply.
    #[serde(rename = "type")]
    pub kind: StepKind,

    /// Kind-specific argument.
    #[serde(rename = "params", default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
}

impl TransformationStep {
    /// Create a step without a parameter.
    pub fn new(id: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id: id.into(),
            kind,
            parameter: None,
        }
    }

    /// Set the parameter for this step.
    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    pub fn parameter(&self) -> Option<&str> {
        self.parameter.as_deref()
    }
}
