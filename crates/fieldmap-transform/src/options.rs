//! Configuration options for step evaluation.
//!
//! Options are passed explicitly to every evaluation call. Nothing in the
//! engine reads ambient or global settings.

use serde::{Deserialize, Serialize};

use crate::expr::ExprLimits;

/// Output format used by `date_format` when the step has no parameter.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Locale settings for `number_format`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormatOptions {
    /// Separator between groups of three integer digits.
    pub group_separator: String,
    /// Separator between the integer and fraction parts.
    pub decimal_separator: String,
    /// Fraction digits kept when the step does not fix a count.
    /// Trailing zeros are dropped.
    pub max_fraction_digits: usize,
}

impl Default for NumberFormatOptions {
    fn default() -> Self {
        Self {
            group_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
            max_fraction_digits: 3,
        }
    }
}

/// Options for step evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Number formatting locale.
    pub number: NumberFormatOptions,

    /// Output format for `date_format` steps without a parameter.
    pub default_date_format: String,

    /// Compiled size limit for `replace` patterns, in bytes.
    pub regex_size_limit: usize,

    /// Resource limits for `custom` expressions.
    pub expr: ExprLimits,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            number: NumberFormatOptions::default(),
            default_date_format: DEFAULT_DATE_FORMAT.to_string(),
            regex_size_limit: 1 << 20,
            expr: ExprLimits::default(),
        }
    }
}

impl TransformOptions {
    /// European-style grouping: `1.234.567,89`.
    pub fn with_european_numbers(mut self) -> Self {
        self.number.group_separator = ".".to_string();
        self.number.decimal_separator = ",".to_string();
        self
    }

    pub fn with_default_date_format(mut self, format: impl Into<String>) -> Self {
        self.default_date_format = format.into();
        self
    }

    pub fn with_expr_limits(mut self, limits: ExprLimits) -> Self {
        self.expr = limits;
        self
    }
}
