//! Field rule definitions and their compiled form.

use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidateError};

/// Expected shape of a field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldFormat {
    Email,
    /// Any finite decimal number.
    Number,
    /// A whole number that fits in 64 bits.
    Integer,
    /// A date in one of the layouts `date_format` steps accept.
    Date,
    /// Must match the regular expression somewhere in the value; anchor it
    /// with `^...$` for a full match.
    Pattern { pattern: String },
    /// At most `max` characters.
    MaxLength { max: usize },
}

impl FieldFormat {
    pub fn describe(&self) -> String {
        match self {
            Self::Email => "an email address".to_string(),
            Self::Number => "a number".to_string(),
            Self::Integer => "an integer".to_string(),
            Self::Date => "a date".to_string(),
            Self::Pattern { pattern } => format!("a value matching /{pattern}/"),
            Self::MaxLength { max } => format!("at most {max} characters"),
        }
    }
}

/// Validation rule for one output field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub field: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FieldFormat>,
}

impl FieldRule {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            required: false,
            format: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_format(mut self, format: FieldFormat) -> Self {
        self.format = Some(format);
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) enum CompiledFormat {
    Email,
    Number,
    Integer,
    Date,
    Pattern(Regex),
    MaxLength(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub rule: FieldRule,
    pub format: Option<CompiledFormat>,
}

/// A list of field rules with their patterns compiled.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub(crate) rules: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile rules, failing on the first invalid pattern.
    pub fn compile(rules: impl IntoIterator<Item = FieldRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let format = rule
                    .format
                    .as_ref()
                    .map(|format| compile_format(&rule.field, format))
                    .transpose()?;
                Ok(CompiledRule { rule, format })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Load a JSON array of [`FieldRule`]s and compile it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| ValidateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rules: Vec<FieldRule> =
            serde_json::from_str(&contents).map_err(|source| ValidateError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::compile(rules)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }
}

fn compile_format(field: &str, format: &FieldFormat) -> Result<CompiledFormat> {
    Ok(match format {
        FieldFormat::Email => CompiledFormat::Email,
        FieldFormat::Number => CompiledFormat::Number,
        FieldFormat::Integer => CompiledFormat::Integer,
        FieldFormat::Date => CompiledFormat::Date,
        FieldFormat::MaxLength { max } => CompiledFormat::MaxLength(*max),
        FieldFormat::Pattern { pattern } => {
            let regex = Regex::new(pattern).map_err(|source| ValidateError::InvalidPattern {
                field: field.to_string(),
                pattern: pattern.clone(),
                source,
            })?;
            CompiledFormat::Pattern(regex)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tagged_formats() {
        let rules: Vec<FieldRule> = serde_json::from_str(
            r#"[
                { "field": "email", "required": true, "format": { "type": "email" } },
                { "field": "code", "format": { "type": "pattern", "pattern": "^[A-Z]{3}$" } },
                { "field": "name", "format": { "type": "max_length", "max": 40 } },
                { "field": "notes" }
            ]"#,
        )
        .unwrap();
        assert_eq!(rules.len(), 4);
        assert!(rules[0].required);
        assert_eq!(rules[2].format, Some(FieldFormat::MaxLength { max: 40 }));
        assert_eq!(rules[3], FieldRule::new("notes"));
    }

    #[test]
    fn compile_reports_invalid_pattern() {
        let err = RuleSet::compile([FieldRule::new("code").with_format(FieldFormat::Pattern {
            pattern: "([A-Z]".to_string(),
        })])
        .unwrap_err();
        match err {
            ValidateError::InvalidPattern { field, .. } => assert_eq!(field, "code"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
