//! Record checks against a compiled [`RuleSet`].

use std::collections::BTreeMap;
use std::fmt;

use fieldmap_transform::normalization::{parse_date_value, parse_number};
use serde::Serialize;

use crate::rules::{CompiledFormat, CompiledRule, FieldFormat, RuleSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A required field is absent or empty.
    Missing,
    /// The value does not have the expected format.
    InvalidFormat,
    /// The value is longer than allowed.
    TooLong,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "missing",
            Self::InvalidFormat => "invalid format",
            Self::TooLong => "too long",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Index of the record in the batch, when validating several.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<usize>,
    pub field: String,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(record) = self.record {
            write!(f, "record {}: ", record + 1)?;
        }
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check one record against every rule.
///
/// Empty values of optional fields are not format-checked.
pub fn validate_record(rules: &RuleSet, record: &BTreeMap<String, String>) -> Vec<ValidationIssue> {
    rules
        .rules
        .iter()
        .filter_map(|compiled| check_field(compiled, record))
        .collect()
}

/// Check every record, tagging issues with the record's index.
pub fn validate_records<'a, I>(rules: &RuleSet, records: I) -> Vec<ValidationIssue>
where
    I: IntoIterator<Item = &'a BTreeMap<String, String>>,
{
    let mut issues = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        issues.extend(validate_record(rules, record).into_iter().map(|issue| ValidationIssue {
            record: Some(index),
            ..issue
        }));
    }
    tracing::debug!(issues = issues.len(), "records validated");
    issues
}

fn check_field(compiled: &CompiledRule, record: &BTreeMap<String, String>) -> Option<ValidationIssue> {
    let field = &compiled.rule.field;
    let value = record.get(field).map(String::as_str).unwrap_or_default();
    let issue = |kind, message: String| ValidationIssue {
        record: None,
        field: field.clone(),
        kind,
        message,
    };

    if value.trim().is_empty() {
        return compiled
            .rule
            .required
            .then(|| issue(IssueKind::Missing, "required value is missing".to_string()));
    }

    let format = compiled.format.as_ref()?;
    let ok = match format {
        CompiledFormat::Email => is_email(value),
        CompiledFormat::Number => parse_number(value).is_some(),
        CompiledFormat::Integer => value.trim().parse::<i64>().is_ok(),
        CompiledFormat::Date => parse_date_value(value).is_some(),
        CompiledFormat::Pattern(regex) => regex.is_match(value),
        CompiledFormat::MaxLength(max) => {
            let len = value.chars().count();
            if len > *max {
                return Some(issue(
                    IssueKind::TooLong,
                    format!("{len} characters, at most {max} allowed"),
                ));
            }
            true
        }
    };
    if ok {
        return None;
    }
    let expected = compiled
        .rule
        .format
        .as_ref()
        .map(FieldFormat::describe)
        .unwrap_or_default();
    Some(issue(
        IssueKind::InvalidFormat,
        format!("'{value}' is not {expected}"),
    ))
}

/// `local@domain.tld`, no whitespace, exactly one `@`.
fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, _)| !host.is_empty())
        && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_email("ada@example.com"));
        assert!(is_email("a.b+c@mail.example.co.uk"));
        assert!(!is_email("ada@example"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("ada@@example.com"));
        assert!(!is_email("ada @example.com"));
        assert!(!is_email("ada@.com"));
        assert!(!is_email("ada@example."));
    }
}
