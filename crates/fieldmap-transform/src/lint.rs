//! Static checks over a rule, run before any record is transformed.
//!
//! Lint reports every problem it finds instead of stopping at the first, so
//! an editor can list them all at once.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use fieldmap_model::{ParameterUse, TransformationRule};
use serde::Serialize;

use crate::evaluator::check_step;
use crate::options::TransformOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    /// The rule fails for every input, or cannot be persisted.
    Error,
    /// The rule runs, but probably not as intended.
    Warning,
}

impl fmt::Display for LintSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintIssue {
    pub severity: LintSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,
    /// Zero-based step index within the mapping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub message: String,
}

impl LintIssue {
    fn rule(severity: LintSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            source_field: None,
            step_index: None,
            step_id: None,
            message: message.into(),
        }
    }

    fn mapping(severity: LintSeverity, source_field: &str, message: impl Into<String>) -> Self {
        Self {
            source_field: Some(source_field.to_string()),
            ..Self::rule(severity, message)
        }
    }

    fn step(
        severity: LintSeverity,
        source_field: &str,
        step_index: usize,
        step_id: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            step_index: Some(step_index),
            step_id: Some(step_id.to_string()),
            ..Self::mapping(severity, source_field, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == LintSeverity::Error
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.severity)?;
        match (&self.source_field, self.step_index, &self.step_id) {
            (Some(field), Some(index), Some(id)) => {
                write!(f, "{field}, step {} ('{id}'): ", index + 1)?;
            }
            (Some(field), _, _) => write!(f, "{field}: ")?,
            _ => {}
        }
        f.write_str(&self.message)
    }
}

/// Check a rule without running it on any input.
pub fn lint_rule(rule: &TransformationRule, options: &TransformOptions) -> Vec<LintIssue> {
    use LintSeverity::{Error, Warning};

    let mut issues = Vec::new();

    if rule.endpoint_id.trim().is_empty() {
        issues.push(LintIssue::rule(Error, "endpoint id is empty"));
    }

    let mut sources: BTreeMap<&str, usize> = BTreeMap::new();
    let mut targets: BTreeMap<&str, usize> = BTreeMap::new();
    for mapping in &rule.mappings {
        *sources.entry(mapping.source_field.as_str()).or_default() += 1;
        *targets.entry(mapping.target_field.as_str()).or_default() += 1;
    }
    for (source, count) in &sources {
        if *count > 1 {
            issues.push(LintIssue::mapping(
                Error,
                source,
                format!("source field is mapped {count} times"),
            ));
        }
    }
    for (target, count) in &targets {
        if *count > 1 && !target.is_empty() {
            issues.push(LintIssue::rule(
                Warning,
                format!("target field '{target}' is written by {count} mappings"),
            ));
        }
    }

    for mapping in &rule.mappings {
        let source = mapping.source_field.as_str();
        if source.trim().is_empty() {
            issues.push(LintIssue::mapping(Error, source, "source field is empty"));
        }
        if mapping.target_field.trim().is_empty() {
            issues.push(LintIssue::mapping(Error, source, "target field is empty"));
        }

        let mut seen = BTreeSet::new();
        for (index, step) in mapping.steps.iter().enumerate() {
            if step.id.is_empty() {
                issues.push(LintIssue::step(Error, source, index, &step.id, "step id is empty"));
            } else if !seen.insert(step.id.as_str()) {
                issues.push(LintIssue::step(
                    Error,
                    source,
                    index,
                    &step.id,
                    "step id is used more than once",
                ));
            }

            if let Err(error) = check_step(step, options) {
                issues.push(LintIssue::step(Error, source, index, &step.id, error.to_string()));
            }
            if step.kind.parameter_use() == ParameterUse::Unused && step.parameter.is_some() {
                issues.push(LintIssue::step(
                    Warning,
                    source,
                    index,
                    &step.id,
                    format!("{} ignores its parameter", step.kind),
                ));
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmap_model::{FieldMapping, StepKind, TransformationStep};

    #[test]
    fn clean_rule_has_no_issues() {
        let mut rule = TransformationRule::new("crm", "CRM").unwrap();
        rule.add_mapping(
            FieldMapping::new("email", "contact")
                .unwrap()
                .with_step(TransformationStep::new("1", StepKind::Lowercase))
                .unwrap(),
        )
        .unwrap();
        assert!(lint_rule(&rule, &TransformOptions::default()).is_empty());
    }

    #[test]
    fn reports_structural_problems_that_bypass_editing() {
        let mut rule = TransformationRule::new("crm", "CRM").unwrap();
        let mut mapping = FieldMapping::new("email", "contact").unwrap();
        mapping.steps = vec![
            TransformationStep::new("1", StepKind::Trim),
            TransformationStep::new("1", StepKind::Lowercase),
        ];
        rule.mappings = vec![mapping.clone(), mapping];

        let issues = lint_rule(&rule, &TransformOptions::default());
        assert!(issues.iter().any(|i| i.message.contains("mapped 2 times")));
        assert!(issues.iter().any(|i| i.message.contains("written by 2 mappings")));
        assert_eq!(
            issues
                .iter()
                .filter(|i| i.message == "step id is used more than once")
                .count(),
            2
        );
    }

    #[test]
    fn flags_unused_parameter_as_warning() {
        let mut rule = TransformationRule::new("crm", "CRM").unwrap();
        rule.add_mapping(
            FieldMapping::new("a", "b")
                .unwrap()
                .with_step(TransformationStep::new("1", StepKind::Trim).with_parameter("x"))
                .unwrap(),
        )
        .unwrap();
        let issues = lint_rule(&rule, &TransformOptions::default());
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
        assert_eq!(issues[0].to_string(), "warning: a, step 1 ('1'): trim ignores its parameter");
    }
}
