//! Live preview of a mapping's pipeline against a sample value.
//!
//! Preview never fails: errors are turned into a displayable
//! [`PreviewOutcome::Failure`] identifying the step that broke.

use std::fmt;

use fieldmap_model::FieldMapping;
use serde::Serialize;

use crate::error::PipelineError;
use crate::options::TransformOptions;
use crate::pipeline::{StepTrace, run_mapping, run_traced};

/// Result of previewing a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PreviewOutcome {
    Success { output: String },
    Failure { step_id: String, message: String },
}

impl PreviewOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The output text, or `Error: <message>` for a failed run.
    pub fn render(&self) -> String {
        match self {
            Self::Success { output } => output.clone(),
            Self::Failure { message, .. } => format!("Error: {message}"),
        }
    }
}

impl fmt::Display for PreviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<Result<String, PipelineError>> for PreviewOutcome {
    fn from(result: Result<String, PipelineError>) -> Self {
        match result {
            Ok(output) => Self::Success { output },
            Err(error) => Self::Failure {
                step_id: error.step_id.clone(),
                message: error.to_string(),
            },
        }
    }
}

/// Per-step outputs plus the overall outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TracedPreview {
    pub steps: Vec<StepTrace>,
    pub outcome: PreviewOutcome,
}

/// Run the mapping's pipeline on `sample`.
pub fn preview(mapping: &FieldMapping, sample: &str, options: &TransformOptions) -> PreviewOutcome {
    run_mapping(mapping, sample, options).into()
}

/// Preview rendered as the string an editor shows.
pub fn preview_text(mapping: &FieldMapping, sample: &str, options: &TransformOptions) -> String {
    preview(mapping, sample, options).render()
}

/// Preview keeping the output of every step that ran.
pub fn preview_traced(
    mapping: &FieldMapping,
    sample: &str,
    options: &TransformOptions,
) -> TracedPreview {
    let (steps, result) = run_traced(&mapping.steps, sample, options);
    TracedPreview {
        steps,
        outcome: result.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmap_model::{StepKind, TransformationStep};

    fn mapping(steps: Vec<TransformationStep>) -> FieldMapping {
        let mut mapping = FieldMapping::new("email", "contact_email").unwrap();
        mapping.steps = steps;
        mapping
    }

    #[test]
    fn success_renders_output() {
        let m = mapping(vec![
            TransformationStep::new("1", StepKind::Trim),
            TransformationStep::new("2", StepKind::Lowercase),
        ]);
        let outcome = preview(&m, "  Ada@Example.COM ", &TransformOptions::default());
        assert!(outcome.is_success());
        assert_eq!(outcome.render(), "ada@example.com");
    }

    #[test]
    fn failure_renders_error_prefix() {
        let m = mapping(vec![
            TransformationStep::new("trim", StepKind::Trim),
            TransformationStep::new("cut", StepKind::Substring).with_parameter("a,b"),
        ]);
        let outcome = preview(&m, "value", &TransformOptions::default());
        match &outcome {
            PreviewOutcome::Failure { step_id, .. } => assert_eq!(step_id, "cut"),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(outcome.render().starts_with("Error: step 2 (substring, id 'cut')"));
    }

    #[test]
    fn passthrough_preview_echoes_sample() {
        let m = mapping(Vec::new());
        assert_eq!(preview_text(&m, " as is ", &TransformOptions::default()), " as is ");
    }

    #[test]
    fn traced_preview_lists_each_step() {
        let m = mapping(vec![
            TransformationStep::new("1", StepKind::Trim),
            TransformationStep::new("2", StepKind::Uppercase),
        ]);
        let traced = preview_traced(&m, " hi ", &TransformOptions::default());
        assert_eq!(traced.steps.len(), 2);
        assert_eq!(traced.outcome.render(), "HI");
    }
}
