//! Ordered, fail-fast step execution.

use fieldmap_model::{FieldMapping, StepKind, TransformationStep};
use serde::Serialize;
use tracing::{debug, debug_span};

use crate::error::PipelineError;
use crate::evaluator::apply_step;
use crate::options::TransformOptions;

/// Output of one step in a traced run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepTrace {
    pub step_id: String,
    pub kind: StepKind,
    pub output: String,
}

/// Apply `steps` to `input` in order.
///
/// The output of step `i` is the input of step `i + 1`. An empty list
/// returns the input unchanged. The first failing step ends the run.
pub fn run_steps(
    steps: &[TransformationStep],
    input: &str,
    options: &TransformOptions,
) -> Result<String, PipelineError> {
    let span = debug_span!("pipeline", steps = steps.len());
    let _guard = span.enter();

    let mut current = input.to_string();
    for (index, step) in steps.iter().enumerate() {
        current = apply_step(step, &current, options).map_err(|error| {
            debug!(step_index = index, step_id = %step.id, kind = %step.kind, %error, "step failed");
            PipelineError::new(index, &step.id, step.kind, error)
        })?;
    }
    Ok(current)
}

/// Run a mapping's pipeline on one source value.
pub fn run_mapping(
    mapping: &FieldMapping,
    input: &str,
    options: &TransformOptions,
) -> Result<String, PipelineError> {
    let span = debug_span!("mapping", source = %mapping.source_field, target = %mapping.target_field);
    let _guard = span.enter();
    run_steps(&mapping.steps, input, options)
}

/// Like [`run_steps`], but keeps every intermediate output.
///
/// On failure the traces of the steps that succeeded are returned with the
/// error, so an editor can show how far the value got.
pub fn run_traced(
    steps: &[TransformationStep],
    input: &str,
    options: &TransformOptions,
) -> (Vec<StepTrace>, Result<String, PipelineError>) {
    let span = debug_span!("pipeline_traced", steps = steps.len());
    let _guard = span.enter();

    let mut traces = Vec::with_capacity(steps.len());
    let mut current = input.to_string();
    for (index, step) in steps.iter().enumerate() {
        match apply_step(step, &current, options) {
            Ok(output) => {
                traces.push(StepTrace {
                    step_id: step.id.clone(),
                    kind: step.kind,
                    output: output.clone(),
                });
                current = output;
            }
            Err(error) => {
                debug!(step_index = index, step_id = %step.id, kind = %step.kind, %error, "step failed");
                return (traces, Err(PipelineError::new(index, &step.id, step.kind, error)));
            }
        }
    }
    (traces, Ok(current))
}
