//! Field mappings: one source field, one target field, ordered steps.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::step::{StepKind, TransformationStep};

const STEP_ID_PREFIX: &str = "step-";

/// Maps a source field to a target field through an ordered list of steps.
///
/// An empty step list is a passthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Input field name.
    pub source_field: String,
    /// Output field name.
    pub target_field: String,
    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<TransformationStep>,
}

impl FieldMapping {
    /// Create a passthrough mapping.
    pub fn new(source_field: impl Into<String>, target_field: impl Into<String>) -> Result<Self> {
        let mapping = Self {
            source_field: source_field.into(),
            target_field: target_field.into(),
            steps: Vec::new(),
        };
        mapping.check_fields()?;
        Ok(mapping)
    }

    /// Builder-style variant of [`Self::push_step`] for fixtures and tests.
    pub fn with_step(mut self, step: TransformationStep) -> Result<Self> {
        self.push_step(step)?;
        Ok(self)
    }

    pub fn is_passthrough(&self) -> bool {
        self.steps.is_empty()
    }

    /// Append a step with a freshly allocated id and return that id.
    pub fn add_step(&mut self, kind: StepKind, parameter: Option<String>) -> String {
        let id = self.next_step_id();
        self.steps.push(TransformationStep {
            id: id.clone(),
            kind,
            parameter,
        });
        id
    }

    /// Append an existing step, rejecting a duplicate id.
    pub fn push_step(&mut self, step: TransformationStep) -> Result<()> {
        if step.id.trim().is_empty() {
            return Err(ModelError::EmptyField { what: "step id" });
        }
        if self.step(&step.id).is_some() {
            return Err(ModelError::DuplicateStepId {
                source_field: self.source_field.clone(),
                step_id: step.id,
            });
        }
        self.steps.push(step);
        Ok(())
    }

    /// Remove a step by id, returning it.
    pub fn remove_step(&mut self, step_id: &str) -> Result<TransformationStep> {
        let index = self.step_index(step_id)?;
        Ok(self.steps.remove(index))
    }

    /// Move a step to a new position; indices past the end move it last.
    pub fn move_step(&mut self, step_id: &str, new_index: usize) -> Result<()> {
        let index = self.step_index(step_id)?;
        let step = self.steps.remove(index);
        let new_index = new_index.min(self.steps.len());
        self.steps.insert(new_index, step);
        Ok(())
    }

    pub fn step(&self, step_id: &str) -> Option<&TransformationStep> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// Check field names are non-empty and step ids are unique.
    pub fn check(&self) -> Result<()> {
        self.check_fields()?;
        let mut seen = BTreeSet::new();
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(ModelError::DuplicateStepId {
                    source_field: self.source_field.clone(),
                    step_id: step.id.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_fields(&self) -> Result<()> {
        if self.source_field.trim().is_empty() {
            return Err(ModelError::EmptyField {
                what: "source field",
            });
        }
        if self.target_field.trim().is_empty() {
            return Err(ModelError::EmptyField {
                what: "target field",
            });
        }
        Ok(())
    }

    fn step_index(&self, step_id: &str) -> Result<usize> {
        self.steps
            .iter()
            .position(|s| s.id == step_id)
            .ok_or_else(|| ModelError::StepNotFound {
                source_field: self.source_field.clone(),
                step_id: step_id.to_string(),
            })
    }

    /// Smallest `step-N` id greater than every existing numbered id.
    fn next_step_id(&self) -> String {
        let next = self
            .steps
            .iter()
            .filter_map(|s| s.id.strip_prefix(STEP_ID_PREFIX)?.parse::<u64>().ok())
            .max()
            .map_or(1, |n| n + 1);
        format!("{STEP_ID_PREFIX}{next}")
    }
}
