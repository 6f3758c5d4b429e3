use thiserror::Error;

/// Structural errors in rules, mappings and steps.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{what} must not be empty")]
    EmptyField { what: &'static str },

    #[error("source field '{source_field}' is mapped more than once")]
    DuplicateSourceField { source_field: String },

    #[error("step id '{step_id}' is used more than once in mapping '{source_field}'")]
    DuplicateStepId {
        source_field: String,
        step_id: String,
    },

    #[error("no step '{step_id}' in mapping '{source_field}'")]
    StepNotFound {
        source_field: String,
        step_id: String,
    },

    #[error("no mapping for source field '{source_field}'")]
    MappingNotFound { source_field: String },

    #[error("transformation steps for '{source_field}' have no field mapping")]
    OrphanSteps { source_field: String },
}

pub type Result<T> = std::result::Result<T, ModelError>;
