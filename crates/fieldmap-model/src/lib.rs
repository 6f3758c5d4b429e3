//! Data model for field transformation rules.
//!
//! - **step**: typed transformation steps ([`StepKind`], [`TransformationStep`])
//! - **mapping**: a source field, a target field and its ordered steps
//! - **rule**: all mappings of one integration endpoint
//! - **persisted**: the two-map storage shape and its conversions

pub mod error;
pub mod mapping;
pub mod persisted;
pub mod rule;
pub mod step;

pub use error::{ModelError, Result};
pub use mapping::FieldMapping;
pub use persisted::PersistedRule;
pub use rule::TransformationRule;
pub use step::{ParameterUse, StepKind, TransformationStep, UnknownStepKind};
