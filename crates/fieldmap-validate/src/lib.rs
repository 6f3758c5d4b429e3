//! Per-field validation of transformed records.
//!
//! Rules are plain serde data ([`FieldRule`]) so they can live next to a
//! transformation rule as JSON. They are compiled once into a [`RuleSet`]
//! and then applied to any number of records.

pub mod check;
pub mod error;
pub mod rules;

pub use check::{IssueKind, ValidationIssue, validate_record, validate_records};
pub use error::{Result, ValidateError};
pub use rules::{FieldFormat, FieldRule, RuleSet};
