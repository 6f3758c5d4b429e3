//! Field transformation engine.
//!
//! - **evaluator**: one step applied to one value
//! - **pipeline**: ordered, fail-fast execution of a mapping's steps
//! - **preview**: pipeline output rendered for an editor, never failing
//! - **apply**: whole rules applied to records and batches
//! - **lint**: static checks over a rule
//! - **expr**: the sandboxed language behind `custom` steps
//!
//! All evaluation is pure: rules, mappings and [`TransformOptions`] are
//! passed explicitly and nothing is cached between calls.

pub mod apply;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod lint;
pub mod normalization;
pub mod options;
pub mod pipeline;
pub mod preview;

pub use apply::{BatchReport, FieldError, Record, RecordOutcome, apply_batch, apply_record};
pub use error::{ConfigError, PipelineError, StepError};
pub use evaluator::{apply_step, check_step, evaluate};
pub use lint::{LintIssue, LintSeverity, lint_rule};
pub use options::{DEFAULT_DATE_FORMAT, NumberFormatOptions, TransformOptions};
pub use pipeline::{StepTrace, run_mapping, run_steps, run_traced};
pub use preview::{PreviewOutcome, TracedPreview, preview, preview_text, preview_traced};
