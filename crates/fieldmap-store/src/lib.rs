//! Rule persistence.
//!
//! A [`RuleStore`] keeps one [`TransformationRule`] per endpoint id. Every
//! save checks the rule's uniqueness invariants first and then writes the
//! whole rule (both persisted maps) as one document, so a failed save never
//! leaves the field mapping and the step lists out of step with each other.
//!
//! - [`JsonFileStore`]: one JSON file per endpoint, atomic replace on save
//! - [`MemoryStore`]: mutex-guarded map, for tests and embedding

pub mod document;
pub mod error;
pub mod file;
pub mod memory;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fieldmap_model::TransformationRule;
use serde::Serialize;

pub use document::{FORMAT_VERSION, StoredRule, read_rule_file, write_rule_file};
pub use error::{Result, StoreError};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Storage for transformation rules, keyed by endpoint id.
///
/// An endpoint owns exactly one rule, which holds all of its mappings, so
/// `load` returns a single rule rather than a list and `save` replaces the
/// whole document. Calls are synchronous and block on I/O. Failed writes
/// are reported, never retried.
pub trait RuleStore: Send + Sync {
    /// Load the one rule stored for an endpoint. Unknown ids give
    /// [`StoreError::NotFound`].
    fn load(&self, endpoint_id: &str) -> Result<TransformationRule>;

    /// Create or replace the rule for `rule.endpoint_id`.
    ///
    /// Rules with duplicate source fields or step ids are rejected with
    /// [`StoreError::Invalid`] before the store is touched.
    fn save(&self, rule: &TransformationRule) -> Result<()>;

    /// Remove a rule. Returns whether one existed.
    fn delete(&self, endpoint_id: &str) -> Result<bool>;

    /// Summaries of all stored rules, ordered by endpoint id.
    fn list(&self) -> Result<Vec<RuleSummary>>;

    /// Every stored rule, ordered by endpoint id.
    fn load_all(&self) -> Result<Vec<TransformationRule>>;

    fn exists(&self, endpoint_id: &str) -> Result<bool> {
        match self.load(endpoint_id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Metadata about a stored rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    pub endpoint_id: String,
    pub display_name: String,
    pub mapping_count: usize,
    pub step_count: usize,
    pub saved_at: Option<DateTime<Utc>>,
    /// Backing file, for file-based stores.
    pub path: Option<PathBuf>,
}

impl RuleSummary {
    pub(crate) fn from_stored(stored: &StoredRule, path: Option<PathBuf>) -> Self {
        Self {
            endpoint_id: stored.rule.endpoint_id.clone(),
            display_name: stored.rule.display_name.clone(),
            mapping_count: stored.mapping_count(),
            step_count: stored.step_count(),
            saved_at: stored.saved_at,
            path,
        }
    }
}
