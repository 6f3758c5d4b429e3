//! On-disk JSON document for a stored rule.
//!
//! The document is the two-map [`PersistedRule`] shape with repository
//! metadata alongside it:
//!
//! ```json
//! {
//!   "endpoint_id": "hubspot",
//!   "display_name": "HubSpot contacts",
//!   "field_mapping": { "email": "contact_email" },
//!   "transformation_rules": { "email": [{ "id": "step-1", "type": "trim" }] },
//!   "saved_at": "2024-05-01T12:00:00Z",
//!   "version": "1.0"
//! }
//! ```
//!
//! Plain `PersistedRule` JSON without metadata is accepted on read, so rule
//! files written by hand can be imported directly.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use fieldmap_model::{PersistedRule, TransformationRule};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Current document format version.
pub const FORMAT_VERSION: &str = "1.0";

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

/// A persisted rule with repository metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRule {
    #[serde(flatten)]
    pub rule: PersistedRule,
    /// When this document was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    #[serde(default = "default_version")]
    pub version: String,
}

impl StoredRule {
    /// Flatten a rule for storage, stamped with the current time.
    ///
    /// Fails if the rule breaks the uniqueness invariants, before anything
    /// is written.
    pub fn new(rule: &TransformationRule) -> Result<Self> {
        rule.check()?;
        Ok(Self {
            rule: PersistedRule::from(rule),
            saved_at: Some(Utc::now()),
            version: default_version(),
        })
    }

    /// Join the two maps back into a rule.
    pub fn into_rule(self) -> Result<TransformationRule> {
        Ok(TransformationRule::try_from(self.rule)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a document, checking its format version.
    pub fn from_json(path: &Path, contents: &str) -> Result<Self> {
        let stored: Self =
            serde_json::from_str(contents).map_err(|e| StoreError::corrupt(path, e))?;
        if stored.version.split('.').next() != FORMAT_VERSION.split('.').next() {
            return Err(StoreError::corrupt(
                path,
                format!("unsupported format version '{}'", stored.version),
            ));
        }
        Ok(stored)
    }

    pub fn mapping_count(&self) -> usize {
        self.rule.field_mapping.len()
    }

    pub fn step_count(&self) -> usize {
        self.rule.transformation_rules.values().map(Vec::len).sum()
    }
}

/// Read a rule file.
///
/// A file that parses but breaks the model invariants (for example a step
/// list with no field mapping) is reported as corrupt.
pub fn read_rule_file(path: &Path) -> Result<TransformationRule> {
    let contents = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    StoredRule::from_json(path, &contents)?
        .into_rule()
        .map_err(|e| match e {
            StoreError::Invalid(model) => StoreError::corrupt(path, model),
            other => other,
        })
}

/// Write a rule file in the stored document format.
pub fn write_rule_file(path: &Path, rule: &TransformationRule) -> Result<()> {
    let json = StoredRule::new(rule)?.to_json()?;
    crate::file::write_atomic(path, json.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_persisted_rule() {
        let json = r#"{
            "endpoint_id": "crm",
            "field_mapping": { "name": "full_name" },
            "transformation_rules": { "name": [{ "id": "1", "type": "trim" }] }
        }"#;
        let stored = StoredRule::from_json(Path::new("crm.json"), json).unwrap();
        assert_eq!(stored.version, FORMAT_VERSION);
        assert_eq!(stored.saved_at, None);
        assert_eq!(stored.step_count(), 1);

        let rule = stored.into_rule().unwrap();
        assert_eq!(rule.mappings[0].target_field, "full_name");
    }

    #[test]
    fn rejects_future_major_version() {
        let json = r#"{ "endpoint_id": "crm", "version": "2.0" }"#;
        let err = StoredRule::from_json(Path::new("crm.json"), json).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn serializes_both_maps_and_metadata() {
        let mut rule = TransformationRule::new("crm", "CRM").unwrap();
        let mut mapping = fieldmap_model::FieldMapping::new("name", "full_name").unwrap();
        mapping.add_step(fieldmap_model::StepKind::Trim, None);
        rule.add_mapping(mapping).unwrap();

        let json = StoredRule::new(&rule).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["field_mapping"]["name"], "full_name");
        assert_eq!(value["transformation_rules"]["name"][0]["type"], "trim");
        assert_eq!(value["version"], "1.0");
        assert!(value["saved_at"].is_string());
    }
}
