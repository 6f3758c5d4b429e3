//! Transformation rules: the set of field mappings of one integration endpoint.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::mapping::FieldMapping;

/// All field mappings configured for one integration endpoint.
///
/// Mappings are keyed by `source_field`; no two mappings in a rule may
/// share one. [`TransformationRule::add_mapping`] enforces this on edit and
/// [`TransformationRule::ensure_unique`] re-checks it before persisting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationRule {
    pub endpoint_id: String,
    pub display_name: String,
    #[serde(default)]
    pub mappings: Vec<FieldMapping>,
}

impl TransformationRule {
    pub fn new(endpoint_id: impl Into<String>, display_name: impl Into<String>) -> Result<Self> {
        let endpoint_id = endpoint_id.into();
        if endpoint_id.trim().is_empty() {
            return Err(ModelError::EmptyField { what: "endpoint id" });
        }
        Ok(Self {
            endpoint_id,
            display_name: display_name.into(),
            mappings: Vec::new(),
        })
    }

    /// Add a mapping, rejecting a source field that is already mapped.
    pub fn add_mapping(&mut self, mapping: FieldMapping) -> Result<()> {
        mapping.check()?;
        if self.mapping(&mapping.source_field).is_some() {
            return Err(ModelError::DuplicateSourceField {
                source_field: mapping.source_field,
            });
        }
        self.mappings.push(mapping);
        Ok(())
    }

    /// Remove the mapping for a source field, returning it.
    pub fn remove_mapping(&mut self, source_field: &str) -> Result<FieldMapping> {
        let index = self
            .mappings
            .iter()
            .position(|m| m.source_field == source_field)
            .ok_or_else(|| ModelError::MappingNotFound {
                source_field: source_field.to_string(),
            })?;
        Ok(self.mappings.remove(index))
    }

    pub fn mapping(&self, source_field: &str) -> Option<&FieldMapping> {
        self.mappings.iter().find(|m| m.source_field == source_field)
    }

    pub fn mapping_mut(&mut self, source_field: &str) -> Option<&mut FieldMapping> {
        self.mappings
            .iter_mut()
            .find(|m| m.source_field == source_field)
    }

    /// Like [`Self::mapping_mut`] but reports a missing mapping as an error.
    pub fn require_mapping_mut(&mut self, source_field: &str) -> Result<&mut FieldMapping> {
        self.mapping_mut(source_field)
            .ok_or_else(|| ModelError::MappingNotFound {
                source_field: source_field.to_string(),
            })
    }

    /// Check the source-field uniqueness invariant.
    pub fn ensure_unique(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for mapping in &self.mappings {
            if !seen.insert(mapping.source_field.as_str()) {
                return Err(ModelError::DuplicateSourceField {
                    source_field: mapping.source_field.clone(),
                });
            }
        }
        Ok(())
    }

    /// Full structural check: endpoint id, uniqueness, and every mapping.
    pub fn check(&self) -> Result<()> {
        if self.endpoint_id.trim().is_empty() {
            return Err(ModelError::EmptyField { what: "endpoint id" });
        }
        self.ensure_unique()?;
        self.mappings.iter().try_for_each(FieldMapping::check)
    }

    pub fn step_count(&self) -> usize {
        self.mappings.iter().map(|m| m.steps.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepKind;

    #[test]
    fn add_mapping_rejects_duplicate_source() {
        let mut rule = TransformationRule::new("crm", "CRM").unwrap();
        rule.add_mapping(FieldMapping::new("name", "full_name").unwrap())
            .unwrap();
        let err = rule
            .add_mapping(FieldMapping::new("name", "display_name").unwrap())
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateSourceField {
                source_field: "name".to_string()
            }
        );
    }

    #[test]
    fn ensure_unique_catches_direct_edits() {
        let mut rule = TransformationRule::new("crm", "CRM").unwrap();
        rule.mappings.push(FieldMapping::new("a", "x").unwrap());
        rule.mappings.push(FieldMapping::new("a", "y").unwrap());
        assert!(rule.ensure_unique().is_err());
        assert!(rule.check().is_err());
    }

    #[test]
    fn remove_and_edit_mappings() {
        let mut rule = TransformationRule::new("crm", "CRM").unwrap();
        rule.add_mapping(FieldMapping::new("a", "x").unwrap()).unwrap();
        rule.add_mapping(FieldMapping::new("b", "y").unwrap()).unwrap();

        rule.require_mapping_mut("b")
            .unwrap()
            .add_step(StepKind::Trim, None);
        assert_eq!(rule.step_count(), 1);

        let removed = rule.remove_mapping("a").unwrap();
        assert_eq!(removed.target_field, "x");
        assert!(rule.mapping("a").is_none());
        assert!(matches!(
            rule.remove_mapping("a"),
            Err(ModelError::MappingNotFound { .. })
        ));
    }
}
