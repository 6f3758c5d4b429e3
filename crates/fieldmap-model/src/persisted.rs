//! Persistence shape of a transformation rule.
//!
//! Externally a rule is stored as two parallel objects joined on the source
//! field name:
//!
//! - `field_mapping`: `source_field -> target_field`
//! - `transformation_rules`: `source_field -> [step, ...]`, only for fields
//!   with at least one step
//!
//! Inside the crate a rule is always a [`TransformationRule`]; the two maps
//! exist only at this boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::mapping::FieldMapping;
use crate::rule::TransformationRule;
use crate::step::TransformationStep;

/// A rule flattened into its two persisted maps.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedRule {
    pub endpoint_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub field_mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub transformation_rules: BTreeMap<String, Vec<TransformationStep>>,
}

impl From<&TransformationRule> for PersistedRule {
    fn from(rule: &TransformationRule) -> Self {
        let mut field_mapping = BTreeMap::new();
        let mut transformation_rules = BTreeMap::new();
        for mapping in &rule.mappings {
            field_mapping.insert(mapping.source_field.clone(), mapping.target_field.clone());
            if !mapping.steps.is_empty() {
                transformation_rules.insert(mapping.source_field.clone(), mapping.steps.clone());
            }
        }
        Self {
            endpoint_id: rule.endpoint_id.clone(),
            display_name: rule.display_name.clone(),
            field_mapping,
            transformation_rules,
        }
    }
}

impl TryFrom<PersistedRule> for TransformationRule {
    type Error = ModelError;

    /// Join both maps on the source field. Mappings come out in source-field order.
    fn try_from(persisted: PersistedRule) -> Result<Self> {
        let PersistedRule {
            endpoint_id,
            display_name,
            field_mapping,
            mut transformation_rules,
        } = persisted;

        let mut rule = TransformationRule::new(endpoint_id, display_name)?;
        for (source_field, target_field) in field_mapping {
            let steps = transformation_rules
                .remove(&source_field)
                .unwrap_or_default();
            let mut mapping = FieldMapping::new(source_field, target_field)?;
            mapping.steps = steps;
            rule.add_mapping(mapping)?;
        }

        if let Some(source_field) = transformation_rules.into_keys().next() {
            return Err(ModelError::OrphanSteps { source_field });
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepKind;

    fn sample_rule() -> TransformationRule {
        let mut rule = TransformationRule::new("hubspot", "HubSpot contacts").unwrap();
        let mut email = FieldMapping::new("email", "contact_email").unwrap();
        email.add_step(StepKind::Trim, None);
        email.add_step(StepKind::Lowercase, None);
        rule.add_mapping(email).unwrap();
        rule.add_mapping(FieldMapping::new("id", "external_id").unwrap())
            .unwrap();
        rule
    }

    #[test]
    fn flattening_omits_passthrough_fields_from_step_map() {
        let persisted = PersistedRule::from(&sample_rule());
        assert_eq!(persisted.field_mapping.len(), 2);
        assert_eq!(persisted.transformation_rules.len(), 1);
        assert_eq!(persisted.transformation_rules["email"].len(), 2);
    }

    #[test]
    fn joins_maps_back_into_mappings() {
        let rule = sample_rule();
        let json = serde_json::to_string(&PersistedRule::from(&rule)).unwrap();
        let parsed: PersistedRule = serde_json::from_str(&json).unwrap();
        let back = TransformationRule::try_from(parsed).unwrap();

        let email = back.mapping("email").unwrap();
        assert_eq!(email.target_field, "contact_email");
        assert_eq!(email.steps[1].kind, StepKind::Lowercase);
        assert!(back.mapping("id").unwrap().is_passthrough());
    }

    #[test]
    fn rejects_steps_without_name_mapping() {
        let mut persisted = PersistedRule::from(&sample_rule());
        persisted
            .transformation_rules
            .insert("phone".to_string(), vec![TransformationStep::new("s", StepKind::Trim)]);
        let err = TransformationRule::try_from(persisted).unwrap_err();
        assert_eq!(
            err,
            ModelError::OrphanSteps {
                source_field: "phone".to_string()
            }
        );
    }

    #[test]
    fn reads_the_external_json_shape() {
        let json = r#"{
            "endpoint_id": "erp",
            "field_mapping": { "sku": "product_code" },
            "transformation_rules": {
                "sku": [ { "id": "1", "type": "uppercase" },
                         { "id": "2", "type": "concat", "params": "-EU" } ]
            }
        }"#;
        let persisted: PersistedRule = serde_json::from_str(json).unwrap();
        let rule = TransformationRule::try_from(persisted).unwrap();
        let sku = rule.mapping("sku").unwrap();
        assert_eq!(sku.steps[1].parameter(), Some("-EU"));
        assert_eq!(rule.display_name, "");
    }
}
