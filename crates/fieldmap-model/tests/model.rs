use fieldmap_model::{
    FieldMapping, ModelError, PersistedRule, StepKind, TransformationRule, TransformationStep,
};

fn contacts_rule() -> TransformationRule {
    let mut rule = TransformationRule::new("salesforce", "Salesforce contacts").expect("rule");

    let mut email = FieldMapping::new("Email", "email").expect("mapping");
    email.add_step(StepKind::Trim, None);
    email.add_step(StepKind::Lowercase, None);
    rule.add_mapping(email).expect("add email");

    let mut phone = FieldMapping::new("Phone", "phone").expect("mapping");
    phone.add_step(StepKind::Replace, Some(r"[^\d+],".to_string()));
    rule.add_mapping(phone).expect("add phone");

    rule.add_mapping(FieldMapping::new("Id", "external_id").expect("mapping"))
        .expect("add id");
    rule
}

#[test]
fn rule_round_trips_through_persisted_json() {
    let rule = contacts_rule();
    let json = serde_json::to_string_pretty(&PersistedRule::from(&rule)).expect("serialize");
    let persisted: PersistedRule = serde_json::from_str(&json).expect("deserialize");
    let restored = TransformationRule::try_from(persisted).expect("join");

    assert_eq!(restored.endpoint_id, rule.endpoint_id);
    assert_eq!(restored.mappings.len(), rule.mappings.len());
    for mapping in &rule.mappings {
        assert_eq!(restored.mapping(&mapping.source_field), Some(mapping));
    }
}

#[test]
fn step_wire_format_uses_type_and_params() {
    let step = TransformationStep::new("step-1", StepKind::DateFormat).with_parameter("DD/MM/YYYY");
    let value = serde_json::to_value(&step).expect("serialize");
    assert_eq!(
        value,
        serde_json::json!({ "id": "step-1", "type": "date_format", "params": "DD/MM/YYYY" })
    );

    let bare: TransformationStep =
        serde_json::from_str(r#"{ "id": "a", "type": "uppercase" }"#).expect("deserialize");
    assert_eq!(bare.parameter(), None);
}

#[test]
fn unknown_step_type_is_rejected() {
    let result = serde_json::from_str::<TransformationStep>(r#"{ "id": "a", "type": "eval" }"#);
    assert!(result.is_err());
}

#[test]
fn editing_keeps_mapping_invariants() {
    let mut rule = contacts_rule();

    let err = rule
        .add_mapping(FieldMapping::new("Email", "other").expect("mapping"))
        .expect_err("duplicate source");
    assert_eq!(
        err,
        ModelError::DuplicateSourceField {
            source_field: "Email".to_string()
        }
    );

    let email = rule.require_mapping_mut("Email").expect("email mapping");
    let id = email.add_step(StepKind::Default, Some("unknown@example.com".to_string()));
    email.move_step(&id, 0).expect("move");
    assert_eq!(email.steps[0].kind, StepKind::Default);

    let removed = email.remove_step("step-1").expect("remove");
    assert_eq!(removed.kind, StepKind::Trim);
    assert!(matches!(
        email.remove_step("step-1"),
        Err(ModelError::StepNotFound { .. })
    ));

    let removed = rule.remove_mapping("Phone").expect("remove mapping");
    assert_eq!(removed.target_field, "phone");
    assert!(rule.mapping("Phone").is_none());
    rule.check().expect("still valid");
}
