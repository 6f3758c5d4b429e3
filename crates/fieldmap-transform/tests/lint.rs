use fieldmap_model::{FieldMapping, StepKind, TransformationRule, TransformationStep};
use fieldmap_transform::{TransformOptions, lint_rule};

fn rule_with_problems() -> TransformationRule {
    let mut rule = TransformationRule::new("crm", "CRM export").expect("rule");
    rule.add_mapping(
        FieldMapping::new("email", "contact")
            .expect("mapping")
            .with_step(TransformationStep::new("1", StepKind::Split))
            .expect("step")
            .with_step(TransformationStep::new("2", StepKind::Trim).with_parameter(" "))
            .expect("step"),
    )
    .expect("add email");
    rule.add_mapping(
        FieldMapping::new("created", "created_on")
            .expect("mapping")
            .with_step(TransformationStep::new("d", StepKind::DateFormat).with_parameter("%Q"))
            .expect("step")
            .with_step(TransformationStep::new("e", StepKind::Custom).with_parameter("value +"))
            .expect("step"),
    )
    .expect("add created");
    rule.add_mapping(
        FieldMapping::new("name", "contact")
            .expect("mapping")
            .with_step(TransformationStep::new("s", StepKind::Substring).with_parameter("one,two"))
            .expect("step"),
    )
    .expect("add name");
    rule
}

#[test]
fn lint_report_lists_every_issue() {
    let issues = lint_rule(&rule_with_problems(), &TransformOptions::default());
    let rendered = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");

    insta::assert_snapshot!(rendered, @r"
    warning: target field 'contact' is written by 2 mappings
    error: email, step 1 ('1'): split step requires a parameter
    warning: email, step 2 ('2'): trim ignores its parameter
    error: created, step 1 ('d'): invalid date_format parameter '%Q': unsupported format specifier
    error: created, step 2 ('e'): custom expression failed: syntax error at offset 7: unexpected end of expression
    error: name, step 1 ('s'): invalid substring parameter 'one,two': 'one' is not an integer
    ");
}

#[test]
fn errors_and_warnings_are_separable() {
    let issues = lint_rule(&rule_with_problems(), &TransformOptions::default());
    let errors = issues.iter().filter(|i| i.is_error()).count();
    assert_eq!(errors, 4);
    assert_eq!(issues.len() - errors, 2);
}
