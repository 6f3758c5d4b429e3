use std::collections::BTreeMap;

use fieldmap_validate::{
    FieldFormat, FieldRule, IssueKind, RuleSet, validate_record, validate_records,
};

fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn contact_rules() -> RuleSet {
    RuleSet::compile([
        FieldRule::new("email").required().with_format(FieldFormat::Email),
        FieldRule::new("age").with_format(FieldFormat::Integer),
        FieldRule::new("signup").with_format(FieldFormat::Date),
        FieldRule::new("country").with_format(FieldFormat::Pattern {
            pattern: "^[A-Z]{2}$".to_string(),
        }),
        FieldRule::new("name").required().with_format(FieldFormat::MaxLength { max: 5 }),
    ])
    .expect("compile rules")
}

#[test]
fn valid_record_has_no_issues() {
    let issues = validate_record(
        &contact_rules(),
        &record(&[
            ("email", "ada@example.com"),
            ("age", "36"),
            ("signup", "2024-01-31"),
            ("country", "GB"),
            ("name", "Ada"),
        ]),
    );
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn optional_empty_values_skip_format_checks() {
    let issues = validate_record(
        &contact_rules(),
        &record(&[("email", "ada@example.com"), ("age", ""), ("name", "Ada")]),
    );
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn each_failed_rule_is_reported() {
    let issues = validate_record(
        &contact_rules(),
        &record(&[
            ("age", "thirty"),
            ("signup", "someday"),
            ("country", "gbr"),
            ("name", "Augusta"),
        ]),
    );
    let kinds: Vec<_> = issues.iter().map(|i| (i.field.as_str(), i.kind)).collect();
    assert_eq!(
        kinds,
        [
            ("email", IssueKind::Missing),
            ("age", IssueKind::InvalidFormat),
            ("signup", IssueKind::InvalidFormat),
            ("country", IssueKind::InvalidFormat),
            ("name", IssueKind::TooLong),
        ]
    );
}

#[test]
fn batch_issues_carry_record_index() {
    let records = [
        record(&[("email", "a@b.co"), ("name", "A")]),
        record(&[("email", "nope"), ("name", "B")]),
    ];
    let issues = validate_records(&contact_rules(), &records);
    let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();

    insta::assert_snapshot!(rendered.join("\n"), @"record 2: email: 'nope' is not an email address");
}
