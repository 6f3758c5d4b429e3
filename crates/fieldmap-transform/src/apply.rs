//! Apply a whole rule to records.
//!
//! Each mapping runs independently: a failing field is reported and the
//! remaining mappings of the record still run.

use std::collections::BTreeMap;

use fieldmap_model::TransformationRule;
use serde::Serialize;
use tracing::{debug, info_span};

use crate::error::PipelineError;
use crate::options::TransformOptions;
use crate::pipeline::run_mapping;

/// A record as field name to value.
pub type Record = BTreeMap<String, String>;

/// A mapping that failed on one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub source_field: String,
    pub target_field: String,
    pub step_id: String,
    pub message: String,
}

impl FieldError {
    fn new(source_field: &str, target_field: &str, error: &PipelineError) -> Self {
        Self {
            source_field: source_field.to_string(),
            target_field: target_field.to_string(),
            step_id: error.step_id.clone(),
            message: error.to_string(),
        }
    }
}

/// Output of applying a rule to one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    /// Target field to transformed value, for every mapping that succeeded.
    pub output: Record,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl RecordOutcome {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub ok: usize,
    pub failed: usize,
    pub records: Vec<RecordOutcome>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.ok + self.failed
    }

    /// Field errors with the index of the record they belong to.
    pub fn errors(&self) -> impl Iterator<Item = (usize, &FieldError)> {
        self.records
            .iter()
            .enumerate()
            .flat_map(|(index, record)| record.errors.iter().map(move |e| (index, e)))
    }
}

/// Apply every mapping of `rule` to `record`.
///
/// A source field missing from the record is treated as an empty string.
pub fn apply_record(rule: &TransformationRule, record: &Record, options: &TransformOptions) -> RecordOutcome {
    let mut outcome = RecordOutcome::default();
    for mapping in &rule.mappings {
        let input = record
            .get(&mapping.source_field)
            .map(String::as_str)
            .unwrap_or_default();
        match run_mapping(mapping, input, options) {
            Ok(value) => {
                outcome.output.insert(mapping.target_field.clone(), value);
            }
            Err(error) => {
                outcome
                    .errors
                    .push(FieldError::new(&mapping.source_field, &mapping.target_field, &error));
            }
        }
    }
    outcome
}

/// Apply `rule` to every record in order.
pub fn apply_batch<'a, I>(rule: &TransformationRule, records: I, options: &TransformOptions) -> BatchReport
where
    I: IntoIterator<Item = &'a Record>,
{
    let span = info_span!("apply_batch", endpoint = %rule.endpoint_id);
    let _guard = span.enter();

    let mut report = BatchReport::default();
    for record in records {
        let outcome = apply_record(rule, record, options);
        if outcome.is_ok() {
            report.ok += 1;
        } else {
            report.failed += 1;
        }
        report.records.push(outcome);
    }
    debug!(ok = report.ok, failed = report.failed, "batch applied");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldmap_model::{FieldMapping, StepKind, TransformationStep};

    fn rule() -> TransformationRule {
        let mut rule = TransformationRule::new("crm", "CRM export").unwrap();
        rule.add_mapping(
            FieldMapping::new("name", "full_name")
                .unwrap()
                .with_step(TransformationStep::new("1", StepKind::Trim))
                .unwrap(),
        )
        .unwrap();
        rule.add_mapping(
            FieldMapping::new("amount", "total")
                .unwrap()
                .with_step(TransformationStep::new("1", StepKind::NumberFormat).with_parameter("2"))
                .unwrap(),
        )
        .unwrap();
        rule
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn failing_field_does_not_stop_others() {
        let outcome = apply_record(
            &rule(),
            &record(&[("name", " Ada "), ("amount", "n/a")]),
            &TransformOptions::default(),
        );
        assert_eq!(outcome.output.get("full_name").map(String::as_str), Some("Ada"));
        assert!(!outcome.output.contains_key("total"));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].source_field, "amount");
    }

    #[test]
    fn missing_source_field_reads_as_empty() {
        let mut rule = TransformationRule::new("crm", "CRM").unwrap();
        rule.add_mapping(
            FieldMapping::new("country", "country_code")
                .unwrap()
                .with_step(TransformationStep::new("1", StepKind::Default).with_parameter("US"))
                .unwrap(),
        )
        .unwrap();
        let outcome = apply_record(&rule, &Record::new(), &TransformOptions::default());
        assert_eq!(outcome.output.get("country_code").map(String::as_str), Some("US"));
    }

    #[test]
    fn batch_counts_ok_and_failed() {
        let records = [
            record(&[("name", "a"), ("amount", "1")]),
            record(&[("name", "b"), ("amount", "x")]),
            record(&[("name", "c"), ("amount", "1234.5")]),
        ];
        let report = apply_batch(&rule(), &records, &TransformOptions::default());
        assert_eq!((report.ok, report.failed, report.total()), (2, 1, 3));
        assert_eq!(report.records[2].output["total"], "1,234.50");
        let errors: Vec<_> = report.errors().map(|(i, e)| (i, e.target_field.as_str())).collect();
        assert_eq!(errors, [(1, "total")]);
    }
}
