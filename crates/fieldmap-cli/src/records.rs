//! CSV input and output for batch application.

use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use fieldmap_model::TransformationRule;
use fieldmap_transform::{BatchReport, Record};

/// Rows of a CSV file keyed by header.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl CsvTable {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("read CSV {}", path.display()))
    }

    /// Parse CSV with a header row. Short rows leave trailing fields unset.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut records = Vec::new();
        for (index, row) in reader.records().enumerate() {
            let row = row.with_context(|| format!("row {}", index + 1))?;
            records.push(
                headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, value)| (header.clone(), value.to_string()))
                    .collect(),
            );
        }
        Ok(Self { headers, records })
    }
}

/// Output columns: target fields in mapping order, without repeats.
pub fn output_headers(rule: &TransformationRule) -> Vec<String> {
    let mut headers: Vec<String> = Vec::with_capacity(rule.mappings.len());
    for mapping in &rule.mappings {
        if !headers.contains(&mapping.target_field) {
            headers.push(mapping.target_field.clone());
        }
    }
    headers
}

/// Write every transformed record. Fields that failed are left empty.
pub fn write_output<W: Write>(writer: W, headers: &[String], report: &BatchReport) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(headers)?;
    for outcome in &report.records {
        writer.write_record(
            headers
                .iter()
                .map(|h| outcome.output.get(h).map(String::as_str).unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_by_header() {
        let table = CsvTable::from_reader(" name ,email\nAda,ada@example.com\nGrace\n".as_bytes())
            .unwrap();
        assert_eq!(table.headers, ["name", "email"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0]["email"], "ada@example.com");
        assert!(!table.records[1].contains_key("email"));
    }
}
