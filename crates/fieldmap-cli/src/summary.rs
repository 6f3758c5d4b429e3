//! Table rendering for command output.

use std::io::{self, Write};

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use fieldmap_model::{ParameterUse, StepKind, TransformationRule, TransformationStep};
use fieldmap_store::RuleSummary;
use fieldmap_transform::{BatchReport, LintIssue, LintSeverity, TracedPreview};
use fieldmap_validate::ValidationIssue;

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

pub fn kinds_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Name"),
        header_cell("Parameter"),
        header_cell("Meaning"),
    ]);
    apply_table_style(&mut table);
    for kind in StepKind::ALL {
        let parameter = match kind.parameter_use() {
            ParameterUse::Unused => dim_cell("-"),
            ParameterUse::Optional => Cell::new("optional"),
            ParameterUse::Required => Cell::new("required").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(kind.as_str()).add_attribute(Attribute::Bold),
            Cell::new(kind.display_name()),
            parameter,
            Cell::new(kind.parameter_hint()),
        ]);
    }
    table
}

pub fn trace_table(traced: &TracedPreview) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Step"),
        header_cell("Kind"),
        header_cell("Output"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for (index, trace) in traced.steps.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&trace.step_id),
            Cell::new(trace.kind),
            Cell::new(&trace.output),
        ]);
    }
    table
}

pub fn lint_table(issues: &[LintIssue]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Source field"),
        header_cell("Step"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for issue in issues {
        let step = match (issue.step_index, &issue.step_id) {
            (Some(index), Some(id)) => Cell::new(format!("{} ({id})", index + 1)),
            _ => dim_cell("-"),
        };
        table.add_row(vec![
            severity_cell(issue.severity),
            issue
                .source_field
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            step,
            Cell::new(&issue.message),
        ]);
    }
    table
}

pub fn store_table(summaries: &[RuleSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Endpoint"),
        header_cell("Name"),
        header_cell("Mappings"),
        header_cell("Steps"),
        header_cell("Saved"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for summary in summaries {
        table.add_row(vec![
            Cell::new(&summary.endpoint_id).add_attribute(Attribute::Bold),
            Cell::new(&summary.display_name),
            Cell::new(summary.mapping_count),
            Cell::new(summary.step_count),
            summary.saved_at.map_or_else(
                || dim_cell("-"),
                |at| Cell::new(at.format("%Y-%m-%d %H:%M:%S UTC")),
            ),
        ]);
    }
    table
}

pub fn rule_table(rule: &TransformationRule) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Target"),
        header_cell("Steps"),
    ]);
    apply_table_style(&mut table);
    for mapping in &rule.mappings {
        let steps = if mapping.is_passthrough() {
            dim_cell("(passthrough)")
        } else {
            Cell::new(
                mapping
                    .steps
                    .iter()
                    .map(describe_step)
                    .collect::<Vec<_>>()
                    .join(" → "),
            )
        };
        table.add_row(vec![
            Cell::new(&mapping.source_field),
            Cell::new(&mapping.target_field),
            steps,
        ]);
    }
    table
}

fn describe_step(step: &TransformationStep) -> String {
    match step.parameter() {
        Some(parameter) => format!("{}({parameter:?})", step.kind),
        None => step.kind.to_string(),
    }
}

/// Print the batch summary, field errors and validation issues.
pub fn print_apply_summary<W: Write>(
    out: &mut W,
    report: &BatchReport,
    issues: &[ValidationIssue],
) -> io::Result<()> {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Records"),
        header_cell("OK"),
        header_cell("Failed"),
        header_cell("Validation issues"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 0..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    table.add_row(vec![
        Cell::new(report.total()).add_attribute(Attribute::Bold),
        count_cell(report.ok, Color::Green),
        count_cell(report.failed, Color::Red),
        count_cell(issues.len(), Color::Yellow),
    ]);
    writeln!(out, "{table}")?;

    let errors: Vec<_> = report.errors().collect();
    if !errors.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Row"),
            header_cell("Field"),
            header_cell("Step"),
            header_cell("Error"),
        ]);
        apply_table_style(&mut table);
        align_column(&mut table, 0, CellAlignment::Right);
        for (index, error) in errors {
            table.add_row(vec![
                Cell::new(index + 1),
                Cell::new(format!("{} → {}", error.source_field, error.target_field)),
                Cell::new(&error.step_id),
                Cell::new(&error.message),
            ]);
        }
        writeln!(out)?;
        writeln!(out, "Errors:")?;
        writeln!(out, "{table}")?;
    }

    if !issues.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Row"),
            header_cell("Field"),
            header_cell("Issue"),
            header_cell("Message"),
        ]);
        apply_table_style(&mut table);
        align_column(&mut table, 0, CellAlignment::Right);
        for issue in issues {
            table.add_row(vec![
                issue
                    .record
                    .map_or_else(|| dim_cell("-"), |index| Cell::new(index + 1)),
                Cell::new(&issue.field),
                Cell::new(issue.kind),
                Cell::new(&issue.message),
            ]);
        }
        writeln!(out)?;
        writeln!(out, "Validation:")?;
        writeln!(out, "{table}")?;
    }
    Ok(())
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value.to_string()).add_attribute(Attribute::Dim)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn severity_cell(severity: LintSeverity) -> Cell {
    match severity {
        LintSeverity::Error => Cell::new("error").fg(Color::Red).add_attribute(Attribute::Bold),
        LintSeverity::Warning => Cell::new("warning").fg(Color::Yellow),
    }
}
