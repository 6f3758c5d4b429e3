use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, info_span};

use fieldmap_cli::logging::redact_value;
use fieldmap_cli::records::{CsvTable, output_headers, write_output};
use fieldmap_model::TransformationRule;
use fieldmap_store::{JsonFileStore, RuleStore, read_rule_file, write_rule_file};
use fieldmap_transform::{
    LintIssue, TransformOptions, apply_batch, lint_rule, preview, preview_traced,
};
use fieldmap_validate::{RuleSet, validate_records};

use crate::cli::{ApplyArgs, CheckArgs, PreviewArgs, StoreCommand};
use crate::summary::{
    kinds_table, lint_table, print_apply_summary, rule_table, store_table, trace_table,
};

/// Process exit status of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    /// The command ran but found failures worth a non-zero exit.
    Issues,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::Issues => 1,
        }
    }

    fn from_failed(failed: bool) -> Self {
        if failed { Self::Issues } else { Self::Clean }
    }
}

fn load_rule(path: &Path) -> Result<TransformationRule> {
    read_rule_file(path).with_context(|| format!("load rule {}", path.display()))
}

pub fn run_kinds() -> Result<Outcome> {
    println!("{}", kinds_table());
    Ok(Outcome::Clean)
}

pub fn run_preview(args: &PreviewArgs, options: &TransformOptions) -> Result<Outcome> {
    let rule = load_rule(&args.rule_file)?;
    let mapping = rule.mapping(&args.source_field).ok_or_else(|| {
        anyhow!(
            "rule '{}' has no mapping for source field '{}'",
            rule.endpoint_id,
            args.source_field
        )
    })?;
    debug!(
        endpoint = %rule.endpoint_id,
        source = %mapping.source_field,
        sample = redact_value(&args.sample),
        "previewing mapping"
    );

    let outcome = if args.trace {
        let traced = preview_traced(mapping, &args.sample, options);
        if !traced.steps.is_empty() {
            println!("{}", trace_table(&traced));
        }
        traced.outcome
    } else {
        preview(mapping, &args.sample, options)
    };
    println!("{}", outcome.render());
    Ok(Outcome::from_failed(!outcome.is_success()))
}

pub fn run_check(args: &CheckArgs, options: &TransformOptions) -> Result<Outcome> {
    let rule = load_rule(&args.rule_file)?;
    let issues = lint_rule(&rule, options);
    if issues.is_empty() {
        println!(
            "{}: {} mappings, {} steps, no issues",
            rule.endpoint_id,
            rule.mappings.len(),
            rule.step_count()
        );
        return Ok(Outcome::Clean);
    }
    println!("{}", lint_table(&issues));
    Ok(Outcome::from_failed(issues.iter().any(LintIssue::is_error)))
}

pub fn run_apply(args: &ApplyArgs, options: &TransformOptions) -> Result<Outcome> {
    let rule = load_rule(&args.rule_file)?;
    let span = info_span!("apply", endpoint = %rule.endpoint_id);
    let _guard = span.enter();

    let validation = args
        .validate
        .as_deref()
        .map(|path| {
            RuleSet::from_json_file(path)
                .with_context(|| format!("load validation rules {}", path.display()))
        })
        .transpose()?;

    let input = CsvTable::from_path(&args.input)?;
    info!(rows = input.records.len(), "input loaded");

    let report = apply_batch(&rule, &input.records, options);
    let issues = validation
        .as_ref()
        .map(|rules| validate_records(rules, report.records.iter().map(|r| &r.output)))
        .unwrap_or_default();
    info!(ok = report.ok, failed = report.failed, issues = issues.len(), "batch complete");

    let headers = output_headers(&rule);
    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
            write_output(BufWriter::new(file), &headers, &report)
                .with_context(|| format!("write {}", path.display()))?;
            print_apply_summary(&mut io::stdout().lock(), &report, &issues)?;
        }
        None => {
            write_output(io::stdout().lock(), &headers, &report).context("write output")?;
            print_apply_summary(&mut io::stderr().lock(), &report, &issues)?;
        }
    }

    Ok(Outcome::from_failed(report.failed > 0 || !issues.is_empty()))
}

pub fn run_store(command: &StoreCommand, store_dir: &Path) -> Result<Outcome> {
    let store = JsonFileStore::new(store_dir)
        .with_context(|| format!("open rule store {}", store_dir.display()))?;
    match command {
        StoreCommand::List => {
            let summaries = store.list().context("list rules")?;
            if summaries.is_empty() {
                println!("No rules in {}", store.base_dir().display());
            } else {
                println!("{}", store_table(&summaries));
            }
        }
        StoreCommand::Show { endpoint_id } => {
            let rule = store
                .load(endpoint_id)
                .with_context(|| format!("load rule '{endpoint_id}'"))?;
            println!("{} ({})", rule.display_name, rule.endpoint_id);
            println!("{}", rule_table(&rule));
        }
        StoreCommand::Import { rule_file } => {
            let rule = load_rule(rule_file)?;
            let replaced = store.exists(&rule.endpoint_id)?;
            store
                .save(&rule)
                .with_context(|| format!("save rule '{}'", rule.endpoint_id))?;
            let verb = if replaced { "Replaced" } else { "Imported" };
            println!("{verb} '{}' ({} mappings)", rule.endpoint_id, rule.mappings.len());
        }
        StoreCommand::Export {
            endpoint_id,
            output,
        } => {
            let rule = store
                .load(endpoint_id)
                .with_context(|| format!("load rule '{endpoint_id}'"))?;
            match output {
                Some(path) => {
                    write_rule_file(path, &rule)
                        .with_context(|| format!("write {}", path.display()))?;
                    println!("Exported '{endpoint_id}' to {}", path.display());
                }
                None => {
                    let json = fieldmap_store::StoredRule::new(&rule)?.to_json()?;
                    let mut stdout = io::stdout().lock();
                    writeln!(stdout, "{json}")?;
                }
            }
        }
        StoreCommand::Remove { endpoint_id } => {
            if !store.delete(endpoint_id)? {
                bail!("no rule stored for endpoint '{endpoint_id}'");
            }
            println!("Removed '{endpoint_id}'");
        }
    }
    Ok(Outcome::Clean)
}
