//! Step evaluator.
//!
//! Maps `(kind, parameter, input)` to an output string or a [`StepError`].
//! Every kind is a pure function of its arguments and the explicit
//! [`TransformOptions`]; nothing here performs I/O or keeps state.

use chrono::{NaiveDate, NaiveDateTime};
use fieldmap_model::{StepKind, TransformationStep};
use regex::{Regex, RegexBuilder};

use crate::error::{ConfigError, StepError};
use crate::expr::{Expression, js_substring};
use crate::normalization::{format_date, format_grouped, parse_date_value, parse_number, resolve_format};
use crate::options::TransformOptions;

/// Largest fixed fraction-digit count accepted by `number_format`.
const MAX_FRACTION_DIGITS: usize = 20;

/// Apply one step to an input value.
pub fn apply_step(
    step: &TransformationStep,
    input: &str,
    options: &TransformOptions,
) -> Result<String, StepError> {
    evaluate(step.kind, step.parameter(), input, options)
}

/// Evaluate a step kind with its parameter against an input value.
pub fn evaluate(
    kind: StepKind,
    parameter: Option<&str>,
    input: &str,
    options: &TransformOptions,
) -> Result<String, StepError> {
    match kind {
        StepKind::Uppercase => Ok(input.to_uppercase()),
        StepKind::Lowercase => Ok(input.to_lowercase()),
        StepKind::Trim => Ok(input.trim().to_string()),
        StepKind::Concat => Ok(format!("{input}{}", parameter.unwrap_or_default())),
        StepKind::Split => {
            let delimiter = split_delimiter(parameter)?;
            Ok(input
                .split(delimiter)
                .next()
                .unwrap_or_default()
                .to_string())
        }
        StepKind::Substring => {
            let (start, end) = substring_bounds(parameter)?;
            Ok(js_substring(input, start as f64, end.map(|e| e as f64)))
        }
        StepKind::Replace => {
            let (pattern, replacement) = replace_parts(parameter)?;
            let regex = compile_pattern(pattern, options)?;
            Ok(regex.replace_all(input, replacement).into_owned())
        }
        StepKind::DateFormat => {
            let format = date_format(parameter, options);
            let Some(value) = parse_date_value(input) else {
                return Err(StepError::invalid_input(kind, input, "not a recognized date"));
            };
            format_date(&value, &format).map_err(|reason| {
                ConfigError::invalid(kind, parameter.unwrap_or(&options.default_date_format), reason)
                    .into()
            })
        }
        StepKind::NumberFormat => {
            let digits = fraction_digits(parameter)?;
            let Some(value) = parse_number(input) else {
                return Err(StepError::invalid_input(kind, input, "not a number"));
            };
            Ok(format_grouped(value, digits, &options.number))
        }
        StepKind::Default => {
            let fallback = required(kind, parameter)?;
            if input.is_empty() {
                Ok(fallback.to_string())
            } else {
                Ok(input.to_string())
            }
        }
        StepKind::Custom => {
            let body = required(kind, parameter)?;
            Expression::compile(body, &options.expr)
                .and_then(|expr| expr.evaluate(input, &options.expr))
                .map_err(|e| StepError::CustomEvalFailed(e.to_string()))
        }
    }
}

/// Check a step's parameter without evaluating it against any input.
///
/// Returns the error evaluation would report for every input: missing or
/// malformed parameters, invalid patterns, unsupported date formats and
/// custom expressions that do not compile.
pub fn check_step(step: &TransformationStep, options: &TransformOptions) -> Result<(), StepError> {
    let kind = step.kind;
    let parameter = step.parameter();
    match kind {
        StepKind::Uppercase | StepKind::Lowercase | StepKind::Trim | StepKind::Concat => Ok(()),
        StepKind::Split => {
            split_delimiter(parameter)?;
            Ok(())
        }
        StepKind::Substring => {
            substring_bounds(parameter)?;
            Ok(())
        }
        StepKind::Replace => {
            let (pattern, _) = replace_parts(parameter)?;
            compile_pattern(pattern, options).map(drop)
        }
        StepKind::DateFormat => {
            let format = date_format(parameter, options);
            let probe = NaiveDate::from_ymd_opt(2000, 1, 31)
                .and_then(|d| d.and_hms_opt(13, 45, 30))
                .unwrap_or(NaiveDateTime::MIN);
            format_date(&probe, &format).map(drop).map_err(|reason| {
                ConfigError::invalid(kind, parameter.unwrap_or(&options.default_date_format), reason)
                    .into()
            })
        }
        StepKind::NumberFormat => {
            fraction_digits(parameter)?;
            Ok(())
        }
        StepKind::Default => {
            required(kind, parameter)?;
            Ok(())
        }
        StepKind::Custom => {
            let body = required(kind, parameter)?;
            Expression::compile(body, &options.expr)
                .map(drop)
                .map_err(|e| StepError::CustomEvalFailed(e.to_string()))
        }
    }
}

fn required(kind: StepKind, parameter: Option<&str>) -> Result<&str, ConfigError> {
    parameter.ok_or(ConfigError::MissingParameter { kind })
}

fn split_delimiter(parameter: Option<&str>) -> Result<&str, ConfigError> {
    let delimiter = required(StepKind::Split, parameter)?;
    if delimiter.is_empty() {
        return Err(ConfigError::invalid(
            StepKind::Split,
            delimiter,
            "delimiter must not be empty",
        ));
    }
    Ok(delimiter)
}

/// Parse `start,end` or `start` into character offsets.
fn substring_bounds(parameter: Option<&str>) -> Result<(i64, Option<i64>), ConfigError> {
    let kind = StepKind::Substring;
    let raw = required(kind, parameter)?;
    let parse = |part: &str| {
        part.trim().parse::<i64>().map_err(|_| {
            ConfigError::invalid(kind, raw, format!("'{}' is not an integer", part.trim()))
        })
    };

    let mut parts = raw.split(',');
    let start = parse(parts.next().unwrap_or_default())?;
    let end = parts.next().map(parse).transpose()?;
    if parts.next().is_some() {
        return Err(ConfigError::invalid(kind, raw, "expected start,end"));
    }
    Ok((start, end))
}

/// Split `find,replace` on the first comma; without a comma the replacement is empty.
fn replace_parts(parameter: Option<&str>) -> Result<(&str, &str), ConfigError> {
    let kind = StepKind::Replace;
    let raw = required(kind, parameter)?;
    let (pattern, replacement) = raw.split_once(',').unwrap_or((raw, ""));
    if pattern.is_empty() {
        return Err(ConfigError::invalid(kind, raw, "pattern must not be empty"));
    }
    Ok((pattern, replacement))
}

fn compile_pattern(pattern: &str, options: &TransformOptions) -> Result<Regex, StepError> {
    RegexBuilder::new(pattern)
        .size_limit(options.regex_size_limit)
        .build()
        .map_err(|e| StepError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

fn date_format(parameter: Option<&str>, options: &TransformOptions) -> String {
    match parameter.map(str::trim) {
        Some(pattern) if !pattern.is_empty() => resolve_format(pattern),
        _ => resolve_format(&options.default_date_format),
    }
}

fn fraction_digits(parameter: Option<&str>) -> Result<Option<usize>, ConfigError> {
    let Some(raw) = parameter.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<usize>() {
        Ok(digits) if digits <= MAX_FRACTION_DIGITS => Ok(Some(digits)),
        _ => Err(ConfigError::invalid(
            StepKind::NumberFormat,
            raw,
            format!("expected a digit count between 0 and {MAX_FRACTION_DIGITS}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ExprLimits;

    fn eval(kind: StepKind, parameter: Option<&str>, input: &str) -> Result<String, StepError> {
        evaluate(kind, parameter, input, &TransformOptions::default())
    }

    #[test]
    fn case_and_whitespace() {
        assert_eq!(eval(StepKind::Uppercase, None, "hello").unwrap(), "HELLO");
        assert_eq!(eval(StepKind::Uppercase, None, "").unwrap(), "");
        assert_eq!(eval(StepKind::Uppercase, None, "straße").unwrap(), "STRASSE");
        assert_eq!(eval(StepKind::Lowercase, None, "ÀB").unwrap(), "àb");
        assert_eq!(eval(StepKind::Trim, None, "\t hi \n").unwrap(), "hi");
    }

    #[test]
    fn concat_treats_missing_parameter_as_empty() {
        assert_eq!(
            eval(StepKind::Concat, Some("_suffix"), "field").unwrap(),
            "field_suffix"
        );
        assert_eq!(eval(StepKind::Concat, None, "field").unwrap(), "field");
    }

    #[test]
    fn split_keeps_first_segment() {
        assert_eq!(eval(StepKind::Split, Some(","), "a,b,c").unwrap(), "a");
        assert_eq!(eval(StepKind::Split, Some(";"), "a,b").unwrap(), "a,b");
        assert_eq!(eval(StepKind::Split, Some(" - "), "x - y").unwrap(), "x");
        assert!(matches!(
            eval(StepKind::Split, Some(""), "a"),
            Err(StepError::Config(ConfigError::InvalidParameter { .. }))
        ));
        assert!(matches!(
            eval(StepKind::Split, None, "a"),
            Err(StepError::Config(ConfigError::MissingParameter { .. }))
        ));
    }

    #[test]
    fn substring_clamps_bounds() {
        assert_eq!(eval(StepKind::Substring, Some("0,3"), "abcdef").unwrap(), "abc");
        assert_eq!(eval(StepKind::Substring, Some("2"), "abcdef").unwrap(), "cdef");
        assert_eq!(eval(StepKind::Substring, Some("4,100"), "abcdef").unwrap(), "ef");
        assert_eq!(eval(StepKind::Substring, Some("-5, 2"), "abcdef").unwrap(), "ab");
        assert_eq!(eval(StepKind::Substring, Some("3,1"), "abcdef").unwrap(), "bc");
        assert_eq!(eval(StepKind::Substring, Some("10,20"), "abc").unwrap(), "");
        assert_eq!(eval(StepKind::Substring, Some("1,3"), "żółw").unwrap(), "ół");
    }

    #[test]
    fn substring_rejects_non_numeric_bounds() {
        let err = eval(StepKind::Substring, Some("abc"), "abcdef").unwrap_err();
        assert!(err.is_config_error());
        assert!(eval(StepKind::Substring, Some("1,2,3"), "abcdef").is_err());
        assert!(eval(StepKind::Substring, Some("1,"), "abcdef").is_err());
    }

    #[test]
    fn replace_uses_pattern_syntax() {
        assert_eq!(
            eval(StepKind::Replace, Some(r"\s+, "), "a  b   c").unwrap(),
            "a b c"
        );
        assert_eq!(
            eval(StepKind::Replace, Some(r"(\d+)-(\d+),$2/$1"), "10-20").unwrap(),
            "20/10"
        );
        assert_eq!(eval(StepKind::Replace, Some("-"), "a-b-c").unwrap(), "abc");
        assert_eq!(eval(StepKind::Replace, Some("x,y"), "abc").unwrap(), "abc");
    }

    #[test]
    fn replace_reports_invalid_pattern() {
        let err = eval(StepKind::Replace, Some("(unclosed,x"), "abc").unwrap_err();
        assert!(matches!(err, StepError::InvalidPattern { .. }));
        let err = eval(StepKind::Replace, Some(",x"), "abc").unwrap_err();
        assert!(matches!(err, StepError::Config(_)));
    }

    #[test]
    fn date_format_reformats() {
        assert_eq!(
            eval(StepKind::DateFormat, Some("DD/MM/YYYY"), "2024-03-05").unwrap(),
            "05/03/2024"
        );
        assert_eq!(
            eval(StepKind::DateFormat, None, "03/05/2024").unwrap(),
            "2024-03-05"
        );
        assert_eq!(
            eval(StepKind::DateFormat, Some("%Y-%m-%dT%H:%M"), "2024-03-05 08:15:00").unwrap(),
            "2024-03-05T08:15"
        );
    }

    #[test]
    fn date_format_rejects_bad_input_and_format() {
        assert!(matches!(
            eval(StepKind::DateFormat, None, "not a date"),
            Err(StepError::InvalidInput { .. })
        ));
        assert!(matches!(
            eval(StepKind::DateFormat, Some("%Q"), "2024-03-05"),
            Err(StepError::Config(_))
        ));
    }

    #[test]
    fn number_format_groups_digits() {
        assert_eq!(eval(StepKind::NumberFormat, None, "1234567.5").unwrap(), "1,234,567.5");
        assert_eq!(eval(StepKind::NumberFormat, Some("2"), " 42 ").unwrap(), "42.00");
        assert!(matches!(
            eval(StepKind::NumberFormat, None, "12abc"),
            Err(StepError::InvalidInput { .. })
        ));
        assert!(matches!(
            eval(StepKind::NumberFormat, Some("many"), "1"),
            Err(StepError::Config(_))
        ));
    }

    #[test]
    fn number_format_uses_locale_options() {
        let options = TransformOptions::default().with_european_numbers();
        let out = evaluate(StepKind::NumberFormat, None, "1234.5", &options).unwrap();
        assert_eq!(out, "1.234,5");
    }

    #[test]
    fn date_format_falls_back_to_configured_default() {
        let options = TransformOptions::default().with_default_date_format("DD.MM.YYYY");
        let out = evaluate(StepKind::DateFormat, None, "2024-03-05", &options).unwrap();
        assert_eq!(out, "05.03.2024");
        let out = evaluate(StepKind::DateFormat, Some(" "), "2024-03-05", &options).unwrap();
        assert_eq!(out, "05.03.2024");
    }

    #[test]
    fn custom_uses_configured_limits() {
        let options = TransformOptions::default().with_expr_limits(ExprLimits {
            max_string_len: 8,
            ..ExprLimits::default()
        });
        let body = Some("value + value");
        assert_eq!(evaluate(StepKind::Custom, body, "abcd", &options).unwrap(), "abcdabcd");
        assert!(matches!(
            evaluate(StepKind::Custom, body, "abcde", &options),
            Err(StepError::CustomEvalFailed(_))
        ));
    }

    #[test]
    fn default_fills_empty_values() {
        assert_eq!(eval(StepKind::Default, Some("N/A"), "").unwrap(), "N/A");
        assert_eq!(eval(StepKind::Default, Some("N/A"), "x").unwrap(), "x");
        assert_eq!(eval(StepKind::Default, Some("N/A"), " ").unwrap(), " ");
        assert!(eval(StepKind::Default, None, "").is_err());
    }

    #[test]
    fn custom_runs_sandboxed_expression() {
        assert_eq!(
            eval(StepKind::Custom, Some("return value.split(' ')[0].toUpperCase();"), "ada lovelace")
                .unwrap(),
            "ADA"
        );
        assert!(matches!(
            eval(StepKind::Custom, Some("require('fs')"), "x"),
            Err(StepError::CustomEvalFailed(_))
        ));
        assert!(matches!(
            eval(StepKind::Custom, Some("value.repeat(-1)"), "x"),
            Err(StepError::CustomEvalFailed(_))
        ));
    }

    #[test]
    fn check_step_matches_evaluation_errors() {
        let options = TransformOptions::default();
        let ok = TransformationStep::new("1", StepKind::Substring).with_parameter("0,2");
        assert!(check_step(&ok, &options).is_ok());

        let cases = [
            TransformationStep::new("1", StepKind::Substring).with_parameter("a,b"),
            TransformationStep::new("2", StepKind::Split),
            TransformationStep::new("3", StepKind::Replace).with_parameter("[a-"),
            TransformationStep::new("4", StepKind::DateFormat).with_parameter("%Y %z"),
            TransformationStep::new("5", StepKind::Custom).with_parameter("value +"),
            TransformationStep::new("6", StepKind::Default),
        ];
        for step in cases {
            assert!(check_step(&step, &options).is_err(), "{step:?} should fail");
        }
    }
}
