//! Numeric parsing and locale grouping for `number_format` steps.

use crate::options::NumberFormatOptions;

/// Parses a string as a finite f64, returning None for invalid or empty strings.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Render a number with digit grouping.
///
/// With `fraction_digits` set, exactly that many fraction digits are shown.
/// Otherwise up to `options.max_fraction_digits` are kept and trailing zeros
/// are dropped, so `1234.5` renders as `1,234.5`.
pub fn format_grouped(
    value: f64,
    fraction_digits: Option<usize>,
    options: &NumberFormatOptions,
) -> String {
    let digits = fraction_digits.unwrap_or(options.max_fraction_digits);
    let mut plain = format!("{:.digits$}", value.abs());
    if fraction_digits.is_none() && plain.contains('.') {
        let kept = plain.trim_end_matches('0').trim_end_matches('.').len();
        plain.truncate(kept);
    }

    let (integer, fraction) = match plain.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (plain.as_str(), None),
    };

    let mut out = String::with_capacity(plain.len() + plain.len() / 3 + 1);
    let is_zero = plain.bytes().all(|b| b == b'0' || b == b'.');
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            out.push_str(&options.group_separator);
        }
        out.push(c);
    }
    if let Some(fraction) = fraction {
        out.push_str(&options.decimal_separator);
        out.push_str(fraction);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_rejects_non_finite() {
        assert_eq!(parse_number(" 42.5 "), Some(42.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn groups_integer_digits() {
        let opts = NumberFormatOptions::default();
        assert_eq!(format_grouped(0.0, None, &opts), "0");
        assert_eq!(format_grouped(999.0, None, &opts), "999");
        assert_eq!(format_grouped(1000.0, None, &opts), "1,000");
        assert_eq!(format_grouped(1234567.891, None, &opts), "1,234,567.891");
        assert_eq!(format_grouped(-1234.5, None, &opts), "-1,234.5");
    }

    #[test]
    fn fixed_fraction_digits() {
        let opts = NumberFormatOptions::default();
        assert_eq!(format_grouped(1234.5, Some(2), &opts), "1,234.50");
        assert_eq!(format_grouped(1234.5, Some(0), &opts), "1,234");
        assert_eq!(format_grouped(-0.0001, Some(2), &opts), "0.00");
    }

    #[test]
    fn rounds_to_max_fraction_digits() {
        let opts = NumberFormatOptions::default();
        assert_eq!(format_grouped(3.14159, None, &opts), "3.142");
        assert_eq!(format_grouped(2.0004, None, &opts), "2");
    }

    #[test]
    fn custom_separators() {
        let opts = NumberFormatOptions {
            group_separator: ".".to_string(),
            decimal_separator: ",".to_string(),
            max_fraction_digits: 2,
        };
        assert_eq!(format_grouped(1234567.25, None, &opts), "1.234.567,25");
    }
}
