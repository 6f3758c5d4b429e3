//! Value normalization helpers used by the step evaluator.

pub mod datetime;
pub mod numeric;

pub use datetime::{format_date, parse_date_value, resolve_format};
pub use numeric::{format_grouped, parse_number};
