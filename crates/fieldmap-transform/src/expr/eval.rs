//! Tree-walking interpreter with a step budget.

use std::cmp::Ordering;

use super::parser::{BinaryOp, Expr, Function, Method, UnaryOp};
use super::{ExprError, ExprLimits};

/// Runtime value of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// Render the value as step output.
    ///
    /// Integral numbers drop their fraction, lists are joined with `,`, and
    /// null renders empty.
    pub fn to_output(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Num(n) => format_number(*n),
            Self::Str(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(Value::to_output)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Num(n) => *n != 0.0 && !n.is_nan(),
            Self::Str(s) => !s.is_empty(),
            Self::List(_) => true,
        }
    }

    fn to_number(&self) -> f64 {
        match self {
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Num(n) => *n,
            Self::Str(s) if s.trim().is_empty() => 0.0,
            Self::Str(s) => s.trim().parse().unwrap_or(f64::NAN),
            Self::List(_) => f64::NAN,
        }
    }

    fn is_stringish(&self) -> bool {
        matches!(self, Self::Str(_) | Self::List(_))
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

pub(crate) struct Interpreter<'a> {
    input: &'a str,
    limits: &'a ExprLimits,
    steps: usize,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(input: &'a str, limits: &'a ExprLimits) -> Self {
        Self {
            input,
            limits,
            steps: 0,
        }
    }

    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<Value, ExprError> {
        self.tick()?;
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Input => self.string(self.input.to_string()),
            Expr::Unary(op, operand) => {
                let value = self.eval(operand)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                    UnaryOp::Neg => Value::Num(-value.to_number()),
                })
            }
            Expr::Binary(op, lhs, rhs) => self.binary(*op, lhs, rhs),
            Expr::Conditional(condition, then, otherwise) => {
                if self.eval(condition)?.is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Call(function, args) => self.call(*function, args),
            Expr::Method(target, method, args) => {
                let target = self.eval(target)?;
                let args = self.eval_all(args)?;
                self.method(&target, *method, &args)
            }
            Expr::Length(target) => Ok(match self.eval(target)? {
                Value::List(items) => Value::Num(items.len() as f64),
                other => Value::Num(other.to_output().chars().count() as f64),
            }),
            Expr::Index(target, index) => {
                let target = self.eval(target)?;
                let index = self.eval(index)?.to_number();
                Ok(index_value(&target, index))
            }
        }
    }

    fn eval_all(&mut self, args: &[Expr]) -> Result<Vec<Value>, ExprError> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    fn tick(&mut self) -> Result<(), ExprError> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(ExprError::Limit(format!(
                "evaluation exceeded {} steps",
                self.limits.max_steps
            )));
        }
        Ok(())
    }

    /// Wrap a produced string, enforcing the output size limit.
    fn string(&self, s: String) -> Result<Value, ExprError> {
        if s.len() > self.limits.max_string_len {
            return Err(ExprError::Limit(format!(
                "string result exceeds {} bytes",
                self.limits.max_string_len
            )));
        }
        Ok(Value::Str(s))
    }

    fn binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<Value, ExprError> {
        let left = self.eval(lhs)?;
        // Short-circuit operators return the deciding operand.
        match op {
            BinaryOp::And if !left.is_truthy() => return Ok(left),
            BinaryOp::Or if left.is_truthy() => return Ok(left),
            _ => {}
        }

        let right = self.eval(rhs)?;
        let (a, b) = (left.to_number(), right.to_number());
        Ok(match op {
            BinaryOp::Add if left.is_stringish() || right.is_stringish() => {
                let (mut joined, tail) = (left.to_output(), right.to_output());
                self.check_len(joined.len().saturating_add(tail.len()))?;
                joined.push_str(&tail);
                return self.string(joined);
            }
            BinaryOp::Add => Value::Num(a + b),
            BinaryOp::Sub => Value::Num(a - b),
            BinaryOp::Mul => Value::Num(a * b),
            BinaryOp::Div => Value::Num(a / b),
            BinaryOp::Rem => Value::Num(a % b),
            BinaryOp::Eq => Value::Bool(loose_eq(&left, &right)),
            BinaryOp::Ne => Value::Bool(!loose_eq(&left, &right)),
            BinaryOp::Lt => Value::Bool(compare(&left, &right) == Some(Ordering::Less)),
            BinaryOp::Le => Value::Bool(matches!(
                compare(&left, &right),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinaryOp::Gt => Value::Bool(compare(&left, &right) == Some(Ordering::Greater)),
            BinaryOp::Ge => Value::Bool(matches!(
                compare(&left, &right),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            BinaryOp::And | BinaryOp::Or => right,
        })
    }

    fn call(&mut self, function: Function, args: &[Expr]) -> Result<Value, ExprError> {
        // `if` only evaluates the chosen branch.
        if let (Function::If, [condition, then, otherwise]) = (function, args) {
            let branch = if self.eval(condition)?.is_truthy() {
                then
            } else {
                otherwise
            };
            return self.eval(branch);
        }

        let values = self.eval_all(args)?;
        let text = |i: usize| values.get(i).map(Value::to_output).unwrap_or_default();
        let num = |i: usize| values.get(i).map_or(f64::NAN, Value::to_number);

        match function {
            Function::Upper => self.string(text(0).to_uppercase()),
            Function::Lower => self.string(text(0).to_lowercase()),
            Function::Trim => self.string(text(0).trim().to_string()),
            Function::Len => Ok(Value::Num(text(0).chars().count() as f64)),
            Function::Concat => {
                let parts: Vec<String> = values.iter().map(Value::to_output).collect();
                self.check_len(parts.iter().map(String::len).fold(0, usize::saturating_add))?;
                self.string(parts.concat())
            }
            Function::Substr => {
                let end = values.get(2).map(Value::to_number);
                self.string(js_substring(&text(0), num(1), end))
            }
            Function::Replace => self.replace_literal(&text(0), &text(1), &text(2), true),
            Function::Contains => Ok(Value::Bool(text(0).contains(&text(1)))),
            Function::StartsWith => Ok(Value::Bool(text(0).starts_with(&text(1)))),
            Function::EndsWith => Ok(Value::Bool(text(0).ends_with(&text(1)))),
            Function::Coalesce => Ok(values
                .iter()
                .find(|v| !matches!(v, Value::Null) && !v.to_output().is_empty())
                .cloned()
                .unwrap_or(Value::Null)),
            Function::Number => Ok(Value::Num(num(0))),
            Function::String => self.string(text(0)),
            Function::Round => {
                let digits = values.get(1).map_or(0.0, Value::to_number).clamp(0.0, 12.0);
                let factor = 10f64.powi(digits as i32);
                Ok(Value::Num((num(0) * factor).round() / factor))
            }
            Function::Abs => Ok(Value::Num(num(0).abs())),
            Function::Min => Ok(Value::Num(
                values.iter().map(Value::to_number).fold(f64::INFINITY, f64::min),
            )),
            Function::Max => Ok(Value::Num(
                values
                    .iter()
                    .map(Value::to_number)
                    .fold(f64::NEG_INFINITY, f64::max),
            )),
            Function::If => Err(ExprError::Eval(format!(
                "if() takes 3 arguments, got {}",
                values.len()
            ))),
        }
    }

    fn method(&mut self, target: &Value, method: Method, args: &[Value]) -> Result<Value, ExprError> {
        if let Value::List(items) = target {
            return match method {
                Method::Join => {
                    let sep = args.first().map_or_else(|| ",".to_string(), Value::to_output);
                    let parts: Vec<String> = items.iter().map(Value::to_output).collect();
                    let separators = sep.len().saturating_mul(parts.len().saturating_sub(1));
                    self.check_len(
                        parts
                            .iter()
                            .map(String::len)
                            .fold(separators, usize::saturating_add),
                    )?;
                    self.string(parts.join(&sep))
                }
                Method::ToString => self.string(target.to_output()),
                Method::Includes => {
                    let needle = args.first().cloned().unwrap_or(Value::Null);
                    Ok(Value::Bool(items.iter().any(|item| loose_eq(item, &needle))))
                }
                other => Err(ExprError::Eval(format!(
                    "{} is not available on lists",
                    other.name()
                ))),
            };
        }

        let s = target.to_output();
        let text = |i: usize| args.get(i).map(Value::to_output).unwrap_or_default();
        let num = |i: usize| args.get(i).map(Value::to_number);

        match method {
            Method::ToUpperCase => self.string(s.to_uppercase()),
            Method::ToLowerCase => self.string(s.to_lowercase()),
            Method::Trim => self.string(s.trim().to_string()),
            Method::TrimStart => self.string(s.trim_start().to_string()),
            Method::TrimEnd => self.string(s.trim_end().to_string()),
            Method::ToString => self.string(s),
            Method::Slice => self.string(js_slice(&s, num(0).unwrap_or(0.0), num(1))),
            Method::Substring => self.string(js_substring(&s, num(0).unwrap_or(0.0), num(1))),
            Method::Replace => self.replace_literal(&s, &text(0), &text(1), false),
            Method::ReplaceAll => self.replace_literal(&s, &text(0), &text(1), true),
            Method::Split => {
                let sep = text(0);
                let parts: Vec<Value> = if sep.is_empty() {
                    s.chars().map(|c| Value::Str(c.to_string())).collect()
                } else {
                    s.split(sep.as_str()).map(|p| Value::Str(p.to_string())).collect()
                };
                Ok(Value::List(parts))
            }
            Method::Includes => Ok(Value::Bool(s.contains(&text(0)))),
            Method::StartsWith => Ok(Value::Bool(s.starts_with(&text(0)))),
            Method::EndsWith => Ok(Value::Bool(s.ends_with(&text(0)))),
            Method::IndexOf => {
                let needle = text(0);
                let index = s
                    .find(&needle)
                    .map_or(-1.0, |byte| s[..byte].chars().count() as f64);
                Ok(Value::Num(index))
            }
            Method::CharAt => Ok(Value::Str(
                index_value(target, num(0).unwrap_or(0.0)).to_output(),
            )),
            Method::PadStart | Method::PadEnd => {
                let width = num(0).unwrap_or(0.0);
                let fill = args.get(1).map_or_else(|| " ".to_string(), Value::to_output);
                let current = s.chars().count();
                if !width.is_finite() || width <= current as f64 || fill.is_empty() {
                    return self.string(s);
                }
                let width = width as usize;
                self.check_len(width)?;
                let padding: String = fill.chars().cycle().take(width - current).collect();
                if method == Method::PadStart {
                    self.string(padding + &s)
                } else {
                    self.string(s + &padding)
                }
            }
            Method::Repeat => {
                let count = num(0).unwrap_or(0.0);
                if !count.is_finite() || count < 0.0 {
                    return Err(ExprError::Eval(format!("invalid repeat count {count}")));
                }
                let count = count as usize;
                self.check_len(s.len().saturating_mul(count))?;
                self.string(s.repeat(count))
            }
            Method::Join => Err(ExprError::Eval("join is only available on lists".to_string())),
        }
    }

    /// Literal (non-pattern) replacement, sized before anything is allocated.
    fn replace_literal(
        &self,
        s: &str,
        find: &str,
        replacement: &str,
        all: bool,
    ) -> Result<Value, ExprError> {
        if find.is_empty() {
            return self.string(s.to_string());
        }
        let limit = if all { usize::MAX } else { 1 };
        let occurrences = s.matches(find).take(limit).count();
        let removed = occurrences * find.len();
        self.check_len(
            (s.len() - removed).saturating_add(occurrences.saturating_mul(replacement.len())),
        )?;
        self.string(s.replacen(find, replacement, limit))
    }

    fn check_len(&self, len: usize) -> Result<(), ExprError> {
        if len > self.limits.max_string_len {
            return Err(ExprError::Limit(format!(
                "string result exceeds {} bytes",
                self.limits.max_string_len
            )));
        }
        Ok(())
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Num(x), Value::Num(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Num(_), Value::Str(_)) | (Value::Str(_), Value::Num(_)) => {
            a.to_number() == b.to_number()
        }
        (Value::List(x), Value::List(y)) => x == y,
        _ => false,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => a.to_number().partial_cmp(&b.to_number()),
    }
}

fn index_value(target: &Value, index: f64) -> Value {
    if !index.is_finite() || index < 0.0 || index.fract() != 0.0 {
        return Value::Null;
    }
    let index = index as usize;
    match target {
        Value::List(items) => items.get(index).cloned().unwrap_or(Value::Null),
        other => other
            .to_output()
            .chars()
            .nth(index)
            .map_or(Value::Null, |c| Value::Str(c.to_string())),
    }
}

/// Clamp a fractional offset into `0..=len`.
fn clamp_offset(offset: f64, len: usize) -> usize {
    if offset.is_nan() || offset <= 0.0 {
        0
    } else {
        (offset as usize).min(len)
    }
}

/// `substring` semantics: negative offsets clamp to 0 and swapped bounds are reordered.
pub(crate) fn js_substring(s: &str, start: f64, end: Option<f64>) -> String {
    let len = s.chars().count();
    let mut from = clamp_offset(start, len);
    let mut to = end.map_or(len, |e| clamp_offset(e, len));
    if from > to {
        std::mem::swap(&mut from, &mut to);
    }
    s.chars().skip(from).take(to - from).collect()
}

/// `slice` semantics: negative offsets count from the end, swapped bounds give "".
fn js_slice(s: &str, start: f64, end: Option<f64>) -> String {
    let len = s.chars().count();
    let resolve = |offset: f64| {
        if offset < 0.0 {
            clamp_offset(len as f64 + offset, len)
        } else {
            clamp_offset(offset, len)
        }
    };
    let from = resolve(start);
    let to = end.map_or(len, resolve);
    if from >= to {
        return String::new();
    }
    s.chars().skip(from).take(to - from).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_rendering() {
        assert_eq!(Value::Num(3.0).to_output(), "3");
        assert_eq!(Value::Num(2.5).to_output(), "2.5");
        assert_eq!(Value::Num(f64::INFINITY).to_output(), "Infinity");
        assert_eq!(Value::Null.to_output(), "");
        assert_eq!(
            Value::List(vec![Value::Str("a".into()), Value::Num(1.0)]).to_output(),
            "a,1"
        );
    }

    #[test]
    fn substring_and_slice_offsets() {
        assert_eq!(js_substring("abcdef", 4.0, Some(1.0)), "bcd");
        assert_eq!(js_substring("abcdef", -3.0, Some(2.0)), "ab");
        assert_eq!(js_substring("abc", 1.0, None), "bc");
        assert_eq!(js_slice("abcdef", -2.0, None), "ef");
        assert_eq!(js_slice("abcdef", 4.0, Some(1.0)), "");
        assert_eq!(js_slice("héllo", 1.0, Some(3.0)), "él");
    }
}
