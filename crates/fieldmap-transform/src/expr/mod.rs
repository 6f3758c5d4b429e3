//! Sandboxed expression language for `custom` steps.
//!
//! Custom steps never execute host code. Their body is parsed into a small
//! AST over a whitelisted set of operations and interpreted with explicit
//! resource limits:
//!
//! - literals: `'text'`, `"text"`, numbers, `true`, `false`, `null`
//! - the step input: `value` (alias `input`)
//! - operators: `+ - * / %`, `== != < <= > >=`, `&& || !`, `cond ? a : b`
//! - string methods: `value.trim().toUpperCase()`, `value.split(',')[0]`, ...
//! - functions: `upper`, `lower`, `substr`, `replace`, `coalesce`, `round`, ...
//!
//! A leading `return` and trailing `;` are accepted so editor snippets like
//! `return value.toUpperCase();` work unchanged.
//!
//! # Example
//!
//! ```
//! use fieldmap_transform::expr::{ExprLimits, evaluate};
//!
//! let limits = ExprLimits::default();
//! let out = evaluate("value.split('@')[1] || 'unknown'", "ada@example.com", &limits).unwrap();
//! assert_eq!(out, "example.com");
//! ```

mod eval;
mod lexer;
mod parser;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use eval::Value;
pub(crate) use eval::js_substring;

use eval::Interpreter;
use parser::Expr;

/// Resource limits applied to every compile and evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExprLimits {
    /// Maximum expression source length, in characters.
    pub max_source_len: usize,
    /// Maximum syntactic nesting depth.
    pub max_depth: usize,
    /// Maximum number of evaluated nodes.
    pub max_steps: usize,
    /// Maximum length of any produced string, in bytes.
    pub max_string_len: usize,
}

impl Default for ExprLimits {
    fn default() -> Self {
        Self {
            max_source_len: 4096,
            max_depth: 64,
            max_steps: 10_000,
            max_string_len: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("{0}")]
    Eval(String),

    #[error("limit exceeded: {0}")]
    Limit(String),
}

/// A parsed expression, reusable across inputs.
#[derive(Debug, Clone)]
pub struct Expression {
    ast: Expr,
}

impl Expression {
    /// Parse and resolve an expression body.
    pub fn compile(source: &str, limits: &ExprLimits) -> Result<Self, ExprError> {
        let source_len = source.chars().count();
        if source_len > limits.max_source_len {
            return Err(ExprError::Limit(format!(
                "expression longer than {} characters",
                limits.max_source_len
            )));
        }
        let tokens = lexer::tokenize(source)?;
        let ast = parser::parse(tokens, source_len, limits.max_depth)?;
        Ok(Self { ast })
    }

    /// Evaluate against one input, returning the raw value.
    pub fn eval(&self, input: &str, limits: &ExprLimits) -> Result<Value, ExprError> {
        Interpreter::new(input, limits).eval(&self.ast)
    }

    /// Evaluate against one input and render the result as text.
    pub fn evaluate(&self, input: &str, limits: &ExprLimits) -> Result<String, ExprError> {
        self.eval(input, limits).map(|value| value.to_output())
    }
}

/// Compile and evaluate in one call.
pub fn evaluate(source: &str, input: &str, limits: &ExprLimits) -> Result<String, ExprError> {
    Expression::compile(source, limits)?.evaluate(input, limits)
}
