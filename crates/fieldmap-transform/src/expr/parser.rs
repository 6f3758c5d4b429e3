//! Recursive-descent parser producing the expression AST.
//!
//! Identifiers, functions and methods are resolved while parsing, so a
//! compiled expression can only ever reference the whitelisted operations.

use super::ExprError;
use super::eval::Value;
use super::lexer::{Spanned, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

macro_rules! named_ops {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal, $min:literal..=$max:literal;)* }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub(crate) enum $name {
            $($variant,)*
        }

        impl $name {
            fn lookup(name: &str) -> Option<Self> {
                match name {
                    $($text => Some(Self::$variant),)*
                    _ => None,
                }
            }

            pub(crate) fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }

            fn arity(self) -> (usize, usize) {
                match self {
                    $(Self::$variant => ($min, $max),)*
                }
            }
        }
    };
}

named_ops! {
    /// Free functions callable as `name(args)`.
    Function {
        Upper => "upper", 1..=1;
        Lower => "lower", 1..=1;
        Trim => "trim", 1..=1;
        Len => "len", 1..=1;
        Concat => "concat", 0..=16;
        Substr => "substr", 2..=3;
        Replace => "replace", 3..=3;
        Contains => "contains", 2..=2;
        StartsWith => "starts_with", 2..=2;
        EndsWith => "ends_with", 2..=2;
        If => "if", 3..=3;
        Coalesce => "coalesce", 1..=16;
        Number => "number", 1..=1;
        String => "string", 1..=1;
        Round => "round", 1..=2;
        Abs => "abs", 1..=1;
        Min => "min", 1..=16;
        Max => "max", 1..=16;
    }
}

named_ops! {
    /// Methods callable as `target.name(args)`.
    Method {
        ToUpperCase => "toUpperCase", 0..=0;
        ToLowerCase => "toLowerCase", 0..=0;
        Trim => "trim", 0..=0;
        TrimStart => "trimStart", 0..=0;
        TrimEnd => "trimEnd", 0..=0;
        Slice => "slice", 1..=2;
        Substring => "substring", 1..=2;
        Replace => "replace", 2..=2;
        ReplaceAll => "replaceAll", 2..=2;
        Split => "split", 1..=1;
        Includes => "includes", 1..=1;
        StartsWith => "startsWith", 1..=1;
        EndsWith => "endsWith", 1..=1;
        IndexOf => "indexOf", 1..=1;
        CharAt => "charAt", 1..=1;
        PadStart => "padStart", 1..=2;
        PadEnd => "padEnd", 1..=2;
        Repeat => "repeat", 1..=1;
        Join => "join", 0..=1;
        ToString => "toString", 0..=0;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Input,
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
    Method(Box<Expr>, Method, Vec<Expr>),
    Length(Box<Expr>),
    Index(Box<Expr>, Box<Expr>),
}

pub(crate) fn parse(tokens: Vec<Spanned>, source_len: usize, max_depth: usize) -> Result<Expr, ExprError> {
    let mut parser = Parser {
        tokens,
        cursor: 0,
        depth: 0,
        max_depth,
        source_len,
    };
    parser.program()
}

fn binary_op(level: usize, token: &Token) -> Option<BinaryOp> {
    let op = match (level, token) {
        (0, Token::OrOr) => BinaryOp::Or,
        (1, Token::AndAnd) => BinaryOp::And,
        (2, Token::EqEq) => BinaryOp::Eq,
        (2, Token::NotEq) => BinaryOp::Ne,
        (3, Token::Lt) => BinaryOp::Lt,
        (3, Token::Le) => BinaryOp::Le,
        (3, Token::Gt) => BinaryOp::Gt,
        (3, Token::Ge) => BinaryOp::Ge,
        (4, Token::Plus) => BinaryOp::Add,
        (4, Token::Minus) => BinaryOp::Sub,
        (5, Token::Star) => BinaryOp::Mul,
        (5, Token::Slash) => BinaryOp::Div,
        (5, Token::Percent) => BinaryOp::Rem,
        _ => return None,
    };
    Some(op)
}

struct Parser {
    tokens: Vec<Spanned>,
    cursor: usize,
    depth: usize,
    max_depth: usize,
    source_len: usize,
}

impl Parser {
    fn program(&mut self) -> Result<Expr, ExprError> {
        if matches!(self.peek(), Some(Token::Ident(name)) if name == "return") {
            self.cursor += 1;
        }
        let expr = self.expression()?;
        while self.eat(&Token::Semicolon) {}
        if self.cursor < self.tokens.len() {
            return Err(self.error("unexpected trailing input"));
        }
        Ok(expr)
    }

    fn expression(&mut self) -> Result<Expr, ExprError> {
        self.nested(0, Self::conditional)
    }

    fn conditional(&mut self) -> Result<Expr, ExprError> {
        let condition = self.binary_level(0)?;
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let then = self.expression()?;
        self.expect(&Token::Colon, "':' in conditional")?;
        let otherwise = self.expression()?;
        Ok(Expr::Conditional(
            Box::new(condition),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    /// Precedence levels from loosest (0) to tightest; past the last level comes unary.
    fn binary_level(&mut self, level: usize) -> Result<Expr, ExprError> {
        const TIGHTEST: usize = 5;
        if level > TIGHTEST {
            return self.unary();
        }

        let mut lhs = self.binary_level(level + 1)?;
        let mut chain = 0;
        loop {
            let Some(op) = self.peek().and_then(|token| binary_op(level, token)) else {
                return Ok(lhs);
            };
            self.cursor += 1;
            chain += 1;
            self.check_depth(chain)?;
            let rhs = self.binary_level(level + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        let op = if self.eat(&Token::Bang) {
            UnaryOp::Not
        } else if self.eat(&Token::Minus) {
            UnaryOp::Neg
        } else {
            return self.postfix();
        };
        let operand = self.nested(1, Self::unary)?;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        let mut chain = 0;
        loop {
            if self.eat(&Token::Dot) {
                chain += 1;
                self.check_depth(chain)?;
                let pos = self.current_pos();
                let Some(Token::Ident(name)) = self.next_token() else {
                    return Err(ExprError::Syntax {
                        position: pos,
                        message: "expected property or method name after '.'".to_string(),
                    });
                };
                if name == "length" && self.peek() != Some(&Token::LParen) {
                    expr = Expr::Length(Box::new(expr));
                    continue;
                }
                let method = Method::lookup(&name).ok_or_else(|| ExprError::Syntax {
                    position: pos,
                    message: format!("unknown method '{name}'"),
                })?;
                self.expect(&Token::LParen, "'(' after method name")?;
                let args = self.arguments(pos, method.name(), method.arity())?;
                expr = Expr::Method(Box::new(expr), method, args);
            } else if self.eat(&Token::LBracket) {
                chain += 1;
                self.check_depth(chain)?;
                let index = self.expression()?;
                self.expect(&Token::RBracket, "']'")?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let pos = self.current_pos();
        let Some(token) = self.next_token() else {
            return Err(ExprError::Syntax {
                position: pos,
                message: "unexpected end of expression".to_string(),
            });
        };
        match token {
            Token::Num(n) => Ok(Expr::Literal(Value::Num(n))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" | "undefined" => Ok(Expr::Literal(Value::Null)),
                "value" | "input" => Ok(Expr::Input),
                _ if self.peek() == Some(&Token::LParen) => {
                    let function = Function::lookup(&name).ok_or_else(|| ExprError::Syntax {
                        position: pos,
                        message: format!("unknown function '{name}'"),
                    })?;
                    self.cursor += 1;
                    let args = self.arguments(pos, function.name(), function.arity())?;
                    Ok(Expr::Call(function, args))
                }
                _ => Err(ExprError::Syntax {
                    position: pos,
                    message: format!("unknown identifier '{name}'"),
                }),
            },
            other => Err(ExprError::Syntax {
                position: pos,
                message: format!("unexpected token {other:?}"),
            }),
        }
    }

    /// Parse a call's arguments after the opening parenthesis.
    fn arguments(
        &mut self,
        pos: usize,
        name: &str,
        (min, max): (usize, usize),
    ) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.expression()?);
                if self.eat(&Token::RParen) {
                    break;
                }
                self.expect(&Token::Comma, "',' or ')' in argument list")?;
            }
        }
        if args.len() < min || args.len() > max {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{min} to {max}")
            };
            return Err(ExprError::Syntax {
                position: pos,
                message: format!("{name} takes {expected} argument(s), got {}", args.len()),
            });
        }
        Ok(args)
    }

    fn nested<T>(
        &mut self,
        extra: usize,
        f: impl FnOnce(&mut Self) -> Result<T, ExprError>,
    ) -> Result<T, ExprError> {
        self.depth += 1;
        let result = self.check_depth(extra).and_then(|()| f(self));
        self.depth -= 1;
        result
    }

    fn check_depth(&self, extra: usize) -> Result<(), ExprError> {
        if self.depth + extra > self.max_depth {
            return Err(ExprError::Limit(format!(
                "expression nesting exceeds {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|s| &s.token)
    }

    fn next_token(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).map(|s| s.token.clone());
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<(), ExprError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {what}")))
        }
    }

    fn current_pos(&self) -> usize {
        self.tokens
            .get(self.cursor)
            .map_or(self.source_len, |s| s.pos)
    }

    fn error(&self, message: &str) -> ExprError {
        ExprError::Syntax {
            position: self.current_pos(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    fn parse_str(source: &str) -> Result<Expr, ExprError> {
        parse(tokenize(source)?, source.chars().count(), 32)
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = parse_str("1 + 2 * 3").unwrap();
        let Expr::Binary(BinaryOp::Add, _, rhs) = expr else {
            panic!("expected addition at the root");
        };
        assert!(matches!(*rhs, Expr::Binary(BinaryOp::Mul, _, _)));
    }

    #[test]
    fn accepts_return_and_semicolon() {
        assert_eq!(
            parse_str("return value;").unwrap(),
            parse_str("value").unwrap()
        );
    }

    #[test]
    fn rejects_unknown_names() {
        assert!(matches!(
            parse_str("process.exit(1)"),
            Err(ExprError::Syntax { position: 0, .. })
        ));
        assert!(parse_str("eval('1')").is_err());
        assert!(parse_str("value.constructor").is_err());
    }

    #[test]
    fn checks_arity() {
        let err = parse_str("upper(value, 1)").unwrap_err();
        assert!(err.to_string().contains("upper takes 1 argument"));
        assert!(parse_str("value.slice()").is_err());
    }

    #[test]
    fn nesting_is_bounded() {
        let deep = format!("{}value{}", "(".repeat(40), ")".repeat(40));
        assert!(matches!(parse_str(&deep), Err(ExprError::Limit(_))));
        let long_chain = vec!["1"; 40].join(" + ");
        assert!(matches!(parse_str(&long_chain), Err(ExprError::Limit(_))));
    }

    #[test]
    fn trailing_tokens_are_an_error() {
        assert!(parse_str("value value").is_err());
        assert!(parse_str("(value").is_err());
    }
}
