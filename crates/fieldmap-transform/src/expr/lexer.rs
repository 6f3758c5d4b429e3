//! Tokenizer for custom step expressions.

use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Num(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Question,
    Colon,
    Semicolon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

/// A token and the character offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub pos: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ExprError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let start = i;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i + 1 < chars.len() && chars[i] == '.' && chars[i + 1].is_ascii_digit() {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            let text: String = chars[start..i].iter().collect();
            let value = text.parse::<f64>().map_err(|_| ExprError::Syntax {
                position: start,
                message: format!("invalid number '{text}'"),
            })?;
            tokens.push(Spanned {
                token: Token::Num(value),
                pos: start,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
            {
                i += 1;
            }
            tokens.push(Spanned {
                token: Token::Ident(chars[start..i].iter().collect()),
                pos: start,
            });
            continue;
        }

        if c == '\'' || c == '"' {
            let (text, next) = read_string(&chars, i)?;
            tokens.push(Spanned {
                token: Token::Str(text),
                pos: start,
            });
            i = next;
            continue;
        }

        let peek = chars.get(i + 1).copied();
        let peek2 = chars.get(i + 2).copied();
        let (token, width) = match (c, peek) {
            ('=', Some('=')) if peek2 == Some('=') => (Token::EqEq, 3),
            ('!', Some('=')) if peek2 == Some('=') => (Token::NotEq, 3),
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            (',', _) => (Token::Comma, 1),
            ('.', _) => (Token::Dot, 1),
            ('?', _) => (Token::Question, 1),
            (':', _) => (Token::Colon, 1),
            (';', _) => (Token::Semicolon, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('!', _) => (Token::Bang, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            _ => {
                return Err(ExprError::Syntax {
                    position: start,
                    message: format!("unexpected character '{c}'"),
                });
            }
        };
        tokens.push(Spanned { token, pos: start });
        i += width;
    }

    Ok(tokens)
}

/// Read a quoted string starting at `open`; returns the text and the index after the closing quote.
fn read_string(chars: &[char], open: usize) -> Result<(String, usize), ExprError> {
    let quote = chars[open];
    let mut out = String::new();
    let mut i = open + 1;
    while i < chars.len() {
        match chars[i] {
            c if c == quote => return Ok((out, i + 1)),
            '\\' => {
                let escaped = chars.get(i + 1).copied().ok_or_else(|| ExprError::Syntax {
                    position: i,
                    message: "unterminated escape".to_string(),
                })?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
                i += 2;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    Err(ExprError::Syntax {
        position: open,
        message: "unterminated string".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn tokenizes_method_chain() {
        assert_eq!(
            kinds("value.trim().length >= 3"),
            vec![
                Token::Ident("value".into()),
                Token::Dot,
                Token::Ident("trim".into()),
                Token::LParen,
                Token::RParen,
                Token::Dot,
                Token::Ident("length".into()),
                Token::Ge,
                Token::Num(3.0),
            ]
        );
    }

    #[test]
    fn strict_equality_is_accepted() {
        assert_eq!(
            kinds("a === 'x' !== b"),
            vec![
                Token::Ident("a".into()),
                Token::EqEq,
                Token::Str("x".into()),
                Token::NotEq,
                Token::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(kinds(r#""a\"b\n""#), vec![Token::Str("a\"b\n".into())]);
        assert_eq!(kinds(r"'it\'s'"), vec![Token::Str("it's".into())]);
    }

    #[test]
    fn reports_position_of_bad_input() {
        let err = tokenize("value # 2").unwrap_err();
        assert!(matches!(err, ExprError::Syntax { position: 6, .. }));
        assert!(tokenize("'open").is_err());
    }
}
