//! Tokenizer for the expression language.

use crate::error::{ExprError, ExprResult};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    /// A field name, plain or backtick-quoted. Keywords are names too.
    Name(String),
    /// `$` alone is the context; `$name` is a function reference.
    Dollar(String),
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Question,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A token and the byte offset it starts at.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub pos: usize,
}

pub fn tokenize(src: &str) -> ExprResult<Vec<Spanned>> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, ch) = chars[i];
        if ch.is_whitespace() {
            i += 1;
            continue;
        }

        let single = match ch {
            '.' => Some(Token::Dot),
            ',' => Some(Token::Comma),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '?' => Some(Token::Question),
            ':' => Some(Token::Colon),
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '*' => Some(Token::Star),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '&' => Some(Token::Amp),
            '=' => Some(Token::Eq),
            _ => None,
        };
        if let Some(token) = single {
            // A dot directly followed by a digit is not a step separator.
            let is_fraction = ch == '.' && chars.get(i + 1).is_some_and(|(_, c)| c.is_ascii_digit());
            if !is_fraction {
                out.push(Spanned { token, pos });
                i += 1;
                continue;
            }
        }

        let next = chars.get(i + 1).map(|(_, c)| *c);
        match ch {
            '!' if next == Some('=') => {
                out.push(Spanned { token: Token::Ne, pos });
                i += 2;
            }
            '<' | '>' => {
                let token = match (ch, next) {
                    ('<', Some('=')) => Token::Le,
                    ('>', Some('=')) => Token::Ge,
                    ('<', _) => Token::Lt,
                    _ => Token::Gt,
                };
                i += if matches!(token, Token::Le | Token::Ge) { 2 } else { 1 };
                out.push(Spanned { token, pos });
            }
            '"' | '\'' => {
                let (s, end) = read_string(&chars, i, ch)?;
                out.push(Spanned { token: Token::Str(s), pos });
                i = end;
            }
            '`' => {
                let mut j = i + 1;
                let mut name = String::new();
                while j < chars.len() && chars[j].1 != '`' {
                    name.push(chars[j].1);
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(ExprError::Unterminated { what: "quoted name", pos });
                }
                out.push(Spanned { token: Token::Name(name), pos });
                i = j + 1;
            }
            '$' => {
                let mut j = i + 1;
                let mut name = String::new();
                while j < chars.len() && is_name_char(chars[j].1) {
                    name.push(chars[j].1);
                    j += 1;
                }
                out.push(Spanned { token: Token::Dollar(name), pos });
                i = j;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut j = i;
                let mut text = String::new();
                while j < chars.len() && (chars[j].1.is_ascii_digit() || chars[j].1 == '.') {
                    // Stop before a second dot so `1.2.x` is not swallowed.
                    if chars[j].1 == '.' && text.contains('.') {
                        break;
                    }
                    text.push(chars[j].1);
                    j += 1;
                }
                if j < chars.len() && matches!(chars[j].1, 'e' | 'E') {
                    text.push('e');
                    j += 1;
                    if j < chars.len() && matches!(chars[j].1, '+' | '-') {
                        text.push(chars[j].1);
                        j += 1;
                    }
                    while j < chars.len() && chars[j].1.is_ascii_digit() {
                        text.push(chars[j].1);
                        j += 1;
                    }
                }
                let n = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber { text: text.clone(), pos })?;
                out.push(Spanned { token: Token::Number(n), pos });
                i = j;
            }
            c if is_name_start(c) => {
                let mut j = i;
                let mut name = String::new();
                while j < chars.len() && is_name_char(chars[j].1) {
                    name.push(chars[j].1);
                    j += 1;
                }
                out.push(Spanned { token: Token::Name(name), pos });
                i = j;
            }
            other => return Err(ExprError::UnexpectedChar { ch: other, pos }),
        }
    }
    Ok(out)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn read_string(chars: &[(usize, char)], start: usize, quote: char) -> ExprResult<(String, usize)> {
    let pos = chars[start].0;
    let mut s = String::new();
    let mut j = start + 1;
    while j < chars.len() {
        let c = chars[j].1;
        if c == quote {
            return Ok((s, j + 1));
        }
        if c == '\\' {
            j += 1;
            let esc = chars
                .get(j)
                .map(|(_, c)| *c)
                .ok_or(ExprError::Unterminated { what: "string", pos })?;
            s.push(match esc {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                other => other,
            });
        } else {
            s.push(c);
        }
        j += 1;
    }
    Err(ExprError::Unterminated { what: "string", pos })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn path_and_operators() {
        assert_eq!(
            tokens("a.b + 2"),
            vec![
                Token::Name("a".into()),
                Token::Dot,
                Token::Name("b".into()),
                Token::Plus,
                Token::Number(2.0)
            ]
        );
    }

    #[test]
    fn two_char_operators() {
        assert_eq!(
            tokens("a != b <= c >= d < e > f"),
            vec![
                Token::Name("a".into()),
                Token::Ne,
                Token::Name("b".into()),
                Token::Le,
                Token::Name("c".into()),
                Token::Ge,
                Token::Name("d".into()),
                Token::Lt,
                Token::Name("e".into()),
                Token::Gt,
                Token::Name("f".into()),
            ]
        );
    }

    #[test]
    fn strings_and_escapes() {
        assert_eq!(tokens(r#""a\"b""#), vec![Token::Str("a\"b".into())]);
        assert_eq!(tokens("'x y'"), vec![Token::Str("x y".into())]);
    }

    #[test]
    fn numbers() {
        assert_eq!(tokens("1.5"), vec![Token::Number(1.5)]);
        assert_eq!(tokens(".5"), vec![Token::Number(0.5)]);
        assert_eq!(tokens("2e3"), vec![Token::Number(2000.0)]);
    }

    #[test]
    fn quoted_names_and_functions() {
        assert_eq!(
            tokens("$count(`first name`)"),
            vec![
                Token::Dollar("count".into()),
                Token::LParen,
                Token::Name("first name".into()),
                Token::RParen
            ]
        );
        assert_eq!(tokens("$"), vec![Token::Dollar(String::new())]);
    }

    #[test]
    fn errors() {
        assert!(matches!(tokenize("'abc"), Err(ExprError::Unterminated { .. })));
        assert!(matches!(tokenize("`abc"), Err(ExprError::Unterminated { .. })));
        assert!(matches!(tokenize("a # b"), Err(ExprError::UnexpectedChar { ch: '#', pos: 2 })));
    }
}
