//! Lexer for the rule condition grammar.

use super::ExprError;

/// A single token of a condition expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    /// Identifier, possibly dotted (`year_params.rates.medicare_rate`).
    Ident(String),
    True,
    False,
    Null,
    And,
    Or,
    Not,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

/// Tokenize a condition expression.
pub fn lex(source: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '=' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '=')) => {
                        chars.next();
                        tokens.push(Token::Eq);
                    }
                    _ => return Err(ExprError::Lex("expected '==' after '='".to_string())),
                }
            }
            '!' => {
                chars.next();
                match chars.peek() {
                    Some(&(_, '=')) => {
                        chars.next();
                        tokens.push(Token::Ne);
                    }
                    _ => return Err(ExprError::Lex("expected '!=' after '!'".to_string())),
                }
            }
            '<' => {
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    tokens.push(Token::Le);
                } else {
                    tokens.push(Token::Lt);
                }
            }
            '>' => {
                chars.next();
                if let Some(&(_, '=')) = chars.peek() {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            '\'' | '"' => {
                tokens.push(scan_string(&mut chars, c)?);
            }
            c if c.is_ascii_digit() => {
                tokens.push(scan_number(source, &mut chars, start)?);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                tokens.push(scan_ident(source, &mut chars, start));
            }
            c => {
                return Err(ExprError::Lex(format!("unexpected character: {c}")));
            }
        }
    }

    Ok(tokens)
}

fn scan_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    quote: char,
) -> Result<Token, ExprError> {
    chars.next(); // opening quote
    let mut text = String::new();
    loop {
        match chars.next() {
            Some((_, c)) if c == quote => return Ok(Token::Str(text)),
            Some((_, '\\')) => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, c)) if c == quote || c == '\\' => text.push(c),
                // Unknown escapes pass through so regex patterns like
                // \d{3} survive without double escaping.
                Some((_, other)) => {
                    text.push('\\');
                    text.push(other);
                }
                None => break,
            },
            Some((_, c)) => text.push(c),
            None => break,
        }
    }
    Err(ExprError::Lex("unterminated string literal".to_string()))
}

fn scan_number(
    source: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
) -> Result<Token, ExprError> {
    let mut end = start;
    let mut seen_dot = false;
    while let Some(&(pos, c)) = chars.peek() {
        if c.is_ascii_digit() {
            end = pos + c.len_utf8();
            chars.next();
        } else if c == '.' && !seen_dot {
            // Only part of the number when followed by a digit; a dotted
            // identifier can never start with a digit so '.' here is an error.
            seen_dot = true;
            end = pos + 1;
            chars.next();
        } else {
            break;
        }
    }
    let text = &source[start..end];
    text.parse()
        .map(Token::Number)
        .map_err(|_| ExprError::Lex(format!("invalid number literal: {text}")))
}

fn scan_ident(
    source: &str,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    start: usize,
) -> Token {
    let mut end = start;
    while let Some(&(pos, c)) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            end = pos + c.len_utf8();
            chars.next();
        } else {
            break;
        }
    }
    match &source[start..end] {
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        ident => Token::Ident(ident.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_comparison() {
        let tokens = lex("wages > 0").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("wages".to_string()),
                Token::Gt,
                Token::Number(0.0)
            ]
        );
    }

    #[test]
    fn test_lex_dotted_identifier() {
        let tokens = lex("year_params.rates.medicare_rate").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Ident("year_params.rates.medicare_rate".to_string())]
        );
    }

    #[test]
    fn test_lex_keywords_and_literals() {
        let tokens = lex("not true and false or null").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Not,
                Token::True,
                Token::And,
                Token::False,
                Token::Or,
                Token::Null
            ]
        );
    }

    #[test]
    fn test_lex_string_quotes() {
        assert_eq!(
            lex("'a.b'").unwrap(),
            vec![Token::Str("a.b".to_string())]
        );
        assert_eq!(
            lex("\"x\"").unwrap(),
            vec![Token::Str("x".to_string())]
        );
    }

    #[test]
    fn test_lex_operators() {
        let tokens = lex("a == b != c <= d >= e + f - g * h / i").unwrap();
        assert!(tokens.contains(&Token::Eq));
        assert!(tokens.contains(&Token::Ne));
        assert!(tokens.contains(&Token::Le));
        assert!(tokens.contains(&Token::Ge));
        assert!(tokens.contains(&Token::Slash));
    }

    #[test]
    fn test_lex_float() {
        assert_eq!(lex("0.062").unwrap(), vec![Token::Number(0.062)]);
    }

    #[test]
    fn test_lex_regex_escapes_preserved() {
        assert_eq!(
            lex(r"'^\d{3}-?\d{2}$'").unwrap(),
            vec![Token::Str(r"^\d{3}-?\d{2}$".to_string())]
        );
        assert_eq!(
            lex(r"'a\'b'").unwrap(),
            vec![Token::Str("a'b".to_string())]
        );
    }

    #[test]
    fn test_lex_unterminated_string() {
        assert!(lex("'abc").is_err());
    }

    #[test]
    fn test_lex_unexpected_character() {
        assert!(lex("wages @ 1").is_err());
    }

    #[test]
    fn test_lex_single_equals_rejected() {
        assert!(lex("wages = 0").is_err());
    }
}
