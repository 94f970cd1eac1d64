//! Tokenizer for lesson scripts.
//!
//! Produces a flat token stream with 1-based line numbers attached, which
//! the parser and interpreter use for error attribution. Newlines are
//! significant (they separate statements) and `#` starts a line comment.

use crate::error::SnippetError;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    // Keywords
    If,
    Else,
    While,
    For,
    In,
    True,
    False,
    And,
    Or,
    Not,
    // Operators & punctuation
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    Assign,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Newline,
}

/// A token paired with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: u32,
}

/// Tokenize `source` into a spanned token stream.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, SnippetError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line: u32 = 1;

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' => {
                chars.next();
            }
            '\n' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Newline,
                    line,
                });
                line += 1;
            }
            '#' => {
                // Line comment: discard to end of line.
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '"' => {
                chars.next();
                tokens.push(Spanned {
                    token: Token::Str(read_string(&mut chars, line)?),
                    line,
                });
            }
            '0'..='9' => {
                tokens.push(Spanned {
                    token: Token::Number(read_number(&mut chars, line)?),
                    line,
                });
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Spanned {
                    token: keyword_or_ident(word),
                    line,
                });
            }
            _ => {
                chars.next();
                let token = match c {
                    '+' => Token::Plus,
                    '-' => Token::Minus,
                    '*' => {
                        if chars.peek() == Some(&'*') {
                            chars.next();
                            Token::StarStar
                        } else {
                            Token::Star
                        }
                    }
                    '/' => Token::Slash,
                    '%' => Token::Percent,
                    '=' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::EqEq
                        } else {
                            Token::Assign
                        }
                    }
                    '!' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::NotEq
                        } else {
                            return Err(SnippetError::syntax("unexpected character '!'", line));
                        }
                    }
                    '<' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::LtEq
                        } else {
                            Token::Lt
                        }
                    }
                    '>' => {
                        if chars.peek() == Some(&'=') {
                            chars.next();
                            Token::GtEq
                        } else {
                            Token::Gt
                        }
                    }
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '{' => Token::LBrace,
                    '}' => Token::RBrace,
                    ',' => Token::Comma,
                    ';' => Token::Semicolon,
                    other => {
                        return Err(SnippetError::syntax(
                            format!("unexpected character {other:?}"),
                            line,
                        ));
                    }
                };
                tokens.push(Spanned { token, line });
            }
        }
    }

    Ok(tokens)
}

fn keyword_or_ident(word: String) -> Token {
    match word.as_str() {
        "if" => Token::If,
        "else" => Token::Else,
        "while" => Token::While,
        "for" => Token::For,
        "in" => Token::In,
        "true" => Token::True,
        "false" => Token::False,
        "and" => Token::And,
        "or" => Token::Or,
        "not" => Token::Not,
        _ => Token::Ident(word),
    }
}

fn read_string(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    line: u32,
) -> Result<String, SnippetError> {
    let mut out = String::new();
    loop {
        match chars.next() {
            Some('"') => return Ok(out),
            Some('\\') => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => {
                    return Err(SnippetError::syntax(
                        format!("unknown escape sequence '\\{other}'"),
                        line,
                    ));
                }
                None => return Err(SnippetError::syntax("unterminated string literal", line)),
            },
            Some('\n') | None => {
                return Err(SnippetError::syntax("unterminated string literal", line));
            }
            Some(c) => out.push(c),
        }
    }
}

fn read_number(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    line: u32,
) -> Result<f64, SnippetError> {
    let mut text = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            text.push(c);
            chars.next();
        } else {
            break;
        }
    }
    if chars.peek() == Some(&'.') {
        text.push('.');
        chars.next();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                chars.next();
            } else {
                break;
            }
        }
    }
    if matches!(chars.peek(), Some('e') | Some('E')) {
        text.push('e');
        chars.next();
        if matches!(chars.peek(), Some('+') | Some('-')) {
            text.push(*chars.peek().unwrap_or(&'+'));
            chars.next();
        }
        let mut has_digits = false;
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                chars.next();
                has_digits = true;
            } else {
                break;
            }
        }
        if !has_digits {
            return Err(SnippetError::syntax("malformed number literal", line));
        }
    }
    text.parse::<f64>()
        .map_err(|_| SnippetError::syntax(format!("malformed number literal {text:?}"), line))
}
