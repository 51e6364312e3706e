//! Tokenizer for inline expressions

use super::ScriptError;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Punct(&'static str),
}

/// Punctuators, longest first
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "??", "?.", "(", ")", "[", "]", ".", ",",
    "?", ":", "!", "+", "-", "<", ">",
];

pub fn tokenize(source: &str) -> Result<Vec<Token>, ScriptError> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut position = 0usize;

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            position += 1;
            continue;
        }

        if c.is_ascii_digit() {
            tokens.push(Token::Number(read_number(&mut chars, &mut position)?));
            continue;
        }

        if c == '"' || c == '\'' {
            chars.next();
            position += 1;
            tokens.push(Token::Str(read_string(&mut chars, &mut position, c)?));
            continue;
        }

        if c.is_alphabetic() || c == '_' || c == '$' {
            let mut ident = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphanumeric() || c == '_' || c == '$' {
                    ident.push(c);
                    chars.next();
                    position += 1;
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(ident));
            continue;
        }

        let rest: String = chars.clone().take(3).collect();
        let punct = PUNCTUATORS
            .iter()
            .find(|p| rest.starts_with(**p))
            // `?.5` is a conditional followed by a number
            .filter(|p| !(**p == "?." && rest[2..].starts_with(|d: char| d.is_ascii_digit())))
            .copied()
            .or_else(|| if rest.starts_with('?') { Some("?") } else { None });

        match punct {
            Some(p) => {
                for _ in 0..p.len() {
                    chars.next();
                }
                position += p.len();
                tokens.push(Token::Punct(p));
            }
            None => {
                return Err(ScriptError::Parse(format!(
                    "unexpected character '{}' at {}",
                    c, position
                )))
            }
        }
    }

    Ok(tokens)
}

fn read_number(chars: &mut Peekable<Chars>, position: &mut usize) -> Result<f64, ScriptError> {
    let mut text = String::new();
    let mut seen_dot = false;
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            text.push(c);
        } else if c == '.' && !seen_dot {
            // a dot not followed by a digit ends the number
            let mut lookahead = chars.clone();
            lookahead.next();
            if !lookahead.peek().is_some_and(|d| d.is_ascii_digit()) {
                break;
            }
            seen_dot = true;
            text.push(c);
        } else {
            break;
        }
        chars.next();
        *position += 1;
    }
    text.parse::<f64>()
        .map_err(|_| ScriptError::Parse(format!("invalid number '{}' at {}", text, position)))
}

fn read_string(chars: &mut Peekable<Chars>, position: &mut usize, quote: char) -> Result<String, ScriptError> {
    let mut out = String::new();
    while let Some(c) = chars.next() {
        *position += 1;
        match c {
            '\\' => {
                *position += 1;
                match chars.next() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some(other) => out.push(other),
                    None => break,
                }
            }
            c if c == quote => return Ok(out),
            c => out.push(c),
        }
    }
    Err(ScriptError::Parse("unterminated string literal".to_string()))
}
