//! Inline `<%= expression %>` fragments
//!
//! Expressions are evaluated by a small sandboxed interpreter with the
//! record bound as `book`. The language is limited to literals, property and
//! index access (with `?.`), a fixed set of string/array/number methods,
//! `String()`/`Number()`, comparisons, `+`/`-`, `&&`/`||`/`??` and `?:`.
//! There is no assignment, no function definition and no I/O. Template
//! authorship is still a trusted input.

mod eval;
mod lexer;
mod parser;

pub use eval::Value;

use booknote_domain::Book;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::warn;

lazy_static! {
    static ref INLINE_SCRIPT: Regex = Regex::new(r"(?s)<%=(.+?)%>").unwrap();
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScriptError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Type error: {0}")]
    Type(String),
}

/// Evaluate one expression against `book` and return the raw value
pub fn evaluate_value(source: &str, book: &Book) -> Result<Value, ScriptError> {
    let expr = parser::parse(source)?;
    eval::evaluate(&expr, &Value::from_book(book))
}

/// Evaluate one expression and render it the way it is spliced into a note:
/// strings verbatim, `undefined` as the word, everything else as JSON.
pub fn evaluate(source: &str, book: &Book) -> Result<String, ScriptError> {
    let value = evaluate_value(source, book)?;
    Ok(match value {
        Value::Str(s) => s,
        other => other.to_json().unwrap_or_else(|| "undefined".to_string()),
    })
}

/// Replace every `<%= ... %>` fragment in `text`. A fragment that fails to
/// evaluate is left in place.
pub fn execute_inline_scripts(book: &Book, text: &str) -> String {
    INLINE_SCRIPT
        .replace_all(text, |caps: &Captures| {
            let source = &caps[1];
            match evaluate(source, book) {
                Ok(rendered) => rendered,
                Err(e) => {
                    warn!(expression = source.trim(), error = %e, "Inline script failed");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}
