//! Tree-walking evaluator
//!
//! The only variable is `book`. Values follow the loose conversion rules
//! template authors expect from the `<%= %>` syntax: `+` concatenates when
//! either side is a string, `==` coerces numbers and strings, and missing
//! properties read as `undefined`.

use super::parser::{BinaryOp, Expr, LogicalOp, UnaryOp};
use super::ScriptError;
use booknote_domain::{Book, CustomValue, FieldValue};

/// Longest string a method may build
pub const MAX_STRING_LENGTH: usize = 1 << 16;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
}

impl Value {
    /// The record as an object keyed by camelCase field names
    pub fn from_book(book: &Book) -> Value {
        Value::Object(
            book.fields()
                .into_iter()
                .map(|(key, value)| (key.to_string(), Value::from(value)))
                .collect(),
        )
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// String conversion (`String(value)`)
    pub fn to_js_string(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.clone(),
            Value::Array(items) => join(items, ","),
            Value::Object(_) => "[object Object]".to_string(),
        }
    }

    /// Numeric conversion (`Number(value)`)
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined | Value::Object(_) | Value::Array(_) => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    /// Compact JSON; `None` for a bare `undefined`
    pub fn to_json(&self) -> Option<String> {
        match self {
            Value::Undefined => None,
            Value::Null => Some("null".to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) if n.is_finite() => Some(format_number(*n)),
            Value::Number(_) => Some("null".to_string()),
            Value::Str(s) => serde_json::to_string(s).ok(),
            Value::Array(items) => Some(format!(
                "[{}]",
                items
                    .iter()
                    .map(|item| item.to_json().unwrap_or_else(|| "null".to_string()))
                    .collect::<Vec<_>>()
                    .join(",")
            )),
            Value::Object(entries) => Some(format!(
                "{{{}}}",
                entries
                    .iter()
                    .filter_map(|(key, value)| {
                        let value = value.to_json()?;
                        let key = serde_json::to_string(key).ok()?;
                        Some(format!("{}:{}", key, value))
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            )),
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            FieldValue::Text(s) => Value::Str(s),
            FieldValue::List(items) => Value::Array(items.into_iter().map(Value::Str).collect()),
            FieldValue::Map(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<CustomValue> for Value {
    fn from(value: CustomValue) -> Self {
        match value {
            CustomValue::Bool(b) => Value::Bool(b),
            CustomValue::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            CustomValue::Text(s) => Value::Str(s),
            CustomValue::List(items) => Value::Array(items.into_iter().map(Value::Str).collect()),
        }
    }
}

/// Number formatting: integral values print without a fraction
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

fn join(items: &[Value], separator: &str) -> String {
    items
        .iter()
        .map(|item| if item.is_nullish() { String::new() } else { item.to_js_string() })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Evaluate `expr` with `book` bound to the record object
pub fn evaluate(expr: &Expr, book: &Value) -> Result<Value, ScriptError> {
    match expr {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::Str(s.clone())),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Null => Ok(Value::Null),
        Expr::Undefined => Ok(Value::Undefined),
        Expr::Ident(name) if name == "book" => Ok(book.clone()),
        Expr::Ident(name) => Err(ScriptError::UnknownIdentifier(name.clone())),
        Expr::Array(items) => items
            .iter()
            .map(|item| evaluate(item, book))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Member {
            object,
            property,
            optional,
        } => member(&evaluate(object, book)?, property, *optional),
        Expr::Index {
            object,
            index,
            optional,
        } => {
            let target = evaluate(object, book)?;
            match (&target, evaluate(index, book)?) {
                (Value::Array(items), Value::Number(i)) => Ok(array_index(items, i)),
                (_, key) => member(&target, &key.to_js_string(), *optional),
            }
        }
        Expr::Call { callee, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, book))
                .collect::<Result<Vec<_>, _>>()?;
            match callee.as_ref() {
                Expr::Ident(name) => call_global(name, &args),
                Expr::Member { object, property, .. } => {
                    call_method(&evaluate(object, book)?, property, &args)
                }
                other => Err(ScriptError::Type(format!("{:?} is not a function", other))),
            }
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, book)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Neg => Value::Number(-value.to_number()),
            })
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, book)?;
            let right = evaluate(right, book)?;
            Ok(binary(*op, &left, &right))
        }
        Expr::Logical { op, left, right } => {
            let left = evaluate(left, book)?;
            let short_circuit = match op {
                LogicalOp::And => !left.is_truthy(),
                LogicalOp::Or => left.is_truthy(),
                LogicalOp::Nullish => !left.is_nullish(),
            };
            if short_circuit {
                Ok(left)
            } else {
                evaluate(right, book)
            }
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if evaluate(test, book)?.is_truthy() {
                evaluate(consequent, book)
            } else {
                evaluate(alternate, book)
            }
        }
    }
}

fn member(target: &Value, property: &str, optional: bool) -> Result<Value, ScriptError> {
    if target.is_nullish() {
        return if optional {
            Ok(Value::Undefined)
        } else {
            Err(ScriptError::Type(format!(
                "cannot read property '{}' of {}",
                property,
                target.type_name()
            )))
        };
    }
    Ok(match (target, property) {
        (Value::Str(s), "length") => Value::Number(s.chars().count() as f64),
        (Value::Array(items), "length") => Value::Number(items.len() as f64),
        (Value::Object(entries), key) => entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    })
}

fn array_index(items: &[Value], index: f64) -> Value {
    let index = if index < 0.0 { items.len() as f64 + index } else { index };
    if index < 0.0 || index.fract() != 0.0 {
        return Value::Undefined;
    }
    items.get(index as usize).cloned().unwrap_or(Value::Undefined)
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            let stringy = |v: &Value| matches!(v, Value::Str(_) | Value::Array(_) | Value::Object(_));
            if stringy(left) || stringy(right) {
                Value::Str(format!("{}{}", left.to_js_string(), right.to_js_string()))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::StrictEq => Value::Bool(strict_equals(left, right)),
        BinaryOp::StrictNe => Value::Bool(!strict_equals(left, right)),
        BinaryOp::LooseEq => Value::Bool(loose_equals(left, right)),
        BinaryOp::LooseNe => Value::Bool(!loose_equals(left, right)),
        BinaryOp::Lt => compare(left, right, |o| o.is_lt()),
        BinaryOp::Gt => compare(left, right, |o| o.is_gt()),
        BinaryOp::Le => compare(left, right, |o| o.is_le()),
        BinaryOp::Ge => compare(left, right, |o| o.is_ge()),
    }
}

fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        // every evaluation builds a fresh array or object
        _ => false,
    }
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
        (Value::Number(_) | Value::Bool(_), Value::Str(_)) | (Value::Str(_), Value::Number(_) | Value::Bool(_)) => {
            left.to_number() == right.to_number()
        }
        _ => strict_equals(left, right),
    }
}

fn compare(left: &Value, right: &Value, test: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    Value::Bool(ordering.is_some_and(test))
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn call_global(name: &str, args: &[Value]) -> Result<Value, ScriptError> {
    let first = arg(args, 0);
    match name {
        "String" => Ok(Value::Str(if args.is_empty() { String::new() } else { first.to_js_string() })),
        "Number" => Ok(Value::Number(if args.is_empty() { 0.0 } else { first.to_number() })),
        other => Err(ScriptError::UnknownIdentifier(other.to_string())),
    }
}

fn call_method(target: &Value, method: &str, args: &[Value]) -> Result<Value, ScriptError> {
    let first = arg(args, 0);
    let second = arg(args, 1);
    match target {
        Value::Str(s) => string_method(s, method, &first, &second),
        Value::Array(items) => array_method(items, method, &first, &second),
        Value::Number(n) => match method {
            "toFixed" => {
                let digits = if matches!(first, Value::Undefined) { 0.0 } else { first.to_number() };
                Ok(Value::Str(format!("{:.*}", digits.clamp(0.0, 20.0) as usize, n)))
            }
            "toString" => Ok(Value::Str(format_number(*n))),
            _ => Err(ScriptError::UnknownMethod(format!("number.{}", method))),
        },
        other if other.is_nullish() => Err(ScriptError::Type(format!(
            "cannot call '{}' on {}",
            method,
            other.type_name()
        ))),
        other => Err(ScriptError::UnknownMethod(format!("{}.{}", other.type_name(), method))),
    }
}

/// Relative index as used by `slice`: negative counts from the end
fn relative_index(value: &Value, len: usize, default: usize) -> usize {
    if matches!(value, Value::Undefined) {
        return default;
    }
    let n = value.to_number();
    if n.is_nan() {
        0
    } else if n < 0.0 {
        (len as f64 + n.trunc()).max(0.0) as usize
    } else {
        (n as usize).min(len)
    }
}

/// Target width for `padStart`/`padEnd`, bounded by [`MAX_STRING_LENGTH`]
fn pad_width(value: &Value) -> Result<usize, ScriptError> {
    let width = value.to_number();
    if width.is_nan() || width <= 0.0 {
        Ok(0)
    } else if width > MAX_STRING_LENGTH as f64 {
        Err(ScriptError::Type(format!(
            "padding to {} exceeds {} characters",
            format_number(width),
            MAX_STRING_LENGTH
        )))
    } else {
        Ok(width as usize)
    }
}

fn string_method(s: &str, method: &str, first: &Value, second: &Value) -> Result<Value, ScriptError> {
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();

    Ok(match method {
        "toUpperCase" => Value::Str(s.to_uppercase()),
        "toLowerCase" => Value::Str(s.to_lowercase()),
        "trim" => Value::Str(s.trim().to_string()),
        "toString" => Value::Str(s.to_string()),
        "slice" => {
            let (start, end) = (relative_index(first, len, 0), relative_index(second, len, len));
            Value::Str(if start < end { chars[start..end].iter().collect() } else { String::new() })
        }
        "split" => {
            let sep = first.to_js_string();
            Value::Array(match first {
                Value::Undefined => vec![Value::Str(s.to_string())],
                _ if sep.is_empty() => chars.iter().map(|c| Value::Str(c.to_string())).collect(),
                _ => s.split(sep.as_str()).map(|p| Value::Str(p.to_string())).collect(),
            })
        }
        "replace" => Value::Str(s.replacen(&first.to_js_string(), &second.to_js_string(), 1)),
        "replaceAll" => {
            let pattern = first.to_js_string();
            if pattern.is_empty() {
                return Err(ScriptError::Type("replaceAll needs a non-empty pattern".to_string()));
            }
            let replaced = s.replace(&pattern, &second.to_js_string());
            if replaced.chars().count() > MAX_STRING_LENGTH {
                return Err(ScriptError::Type(format!(
                    "replaceAll result exceeds {} characters",
                    MAX_STRING_LENGTH
                )));
            }
            Value::Str(replaced)
        }
        "includes" => Value::Bool(s.contains(&first.to_js_string())),
        "startsWith" => Value::Bool(s.starts_with(&first.to_js_string())),
        "endsWith" => Value::Bool(s.ends_with(&first.to_js_string())),
        "padStart" | "padEnd" => {
            let width = pad_width(first)?;
            let fill = match second {
                Value::Undefined => " ".to_string(),
                other => other.to_js_string(),
            };
            if width <= len || fill.is_empty() {
                Value::Str(s.to_string())
            } else {
                let padding: String = fill.chars().cycle().take(width - len).collect();
                Value::Str(if method == "padStart" {
                    padding + s
                } else {
                    format!("{}{}", s, padding)
                })
            }
        }
        _ => return Err(ScriptError::UnknownMethod(format!("string.{}", method))),
    })
}

fn array_method(items: &[Value], method: &str, first: &Value, second: &Value) -> Result<Value, ScriptError> {
    let len = items.len();
    Ok(match method {
        "join" => match first {
            Value::Undefined => Value::Str(join(items, ",")),
            sep => Value::Str(join(items, &sep.to_js_string())),
        },
        "includes" => Value::Bool(items.iter().any(|item| strict_equals(item, first))),
        "indexOf" => Value::Number(
            items
                .iter()
                .position(|item| strict_equals(item, first))
                .map(|i| i as f64)
                .unwrap_or(-1.0),
        ),
        "slice" => {
            let (start, end) = (relative_index(first, len, 0), relative_index(second, len, len));
            Value::Array(if start < end { items[start..end].to_vec() } else { Vec::new() })
        }
        "toString" => Value::Str(join(items, ",")),
        _ => return Err(ScriptError::UnknownMethod(format!("array.{}", method))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parser::parse;
    use booknote_domain::Numeric;

    fn eval_with_book(source: &str) -> Result<Value, ScriptError> {
        let book = Book {
            authors: vec!["Frank Herbert".to_string(), "Brian Herbert".to_string()],
            total_page: Some(Numeric::from_int(604)),
            tags: Some(vec!["sf".to_string(), "classic".to_string()]),
            ..Book::new("Dune", "Frank Herbert")
        };
        evaluate(&parse(source)?, &Value::from_book(&book))
    }

    fn str_value(s: &str) -> Value {
        Value::Str(s.to_string())
    }

    #[test]
    fn test_property_access_and_methods() {
        assert_eq!(eval_with_book("book.title.toUpperCase()").unwrap(), str_value("DUNE"));
        assert_eq!(eval_with_book("book.authors[1]").unwrap(), str_value("Brian Herbert"));
        assert_eq!(eval_with_book("book.authors[-1]").unwrap(), str_value("Brian Herbert"));
        assert_eq!(eval_with_book("book['title'].length").unwrap(), Value::Number(4.0));
        assert_eq!(
            eval_with_book("book.authors.join(' & ')").unwrap(),
            str_value("Frank Herbert & Brian Herbert")
        );
        assert_eq!(eval_with_book("book.title.slice(-3)").unwrap(), str_value("une"));
        assert_eq!(eval_with_book("book.title.padStart(6, '*')").unwrap(), str_value("**Dune"));
    }

    #[test]
    fn test_concat_and_arithmetic() {
        assert_eq!(eval_with_book("book.totalPage + ' pages'").unwrap(), str_value("604 pages"));
        assert_eq!(eval_with_book("book.totalPage - 4").unwrap(), Value::Number(600.0));
        assert_eq!(eval_with_book("String(book.totalPage)").unwrap(), str_value("604"));
        assert_eq!(eval_with_book("Number('42')").unwrap(), Value::Number(42.0));
    }

    #[test]
    fn test_missing_fields_and_fallbacks() {
        assert_eq!(eval_with_book("book.series").unwrap(), Value::Undefined);
        assert_eq!(eval_with_book("book.series ?? 'standalone'").unwrap(), str_value("standalone"));
        assert_eq!(eval_with_book("book.series?.length").unwrap(), Value::Undefined);
        assert!(matches!(eval_with_book("book.series.length"), Err(ScriptError::Type(_))));
        assert_eq!(eval_with_book("book.publisher || 'n/a'").unwrap(), str_value("n/a"));
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval_with_book("book.totalPage > 500 ? 'long' : 'short'").unwrap(), str_value("long"));
        assert_eq!(eval_with_book("book.totalPage == '604'").unwrap(), Value::Bool(true));
        assert_eq!(eval_with_book("book.totalPage === '604'").unwrap(), Value::Bool(false));
        assert_eq!(eval_with_book("book.tags.includes('sf')").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_errors() {
        assert!(matches!(eval_with_book("window.alert(1)"), Err(ScriptError::UnknownIdentifier(_))));
        assert!(matches!(eval_with_book("Math.max(1, 2)"), Err(ScriptError::UnknownIdentifier(_))));
        assert!(matches!(eval_with_book("book.title.explode()"), Err(ScriptError::UnknownMethod(_))));
        assert!(matches!(eval_with_book("book.series.trim()"), Err(ScriptError::Type(_))));
    }

    #[test]
    fn test_padding_is_bounded() {
        assert!(matches!(
            eval_with_book("book.title.padEnd(99999999999999999999)"),
            Err(ScriptError::Type(_))
        ));
        assert!(matches!(
            eval_with_book("book.title.padStart(1000000000, '-')"),
            Err(ScriptError::Type(_))
        ));
    }

    #[test]
    fn test_to_json() {
        let value = Value::Object(vec![
            ("a".to_string(), Value::Number(1.0)),
            ("b".to_string(), Value::Undefined),
            ("c".to_string(), Value::Array(vec![Value::Null, Value::Undefined, str_value("x\"y")])),
        ]);
        assert_eq!(value.to_json().unwrap(), r#"{"a":1,"c":[null,null,"x\"y"]}"#);
        assert_eq!(Value::Undefined.to_json(), None);
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0), "0");
    }
}
