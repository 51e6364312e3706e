//! Header block handling: override parsing, merge with the record, emission
//!
//! The header format is a constrained `key: value` / `key:\n  - item` subset;
//! it is emitted and parsed line by line, never through a YAML library.

pub mod emit;
pub mod merge;
pub mod parse;

pub use emit::*;
pub use merge::*;
pub use parse::*;

/// Opening mark substituted for the 1st, 3rd, ... double quote
pub const OPEN_QUOTE: char = '«';
/// Closing mark substituted for the 2nd, 4th, ... double quote
pub const CLOSE_QUOTE: char = '»';

/// Replace `"` characters with alternating `«` / `»`
pub fn alternate_quotes(value: &str) -> String {
    let mut opening = true;
    value
        .chars()
        .map(|c| {
            if c == '"' {
                let mark = if opening { OPEN_QUOTE } else { CLOSE_QUOTE };
                opening = !opening;
                mark
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternate_quotes() {
        assert_eq!(alternate_quotes(r#"He said "hello""#), "He said «hello»");
        assert_eq!(alternate_quotes(r#"a "b" "c"#), "a «b» «c");
        assert_eq!(alternate_quotes("plain"), "plain");
    }
}
