//! Precedence-climbing parser for inline expressions

use super::lexer::{tokenize, Token};
use super::ScriptError;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    Ident(String),
    Array(Vec<Expr>),
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    Gt,
    Le,
    Ge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

/// Parse one complete expression
pub fn parse(source: &str) -> Result<Expr, ScriptError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(ScriptError::Parse(format!("unexpected token {:?}", token))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, punct: &str) -> bool {
        if matches!(self.peek(), Some(Token::Punct(p)) if *p == punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), ScriptError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(ScriptError::Parse(format!(
                "expected '{}', found {:?}",
                punct,
                self.peek()
            )))
        }
    }

    fn expression(&mut self) -> Result<Expr, ScriptError> {
        let test = self.logical(0)?;
        if !self.eat("?") {
            return Ok(test);
        }
        let consequent = self.expression()?;
        self.expect(":")?;
        let alternate = self.expression()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    /// `??` binds loosest, then `||`, then `&&`
    fn logical(&mut self, level: usize) -> Result<Expr, ScriptError> {
        const LEVELS: [(&str, LogicalOp); 3] = [
            ("??", LogicalOp::Nullish),
            ("||", LogicalOp::Or),
            ("&&", LogicalOp::And),
        ];
        if level == LEVELS.len() {
            return self.binary(0);
        }
        let (punct, op) = LEVELS[level];
        let mut left = self.logical(level + 1)?;
        while self.eat(punct) {
            let right = self.logical(level + 1)?;
            left = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn binary(&mut self, level: usize) -> Result<Expr, ScriptError> {
        const LEVELS: [&[(&str, BinaryOp)]; 3] = [
            &[
                ("===", BinaryOp::StrictEq),
                ("!==", BinaryOp::StrictNe),
                ("==", BinaryOp::LooseEq),
                ("!=", BinaryOp::LooseNe),
            ],
            &[
                ("<=", BinaryOp::Le),
                (">=", BinaryOp::Ge),
                ("<", BinaryOp::Lt),
                (">", BinaryOp::Gt),
            ],
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub)],
        ];
        if level == LEVELS.len() {
            return self.unary();
        }
        let mut left = self.binary(level + 1)?;
        'outer: loop {
            for (punct, op) in LEVELS[level] {
                if self.eat(punct) {
                    let right = self.binary(level + 1)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        let op = if self.eat("!") {
            UnaryOp::Not
        } else if self.eat("-") {
            UnaryOp::Neg
        } else {
            return self.postfix();
        };
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        loop {
            let optional = if self.eat("?.") {
                true
            } else if self.eat(".") {
                false
            } else if self.eat("[") {
                let index = self.expression()?;
                self.expect("]")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    optional: false,
                };
                continue;
            } else if self.eat("(") {
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args: self.list(")")?,
                };
                continue;
            } else {
                return Ok(expr);
            };

            if optional && self.eat("[") {
                let index = self.expression()?;
                self.expect("]")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                    optional: true,
                };
                continue;
            }
            expr = match self.next() {
                Some(Token::Ident(property)) => Expr::Member {
                    object: Box::new(expr),
                    property,
                    optional,
                },
                other => {
                    return Err(ScriptError::Parse(format!(
                        "expected property name, found {:?}",
                        other
                    )))
                }
            };
        }
    }

    /// Comma-separated expressions up to `close`; the opener is already consumed
    fn list(&mut self, close: &str) -> Result<Vec<Expr>, ScriptError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression()?);
            if !self.eat(",") {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Str(s)) => Ok(Expr::Str(s)),
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                "null" => Expr::Null,
                "undefined" => Expr::Undefined,
                _ => Expr::Ident(name),
            }),
            Some(Token::Punct("(")) => {
                let inner = self.expression()?;
                self.expect(")")?;
                Ok(inner)
            }
            Some(Token::Punct("[")) => Ok(Expr::Array(self.list("]")?)),
            other => Err(ScriptError::Parse(format!("unexpected token {:?}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    #[test]
    fn test_member_chain() {
        let expr = parse("book.authors.length").unwrap();
        assert_eq!(
            expr,
            Expr::Member {
                object: Box::new(Expr::Member {
                    object: ident("book"),
                    property: "authors".to_string(),
                    optional: false,
                }),
                property: "length".to_string(),
                optional: false,
            }
        );
    }

    #[test]
    fn test_optional_index() {
        let expr = parse("book.tags?.[0]").unwrap();
        assert!(matches!(expr, Expr::Index { optional: true, .. }));
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 === 3 && !false").unwrap();
        match expr {
            Expr::Logical { op: LogicalOp::And, left, .. } => match *left {
                Expr::Binary { op: BinaryOp::StrictEq, left, .. } => {
                    assert!(matches!(*left, Expr::Binary { op: BinaryOp::Add, .. }));
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_conditional_is_right_associative() {
        let expr = parse("a ? b : c ? d : e").unwrap();
        match expr {
            Expr::Conditional { alternate, .. } => {
                assert!(matches!(*alternate, Expr::Conditional { .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("book."), Err(ScriptError::Parse(_))));
        assert!(matches!(parse("(1 + 2"), Err(ScriptError::Parse(_))));
        assert!(matches!(parse("1 2"), Err(ScriptError::Parse(_))));
        assert!(matches!(parse("x => x"), Err(ScriptError::Parse(_))));
    }
}
