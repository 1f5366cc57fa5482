//! Pratt parser producing a [`Node`] tree.

use serde_json::Value;

use crate::ast::{BinaryOp, Node, Step, UnaryOp};
use crate::error::{ExprError, ExprResult};
use crate::functions;
use crate::lexer::{tokenize, Spanned, Token};

const BP_CONDITION: u8 = 5;
const BP_PREFIX: u8 = 70;
const BP_POSTFIX: u8 = 80;

/// Parse expression text into an AST.
pub fn parse(src: &str) -> ExprResult<Node> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: src.len(),
    };
    let node = parser.expression(0)?;
    if let Some(t) = parser.peek() {
        return Err(ExprError::Parse {
            pos: t.pos,
            reason: format!("unexpected {:?}", t.token),
        });
    }
    Ok(node)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Spanned> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn here(&self) -> usize {
        self.peek().map(|t| t.pos).unwrap_or(self.end)
    }

    fn expect(&mut self, token: Token) -> ExprResult<()> {
        match self.next() {
            Some(t) if t.token == token => Ok(()),
            Some(t) => Err(ExprError::Parse {
                pos: t.pos,
                reason: format!("expected {token:?}, found {:?}", t.token),
            }),
            None => Err(ExprError::Parse {
                pos: self.end,
                reason: format!("expected {token:?}, found end of input"),
            }),
        }
    }

    fn expression(&mut self, min_bp: u8) -> ExprResult<Node> {
        let mut lhs = self.prefix()?;

        loop {
            let Some(next) = self.peek() else { break };
            let token = next.token.clone();

            match token {
                Token::Dot if BP_POSTFIX >= min_bp => {
                    let pos = next.pos;
                    self.pos += 1;
                    let name = match self.next() {
                        Some(Spanned {
                            token: Token::Name(n),
                            ..
                        }) => n,
                        _ => {
                            return Err(ExprError::Parse {
                                pos,
                                reason: "expected a name after '.'".into(),
                            })
                        }
                    };
                    match &mut lhs {
                        Node::Path(steps) => steps.push(Step::new(name)),
                        _ => {
                            return Err(ExprError::Parse {
                                pos,
                                reason: "a path step must follow a path".into(),
                            })
                        }
                    }
                    continue;
                }
                Token::LBracket if BP_POSTFIX >= min_bp => {
                    self.pos += 1;
                    let predicate = self.expression(0)?;
                    self.expect(Token::RBracket)?;
                    lhs = match lhs {
                        Node::Path(mut steps) => {
                            if let Some(last) = steps.last_mut() {
                                last.stages.push(predicate);
                            }
                            Node::Path(steps)
                        }
                        other => Node::Filter {
                            base: Box::new(other),
                            predicate: Box::new(predicate),
                        },
                    };
                    continue;
                }
                Token::Question if BP_CONDITION >= min_bp => {
                    self.pos += 1;
                    let then = self.expression(0)?;
                    let otherwise = if matches!(self.peek().map(|t| &t.token), Some(Token::Colon)) {
                        self.pos += 1;
                        Some(Box::new(self.expression(BP_CONDITION)?))
                    } else {
                        None
                    };
                    lhs = Node::Condition {
                        test: Box::new(lhs),
                        then: Box::new(then),
                        otherwise,
                    };
                    continue;
                }
                _ => {}
            }

            let Some((op, lbp, rbp)) = infix_binding(&token) else { break };
            if lbp < min_bp {
                break;
            }
            self.pos += 1;
            let rhs = self.expression(rbp)?;
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn prefix(&mut self) -> ExprResult<Node> {
        let pos = self.here();
        let Some(t) = self.next() else {
            return Err(ExprError::Parse {
                pos,
                reason: "unexpected end of input".into(),
            });
        };

        match t.token {
            Token::Number(n) => Ok(Node::Literal(number_value(n))),
            Token::Str(s) => Ok(Node::Literal(Value::String(s))),
            Token::Name(n) => Ok(match n.as_str() {
                "true" => Node::Literal(Value::Bool(true)),
                "false" => Node::Literal(Value::Bool(false)),
                "null" => Node::Literal(Value::Null),
                _ => Node::Path(vec![Step::new(n)]),
            }),
            Token::Dollar(name) if name.is_empty() => Ok(Node::Context),
            Token::Dollar(name) => {
                if !matches!(self.peek().map(|t| &t.token), Some(Token::LParen)) {
                    return Err(ExprError::Parse {
                        pos: t.pos,
                        reason: format!("variable ${name} is not bound"),
                    });
                }
                self.pos += 1;
                let arguments = self.list(Token::RParen)?;
                functions::check_call(&name, arguments.len())?;
                Ok(Node::Call {
                    function: name,
                    arguments,
                })
            }
            Token::LParen => {
                let inner = self.expression(0)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => Ok(Node::Array(self.list(Token::RBracket)?)),
            Token::Minus => {
                let operand = self.expression(BP_PREFIX)?;
                Ok(Node::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                })
            }
            other => Err(ExprError::Parse {
                pos: t.pos,
                reason: format!("unexpected {other:?}"),
            }),
        }
    }

    /// Comma-separated expressions up to and including `close`.
    fn list(&mut self, close: Token) -> ExprResult<Vec<Node>> {
        let mut items = Vec::new();
        if self.peek().map(|t| &t.token) == Some(&close) {
            self.pos += 1;
            return Ok(items);
        }
        loop {
            items.push(self.expression(0)?);
            match self.next() {
                Some(t) if t.token == Token::Comma => continue,
                Some(t) if t.token == close => return Ok(items),
                Some(t) => {
                    return Err(ExprError::Parse {
                        pos: t.pos,
                        reason: format!("expected ',' or {close:?}, found {:?}", t.token),
                    })
                }
                None => {
                    return Err(ExprError::Parse {
                        pos: self.end,
                        reason: format!("expected {close:?}, found end of input"),
                    })
                }
            }
        }
    }
}

fn infix_binding(token: &Token) -> Option<(BinaryOp, u8, u8)> {
    let (op, lbp) = match token {
        Token::Name(n) if n == "or" => (BinaryOp::Or, 10),
        Token::Name(n) if n == "and" => (BinaryOp::And, 20),
        Token::Name(n) if n == "in" => (BinaryOp::In, 40),
        Token::Eq => (BinaryOp::Eq, 40),
        Token::Ne => (BinaryOp::Ne, 40),
        Token::Lt => (BinaryOp::Lt, 40),
        Token::Le => (BinaryOp::Le, 40),
        Token::Gt => (BinaryOp::Gt, 40),
        Token::Ge => (BinaryOp::Ge, 40),
        Token::Amp => (BinaryOp::Concat, 50),
        Token::Plus => (BinaryOp::Add, 50),
        Token::Minus => (BinaryOp::Sub, 50),
        Token::Star => (BinaryOp::Mul, 60),
        Token::Slash => (BinaryOp::Div, 60),
        Token::Percent => (BinaryOp::Mod, 60),
        _ => return None,
    };
    Some((op, lbp, lbp + 1))
}

/// Whole numbers become JSON integers so they compare equal to state values.
pub(crate) fn number_value(n: f64) -> Value {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(names: &[&str]) -> Node {
        Node::Path(names.iter().map(|n| Step::new(*n)).collect())
    }

    #[test]
    fn precedence() {
        let ast = parse("a + b * 2").unwrap();
        assert_eq!(
            ast,
            Node::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(path(&["a"])),
                rhs: Box::new(Node::Binary {
                    op: BinaryOp::Mul,
                    lhs: Box::new(path(&["b"])),
                    rhs: Box::new(Node::Literal(json!(2))),
                }),
            }
        );
    }

    #[test]
    fn dotted_path() {
        assert_eq!(parse("list.tasks.task").unwrap(), path(&["list", "tasks", "task"]));
    }

    #[test]
    fn predicate_attaches_to_step() {
        let ast = parse("tasks[0].task").unwrap();
        match ast {
            Node::Path(steps) => {
                assert_eq!(steps.len(), 2);
                assert_eq!(steps[0].stages, vec![Node::Literal(json!(0))]);
                assert!(steps[1].stages.is_empty());
            }
            other => panic!("expected path, got {other:?}"),
        }
    }

    #[test]
    fn condition_and_keywords() {
        let ast = parse("done and count > 0 ? 'yes' : 'no'").unwrap();
        assert!(matches!(ast, Node::Condition { otherwise: Some(_), .. }));
        assert_eq!(parse("true").unwrap(), Node::Literal(json!(true)));
        assert_eq!(parse("null").unwrap(), Node::Literal(Value::Null));
    }

    #[test]
    fn calls_and_arrays() {
        let ast = parse("$count([1, 2, x])").unwrap();
        match ast {
            Node::Call { function, arguments } => {
                assert_eq!(function, "count");
                assert!(matches!(&arguments[0], Node::Array(items) if items.len() == 3));
            }
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn unary_minus_binds_tighter_than_binary() {
        let ast = parse("-a + 1").unwrap();
        assert!(matches!(ast, Node::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn rejects_unknown_function_and_bad_input() {
        assert_eq!(
            parse("$nope(1)").unwrap_err(),
            ExprError::UnknownFunction("nope".into())
        );
        assert!(matches!(parse("a +"), Err(ExprError::Parse { .. })));
        assert!(matches!(parse("(a"), Err(ExprError::Parse { .. })));
        assert!(matches!(parse("a b"), Err(ExprError::Parse { .. })));
        assert!(matches!(parse("$x"), Err(ExprError::Parse { .. })));
        assert!(matches!(parse("(1).a"), Err(ExprError::Parse { .. })));
    }

    #[test]
    fn whole_numbers_are_integers() {
        assert_eq!(number_value(5.0), json!(5));
        assert_eq!(number_value(2.5), json!(2.5));
    }
}
