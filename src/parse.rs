// SPDX: CC0-1.0

// implementation of shunting yard algorithm by dijkstra (see https://en.wikipedia.org/wiki/Shunting_yard_algorithm),
// extended with argument counting and implicit multiplication

use crate::{
    eval::{Associativity, Ident, Idents, Operation, OperationTyp, OperatorTyp},
    lex::{LexErr, LexErrTyp, Lexer, SubStr, Tok, TokTyp},
    Number,
};
use core::{fmt, num::ParseFloatError};

#[derive(Debug)]
pub enum ParseErrTyp {
    LexErr(LexErrTyp),
    ParseNum(ParseFloatError),
    ParenMismatch,
    ExpectedCall,
    EmptyGroup,
    MissingArgument,
    UnexpectedComma,
}

impl fmt::Display for ParseErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LexErr(err) => write!(f, "{err}"),
            Self::ParseNum(err) => write!(f, "invalid number: {err}"),
            Self::ParenMismatch => write!(f, "mismatched parentheses"),
            Self::ExpectedCall => write!(f, "expected '(' after function name"),
            Self::EmptyGroup => write!(f, "empty parentheses"),
            Self::MissingArgument => write!(f, "missing function argument"),
            Self::UnexpectedComma => write!(f, "comma outside of a function call"),
        }
    }
}

#[derive(Debug)]
pub struct ParseErr {
    pub typ: ParseErrTyp,
    pub loc: SubStr,
}

impl From<LexErr> for ParseErr {
    fn from(err: LexErr) -> Self {
        Self {
            typ: ParseErrTyp::LexErr(err.typ),
            loc: err.loc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ShuntOpTyp {
    Operator(OperatorTyp),
    Fun,
    OpenParen { call: bool },
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ShuntOp {
    typ: ShuntOpTyp,
    loc: SubStr,
}

/// Pop operators into the output until an open parenthesis is on top.
fn drain_to_paren(ops: &mut Vec<ShuntOp>, out: &mut Vec<Operation>) {
    while let Some(op) = ops.pop() {
        match op.typ {
            ShuntOpTyp::Operator(typ) => out.push(Operation {
                typ: OperationTyp::Operator(typ),
                loc: op.loc,
            }),
            ShuntOpTyp::OpenParen { .. } | ShuntOpTyp::Fun => {
                ops.push(op);
                break;
            }
        }
    }
}

fn push_operator(o1: OperatorTyp, loc: SubStr, ops: &mut Vec<ShuntOp>, out: &mut Vec<Operation>) {
    if !o1.is_prefix() {
        while let Some(ShuntOp {
            typ: ShuntOpTyp::Operator(o2),
            ..
        }) = ops.last()
        {
            let o2 = *o2;
            if (o2.precedence() > o1.precedence())
                || ((o1.precedence() == o2.precedence())
                    && (o1.associativity() == Associativity::Left))
            {
                if let Some(op) = ops.pop() {
                    out.push(Operation {
                        typ: OperationTyp::Operator(o2),
                        loc: op.loc,
                    });
                }
            } else {
                break;
            }
        }
    }
    ops.push(ShuntOp {
        typ: ShuntOpTyp::Operator(o1),
        loc,
    });
}

fn is_fun(tok: &Tok, idents: &Idents) -> bool {
    matches!(idents.get(tok.loc.get()), Some(Ident::Fun(_)))
}

/// Parse an infix token stream into postfix operations. Identifiers are
/// classified with `idents` so that `f(x)` is a call and `a(x)` a product.
pub fn parse(lex: Lexer<'_>, idents: &Idents) -> Result<Vec<Operation>, ParseErr> {
    let toks = lex.collect::<Result<Vec<Tok>, LexErr>>()?;

    let mut out: Vec<Operation> = Vec::new(); // output
    let mut ops: Vec<ShuntOp> = Vec::new(); // operator stack
    let mut argc: Vec<usize> = Vec::new(); // one counter per open call

    let mut prev: Option<&Tok> = None;
    for (idx, tok) in toks.iter().enumerate() {
        let next = toks.get(idx + 1);

        // a value followed directly by another value multiplies them
        let prev_ends_operand = prev.is_some_and(|p| match p.typ {
            TokTyp::Number | TokTyp::CloseParen => true,
            TokTyp::Ident => !is_fun(p, idents),
            _ => false,
        });
        let starts_operand = matches!(
            tok.typ,
            TokTyp::Number | TokTyp::Ident | TokTyp::OpenParen
        );
        if prev_ends_operand && starts_operand {
            push_operator(
                OperatorTyp::Mul,
                SubStr::new(tok.loc.src(), tok.loc.start(), 0),
                &mut ops,
                &mut out,
            );
        }

        match tok.typ {
            TokTyp::Number => {
                let num: Number = tok.loc.get().parse().map_err(|err| ParseErr {
                    typ: ParseErrTyp::ParseNum(err),
                    loc: tok.loc.clone(),
                })?;
                out.push(Operation {
                    typ: OperationTyp::Val(num),
                    loc: tok.loc.clone(),
                });
            }

            TokTyp::Ident if is_fun(tok, idents) => {
                if !next.is_some_and(|n| n.typ == TokTyp::OpenParen) {
                    return Err(ParseErr {
                        typ: ParseErrTyp::ExpectedCall,
                        loc: tok.loc.clone(),
                    });
                }
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::Fun,
                    loc: tok.loc.clone(),
                });
            }

            TokTyp::Ident => {
                // unknown identifiers are reported by the compiler, which
                // knows how to suggest a similar name
                out.push(Operation {
                    typ: OperationTyp::Ident,
                    loc: tok.loc.clone(),
                });
            }

            TokTyp::Op(o1) => push_operator(o1, tok.loc.clone(), &mut ops, &mut out),

            TokTyp::Comma => {
                if matches!(prev.map(|p| p.typ), Some(TokTyp::Comma | TokTyp::OpenParen)) {
                    return Err(ParseErr {
                        typ: ParseErrTyp::MissingArgument,
                        loc: tok.loc.clone(),
                    });
                }
                drain_to_paren(&mut ops, &mut out);
                match (ops.last().map(|op| op.typ), argc.last_mut()) {
                    (Some(ShuntOpTyp::OpenParen { call: true }), Some(count)) => *count += 1,
                    _ => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::UnexpectedComma,
                            loc: tok.loc.clone(),
                        })
                    }
                }
            }

            TokTyp::OpenParen => {
                let call = prev.is_some_and(|p| p.typ == TokTyp::Ident && is_fun(p, idents));
                if call {
                    argc.push(1);
                }
                ops.push(ShuntOp {
                    typ: ShuntOpTyp::OpenParen { call },
                    loc: tok.loc.clone(),
                });
            }

            TokTyp::CloseParen => {
                let empty = prev.is_some_and(|p| p.typ == TokTyp::OpenParen);
                if prev.is_some_and(|p| p.typ == TokTyp::Comma) {
                    return Err(ParseErr {
                        typ: ParseErrTyp::MissingArgument,
                        loc: tok.loc.clone(),
                    });
                }

                drain_to_paren(&mut ops, &mut out);
                let call = match ops.pop() {
                    Some(ShuntOp {
                        typ: ShuntOpTyp::OpenParen { call },
                        ..
                    }) => call,
                    _ => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParenMismatch,
                            loc: tok.loc.clone(),
                        })
                    }
                };

                if !call {
                    if empty {
                        return Err(ParseErr {
                            typ: ParseErrTyp::EmptyGroup,
                            loc: tok.loc.clone(),
                        });
                    }
                    prev = Some(tok);
                    continue;
                }

                // handle functions
                let count = argc.pop().unwrap_or(0);
                match ops.pop() {
                    Some(ShuntOp {
                        typ: ShuntOpTyp::Fun,
                        loc,
                    }) => out.push(Operation {
                        typ: OperationTyp::Call {
                            argc: if empty { 0 } else { count },
                        },
                        loc,
                    }),
                    _ => {
                        return Err(ParseErr {
                            typ: ParseErrTyp::ParenMismatch,
                            loc: tok.loc.clone(),
                        })
                    }
                }
            }

            TokTyp::XGreater
            | TokTyp::XLess
            | TokTyp::XEqual
            | TokTyp::XPipe
            | TokTyp::XOpenSquareBracket
            | TokTyp::XCloseSquareBracket
            | TokTyp::XOpenCurly
            | TokTyp::XCloseCurly => {
                // the lexer stops at these, but keep the parser total
                return Err(ParseErr {
                    typ: ParseErrTyp::LexErr(LexErrTyp::Unsupported(tok.typ)),
                    loc: tok.loc.clone(),
                });
            }
        }

        prev = Some(tok);
    }

    while let Some(op) = ops.pop() {
        match op.typ {
            ShuntOpTyp::Operator(typ) => out.push(Operation {
                typ: OperationTyp::Operator(typ),
                loc: op.loc,
            }),
            ShuntOpTyp::OpenParen { .. } | ShuntOpTyp::Fun => {
                return Err(ParseErr {
                    typ: ParseErrTyp::ParenMismatch,
                    loc: op.loc,
                });
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib;
    use std::sync::Arc;

    fn postfix(src: &str) -> Result<String, ParseErr> {
        let src = Arc::new(src.to_string());
        let ops = parse(Lexer::new(&src), &stdlib::standard_idents())?;
        Ok(ops
            .iter()
            .map(|op| match op.typ {
                OperationTyp::Val(val) => val.to_string(),
                OperationTyp::Ident => op.loc.get().to_string(),
                OperationTyp::Operator(typ) => typ.fun().name.to_string(),
                OperationTyp::Call { argc } => format!("{}/{argc}", op.loc.get()),
            })
            .collect::<Vec<_>>()
            .join(" "))
    }

    #[test]
    fn shunting_yard_order() {
        assert_eq!(postfix("1 + 2 * x").unwrap(), "1 2 x mul add");
        assert_eq!(postfix("(1 + 2) * x").unwrap(), "1 2 add x mul");
        assert_eq!(postfix("x ^ 2 ^ 3").unwrap(), "x 2 3 pow pow");
        assert_eq!(postfix("-x ^ 2").unwrap(), "x 2 pow neg");
    }

    #[test]
    fn calls_count_arguments() {
        assert_eq!(postfix("atan2(x, 1)").unwrap(), "x 1 atan2/2");
        assert_eq!(postfix("log(x)").unwrap(), "x log/1");
        assert_eq!(postfix("max(1, min(x, 2))").unwrap(), "1 x 2 min/2 max/2");
        assert_eq!(postfix("sin()").unwrap(), "sin/0");
    }

    #[test]
    fn implicit_products() {
        assert_eq!(postfix("2x").unwrap(), "2 x mul");
        assert_eq!(postfix("2 sin(x)").unwrap(), "2 x sin/1 mul");
        assert_eq!(postfix("(x)(x)").unwrap(), "x x mul");
        assert_eq!(postfix("x^2 3").unwrap(), "x 2 pow 3 mul");
    }

    #[test]
    fn malformed_input() {
        assert!(matches!(postfix("(x").unwrap_err().typ, ParseErrTyp::ParenMismatch));
        assert!(matches!(postfix("x)").unwrap_err().typ, ParseErrTyp::ParenMismatch));
        assert!(matches!(postfix("()").unwrap_err().typ, ParseErrTyp::EmptyGroup));
        assert!(matches!(postfix("1, 2").unwrap_err().typ, ParseErrTyp::UnexpectedComma));
        assert!(matches!(postfix("max(1,)").unwrap_err().typ, ParseErrTyp::MissingArgument));
        assert!(matches!(postfix("cos x").unwrap_err().typ, ParseErrTyp::ExpectedCall));
        assert!(matches!(postfix("1.2.3").unwrap_err().typ, ParseErrTyp::ParseNum(_)));
    }
}
