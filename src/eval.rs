// SPDX: CC0-1.0

use crate::{
    lex::{Lexer, SubStr},
    parse::{self, ParseErr, ParseErrTyp},
    stdlib, Evaluator, ExpressionEvaluator, Number, Undefined,
};
use core::fmt;
use std::{collections::HashMap, sync::Arc};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorTyp {
    Neg,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Associativity {
    Left,
    Right,
}

impl OperatorTyp {
    pub const fn precedence(&self) -> i8 {
        match self {
            Self::Add => 2,
            Self::Sub => 2,
            Self::Mul => 3,
            Self::Div => 3,
            Self::Mod => 3,
            Self::Neg => 4,
            Self::Pow => 5,
        }
    }

    pub const fn associativity(&self) -> Associativity {
        use Associativity::{Left, Right};
        match self {
            Self::Neg => Right,
            Self::Add => Left,
            Self::Sub => Left,
            Self::Mul => Left,
            Self::Div => Left,
            Self::Mod => Left,
            Self::Pow => Right,
        }
    }

    /// Prefix operators never pop the operator stack when pushed.
    pub const fn is_prefix(&self) -> bool {
        matches!(self, Self::Neg)
    }

    pub const fn fun(&self) -> Fun {
        match self {
            Self::Neg => Fun::new("neg", Arity::exactly(1), stdlib::neg),
            Self::Add => Fun::new("add", Arity::exactly(2), stdlib::add),
            Self::Sub => Fun::new("sub", Arity::exactly(2), stdlib::sub),
            Self::Mul => Fun::new("mul", Arity::exactly(2), stdlib::mul),
            Self::Div => Fun::new("div", Arity::exactly(2), stdlib::div),
            Self::Mod => Fun::new("mod", Arity::exactly(2), stdlib::rem),
            Self::Pow => Fun::new("pow", Arity::exactly(2), stdlib::pow),
        }
    }
}

/// Accepted argument counts of a function, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Arity {
    pub min: usize,
    pub max: usize,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: n }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub const fn accepts(&self, argc: usize) -> bool {
        self.min <= argc && argc <= self.max
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = if self.max == 1 { "" } else { "s" };
        if self.min == self.max {
            write!(f, "{} argument{s}", self.min)
        } else {
            write!(f, "{} to {} argument{s}", self.min, self.max)
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Fun {
    pub name: &'static str,
    pub arity: Arity,
    pub fun: fn(&[Number]) -> Number,
}

impl Fun {
    pub const fn new(name: &'static str, arity: Arity, fun: fn(&[Number]) -> Number) -> Self {
        Self { name, arity, fun }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Ident {
    Var,
    Const(Number),
    Fun(Fun),
}

impl Ident {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Var => "variable",
            Self::Const(_) => "constant",
            Self::Fun(_) => "function",
        }
    }
}

pub type Idents = HashMap<&'static str, Ident>;

/// Postfix operation as produced by the parser.
#[derive(Clone, Copy, Debug)]
pub enum OperationTyp {
    Operator(OperatorTyp),
    Val(Number),
    Ident,
    Call { argc: usize },
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub typ: OperationTyp,
    pub loc: SubStr,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.typ {
            OperationTyp::Val(val) => write!(f, "push {val}"),
            OperationTyp::Operator(typ) => write!(f, "call '{}'", typ.fun().name),
            OperationTyp::Ident => write!(f, "load '{}'", self.loc.get()),
            OperationTyp::Call { argc } => write!(f, "call '{}' with {argc}", self.loc.get()),
        }
    }
}

/// Resolved instruction; identifiers are gone after compilation.
#[derive(Clone, Copy, Debug)]
enum Instr {
    Val(Number),
    Var,
    Call { fun: Fun, argc: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub name: &'static str,
    pub kind: &'static str,
}

#[derive(Debug)]
pub enum CompileErrTyp {
    Parse(ParseErrTyp),
    Empty,
    UndefinedIdent { suggestion: Option<Suggestion> },
    NotAValue { name: &'static str },
    MissingOperand { name: &'static str },
    Arity { name: &'static str, expected: Arity, found: usize },
    StackMismatch { found: usize },
}

#[derive(Debug)]
pub struct CompileErr {
    pub typ: CompileErrTyp,
    pub loc: SubStr,
}

impl CompileErr {
    /// Extra hint for the user, if there is something useful to say.
    pub fn note(&self) -> Option<String> {
        use crate::lex::{LexErrTyp, TokTyp};
        match &self.typ {
            CompileErrTyp::Parse(ParseErrTyp::LexErr(LexErrTyp::InvalidChar)) => Some(
                "available tokens are numbers, alphabetic identifiers, and symbols +-*/%^,()"
                    .to_string(),
            ),
            CompileErrTyp::Parse(ParseErrTyp::LexErr(LexErrTyp::Unsupported(typ))) => match typ {
                TokTyp::XGreater | TokTyp::XLess => {
                    Some("expected an expression but found an inequality".to_string())
                }
                TokTyp::XEqual => Some(
                    "expected an expression but found an equation; write only the right-hand side of y = ..."
                        .to_string(),
                ),
                TokTyp::XPipe => {
                    Some("use the 'abs' function to compute absolute value".to_string())
                }
                _ => Some("use parentheses for grouping".to_string()),
            },
            CompileErrTyp::Parse(ParseErrTyp::ParseNum(_)) => {
                Some("parsing as floating point number".to_string())
            }
            CompileErrTyp::UndefinedIdent {
                suggestion: Some(Suggestion { name, kind }),
            } => Some(format!("{kind} '{name}' has a similar name")),
            CompileErrTyp::UndefinedIdent { suggestion: None } => Some(format!(
                "the only variable is '{}'",
                stdlib::X
            )),
            CompileErrTyp::StackMismatch { .. } => {
                Some("separate values with an operator, for example '2*x'".to_string())
            }
            _ => None,
        }
    }
}

impl fmt::Display for CompileErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.typ {
            CompileErrTyp::Parse(typ) => write!(f, "{typ}"),
            CompileErrTyp::Empty => write!(f, "expression is empty"),
            CompileErrTyp::UndefinedIdent { .. } => {
                write!(f, "undefined identifier '{}'", self.loc.get())
            }
            CompileErrTyp::NotAValue { name } => {
                write!(f, "function '{name}' must be called with parentheses")
            }
            CompileErrTyp::MissingOperand { name } => {
                write!(f, "operator '{name}' is missing an operand")
            }
            CompileErrTyp::Arity {
                name,
                expected,
                found,
            } => write!(f, "function '{name}' takes {expected}, but found {found}"),
            CompileErrTyp::StackMismatch { found } => {
                write!(f, "expected a single value but found {found}")
            }
        }
    }
}

impl std::error::Error for CompileErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.typ {
            CompileErrTyp::Parse(ParseErrTyp::ParseNum(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseErr> for CompileErr {
    fn from(err: ParseErr) -> Self {
        Self {
            typ: CompileErrTyp::Parse(err.typ),
            loc: err.loc,
        }
    }
}

/// A compiled expression in `x`, evaluated on a small value stack.
#[derive(Clone, Debug)]
pub struct Program {
    src: Arc<String>,
    ops: Vec<Operation>,
    code: Vec<Instr>,
    depth: usize, // peak stack depth
}

impl Program {
    pub fn src(&self) -> &str {
        &self.src
    }

    #[inline]
    pub fn ops(&self) -> core::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    /// Evaluate with `x` bound to the given value.
    pub fn run(&self, x: Number, stack: &mut Vec<Number>) -> Result<Number, Undefined> {
        stack.clear();
        for instr in &self.code {
            match *instr {
                Instr::Val(val) => stack.push(val),
                Instr::Var => stack.push(x),
                Instr::Call { fun, argc } => {
                    let base = stack.len().checked_sub(argc).ok_or(Undefined)?;
                    let val = (fun.fun)(&stack[base..]);
                    stack.truncate(base);
                    stack.push(val);
                }
            }
        }
        match stack.as_slice() {
            [val] => Ok(*val),
            _ => Err(Undefined),
        }
    }
}

impl Evaluator for Program {
    fn evaluate(&self, x: Number) -> Result<Number, Undefined> {
        let mut stack = Vec::with_capacity(self.depth);
        self.run(x, &mut stack)
    }
}

fn suggest(text: &str, idents: &Idents) -> Option<Suggestion> {
    let text = text.to_ascii_lowercase();
    idents
        .iter()
        .map(|(name, ident)| {
            (
                strsim::normalized_damerau_levenshtein(&text, &name.to_ascii_lowercase()),
                (*name, ident),
            )
        })
        .reduce(|(acc_sim, acc_kv), (elem_sim, elem_kv)| {
            // ties go to the alphabetically first name so the pick is stable
            if elem_sim > acc_sim || (elem_sim == acc_sim && elem_kv.0 < acc_kv.0) {
                (elem_sim, elem_kv)
            } else {
                (acc_sim, acc_kv)
            }
        })
        .filter(|(sim, _)| *sim > 0.3)
        .map(|(_, (name, ident))| Suggestion {
            name,
            kind: ident.kind(),
        })
}

fn apply(depth: &mut usize, fun: Fun, argc: usize, loc: &SubStr) -> Result<Instr, CompileErr> {
    if *depth < argc {
        return Err(CompileErr {
            typ: CompileErrTyp::MissingOperand { name: fun.name },
            loc: loc.clone(),
        });
    }
    *depth = *depth - argc + 1;
    Ok(Instr::Call { fun, argc })
}

/// Resolve identifiers and check every stack effect of a parsed program.
pub fn compile(src: Arc<String>, ops: Vec<Operation>, idents: &Idents) -> Result<Program, CompileErr> {
    let mut code = Vec::with_capacity(ops.len());
    let mut depth = 0usize;
    let mut peak = 0usize;

    for op in &ops {
        let instr = match op.typ {
            OperationTyp::Val(val) => {
                depth += 1;
                Instr::Val(val)
            }

            OperationTyp::Ident => {
                let instr = match idents.get(op.loc.get()) {
                    Some(Ident::Var) => Instr::Var,
                    Some(Ident::Const(val)) => Instr::Val(*val),
                    Some(Ident::Fun(fun)) => {
                        return Err(CompileErr {
                            typ: CompileErrTyp::NotAValue { name: fun.name },
                            loc: op.loc.clone(),
                        })
                    }
                    None => {
                        return Err(CompileErr {
                            typ: CompileErrTyp::UndefinedIdent {
                                suggestion: suggest(op.loc.get(), idents),
                            },
                            loc: op.loc.clone(),
                        })
                    }
                };
                depth += 1;
                instr
            }

            OperationTyp::Operator(typ) => {
                let fun = typ.fun();
                apply(&mut depth, fun, fun.arity.min, &op.loc)?
            }

            OperationTyp::Call { argc } => {
                let fun = match idents.get(op.loc.get()) {
                    Some(Ident::Fun(fun)) => *fun,
                    _ => {
                        return Err(CompileErr {
                            typ: CompileErrTyp::UndefinedIdent {
                                suggestion: suggest(op.loc.get(), idents),
                            },
                            loc: op.loc.clone(),
                        })
                    }
                };
                if !fun.arity.accepts(argc) {
                    return Err(CompileErr {
                        typ: CompileErrTyp::Arity {
                            name: fun.name,
                            expected: fun.arity,
                            found: argc,
                        },
                        loc: op.loc.clone(),
                    });
                }
                apply(&mut depth, fun, argc, &op.loc)?
            }
        };
        peak = peak.max(depth);
        code.push(instr);
    }

    match depth {
        1 => Ok(Program {
            src,
            ops,
            code,
            depth: peak,
        }),
        0 => Err(CompileErr {
            typ: CompileErrTyp::Empty,
            loc: SubStr::all(src),
        }),
        found => Err(CompileErr {
            typ: CompileErrTyp::StackMismatch { found },
            loc: SubStr::all(src),
        }),
    }
}

/// The bundled expression evaluator: arithmetic, powers, and the
/// functions and constants of [`stdlib::standard_idents`].
#[derive(Debug)]
pub struct Interpreter {
    idents: Idents,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            idents: stdlib::standard_idents(),
        }
    }

    pub fn idents(&self) -> &Idents {
        &self.idents
    }

    /// Lex, parse and compile `src`.
    pub fn compile_program(&self, src: &str) -> Result<Program, CompileErr> {
        let src = Arc::new(src.to_string());
        let ops = parse::parse(Lexer::new(&src), &self.idents)?;
        let prog = compile(Arc::clone(&src), ops, &self.idents)?;
        // structural failures are ruled out above, so only a bug lands here
        prog.evaluate(0.0).map_err(|_| CompileErr {
            typ: CompileErrTyp::StackMismatch { found: 0 },
            loc: SubStr::all(src),
        })?;
        Ok(prog)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator for Interpreter {
    fn compile(&self, src: &str) -> Result<Box<dyn Evaluator>, CompileErr> {
        Ok(Box::new(self.compile_program(src)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    fn eval_at(src: &str, x: Number) -> Number {
        Interpreter::new()
            .compile_program(src)
            .unwrap_or_else(|err| panic!("{src}: {err}"))
            .evaluate(x)
            .expect("defined")
    }

    fn compile_err(src: &str) -> CompileErr {
        Interpreter::new()
            .compile_program(src)
            .expect_err("should not compile")
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval_at("1 + 2 * 3", 0.0), 7.0);
        assert_eq!(eval_at("2 ^ 3 ^ 2", 0.0), 512.0);
        assert_eq!(eval_at("-x^2", 3.0), -9.0);
        assert_eq!(eval_at("2^-x", 1.0), 0.5);
        assert_eq!(eval_at("10 - 4 - 3", 0.0), 3.0);
        assert_eq!(eval_at("7 % 4 * 2", 0.0), 6.0);
        assert_eq!(eval_at("-(x - 1) * 2", 4.0), -6.0);
    }

    #[test]
    fn functions_and_constants() {
        assert!((eval_at("sin(pi / 2)", 0.0) - 1.0).abs() < 1e-12);
        assert_eq!(eval_at("max(x, 3)", 5.0), 5.0);
        assert_eq!(eval_at("log(8, 2)", 0.0), 3.0);
        assert!((eval_at("log(e)", 0.0) - 1.0).abs() < 1e-12);
        assert_eq!(eval_at("sqrt(abs(x))", -16.0), 4.0);
    }

    #[test]
    fn implicit_multiplication() {
        assert_eq!(eval_at("2x", 3.0), 6.0);
        assert_eq!(eval_at("3(x + 1)", 1.0), 6.0);
        assert_eq!(eval_at("(x + 1)(x - 1)", 3.0), 8.0);
        assert!((eval_at("2 sin(x)", 0.5) - 2.0 * 0.5f64.sin()).abs() < 1e-12);
        assert!((eval_at("x pi", 2.0) - 2.0 * core::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn domain_errors_are_non_finite_not_failures() {
        let prog = Interpreter::new().compile_program("1/x").unwrap();
        assert_eq!(prog.evaluate(0.0), Ok(Number::INFINITY));
        let prog = Interpreter::new().compile_program("ln(x)").unwrap();
        assert!(prog.evaluate(-1.0).unwrap().is_nan());
        assert_eq!(prog.defined_at(-1.0), None);
    }

    #[test]
    fn undefined_identifier_suggests_similar_name() {
        let err = compile_err("sni(x)");
        assert!(matches!(
            err.typ,
            CompileErrTyp::UndefinedIdent {
                suggestion: Some(Suggestion { name: "sin", .. })
            }
        ));
        assert_eq!(err.loc.get(), "sni");
        assert_eq!(err.note().as_deref(), Some("function 'sin' has a similar name"));
    }

    #[test]
    fn structural_errors() {
        assert!(matches!(compile_err("").typ, CompileErrTyp::Empty));
        assert!(matches!(
            compile_err("2 +").typ,
            CompileErrTyp::MissingOperand { name: "add" }
        ));
        assert!(matches!(
            compile_err("sin(1, 2)").typ,
            CompileErrTyp::Arity { name: "sin", found: 2, .. }
        ));
        assert!(matches!(
            compile_err("sin + 1").typ,
            CompileErrTyp::Parse(ParseErrTyp::ExpectedCall)
        ));
        assert!(matches!(
            compile_err("(x + 1").typ,
            CompileErrTyp::Parse(ParseErrTyp::ParenMismatch)
        ));
    }

    #[test]
    fn arity_display() {
        assert_eq!(Arity::exactly(1).to_string(), "1 argument");
        assert_eq!(Arity::between(1, 2).to_string(), "1 to 2 arguments");
    }

    #[test]
    fn compiling_arbitrary_text_never_panics() {
        fn prop(src: String) -> TestResult {
            let interp = Interpreter::new();
            if let Ok(prog) = interp.compile_program(&src) {
                // compiled programs are structurally sound
                if prog.evaluate(1.5).is_err() {
                    return TestResult::failed();
                }
            }
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(1000)
            .quickcheck(prop as fn(String) -> TestResult);
    }
}
