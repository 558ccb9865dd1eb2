// SPDX: CC0-1.0

use crate::eval::OperatorTyp;
use core::fmt;
use std::sync::Arc;

/// A span of the expression source, kept alive for error reporting.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubStr {
    // yes, silly, but atomic operations are cheap for this use case
    src: Arc<String>,
    start: usize,
    len: usize,
}

impl SubStr {
    #[inline]
    pub const fn new(src: Arc<String>, start: usize, len: usize) -> Self {
        Self { src, start, len }
    }

    #[inline]
    pub fn all(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, 0, len)
    }

    /// Zero-width span just past the end of the source.
    pub fn end_of(src: Arc<String>) -> Self {
        let len = src.len();
        Self::new(src, len, 0)
    }

    pub fn src(&self) -> Arc<String> {
        Arc::clone(&self.src)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self) -> &str {
        &self.src[self.start..self.start + self.len]
    }
}

impl fmt::Display for SubStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokTyp {
    Ident,
    Number,
    Op(OperatorTyp),
    Comma,
    OpenParen,
    CloseParen,

    // unsupported tokens
    XGreater,
    XLess,
    XEqual,
    XPipe,
    XOpenSquareBracket,
    XCloseSquareBracket,
    XOpenCurly,
    XCloseCurly,
}

impl TokTyp {
    pub const fn is_unsupported(&self) -> bool {
        match self {
            Self::Ident
            | Self::Number
            | Self::Op(_)
            | Self::Comma
            | Self::OpenParen
            | Self::CloseParen => false,

            Self::XGreater
            | Self::XLess
            | Self::XEqual
            | Self::XPipe
            | Self::XOpenSquareBracket
            | Self::XCloseSquareBracket
            | Self::XOpenCurly
            | Self::XCloseCurly => true,
        }
    }

    /// Whether a value can end right before this token.
    const fn ends_operand(&self) -> bool {
        matches!(self, Self::Ident | Self::Number | Self::CloseParen)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tok {
    pub typ: TokTyp,
    pub loc: SubStr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LexErrTyp {
    InvalidChar,
    Unsupported(TokTyp),
}

impl fmt::Display for LexErrTyp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidChar => write!(f, "invalid character"),
            Self::Unsupported(_) => write!(f, "unsupported character"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LexErr {
    pub typ: LexErrTyp,
    pub loc: SubStr,
}

#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src Arc<String>,
    pos: usize,              // byte offset of the next unread character
    prev: Option<TokTyp>,    // decides unary vs. binary minus
    has_errored: bool,       // tells iter to yield None after error
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src Arc<String>) -> Self {
        Self {
            src,
            pos: 0,
            prev: None,
            has_errored: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let chr = self.peek()?;
        self.pos += chr.len_utf8();
        Some(chr)
    }

    fn span(&self, start: usize) -> SubStr {
        SubStr::new(Arc::clone(self.src), start, self.pos - start)
    }

    pub fn trim_whitespace(&mut self) {
        while let Some(chr) = self.peek() {
            if chr.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn expects_operand(&self) -> bool {
        !self.prev.is_some_and(|typ| typ.ends_operand())
    }

    fn consume_while<P>(&mut self, predicate: P)
    where
        P: Fn(char) -> bool,
    {
        while let Some(chr) = self.peek() {
            if predicate(chr) {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Digits and dots, then an optional exponent. `2e` stays a number
    /// followed by the identifier `e`.
    fn consume_number(&mut self) {
        self.consume_while(|chr| chr.is_ascii_digit() || chr == '.');
        if let Some('e' | 'E') = self.peek() {
            let has_exponent = match self.peek_nth(1) {
                Some(chr) if chr.is_ascii_digit() => true,
                Some('+' | '-') => self.peek_nth(2).is_some_and(|chr| chr.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                self.bump();
                if let Some('+' | '-') = self.peek() {
                    self.bump();
                }
                self.consume_while(|chr| chr.is_ascii_digit());
            }
        }
    }

    fn consume_ident(&mut self) {
        self.consume_while(|chr| chr.is_ascii_alphanumeric() || chr == '_');
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Tok, LexErr>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.has_errored {
            return None;
        }

        let (start, typ) = loop {
            self.trim_whitespace();
            let start = self.pos;
            let chr = self.peek()?;
            let typ = match chr {
                // unary plus is a no-op
                '+' if self.expects_operand() => {
                    self.bump();
                    continue;
                }
                '+' => TokTyp::Op(OperatorTyp::Add),
                '-' if self.expects_operand() => TokTyp::Op(OperatorTyp::Neg),
                '-' => TokTyp::Op(OperatorTyp::Sub),
                '*' => TokTyp::Op(OperatorTyp::Mul),
                '/' => TokTyp::Op(OperatorTyp::Div),
                '%' => TokTyp::Op(OperatorTyp::Mod),
                '^' => TokTyp::Op(OperatorTyp::Pow),
                ',' => TokTyp::Comma,
                '(' => TokTyp::OpenParen,
                ')' => TokTyp::CloseParen,

                '>' => TokTyp::XGreater,
                '<' => TokTyp::XLess,
                '=' => TokTyp::XEqual,
                '|' => TokTyp::XPipe,
                '[' => TokTyp::XOpenSquareBracket,
                ']' => TokTyp::XCloseSquareBracket,
                '{' => TokTyp::XOpenCurly,
                '}' => TokTyp::XCloseCurly,

                chr if chr.is_ascii_digit() || chr == '.' => {
                    self.consume_number();
                    break (start, TokTyp::Number);
                }
                chr if chr.is_ascii_alphabetic() || chr == '_' => {
                    self.consume_ident();
                    break (start, TokTyp::Ident);
                }
                _ => {
                    self.has_errored = true;
                    self.bump();
                    return Some(Err(LexErr {
                        typ: LexErrTyp::InvalidChar,
                        loc: self.span(start),
                    }));
                }
            };
            self.bump();
            break (start, typ);
        };

        let loc = self.span(start);
        if typ.is_unsupported() {
            self.has_errored = true;
            return Some(Err(LexErr {
                typ: LexErrTyp::Unsupported(typ),
                loc,
            }));
        }
        self.prev = Some(typ);
        Some(Ok(Tok { typ, loc }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Result<Tok, LexErr>> {
        let src = Arc::new(src.to_string());
        Lexer::new(&src).collect()
    }

    fn types(src: &str) -> Vec<TokTyp> {
        lex(src)
            .into_iter()
            .map(|tok| tok.expect("lexes").typ)
            .collect()
    }

    #[test]
    fn minus_depends_on_previous_token() {
        assert_eq!(
            types("x-2"),
            [TokTyp::Ident, TokTyp::Op(OperatorTyp::Sub), TokTyp::Number]
        );
        assert_eq!(
            types("-x*(-2)"),
            [
                TokTyp::Op(OperatorTyp::Neg),
                TokTyp::Ident,
                TokTyp::Op(OperatorTyp::Mul),
                TokTyp::OpenParen,
                TokTyp::Op(OperatorTyp::Neg),
                TokTyp::Number,
                TokTyp::CloseParen,
            ]
        );
    }

    #[test]
    fn unary_plus_is_dropped() {
        assert_eq!(types("+x"), [TokTyp::Ident]);
        assert_eq!(
            types("2*+x"),
            [TokTyp::Number, TokTyp::Op(OperatorTyp::Mul), TokTyp::Ident]
        );
    }

    #[test]
    fn numbers_with_exponents() {
        let toks = lex("1.5e-3 2e x");
        let texts: Vec<_> = toks
            .iter()
            .map(|tok| tok.as_ref().unwrap().loc.get().to_string())
            .collect();
        assert_eq!(texts, ["1.5e-3", "2", "e", "x"]);
    }

    #[test]
    fn identifiers_may_contain_digits() {
        let toks = lex("log10(x)");
        assert_eq!(toks[0].as_ref().unwrap().loc.get(), "log10");
    }

    #[test]
    fn unsupported_and_invalid_characters() {
        let toks = lex("x = 2");
        assert_eq!(toks.len(), 2);
        let err = toks[1].as_ref().unwrap_err();
        assert_eq!(err.typ, LexErrTyp::Unsupported(TokTyp::XEqual));
        assert_eq!(err.loc.start(), 2);

        let toks = lex("x $ 2");
        let err = toks.last().unwrap().as_ref().unwrap_err();
        assert_eq!(err.typ, LexErrTyp::InvalidChar);
        assert_eq!(err.loc.get(), "$");
    }
}
