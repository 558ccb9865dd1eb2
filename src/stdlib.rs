// SPDX: CC0-1.0

use crate::{eval::*, Number};
use core::f64::consts; // assumes Number = f64
use std::collections::HashMap;

/// The free variable of every plotted expression.
pub const X: &str = "x";

pub fn standard_idents() -> Idents {
    let mut ret = HashMap::new();

    ret.insert(X, Ident::Var);

    let mut fun = |name: &'static str, arity: Arity, f: fn(&[Number]) -> Number| {
        ret.insert(name, Ident::Fun(Fun::new(name, arity, f)));
    };
    let one = Arity::exactly(1);
    let two = Arity::exactly(2);

    fun("abs", one, abs);
    fun("sqrt", one, sqrt);
    fun("cbrt", one, cbrt);
    fun("exp", one, exp);
    fun("ln", one, ln);
    fun("log", Arity::between(1, 2), log);
    fun("log10", one, log10);
    fun("log2", one, log2);
    fun("pow", two, pow);
    fun("mod", two, rem);
    fun("min", two, min);
    fun("max", two, max);
    fun("floor", one, floor);
    fun("ceil", one, ceil);
    fun("round", one, round);
    fun("sign", one, sign);

    // trig
    fun("sin", one, sin);
    fun("cos", one, cos);
    fun("tan", one, tan);
    fun("sec", one, sec);
    fun("csc", one, csc);
    fun("cot", one, cot);
    fun("asin", one, arcsin);
    fun("acos", one, arccos);
    fun("atan", one, arctan);
    fun("arcsin", one, arcsin);
    fun("arccos", one, arccos);
    fun("arctan", one, arctan);
    fun("atan2", two, arctan2);
    fun("sinh", one, sinh);
    fun("cosh", one, cosh);
    fun("tanh", one, tanh);

    ret.insert("pi", Ident::Const(consts::PI));
    ret.insert("tau", Ident::Const(consts::TAU));
    ret.insert("e", Ident::Const(consts::E));
    ret.insert("phi", Ident::Const(1.618_033_988_749_895));
    ret
}

// Arity is checked at compile time, so these index without further checks.

pub fn neg(args: &[Number]) -> Number {
    -args[0]
}

pub fn add(args: &[Number]) -> Number {
    args[0] + args[1]
}

pub fn sub(args: &[Number]) -> Number {
    args[0] - args[1]
}

pub fn mul(args: &[Number]) -> Number {
    args[0] * args[1]
}

pub fn div(args: &[Number]) -> Number {
    args[0] / args[1]
}

/// Remainder with the sign of the divisor, like `mod` in most calculators.
pub fn rem(args: &[Number]) -> Number {
    let [x, m] = [args[0], args[1]];
    if m == 0.0 {
        return Number::NAN;
    }
    x - m * (x / m).floor()
}

pub fn pow(args: &[Number]) -> Number {
    let [x, exp] = [args[0], args[1]];
    if x < 0.0 && exp.fract() != 0.0 {
        // odd roots of negative numbers stay real: (-8)^(1/3) == -2
        let inv = 1.0 / exp;
        if (inv.round() - inv).abs() < 1e-9 && (inv.round() as i64) % 2 != 0 {
            return -(-x).powf(exp);
        }
    }
    x.powf(exp)
}

pub fn abs(args: &[Number]) -> Number {
    args[0].abs()
}

pub fn sqrt(args: &[Number]) -> Number {
    args[0].sqrt()
}

pub fn cbrt(args: &[Number]) -> Number {
    args[0].cbrt()
}

pub fn exp(args: &[Number]) -> Number {
    args[0].exp()
}

pub fn ln(args: &[Number]) -> Number {
    args[0].ln()
}

/// `log(x)` is natural; `log(x, base)` uses the given base.
pub fn log(args: &[Number]) -> Number {
    match args {
        [x] => x.ln(),
        [x, base, ..] => x.ln() / base.ln(),
        [] => Number::NAN,
    }
}

pub fn log10(args: &[Number]) -> Number {
    args[0].log10()
}

pub fn log2(args: &[Number]) -> Number {
    args[0].log2()
}

pub fn min(args: &[Number]) -> Number {
    args[0].min(args[1])
}

pub fn max(args: &[Number]) -> Number {
    args[0].max(args[1])
}

pub fn floor(args: &[Number]) -> Number {
    args[0].floor()
}

pub fn ceil(args: &[Number]) -> Number {
    args[0].ceil()
}

pub fn round(args: &[Number]) -> Number {
    args[0].round()
}

pub fn sign(args: &[Number]) -> Number {
    let x = args[0];
    if x == 0.0 || x.is_nan() {
        x
    } else {
        x.signum()
    }
}

pub fn sin(args: &[Number]) -> Number {
    args[0].sin()
}

pub fn cos(args: &[Number]) -> Number {
    args[0].cos()
}

pub fn tan(args: &[Number]) -> Number {
    args[0].tan()
}

pub fn sec(args: &[Number]) -> Number {
    1.0 / args[0].cos()
}

pub fn csc(args: &[Number]) -> Number {
    1.0 / args[0].sin()
}

pub fn cot(args: &[Number]) -> Number {
    1.0 / args[0].tan()
}

pub fn arcsin(args: &[Number]) -> Number {
    args[0].asin()
}

pub fn arccos(args: &[Number]) -> Number {
    args[0].acos()
}

pub fn arctan(args: &[Number]) -> Number {
    args[0].atan()
}

pub fn arctan2(args: &[Number]) -> Number {
    args[0].atan2(args[1])
}

pub fn sinh(args: &[Number]) -> Number {
    args[0].sinh()
}

pub fn cosh(args: &[Number]) -> Number {
    args[0].cosh()
}

pub fn tanh(args: &[Number]) -> Number {
    args[0].tanh()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_follows_divisor_sign() {
        assert_eq!(rem(&[7.0, 3.0]), 1.0);
        assert_eq!(rem(&[-7.0, 3.0]), 2.0);
        assert!(rem(&[1.0, 0.0]).is_nan());
    }

    #[test]
    fn odd_roots_of_negatives() {
        assert!((pow(&[-8.0, 1.0 / 3.0]) + 2.0).abs() < 1e-12);
        assert!(pow(&[-8.0, 0.5]).is_nan());
        assert_eq!(pow(&[-2.0, 3.0]), -8.0);
    }

    #[test]
    fn every_function_is_registered_under_its_name() {
        for (name, ident) in standard_idents() {
            if let Ident::Fun(fun) = ident {
                assert_eq!(fun.name, name);
            }
        }
    }
}
