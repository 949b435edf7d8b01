//! Concrete-or-symbolic scalars used as gate parameters.

use num_complex::Complex64;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Imaginary parts below this magnitude are treated as zero.
const REAL_TOLERANCE: f64 = 1e-12;

/// Symbol bindings used by [`Scalar::substitute`].
pub type Bindings = FxHashMap<String, f64>;

/// A symbolic expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A constant numeric value.
    Constant(Complex64),
    /// A named symbol.
    Symbol(String),
    /// Negation.
    Neg(Box<Expr>),
    /// Addition.
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction.
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication.
    Mul(Box<Expr>, Box<Expr>),
    /// Division.
    Div(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Check if this expression contains any symbols.
    pub fn is_symbolic(&self) -> bool {
        match self {
            Expr::Symbol(_) => true,
            Expr::Constant(_) => false,
            Expr::Neg(e) => e.is_symbolic(),
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                a.is_symbolic() || b.is_symbolic()
            }
        }
    }

    /// Try to evaluate to a concrete value.
    ///
    /// Returns `None` if a symbol is left or a division by zero occurs.
    pub fn eval(&self) -> Option<Complex64> {
        match self {
            Expr::Constant(v) => Some(*v),
            Expr::Symbol(_) => None,
            Expr::Neg(e) => e.eval().map(|v| -v),
            Expr::Add(a, b) => Some(a.eval()? + b.eval()?),
            Expr::Sub(a, b) => Some(a.eval()? - b.eval()?),
            Expr::Mul(a, b) => Some(a.eval()? * b.eval()?),
            Expr::Div(a, b) => {
                let divisor = b.eval()?;
                if divisor.norm() == 0.0 {
                    return None;
                }
                Some(a.eval()? / divisor)
            }
        }
    }

    fn collect_symbols(&self, set: &mut FxHashSet<String>) {
        match self {
            Expr::Constant(_) => {}
            Expr::Symbol(name) => {
                set.insert(name.clone());
            }
            Expr::Neg(e) => e.collect_symbols(set),
            Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) => {
                a.collect_symbols(set);
                b.collect_symbols(set);
            }
        }
    }

    fn substitute(&self, bindings: &Bindings) -> Expr {
        let sub = |e: &Expr| Box::new(e.substitute(bindings));
        match self {
            Expr::Symbol(name) => match bindings.get(name) {
                Some(v) => Expr::Constant(Complex64::new(*v, 0.0)),
                None => self.clone(),
            },
            Expr::Constant(_) => self.clone(),
            Expr::Neg(e) => Expr::Neg(sub(e)),
            Expr::Add(a, b) => Expr::Add(sub(a), sub(b)),
            Expr::Sub(a, b) => Expr::Sub(sub(a), sub(b)),
            Expr::Mul(a, b) => Expr::Mul(sub(a), sub(b)),
            Expr::Div(a, b) => Expr::Div(sub(a), sub(b)),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(v) => write!(f, "{}", Scalar::Concrete(*v)),
            Expr::Symbol(name) => write!(f, "{name}"),
            Expr::Neg(e) => write!(f, "-({e})"),
            Expr::Add(a, b) => write!(f, "({a} + {b})"),
            Expr::Sub(a, b) => write!(f, "({a} - {b})"),
            Expr::Mul(a, b) => write!(f, "({a} * {b})"),
            Expr::Div(a, b) => write!(f, "({a} / {b})"),
        }
    }
}

/// A gate parameter: either a concrete complex number or a symbolic expression.
///
/// Symbolic scalars collapse to [`Scalar::Concrete`] as soon as all of their
/// symbols are substituted. Range checks on parameters only run on the
/// concrete variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// A concrete value.
    Concrete(Complex64),
    /// An expression with at least one free symbol.
    Symbolic(Expr),
}

impl Scalar {
    /// Create a concrete real scalar.
    pub fn real(value: f64) -> Self {
        Scalar::Concrete(Complex64::new(value, 0.0))
    }

    /// Create a concrete complex scalar.
    pub fn complex(re: f64, im: f64) -> Self {
        Scalar::Concrete(Complex64::new(re, im))
    }

    /// Create a symbolic scalar.
    pub fn symbol(name: impl Into<String>) -> Self {
        Scalar::Symbolic(Expr::Symbol(name.into()))
    }

    /// The constant π.
    pub fn pi() -> Self {
        Scalar::real(std::f64::consts::PI)
    }

    /// Build a scalar from an expression, collapsing it if it has no symbols.
    pub fn from_expr(expr: Expr) -> Self {
        if expr.is_symbolic() {
            return Scalar::Symbolic(expr);
        }
        match expr.eval() {
            Some(v) => Scalar::Concrete(v),
            None => Scalar::Symbolic(expr),
        }
    }

    /// Check if this scalar still contains free symbols.
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Scalar::Symbolic(_))
    }

    /// Get the concrete complex value, if any.
    pub fn as_complex(&self) -> Option<Complex64> {
        match self {
            Scalar::Concrete(v) => Some(*v),
            Scalar::Symbolic(_) => None,
        }
    }

    /// Get the concrete value as a real number.
    ///
    /// Returns `None` for symbolic scalars and for values with a non-negligible
    /// imaginary part.
    pub fn as_real(&self) -> Option<f64> {
        self.as_complex()
            .filter(|v| v.im.abs() < REAL_TOLERANCE)
            .map(|v| v.re)
    }

    /// Get all symbol names in this scalar.
    pub fn symbols(&self) -> FxHashSet<String> {
        let mut set = FxHashSet::default();
        if let Scalar::Symbolic(e) = self {
            e.collect_symbols(&mut set);
        }
        set
    }

    /// Substitute symbols by values, collapsing to a concrete value when possible.
    pub fn substitute(&self, bindings: &Bindings) -> Self {
        match self {
            Scalar::Concrete(_) => self.clone(),
            Scalar::Symbolic(e) => Scalar::from_expr(e.substitute(bindings)),
        }
    }

    /// Bind a single symbol to a value.
    pub fn bind(&self, name: &str, value: f64) -> Self {
        let mut bindings = Bindings::default();
        bindings.insert(name.to_string(), value);
        self.substitute(&bindings)
    }

    fn into_expr(self) -> Expr {
        match self {
            Scalar::Concrete(v) => Expr::Constant(v),
            Scalar::Symbolic(e) => e,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Concrete(v) if v.im.abs() < REAL_TOLERANCE => write!(f, "{}", v.re),
            Scalar::Concrete(v) => write!(f, "({}{:+}i)", v.re, v.im),
            Scalar::Symbolic(e) => write!(f, "{e}"),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::real(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::real(f64::from(value))
    }
}

impl From<Complex64> for Scalar {
    fn from(value: Complex64) -> Self {
        Scalar::Concrete(value)
    }
}

impl From<Expr> for Scalar {
    fn from(expr: Expr) -> Self {
        Scalar::from_expr(expr)
    }
}

macro_rules! scalar_binop {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl std::ops::$trait for Scalar {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self::Output {
                match (self, rhs) {
                    (Scalar::Concrete(a), Scalar::Concrete(b)) => {
                        Scalar::from_expr(Expr::$variant(
                            Box::new(Expr::Constant(a)),
                            Box::new(Expr::Constant(b)),
                        ))
                    }
                    (a, b) => {
                        Scalar::Symbolic(Expr::$variant(Box::new(a.into_expr()), Box::new(b.into_expr())))
                    }
                }
            }
        }
    };
}

scalar_binop!(Add, add, Add);
scalar_binop!(Sub, sub, Sub);
scalar_binop!(Mul, mul, Mul);
scalar_binop!(Div, div, Div);

impl std::ops::Neg for Scalar {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Scalar::Concrete(v) => Scalar::Concrete(-v),
            Scalar::Symbolic(e) => Scalar::Symbolic(Expr::Neg(Box::new(e))),
        }
    }
}
