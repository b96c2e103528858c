//! A small model of the generated C code.
//!
//! Emitters build [`Function`]s out of [`Stmt`]s and [`Expr`]s instead of formatting text
//! directly. All text is produced by the renderer in [`render`], which keeps spelling, literal
//! formatting and parenthesization in one place.
//!
//! [`Expr`] implements the arithmetic operators from [`std::ops`], so expression trees read much
//! like the code they produce:
//!
//! ```
//! # use hfgen::code::*;
//! let e = var("a").at(0) * (lit_int(1) - var("t"));
//! assert_eq!(render::expr(&e), "a[0] * (1 - t)");
//! ```

pub mod render;

use std::{
    collections::BTreeSet,
    ops::{Add, Div, Mul, Rem, Sub},
};

use crate::ScalarKind;

/// A `typedef`'d fixed-size array type such as `HF_Mat2x3f` (`float[2][3]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    name: String,
    element: ScalarKind,
    dims: Vec<usize>,
}

impl ArrayType {
    pub fn new(name: impl Into<String>, element: ScalarKind, dims: Vec<usize>) -> Self {
        assert!(!dims.is_empty(), "array types need at least one dimension");
        Self {
            name: name.into(),
            element,
            dims,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn element(&self) -> ScalarKind {
        self.element
    }

    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Total number of scalar elements.
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }
}

/// Type of a parameter, local, or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    Scalar(ScalarKind),
    Array(ArrayType),
}

impl From<ScalarKind> for Type {
    fn from(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }
}

impl From<&ArrayType> for Type {
    fn from(ty: &ArrayType) -> Self {
        Self::Array(ty.clone())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: Type,
    pub name: String,
}

impl Param {
    pub fn new(ty: impl Into<Type>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

/// A generated function: one prototype in the header, one definition in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Return type; [`None`] means `void`.
    pub ret: Option<ScalarKind>,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
}

impl Function {
    /// Creates a `void` function with no parameters and an empty body.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            ret: None,
            name: name.into(),
            params: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn returns(mut self, ret: ScalarKind) -> Self {
        self.ret = Some(ret);
        self
    }

    pub fn param(mut self, ty: impl Into<Type>, name: impl Into<String>) -> Self {
        self.params.push(Param::new(ty, name));
        self
    }

    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.body.push(stmt);
        self
    }

    pub fn stmts<I: IntoIterator<Item = Stmt>>(mut self, stmts: I) -> Self {
        self.body.extend(stmts);
        self
    }

    /// Returns the names of all functions this function calls, in sorted order.
    pub fn callees(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        for stmt in &self.body {
            stmt.collect_callees(&mut out);
        }
        out
    }
}

/// Initializer of a local declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Init {
    Expr(Expr),
    /// Brace-enclosed initializer of a 2-dimensional array, one inner list per row.
    Rows(Vec<Vec<Expr>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Declares one or more uninitialized locals of the same type.
    Declare { ty: Type, names: Vec<String> },
    /// Declares and initializes a local.
    Let { ty: Type, name: String, init: Init },
    Assign { place: Expr, value: Expr },
    AddAssign { place: Expr, value: Expr },
    /// `name++`
    Increment(String),
    /// `memcpy` of `count` elements of type `element` from `src` to `dst`.
    Copy {
        dst: Expr,
        src: Expr,
        element: ScalarKind,
        count: usize,
    },
    /// `for(int var = 0; var < end; var++)`
    For {
        var: String,
        end: usize,
        body: Vec<Stmt>,
    },
    If { cond: Expr, then: Vec<Stmt> },
    Continue,
    Return(Option<Expr>),
    Expr(Expr),
}

impl Stmt {
    pub fn declare(
        ty: impl Into<Type>,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self::Declare {
            ty: ty.into(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn let_(ty: impl Into<Type>, name: impl Into<String>, init: Expr) -> Self {
        Self::Let {
            ty: ty.into(),
            name: name.into(),
            init: Init::Expr(init),
        }
    }

    pub fn assign(place: Expr, value: Expr) -> Self {
        Self::Assign { place, value }
    }

    pub fn add_assign(place: Expr, value: Expr) -> Self {
        Self::AddAssign { place, value }
    }

    pub fn copy(dst: Expr, src: Expr, element: ScalarKind, count: usize) -> Self {
        Self::Copy {
            dst,
            src,
            element,
            count,
        }
    }

    pub fn for_(var: impl Into<String>, end: usize, body: Vec<Stmt>) -> Self {
        Self::For {
            var: var.into(),
            end,
            body,
        }
    }

    pub fn if_(cond: Expr, then: Vec<Stmt>) -> Self {
        Self::If { cond, then }
    }

    pub fn ret(value: Expr) -> Self {
        Self::Return(Some(value))
    }

    fn collect_callees<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Stmt::Declare { .. } | Stmt::Increment(_) | Stmt::Continue | Stmt::Return(None) => {}
            Stmt::Let { init, .. } => match init {
                Init::Expr(e) => e.collect_callees(out),
                Init::Rows(rows) => rows
                    .iter()
                    .flatten()
                    .for_each(|e| e.collect_callees(out)),
            },
            Stmt::Assign { place, value } | Stmt::AddAssign { place, value } => {
                place.collect_callees(out);
                value.collect_callees(out);
            }
            Stmt::Copy { dst, src, .. } => {
                dst.collect_callees(out);
                src.collect_callees(out);
            }
            Stmt::For { body, .. } => body.iter().for_each(|s| s.collect_callees(out)),
            Stmt::If { cond, then } => {
                cond.collect_callees(out);
                then.iter().for_each(|s| s.collect_callees(out));
            }
            Stmt::Return(Some(e)) | Stmt::Expr(e) => e.collect_callees(out),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Lt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Var(String),
    Int(i64),
    /// A literal of the given scalar kind.
    Lit(ScalarKind, f64),
    Index(Box<Expr>, Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    /// `cond ? then : else`
    Cond(Box<Expr>, Box<Expr>, Box<Expr>),
    Cast(ScalarKind, Box<Expr>),
    /// Square root computed in the given (floating-point) kind.
    Sqrt(ScalarKind, Box<Expr>),
    Call(String, Vec<Expr>),
}

pub fn var(name: impl Into<String>) -> Expr {
    Expr::Var(name.into())
}

pub fn lit(kind: ScalarKind, value: f64) -> Expr {
    Expr::Lit(kind, value)
}

pub fn lit_int(value: i64) -> Expr {
    Expr::Int(value)
}

pub fn call(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Expr {
    Expr::Call(name.into(), args.into_iter().collect())
}

impl Expr {
    /// `self[index]`
    pub fn at(self, index: impl Into<Expr>) -> Self {
        Self::Index(Box::new(self), Box::new(index.into()))
    }

    /// `self[i][j]`
    pub fn at2(self, i: impl Into<Expr>, j: impl Into<Expr>) -> Self {
        self.at(i).at(j)
    }

    pub fn equals(self, rhs: impl Into<Expr>) -> Self {
        Self::Binary(BinOp::Eq, Box::new(self), Box::new(rhs.into()))
    }

    pub fn less_than(self, rhs: impl Into<Expr>) -> Self {
        Self::Binary(BinOp::Lt, Box::new(self), Box::new(rhs.into()))
    }

    pub fn select(self, then: Expr, otherwise: Expr) -> Self {
        Self::Cond(Box::new(self), Box::new(then), Box::new(otherwise))
    }

    pub fn cast(self, kind: ScalarKind) -> Self {
        Self::Cast(kind, Box::new(self))
    }

    pub fn sqrt(self, kind: ScalarKind) -> Self {
        Self::Sqrt(kind, Box::new(self))
    }

    fn collect_callees<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Var(_) | Expr::Int(_) | Expr::Lit(..) => {}
            Expr::Index(a, b) | Expr::Binary(_, a, b) => {
                a.collect_callees(out);
                b.collect_callees(out);
            }
            Expr::Cond(c, a, b) => {
                c.collect_callees(out);
                a.collect_callees(out);
                b.collect_callees(out);
            }
            Expr::Cast(_, e) | Expr::Sqrt(_, e) => e.collect_callees(out),
            Expr::Call(name, args) => {
                out.insert(name);
                args.iter().for_each(|e| e.collect_callees(out));
            }
        }
    }
}

impl From<usize> for Expr {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        var(name)
    }
}

macro_rules! binop_impls {
    ($($trait:ident::$method:ident => $op:ident),+) => {
        $(
            impl<R: Into<Expr>> $trait<R> for Expr {
                type Output = Expr;

                fn $method(self, rhs: R) -> Expr {
                    Expr::Binary(BinOp::$op, Box::new(self), Box::new(rhs.into()))
                }
            }
        )+
    };
}
binop_impls!(Add::add => Add, Sub::sub => Sub, Mul::mul => Mul, Div::div => Div, Rem::rem => Rem);

/// Folds `terms` into a left-associative sum. Returns a zero literal of `kind` if `terms` is
/// empty.
pub fn sum<I: IntoIterator<Item = Expr>>(kind: ScalarKind, terms: I) -> Expr {
    terms
        .into_iter()
        .reduce(|acc, term| acc + term)
        .unwrap_or_else(|| lit(kind, 0.0))
}
