//! Emitters for the matrix library.
//!
//! Matrices are `float name[width][height]` arrays; `mat[i][j]` is row `i`, column `j`.
//!
//! # Recursive operations
//!
//! The determinant of an `n x n` matrix (`n > 2`) is expanded along its first column into `n`
//! determinants of `(n-1) x (n-1)` submatrices, and the minor of an `n x n` matrix is the
//! determinant of an `(n-1) x (n-1)` submatrix. Both therefore call the determinant generated for
//! [`Shape::reduced`]. The two build their submatrices independently; the determinant never calls
//! the minor.
//!
//! Because of this, determinant, minor and inverse are only generated for a square shape if the
//! whole chain of reduced shapes down to `2x2` is registered. All generated functions are
//! prototyped in the header before any definition, so emission order does not matter.

use crate::{
    code::{call, lit, var, ArrayType, Expr, Function, Init, Stmt, Type},
    library::Descriptor,
    naming::{Naming, TypeIdentity},
    registry::{Registry, Shape},
    ScalarKind,
};

/// The per-shape operations generated for matrix types, in emission order.
///
/// Products are emitted after these, see [`product_shape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixOp {
    Copy,
    Add,
    Subtract,
    Scale,
    Divide,
    Identity,
    Transpose,
    Determinant,
    Minor,
    Inverse,
}

impl MatrixOp {
    /// Every per-shape operation, in the order they are emitted.
    pub const ALL: [Self; 10] = [
        Self::Copy,
        Self::Add,
        Self::Subtract,
        Self::Scale,
        Self::Divide,
        Self::Identity,
        Self::Transpose,
        Self::Determinant,
        Self::Minor,
        Self::Inverse,
    ];

    /// The operation's part of the generated function name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Scale => "scale",
            Self::Divide => "divide",
            Self::Identity => "identity",
            Self::Transpose => "transpose",
            Self::Determinant => "determinant",
            Self::Minor => "minor",
            Self::Inverse => "inverse",
        }
    }

    /// Returns whether this operation is generated for `shape`, given the other shapes in
    /// `registry`.
    pub fn is_available(self, shape: Shape, registry: &Registry<Shape>) -> bool {
        match self {
            Self::Copy | Self::Add | Self::Subtract | Self::Scale | Self::Divide => true,
            Self::Identity => shape.is_square(),
            Self::Transpose => registry.contains(shape.transposed()),
            Self::Determinant | Self::Minor | Self::Inverse => has_determinant(shape, registry),
        }
    }
}

/// A determinant exists for `2x2`, and for larger square shapes whose reduced shape is registered
/// and has a determinant itself.
fn has_determinant(shape: Shape, registry: &Registry<Shape>) -> bool {
    match shape.square_size() {
        Some(2) => true,
        Some(n) if n > 2 => shape
            .reduced()
            .map_or(false, |r| registry.contains(r) && has_determinant(r, registry)),
        _ => false,
    }
}

/// Returns the shape of the product `a * b` if a multiplication function is generated for it.
///
/// That is the case iff the height of `a` equals the width of `b`, and the resulting shape
/// `width(a) x height(b)` is registered.
pub fn product_shape(a: Shape, b: Shape, registry: &Registry<Shape>) -> Option<Shape> {
    a.product(b).filter(|res| registry.contains(*res))
}

impl Descriptor for Shape {
    const LIBRARY: &'static str = "mat";
    const SYSTEM_INCLUDES: &'static [&'static str] = &["string.h"];

    fn identity(self, naming: &Naming) -> TypeIdentity {
        naming.matrix(self)
    }

    fn functions(self, naming: &Naming, registry: &Registry<Self>) -> Vec<Function> {
        let emitter = Emitter {
            shape: self,
            id: naming.matrix(self),
            naming,
            registry,
        };
        let mut out = MatrixOp::ALL
            .into_iter()
            .filter_map(|op| emitter.emit(op))
            .collect::<Vec<_>>();
        for rhs in registry.iter() {
            match product_shape(self, rhs, registry) {
                Some(res) => out.push(emitter.multiply(rhs, res)),
                None => log::trace!("no product of {self} and {rhs}"),
            }
        }
        out
    }
}

struct Emitter<'a> {
    shape: Shape,
    id: TypeIdentity,
    naming: &'a Naming,
    registry: &'a Registry<Shape>,
}

const ELEM: ScalarKind = ScalarKind::Float;

fn float(value: f64) -> Expr {
    lit(ELEM, value)
}

impl Emitter<'_> {
    fn emit(&self, op: MatrixOp) -> Option<Function> {
        if !op.is_available(self.shape, self.registry) {
            log::trace!("no `{}` for {}", op.name(), self.shape);
            return None;
        }

        Some(match op {
            MatrixOp::Copy => self.copy(),
            MatrixOp::Add => self.binary(op, |a, b| a + b),
            MatrixOp::Subtract => self.binary(op, |a, b| a - b),
            MatrixOp::Scale => self.with_scalar(op, |m, s| m * s),
            MatrixOp::Divide => self.with_scalar(op, |m, s| m / s),
            MatrixOp::Identity => self.identity(),
            MatrixOp::Transpose => self.transpose(),
            MatrixOp::Determinant => self.determinant(),
            MatrixOp::Minor => self.minor(),
            MatrixOp::Inverse => self.inverse(),
        })
    }

    fn ty(&self) -> &ArrayType {
        self.id.array_type()
    }

    fn function(&self, op: MatrixOp) -> Function {
        Function::new(self.id.function(op.name()))
    }

    /// `for i, j: out[i][j] = f(i, j)` over the whole matrix.
    fn elementwise(&self, f: impl Fn(&str, &str) -> Expr) -> Stmt {
        Stmt::for_(
            "i",
            self.shape.width(),
            vec![Stmt::for_(
                "j",
                self.shape.height(),
                vec![Stmt::assign(var("out").at2("i", "j"), f("i", "j"))],
            )],
        )
    }

    fn copy(&self) -> Function {
        self.function(MatrixOp::Copy)
            .param(self.ty(), "mat")
            .param(self.ty(), "out")
            .stmt(Stmt::copy(var("out"), var("mat"), ELEM, self.shape.len()))
    }

    fn binary(&self, op: MatrixOp, f: impl Fn(Expr, Expr) -> Expr) -> Function {
        self.function(op)
            .param(self.ty(), "a")
            .param(self.ty(), "b")
            .param(self.ty(), "out")
            .stmt(self.elementwise(|i, j| f(var("a").at2(i, j), var("b").at2(i, j))))
    }

    fn with_scalar(&self, op: MatrixOp, f: impl Fn(Expr, Expr) -> Expr) -> Function {
        self.function(op)
            .param(self.ty(), "mat")
            .param(ELEM, "scalar")
            .param(self.ty(), "out")
            .stmt(self.elementwise(|i, j| f(var("mat").at2(i, j), var("scalar"))))
    }

    fn identity(&self) -> Function {
        let rows = (0..self.shape.width())
            .map(|row| {
                (0..self.shape.height())
                    .map(|col| float(if row == col { 1.0 } else { 0.0 }))
                    .collect()
            })
            .collect();
        self.function(MatrixOp::Identity)
            .param(self.ty(), "out")
            .stmt(Stmt::Let {
                ty: Type::from(self.ty()),
                name: "values".into(),
                init: Init::Rows(rows),
            })
            .stmt(Stmt::copy(var("out"), var("values"), ELEM, self.shape.len()))
    }

    fn transpose(&self) -> Function {
        let target = self.naming.matrix(self.shape.transposed());
        self.function(MatrixOp::Transpose)
            .param(self.ty(), "mat")
            .param(target.array_type(), "out")
            .stmt(Stmt::declare(target.array_type(), ["tmp"]))
            .stmt(Stmt::for_(
                "i",
                self.shape.width(),
                vec![Stmt::for_(
                    "j",
                    self.shape.height(),
                    vec![Stmt::assign(
                        var("tmp").at2("j", "i"),
                        var("mat").at2("i", "j"),
                    )],
                )],
            ))
            .stmt(Stmt::copy(var("out"), var("tmp"), ELEM, self.shape.len()))
    }

    /// Identity of the reduced shape the recursive operations expand into.
    fn reduced(&self) -> TypeIdentity {
        // `is_available` only admits shapes with a reduced shape.
        let reduced = self.shape.reduced().unwrap_or(self.shape);
        self.naming.matrix(reduced)
    }

    fn determinant(&self) -> Function {
        let f = self
            .function(MatrixOp::Determinant)
            .returns(ELEM)
            .param(self.ty(), "mat");
        let n = self.shape.width();
        let m = |i: usize, j: usize| var("mat").at2(i, j);
        if n == 2 {
            return f.stmt(Stmt::ret(m(0, 0) * m(1, 1) - m(1, 0) * m(0, 1)));
        }

        // Submatrix `mat_i` is `mat` without row `i` and column 0.
        let sub = self.reduced();
        let names = (0..n).map(|i| format!("mat_{i}")).collect::<Vec<_>>();
        let mut body = vec![Stmt::declare(sub.array_type(), names.iter().cloned())];
        for (i, name) in names.iter().enumerate() {
            for j in 0..n - 1 {
                let row = if j < i { j } else { j + 1 };
                body.push(Stmt::copy(
                    var(name.as_str()).at2(j, 0),
                    var("mat").at2(row, 1),
                    ELEM,
                    n - 1,
                ));
            }
        }

        // Signs alternate along the first column, starting with `+`.
        let det = sub.function(MatrixOp::Determinant.name());
        let term = |i: usize| m(i, 0) * call(det.as_str(), [var(names[i].as_str())]);
        let mut expansion = term(0);
        for i in 1..n {
            expansion = if i % 2 == 0 {
                expansion + term(i)
            } else {
                expansion - term(i)
            };
        }
        body.push(Stmt::ret(expansion));
        f.stmts(body)
    }

    fn minor(&self) -> Function {
        let f = self
            .function(MatrixOp::Minor)
            .returns(ELEM)
            .param(self.ty(), "mat")
            .param(ScalarKind::Int, "i")
            .param(ScalarKind::Int, "j");
        let n = self.shape.width();
        if n == 2 {
            let one = || Expr::from(1usize);
            return f.stmt(Stmt::ret(
                var("mat").at2(one() - var("i"), one() - var("j")),
            ));
        }

        // Copy everything except row `i` and column `j`, preserving order.
        let sub = self.reduced();
        let skip = |idx: &str, excluded: &str| {
            Stmt::if_(var(idx).equals(var(excluded)), vec![Stmt::Continue])
        };
        f.stmts([
            Stmt::declare(sub.array_type(), ["mat_sub"]),
            Stmt::let_(ScalarKind::Int, "row", Expr::from(0usize)),
            Stmt::for_(
                "k",
                n,
                vec![
                    skip("k", "i"),
                    Stmt::let_(ScalarKind::Int, "col", Expr::from(0usize)),
                    Stmt::for_(
                        "l",
                        n,
                        vec![
                            skip("l", "j"),
                            Stmt::assign(
                                var("mat_sub").at2("row", "col"),
                                var("mat").at2("k", "l"),
                            ),
                            Stmt::Increment("col".into()),
                        ],
                    ),
                    Stmt::Increment("row".into()),
                ],
            ),
            Stmt::ret(call(
                sub.function(MatrixOp::Determinant.name()),
                [var("mat_sub")],
            )),
        ])
    }

    fn inverse(&self) -> Function {
        let n = self.shape.width();
        let sign = ((var("i") + var("j")) % 2usize)
            .equals(0usize)
            .select(float(1.0), float(-1.0));
        let minor = call(
            self.id.function(MatrixOp::Minor.name()),
            [var("mat"), var("i"), var("j")],
        );

        self.function(MatrixOp::Inverse)
            .param(self.ty(), "mat")
            .param(self.ty(), "out")
            .stmts([
                Stmt::let_(
                    ELEM,
                    "det",
                    call(self.id.function(MatrixOp::Determinant.name()), [var("mat")]),
                ),
                // Singular input leaves `out` untouched.
                Stmt::if_(var("det").equals(float(0.0)), vec![Stmt::Return(None)]),
                Stmt::declare(self.ty(), ["adj"]),
                Stmt::for_(
                    "i",
                    n,
                    vec![Stmt::for_(
                        "j",
                        n,
                        vec![Stmt::assign(var("adj").at2("j", "i"), sign * minor)],
                    )],
                ),
                Stmt::Expr(call(
                    self.id.function(MatrixOp::Scale.name()),
                    [var("adj"), float(1.0) / var("det"), var("out")],
                )),
            ])
    }

    fn multiply(&self, rhs: Shape, res: Shape) -> Function {
        let rhs_id = self.naming.matrix(rhs);
        let res_id = self.naming.matrix(res);
        Function::new(self.id.multiply(&rhs_id))
            .param(self.ty(), "a")
            .param(rhs_id.array_type(), "b")
            .param(res_id.array_type(), "out")
            .stmt(Stmt::declare(res_id.array_type(), ["tmp"]))
            .stmt(Stmt::for_(
                "i",
                res.width(),
                vec![Stmt::for_(
                    "j",
                    res.height(),
                    vec![
                        Stmt::let_(ELEM, "val", float(0.0)),
                        Stmt::for_(
                            "k",
                            self.shape.height(),
                            vec![Stmt::add_assign(
                                var("val"),
                                var("a").at2("i", "k") * var("b").at2("k", "j"),
                            )],
                        ),
                        Stmt::assign(var("tmp").at2("i", "j"), var("val")),
                    ],
                )],
            ))
            .stmt(Stmt::copy(var("out"), var("tmp"), ELEM, res.len()))
    }
}
