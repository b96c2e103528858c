//! Emitters for the vector library.

use crate::{
    code::{call, lit, sum, var, ArrayType, Expr, Function, Stmt},
    library::Descriptor,
    naming::{Naming, TypeIdentity},
    registry::{Registry, VectorKind},
    ScalarKind,
};

/// The operations generated for vector types, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorOp {
    Copy,
    Add,
    Subtract,
    Scale,
    Divide,
    Normalize,
    Lerp,
    SquareMagnitude,
    Magnitude,
    Dot,
    Cross,
}

impl VectorOp {
    /// Every operation, in the order they are emitted for each vector type.
    pub const ALL: [Self; 11] = [
        Self::Copy,
        Self::Add,
        Self::Subtract,
        Self::Scale,
        Self::Divide,
        Self::Normalize,
        Self::Lerp,
        Self::SquareMagnitude,
        Self::Magnitude,
        Self::Dot,
        Self::Cross,
    ];

    /// The operation's part of the generated function name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Scale => "scale",
            Self::Divide => "divide",
            Self::Normalize => "normalize",
            Self::Lerp => "lerp",
            Self::SquareMagnitude => "square_magnitude",
            Self::Magnitude => "magnitude",
            Self::Dot => "dot",
            Self::Cross => "cross",
        }
    }

    /// Returns whether this operation is generated for vectors of `kind`.
    ///
    /// - Normalization and interpolation need a unit literal that does not truncate, so they are
    ///   skipped for integer vectors.
    /// - The cross product only exists for 3-component vectors.
    pub fn is_available(self, kind: VectorKind) -> bool {
        match self {
            Self::Normalize | Self::Lerp => kind.scalar().has_fractional_unit(),
            Self::Cross => kind.count() == 3,
            _ => true,
        }
    }
}

impl Descriptor for VectorKind {
    const LIBRARY: &'static str = "vec";
    const SYSTEM_INCLUDES: &'static [&'static str] = &["string.h", "math.h"];

    fn identity(self, naming: &Naming) -> TypeIdentity {
        naming.vector(self)
    }

    fn functions(self, naming: &Naming, _registry: &Registry<Self>) -> Vec<Function> {
        let emitter = Emitter {
            kind: self,
            id: naming.vector(self),
        };
        VectorOp::ALL
            .into_iter()
            .filter_map(|op| emitter.emit(op))
            .collect()
    }
}

struct Emitter {
    kind: VectorKind,
    id: TypeIdentity,
}

impl Emitter {
    fn emit(&self, op: VectorOp) -> Option<Function> {
        if !op.is_available(self.kind) {
            log::trace!("no `{}` for {}", op.name(), self.kind);
            return None;
        }

        Some(match op {
            VectorOp::Copy => self.copy(),
            VectorOp::Add => self.binary(op, |a, b| a + b),
            VectorOp::Subtract => self.binary(op, |a, b| a - b),
            VectorOp::Scale => self.with_scalar(op, |v, s| v * s),
            VectorOp::Divide => self.with_scalar(op, |v, s| v / s),
            VectorOp::Normalize => self.normalize(),
            VectorOp::Lerp => self.lerp(),
            VectorOp::SquareMagnitude => self.square_magnitude(),
            VectorOp::Magnitude => self.magnitude(),
            VectorOp::Dot => self.dot(),
            VectorOp::Cross => self.cross(),
        })
    }

    fn ty(&self) -> &ArrayType {
        self.id.array_type()
    }

    fn scalar(&self) -> ScalarKind {
        self.kind.scalar()
    }

    fn function(&self, op: VectorOp) -> Function {
        Function::new(self.id.function(op.name()))
    }

    /// One statement per component.
    fn per_component(&self, f: impl Fn(usize) -> Stmt) -> Vec<Stmt> {
        (0..self.kind.count()).map(f).collect()
    }

    fn copy(&self) -> Function {
        self.function(VectorOp::Copy)
            .param(self.ty(), "vec")
            .param(self.ty(), "out")
            .stmt(Stmt::copy(
                var("out"),
                var("vec"),
                self.scalar(),
                self.kind.count(),
            ))
    }

    fn binary(&self, op: VectorOp, f: impl Fn(Expr, Expr) -> Expr) -> Function {
        self.function(op)
            .param(self.ty(), "a")
            .param(self.ty(), "b")
            .param(self.ty(), "out")
            .stmts(self.per_component(|i| {
                Stmt::assign(var("out").at(i), f(var("a").at(i), var("b").at(i)))
            }))
    }

    fn with_scalar(&self, op: VectorOp, f: impl Fn(Expr, Expr) -> Expr) -> Function {
        self.function(op)
            .param(self.ty(), "vec")
            .param(self.scalar(), "scalar")
            .param(self.ty(), "out")
            .stmts(self.per_component(|i| {
                Stmt::assign(var("out").at(i), f(var("vec").at(i), var("scalar")))
            }))
    }

    fn normalize(&self) -> Function {
        let mag = self.scalar().magnitude_kind();
        self.function(VectorOp::Normalize)
            .param(self.ty(), "vec")
            .param(self.ty(), "out")
            .stmt(Stmt::let_(
                mag,
                "mag",
                call(self.id.function(VectorOp::Magnitude.name()), [var("vec")]),
            ))
            .stmt(Stmt::Expr(call(
                self.id.function(VectorOp::Divide.name()),
                [var("vec"), var("mag"), var("out")],
            )))
    }

    fn lerp(&self) -> Function {
        let one = lit(self.scalar(), 1.0);
        self.function(VectorOp::Lerp)
            .param(self.ty(), "a")
            .param(self.ty(), "b")
            .param(self.scalar(), "t")
            .param(self.ty(), "out")
            .stmts(self.per_component(|i| {
                Stmt::assign(
                    var("out").at(i),
                    var("a").at(i) * (one.clone() - var("t")) + var("b").at(i) * var("t"),
                )
            }))
    }

    fn square_magnitude(&self) -> Function {
        self.function(VectorOp::SquareMagnitude)
            .returns(self.scalar())
            .param(self.ty(), "vec")
            .stmt(Stmt::ret(self.sum_of_products("vec", "vec")))
    }

    fn magnitude(&self) -> Function {
        let mag = self.scalar().magnitude_kind();
        let mut square = call(
            self.id.function(VectorOp::SquareMagnitude.name()),
            [var("vec")],
        );
        if self.scalar() != mag {
            square = square.cast(mag);
        }
        self.function(VectorOp::Magnitude)
            .returns(mag)
            .param(self.ty(), "vec")
            .stmt(Stmt::ret(square.sqrt(mag)))
    }

    fn dot(&self) -> Function {
        self.function(VectorOp::Dot)
            .returns(self.scalar())
            .param(self.ty(), "a")
            .param(self.ty(), "b")
            .stmt(Stmt::ret(self.sum_of_products("a", "b")))
    }

    fn sum_of_products(&self, a: &str, b: &str) -> Expr {
        sum(
            self.scalar(),
            (0..self.kind.count()).map(|i| var(a).at(i) * var(b).at(i)),
        )
    }

    fn cross(&self) -> Function {
        let n = self.kind.count();
        let mut body = vec![Stmt::declare(self.ty(), ["tmp"])];
        body.extend(self.per_component(|i| {
            let (j, k) = ((i + 1) % n, (i + 2) % n);
            Stmt::assign(
                var("tmp").at(i),
                var("a").at(j) * var("b").at(k) - var("a").at(k) * var("b").at(j),
            )
        }));
        body.push(Stmt::copy(var("out"), var("tmp"), self.scalar(), n));

        self.function(VectorOp::Cross)
            .param(self.ty(), "a")
            .param(self.ty(), "b")
            .param(self.ty(), "out")
            .stmts(body)
    }
}
