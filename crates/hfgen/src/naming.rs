//! Derives type and function names from descriptors.

use crate::{
    code::ArrayType,
    registry::{Shape, VectorKind},
    ScalarKind,
};

/// Prefixes applied to every generated type and function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Naming {
    type_prefix: String,
    function_prefix: String,
}

impl Default for Naming {
    fn default() -> Self {
        Self::new("HF_", "hf_")
    }
}

impl Naming {
    pub fn new(type_prefix: impl Into<String>, function_prefix: impl Into<String>) -> Self {
        Self {
            type_prefix: type_prefix.into(),
            function_prefix: function_prefix.into(),
        }
    }

    /// The prefix of type names (`HF_` by default).
    pub fn type_prefix(&self) -> &str {
        &self.type_prefix
    }

    /// The prefix of function names (`hf_` by default).
    pub fn function_prefix(&self) -> &str {
        &self.function_prefix
    }

    /// Returns the include guard macro for a library called `library`, eg. `HF_MAT_H`.
    pub fn include_guard(&self, library: &str) -> String {
        format!("{}_H", self.file_stem(library)).to_uppercase()
    }

    /// Returns the file name (without extension) of a library called `library`, eg. `hf_mat`.
    pub fn file_stem(&self, library: &str) -> String {
        format!("{}{}", self.function_prefix, library)
    }

    /// Derives the identity of the matrix type with the given shape.
    ///
    /// Square shapes are named `Mat<N>f`, others `Mat<W>x<H>f`.
    pub fn matrix(&self, shape: Shape) -> TypeIdentity {
        let dims = match shape.square_size() {
            Some(n) => n.to_string(),
            None => shape.to_string(),
        };
        self.identity(
            format!("Mat{dims}f"),
            format!("mat{dims}f"),
            ScalarKind::Float,
            vec![shape.width(), shape.height()],
        )
    }

    /// Derives the identity of the vector type of the given kind, eg. `Vec3i`.
    pub fn vector(&self, kind: VectorKind) -> TypeIdentity {
        let suffix = kind.scalar().suffix();
        self.identity(
            format!("Vec{}{suffix}", kind.count()),
            format!("vec{}{suffix}", kind.count()),
            kind.scalar(),
            vec![kind.count()],
        )
    }

    fn identity(
        &self,
        name: String,
        prefix: String,
        element: ScalarKind,
        dims: Vec<usize>,
    ) -> TypeIdentity {
        TypeIdentity {
            ty: ArrayType::new(format!("{}{name}", self.type_prefix), element, dims),
            prefix,
            namespace: self.function_prefix.clone(),
        }
    }
}

/// Names and element type of one generated type.
///
/// Identities are recomputed on demand rather than stored; equal descriptors always produce equal
/// identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeIdentity {
    ty: ArrayType,
    prefix: String,
    namespace: String,
}

impl TypeIdentity {
    /// The full type name, eg. `HF_Mat2x3f`.
    pub fn name(&self) -> &str {
        self.ty.name()
    }

    /// The per-type part of function names, eg. `mat2x3f`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn element(&self) -> ScalarKind {
        self.ty.element()
    }

    /// The array type this identity's typedef declares.
    pub fn array_type(&self) -> &ArrayType {
        &self.ty
    }

    /// Returns the name of operation `op` on this type, eg. `hf_vec3f_cross`.
    pub fn function(&self, op: &str) -> String {
        format!("{}{}_{op}", self.namespace, self.prefix)
    }

    /// Returns the name of the product of this type with `rhs`, eg. `hf_mat2x3f_multiply_mat3f`.
    pub fn multiply(&self, rhs: &TypeIdentity) -> String {
        self.function(&format!("multiply_{}", rhs.prefix))
    }
}
