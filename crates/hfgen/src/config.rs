use crate::{
    naming::Naming,
    registry::{Registry, Shape, VectorKind},
};

/// Generation options.
///
/// The default configuration uses the `HF_`/`hf_` prefixes, includes the header from
/// `../include/`, and generates the reference vector and matrix registries.
#[derive(Debug, Clone)]
pub struct Config {
    naming: Naming,
    include_dir: String,
    vectors: Registry<VectorKind>,
    matrices: Registry<Shape>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naming: Naming::default(),
            include_dir: "../include/".into(),
            vectors: Registry::<VectorKind>::reference(),
            matrices: Registry::<Shape>::reference(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefixes used for type and function names.
    pub fn with_naming(mut self, naming: Naming) -> Self {
        self.naming = naming;
        self
    }

    /// Sets the directory the generated sources include their header from.
    ///
    /// The directory is prepended verbatim, so it should end in a `/` unless it is empty.
    pub fn with_include_dir(mut self, dir: impl Into<String>) -> Self {
        self.include_dir = dir.into();
        self
    }

    /// Sets the vector types to generate.
    pub fn with_vectors(mut self, registry: Registry<VectorKind>) -> Self {
        self.vectors = registry;
        self
    }

    /// Sets the matrix shapes to generate.
    pub fn with_matrices(mut self, registry: Registry<Shape>) -> Self {
        self.matrices = registry;
        self
    }

    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    pub fn include_dir(&self) -> &str {
        &self.include_dir
    }

    pub fn vectors(&self) -> &Registry<VectorKind> {
        &self.vectors
    }

    pub fn matrices(&self) -> &Registry<Shape> {
        &self.matrices
    }
}
