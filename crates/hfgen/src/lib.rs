//! Generator for a fixed-size C vector and matrix library.
//!
//! The generated library consists of two header/source pairs:
//!
//! * `hf_vec.h`/`hf_vec.c`: vector types like `HF_Vec3f` (`float[3]`) with elementwise
//!   arithmetic, normalization, interpolation, dot and cross products.
//! * `hf_mat.h`/`hf_mat.c`: matrix types like `HF_Mat2x3f` (`float[2][3]`) with elementwise
//!   arithmetic, identity, transpose, determinant, minor, inverse and products.
//!
//! Which types exist is fixed by a [`Registry`] of vector kinds or matrix shapes. Operations that
//! need a type missing from the registry (the transpose of a `2x3` without a `3x2`, or a product
//! whose result shape is unregistered) are silently left out.
//!
//! # Output
//!
//! Each header starts with an include guard and the `typedef`s of all registered types, followed
//! by the prototypes of every function. Each source includes its header and the system headers it
//! needs, then defines the functions in the same order. Output is fully determined by the
//! [`Config`]; generating twice yields identical bytes.
//!
//! All functions return results through an `out` parameter, which may alias any of the inputs.

use std::io::{self, Write};

use log::LevelFilter;

pub mod code;
mod config;
mod library;
mod matrix;
mod naming;
mod registry;
mod scalar;
mod vector;

#[cfg(test)]
mod interp;

pub use config::Config;
pub use library::{Descriptor, Library};
pub use matrix::{product_shape, MatrixOp};
pub use naming::{Naming, TypeIdentity};
pub use registry::{Registry, Shape, VectorKind};
pub use scalar::ScalarKind;
pub use vector::VectorOp;

/// Builds the vector library described by `config` without rendering it.
pub fn build_vector_library(config: &Config) -> Library {
    library::assemble(config.naming(), config.include_dir(), config.vectors())
}

/// Builds the matrix library described by `config` without rendering it.
pub fn build_matrix_library(config: &Config) -> Library {
    library::assemble(config.naming(), config.include_dir(), config.matrices())
}

/// Generates the vector library, writing the header to `header` and the source to `source`.
///
/// Errors are only returned if writing to either sink fails.
pub fn generate_vector_library<H: Write, S: Write>(
    config: &Config,
    header: H,
    source: S,
) -> io::Result<()> {
    build_vector_library(config).write(header, source)
}

/// Generates the matrix library, writing the header to `header` and the source to `source`.
///
/// Errors are only returned if writing to either sink fails.
pub fn generate_matrix_library<H: Write, S: Write>(
    config: &Config,
    header: H,
    source: S,
) -> io::Result<()> {
    build_matrix_library(config).write(header, source)
}

#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// If `cfg!(debug_assertions)` is enabled, the calling crate and hfgen will log at *trace* level.
/// Otherwise, they will log at *debug* level. `RUST_LOG` overrides both.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
