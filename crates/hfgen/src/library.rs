//! Assembles a whole library from a registry and writes it out as a header/source pair.

use std::{
    collections::BTreeSet,
    fmt,
    io::{self, Write},
};

use crate::{
    code::{render, ArrayType, Function},
    naming::{Naming, TypeIdentity},
    registry::Registry,
};

/// A descriptor kind that a library can be generated for.
///
/// Implemented by [`VectorKind`][crate::VectorKind] (the vector library) and
/// [`Shape`][crate::Shape] (the matrix library).
pub trait Descriptor: Copy + PartialEq + fmt::Debug + fmt::Display {
    /// Short name of the library, used for file names and the include guard (eg. `vec`).
    const LIBRARY: &'static str;

    /// System headers the definitions rely on.
    const SYSTEM_INCLUDES: &'static [&'static str];

    /// Derives the names of the type described by `self`.
    fn identity(self, naming: &Naming) -> TypeIdentity;

    /// Builds every function available for `self`, in emission order.
    ///
    /// Operations that are unavailable for `self` (or that would need a type missing from
    /// `registry`) are skipped.
    fn functions(self, naming: &Naming, registry: &Registry<Self>) -> Vec<Function>;
}

/// An assembled library: its types and functions, ready to be rendered.
#[derive(Debug, Clone)]
pub struct Library {
    name: &'static str,
    guard: String,
    header_path: String,
    system_includes: &'static [&'static str],
    types: Vec<ArrayType>,
    /// Functions grouped by the registry entry they were emitted for.
    groups: Vec<Vec<Function>>,
}

/// Builds the library for every descriptor in `registry`.
///
/// `include_dir` is prepended to the header's file name in the source's `#include`.
pub fn assemble<D: Descriptor>(
    naming: &Naming,
    include_dir: &str,
    registry: &Registry<D>,
) -> Library {
    let types = registry
        .iter()
        .map(|d| d.identity(naming).array_type().clone())
        .collect();
    let groups = registry
        .iter()
        .map(|d| {
            let functions = d.functions(naming, registry);
            log::trace!("{d}: {} functions", functions.len());
            functions
        })
        .collect::<Vec<_>>();

    let lib = Library {
        name: D::LIBRARY,
        guard: naming.include_guard(D::LIBRARY),
        header_path: format!("{include_dir}{}.h", naming.file_stem(D::LIBRARY)),
        system_includes: D::SYSTEM_INCLUDES,
        types,
        groups,
    };
    log::debug!(
        "assembled `{}` library: {} types, {} functions",
        lib.name,
        lib.types.len(),
        lib.functions().count()
    );
    lib
}

impl Library {
    /// Short name of the library (`vec` or `mat`).
    pub fn name(&self) -> &str {
        self.name
    }

    /// The declared types, in declaration order.
    pub fn types(&self) -> &[ArrayType] {
        &self.types
    }

    /// All functions, in emission order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> + '_ {
        self.groups.iter().flatten()
    }

    /// Looks up a function by its full name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions().find(|f| f.name == name)
    }

    pub fn function_names(&self) -> Vec<&str> {
        self.functions().map(|f| f.name.as_str()).collect()
    }

    /// Returns the names of called functions that this library does not define.
    ///
    /// This is always empty for libraries produced by [`assemble`].
    pub fn unresolved_calls(&self) -> BTreeSet<&str> {
        let defined = self.functions().map(|f| f.name.as_str()).collect::<BTreeSet<_>>();
        self.functions()
            .flat_map(|f| f.callees())
            .filter(|name| !defined.contains(name))
            .collect()
    }

    /// Renders the header (declarations) and source (definitions) into the given sinks.
    ///
    /// Both sinks are flushed and dropped before returning.
    pub fn write<H: Write, S: Write>(&self, mut header: H, mut source: S) -> io::Result<()> {
        writeln!(header, "#ifndef {}", self.guard)?;
        writeln!(header, "#define {}", self.guard)?;
        writeln!(header)?;
        for ty in &self.types {
            writeln!(header, "{}", render::typedef(ty))?;
        }
        for group in &self.groups {
            writeln!(header)?;
            for f in group {
                writeln!(header, "{}", render::declaration(f))?;
            }
        }
        writeln!(header)?;
        writeln!(header, "#endif//{}", self.guard)?;

        writeln!(source, "#include \"{}\"", self.header_path)?;
        writeln!(source)?;
        for include in self.system_includes {
            writeln!(source, "#include <{include}>")?;
        }
        for f in self.functions() {
            source.write_all(render::definition(f).as_bytes())?;
        }

        header.flush()?;
        source.flush()?;
        log::trace!("wrote `{}` library", self.name);
        Ok(())
    }

    /// Renders the library into a pair of strings `(header, source)`.
    pub fn render(&self) -> (String, String) {
        let (mut header, mut source) = (Vec::new(), Vec::new());
        self.write(&mut header, &mut source)
            .expect("writing to a `Vec` cannot fail");
        (
            String::from_utf8(header).expect("rendered header is not UTF-8"),
            String::from_utf8(source).expect("rendered source is not UTF-8"),
        )
    }
}
