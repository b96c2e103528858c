//! Writes `hf_vec.h`, `hf_vec.c`, `hf_mat.h` and `hf_mat.c` into the current directory.

use std::{
    fs::File,
    io::{self, BufWriter},
};

use anyhow::Context;
use hfgen::{Config, Descriptor, Shape, VectorKind};

fn create(path: &str) -> anyhow::Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("failed to create `{path}`"))?;
    Ok(BufWriter::new(file))
}

fn generate(
    name: &str,
    write: impl FnOnce(BufWriter<File>, BufWriter<File>) -> io::Result<()>,
) -> anyhow::Result<()> {
    let (header, source) = (format!("{name}.h"), format!("{name}.c"));
    write(create(&header)?, create(&source)?)
        .with_context(|| format!("failed to write `{header}` and `{source}`"))?;
    log::info!("wrote {header} and {source}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    hfgen::init_logger!();

    let config = Config::default();
    log::debug!("vectors: {:?}", config.vectors());
    log::debug!("matrices: {:?}", config.matrices());

    let naming = config.naming();
    generate(&naming.file_stem(VectorKind::LIBRARY), |h, s| {
        hfgen::generate_vector_library(&config, h, s)
    })?;
    generate(&naming.file_stem(Shape::LIBRARY), |h, s| {
        hfgen::generate_matrix_library(&config, h, s)
    })?;

    Ok(())
}
