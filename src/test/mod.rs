use std::path::PathBuf;

use crate::ClassFile;

/// Path of a compiled fixture, e.g. `sample_path("Account$Entry")`.
pub fn sample_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/samples/classes/com/example")
        .join(format!("{name}.class"))
}

pub fn sample_bytes(name: &str) -> Vec<u8> {
    std::fs::read(sample_path(name)).unwrap()
}

pub fn sample_class(name: &str) -> ClassFile {
    ClassFile::parse(&sample_bytes(name)).unwrap()
}
