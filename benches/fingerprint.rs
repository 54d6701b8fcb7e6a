//! Benchmarks for class file parsing, fingerprinting and patching.
//!
//! All benchmarks run on the compiled fixtures under `tests/samples/classes`:
//! - `Plain`, the smallest serializable class
//! - `Account`, with a static initializer, several constructors and a member class table

extern crate serialver;

use criterion::{criterion_group, criterion_main, Criterion};
use serialver::{
    fingerprint::{self, canonical_stream, extract},
    patch::{self, FieldSpec, PatchOp},
    ClassFile,
};
use std::{hint::black_box, path::PathBuf};

fn load(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/samples/classes/com/example")
        .join(format!("{name}.class"));
    std::fs::read(path).unwrap()
}

/// Benchmark parsing a class file into the container model.
fn bench_parse(c: &mut Criterion) {
    let plain = load("Plain");
    let account = load("Account");

    c.bench_function("parse_plain", |b| {
        b.iter(|| black_box(ClassFile::parse(black_box(&plain)).unwrap()));
    });
    c.bench_function("parse_account", |b| {
        b.iter(|| black_box(ClassFile::parse(black_box(&account)).unwrap()));
    });
}

/// Benchmark the structural extraction and canonical stream on their own.
fn bench_canonical_stream(c: &mut Criterion) {
    let class = ClassFile::parse(&load("Account")).unwrap();

    c.bench_function("extract_account", |b| {
        b.iter(|| black_box(extract(black_box(&class)).unwrap()));
    });

    let descriptor = extract(&class).unwrap();
    c.bench_function("canonical_stream_account", |b| {
        b.iter(|| black_box(canonical_stream(black_box(&descriptor)).unwrap()));
    });
}

/// Benchmark the full fingerprint of an already parsed class.
fn bench_fingerprint(c: &mut Criterion) {
    let class = ClassFile::parse(&load("Account")).unwrap();

    c.bench_function("fingerprint_account", |b| {
        b.iter(|| black_box(fingerprint::fingerprint(black_box(&class)).unwrap()));
    });
}

/// Benchmark adding the fingerprint field and writing the class back out.
fn bench_patch(c: &mut Criterion) {
    let class = ClassFile::parse(&load("Account")).unwrap();
    let op = PatchOp::Add(FieldSpec::serial_version_uid(-4182193412286551176));

    c.bench_function("patch_and_write_account", |b| {
        b.iter(|| {
            let patched = patch::apply(black_box(&class), &op).unwrap();
            black_box(patched.to_bytes().unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_canonical_stream,
    bench_fingerprint,
    bench_patch
);
criterion_main!(benches);
