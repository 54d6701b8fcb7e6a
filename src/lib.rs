// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
// - 'file/physical.rs' and 'batch/output.rs' use mmap to map files into memory

//! # serialver
//!
//! Computes the default `serialVersionUID` of compiled JVM classes and writes it into their
//! class files as a `private static final long` constant. Run as a post-processing step over
//! a build's class directory, it pins every serializable class to the fingerprint of its
//! current structure, so that later incompatible edits surface at deserialization time
//! instead of silently changing the implicit value.
//!
//! ## Features
//!
//! - **Exact fingerprints** - Bit-for-bit the value `java.io.ObjectStreamClass` computes,
//!   including member-class modifiers, interface abstractness and UTF-16 sort order
//! - **Lossless class file model** - Parse and serialize reproduces the input byte for byte
//! - **Minimal patching** - One field is added, replaced or removed; the constant pool is
//!   only appended to, so no existing index moves
//! - **Parallel batches** - Class directories are processed on a rayon pool with atomic
//!   publication of every output file
//!
//! ## Quick Start
//!
//! ### Fingerprint a single class
//!
//! ```rust,no_run
//! use serialver::prelude::*;
//!
//! let data = std::fs::read("target/classes/com/example/Plain.class")?;
//! let class = ClassFile::parse(&data)?;
//! println!("{}", fingerprint::fingerprint(&class)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Process a class directory
//!
//! ```rust,no_run
//! use serialver::{Batch, Config, Outcome};
//!
//! let config = Config::new("target/classes").keep_original(true);
//! let report = Batch::new(config)?.run()?;
//!
//! println!("injected into {} classes", report.count(Outcome::Injected));
//! # Ok::<(), serialver::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`file`] - Raw input backends and the bounds-checked big-endian [`Parser`]
//! - [`classfile`] - The class file model: constant pool, members, attributes, flags
//! - [`fingerprint`] - Structural descriptors, the canonical stream and SHA-1 reduction, and
//!   the serialization contract analysis
//! - [`patch`] - Add, replace and remove of a single constant field
//! - [`batch`] - Discovery, per-artifact policy, parallel execution and reporting
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Development and Testing
//!
//! ### Fuzzing
//!
//! ```bash
//! cargo +nightly fuzz run classfile --release
//! ```
//!
//! ### Testing
//!
//! The integration tests run against class files compiled from the Java sources in
//! `tests/samples/java`, with expected values taken from the JDK `serialver` tool:
//!
//! ```bash
//! cargo test
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust,no_run
/// use serialver::prelude::*;
///
/// let class = ClassFile::parse(&std::fs::read("Plain.class")?)?;
/// let patched = patch::apply(&class, &PatchOp::Add(FieldSpec::serial_version_uid(1)))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub mod prelude;

pub mod batch;
pub mod classfile;
pub mod file;
pub mod fingerprint;
pub mod patch;

/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

pub use error::Error;

pub use batch::{ArtifactReport, Batch, BatchContext, BatchReport, Config, Outcome};
pub use classfile::{AccessFlags, ClassFile};
pub use file::{parser::Parser, File};
pub use fingerprint::{Eligibility, Fingerprint, StructuralDescriptor};
pub use patch::{FieldSpec, PatchOp};
