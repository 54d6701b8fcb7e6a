//! Serialization fingerprints of JVM classes.
//!
//! This module reproduces the default `serialVersionUID` the platform derives for a
//! serializable class that does not declare one. The computation has three stages:
//!
//! 1. [`crate::fingerprint::extract`] reduces a [`crate::ClassFile`] to a
//!    [`crate::fingerprint::StructuralDescriptor`]: name, masked modifiers, sorted
//!    interfaces, and the hashed fields, constructors and methods in canonical order.
//! 2. [`crate::fingerprint::canonical_stream`] writes the descriptor with `DataOutput`
//!    conventions (`writeUTF` strings, big-endian `writeInt` modifiers).
//! 3. [`crate::fingerprint::digest`] takes the SHA-1 of that stream and reads its first
//!    eight bytes little-endian as a signed 64-bit value.
//!
//! Enum and record classes always have fingerprint 0.
//!
//! Separately, [`crate::fingerprint::ContractGraph`] decides whether a class should carry
//! a fingerprint at all (Serializable but not Externalizable).
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use serialver::{fingerprint, ClassFile};
//!
//! let data = std::fs::read("target/classes/com/example/Plain.class")?;
//! let class = ClassFile::parse(&data)?;
//! let value = fingerprint::fingerprint(&class)?;
//! println!("private static final long serialVersionUID = {}L;", value);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod descriptor;
mod eligibility;
mod hash;

pub use descriptor::{
    extract, type_kind, utf16_cmp, DescriptorBuilder, MemberSignature, StructuralDescriptor,
    TypeKind,
};
pub use eligibility::{
    ContractGraph, DirectorySource, Eligibility, PlatformTypes, Supertypes, TypeSource,
    EXTERNALIZABLE, SERIALIZABLE,
};
pub use hash::{canonical_stream, compute, digest, DataOutput, Fingerprint};

use crate::{ClassFile, Result};

/// Extracts and hashes a parsed class in one step.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if the class cannot be described or hashed.
pub fn fingerprint(class: &ClassFile) -> Result<Fingerprint> {
    compute(&extract(class)?)
}
