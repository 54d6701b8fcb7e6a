//! # serialver Prelude
//!
//! ```rust
//! use serialver::prelude::*;
//! ```

pub use crate::{Error, Result};

pub use crate::{File, Parser};

pub use crate::classfile::{
    AccessFlags, Attribute, ClassFile, Constant, ConstantPool, ConstantTag, MemberInfo,
};

pub use crate::fingerprint::{
    self, ContractGraph, DescriptorBuilder, Eligibility, Fingerprint, StructuralDescriptor,
    TypeKind,
};

pub use crate::patch::{self, FieldSpec, PatchOp};

pub use crate::batch::{ArtifactReport, Batch, BatchReport, Config, Outcome};
