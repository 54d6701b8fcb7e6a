//! Field-level patching of class files.
//!
//! This module implements the single mutation this crate performs: adding, replacing or
//! removing one constant field. Every operation works on a parsed
//! [`crate::ClassFile`] and preserves the validity of everything it does not touch.
//!
//! # Constant Pool Discipline
//!
//! The pool is only ever appended to. Existing entries are never renumbered or removed,
//! so every index stored in method bodies, attributes and other fields stays valid. A
//! removed field's name and constant become unreferenced but remain in the pool.
//!
//! # Operations
//!
//! - [`crate::patch::PatchOp::Add`] appends a field at the end of the field table, reusing
//!   existing Utf8 entries for its name, descriptor and the `ConstantValue` attribute name
//!   and appending a fresh `Long` for its value.
//! - [`crate::patch::PatchOp::Replace`] points the first matching field at a fresh `Long`,
//!   rewriting only the two-byte index inside its `ConstantValue` attribute.
//! - [`crate::patch::PatchOp::Remove`] deletes the first matching field with its attributes.
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use serialver::{patch::{self, FieldSpec, PatchOp}, ClassFile};
//!
//! let data = std::fs::read("target/classes/com/example/Plain.class")?;
//! let class = ClassFile::parse(&data)?;
//!
//! let patched = patch::apply(&class, &PatchOp::Add(FieldSpec::serial_version_uid(42)))?;
//! assert_eq!(patched.field_constant("serialVersionUID")?, Some(42));
//! std::fs::write("Plain.class", patched.to_bytes()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::{
    classfile::{AccessFlags, Attribute, ClassFile, Constant, MemberInfo, CONSTANT_VALUE},
    Error, Result,
};

/// Name of the fingerprint field.
pub const SERIAL_VERSION_UID: &str = "serialVersionUID";

/// Descriptor of a `long` field.
pub const LONG_DESCRIPTOR: &str = "J";

/// A field to add, or a field as found in a class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// Simple name
    pub name: String,
    /// Field descriptor
    pub descriptor: String,
    /// Access flags
    pub access_flags: AccessFlags,
    /// `long` constant initializer, stored as a `ConstantValue` attribute
    pub constant: Option<i64>,
}

impl FieldSpec {
    /// `private static final long serialVersionUID = value`.
    #[must_use]
    pub fn serial_version_uid(value: i64) -> FieldSpec {
        FieldSpec {
            name: SERIAL_VERSION_UID.to_string(),
            descriptor: LONG_DESCRIPTOR.to_string(),
            access_flags: AccessFlags::PRIVATE_STATIC_FINAL,
            constant: Some(value),
        }
    }

    /// Describes the field at `position` in the field table of `class`.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::FieldNotFound`] if `position` is past the end of the table
    /// - [`crate::Error::Malformed`] if its name, descriptor or constant cannot be resolved
    pub fn of(class: &ClassFile, position: usize) -> Result<FieldSpec> {
        let pool = &class.constant_pool;
        let Some(field) = class.fields.get(position) else {
            return Err(Error::FieldNotFound(format!("#{position}")));
        };

        let constant = match field.constant_value_index(pool)? {
            Some(index) => match pool.get(index)? {
                Constant::Long(value) => Some(*value),
                _ => None,
            },
            None => None,
        };

        Ok(FieldSpec {
            name: field.name(pool)?,
            descriptor: field.descriptor(pool)?,
            access_flags: field.access_flags,
            constant,
        })
    }
}

/// One field mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchOp {
    /// Append a new field
    Add(FieldSpec),
    /// Change the `long` constant of the first field called `name`
    Replace {
        /// Field name
        name: String,
        /// New constant value
        value: i64,
    },
    /// Delete the first field called `name`
    Remove {
        /// Field name
        name: String,
    },
}

/// Applies `op` to a copy of `class` and returns the patched copy.
///
/// # Errors
///
/// See [`apply_in_place`].
pub fn apply(class: &ClassFile, op: &PatchOp) -> Result<ClassFile> {
    let mut patched = class.clone();
    apply_in_place(&mut patched, op)?;
    Ok(patched)
}

/// Applies `op` to `class` directly.
///
/// Preconditions are checked before anything is modified. Only growing the constant pool
/// past its slot limit can fail midway, and that leaves nothing but unreferenced entries
/// behind.
///
/// # Errors
///
/// - [`crate::Error::FieldNotFound`] for Replace or Remove of an absent field
/// - [`crate::Error::InvariantViolation`] when Add targets an existing name and descriptor,
///   a constant is attached to a non-`long` descriptor, or the pool is full
/// - [`crate::Error::Malformed`] if the existing field table cannot be resolved
pub fn apply_in_place(class: &mut ClassFile, op: &PatchOp) -> Result<()> {
    match op {
        PatchOp::Add(spec) => add_field(class, spec),
        PatchOp::Replace { name, value } => replace_constant(class, name, *value),
        PatchOp::Remove { name } => remove_field(class, name),
    }
}

fn add_field(class: &mut ClassFile, spec: &FieldSpec) -> Result<()> {
    if spec.constant.is_some() && spec.descriptor != LONG_DESCRIPTOR {
        return Err(invariant_error!(
            "Constant initializer on field '{}' requires descriptor J, found {}",
            spec.name,
            spec.descriptor
        ));
    }

    for field in &class.fields {
        if field.name(&class.constant_pool)? == spec.name
            && field.descriptor(&class.constant_pool)? == spec.descriptor
        {
            return Err(invariant_error!(
                "Field '{}' with descriptor {} already exists",
                spec.name,
                spec.descriptor
            ));
        }
    }

    let pool = &mut class.constant_pool;
    let name_index = pool.find_or_add_utf8(&spec.name)?;
    let descriptor_index = pool.find_or_add_utf8(&spec.descriptor)?;

    let mut attributes = Vec::new();
    if let Some(value) = spec.constant {
        let attribute_name = pool.find_or_add_utf8(CONSTANT_VALUE)?;
        let value_index = pool.add_long(value)?;
        attributes.push(Attribute::constant_value(attribute_name, value_index));
    }

    class.fields.push(MemberInfo {
        access_flags: spec.access_flags,
        name_index,
        descriptor_index,
        attributes,
    });

    Ok(())
}

fn replace_constant(class: &mut ClassFile, name: &str, value: i64) -> Result<()> {
    let Some(position) = class.find_field(name)? else {
        return Err(Error::FieldNotFound(name.to_string()));
    };

    let descriptor = class.fields[position].descriptor(&class.constant_pool)?;
    if descriptor != LONG_DESCRIPTOR {
        return Err(invariant_error!(
            "Cannot store a long constant in field '{}' of type {}",
            name,
            descriptor
        ));
    }

    let existing =
        class.fields[position].attribute_position(&class.constant_pool, CONSTANT_VALUE)?;
    let pool = &mut class.constant_pool;
    let field = &mut class.fields[position];

    match existing {
        Some(attribute) => {
            if field.attributes[attribute].info.len() != 2 {
                return Err(malformed_error!(
                    "ConstantValue attribute of '{}' has length {}, expected 2",
                    name,
                    field.attributes[attribute].info.len()
                ));
            }
            let value_index = pool.add_long(value)?;
            field.attributes[attribute].info = value_index.to_be_bytes().to_vec();
        }
        None => {
            let attribute_name = pool.find_or_add_utf8(CONSTANT_VALUE)?;
            let value_index = pool.add_long(value)?;
            field
                .attributes
                .push(Attribute::constant_value(attribute_name, value_index));
        }
    }

    Ok(())
}

fn remove_field(class: &mut ClassFile, name: &str) -> Result<()> {
    let Some(position) = class.find_field(name)? else {
        return Err(Error::FieldNotFound(name.to_string()));
    };

    class.fields.remove(position);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::sample_class as sample;

    #[test]
    fn add_appends_pool_entries_in_order() {
        let class = sample("Plain");
        let before = class.constant_pool.count();

        let patched = apply(&class, &PatchOp::Add(FieldSpec::serial_version_uid(7))).unwrap();
        let pool = &patched.constant_pool;

        assert_eq!(pool.count(), before + 5);
        assert_eq!(pool.utf8(before).unwrap(), SERIAL_VERSION_UID);
        assert_eq!(pool.utf8(before + 1).unwrap(), LONG_DESCRIPTOR);
        assert_eq!(pool.utf8(before + 2).unwrap(), CONSTANT_VALUE);
        assert_eq!(pool.long(before + 3).unwrap(), 7);

        let field = patched.fields.last().unwrap();
        assert_eq!(field.access_flags, AccessFlags::PRIVATE_STATIC_FINAL);
        assert_eq!(patched.field_constant(SERIAL_VERSION_UID).unwrap(), Some(7));
        assert_eq!(patched.methods, class.methods);
    }

    #[test]
    fn add_reuses_existing_utf8() {
        let class = sample("WithUid");
        let removed = apply(
            &class,
            &PatchOp::Remove {
                name: SERIAL_VERSION_UID.to_string(),
            },
        )
        .unwrap();
        let before = removed.constant_pool.count();

        let patched = apply(&removed, &PatchOp::Add(FieldSpec::serial_version_uid(1))).unwrap();
        // name, descriptor and ConstantValue are already pooled; only the Long is new
        assert_eq!(patched.constant_pool.count(), before + 2);
        assert_eq!(patched.field_constant(SERIAL_VERSION_UID).unwrap(), Some(1));
    }

    #[test]
    fn add_rejects_constant_on_non_long() {
        let mut spec = FieldSpec::serial_version_uid(1);
        spec.descriptor = "I".to_string();
        let result = apply(&sample("Plain"), &PatchOp::Add(spec));
        assert!(matches!(result, Err(Error::InvariantViolation { .. })));
    }

    #[test]
    fn add_rejects_duplicate() {
        let result = apply(&sample("WithUid"), &PatchOp::Add(FieldSpec::serial_version_uid(1)));
        assert!(matches!(result, Err(Error::InvariantViolation { .. })));
    }

    #[test]
    fn replace_rewrites_only_the_index() {
        let class = sample("WithUid");
        let patched = apply(
            &class,
            &PatchOp::Replace {
                name: SERIAL_VERSION_UID.to_string(),
                value: -5,
            },
        )
        .unwrap();

        assert_eq!(patched.field_constant(SERIAL_VERSION_UID).unwrap(), Some(-5));
        assert_eq!(patched.fields.len(), class.fields.len());
        assert_eq!(patched.constant_pool.count(), class.constant_pool.count() + 2);
        assert_eq!(class.field_constant(SERIAL_VERSION_UID).unwrap(), Some(42));
    }

    #[test]
    fn replace_and_remove_missing() {
        let class = sample("Plain");
        assert!(matches!(
            apply(
                &class,
                &PatchOp::Replace {
                    name: "nope".to_string(),
                    value: 1
                }
            ),
            Err(Error::FieldNotFound(_))
        ));
        assert!(matches!(
            apply(
                &class,
                &PatchOp::Remove {
                    name: "nope".to_string()
                }
            ),
            Err(Error::FieldNotFound(_))
        ));
    }

    #[test]
    fn replace_on_int_field_is_rejected() {
        let result = apply(
            &sample("IntUid"),
            &PatchOp::Replace {
                name: SERIAL_VERSION_UID.to_string(),
                value: 1,
            },
        );
        assert!(matches!(result, Err(Error::InvariantViolation { .. })));
    }

    #[test]
    fn field_spec_of() {
        let class = sample("WithUid");
        let position = class.find_field(SERIAL_VERSION_UID).unwrap().unwrap();
        let spec = FieldSpec::of(&class, position).unwrap();
        assert_eq!(spec, FieldSpec::serial_version_uid(42));
        assert!(FieldSpec::of(&class, 99).is_err());
    }
}
