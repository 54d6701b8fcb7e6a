//! In-memory model of a JVM class file.
//!
//! [`crate::classfile::ClassFile`] is a direct, lossless representation of the class file
//! format: magic and version, the [`crate::classfile::ConstantPool`], access flags, this and
//! super class, interfaces, fields, methods and attributes. Parsing and serializing an
//! unmodified class reproduces the input byte for byte; everything the model does not
//! interpret (method bodies, annotations, stack maps) is carried through as raw attribute
//! bytes.
//!
//! # Architecture
//!
//! The model is deliberately thin. Indices into the constant pool are stored as parsed and
//! resolved through accessor methods, never eagerly. This keeps the two consumers simple:
//!
//! - [`crate::fingerprint`] reads names, flags and descriptors through the accessors.
//! - [`crate::patch`] appends to the pool and edits the field table, relying on the pool
//!   never renumbering an existing entry.
//!
//! # Key Components
//!
//! - [`crate::classfile::ClassFile`] - The parsed class with `parse` and `to_bytes`
//! - [`crate::classfile::ConstantPool`] / [`crate::classfile::Constant`] - The constant pool
//! - [`crate::classfile::MemberInfo`] - Fields and methods
//! - [`crate::classfile::Attribute`] - Raw attributes
//! - [`crate::classfile::AccessFlags`] - Access flag bits and hashing masks
//! - [`crate::classfile::mutf8`] - Modified UTF-8 codec
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use serialver::ClassFile;
//!
//! let data = std::fs::read("target/classes/com/example/Plain.class")?;
//! let class = ClassFile::parse(&data)?;
//!
//! println!("{} extends {:?}", class.class_name()?, class.super_class_name()?);
//! for field in &class.fields {
//!     println!("  {} {}", field.name(&class.constant_pool)?, field.descriptor(&class.constant_pool)?);
//! }
//! assert_eq!(class.to_bytes()?, data);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Supported Versions
//!
//! Major versions 45 (JDK 1.1) through 69 (JDK 25) are accepted. Anything else yields
//! [`crate::Error::NotSupported`].

mod constant;
mod flags;
mod member;
pub mod mutf8;

pub use constant::{Constant, ConstantPool, ConstantTag, MAX_POOL_SLOTS};
pub use flags::{AccessFlags, CLASS_MODIFIER_MASK, FIELD_MODIFIER_MASK, METHOD_MODIFIER_MASK};
pub use member::{Attribute, InnerClass, MemberInfo, CONSTANT_VALUE, INNER_CLASSES, RECORD};

use std::ops::RangeInclusive;

use crate::{
    file::{io::push_be, parser::Parser},
    Error, Result,
};
use member::write_count;

/// The magic number opening every class file.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Accepted `major_version` values.
pub const SUPPORTED_MAJOR_VERSIONS: RangeInclusive<u16> = 45..=69;

/// A parsed class file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassFile {
    /// `minor_version`
    pub minor_version: u16,
    /// `major_version`
    pub major_version: u16,
    /// The constant pool
    pub constant_pool: ConstantPool,
    /// Class access flags
    pub access_flags: AccessFlags,
    /// `Class` entry of this class
    pub this_class: u16,
    /// `Class` entry of the superclass, 0 only for `java.lang.Object` and modules
    pub super_class: u16,
    /// `Class` entries of the direct superinterfaces, in declaration order
    pub interfaces: Vec<u16>,
    /// Declared fields in file order
    pub fields: Vec<MemberInfo>,
    /// Declared methods in file order
    pub methods: Vec<MemberInfo>,
    /// Class attributes in file order
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Parses a class file from its raw bytes.
    ///
    /// Besides the structure itself, every name the class refers to for its own identity
    /// (this class, superclass, interfaces, member names and descriptors) is checked to
    /// resolve to a valid modified UTF-8 string.
    ///
    /// # Arguments
    ///
    /// * `data` - The complete class file
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Empty`] if `data` is empty
    /// - [`crate::Error::Malformed`] on a bad magic, unknown constant tag, dangling index,
    ///   invalid modified UTF-8 or trailing bytes
    /// - [`crate::Error::NotSupported`] if the major version lies outside 45..=69
    /// - [`crate::Error::OutOfBounds`] if the data is truncated
    pub fn parse(data: &[u8]) -> Result<ClassFile> {
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let mut parser = Parser::new(data);
        let magic = parser.read_be::<u32>()?;
        if magic != MAGIC {
            return Err(malformed_error!("Invalid magic 0x{:08X}", magic));
        }

        let minor_version = parser.read_be::<u16>()?;
        let major_version = parser.read_be::<u16>()?;
        if !SUPPORTED_MAJOR_VERSIONS.contains(&major_version) {
            return Err(Error::NotSupported(major_version));
        }

        let constant_pool = ConstantPool::read(&mut parser)?;
        let access_flags = AccessFlags::from_bits_retain(parser.read_be()?);
        let this_class = parser.read_be::<u16>()?;
        let super_class = parser.read_be::<u16>()?;

        let interface_count = parser.read_be::<u16>()?;
        let mut interfaces = Vec::with_capacity(usize::from(interface_count));
        for _ in 0..interface_count {
            interfaces.push(parser.read_be::<u16>()?);
        }

        let fields = Self::read_members(&mut parser)?;
        let methods = Self::read_members(&mut parser)?;
        let attributes = Attribute::read_count(&mut parser)?;

        if parser.has_more_data() {
            return Err(malformed_error!(
                "{} trailing bytes after the class attributes",
                parser.remaining()
            ));
        }

        let class = ClassFile {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        };
        class.validate()?;

        Ok(class)
    }

    fn read_members(parser: &mut Parser) -> Result<Vec<MemberInfo>> {
        let count = parser.read_be::<u16>()?;
        let mut members = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            members.push(MemberInfo::read(parser)?);
        }
        Ok(members)
    }

    fn validate(&self) -> Result<()> {
        self.class_name()?;
        self.super_class_name()?;
        self.interface_names()?;
        for member in self.fields.iter().chain(&self.methods) {
            member.name(&self.constant_pool)?;
            member.descriptor(&self.constant_pool)?;
        }
        Ok(())
    }

    /// Serializes the class file.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvariantViolation`] if a table has grown beyond what the
    /// format can count.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        push_be(&mut out, MAGIC);
        push_be(&mut out, self.minor_version);
        push_be(&mut out, self.major_version);
        self.constant_pool.write(&mut out)?;
        push_be(&mut out, self.access_flags.bits());
        push_be(&mut out, self.this_class);
        push_be(&mut out, self.super_class);

        write_count(self.interfaces.len(), "interfaces", &mut out)?;
        for interface in &self.interfaces {
            push_be(&mut out, *interface);
        }

        write_count(self.fields.len(), "fields", &mut out)?;
        for field in &self.fields {
            field.write(&mut out)?;
        }

        write_count(self.methods.len(), "methods", &mut out)?;
        for method in &self.methods {
            method.write(&mut out)?;
        }

        Attribute::write_all(&self.attributes, &mut out)?;

        Ok(out)
    }

    /// Internal name of this class, e.g. `com/example/Account$Entry`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `this_class` is not a valid `Class` entry.
    pub fn class_name(&self) -> Result<String> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Internal name of the superclass, `None` for `java/lang/Object`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if `super_class` is not a valid `Class` entry.
    pub fn super_class_name(&self) -> Result<Option<String>> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    /// Internal names of the direct superinterfaces in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if an entry is not a valid `Class`.
    pub fn interface_names(&self) -> Result<Vec<String>> {
        self.interfaces
            .iter()
            .map(|index| self.constant_pool.class_name(*index))
            .collect()
    }

    /// Returns `true` if the class is an interface (including annotation interfaces).
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.access_flags.contains(AccessFlags::INTERFACE)
    }

    /// Returns `true` if the class has a class-level attribute called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if an attribute name is not a Utf8 entry.
    pub fn has_attribute(&self, name: &str) -> Result<bool> {
        for attribute in &self.attributes {
            if attribute.is(&self.constant_pool, name)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Entries of the `InnerClasses` attribute, empty if there is none.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the attribute body is inconsistent.
    pub fn inner_classes(&self) -> Result<Vec<InnerClass>> {
        for attribute in &self.attributes {
            if attribute.is(&self.constant_pool, INNER_CLASSES)? {
                return InnerClass::parse_all(&attribute.info);
            }
        }
        Ok(Vec::new())
    }

    /// Position in the field table of the first field called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if a field name is not a valid Utf8.
    pub fn find_field(&self, name: &str) -> Result<Option<usize>> {
        for (position, field) in self.fields.iter().enumerate() {
            if field.name(&self.constant_pool)? == name {
                return Ok(Some(position));
            }
        }
        Ok(None)
    }

    /// Reads the `long` constant stored for the first field called `name`.
    ///
    /// Returns `Ok(None)` if the field exists but carries no `ConstantValue`.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::FieldNotFound`] if no such field exists
    /// - [`crate::Error::Malformed`] if the constant is not a `Long`
    pub fn field_constant(&self, name: &str) -> Result<Option<i64>> {
        let Some(position) = self.find_field(name)? else {
            return Err(Error::FieldNotFound(name.to_string()));
        };

        match self.fields[position].constant_value_index(&self.constant_pool)? {
            Some(index) => self.constant_pool.long(index).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{sample_bytes, sample_class};

    #[test]
    fn parse_plain() {
        let class = sample_class("Plain");
        assert_eq!(class.major_version, 61);
        assert_eq!(class.class_name().unwrap(), "com/example/Plain");
        assert_eq!(class.super_class_name().unwrap().as_deref(), Some("java/lang/Object"));
        assert_eq!(class.interface_names().unwrap(), vec!["java/io/Serializable"]);
        assert!(class.fields.is_empty());
        assert_eq!(class.methods.len(), 1);
        assert!(!class.is_interface());
    }

    #[test]
    fn field_constant_lookup() {
        let class = sample_class("WithUid");
        assert_eq!(class.field_constant("serialVersionUID").unwrap(), Some(42));
        assert!(matches!(
            class.field_constant("missing"),
            Err(Error::FieldNotFound(_))
        ));
    }

    #[test]
    fn inner_class_entries() {
        let class = sample_class("Account$Hidden");
        let own = class.class_name().unwrap();
        let entry = class
            .inner_classes()
            .unwrap()
            .into_iter()
            .find(|e| class.constant_pool.class_name(e.inner_class_info_index).unwrap() == own)
            .unwrap();
        assert!(entry.inner_class_access_flags.contains(AccessFlags::PRIVATE));
    }

    #[test]
    fn record_attribute() {
        assert!(sample_class("Point").has_attribute(RECORD).unwrap());
        assert!(!sample_class("Plain").has_attribute(RECORD).unwrap());
    }

    #[test]
    fn rejects_bad_input() {
        let data = sample_bytes("Plain");

        assert!(matches!(ClassFile::parse(&[]), Err(Error::Empty)));
        assert!(matches!(
            ClassFile::parse(&data[..data.len() - 1]),
            Err(Error::OutOfBounds)
        ));

        let mut bad_magic = data.clone();
        bad_magic[0] = 0xCB;
        assert!(matches!(
            ClassFile::parse(&bad_magic),
            Err(Error::Malformed { .. })
        ));

        let mut future = data.clone();
        future[6..8].copy_from_slice(&99_u16.to_be_bytes());
        assert!(matches!(
            ClassFile::parse(&future),
            Err(Error::NotSupported(99))
        ));

        let mut trailing = data;
        trailing.push(0);
        assert!(matches!(
            ClassFile::parse(&trailing),
            Err(Error::Malformed { .. })
        ));
    }
}
