//! The constant pool.
//!
//! Entries are kept in their parsed form with all payloads raw: Utf8 entries keep their
//! modified UTF-8 bytes and floating point constants keep their bit patterns. Serializing
//! an unmodified pool therefore reproduces the input exactly, including NaN payloads and
//! non-canonical string encodings.
//!
//! # Indexing
//!
//! Pool indices are 1-based. `Long` and `Double` entries occupy two slots, the second of
//! which is stored as [`crate::classfile::Constant::Unusable`] so that vector position and
//! pool index always coincide. Slot 0 is likewise an `Unusable` placeholder.
//!
//! # Mutation
//!
//! The pool is append-only. [`crate::classfile::ConstantPool::add`] never renumbers an
//! existing entry, so every index stored elsewhere in the class file stays valid.

use strum::{EnumCount, EnumIter, IntoEnumIterator};

use crate::{
    classfile::mutf8,
    file::{io::push_be, parser::Parser},
    Result,
};

/// Maximum number of slots a pool can hold, including slot 0.
pub const MAX_POOL_SLOTS: usize = 0xFFFF;

/// Tags of the constant pool entry kinds.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumIter, EnumCount)]
pub enum ConstantTag {
    /// `CONSTANT_Utf8`
    Utf8 = 1,
    /// `CONSTANT_Integer`
    Integer = 3,
    /// `CONSTANT_Float`
    Float = 4,
    /// `CONSTANT_Long`, occupies two slots
    Long = 5,
    /// `CONSTANT_Double`, occupies two slots
    Double = 6,
    /// `CONSTANT_Class`
    Class = 7,
    /// `CONSTANT_String`
    String = 8,
    /// `CONSTANT_Fieldref`
    FieldRef = 9,
    /// `CONSTANT_Methodref`
    MethodRef = 10,
    /// `CONSTANT_InterfaceMethodref`
    InterfaceMethodRef = 11,
    /// `CONSTANT_NameAndType`
    NameAndType = 12,
    /// `CONSTANT_MethodHandle`
    MethodHandle = 15,
    /// `CONSTANT_MethodType`
    MethodType = 16,
    /// `CONSTANT_Dynamic`
    Dynamic = 17,
    /// `CONSTANT_InvokeDynamic`
    InvokeDynamic = 18,
    /// `CONSTANT_Module`
    Module = 19,
    /// `CONSTANT_Package`
    Package = 20,
}

impl ConstantTag {
    /// Looks up the tag for a raw tag byte.
    #[must_use]
    pub fn from_u8(value: u8) -> Option<ConstantTag> {
        ConstantTag::iter().find(|tag| *tag as u8 == value)
    }
}

/// One constant pool entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Constant {
    /// Modified UTF-8 bytes, undecoded
    Utf8(Vec<u8>),
    /// 32-bit integer
    Integer(i32),
    /// Raw IEEE 754 bits of a float
    Float(u32),
    /// 64-bit integer
    Long(i64),
    /// Raw IEEE 754 bits of a double
    Double(u64),
    /// Class reference, index of the internal name
    Class(u16),
    /// String literal, index of the Utf8 content
    String(u16),
    /// Field reference
    FieldRef {
        /// Index of the owning `Class`
        class_index: u16,
        /// Index of the `NameAndType`
        name_and_type_index: u16,
    },
    /// Method reference
    MethodRef {
        /// Index of the owning `Class`
        class_index: u16,
        /// Index of the `NameAndType`
        name_and_type_index: u16,
    },
    /// Interface method reference
    InterfaceMethodRef {
        /// Index of the owning `Class`
        class_index: u16,
        /// Index of the `NameAndType`
        name_and_type_index: u16,
    },
    /// Name and descriptor pair
    NameAndType {
        /// Index of the member name
        name_index: u16,
        /// Index of the descriptor
        descriptor_index: u16,
    },
    /// Method handle
    MethodHandle {
        /// Kind of the handle (1..=9)
        reference_kind: u8,
        /// Index of the referenced member
        reference_index: u16,
    },
    /// Method type, index of the descriptor
    MethodType(u16),
    /// Dynamically computed constant
    Dynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method_attr_index: u16,
        /// Index of the `NameAndType`
        name_and_type_index: u16,
    },
    /// Dynamically computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method_attr_index: u16,
        /// Index of the `NameAndType`
        name_and_type_index: u16,
    },
    /// Module name, index of the Utf8 name
    Module(u16),
    /// Package name, index of the Utf8 name
    Package(u16),
    /// Slot 0 and the upper half of a `Long` or `Double`
    Unusable,
}

impl Constant {
    /// The tag of this entry, `None` for [`Constant::Unusable`].
    #[must_use]
    pub fn tag(&self) -> Option<ConstantTag> {
        Some(match self {
            Constant::Utf8(_) => ConstantTag::Utf8,
            Constant::Integer(_) => ConstantTag::Integer,
            Constant::Float(_) => ConstantTag::Float,
            Constant::Long(_) => ConstantTag::Long,
            Constant::Double(_) => ConstantTag::Double,
            Constant::Class(_) => ConstantTag::Class,
            Constant::String(_) => ConstantTag::String,
            Constant::FieldRef { .. } => ConstantTag::FieldRef,
            Constant::MethodRef { .. } => ConstantTag::MethodRef,
            Constant::InterfaceMethodRef { .. } => ConstantTag::InterfaceMethodRef,
            Constant::NameAndType { .. } => ConstantTag::NameAndType,
            Constant::MethodHandle { .. } => ConstantTag::MethodHandle,
            Constant::MethodType(_) => ConstantTag::MethodType,
            Constant::Dynamic { .. } => ConstantTag::Dynamic,
            Constant::InvokeDynamic { .. } => ConstantTag::InvokeDynamic,
            Constant::Module(_) => ConstantTag::Module,
            Constant::Package(_) => ConstantTag::Package,
            Constant::Unusable => return None,
        })
    }

    /// Number of pool slots the entry occupies.
    #[must_use]
    pub fn slots(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    fn read(parser: &mut Parser) -> Result<Constant> {
        let offset = parser.pos();
        let raw_tag = parser.read_be::<u8>()?;
        let Some(tag) = ConstantTag::from_u8(raw_tag) else {
            return Err(malformed_error!(
                "Unknown constant pool tag {} at offset {}",
                raw_tag,
                offset
            ));
        };

        Ok(match tag {
            ConstantTag::Utf8 => {
                let len = parser.read_be::<u16>()?;
                Constant::Utf8(parser.read_bytes(usize::from(len))?.to_vec())
            }
            ConstantTag::Integer => Constant::Integer(parser.read_be()?),
            ConstantTag::Float => Constant::Float(parser.read_be()?),
            ConstantTag::Long => Constant::Long(parser.read_be()?),
            ConstantTag::Double => Constant::Double(parser.read_be()?),
            ConstantTag::Class => Constant::Class(parser.read_be()?),
            ConstantTag::String => Constant::String(parser.read_be()?),
            ConstantTag::FieldRef => Constant::FieldRef {
                class_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            ConstantTag::MethodRef => Constant::MethodRef {
                class_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            ConstantTag::InterfaceMethodRef => Constant::InterfaceMethodRef {
                class_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            ConstantTag::NameAndType => Constant::NameAndType {
                name_index: parser.read_be()?,
                descriptor_index: parser.read_be()?,
            },
            ConstantTag::MethodHandle => Constant::MethodHandle {
                reference_kind: parser.read_be()?,
                reference_index: parser.read_be()?,
            },
            ConstantTag::MethodType => Constant::MethodType(parser.read_be()?),
            ConstantTag::Dynamic => Constant::Dynamic {
                bootstrap_method_attr_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            ConstantTag::InvokeDynamic => Constant::InvokeDynamic {
                bootstrap_method_attr_index: parser.read_be()?,
                name_and_type_index: parser.read_be()?,
            },
            ConstantTag::Module => Constant::Module(parser.read_be()?),
            ConstantTag::Package => Constant::Package(parser.read_be()?),
        })
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        let Some(tag) = self.tag() else {
            return Ok(());
        };
        out.push(tag as u8);

        match self {
            Constant::Utf8(bytes) => {
                let Ok(len) = u16::try_from(bytes.len()) else {
                    return Err(invariant_error!(
                        "Utf8 constant of {} bytes exceeds 65535",
                        bytes.len()
                    ));
                };
                push_be(out, len);
                out.extend_from_slice(bytes);
            }
            Constant::Integer(value) => push_be(out, *value),
            Constant::Float(bits) => push_be(out, *bits),
            Constant::Long(value) => push_be(out, *value),
            Constant::Double(bits) => push_be(out, *bits),
            Constant::Class(index)
            | Constant::String(index)
            | Constant::MethodType(index)
            | Constant::Module(index)
            | Constant::Package(index) => push_be(out, *index),
            Constant::FieldRef {
                class_index,
                name_and_type_index,
            }
            | Constant::MethodRef {
                class_index,
                name_and_type_index,
            }
            | Constant::InterfaceMethodRef {
                class_index,
                name_and_type_index,
            } => {
                push_be(out, *class_index);
                push_be(out, *name_and_type_index);
            }
            Constant::NameAndType {
                name_index,
                descriptor_index,
            } => {
                push_be(out, *name_index);
                push_be(out, *descriptor_index);
            }
            Constant::MethodHandle {
                reference_kind,
                reference_index,
            } => {
                push_be(out, *reference_kind);
                push_be(out, *reference_index);
            }
            Constant::Dynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            }
            | Constant::InvokeDynamic {
                bootstrap_method_attr_index,
                name_and_type_index,
            } => {
                push_be(out, *bootstrap_method_attr_index);
                push_be(out, *name_and_type_index);
            }
            Constant::Unusable => {}
        }

        Ok(())
    }
}

/// The constant pool of one class file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstantPool {
    /// One element per slot; element 0 is the unusable slot 0
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Reads `constant_pool_count` followed by the entries.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] on unknown tags or a `Long`/`Double` in the
    /// last slot, and [`crate::Error::OutOfBounds`] on truncation.
    pub fn read(parser: &mut Parser) -> Result<ConstantPool> {
        let count = usize::from(parser.read_be::<u16>()?);
        if count == 0 {
            return Err(malformed_error!("constant_pool_count must be at least 1"));
        }

        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);

        while entries.len() < count {
            let constant = Constant::read(parser)?;
            let slots = constant.slots();
            if entries.len() + slots > count {
                return Err(malformed_error!(
                    "8-byte constant at index {} overruns constant_pool_count {}",
                    entries.len(),
                    count
                ));
            }

            entries.push(constant);
            if slots == 2 {
                entries.push(Constant::Unusable);
            }
        }

        Ok(ConstantPool { entries })
    }

    /// Appends `constant_pool_count` and the entries to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvariantViolation`] if an entry cannot be encoded.
    pub fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        push_be(out, self.count());
        for constant in &self.entries {
            constant.write(out)?;
        }
        Ok(())
    }

    /// The `constant_pool_count` value: number of slots including slot 0.
    #[must_use]
    pub fn count(&self) -> u16 {
        // never exceeds MAX_POOL_SLOTS, enforced by read and add
        self.entries.len() as u16
    }

    /// Iterates `(index, constant)` over all usable entries.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, constant)| !matches!(constant, Constant::Unusable))
            .map(|(index, constant)| (index as u16, constant))
    }

    /// Returns the entry at a pool index.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for index 0, an out-of-range index, or the
    /// upper slot of an 8-byte constant.
    pub fn get(&self, index: u16) -> Result<&Constant> {
        match self.entries.get(usize::from(index)) {
            Some(Constant::Unusable) | None => Err(malformed_error!(
                "Constant pool index {} does not reference a usable entry",
                index
            )),
            Some(constant) => Ok(constant),
        }
    }

    /// Returns the raw bytes of the Utf8 entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the entry is missing or not a Utf8.
    pub fn utf8_bytes(&self, index: u16) -> Result<&[u8]> {
        match self.get(index)? {
            Constant::Utf8(bytes) => Ok(bytes),
            other => Err(malformed_error!(
                "Constant pool index {} is {:?}, expected Utf8",
                index,
                other.tag()
            )),
        }
    }

    /// Returns the decoded Utf8 entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the entry is missing, not a Utf8, or not
    /// valid modified UTF-8.
    pub fn utf8(&self, index: u16) -> Result<String> {
        mutf8::decode(self.utf8_bytes(index)?)
    }

    /// Returns the internal (slash-separated) name of the `Class` entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the entry is not a `Class` or its name is
    /// not a valid Utf8.
    pub fn class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            Constant::Class(name_index) => self.utf8(*name_index),
            other => Err(malformed_error!(
                "Constant pool index {} is {:?}, expected Class",
                index,
                other.tag()
            )),
        }
    }

    /// Returns the value of the `Long` entry at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the entry is not a `Long`.
    pub fn long(&self, index: u16) -> Result<i64> {
        match self.get(index)? {
            Constant::Long(value) => Ok(*value),
            other => Err(malformed_error!(
                "Constant pool index {} is {:?}, expected Long",
                index,
                other.tag()
            )),
        }
    }

    /// Finds the first Utf8 entry whose bytes encode `value`.
    #[must_use]
    pub fn find_utf8(&self, value: &str) -> Option<u16> {
        let encoded = mutf8::encode(value);
        self.iter().find_map(|(index, constant)| match constant {
            Constant::Utf8(bytes) if *bytes == encoded => Some(index),
            _ => None,
        })
    }

    /// Appends an entry and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvariantViolation`] if the pool would exceed 65535 slots.
    pub fn add(&mut self, constant: Constant) -> Result<u16> {
        if matches!(constant, Constant::Unusable) {
            return Err(invariant_error!("Cannot append an unusable slot"));
        }

        let index = self.entries.len();
        let slots = constant.slots();
        if index + slots > MAX_POOL_SLOTS {
            return Err(invariant_error!(
                "Constant pool would grow to {} slots, the limit is {}",
                index + slots,
                MAX_POOL_SLOTS
            ));
        }

        self.entries.push(constant);
        if slots == 2 {
            self.entries.push(Constant::Unusable);
        }

        Ok(index as u16)
    }

    /// Returns the index of a Utf8 entry for `value`, appending one if none exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvariantViolation`] if the pool is full or the encoded
    /// string exceeds 65535 bytes.
    pub fn find_or_add_utf8(&mut self, value: &str) -> Result<u16> {
        if let Some(index) = self.find_utf8(value) {
            return Ok(index);
        }

        let encoded = mutf8::encode(value);
        if encoded.len() > usize::from(u16::MAX) {
            return Err(invariant_error!(
                "Utf8 constant of {} bytes exceeds 65535",
                encoded.len()
            ));
        }
        self.add(Constant::Utf8(encoded))
    }

    /// Appends a fresh `Long` entry and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvariantViolation`] if the pool is full.
    pub fn add_long(&mut self, value: i64) -> Result<u16> {
        self.add(Constant::Long(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn pool_bytes() -> Vec<u8> {
        let mut data = vec![0x00, 0x07];
        // #1 Utf8 "Foo"
        data.extend_from_slice(&[0x01, 0x00, 0x03, b'F', b'o', b'o']);
        // #2 Class #1
        data.extend_from_slice(&[0x07, 0x00, 0x01]);
        // #3 Long 42 (occupies #3 and #4)
        data.extend_from_slice(&[0x05, 0, 0, 0, 0, 0, 0, 0, 42]);
        // #5 Double NaN with payload
        data.extend_from_slice(&[0x06, 0x7F, 0xF0, 0, 0, 0, 0, 0, 1]);
        data
    }

    #[test]
    fn tag_lookup() {
        assert_eq!(ConstantTag::COUNT, 17);
        assert_eq!(ConstantTag::from_u8(1), Some(ConstantTag::Utf8));
        assert_eq!(ConstantTag::from_u8(20), Some(ConstantTag::Package));
        assert_eq!(ConstantTag::from_u8(2), None);
        assert_eq!(ConstantTag::from_u8(13), None);
    }

    #[test]
    fn read_and_write_back() {
        let data = pool_bytes();
        let mut parser = Parser::new(&data);
        let pool = ConstantPool::read(&mut parser).unwrap();
        assert!(!parser.has_more_data());

        assert_eq!(pool.count(), 7);
        assert_eq!(pool.utf8(1).unwrap(), "Foo");
        assert_eq!(pool.class_name(2).unwrap(), "Foo");
        assert_eq!(pool.long(3).unwrap(), 42);
        assert!(pool.get(4).is_err());
        assert!(pool.get(0).is_err());
        assert!(pool.get(6).is_err());
        assert!(pool.get(7).is_err());
        assert!(matches!(
            pool.get(5).unwrap(),
            Constant::Double(bits) if *bits == 0x7FF0_0000_0000_0001
        ));

        let mut out = Vec::new();
        pool.write(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn eight_byte_constant_in_last_slot() {
        let data = [0x00, 0x02, 0x05, 0, 0, 0, 0, 0, 0, 0, 1];
        let mut parser = Parser::new(&data);
        assert!(matches!(
            ConstantPool::read(&mut parser),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn unknown_tag() {
        let data = [0x00, 0x02, 0x02, 0x00];
        let mut parser = Parser::new(&data);
        assert!(matches!(
            ConstantPool::read(&mut parser),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn append_only() {
        let data = pool_bytes();
        let mut pool = ConstantPool::read(&mut Parser::new(&data)).unwrap();

        assert_eq!(pool.find_or_add_utf8("Foo").unwrap(), 1);
        assert_eq!(pool.find_or_add_utf8("J").unwrap(), 7);
        assert_eq!(pool.add_long(-7).unwrap(), 8);
        assert_eq!(pool.count(), 10);
        assert_eq!(pool.long(8).unwrap(), -7);
        assert_eq!(pool.find_utf8("J"), Some(7));
        assert_eq!(pool.utf8(1).unwrap(), "Foo");
        assert!(pool.add(Constant::Unusable).is_err());
    }

    #[test]
    fn slot_limit() {
        let mut pool = ConstantPool {
            entries: vec![Constant::Unusable; MAX_POOL_SLOTS - 1],
        };
        assert!(matches!(
            pool.add_long(1),
            Err(Error::InvariantViolation { .. })
        ));
        assert_eq!(pool.add(Constant::Integer(1)).unwrap(), 0xFFFE);
        assert!(matches!(
            pool.add(Constant::Integer(2)),
            Err(Error::InvariantViolation { .. })
        ));
    }

    #[test]
    fn type_mismatch() {
        let data = pool_bytes();
        let pool = ConstantPool::read(&mut Parser::new(&data)).unwrap();
        assert!(pool.long(1).is_err());
        assert!(pool.utf8(2).is_err());
        assert!(pool.class_name(1).is_err());
    }
}
