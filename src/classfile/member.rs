//! Fields, methods and attributes.
//!
//! Attributes are kept as raw `(name_index, info)` pairs. Only the handful this crate
//! interprets (`ConstantValue`, `InnerClasses`, `Record`) are decoded, and only on demand.

use crate::{
    classfile::{AccessFlags, ConstantPool},
    file::{
        io::{push_be, read_be},
        parser::Parser,
    },
    Result,
};

/// Name of the attribute carrying a field's constant initializer.
pub const CONSTANT_VALUE: &str = "ConstantValue";
/// Name of the attribute describing nested classes.
pub const INNER_CLASSES: &str = "InnerClasses";
/// Name of the attribute marking a record class.
pub const RECORD: &str = "Record";

/// A raw attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Index of the Utf8 attribute name
    pub name_index: u16,
    /// Attribute body, without the 6-byte header
    pub info: Vec<u8>,
}

impl Attribute {
    pub(crate) fn read(parser: &mut Parser) -> Result<Attribute> {
        let name_index = parser.read_be::<u16>()?;
        let length = parser.read_be::<u32>()?;
        let Ok(length) = usize::try_from(length) else {
            return Err(out_of_bounds_error!());
        };
        let info = parser.read_bytes(length)?.to_vec();

        Ok(Attribute { name_index, info })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        let Ok(length) = u32::try_from(self.info.len()) else {
            return Err(invariant_error!(
                "Attribute of {} bytes exceeds u32 length",
                self.info.len()
            ));
        };
        push_be(out, self.name_index);
        push_be(out, length);
        out.extend_from_slice(&self.info);
        Ok(())
    }

    /// Builds a `ConstantValue` attribute pointing at `value_index`.
    #[must_use]
    pub fn constant_value(name_index: u16, value_index: u16) -> Attribute {
        Attribute {
            name_index,
            info: value_index.to_be_bytes().to_vec(),
        }
    }

    /// Returns `true` if the attribute's name is `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the name index is not a Utf8 entry.
    pub fn is(&self, pool: &ConstantPool, name: &str) -> Result<bool> {
        Ok(pool.utf8_bytes(self.name_index)? == name.as_bytes())
    }

    pub(crate) fn read_count(parser: &mut Parser) -> Result<Vec<Attribute>> {
        let count = parser.read_be::<u16>()?;
        let mut attributes = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            attributes.push(Attribute::read(parser)?);
        }
        Ok(attributes)
    }

    pub(crate) fn write_all(attributes: &[Attribute], out: &mut Vec<u8>) -> Result<()> {
        write_count(attributes.len(), "attributes", out)?;
        for attribute in attributes {
            attribute.write(out)?;
        }
        Ok(())
    }
}

pub(crate) fn write_count(count: usize, what: &str, out: &mut Vec<u8>) -> Result<()> {
    let Ok(count) = u16::try_from(count) else {
        return Err(invariant_error!("{} {} exceed the u16 count limit", count, what));
    };
    push_be(out, count);
    Ok(())
}

/// A `field_info` or `method_info` structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberInfo {
    /// Access flags
    pub access_flags: AccessFlags,
    /// Index of the Utf8 simple name
    pub name_index: u16,
    /// Index of the Utf8 descriptor
    pub descriptor_index: u16,
    /// Attributes in file order
    pub attributes: Vec<Attribute>,
}

impl MemberInfo {
    pub(crate) fn read(parser: &mut Parser) -> Result<MemberInfo> {
        Ok(MemberInfo {
            access_flags: AccessFlags::from_bits_retain(parser.read_be()?),
            name_index: parser.read_be()?,
            descriptor_index: parser.read_be()?,
            attributes: Attribute::read_count(parser)?,
        })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<()> {
        push_be(out, self.access_flags.bits());
        push_be(out, self.name_index);
        push_be(out, self.descriptor_index);
        Attribute::write_all(&self.attributes, out)
    }

    /// The member's simple name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the name index does not hold a valid Utf8.
    pub fn name(&self, pool: &ConstantPool) -> Result<String> {
        pool.utf8(self.name_index)
    }

    /// The member's descriptor, e.g. `J` or `(Ljava/lang/String;)V`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the descriptor index does not hold a valid Utf8.
    pub fn descriptor(&self, pool: &ConstantPool) -> Result<String> {
        pool.utf8(self.descriptor_index)
    }

    /// Position of the first attribute called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if an attribute name is not a Utf8 entry.
    pub fn attribute_position(&self, pool: &ConstantPool, name: &str) -> Result<Option<usize>> {
        for (position, attribute) in self.attributes.iter().enumerate() {
            if attribute.is(pool, name)? {
                return Ok(Some(position));
            }
        }
        Ok(None)
    }

    /// Pool index referenced by the member's `ConstantValue` attribute, if it has one.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the attribute body is not exactly two bytes.
    pub fn constant_value_index(&self, pool: &ConstantPool) -> Result<Option<u16>> {
        let Some(position) = self.attribute_position(pool, CONSTANT_VALUE)? else {
            return Ok(None);
        };

        let info = &self.attributes[position].info;
        if info.len() != 2 {
            return Err(malformed_error!(
                "ConstantValue attribute has length {}, expected 2",
                info.len()
            ));
        }
        Ok(Some(read_be::<u16>(info)?))
    }
}

/// One entry of an `InnerClasses` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InnerClass {
    /// `Class` entry of the nested class
    pub inner_class_info_index: u16,
    /// `Class` entry of the enclosing class, 0 for local and anonymous classes
    pub outer_class_info_index: u16,
    /// Utf8 simple name, 0 for anonymous classes
    pub inner_name_index: u16,
    /// Flags as declared in source
    pub inner_class_access_flags: AccessFlags,
}

impl InnerClass {
    /// Decodes the body of an `InnerClasses` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the body length does not match its entry count.
    pub fn parse_all(info: &[u8]) -> Result<Vec<InnerClass>> {
        let mut parser = Parser::new(info);
        let count = parser.read_be::<u16>()?;
        let mut entries = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            entries.push(InnerClass {
                inner_class_info_index: parser.read_be()?,
                outer_class_info_index: parser.read_be()?,
                inner_name_index: parser.read_be()?,
                inner_class_access_flags: AccessFlags::from_bits_retain(parser.read_be()?),
            });
        }

        if parser.has_more_data() {
            return Err(malformed_error!(
                "InnerClasses attribute has {} trailing bytes",
                parser.remaining()
            ));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_write_back() {
        let data = [0x00, 0x09, 0x00, 0x00, 0x00, 0x02, 0x00, 0x11];
        let mut parser = Parser::new(&data);
        let attribute = Attribute::read(&mut parser).unwrap();
        assert_eq!(attribute, Attribute::constant_value(9, 0x11));

        let mut out = Vec::new();
        attribute.write(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn attribute_truncated() {
        let data = [0x00, 0x09, 0x00, 0x00, 0x00, 0x04, 0x00, 0x11];
        assert!(Attribute::read(&mut Parser::new(&data)).is_err());
    }

    #[test]
    fn inner_classes() {
        let data = [
            0x00, 0x01, // one entry
            0x00, 0x07, 0x00, 0x02, 0x00, 0x0C, 0x00, 0x1A,
        ];
        let entries = InnerClass::parse_all(&data).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].inner_class_info_index, 7);
        assert_eq!(
            entries[0].inner_class_access_flags,
            AccessFlags::PRIVATE | AccessFlags::STATIC | AccessFlags::FINAL
        );

        let mut trailing = data.to_vec();
        trailing.push(0);
        assert!(InnerClass::parse_all(&trailing).is_err());
        assert!(InnerClass::parse_all(&data[..6]).is_err());
    }
}
