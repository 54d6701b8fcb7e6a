//! Access flags of classes, fields and methods.
//!
//! The class file stores access flags as a `u16` bitmask whose bit meanings overlap by
//! context (`0x0020` is `ACC_SUPER` on a class and `ACC_SYNCHRONIZED` on a method). A
//! single [`crate::classfile::AccessFlags`] type carries all of them, with aliases for the
//! overlapping bits. The `*_MODIFIER_MASK` constants select the bits that take part in the
//! serialization fingerprint for each kind of member.

use bitflags::bitflags;

/// Modifier bits hashed for the class itself: PUBLIC, FINAL, INTERFACE, ABSTRACT.
pub const CLASS_MODIFIER_MASK: u16 = 0x0611;
/// Modifier bits hashed for fields: PUBLIC, PRIVATE, PROTECTED, STATIC, FINAL, VOLATILE, TRANSIENT.
pub const FIELD_MODIFIER_MASK: u16 = 0x00DF;
/// Modifier bits hashed for constructors and methods: PUBLIC, PRIVATE, PROTECTED, STATIC, FINAL,
/// SYNCHRONIZED, NATIVE, ABSTRACT, STRICT.
pub const METHOD_MODIFIER_MASK: u16 = 0x0D3F;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// `access_flags` of a class, field or method
    pub struct AccessFlags: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared private
        const PRIVATE = 0x0002;
        /// Declared protected
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Declared final
        const FINAL = 0x0010;
        /// Class: treat superclass methods specially for invokespecial
        const SUPER = 0x0020;
        /// Method: declared synchronized
        const SYNCHRONIZED = 0x0020;
        /// Field: declared volatile
        const VOLATILE = 0x0040;
        /// Method: compiler-generated bridge
        const BRIDGE = 0x0040;
        /// Field: declared transient
        const TRANSIENT = 0x0080;
        /// Method: variable arity
        const VARARGS = 0x0080;
        /// Method: declared native
        const NATIVE = 0x0100;
        /// Class: is an interface
        const INTERFACE = 0x0200;
        /// Declared abstract
        const ABSTRACT = 0x0400;
        /// Method: declared strictfp
        const STRICT = 0x0800;
        /// Not present in source code
        const SYNTHETIC = 0x1000;
        /// Class: is an annotation interface
        const ANNOTATION = 0x2000;
        /// Class or field: enum type or enum constant
        const ENUM = 0x4000;
        /// Class: is a module descriptor
        const MODULE = 0x8000;
    }
}

impl AccessFlags {
    /// Flags of a `private static final` field, as injected for the fingerprint constant.
    pub const PRIVATE_STATIC_FINAL: AccessFlags = AccessFlags::from_bits_retain(0x001A);

    /// Restricts the flags to the bits in `mask`.
    #[must_use]
    pub fn masked(self, mask: u16) -> AccessFlags {
        AccessFlags::from_bits_retain(self.bits() & mask)
    }

    /// Returns `true` if the PRIVATE bit is set.
    #[must_use]
    pub fn is_private(self) -> bool {
        self.contains(AccessFlags::PRIVATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks() {
        let field = AccessFlags::PRIVATE | AccessFlags::STATIC | AccessFlags::SYNTHETIC;
        assert_eq!(field.masked(FIELD_MODIFIER_MASK).bits(), 0x000A);

        let class = AccessFlags::PUBLIC | AccessFlags::SUPER | AccessFlags::ABSTRACT;
        assert_eq!(class.masked(CLASS_MODIFIER_MASK).bits(), 0x0401);

        let method =
            AccessFlags::PUBLIC | AccessFlags::BRIDGE | AccessFlags::VARARGS | AccessFlags::STRICT;
        assert_eq!(method.masked(METHOD_MODIFIER_MASK).bits(), 0x0801);
    }

    #[test]
    fn injected_field_flags() {
        assert_eq!(
            AccessFlags::PRIVATE_STATIC_FINAL,
            AccessFlags::PRIVATE | AccessFlags::STATIC | AccessFlags::FINAL
        );
        assert!(AccessFlags::PRIVATE_STATIC_FINAL.is_private());
    }

    #[test]
    fn aliases_share_bits() {
        assert_eq!(AccessFlags::SUPER, AccessFlags::SYNCHRONIZED);
        assert_eq!(AccessFlags::VOLATILE, AccessFlags::BRIDGE);
        assert_eq!(AccessFlags::TRANSIENT, AccessFlags::VARARGS);
    }
}
