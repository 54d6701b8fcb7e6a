//! Canonical byte stream and SHA-1 reduction of a structural descriptor.

use std::fmt;

use sha1::{Digest, Sha1};

use crate::{
    classfile::{mutf8, AccessFlags},
    file::io::push_be,
    fingerprint::{StructuralDescriptor, TypeKind},
    Result,
};

/// A computed serialization fingerprint, the value of `serialVersionUID`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub i64);

impl Fingerprint {
    /// The raw value.
    #[must_use]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<Fingerprint> for i64 {
    fn from(fingerprint: Fingerprint) -> i64 {
        fingerprint.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Writer matching the encoding of `java.io.DataOutputStream`.
#[derive(Default)]
pub struct DataOutput {
    buffer: Vec<u8>,
}

impl DataOutput {
    /// Creates an empty stream.
    #[must_use]
    pub fn new() -> Self {
        DataOutput::default()
    }

    /// `writeUTF`: u16 big-endian byte length followed by modified UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the encoding exceeds 65535 bytes.
    pub fn write_utf(&mut self, value: &str) -> Result<()> {
        let encoded = mutf8::encode(value);
        let Ok(len) = u16::try_from(encoded.len()) else {
            return Err(malformed_error!(
                "String of {} encoded bytes is too long for writeUTF",
                encoded.len()
            ));
        };
        push_be(&mut self.buffer, len);
        self.buffer.extend_from_slice(&encoded);
        Ok(())
    }

    /// `writeInt`: 32-bit big-endian.
    pub fn write_int(&mut self, value: i32) {
        push_be(&mut self.buffer, value);
    }

    fn write_modifiers(&mut self, modifiers: AccessFlags) {
        self.write_int(i32::from(modifiers.bits()));
    }

    /// Bytes written so far.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Consumes the writer and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Serializes a descriptor into the byte stream that is hashed.
///
/// The descriptor's lists are expected in canonical order, which every
/// [`StructuralDescriptor`] produced by this crate already is.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if a name or descriptor is too long for `writeUTF`.
pub fn canonical_stream(descriptor: &StructuralDescriptor) -> Result<Vec<u8>> {
    let mut out = DataOutput::new();

    out.write_utf(&descriptor.name)?;
    out.write_modifiers(descriptor.modifiers);

    for interface in &descriptor.interfaces {
        out.write_utf(interface)?;
    }

    for field in &descriptor.fields {
        out.write_utf(&field.name)?;
        out.write_modifiers(field.modifiers);
        out.write_utf(&field.descriptor)?;
    }

    if descriptor.has_static_initializer {
        out.write_utf("<clinit>")?;
        out.write_modifiers(AccessFlags::STATIC);
        out.write_utf("()V")?;
    }

    for method in descriptor.constructors.iter().chain(&descriptor.methods) {
        out.write_utf(&method.name)?;
        out.write_modifiers(method.modifiers);
        out.write_utf(&method.descriptor.replace('/', "."))?;
    }

    Ok(out.into_bytes())
}

/// Reduces a canonical stream to a fingerprint: the first eight bytes of its SHA-1 digest,
/// least significant byte first.
#[must_use]
pub fn digest(stream: &[u8]) -> Fingerprint {
    let hash = Sha1::digest(stream);
    let mut low = [0_u8; 8];
    low.copy_from_slice(&hash[..8]);
    Fingerprint(i64::from_le_bytes(low))
}

/// Computes the fingerprint of a descriptor. Enums and records always yield 0.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if the canonical stream cannot be written.
pub fn compute(descriptor: &StructuralDescriptor) -> Result<Fingerprint> {
    match descriptor.kind {
        TypeKind::Enum | TypeKind::Record => Ok(Fingerprint(0)),
        TypeKind::Class | TypeKind::Interface => Ok(digest(&canonical_stream(descriptor)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> StructuralDescriptor {
        StructuralDescriptor::builder("com/example/Plain")
            .modifiers(AccessFlags::PUBLIC | AccessFlags::SUPER)
            .interface("java/io/Serializable")
            .constructor(AccessFlags::PUBLIC, "()V")
            .build()
    }

    #[test]
    fn write_utf_encoding() {
        let mut out = DataOutput::new();
        out.write_utf("ab").unwrap();
        out.write_utf("").unwrap();
        out.write_utf("\0").unwrap();
        assert_eq!(out.as_bytes(), [0, 2, b'a', b'b', 0, 0, 0, 2, 0xC0, 0x80]);

        let long = "x".repeat(65536);
        assert!(out.write_utf(&long).is_err());
    }

    #[test]
    fn write_int_is_big_endian() {
        let mut out = DataOutput::new();
        out.write_int(8);
        out.write_int(-1);
        assert_eq!(out.into_bytes(), [0, 0, 0, 8, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn digest_is_little_endian() {
        // SHA-1("abc") = a9993e36 4706816a ...
        assert_eq!(digest(b"abc"), Fingerprint(0x6a81_0647_363e_99a9));
    }

    #[test]
    fn plain_value() {
        assert_eq!(compute(&plain()).unwrap(), Fingerprint(350957258087942950));
    }

    #[test]
    fn enum_and_record_are_zero() {
        let mut descriptor = plain();
        descriptor.kind = TypeKind::Enum;
        assert_eq!(compute(&descriptor).unwrap(), Fingerprint(0));
        descriptor.kind = TypeKind::Record;
        assert_eq!(compute(&descriptor).unwrap(), Fingerprint(0));
    }

    #[test]
    fn method_descriptors_are_dotted() {
        let descriptor = StructuralDescriptor::builder("p/C")
            .field("f", AccessFlags::PUBLIC, "Ljava/lang/String;")
            .method("m", AccessFlags::PUBLIC, "(Ljava/lang/String;)V")
            .build();
        let stream = canonical_stream(&descriptor).unwrap();
        let text = String::from_utf8_lossy(&stream);
        assert!(text.contains("Ljava/lang/String;"));
        assert!(text.contains("(Ljava.lang.String;)V"));
    }
}
