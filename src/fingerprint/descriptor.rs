//! Structural descriptors: the parts of a class that its serialization fingerprint covers.
//!
//! A [`crate::fingerprint::StructuralDescriptor`] is built either from a parsed class with
//! [`crate::fingerprint::extract`] or by hand through a
//! [`crate::fingerprint::DescriptorBuilder`]. Both paths apply the same membership rules
//! (which fields, constructors and methods take part) and the same modifier masks, and
//! both leave the lists in canonical order.

use std::cmp::Ordering;

use crate::{
    classfile::{
        AccessFlags, ClassFile, CLASS_MODIFIER_MASK, FIELD_MODIFIER_MASK, METHOD_MODIFIER_MASK,
        RECORD,
    },
    Result,
};

const CONSTRUCTOR: &str = "<init>";
const STATIC_INITIALIZER: &str = "<clinit>";

/// Kind of type a descriptor was taken from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// An ordinary class, abstract or concrete
    Class,
    /// An interface or annotation interface
    Interface,
    /// An enum class, whose fingerprint is always 0
    Enum,
    /// A record class, whose fingerprint is always 0
    Record,
}

/// A field, constructor or method as it enters the fingerprint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberSignature {
    /// Simple name, `<init>` for constructors
    pub name: String,
    /// Modifiers, already restricted to the hashed bits
    pub modifiers: AccessFlags,
    /// Descriptor exactly as stored in the class file (slash-separated)
    pub descriptor: String,
}

/// Immutable snapshot of the structure of one type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuralDescriptor {
    /// Binary name with `.` separators, e.g. `com.example.Account$Entry`
    pub name: String,
    /// Kind of type
    pub kind: TypeKind,
    /// Class modifiers, restricted to PUBLIC, FINAL, INTERFACE and ABSTRACT
    pub modifiers: AccessFlags,
    /// Direct superinterfaces with `.` separators
    pub interfaces: Vec<String>,
    /// Hashed fields: all but those both private and static or transient
    pub fields: Vec<MemberSignature>,
    /// Non-private constructors
    pub constructors: Vec<MemberSignature>,
    /// Non-private methods other than constructors and the static initializer
    pub methods: Vec<MemberSignature>,
    /// Whether the type declares a static initializer
    pub has_static_initializer: bool,
}

/// Compares two strings by UTF-16 code units, the order `java.lang.String::compareTo` uses.
#[must_use]
pub fn utf16_cmp(a: &str, b: &str) -> Ordering {
    a.encode_utf16().cmp(b.encode_utf16())
}

impl StructuralDescriptor {
    /// Starts a descriptor for the type with the given internal or binary name.
    #[must_use]
    pub fn builder(name: &str) -> DescriptorBuilder {
        DescriptorBuilder::new(name)
    }

    /// Restores canonical order: interfaces, fields and constructors by their key, methods by
    /// name then descriptor. Duplicate interfaces are dropped.
    ///
    /// Sorting is stable, so members with equal keys keep their relative order.
    pub fn normalize(&mut self) {
        self.interfaces.sort_by(|a, b| utf16_cmp(a, b));
        self.interfaces.dedup();
        self.fields.sort_by(|a, b| utf16_cmp(&a.name, &b.name));
        self.constructors.sort_by(|a, b| utf16_cmp(&a.descriptor, &b.descriptor));
        self.methods.sort_by(|a, b| {
            utf16_cmp(&a.name, &b.name).then_with(|| utf16_cmp(&a.descriptor, &b.descriptor))
        });
    }
}

/// Assembles a [`StructuralDescriptor`] from members given in any order.
///
/// Members that do not take part in the fingerprint are dropped as they are added, and
/// modifiers are masked, so the builder accepts raw class file flags.
///
/// # Examples
///
/// ```rust
/// use serialver::{AccessFlags, StructuralDescriptor};
///
/// let descriptor = StructuralDescriptor::builder("com/example/Plain")
///     .modifiers(AccessFlags::PUBLIC | AccessFlags::SUPER)
///     .interface("java/io/Serializable")
///     .constructor(AccessFlags::PUBLIC, "()V")
///     .build();
///
/// assert_eq!(descriptor.name, "com.example.Plain");
/// assert_eq!(descriptor.modifiers, AccessFlags::PUBLIC);
/// ```
#[derive(Clone, Debug)]
pub struct DescriptorBuilder {
    descriptor: StructuralDescriptor,
    declares_methods: bool,
}

impl DescriptorBuilder {
    fn new(name: &str) -> Self {
        DescriptorBuilder {
            descriptor: StructuralDescriptor {
                name: name.replace('/', "."),
                kind: TypeKind::Class,
                modifiers: AccessFlags::empty(),
                interfaces: Vec::new(),
                fields: Vec::new(),
                constructors: Vec::new(),
                methods: Vec::new(),
                has_static_initializer: false,
            },
            declares_methods: false,
        }
    }

    /// Sets the type kind. Defaults to [`TypeKind::Class`].
    #[must_use]
    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.descriptor.kind = kind;
        self
    }

    /// Sets the class access flags. Bits outside the class mask are ignored.
    #[must_use]
    pub fn modifiers(mut self, flags: AccessFlags) -> Self {
        self.descriptor.modifiers = flags.masked(CLASS_MODIFIER_MASK);
        self
    }

    /// Adds a direct superinterface.
    #[must_use]
    pub fn interface(mut self, name: &str) -> Self {
        self.descriptor.interfaces.push(name.replace('/', "."));
        self
    }

    /// Adds a declared field. Private static and private transient fields are ignored.
    #[must_use]
    pub fn field(mut self, name: &str, flags: AccessFlags, descriptor: &str) -> Self {
        let modifiers = flags.masked(FIELD_MODIFIER_MASK);
        let excluded = modifiers.is_private()
            && modifiers.intersects(AccessFlags::STATIC | AccessFlags::TRANSIENT);
        if !excluded {
            self.descriptor.fields.push(MemberSignature {
                name: name.to_string(),
                modifiers,
                descriptor: descriptor.to_string(),
            });
        }
        self
    }

    /// Adds a declared constructor. Private constructors are ignored.
    #[must_use]
    pub fn constructor(mut self, flags: AccessFlags, descriptor: &str) -> Self {
        let modifiers = flags.masked(METHOD_MODIFIER_MASK);
        if !modifiers.is_private() {
            self.descriptor.constructors.push(MemberSignature {
                name: CONSTRUCTOR.to_string(),
                modifiers,
                descriptor: descriptor.to_string(),
            });
        }
        self
    }

    /// Adds a declared method. Private methods are ignored for hashing but still count
    /// as declared when deciding whether an interface is abstract.
    #[must_use]
    pub fn method(mut self, name: &str, flags: AccessFlags, descriptor: &str) -> Self {
        self.declares_methods = true;
        let modifiers = flags.masked(METHOD_MODIFIER_MASK);
        if !modifiers.is_private() {
            self.descriptor.methods.push(MemberSignature {
                name: name.to_string(),
                modifiers,
                descriptor: descriptor.to_string(),
            });
        }
        self
    }

    /// Marks the presence of a static initializer.
    #[must_use]
    pub fn static_initializer(mut self, present: bool) -> Self {
        self.descriptor.has_static_initializer = present;
        self
    }

    /// Finishes the descriptor in canonical order.
    ///
    /// For interfaces, ABSTRACT is forced on when any method was declared and off otherwise,
    /// mirroring how reflection reports interface modifiers.
    #[must_use]
    pub fn build(mut self) -> StructuralDescriptor {
        if self.descriptor.modifiers.contains(AccessFlags::INTERFACE) {
            self.descriptor
                .modifiers
                .set(AccessFlags::ABSTRACT, self.declares_methods);
        }
        self.descriptor.normalize();
        self.descriptor
    }
}

/// Determines the [`TypeKind`] of a parsed class.
///
/// Any class flagged `ACC_ENUM` is an enum, including the classes of enum constants with a
/// body, whose superclass is the enum type rather than `java.lang.Enum`.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if the superclass or an attribute name cannot be
/// resolved.
pub fn type_kind(class: &ClassFile) -> Result<TypeKind> {
    if class.is_interface() {
        return Ok(TypeKind::Interface);
    }
    if class.access_flags.contains(AccessFlags::ENUM) {
        return Ok(TypeKind::Enum);
    }

    let super_name = class.super_class_name()?;
    match super_name.as_deref() {
        Some("java/lang/Record") if class.has_attribute(RECORD)? => Ok(TypeKind::Record),
        _ => Ok(TypeKind::Class),
    }
}

/// Extracts the structural descriptor of a parsed class.
///
/// Member classes take their modifiers from their own `InnerClasses` entry, which holds the
/// flags as declared in source rather than the package-level flags of the class file.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if any name, descriptor or attribute the descriptor
/// needs cannot be resolved.
pub fn extract(class: &ClassFile) -> Result<StructuralDescriptor> {
    let pool = &class.constant_pool;
    let name = class.class_name()?;

    let mut modifiers = class.access_flags;
    for entry in class.inner_classes()? {
        if pool.class_name(entry.inner_class_info_index)? == name {
            modifiers = entry.inner_class_access_flags;
            break;
        }
    }

    let mut builder = StructuralDescriptor::builder(&name)
        .kind(type_kind(class)?)
        .modifiers(modifiers);

    for interface in class.interface_names()? {
        builder = builder.interface(&interface);
    }

    for field in &class.fields {
        builder = builder.field(
            &field.name(pool)?,
            field.access_flags,
            &field.descriptor(pool)?,
        );
    }

    for method in &class.methods {
        let method_name = method.name(pool)?;
        builder = match method_name.as_str() {
            STATIC_INITIALIZER => builder.static_initializer(true),
            CONSTRUCTOR => builder.constructor(method.access_flags, &method.descriptor(pool)?),
            _ => builder.method(&method_name, method.access_flags, &method.descriptor(pool)?),
        };
    }

    Ok(builder.build())
}
